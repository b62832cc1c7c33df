//! Grant re-assertion, disclosure and release.
//!
//! Every handle written into a container is a fresh ciphertext that exists
//! only in the current algebra session. Before the container is saved, each
//! handle receives:
//! - a standing computation grant for the ledger,
//! - a standing read grant for the owner,
//! - the public flag when the container is `Public`.
//!
//! The handles a container held before a contribution or reset are released
//! once their successors are in place, so storage only ever holds the live
//! aggregates.

use confidential::{EncryptedAlgebra, Euint64, FheError, FheResult};

use crate::{Container, Disclosure};

fn for_each_handle(
    container: &Container,
    mut f: impl FnMut(&Euint64) -> FheResult<()>,
) -> FheResult<()> {
    f(&container.total)?;
    for bucket in container.buckets.iter() {
        f(&bucket)?;
    }
    Ok(())
}

pub fn reassert_grants<A: EncryptedAlgebra>(fhe: &mut A, container: &Container) -> FheResult<()> {
    for_each_handle(container, |handle| {
        fhe.allow_this(handle)?;
        fhe.allow(handle, &container.owner)?;
        if container.disclosure == Disclosure::Public {
            fhe.make_publicly_decryptable(handle)?;
        }
        Ok(())
    })
}

pub fn disclose<A: EncryptedAlgebra>(fhe: &mut A, container: &Container) -> FheResult<()> {
    for_each_handle(container, |handle| fhe.make_publicly_decryptable(handle))
}

/// Drops the aggregates of a superseded container record. Handles that are
/// already gone are skipped so a reset always goes through.
pub fn release<A: EncryptedAlgebra>(fhe: &mut A, container: &Container) -> FheResult<()> {
    for_each_handle(container, |handle| match fhe.release(handle) {
        Err(FheError::UnknownHandle) => Ok(()),
        other => other,
    })
}
