//! Off-core decryption.
//!
//! A reader obtains plaintext only through a standing grant on the handle
//! (owner reads) or through the handle's public flag (public reads). Handles
//! that were never granted, or were released, cannot be decrypted.

use soroban_sdk::{Address, Env};

use crate::{coprocessor, CiphertextKind, Euint64, FheError, FheResult};

/// Decrypts `handle` for `reader`.
pub fn reveal_for(env: &Env, handle: &Euint64, reader: &Address) -> FheResult<u64> {
    let record = coprocessor::load(env, &handle.0)?;
    if record.kind != CiphertextKind::Uint64 {
        return Err(FheError::TypeMismatch);
    }
    if !record.public && !record.grantees.contains(reader) {
        return Err(FheError::AccessDenied);
    }
    Ok(record.payload)
}

/// Decrypts a publicly decryptable `handle`.
pub fn public_reveal(env: &Env, handle: &Euint64) -> FheResult<u64> {
    let record = coprocessor::load(env, &handle.0)?;
    if record.kind != CiphertextKind::Uint64 {
        return Err(FheError::TypeMismatch);
    }
    if !record.public {
        return Err(FheError::AccessDenied);
    }
    Ok(record.payload)
}
