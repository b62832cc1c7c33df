//! Fold and one-hot routing.
//!
//! A contribution is folded as:
//!
//! ```text
//! in_range  = category <= N - 1
//! effective = select(in_range, amount, 0)
//! total    += effective
//! for i in 0..N:
//!     bucket[i] += select(category == i, effective, 0)
//! ```
//!
//! All N comparisons are evaluated for every contribution. The category is
//! never decrypted and nothing downstream depends on its value, so the
//! sequence of algebra calls is identical for every input. An out-of-range
//! category yields `effective = 0`: neither the total nor any bucket moves.

use confidential::{EncryptedAlgebra, Euint64, FheError, FheResult};
use soroban_sdk::{Env, Vec};

use crate::CATEGORY_COUNT;

/// Encrypted total plus its `CATEGORY_COUNT` buckets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Aggregates {
    pub total: Euint64,
    pub buckets: Vec<Euint64>,
}

/// Fresh encrypted zeros for the total and for every bucket.
pub fn zeroed<A: EncryptedAlgebra>(env: &Env, fhe: &mut A) -> FheResult<Aggregates> {
    let total = fhe.zero()?;
    let mut buckets = Vec::new(env);
    for _ in 0..CATEGORY_COUNT {
        buckets.push_back(fhe.zero()?);
    }
    Ok(Aggregates { total, buckets })
}

pub fn fold<A: EncryptedAlgebra>(
    env: &Env,
    fhe: &mut A,
    current: &Aggregates,
    amount: &Euint64,
    category: &Euint64,
) -> FheResult<Aggregates> {
    let zero = fhe.zero()?;

    let in_range = fhe.le_scalar(category, u64::from(CATEGORY_COUNT - 1))?;
    let effective = fhe.select(&in_range, amount, &zero)?;

    let total = fhe.add(&current.total, &effective)?;

    let mut buckets = Vec::new(env);
    for i in 0..CATEGORY_COUNT {
        let bucket = current.buckets.get(i).ok_or(FheError::UnknownHandle)?;
        let is_this_bucket = fhe.eq_scalar(category, u64::from(i))?;
        let increment = fhe.select(&is_this_bucket, &effective, &zero)?;
        buckets.push_back(fhe.add(&bucket, &increment)?);
    }

    Ok(Aggregates { total, buckets })
}
