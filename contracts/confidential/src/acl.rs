//! Access-control list over ciphertext handles.
//!
//! Grants are kept on the persisted ciphertext record itself, so one storage
//! entry per handle holds the payload, its grantees and its public flag:
//! - **standing**: an account in `grantees` may use (if it is the computing
//!   contract) or decrypt the handle;
//! - **public**: anyone may decrypt the handle.
//!
//! Session-local results carry no grants at all. The session that produced
//! them may compute on them until the invocation ends.

use soroban_sdk::{Address, BytesN, Env};

use crate::coprocessor::{self, Ciphertext};

/// Adds `account` to the record's grantees. Returns `false` if it was there.
pub(crate) fn grant(record: &mut Ciphertext, account: &Address) -> bool {
    if record.grantees.contains(account) {
        return false;
    }
    record.grantees.push_back(account.clone());
    true
}

/// Sets the public flag. Returns `false` if it was already set.
pub(crate) fn grant_public(record: &mut Ciphertext) -> bool {
    if record.public {
        return false;
    }
    record.public = true;
    true
}

/// Standing grant only.
pub fn is_allowed(env: &Env, handle: &BytesN<32>, account: &Address) -> bool {
    coprocessor::load(env, handle)
        .map(|record| record.grantees.contains(account))
        .unwrap_or(false)
}

pub fn is_publicly_decryptable(env: &Env, handle: &BytesN<32>) -> bool {
    coprocessor::load(env, handle)
        .map(|record| record.public)
        .unwrap_or(false)
}
