//! Container storage and ownership checks.

use soroban_sdk::{log, symbol_short, Address, BytesN, Env, String, Symbol};

use crate::{Container, LedgerError, TTL_EXTEND_TO, TTL_THRESHOLD};

const CONTAINER: Symbol = symbol_short!("CTR");

/// Strkey of the all-zero ed25519 account, the ledger's null principal.
const NULL_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

fn container_key(id: &BytesN<32>) -> (Symbol, BytesN<32>) {
    (CONTAINER, id.clone())
}

pub fn null_principal(env: &Env) -> Address {
    Address::from_string(&String::from_str(env, NULL_ACCOUNT))
}

pub fn is_null_principal(env: &Env, account: &Address) -> bool {
    *account == null_principal(env)
}

pub fn exists(env: &Env, id: &BytesN<32>) -> bool {
    env.storage().persistent().has(&container_key(id))
}

pub fn load(env: &Env, id: &BytesN<32>) -> Result<Container, LedgerError> {
    env.storage()
        .persistent()
        .get(&container_key(id))
        .ok_or(LedgerError::NotFound)
}

/// Loads the container and checks `caller` is its owner.
pub fn load_owned(
    env: &Env,
    id: &BytesN<32>,
    caller: &Address,
) -> Result<Container, LedgerError> {
    let record = load(env, id)?;
    if record.owner != *caller {
        log!(env, "owner check failed", id.clone(), caller.clone());
        return Err(LedgerError::NotOwner);
    }
    Ok(record)
}

pub fn save(env: &Env, id: &BytesN<32>, record: &Container) {
    let key = container_key(id);
    env.storage().persistent().set(&key, record);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}
