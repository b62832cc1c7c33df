//! Events emitted by the aggregation ledger.

use confidential::Euint64;
use soroban_sdk::{symbol_short, Address, BytesN, Env};

fn emit<T: soroban_sdk::IntoVal<Env, soroban_sdk::Val>>(env: &Env, topic: &str, data: T) {
    #[allow(deprecated)]
    env.events()
        .publish((symbol_short!("LEDGER"), soroban_sdk::Symbol::new(env, topic)), data);
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContainerInitializedEvent {
    pub container_id: BytesN<32>,
    pub owner: Address,
    pub timestamp: u64,
}

/// Carries the handle of the new total, never its plaintext.
#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContributionAddedEvent {
    pub container_id: BytesN<32>,
    pub total: Euint64,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContainerMadePublicEvent {
    pub container_id: BytesN<32>,
    pub timestamp: u64,
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputVerifierSetEvent {
    pub admin: Address,
    pub verifier: BytesN<32>,
    pub timestamp: u64,
}

pub fn publish_container_initialized(env: &Env, container_id: BytesN<32>, owner: Address) {
    emit(
        env,
        "CtrInit",
        ContainerInitializedEvent {
            container_id,
            owner,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_contribution_added(env: &Env, container_id: BytesN<32>, total: Euint64) {
    emit(
        env,
        "Contrib",
        ContributionAddedEvent {
            container_id,
            total,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_container_made_public(env: &Env, container_id: BytesN<32>) {
    emit(
        env,
        "CtrPublic",
        ContainerMadePublicEvent {
            container_id,
            timestamp: env.ledger().timestamp(),
        },
    );
}

pub fn publish_input_verifier_set(env: &Env, admin: Address, verifier: BytesN<32>) {
    emit(
        env,
        "VerifSet",
        InputVerifierSetEvent {
            admin,
            verifier,
            timestamp: env.ledger().timestamp(),
        },
    );
}
