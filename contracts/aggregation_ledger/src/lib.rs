//! # Confidential Aggregation Ledger
//!
//! Keeps a running encrypted total per container, partitioned into
//! `CATEGORY_COUNT` encrypted category buckets. Neither the contributed
//! amounts nor their categories are ever decrypted by the ledger.
//!
//! ## Container lifecycle
//! ```text
//! initialize ──► Private ──make_public──► Public
//!     ▲             │                        │
//!     └─────────────┴──── initialize ────────┘   (destructive reset)
//! ```
//!
//! ## Contribution fold
//! 1. ingest amount and category with one shared input proof
//! 2. range gate: out-of-range categories contribute zero
//! 3. add the effective amount to the total
//! 4. one-hot route the effective amount into its bucket (see [`routing`])
//! 5. re-assert grants on every new handle (see [`access`])
//! 6. release the handles the container held before
//!
//! Any failure returns before the container record is written; the host rolls
//! back everything else the invocation touched.
#![no_std]

pub mod access;
pub mod container;
pub mod events;
pub mod routing;


use confidential::{Coprocessor, EncryptedAlgebra, Euint64, ExternalEuint64, FheError, InputProof};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, log, symbol_short, vec, Address, Bytes,
    BytesN, Env, Symbol, Vec,
};

use routing::Aggregates;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Number of category buckets per container.
pub const CATEGORY_COUNT: u32 = 8;

const ADMIN: Symbol = symbol_short!("ADMIN");

pub(crate) const TTL_THRESHOLD: u32 = 5_184_000;
pub(crate) const TTL_EXTEND_TO: u32 = 10_368_000;

fn extend_ttl_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(TTL_THRESHOLD, TTL_EXTEND_TO);
}

type Algebra = Coprocessor;

// ── Types ─────────────────────────────────────────────────────────────────────

/// Who may decrypt a container's aggregates. `Private → Public` is the only
/// transition; re-initialization starts over at `Private`.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Disclosure {
    Private = 0,
    Public = 1,
}

/// Per-container record. Presence in storage means the container exists.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Container {
    pub owner: Address,
    pub total: Euint64,
    /// Always exactly `CATEGORY_COUNT` handles.
    pub buckets: Vec<Euint64>,
    pub disclosure: Disclosure,
}

impl Container {
    fn aggregates(&self) -> Aggregates {
        Aggregates {
            total: self.total.clone(),
            buckets: self.buckets.clone(),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum LedgerError {
    NotFound = 1,
    NotOwner = 2,
    InvalidOwner = 3,
    InvalidProof = 4,
    AlgebraFault = 5,
    Unauthorized = 6,
    NotConfigured = 7,
}

fn map_fhe_error(e: FheError) -> LedgerError {
    match e {
        FheError::InvalidProof => LedgerError::InvalidProof,
        FheError::NotConfigured => LedgerError::NotConfigured,
        FheError::UnknownHandle | FheError::AccessDenied | FheError::TypeMismatch => {
            LedgerError::AlgebraFault
        }
    }
}

// ── Contract ──────────────────────────────────────────────────────────────────

#[contract]
pub struct AggregationLedgerContract;

#[contractimpl]
impl AggregationLedgerContract {
    pub fn __constructor(env: Env, admin: Address, input_verifier: BytesN<32>) {
        env.storage().instance().set(&ADMIN, &admin);
        Coprocessor::configure(&env, &input_verifier);
        extend_ttl_instance(&env);
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Creates the container, or wipes it if it already exists: fresh zero
    /// aggregates, `owner` as the new owner, disclosure back to `Private`.
    pub fn initialize(
        env: Env,
        container_id: BytesN<32>,
        owner: Address,
    ) -> Result<(), LedgerError> {
        if container::is_null_principal(&env, &owner) {
            log!(&env, "initialize rejected: null owner", container_id);
            return Err(LedgerError::InvalidOwner);
        }
        owner.require_auth();
        extend_ttl_instance(&env);

        let mut fhe = Algebra::new(&env);
        let zeroed = routing::zeroed(&env, &mut fhe).map_err(map_fhe_error)?;
        let record = Container {
            owner: owner.clone(),
            total: zeroed.total,
            buckets: zeroed.buckets,
            disclosure: Disclosure::Private,
        };
        access::reassert_grants(&mut fhe, &record).map_err(map_fhe_error)?;
        if let Ok(previous) = container::load(&env, &container_id) {
            access::release(&mut fhe, &previous).map_err(map_fhe_error)?;
        }
        container::save(&env, &container_id, &record);

        events::publish_container_initialized(&env, container_id, owner);
        Ok(())
    }

    // ── Contributions ─────────────────────────────────────────────────────────

    /// Folds an encrypted `amount` into the total and into the bucket selected
    /// by the encrypted `category`. Owner only.
    pub fn add_contribution(
        env: Env,
        caller: Address,
        container_id: BytesN<32>,
        amount: ExternalEuint64,
        category: ExternalEuint64,
        proof: InputProof,
    ) -> Result<(), LedgerError> {
        caller.require_auth();
        let record = container::load_owned(&env, &container_id, &caller)?;
        extend_ttl_instance(&env);

        let mut fhe = Algebra::new(&env);
        let imported = fhe
            .ingest(&caller, &vec![&env, amount, category], &proof)
            .map_err(map_fhe_error)?;
        let amount = imported.get(0).ok_or(LedgerError::AlgebraFault)?;
        let category = imported.get(1).ok_or(LedgerError::AlgebraFault)?;

        let folded = routing::fold(&env, &mut fhe, &record.aggregates(), &amount, &category)
            .map_err(map_fhe_error)?;
        let updated = Container {
            total: folded.total,
            buckets: folded.buckets,
            owner: record.owner.clone(),
            disclosure: record.disclosure,
        };
        access::reassert_grants(&mut fhe, &updated).map_err(map_fhe_error)?;
        access::release(&mut fhe, &record).map_err(map_fhe_error)?;
        container::save(&env, &container_id, &updated);

        events::publish_contribution_added(&env, container_id, updated.total);
        Ok(())
    }

    // ── Disclosure ────────────────────────────────────────────────────────────

    /// Makes the total and every bucket decryptable by anyone. Owner only;
    /// there is no way back to `Private` short of re-initialization.
    pub fn make_public(
        env: Env,
        caller: Address,
        container_id: BytesN<32>,
    ) -> Result<(), LedgerError> {
        caller.require_auth();
        let mut record = container::load_owned(&env, &container_id, &caller)?;
        extend_ttl_instance(&env);

        access::disclose(&mut Algebra::new(&env), &record).map_err(map_fhe_error)?;
        record.disclosure = Disclosure::Public;
        container::save(&env, &container_id, &record);

        events::publish_container_made_public(&env, container_id);
        Ok(())
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn get_total_handle(env: Env, container_id: BytesN<32>) -> Result<Euint64, LedgerError> {
        Ok(container::load(&env, &container_id)?.total)
    }

    pub fn get_category_handles(
        env: Env,
        container_id: BytesN<32>,
    ) -> Result<Vec<Euint64>, LedgerError> {
        Ok(container::load(&env, &container_id)?.buckets)
    }

    pub fn get_owner(env: Env, container_id: BytesN<32>) -> Result<Address, LedgerError> {
        Ok(container::load(&env, &container_id)?.owner)
    }

    pub fn get_disclosure(env: Env, container_id: BytesN<32>) -> Result<Disclosure, LedgerError> {
        Ok(container::load(&env, &container_id)?.disclosure)
    }

    pub fn get_container(env: Env, container_id: BytesN<32>) -> Result<Container, LedgerError> {
        container::load(&env, &container_id)
    }

    pub fn exists(env: Env, container_id: BytesN<32>) -> bool {
        container::exists(&env, &container_id)
    }

    pub fn category_count() -> u32 {
        CATEGORY_COUNT
    }

    /// Container id for a human-readable key: `sha256(label)`.
    pub fn derive_container_id(env: Env, label: Bytes) -> BytesN<32> {
        BytesN::from_array(&env, &env.crypto().sha256(&label).to_array())
    }

    // ── Administration ────────────────────────────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, LedgerError> {
        env.storage()
            .instance()
            .get(&ADMIN)
            .ok_or(LedgerError::NotConfigured)
    }

    pub fn get_input_verifier(env: Env) -> Result<BytesN<32>, LedgerError> {
        Coprocessor::input_verifier(&env).ok_or(LedgerError::NotConfigured)
    }

    /// Replaces the key that signs input proofs.
    pub fn set_input_verifier(
        env: Env,
        admin: Address,
        verifier: BytesN<32>,
    ) -> Result<(), LedgerError> {
        admin.require_auth();
        let stored = Self::get_admin(env.clone())?;
        if stored != admin {
            return Err(LedgerError::Unauthorized);
        }

        Coprocessor::configure(&env, &verifier);
        extend_ttl_instance(&env);
        events::publish_input_verifier_set(&env, admin, verifier);
        Ok(())
    }
}
