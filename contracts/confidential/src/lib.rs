//! Encrypted-value algebra for confidential contracts.
//!
//! This crate provides:
//! - [`Euint64`] / [`Ebool`]: opaque handles to ciphertexts. Handles are safe
//!   to store, return and publish; they carry no plaintext.
//! - [`EncryptedAlgebra`]: the operations a confidential contract may run on
//!   handles without decrypting them (zero, add, compare, select), proof-checked
//!   ingestion of client ciphertexts, and decryption grants.
//! - [`Coprocessor`]: the reference implementation of the algebra. Persisted
//!   ciphertext records (with their grants) and the input-verifier key live in
//!   the storage of the contract that links this crate.
//! - [`input`]: attested client inputs (`InputProof`).
//! - [`disclosure`]: off-core decryption for authorised and public readers.
//!
//! Every operation returns a *fresh* handle. A fresh handle lives only in the
//! algebra session that produced it and vanishes when the invocation ends;
//! anything the contract wants to keep must be granted explicitly with
//! [`EncryptedAlgebra::allow_this`]. Only granted handles reach storage.

#![no_std]

use soroban_sdk::{contracterror, contracttype, Address, BytesN, Vec};

// ── Modules ──────────────────────────────────────────────────────────────────

pub mod acl;
pub mod coprocessor;
pub mod disclosure;
pub mod events;
pub mod input;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;


/// Persisted ciphertext records are extended to `TTL_EXTEND_TO` ledgers
/// whenever their remaining lifetime drops below `TTL_THRESHOLD`.
pub(crate) const TTL_THRESHOLD: u32 = 5_184_000;
pub(crate) const TTL_EXTEND_TO: u32 = 10_368_000;

pub use coprocessor::Coprocessor;
pub use input::{ExternalEuint64, InputProof, SealedInput};

// ── Handles ──────────────────────────────────────────────────────────────────

/// Handle to an encrypted unsigned 64-bit integer.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Euint64(pub BytesN<32>);

/// Handle to an encrypted boolean. Produced by comparisons, consumed by
/// [`EncryptedAlgebra::select`].
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ebool(pub BytesN<32>);

/// Plaintext type behind a handle.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum CiphertextKind {
    Bool = 0,
    Uint64 = 1,
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum FheError {
    /// No ciphertext is registered under the handle.
    UnknownHandle = 1,
    /// The computing contract (or reader) holds no grant on the handle.
    AccessDenied = 2,
    /// The input proof does not attest every supplied external handle.
    InvalidProof = 3,
    /// The handle refers to a ciphertext of another kind.
    TypeMismatch = 4,
    /// No input verifier key has been configured.
    NotConfigured = 5,
}

pub type FheResult<T> = Result<T, FheError>;

// ── Algebra ──────────────────────────────────────────────────────────────────

/// Operations over encrypted values, evaluated within one algebra session.
///
/// A session belongs to a single contract invocation. Results of operations
/// and ingested inputs are usable for the rest of the session without any
/// storage footprint; only handles that receive a standing grant are
/// persisted.
///
/// Implementations must never branch on, store in the clear, or otherwise leak
/// the plaintext behind a handle to the calling contract.
pub trait EncryptedAlgebra {
    /// Trivial encryption of `0`.
    fn zero(&mut self) -> FheResult<Euint64>;

    /// Homomorphic addition, wrapping modulo 2^64.
    fn add(&mut self, lhs: &Euint64, rhs: &Euint64) -> FheResult<Euint64>;

    /// Encrypted `lhs == scalar`.
    fn eq_scalar(&mut self, lhs: &Euint64, scalar: u64) -> FheResult<Ebool>;

    /// Encrypted `lhs <= scalar`.
    fn le_scalar(&mut self, lhs: &Euint64, scalar: u64) -> FheResult<Ebool>;

    /// Encrypted `if cond { if_true } else { if_false }`.
    fn select(
        &mut self,
        cond: &Ebool,
        if_true: &Euint64,
        if_false: &Euint64,
    ) -> FheResult<Euint64>;

    /// Imports client ciphertexts attested by a single proof. Either every
    /// input is imported or none is.
    fn ingest(
        &mut self,
        user: &Address,
        inputs: &Vec<ExternalEuint64>,
        proof: &InputProof,
    ) -> FheResult<Vec<Euint64>>;

    /// Standing grant for the computing contract itself.
    fn allow_this(&mut self, handle: &Euint64) -> FheResult<()>;

    /// Standing read grant for `account`.
    fn allow(&mut self, handle: &Euint64, account: &Address) -> FheResult<()>;

    /// Marks the handle decryptable by everyone.
    fn make_publicly_decryptable(&mut self, handle: &Euint64) -> FheResult<()>;

    /// Drops the handle together with every grant on it. Used for aggregates
    /// that have been superseded and must no longer occupy storage.
    fn release(&mut self, handle: &Euint64) -> FheResult<()>;
}
