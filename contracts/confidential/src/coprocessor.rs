//! Reference coprocessor.
//!
//! A [`Coprocessor`] is an algebra session bound to one contract invocation.
//! Each result is registered under a fresh handle
//! `sha256(op ‖ operands ‖ scalar ‖ counter)` in the session's scratch map and
//! never touches storage. Granting a handle persists it as a single
//! [`Ciphertext`] record under `(FHE_CT, handle)`; releasing it removes that
//! record.

use soroban_sdk::{contracttype, symbol_short, Address, Bytes, BytesN, Env, Map, Symbol, Vec};

use crate::{
    acl, events, input, CiphertextKind, Ebool, EncryptedAlgebra, Euint64, ExternalEuint64,
    FheError, FheResult, InputProof, TTL_EXTEND_TO, TTL_THRESHOLD,
};

const CIPHERTEXT: Symbol = symbol_short!("FHE_CT");
const HANDLE_CTR: Symbol = symbol_short!("FHE_HCTR");

/// Ciphertext record, payload and grants together.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ciphertext {
    pub kind: CiphertextKind,
    pub payload: u64,
    pub grantees: Vec<Address>,
    pub public: bool,
}

fn ciphertext_key(handle: &BytesN<32>) -> (Symbol, BytesN<32>) {
    (CIPHERTEXT, handle.clone())
}

/// Persisted record of `handle`.
pub(crate) fn load(env: &Env, handle: &BytesN<32>) -> FheResult<Ciphertext> {
    env.storage()
        .persistent()
        .get(&ciphertext_key(handle))
        .ok_or(FheError::UnknownHandle)
}

fn store(env: &Env, handle: &BytesN<32>, record: &Ciphertext) {
    let key = ciphertext_key(handle);
    env.storage().persistent().set(&key, record);
    env.storage()
        .persistent()
        .extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
}

pub struct Coprocessor {
    env: Env,
    scratch: Map<BytesN<32>, Ciphertext>,
}

impl Coprocessor {
    /// Opens an algebra session for the current invocation.
    pub fn new(env: &Env) -> Self {
        Self {
            env: env.clone(),
            scratch: Map::new(env),
        }
    }

    /// Installs (or replaces) the ed25519 key that signs input proofs. Proofs
    /// signed by a previous key stop validating immediately.
    pub fn configure(env: &Env, input_verifier: &BytesN<32>) {
        input::set_verifier(env, input_verifier);
    }

    pub fn input_verifier(env: &Env) -> Option<BytesN<32>> {
        input::verifier(env)
    }

    /// True when `handle` has a persisted record.
    pub fn is_registered(env: &Env, handle: &BytesN<32>) -> bool {
        env.storage().persistent().has(&ciphertext_key(handle))
    }

    /// Record of a handle the current contract may compute on: one produced in
    /// this session, or a persisted one granted to the contract.
    fn usable(&self, handle: &BytesN<32>) -> FheResult<Ciphertext> {
        if let Some(record) = self.scratch.get(handle.clone()) {
            return Ok(record);
        }
        let record = load(&self.env, handle)?;
        if !record
            .grantees
            .contains(self.env.current_contract_address())
        {
            return Err(FheError::AccessDenied);
        }
        Ok(record)
    }

    fn operand(&self, handle: &BytesN<32>, kind: CiphertextKind) -> FheResult<u64> {
        let record = self.usable(handle)?;
        if record.kind != kind {
            return Err(FheError::TypeMismatch);
        }
        Ok(record.payload)
    }

    fn next_handle(&self, op: &[u8], operands: &[&BytesN<32>], scalar: u64) -> BytesN<32> {
        let env = &self.env;
        let counter: u64 = env
            .storage()
            .instance()
            .get(&HANDLE_CTR)
            .unwrap_or(0u64)
            .wrapping_add(1);
        env.storage().instance().set(&HANDLE_CTR, &counter);

        let mut buf = Bytes::from_slice(env, op);
        for operand in operands {
            buf.append(&(*operand).clone().into());
        }
        buf.extend_from_array(&scalar.to_be_bytes());
        buf.extend_from_array(&counter.to_be_bytes());
        BytesN::from_array(env, &env.crypto().sha256(&buf).to_array())
    }

    fn register(
        &mut self,
        op: &[u8],
        operands: &[&BytesN<32>],
        scalar: u64,
        kind: CiphertextKind,
        payload: u64,
    ) -> BytesN<32> {
        let handle = self.next_handle(op, operands, scalar);
        let record = Ciphertext {
            kind,
            payload,
            grantees: Vec::new(&self.env),
            public: false,
        };
        self.scratch.set(handle.clone(), record);
        handle
    }

    /// Applies `update` to the record of a usable handle and persists the
    /// result when anything changed. Repeated grants on one handle rewrite the
    /// same storage entry.
    fn update_grants(
        &mut self,
        handle: &BytesN<32>,
        update: impl FnOnce(&mut Ciphertext) -> bool,
    ) -> FheResult<bool> {
        let mut record = self.usable(handle)?;
        let changed = update(&mut record);
        if changed {
            store(&self.env, handle, &record);
            self.scratch.set(handle.clone(), record);
        }
        Ok(changed)
    }
}

impl EncryptedAlgebra for Coprocessor {
    fn zero(&mut self) -> FheResult<Euint64> {
        Ok(Euint64(self.register(b"ZERO", &[], 0, CiphertextKind::Uint64, 0)))
    }

    fn add(&mut self, lhs: &Euint64, rhs: &Euint64) -> FheResult<Euint64> {
        let a = self.operand(&lhs.0, CiphertextKind::Uint64)?;
        let b = self.operand(&rhs.0, CiphertextKind::Uint64)?;
        Ok(Euint64(self.register(
            b"ADD",
            &[&lhs.0, &rhs.0],
            0,
            CiphertextKind::Uint64,
            a.wrapping_add(b),
        )))
    }

    fn eq_scalar(&mut self, lhs: &Euint64, scalar: u64) -> FheResult<Ebool> {
        let a = self.operand(&lhs.0, CiphertextKind::Uint64)?;
        Ok(Ebool(self.register(
            b"EQ",
            &[&lhs.0],
            scalar,
            CiphertextKind::Bool,
            (a == scalar) as u64,
        )))
    }

    fn le_scalar(&mut self, lhs: &Euint64, scalar: u64) -> FheResult<Ebool> {
        let a = self.operand(&lhs.0, CiphertextKind::Uint64)?;
        Ok(Ebool(self.register(
            b"LE",
            &[&lhs.0],
            scalar,
            CiphertextKind::Bool,
            (a <= scalar) as u64,
        )))
    }

    fn select(
        &mut self,
        cond: &Ebool,
        if_true: &Euint64,
        if_false: &Euint64,
    ) -> FheResult<Euint64> {
        let c = self.operand(&cond.0, CiphertextKind::Bool)?;
        let t = self.operand(&if_true.0, CiphertextKind::Uint64)?;
        let f = self.operand(&if_false.0, CiphertextKind::Uint64)?;
        // mask is all ones when c == 1, zero otherwise
        let mask = (c & 1).wrapping_neg();
        Ok(Euint64(self.register(
            b"SELECT",
            &[&cond.0, &if_true.0, &if_false.0],
            0,
            CiphertextKind::Uint64,
            f ^ ((t ^ f) & mask),
        )))
    }

    fn ingest(
        &mut self,
        user: &Address,
        inputs: &Vec<ExternalEuint64>,
        proof: &InputProof,
    ) -> FheResult<Vec<Euint64>> {
        input::verify(&self.env, user, proof)?;

        let mut payloads: Vec<u64> = Vec::new(&self.env);
        for external in inputs.iter() {
            let sealed = input::find(proof, &external).ok_or(FheError::InvalidProof)?;
            if sealed.kind != CiphertextKind::Uint64 {
                return Err(FheError::TypeMismatch);
            }
            payloads.push_back(input::decode_uint64(&sealed.ciphertext)?);
        }

        let mut imported = Vec::new(&self.env);
        for (external, payload) in inputs.iter().zip(payloads.iter()) {
            let handle =
                self.register(b"INPUT", &[&external.0], 0, CiphertextKind::Uint64, payload);
            imported.push_back(Euint64(handle));
        }
        Ok(imported)
    }

    fn allow_this(&mut self, handle: &Euint64) -> FheResult<()> {
        let this = self.env.current_contract_address();
        self.update_grants(&handle.0, |record| acl::grant(record, &this))?;
        Ok(())
    }

    fn allow(&mut self, handle: &Euint64, account: &Address) -> FheResult<()> {
        self.update_grants(&handle.0, |record| acl::grant(record, account))?;
        Ok(())
    }

    fn make_publicly_decryptable(&mut self, handle: &Euint64) -> FheResult<()> {
        if self.update_grants(&handle.0, acl::grant_public)? {
            events::publish_public_decrypt(&self.env, handle.0.clone());
        }
        Ok(())
    }

    fn release(&mut self, handle: &Euint64) -> FheResult<()> {
        self.usable(&handle.0)?;
        self.scratch.remove(handle.0.clone());
        self.env
            .storage()
            .persistent()
            .remove(&ciphertext_key(&handle.0));
        Ok(())
    }
}
