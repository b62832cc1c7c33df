//! Client-side sealing and proof signing for tests.

extern crate std;

use core::cell::Cell;

use ed25519_dalek::{Signer, SigningKey};
use soroban_sdk::{Address, Bytes, BytesN, Env, Vec};

use crate::input::{input_digest, ExternalEuint64, InputProof, SealedInput};
use crate::CiphertextKind;

/// Plays the client and the input verifier at once.
pub struct InputSigner {
    key: SigningKey,
    nonce: Cell<u64>,
}

impl InputSigner {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
            nonce: Cell::new(0),
        }
    }

    /// Verifier key to install in the coprocessor.
    pub fn public_key(&self, env: &Env) -> BytesN<32> {
        BytesN::from_array(env, &self.key.verifying_key().to_bytes())
    }

    /// Seals one uint64 under a fresh client handle.
    pub fn seal_value(&self, env: &Env, value: u64) -> SealedInput {
        let nonce = self.nonce.get().wrapping_add(1);
        self.nonce.set(nonce);

        let mut buf = Bytes::from_slice(env, b"CLIENT");
        buf.extend_from_array(&nonce.to_be_bytes());
        buf.extend_from_array(&value.to_be_bytes());
        SealedInput {
            handle: BytesN::from_array(env, &env.crypto().sha256(&buf).to_array()),
            kind: CiphertextKind::Uint64,
            ciphertext: Bytes::from_array(env, &value.to_be_bytes()),
        }
    }

    /// Signs an arbitrary set of sealed inputs.
    pub fn sign(
        &self,
        env: &Env,
        contract: &Address,
        user: &Address,
        ciphertexts: Vec<SealedInput>,
    ) -> InputProof {
        let digest = input_digest(env, contract, user, &ciphertexts);
        let signature = self.key.sign(&digest.to_array());
        InputProof {
            ciphertexts,
            signature: BytesN::from_array(env, &signature.to_bytes()),
        }
    }

    /// Seals `values` for `user` submitting to `contract`; returns the external
    /// handles in the same order plus one proof covering all of them.
    pub fn seal(
        &self,
        env: &Env,
        contract: &Address,
        user: &Address,
        values: &[u64],
    ) -> (std::vec::Vec<ExternalEuint64>, InputProof) {
        let mut sealed = Vec::new(env);
        let mut externals = std::vec::Vec::new();
        for value in values {
            let input = self.seal_value(env, *value);
            externals.push(ExternalEuint64(input.handle.clone()));
            sealed.push_back(input);
        }
        (externals, self.sign(env, contract, user, sealed))
    }
}
