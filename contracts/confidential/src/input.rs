//! Attested client inputs.
//!
//! A client encrypts its values off-chain and obtains an [`InputProof`] from
//! the input verifier: an ed25519 signature binding the sealed ciphertexts to
//! the consuming contract and to the submitting account. The contract refers
//! to each ciphertext by its [`ExternalEuint64`] handle and passes the proof
//! alongside.
//!
//! Signed message:
//! `sha256("CONF_INPUT_V1" ‖ xdr(contract) ‖ xdr(user) ‖ Σ(handle ‖ kind ‖ len ‖ ciphertext))`

use ed25519_dalek::{Signature, VerifyingKey};
use soroban_sdk::{
    contracttype, symbol_short, xdr::ToXdr, Address, Bytes, BytesN, Env, Symbol, Vec,
};

use crate::{CiphertextKind, FheError, FheResult};

const INPUT_VERIFIER: Symbol = symbol_short!("FHE_IVK");

const DOMAIN_TAG: &[u8] = b"CONF_INPUT_V1";

/// Handle chosen by the client for a ciphertext it sealed.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExternalEuint64(pub BytesN<32>);

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SealedInput {
    pub handle: BytesN<32>,
    pub kind: CiphertextKind,
    pub ciphertext: Bytes,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InputProof {
    pub ciphertexts: Vec<SealedInput>,
    pub signature: BytesN<64>,
}

pub fn set_verifier(env: &Env, key: &BytesN<32>) {
    env.storage().instance().set(&INPUT_VERIFIER, key);
}

pub fn verifier(env: &Env) -> Option<BytesN<32>> {
    env.storage().instance().get(&INPUT_VERIFIER)
}

/// Digest the input verifier signs for `user` submitting `ciphertexts` to `contract`.
pub fn input_digest(
    env: &Env,
    contract: &Address,
    user: &Address,
    ciphertexts: &Vec<SealedInput>,
) -> BytesN<32> {
    let mut buf = Bytes::from_slice(env, DOMAIN_TAG);
    buf.append(&contract.clone().to_xdr(env));
    buf.append(&user.clone().to_xdr(env));
    for sealed in ciphertexts.iter() {
        buf.append(&sealed.handle.clone().into());
        buf.extend_from_array(&(sealed.kind as u32).to_be_bytes());
        buf.extend_from_array(&sealed.ciphertext.len().to_be_bytes());
        buf.append(&sealed.ciphertext);
    }
    BytesN::from_array(env, &env.crypto().sha256(&buf).to_array())
}

/// Checks the verifier signature over the whole proof for the current contract.
pub fn verify(env: &Env, user: &Address, proof: &InputProof) -> FheResult<()> {
    let key = verifier(env).ok_or(FheError::NotConfigured)?;
    let key = VerifyingKey::from_bytes(&key.to_array()).map_err(|_| FheError::InvalidProof)?;
    let signature = Signature::from_bytes(&proof.signature.to_array());

    let digest = input_digest(
        env,
        &env.current_contract_address(),
        user,
        &proof.ciphertexts,
    );
    key.verify_strict(&digest.to_array(), &signature)
        .map_err(|_| FheError::InvalidProof)
}

/// Sealed ciphertext the proof carries for `handle`, if any.
pub fn find(proof: &InputProof, handle: &ExternalEuint64) -> Option<SealedInput> {
    proof.ciphertexts.iter().find(|sealed| sealed.handle == handle.0)
}

/// Reference ciphertext encoding: 8 bytes, big-endian.
pub(crate) fn decode_uint64(ciphertext: &Bytes) -> FheResult<u64> {
    if ciphertext.len() != 8 {
        return Err(FheError::TypeMismatch);
    }
    let mut raw = [0u8; 8];
    ciphertext.copy_into_slice(&mut raw);
    Ok(u64::from_be_bytes(raw))
}
