//! Events emitted by the coprocessor.

use soroban_sdk::{symbol_short, BytesN, Env, Symbol};

fn emit<T: soroban_sdk::IntoVal<Env, soroban_sdk::Val>>(env: &Env, topic: &str, data: T) {
    #[allow(deprecated)]
    env.events()
        .publish((symbol_short!("FHE"), Symbol::new(env, topic)), data);
}

#[soroban_sdk::contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicDecryptEvent {
    pub handle: BytesN<32>,
    pub timestamp: u64,
}

pub fn publish_public_decrypt(env: &Env, handle: BytesN<32>) {
    emit(
        env,
        "PubDecrypt",
        PublicDecryptEvent {
            handle,
            timestamp: env.ledger().timestamp(),
        },
    );
}
