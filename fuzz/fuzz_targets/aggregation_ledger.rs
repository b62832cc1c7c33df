#![no_main]

use aggregation_ledger::{
    AggregationLedgerContract, AggregationLedgerContractClient, CATEGORY_COUNT,
};
use arbitrary::Arbitrary;
use confidential::{disclosure, testutils::InputSigner, Euint64};
use libfuzzer_sys::fuzz_target;
use soroban_sdk::{
    testutils::{Address as _, Ledger as _},
    Address, BytesN, Env,
};

/// Actions covering every state-changing ledger entry point.
///
/// Categories are a full byte so most land outside the bucket range and
/// exercise the range gate.
#[derive(Arbitrary, Debug)]
pub enum FuzzAction {
    Contribute { caller: u8, amount: u64, category: u8 },
    ForgedContribute { caller: u8, amount: u64, category: u8 },
    MakePublic { caller: u8 },
    Reinitialize { owner: u8 },
    AdvanceLedgers { count: u8 },
}

fn reveal(env: &Env, contract: &Address, handle: &Euint64, reader: &Address) -> u64 {
    env.as_contract(contract, || disclosure::reveal_for(env, handle, reader))
        .expect("owner lost its read grant")
}

fuzz_target!(|actions: Vec<FuzzAction>| {
    let env = Env::default();
    env.mock_all_auths();
    #[allow(deprecated)]
    env.budget().reset_unlimited();

    let signer = InputSigner::from_seed([42u8; 32]);
    let rogue = InputSigner::from_seed([13u8; 32]);
    let admin = Address::generate(&env);
    let contract_id = env.register(
        AggregationLedgerContract,
        (admin.clone(), signer.public_key(&env)),
    );
    let client = AggregationLedgerContractClient::new(&env, &contract_id);

    let users: Vec<Address> = (0..3).map(|_| Address::generate(&env)).collect();
    let id = BytesN::from_array(&env, &[7u8; 32]);
    client.initialize(&id, &users[0]);

    // ── Plaintext model ──
    let mut owner = 0usize;
    let mut total = 0u64;
    let mut buckets = vec![0u64; CATEGORY_COUNT as usize];

    for action in actions.into_iter().take(32) {
        match action {
            FuzzAction::Contribute { caller, amount, category } => {
                let idx = caller as usize % users.len();
                let (externals, proof) =
                    signer.seal(&env, &contract_id, &users[idx], &[amount, u64::from(category)]);
                let result = client.try_add_contribution(
                    &users[idx],
                    &id,
                    &externals[0],
                    &externals[1],
                    &proof,
                );
                assert_eq!(result.is_ok(), idx == owner, "ownership gate disagrees with model");
                if result.is_ok() && u32::from(category) < CATEGORY_COUNT {
                    total = total.wrapping_add(amount);
                    let b = &mut buckets[category as usize];
                    *b = b.wrapping_add(amount);
                }
            }
            FuzzAction::ForgedContribute { caller, amount, category } => {
                let idx = caller as usize % users.len();
                let (externals, proof) =
                    rogue.seal(&env, &contract_id, &users[idx], &[amount, u64::from(category)]);
                let result = client.try_add_contribution(
                    &users[idx],
                    &id,
                    &externals[0],
                    &externals[1],
                    &proof,
                );
                assert!(result.is_err(), "INVARIANT VIOLATION: forged proof accepted");
            }
            FuzzAction::MakePublic { caller } => {
                let idx = caller as usize % users.len();
                let result = client.try_make_public(&users[idx], &id);
                assert_eq!(result.is_ok(), idx == owner);
            }
            FuzzAction::Reinitialize { owner: next } => {
                owner = next as usize % users.len();
                client.initialize(&id, &users[owner]);
                total = 0;
                buckets.iter_mut().for_each(|b| *b = 0);
            }
            FuzzAction::AdvanceLedgers { count } => {
                let seq = env.ledger().sequence();
                env.ledger().set_sequence_number(seq.saturating_add(u32::from(count)));
            }
        }

        // ── Post-action invariant checks ──
        let record = client.get_container(&id);
        assert_eq!(record.owner, users[owner]);
        assert_eq!(record.buckets.len(), CATEGORY_COUNT);

        let decrypted_total = reveal(&env, &contract_id, &record.total, &record.owner);
        assert_eq!(decrypted_total, total, "INVARIANT VIOLATION: total diverged from model");

        let mut sum = 0u64;
        for (i, handle) in record.buckets.iter().enumerate() {
            let value = reveal(&env, &contract_id, &handle, &record.owner);
            assert_eq!(value, buckets[i], "INVARIANT VIOLATION: bucket {} diverged", i);
            sum = sum.wrapping_add(value);
        }
        assert_eq!(sum, decrypted_total, "INVARIANT VIOLATION: buckets do not sum to total");
    }
});
