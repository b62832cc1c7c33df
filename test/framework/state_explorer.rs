//! # State Space Explorer
//!
//! Executes action sequences against one container and, after every
//! transition, checks:
//! - the snapshot invariants,
//! - the transition invariants that apply to the action and its outcome,
//! - agreement with a [`PlaintextContainer`] model,
//! - that the ledger accepted or rejected the action as the model predicts.

extern crate std;

use aggregation_ledger::LedgerError;
use confidential::testutils::InputSigner;
use soroban_sdk::{Address, BytesN};
use std::string::String;
use std::vec::Vec;

use super::generators::LedgerAction;
use super::invariants::{
    ContributionFold, HandleFreshness, InvariantSet, TransitionInvariantSet, Unchanged,
};
use super::{
    ActionOutcome, LedgerSnapshot, LedgerTestHarness, PlaintextContainer, TestRunSummary,
    ROGUE_SEED,
};

// ── Explorer Configuration ───────────────────────────────────────────────────

/// Configuration for state-space exploration.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Maximum number of actions to execute in a single exploration run.
    pub max_steps: usize,
    /// Whether to halt on the first invariant violation (fail-fast).
    pub fail_fast: bool,
    /// Whether to record snapshots for later analysis.
    pub record_snapshots: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            fail_fast: true,
            record_snapshots: false,
        }
    }
}

// ── Exploration Result ───────────────────────────────────────────────────────

/// Full result of an exploration run.
#[derive(Debug)]
pub struct ExplorationResult {
    pub summary: TestRunSummary,
    pub snapshots: Vec<LedgerSnapshot>,
    pub action_log: Vec<(LedgerAction, ActionOutcome)>,
    pub model: PlaintextContainer,
}

impl ExplorationResult {
    pub fn passed(&self) -> bool {
        self.summary.passed()
    }
}

// ── State Space Explorer ─────────────────────────────────────────────────────

/// Drives one container through an action sequence, tracking coverage and
/// every disagreement with the plaintext model.
pub struct StateExplorer<'a> {
    harness: &'a LedgerTestHarness<'a>,
    invariants: InvariantSet,
    config: ExplorerConfig,
    users: Vec<Address>,
    container_id: BytesN<32>,
    model: PlaintextContainer,
    rogue: InputSigner,
}

impl<'a> StateExplorer<'a> {
    /// Create an explorer over a fresh container owned by `users[0]`.
    pub fn new(
        harness: &'a LedgerTestHarness<'a>,
        invariants: InvariantSet,
        config: ExplorerConfig,
        users: Vec<Address>,
    ) -> Self {
        assert!(!users.is_empty(), "explorer needs at least one user");
        let container_id = harness.container_id("explorer");
        harness
            .initialize(&container_id, &users[0])
            .expect("initial container");

        Self {
            harness,
            invariants,
            config,
            users,
            container_id,
            model: PlaintextContainer::new(0),
            rogue: InputSigner::from_seed(ROGUE_SEED),
        }
    }

    /// Create an explorer with default configuration and built-in invariants.
    pub fn with_defaults(harness: &'a LedgerTestHarness<'a>, users: Vec<Address>) -> Self {
        Self::new(
            harness,
            InvariantSet::ledger_defaults(),
            ExplorerConfig::default(),
            users,
        )
    }

    pub fn container_id(&self) -> &BytesN<32> {
        &self.container_id
    }

    /// Execute a sequence of actions, checking invariants after each.
    pub fn explore(&mut self, actions: &[LedgerAction]) -> ExplorationResult {
        let mut summary = TestRunSummary::new();
        let mut snapshots = Vec::new();
        let mut action_log = Vec::new();

        let mut before = self.harness.snapshot(&self.container_id);
        if self.config.record_snapshots {
            snapshots.push(before.clone());
        }

        let steps = actions.len().min(self.config.max_steps);

        for action in actions.iter().take(steps) {
            let expected = self.expected_outcome(action);
            let outcome = self.execute_action(action);
            summary.entry_points_hit.insert(action_entry_point(action));
            summary.actions_executed += 1;
            summary.transitions_observed += 1;

            let after = self.harness.snapshot(&self.container_id);
            summary.invariant_checks += 1;

            let mut violations = self.invariants.check_all(&after);
            violations.extend(transition_checks(action, &outcome).check_all(&before, &after));
            if let Err(msg) = outcome_matches(&expected, &outcome) {
                violations.push((String::from("ledger accepts exactly what the model accepts"), msg));
            }
            if let Err(msg) = self.model.matches(&after) {
                violations.push((String::from("decrypted state matches plaintext model"), msg));
            }

            action_log.push((action.clone(), outcome));

            let failed = !violations.is_empty();
            for (name, msg) in violations {
                summary.invariant_violations.push(std::format!(
                    "After action #{} ({:?}): [{}] {}",
                    summary.actions_executed,
                    action,
                    name,
                    msg
                ));
            }

            if self.config.record_snapshots {
                snapshots.push(after.clone());
            }
            if failed && self.config.fail_fast {
                break;
            }
            before = after;
        }

        ExplorationResult {
            summary,
            snapshots,
            action_log,
            model: self.model.clone(),
        }
    }

    fn user(&self, index: usize) -> &Address {
        &self.users[index % self.users.len()]
    }

    fn is_owner(&self, index: usize) -> bool {
        index % self.users.len() == self.model.owner_index
    }

    /// Error the ledger should return for `action` in the current model
    /// state, or `None` when it should succeed.
    fn expected_outcome(&self, action: &LedgerAction) -> Option<LedgerError> {
        match action {
            LedgerAction::Contribute { user_index, .. }
            | LedgerAction::MakePublic { user_index } => {
                (!self.is_owner(*user_index)).then_some(LedgerError::NotOwner)
            }
            LedgerAction::ForgedContribute { user_index, .. } => {
                if self.is_owner(*user_index) {
                    Some(LedgerError::InvalidProof)
                } else {
                    Some(LedgerError::NotOwner)
                }
            }
            LedgerAction::Reinitialize { .. } | LedgerAction::AdvanceLedgers { .. } => None,
        }
    }

    /// Execute a single action, updating the model when the ledger accepts it.
    fn execute_action(&mut self, action: &LedgerAction) -> ActionOutcome {
        let id = &self.container_id;
        let result = match action {
            LedgerAction::Contribute {
                user_index,
                amount,
                category,
            } => self
                .harness
                .contribute(self.user(*user_index), id, *amount, *category),
            LedgerAction::ForgedContribute {
                user_index,
                amount,
                category,
            } => self.harness.contribute_signed(
                &self.rogue,
                self.user(*user_index),
                id,
                *amount,
                *category,
            ),
            LedgerAction::MakePublic { user_index } => {
                self.harness.make_public(self.user(*user_index), id)
            }
            LedgerAction::Reinitialize { owner_index } => {
                self.harness.initialize(id, self.user(*owner_index))
            }
            LedgerAction::AdvanceLedgers { count } => {
                self.harness.env.advance_ledgers(*count);
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                self.apply_to_model(action);
                ActionOutcome::Ok
            }
            Err(e) => ActionOutcome::ExpectedError(e as u32),
        }
    }

    fn apply_to_model(&mut self, action: &LedgerAction) {
        match action {
            LedgerAction::Contribute {
                amount, category, ..
            } => self.model.contribute(*amount, *category),
            LedgerAction::MakePublic { .. } => self.model.public = true,
            LedgerAction::Reinitialize { owner_index } => {
                self.model = PlaintextContainer::new(owner_index % self.users.len());
            }
            LedgerAction::ForgedContribute { .. } | LedgerAction::AdvanceLedgers { .. } => {}
        }
    }
}

fn transition_checks(action: &LedgerAction, outcome: &ActionOutcome) -> TransitionInvariantSet {
    let mut set = TransitionInvariantSet::new();
    match (action, outcome) {
        (
            LedgerAction::Contribute {
                amount, category, ..
            },
            ActionOutcome::Ok,
        ) => {
            set.add(Box::new(ContributionFold {
                amount: *amount,
                category: *category,
            }));
            set.add(Box::new(HandleFreshness));
        }
        (_, ActionOutcome::ExpectedError(_)) => set.add(Box::new(Unchanged)),
        _ => {}
    }
    set
}

fn outcome_matches(expected: &Option<LedgerError>, outcome: &ActionOutcome) -> Result<(), String> {
    match (expected, outcome) {
        (None, ActionOutcome::Ok) => Ok(()),
        (Some(e), ActionOutcome::ExpectedError(code)) if *e as u32 == *code => Ok(()),
        _ => Err(std::format!("expected {:?}, got {:?}", expected, outcome)),
    }
}

/// Map a ledger action to its entry point name for coverage tracking.
fn action_entry_point(action: &LedgerAction) -> String {
    match action {
        LedgerAction::Contribute { .. } | LedgerAction::ForgedContribute { .. } => {
            "add_contribution".into()
        }
        LedgerAction::MakePublic { .. } => "make_public".into(),
        LedgerAction::Reinitialize { .. } => "initialize".into(),
        LedgerAction::AdvanceLedgers { .. } => "advance_ledgers".into(),
    }
}

/// The state-changing ledger entry points, for coverage calculation.
pub const LEDGER_ENTRY_POINTS: &[&str] = &["initialize", "add_contribution", "make_public"];
