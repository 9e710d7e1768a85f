//! Category B: State machine and exit code falsification tests (F021-F026).

use proptest::prelude::*;

use crate::error::HostError;
use crate::tests::mocks;
use crate::types::{ExitCode, Fault, HostMode, HostState};

fn any_state() -> impl Strategy<Value = HostState> {
    (0u8..=6).prop_map(|raw| HostState::from_u8(raw).unwrap_or(HostState::Created))
}

fn any_mode() -> impl Strategy<Value = HostMode> {
    prop_oneof![
        Just(HostMode::Console),
        Just(HostMode::Service),
        Just(HostMode::Role),
    ]
}

proptest! {
    /// F021: Stopped has no successor
    #[test]
    fn f021_stopped_is_terminal(next in any_state()) {
        prop_assert!(!HostState::Stopped.can_transition_to(next));
    }

    /// F022: No state moves back to Created
    #[test]
    fn f022_created_is_never_reentered(from in any_state()) {
        prop_assert!(!from.can_transition_to(HostState::Created));
    }

    /// F023: Faulted is only reachable from Running and only leads to Stopping
    #[test]
    fn f023_faulted_edges(other in any_state()) {
        prop_assert_eq!(
            other.can_transition_to(HostState::Faulted),
            other == HostState::Running
        );
        prop_assert_eq!(
            HostState::Faulted.can_transition_to(other),
            other == HostState::Stopping
        );
    }

    /// F024: Numeric exit codes decode back to themselves
    #[test]
    fn f024_exit_code_numbering_stable(code in -16i32..32) {
        if let Some(decoded) = ExitCode::from_i32(code) {
            prop_assert_eq!(decoded.as_i32(), code);
        }
    }

    /// F025: Any sequence of advances only ever follows legal edges
    #[test]
    fn f025_advance_follows_legal_edges(targets in prop::collection::vec(any_state(), 0..16), mode in any_mode()) {
        let (shared, _) = mocks::shared(mode);
        for target in targets {
            let before = shared.state();
            match shared.advance(target) {
                Ok(previous) => {
                    prop_assert_eq!(previous, before);
                    prop_assert!(before.can_transition_to(target));
                    prop_assert_eq!(shared.state(), target);
                }
                Err(_) => prop_assert_eq!(shared.state(), before),
            }
        }
    }
}

/// F026: Every error maps to a non-success exit code
#[test]
fn f026_errors_never_exit_cleanly() {
    let errors = [
        HostError::config("x"),
        HostError::invalid_argument("x"),
        HostError::start_failed("x"),
        HostError::stop_failed("x"),
        HostError::UnhandledFault(Fault::new("x")),
        HostError::unsupported("x"),
        HostError::environment("x"),
        HostError::state("x"),
        HostError::Internal("x".into()),
    ];
    for err in errors {
        assert!(!err.exit_code().is_success(), "{err}");
    }
}
