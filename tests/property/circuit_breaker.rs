//! Property tests for the reliability gate's state machine.
//!
//! Invariants tested:
//! - For any sequence of `failure_threshold` consecutive failures starting
//!   in CLOSED, the gate is OPEN immediately after the last failure.
//! - A single success in CLOSED resets `failure_count` to 0.

use futures::FutureExt;
use gateway::reliability::{GateConfig, GateState, ReliabilityGate};
use proptest::prelude::*;
use std::fmt;
use tokio::runtime::Runtime;

#[derive(Debug, Clone)]
struct TestError;

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test error")
    }
}

fn fail<'a>() -> gateway::reliability::BackendCall<'a, (), TestError> {
    async { Err(TestError) }.boxed()
}

fn succeed<'a>() -> gateway::reliability::BackendCall<'a, (), TestError> {
    async { Ok(()) }.boxed()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    /// Property: `failure_threshold` consecutive failures from CLOSED
    /// leave the gate OPEN immediately after the last one, for any
    /// threshold in a realistic range.
    #[test]
    fn consecutive_failures_open_the_gate_at_the_configured_threshold(
        failure_threshold in 1u32..20,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let gate = ReliabilityGate::new(
                "svc",
                GateConfig::<TestError>::builder().failure_threshold(failure_threshold).build(),
            );

            for i in 0..failure_threshold {
                let _ = gate.call(fail(), None).await;
                if i + 1 < failure_threshold {
                    prop_assert_eq!(gate.state_sync(), GateState::Closed);
                }
            }
            prop_assert_eq!(gate.state_sync(), GateState::Open);
            Ok(())
        })?;
    }

    /// Property: any number of failures short of the threshold, followed
    /// by one success, leaves the gate CLOSED with a zeroed failure count
    /// (observable indirectly: the gate tolerates another full run of
    /// `failure_threshold - 1` failures without opening).
    #[test]
    fn a_success_in_closed_resets_the_failure_count(
        failure_threshold in 2u32..20,
        failures_before_success in 1u32..19,
    ) {
        let failures_before_success = failures_before_success % failure_threshold;
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let gate = ReliabilityGate::new(
                "svc",
                GateConfig::<TestError>::builder().failure_threshold(failure_threshold).build(),
            );

            for _ in 0..failures_before_success {
                let _ = gate.call(fail(), None).await;
            }
            prop_assert_eq!(gate.state_sync(), GateState::Closed);

            assert!(gate.call(succeed(), None).await.is_ok());
            prop_assert_eq!(gate.state_sync(), GateState::Closed);

            for i in 0..failure_threshold {
                let _ = gate.call(fail(), None).await;
                if i + 1 < failure_threshold {
                    prop_assert_eq!(gate.state_sync(), GateState::Closed);
                }
            }
            prop_assert_eq!(gate.state_sync(), GateState::Open);
            Ok(())
        })?;
    }
}
