use thiserror::Error;
use tracing::warn;

use crate::state_machine::{
    phases::{Handler, Idle, Phase, PhaseName, PhaseState, Shared, StateError},
    requests::StateMachineRequest,
    StateMachine,
    StateMachineError,
};

/// The reason a round was abandoned.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum PhaseStateError {
    #[error("{0}")]
    Phase(String),
    #[error("no sum participant submitted a mask during the sum2 phase")]
    NoMask,
}

/// The terminal state of a failed round: logs why, then restarts a fresh round from
/// [`Idle`]. A round failure is not fatal to the coordinator process, only to the round that
/// failed.
#[derive(Debug)]
pub struct Failed {
    error: PhaseStateError,
}

impl PhaseState<Failed> {
    pub fn new(shared: Shared, error: PhaseStateError) -> Self {
        Self {
            inner: Failed { error },
            shared,
        }
    }
}

#[async_trait::async_trait]
impl Phase for PhaseState<Failed> {
    const NAME: PhaseName = PhaseName::Failed;

    async fn run(&mut self) -> Result<(), StateError> {
        warn!(
            "round {} failed: {}",
            self.shared.state.round_id, self.inner.error
        );
        Ok(())
    }

    fn next(self) -> Option<StateMachine> {
        Some(PhaseState::<Idle>::new(self.shared).into())
    }
}

#[async_trait::async_trait]
impl Handler for PhaseState<Failed> {
    async fn handle_request(&mut self, _req: StateMachineRequest) -> Result<(), StateMachineError> {
        Err(StateMachineError::MessageRejected)
    }
}
