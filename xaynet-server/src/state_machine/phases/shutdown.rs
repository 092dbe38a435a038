use tracing::info;

use crate::state_machine::{
    phases::{Handler, Phase, PhaseName, PhaseState, Shared, StateError},
    requests::StateMachineRequest,
    StateMachine,
    StateMachineError,
};

/// The terminal phase: reached once the request channel has closed, meaning the transport that
/// feeds the coordinator has gone away. There is no next phase; [`StateMachine::run`] returns
/// once this phase's [`Phase::next`] yields `None`.
#[derive(Debug)]
pub struct Shutdown;

impl PhaseState<Shutdown> {
    pub fn new(shared: Shared) -> Self {
        Self {
            inner: Shutdown,
            shared,
        }
    }
}

#[async_trait::async_trait]
impl Phase for PhaseState<Shutdown> {
    const NAME: PhaseName = PhaseName::Shutdown;

    async fn run(&mut self) -> Result<(), StateError> {
        info!("coordinator shutting down");
        // drain and reject whatever requests are still queued up, rather than leaving their
        // senders waiting forever.
        while self.shared.io.request_rx.next().await.is_some() {}
        Ok(())
    }

    fn next(self) -> Option<StateMachine> {
        None
    }
}

#[async_trait::async_trait]
impl Handler for PhaseState<Shutdown> {
    async fn handle_request(&mut self, _req: StateMachineRequest) -> Result<(), StateMachineError> {
        Err(StateMachineError::MessageRejected)
    }
}
