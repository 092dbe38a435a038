use tracing::info;
use xaynet_core::{common::RoundParameters, crypto::ByteObject, RoundSeed};

use crate::state_machine::{
    phases::{Handler, Phase, PhaseName, PhaseState, Shared, StateError, Sum},
    requests::StateMachineRequest,
    StateMachine,
    StateMachineError,
};

/// The idle phase: picks a fresh round seed, resets every per-round dictionary, and publishes
/// the new round's parameters before moving straight on to the sum phase.
///
/// There is nothing for a participant to submit while the coordinator is idle, so
/// [`PhaseState::<Idle>::handle_request`] rejects everything; a round never actually waits here
/// for any length of time.
#[derive(Debug)]
pub struct Idle;

impl PhaseState<Idle> {
    /// Creates a new idle phase, ready to start a fresh round.
    pub fn new(shared: Shared) -> Self {
        Self {
            inner: Idle,
            shared,
        }
    }

    fn round_parameters(&self) -> RoundParameters {
        RoundParameters {
            seed: self.shared.state.seed,
            sum: self.shared.state.sum_ratio,
            update: self.shared.state.update_ratio,
            mask_config: self.shared.state.mask_config.vector,
            model_length: self.shared.state.model_size,
        }
    }
}

#[async_trait::async_trait]
impl Phase for PhaseState<Idle> {
    const NAME: PhaseName = PhaseName::Idle;

    async fn run(&mut self) -> Result<(), StateError> {
        self.shared.state.round_id += 1;
        self.shared.state.seed = RoundSeed::generate();
        self.shared.state.phase = PhaseName::Idle;
        info!("starting round {}", self.shared.state.round_id);

        let round_id = self.shared.state.round_id;
        let params = self.round_parameters();
        self.shared.io.events.start_round(round_id, params);

        self.shared
            .io
            .redis
            .set_coordinator_state(&self.shared.state)
            .await?;
        self.shared.io.redis.flush_round(round_id).await?;
        Ok(())
    }

    fn next(self) -> Option<StateMachine> {
        info!("broadcasting the sum phase");
        Some(PhaseState::<Sum>::new(self.shared).into())
    }
}

#[async_trait::async_trait]
impl Handler for PhaseState<Idle> {
    async fn handle_request(&mut self, _req: StateMachineRequest) -> Result<(), StateMachineError> {
        Err(StateMachineError::MessageRejected)
    }
}
