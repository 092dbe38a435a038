//! The phase-state machine core: the [`Phase`]/[`Handler`] traits every concrete phase
//! implements, the [`PhaseState`] wrapper that carries a phase's own data plus the [`Shared`]
//! state every phase can read and mutate, and the generic request-draining loop
//! ([`PhaseState::process_single`], [`PhaseState::process_during`]) that every phase's `run()`
//! is built out of.

pub mod failure;
pub mod idle;
pub mod shutdown;
pub mod sum;
pub mod sum2;
pub mod unmask;
pub mod update;

pub use self::{
    failure::{Failed, PhaseStateError},
    idle::Idle,
    shutdown::Shutdown,
    sum::Sum,
    sum2::Sum2,
    unmask::Unmask,
    update::Update,
};

use std::time::Duration;

use tokio::{
    stream::StreamExt,
    time::{timeout, Elapsed},
};
use tracing::debug;

use crate::{
    state_machine::{coordinator::CoordinatorState, requests::StateMachineRequest, StateMachine},
    storage::redis::RedisStore,
};

#[cfg(feature = "metrics")]
use tokio::sync::mpsc::UnboundedSender;

use thiserror::Error;

/// The name of a phase, as tracked in [`CoordinatorState`] and broadcast over the phase event
/// channel so participants can tell which message kind the coordinator currently accepts.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum PhaseName {
    Idle,
    Sum,
    Update,
    Sum2,
    Unmask,
    Failed,
    /// Not a PET protocol phase: reached only when the request channel has closed, meaning the
    /// transport that feeds the coordinator went away.
    Shutdown,
}

/// Errors a phase's `run()` may return.
///
/// Every variant except [`StateError::Timeout`] is treated as a round failure: the machine
/// transitions into [`Failed`] and the round is abandoned. A [`StateError::Timeout`] elapsing
/// during the minimum-duration wait of [`PhaseState::process_during`] is *not* an error at all
/// (see that method), so this variant is only ever observed when a phase's own outer deadline
/// (the `max_*_time` budget) elapses before enough participants showed up.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("the request channel has been closed")]
    ChannelError(&'static str),
    #[error("the phase's deadline elapsed before enough participants could be admitted")]
    Timeout(#[from] Elapsed),
    #[error("a coordinator state store operation failed: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// A phase of the PET protocol coordinator round.
#[async_trait::async_trait]
pub trait Phase {
    /// This phase's name.
    const NAME: PhaseName;

    /// Runs this phase to completion: waits out the phase's minimum duration while still
    /// servicing requests, then keeps servicing requests until either enough participants have
    /// been admitted or the phase's maximum duration elapses.
    async fn run(&mut self) -> Result<(), StateError>;

    /// Consumes this phase and builds the next one, broadcasting whatever events the transition
    /// implies (a new `SumDict`, a new `SeedDict`, the global model, ...).
    fn next(self) -> Option<StateMachine>;
}

/// Dispatches an incoming, already admission-checked request to the phase-specific handler, or
/// rejects it if it doesn't belong to the current phase.
#[async_trait::async_trait]
pub trait Handler {
    async fn handle_request(
        &mut self,
        req: StateMachineRequest,
    ) -> Result<(), crate::state_machine::StateMachineError>;
}

/// State shared across every phase: the round's parameters/thresholds/timings, and the I/O
/// handles (the state store, the event broadcaster, the inbound request channel).
pub struct Shared {
    /// The coordinator's view of the current round: thresholds, timings, mask configuration.
    pub state: CoordinatorState,
    /// I/O handles available to every phase.
    pub io: IO,
}

impl Shared {
    pub fn new(state: CoordinatorState, io: IO) -> Self {
        Self { state, io }
    }
}

/// I/O handles carried by [`Shared`].
pub struct IO {
    /// The Redis-backed state store.
    pub redis: RedisStore,
    /// The broadcaster for phase/dictionary/model events.
    pub events: crate::state_machine::events::EventPublisher,
    /// The channel phases pull incoming, pre-processed requests from.
    pub request_rx: crate::state_machine::requests::RequestReceiver,
    /// The (optional, feature-gated) metrics emission channel.
    #[cfg(feature = "metrics")]
    pub metrics_tx: Option<UnboundedSender<crate::metrics::Metric>>,
}

/// A phase together with its own, phase-specific state.
pub struct PhaseState<S> {
    /// The phase-specific state (the pending `SumDict`, the running `Aggregation`, ...).
    pub inner: S,
    /// State shared across every phase.
    pub shared: Shared,
}

impl<S> PhaseState<S>
where
    Self: Handler,
{
    /// Pulls a single request off the request channel and hands it to [`Handler::handle_request`],
    /// replying to the sender with the outcome.
    ///
    /// # Errors
    /// Fails if the request channel has been closed, meaning there is nobody left to send
    /// requests: the whole machine should transition to [`Shutdown`].
    pub async fn process_single(&mut self) -> Result<(), StateError> {
        let (req, response_tx) = self
            .shared
            .io
            .request_rx
            .next()
            .await
            .ok_or(StateError::ChannelError("request channel closed"))?;
        let response = self.handle_request(req).await;
        // the requester may already have given up waiting; that's not our problem
        let _ = response_tx.send(response);
        Ok(())
    }

    /// Processes requests for at least `dur`, ignoring whether the phase already has enough
    /// participants: this is the "wait out the minimum phase duration" half of every phase's
    /// `run()`.
    ///
    /// A deadline elapsing here is the expected, successful way for this method to return: it's
    /// only a [`StateError`] if the channel itself closes while we wait.
    pub async fn process_during(&mut self, dur: Duration) -> Result<(), StateError> {
        let process_loop = async {
            loop {
                self.process_single().await?;
            }
            #[allow(unreachable_code)]
            Ok::<(), StateError>(())
        };
        match timeout(dur, process_loop).await {
            Ok(inner) => inner,
            Err(_) => {
                debug!("minimum phase duration elapsed");
                Ok(())
            }
        }
    }
}

macro_rules! impl_state_machine_transitions {
    ($($variant:ident => $is_fn:ident, $into_fn:ident;)*) => {
        impl StateMachine {
            $(
                #[cfg(test)]
                #[allow(dead_code)]
                pub fn $is_fn(&self) -> bool {
                    matches!(self, StateMachine::$variant(_))
                }

                #[cfg(test)]
                #[allow(dead_code)]
                pub fn $into_fn(self) -> PhaseState<$variant> {
                    match self {
                        StateMachine::$variant(state) => state,
                        _ => panic!(concat!("not in the ", stringify!($variant), " phase")),
                    }
                }
            )*
        }
    };
}

impl_state_machine_transitions! {
    Idle => is_idle, into_idle_phase_state;
    Sum => is_sum, into_sum_phase_state;
    Update => is_update, into_update_phase_state;
    Sum2 => is_sum2, into_sum2_phase_state;
    Unmask => is_unmask, into_unmask_phase_state;
    Failed => is_failed, into_failed_phase_state;
    Shutdown => is_shutdown, into_shutdown_phase_state;
}
