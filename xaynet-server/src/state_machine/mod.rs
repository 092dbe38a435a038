//! The coordinator's round state machine.
//!
//! A [`StateMachine`] is always in exactly one of [`PhaseName`]'s phases; driving it forward
//! (via [`StateMachine::next`]) runs the current phase to completion and builds whatever phase
//! comes after it, broadcasting the events that transition implies along the way. The machine
//! itself is driven by a single task (see `bin/main.rs`), so every mutation the phases below make
//! to their own state is inherently sequential.

pub mod coordinator;
pub mod events;
pub mod phases;
pub mod requests;

#[cfg(test)]
pub mod tests;

use thiserror::Error;
use tracing::warn;

use self::phases::{Failed, Idle, Phase, PhaseState, PhaseStateError, Sum, Sum2, Unmask, Update, Shutdown};

/// Errors a phase handler can reject an admitted request with.
///
/// These surface to the request's sender as [`requests::RequestError::Rejected`], which maps
/// to a `409`-class response at the transport layer, not a round failure.
#[derive(Debug, Error)]
pub enum StateMachineError {
    #[error("the request does not belong to the coordinator's current phase")]
    MessageRejected,
    #[error("the masked model or scalar could not be aggregated")]
    AggregationFailed,
    #[error("the local seed dictionary is invalid or was already submitted")]
    InvalidLocalSeedDict,
    #[error("a coordinator state store operation failed: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

/// The coordinator's round state machine: a [`PhaseState`] for whichever [`PhaseName`] is
/// currently active.
pub enum StateMachine {
    Idle(PhaseState<Idle>),
    Sum(PhaseState<Sum>),
    Update(PhaseState<Update>),
    Sum2(PhaseState<Sum2>),
    Unmask(PhaseState<Unmask>),
    Failed(PhaseState<Failed>),
    Shutdown(PhaseState<Shutdown>),
}

macro_rules! impl_from_phase_state {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<PhaseState<$variant>> for StateMachine {
                fn from(state: PhaseState<$variant>) -> Self {
                    StateMachine::$variant(state)
                }
            }
        )*
    };
}

impl_from_phase_state!(Idle, Sum, Update, Sum2, Unmask, Failed, Shutdown);

/// Runs `state` to completion and builds whatever comes next, turning a phase error into a
/// transition to [`Failed`] rather than propagating it.
async fn transition<S>(mut state: PhaseState<S>) -> Option<StateMachine>
where
    PhaseState<S>: Phase,
{
    let round_id = state.shared.state.round_id;
    state
        .shared
        .io
        .events
        .broadcast_phase(round_id, <PhaseState<S> as Phase>::NAME);
    match state.run().await {
        Ok(()) => state.next(),
        Err(err) => {
            warn!("phase {:?} failed: {}", <PhaseState<S> as Phase>::NAME, err);
            let shared = state.shared;
            Some(PhaseState::<Failed>::new(shared, PhaseStateError::Phase(err.to_string())).into())
        }
    }
}

impl StateMachine {
    /// Runs the current phase to completion and returns the machine in whatever phase comes
    /// next, or `None` once [`Shutdown`] has been reached.
    pub async fn next(self) -> Option<Self> {
        match self {
            StateMachine::Idle(state) => transition(state).await,
            StateMachine::Sum(state) => transition(state).await,
            StateMachine::Update(state) => transition(state).await,
            StateMachine::Sum2(state) => transition(state).await,
            StateMachine::Unmask(state) => transition(state).await,
            StateMachine::Failed(state) => transition(state).await,
            StateMachine::Shutdown(state) => transition(state).await,
        }
    }

    /// Runs the machine until the request channel closes and [`Shutdown`] is reached.
    pub async fn run(mut self) {
        loop {
            match self.next().await {
                Some(next) => self = next,
                None => return,
            }
        }
    }
}
