use std::sync::Arc;

use tracing::{debug, info};
use xaynet_core::SumDict;

use crate::state_machine::{
    events::DictionaryUpdate,
    phases::{Handler, Phase, PhaseName, PhaseState, Shared, StateError, Update},
    requests::{StateMachineRequest, SumRequest},
    StateMachine,
    StateMachineError,
};

#[cfg(feature = "metrics")]
use crate::metrics;

use tokio::time::{timeout, Duration};

/// Sum state: collects sum participants' ephemeral encryption keys into the round's `SumDict`.
#[derive(Debug)]
pub struct Sum {
    /// The dictionary of sum participants admitted so far this round.
    sum_dict: SumDict,
}

#[cfg(test)]
impl Sum {
    pub fn sum_dict(&self) -> &SumDict {
        &self.sum_dict
    }
}

#[async_trait::async_trait]
impl Phase for PhaseState<Sum>
where
    Self: Handler,
{
    const NAME: PhaseName = PhaseName::Sum;

    async fn run(&mut self) -> Result<(), StateError> {
        let min_time = self.shared.state.min_sum_time;
        debug!("in sum phase for a minimum of {} seconds", min_time);
        self.process_during(Duration::from_secs(min_time)).await?;

        let time_left = self.shared.state.max_sum_time - min_time;
        timeout(Duration::from_secs(time_left), self.process_until_enough()).await??;

        info!(
            "{} sum messages handled (min {} required)",
            self.inner.sum_dict.len(),
            self.shared.state.min_sum_count
        );
        Ok(())
    }

    fn next(self) -> Option<StateMachine> {
        let PhaseState {
            inner: Sum { sum_dict },
            mut shared,
        } = self;

        info!("broadcasting sum dictionary");
        shared
            .io
            .events
            .broadcast_sum_dict(DictionaryUpdate::New(Arc::new(sum_dict.clone())));

        // every sum participant captured here gets an (initially empty) slot in the seed
        // dictionary; that key set is frozen for the whole update phase.
        let seed_dict = sum_dict
            .keys()
            .map(|pk| (*pk, xaynet_core::UpdateSeedDict::new()))
            .collect();

        Some(PhaseState::<Update>::new(shared, sum_dict, seed_dict).into())
    }
}

impl PhaseState<Sum>
where
    Self: Handler + Phase,
{
    /// Processes requests until there are enough sum participants.
    async fn process_until_enough(&mut self) -> Result<(), StateError> {
        while !self.has_enough_sums() {
            debug!(
                "{} sum messages handled (min {} required)",
                self.inner.sum_dict.len(),
                self.shared.state.min_sum_count
            );
            self.process_single().await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Handler for PhaseState<Sum> {
    /// Handles a [`StateMachineRequest`].
    ///
    /// If the request is an [`StateMachineRequest::Update`] or [`StateMachineRequest::Sum2`]
    /// request, the request sender will receive a [`StateMachineError::MessageRejected`].
    async fn handle_request(&mut self, req: StateMachineRequest) -> Result<(), StateMachineError> {
        match req {
            StateMachineRequest::Sum(sum_req) => {
                metrics!(
                    self.shared.io.metrics_tx,
                    metrics::message::sum::increment(self.shared.state.round_id, Self::NAME)
                );
                self.handle_sum(sum_req).await
            }
            _ => Err(StateMachineError::MessageRejected),
        }
    }
}

impl PhaseState<Sum> {
    /// Creates a new sum state.
    pub fn new(shared: Shared) -> Self {
        info!("state transition");
        Self {
            inner: Sum {
                sum_dict: SumDict::new(),
            },
            shared,
        }
    }

    /// Rebuilds a sum phase around a `SumDict` read back from the state store, for resuming
    /// after a restart.
    pub fn resume(shared: Shared, sum_dict: SumDict) -> Self {
        Self {
            inner: Sum { sum_dict },
            shared,
        }
    }

    /// Handles a sum request.
    ///
    /// A participant may be admitted at most once per round; a duplicate
    /// `pk_s` is rejected rather than silently overwriting its ephemeral key. Once the round's
    /// configured ceiling is reached, further requests are rejected too, even if the phase
    /// hasn't yet hit its deadline. The admission is durably recorded in the state store before
    /// it is reflected in the in-memory dictionary, so a crash can never admit a participant that
    /// the store doesn't also know about.
    async fn handle_sum(&mut self, req: SumRequest) -> Result<(), StateMachineError> {
        if self.inner.sum_dict.contains_key(&req.participant_pk) {
            return Err(StateMachineError::MessageRejected);
        }
        if self.inner.sum_dict.len() >= self.shared.state.max_sum_count {
            return Err(StateMachineError::MessageRejected);
        }
        let added = self
            .shared
            .io
            .redis
            .add_sum_participant(self.shared.state.round_id, &req.participant_pk, &req.ephm_pk)
            .await?;
        if !added {
            return Err(StateMachineError::MessageRejected);
        }
        self.inner
            .sum_dict
            .insert(req.participant_pk, req.ephm_pk);
        Ok(())
    }

    fn has_enough_sums(&self) -> bool {
        self.inner.sum_dict.len() >= self.shared.state.min_sum_count
    }
}
