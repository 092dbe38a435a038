use std::collections::HashMap;

use tracing::{debug, info, warn};
use xaynet_core::{mask::Aggregation, mask::MaskObject, SumDict};

use crate::state_machine::{
    phases::{Handler, Phase, PhaseName, PhaseState, Shared, StateError, Unmask},
    requests::{Sum2Request, StateMachineRequest},
    StateMachine,
    StateMachineError,
};

#[cfg(feature = "metrics")]
use crate::metrics;

use tokio::time::{timeout, Duration};

/// The tally of reconstructed masks submitted during the sum2 phase, keyed by the mask itself.
pub type MaskDict = HashMap<MaskObject, u64>;

/// Sum2 state: collects the reconstructed masks sum participants compute from the round's
/// `SeedDict`, tallying votes for the mask the update phase's aggregate was actually masked
/// with.
#[derive(Debug)]
pub struct Sum2 {
    /// The frozen sum dictionary built during the sum phase; a sum participant submitting a mask
    /// is removed from here so a repeated submission is rejected.
    sum_dict: SumDict,

    /// The aggregator for masked models.
    model_agg: Aggregation,

    /// The aggregator for masked scalars. Kept alongside `model_agg` for parity with the update
    /// phase's pair, but never unmasked: `Aggregation::unmask` reconstructs the scalar sum from
    /// `model_agg` alone (see `DESIGN.md`).
    scalar_agg: Aggregation,

    /// The tally of candidate masks submitted so far this round.
    mask_dict: MaskDict,
}

#[cfg(test)]
impl Sum2 {
    pub fn sum_dict(&self) -> &SumDict {
        &self.sum_dict
    }
    pub fn aggregation(&self) -> &Aggregation {
        &self.model_agg
    }
    pub fn mask_dict(&self) -> &MaskDict {
        &self.mask_dict
    }
}

#[async_trait::async_trait]
impl Phase for PhaseState<Sum2>
where
    Self: Handler,
{
    const NAME: PhaseName = PhaseName::Sum2;

    async fn run(&mut self) -> Result<(), StateError> {
        let min_time = self.shared.state.min_sum2_time;
        debug!("in sum2 phase for a minimum of {} seconds", min_time);
        self.process_during(Duration::from_secs(min_time)).await?;

        let time_left = self.shared.state.max_sum2_time - min_time;
        timeout(Duration::from_secs(time_left), self.process_until_enough()).await??;

        info!(
            "{} sum2 messages handled (min {} required)",
            self.mask_count(),
            self.shared.state.min_sum2_count
        );
        Ok(())
    }

    fn next(self) -> Option<StateMachine> {
        let PhaseState {
            inner:
                Sum2 {
                    model_agg,
                    scalar_agg,
                    mask_dict,
                    ..
                },
            shared,
        } = self;

        Some(PhaseState::<Unmask>::new(shared, model_agg, scalar_agg, mask_dict).into())
    }
}

impl PhaseState<Sum2>
where
    Self: Handler + Phase,
{
    /// Processes requests until enough masks have been submitted.
    async fn process_until_enough(&mut self) -> Result<(), StateError> {
        while !self.has_enough_sum2s() {
            debug!(
                "{} sum2 messages handled (min {} required)",
                self.mask_count(),
                self.shared.state.min_sum2_count
            );
            self.process_single().await?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Handler for PhaseState<Sum2> {
    /// Handles a [`StateMachineRequest`].
    ///
    /// If the request is a [`StateMachineRequest::Sum`] or [`StateMachineRequest::Update`]
    /// request, the request sender will receive a [`StateMachineError::MessageRejected`].
    async fn handle_request(&mut self, req: StateMachineRequest) -> Result<(), StateMachineError> {
        match req {
            StateMachineRequest::Sum2(sum2_req) => {
                metrics!(
                    self.shared.io.metrics_tx,
                    metrics::message::sum2::increment(self.shared.state.round_id, Self::NAME)
                );
                self.handle_sum2(sum2_req).await
            }
            _ => Err(StateMachineError::MessageRejected),
        }
    }
}

impl PhaseState<Sum2> {
    /// Creates a new sum2 state.
    pub fn new(
        shared: Shared,
        sum_dict: SumDict,
        model_agg: Aggregation,
        scalar_agg: Aggregation,
    ) -> Self {
        info!("state transition");
        Self {
            inner: Sum2 {
                sum_dict,
                model_agg,
                scalar_agg,
                mask_dict: MaskDict::new(),
            },
            shared,
        }
    }

    /// Rebuilds a sum2 phase around round tables read back from the state store, for resuming
    /// after a restart.
    pub fn resume(
        shared: Shared,
        sum_dict: SumDict,
        model_agg: Aggregation,
        scalar_agg: Aggregation,
        mask_dict: MaskDict,
    ) -> Self {
        Self {
            inner: Sum2 {
                sum_dict,
                model_agg,
                scalar_agg,
                mask_dict,
            },
            shared,
        }
    }

    /// Handles a sum2 request.
    ///
    /// A sum participant may only submit once: its entry is removed from the frozen `SumDict`
    /// on acceptance, so a repeated submission from the same key finds nothing to remove and is
    /// rejected. The vote is durably tallied in the state store before the in-memory tally is
    /// updated.
    async fn handle_sum2(&mut self, req: Sum2Request) -> Result<(), StateMachineError> {
        let Sum2Request {
            participant_pk,
            model_mask,
        } = req;

        if self.inner.sum_dict.remove(&participant_pk).is_none() {
            warn!("unknown or already submitted sum participant, rejecting sum2 message");
            return Err(StateMachineError::MessageRejected);
        }

        self.shared
            .io
            .redis
            .incr_mask_score(self.shared.state.round_id, &model_mask)
            .await?;
        *self.inner.mask_dict.entry(model_mask).or_insert(0) += 1;
        Ok(())
    }

    fn mask_count(&self) -> u64 {
        self.inner.mask_dict.values().sum()
    }

    fn has_enough_sum2s(&self) -> bool {
        self.mask_count() as usize >= self.shared.state.min_sum2_count
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serial_test::serial;

    use crate::state_machine::{
        events::Event,
        tests::{builder::StateMachineBuilder, utils},
    };
    use xaynet_core::{
        mask::{FromPrimitives, Model},
        RoundSeed,
        SumDict,
        UpdateSeedDict,
    };

    #[tokio::test]
    #[serial]
    pub async fn sum2_to_unmask() {
        let n_updaters = 1;
        let n_summers = 1;
        let seed = RoundSeed::generate();
        let sum_ratio = 0.5;
        let update_ratio = 1.0;
        let model_size = 4;
        let params = utils::round_params(seed.clone(), sum_ratio, update_ratio, model_size);

        let mut summer = utils::generate_summer(&params);
        let mut updater = utils::generate_updater(&params);

        let sum_msg = summer.compose_sum_message(&params);
        let summer_ephm_pk = utils::ephm_pk(&sum_msg);

        let mut sum_dict = SumDict::new();
        sum_dict.insert(summer.keys.public, summer_ephm_pk);

        let model = Model::from_primitives(vec![0; model_size].into_iter()).unwrap();
        let scalar = 1.0 / (n_updaters as f64 * update_ratio);
        let update_msg = updater.compose_update_message(
            &params,
            &sum_dict,
            utils::mask_settings().into(),
            scalar,
            model.clone(),
        );
        let masked_model = utils::masked_model(&update_msg);

        let mut model_agg = Aggregation::new(utils::mask_settings().into(), model_size);
        model_agg.aggregate(masked_model.clone());
        let scalar_agg = Aggregation::new(utils::mask_settings().into(), 1);

        let sum2_state = Sum2 {
            sum_dict: sum_dict.clone(),
            model_agg,
            scalar_agg,
            mask_dict: MaskDict::new(),
        };

        let (state_machine, request_tx, events) = StateMachineBuilder::new()
            .with_seed(seed.clone())
            .with_phase(sum2_state)
            .with_sum_ratio(sum_ratio)
            .with_update_ratio(update_ratio)
            .with_min_sum(n_summers)
            .with_min_sum2(n_summers)
            .with_min_update(n_updaters)
            .with_mask_config(utils::mask_settings().into())
            .build();

        assert!(state_machine.is_sum2());

        // The sum participant decrypts the one seed share addressed to it and composes its
        // sum2 message from it.
        let mut seeds = UpdateSeedDict::new();
        let encrypted_mask_seed = utils::local_seed_dict(&update_msg)
            .values()
            .next()
            .unwrap()
            .clone();
        seeds.insert(updater.keys.public, encrypted_mask_seed);

        let sum2_msg = summer.compose_sum2_message(
            &params,
            &seeds,
            utils::mask_settings().into(),
            model_size,
        );

        let req = async { request_tx.msg(&sum2_msg).await.unwrap() };
        let transition = async { state_machine.next().await.unwrap() };
        let (_response, state_machine) = tokio::join!(req, transition);

        assert!(state_machine.is_unmask());

        let PhaseState {
            inner: unmask_state,
            ..
        } = state_machine.into_unmask_phase_state();

        assert_eq!(unmask_state.mask_dict().len(), 1);

        assert_eq!(
            events.phase_listener().get_latest(),
            Event {
                round_id: 0,
                event: PhaseName::Sum2,
            }
        );
    }
}
