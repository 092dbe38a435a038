use std::sync::Arc;

use tracing::{info, warn};
use xaynet_core::mask::{Aggregation, MaskObject};

use crate::state_machine::{
    events::ModelUpdate,
    phases::{Failed, Handler, Idle, Phase, PhaseName, PhaseState, PhaseStateError, Shared, StateError, sum2::MaskDict},
    requests::StateMachineRequest,
    StateMachine,
    StateMachineError,
};

/// Unmask state: picks the mask the sum2 phase's participants agree on most, uses it to recover
/// the round's global model, and broadcasts it.
#[derive(Debug)]
pub struct Unmask {
    /// The aggregator for masked models.
    model_agg: Aggregation,

    /// The aggregator for masked scalars, carried alongside `model_agg` for symmetry but never
    /// itself unmasked (`Aggregation::unmask` recovers the scalar sum from `model_agg` alone).
    #[allow(dead_code)]
    scalar_agg: Aggregation,

    /// The tally of candidate masks submitted during the sum2 phase.
    mask_dict: MaskDict,
}

#[cfg(test)]
impl Unmask {
    pub fn mask_dict(&self) -> &MaskDict {
        &self.mask_dict
    }
}

#[async_trait::async_trait]
impl Phase for PhaseState<Unmask>
where
    Self: Handler,
{
    const NAME: PhaseName = PhaseName::Unmask;

    /// There is nothing to wait for: by the time the sum2 phase handed off, every mask that's
    /// going to be submitted already has been.
    async fn run(&mut self) -> Result<(), StateError> {
        info!(
            "{} candidate masks collected during the sum2 phase",
            self.inner.mask_dict.len()
        );
        Ok(())
    }

    fn next(self) -> Option<StateMachine> {
        let PhaseState { inner, mut shared } = self;

        match inner.reconstruct_model() {
            Ok(model) => {
                info!("broadcasting the new global model");
                shared
                    .io
                    .events
                    .broadcast_model(ModelUpdate::New(Arc::new(model)));
                Some(PhaseState::<Idle>::new(shared).into())
            }
            Err(error) => {
                warn!("failed to reconstruct the global model: {}", error);
                Some(PhaseState::<Failed>::new(shared, error).into())
            }
        }
    }
}

impl Unmask {
    /// Picks the mask with the most votes, breaking ties deterministically by the mask's own
    /// byte encoding so every coordinator replaying the same tally reaches the same choice, and
    /// uses it to unmask `model_agg`.
    fn reconstruct_model(self) -> Result<xaynet_core::mask::Model, PhaseStateError> {
        let mask = Self::plurality_mask(self.mask_dict).ok_or(PhaseStateError::NoMask)?;
        self.model_agg
            .validate_unmasking(&mask)
            .map_err(|e| PhaseStateError::Phase(e.to_string()))?;
        Ok(self.model_agg.unmask(mask))
    }

    fn plurality_mask(mask_dict: MaskDict) -> Option<MaskObject> {
        mask_dict
            .into_iter()
            .max_by(|(mask_a, count_a), (mask_b, count_b)| {
                count_a.cmp(count_b).then_with(|| {
                    // ties are broken by the mask's serialized bytes, smallest first, so the
                    // outcome never depends on hash map iteration order. Comparing b against a
                    // (not a against b) is what makes max_by keep the smaller encoding.
                    let bytes_a = bincode::serialize(mask_a).unwrap_or_default();
                    let bytes_b = bincode::serialize(mask_b).unwrap_or_default();
                    bytes_b.cmp(&bytes_a)
                })
            })
            .map(|(mask, _)| mask)
    }
}

impl PhaseState<Unmask> {
    /// Creates a new unmask state.
    pub fn new(shared: Shared, model_agg: Aggregation, scalar_agg: Aggregation, mask_dict: MaskDict) -> Self {
        info!("state transition");
        Self {
            inner: Unmask {
                model_agg,
                scalar_agg,
                mask_dict,
            },
            shared,
        }
    }
}

#[async_trait::async_trait]
impl Handler for PhaseState<Unmask> {
    async fn handle_request(&mut self, _req: StateMachineRequest) -> Result<(), StateMachineError> {
        Err(StateMachineError::MessageRejected)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use xaynet_core::mask::{MaskConfigPair, Model};

    fn mask_config() -> MaskConfigPair {
        crate::state_machine::tests::utils::mask_settings().into()
    }

    fn make_mask(config: MaskConfigPair, len: usize, seed: xaynet_core::mask::MaskSeed) -> MaskObject {
        let zero_model = Model::from_primitives(std::iter::repeat(0_f32).take(len)).unwrap();
        let (_, mask) = xaynet_core::mask::Masker::with_seed(config, seed)
            .mask(xaynet_core::mask::Scalar::new(0.), &zero_model);
        mask
    }

    #[test]
    fn plurality_mask_breaks_ties_deterministically() {
        use xaynet_core::mask::MaskSeed;

        let config = mask_config();
        let mask_a = make_mask(config, 4, MaskSeed::generate());
        let mask_b = make_mask(config, 4, MaskSeed::generate());

        let mut mask_dict = MaskDict::new();
        mask_dict.insert(mask_a.clone(), 3);
        mask_dict.insert(mask_b.clone(), 1);

        let picked = Unmask::plurality_mask(mask_dict).unwrap();
        assert_eq!(picked, mask_a);
    }

    #[test]
    fn plurality_mask_empty_dict_yields_none() {
        assert!(Unmask::plurality_mask(MaskDict::new()).is_none());
    }

    #[test]
    fn plurality_mask_tie_picks_smallest_encoding() {
        use xaynet_core::mask::MaskSeed;

        let config = mask_config();
        let mask_a = make_mask(config, 4, MaskSeed::generate());
        let mask_b = make_mask(config, 4, MaskSeed::generate());
        let (smaller, larger) = {
            let bytes_a = bincode::serialize(&mask_a).unwrap();
            let bytes_b = bincode::serialize(&mask_b).unwrap();
            if bytes_a < bytes_b {
                (mask_a, mask_b)
            } else {
                (mask_b, mask_a)
            }
        };

        let mut mask_dict = MaskDict::new();
        mask_dict.insert(smaller.clone(), 2);
        mask_dict.insert(larger, 2);

        let picked = Unmask::plurality_mask(mask_dict).unwrap();
        assert_eq!(picked, smaller);
    }

    #[test]
    fn reconstruct_model_without_masks_fails_with_no_mask() {
        let config = mask_config();
        let model_agg = Aggregation::new(config, 4);
        let scalar_agg = Aggregation::new(config, 1);
        let unmask = Unmask {
            model_agg,
            scalar_agg,
            mask_dict: MaskDict::new(),
        };
        assert_eq!(unmask.reconstruct_model().unwrap_err(), PhaseStateError::NoMask);
    }
}
