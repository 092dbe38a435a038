//! Read-only access to the latest round state, for participants polling the info endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use xaynet_core::{common::RoundParameters, mask::Model, SeedDict, SumDict};

use crate::state_machine::{
    events::{DictionaryUpdate, EventSubscriber, MaskLengthUpdate, ModelUpdate},
    phases::PhaseName,
};

/// The error returned by a [`Fetcher`]. The underlying event channels never actually close while
/// the coordinator is running, so in practice this is only ever observed if the coordinator task
/// has already been torn down.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum FetchError {
    #[error("the coordinator's event channel is no longer available")]
    ChannelClosed,
}

/// Fetches the latest published value of each piece of round state a participant may poll for.
#[async_trait]
pub trait Fetcher {
    /// The current round's parameters.
    async fn round_params(&self) -> Result<RoundParameters, FetchError>;

    /// The current round id and phase.
    async fn round_and_phase(&self) -> Result<(u64, PhaseName), FetchError>;

    /// The current round's `SumDict`, once the sum phase has published one.
    async fn sum_dict(&self) -> Result<Option<Arc<SumDict>>, FetchError>;

    /// The current round's `SeedDict`, once the update phase has published one.
    async fn seed_dict(&self) -> Result<Option<Arc<SeedDict>>, FetchError>;

    /// The aggregated model's length, once the update phase knows it.
    async fn mask_length(&self) -> Result<Option<usize>, FetchError>;

    /// The most recently unmasked global model, if any round has completed yet.
    async fn model(&self) -> Result<Option<Arc<Model>>, FetchError>;
}

/// A [`Fetcher`] backed directly by an [`EventSubscriber`].
#[derive(Clone)]
pub struct EventFetcher {
    events: EventSubscriber,
}

impl EventFetcher {
    pub fn new(events: EventSubscriber) -> Self {
        Self { events }
    }
}

#[async_trait]
impl Fetcher for EventFetcher {
    async fn round_params(&self) -> Result<RoundParameters, FetchError> {
        Ok(self.events.params_listener().get_latest().event)
    }

    async fn round_and_phase(&self) -> Result<(u64, PhaseName), FetchError> {
        let event = self.events.phase_listener().get_latest();
        Ok((event.round_id, event.event))
    }

    async fn sum_dict(&self) -> Result<Option<Arc<SumDict>>, FetchError> {
        Ok(match self.events.sum_dict_listener().get_latest().event {
            DictionaryUpdate::Invalidate => None,
            DictionaryUpdate::New(dict) => Some(dict),
        })
    }

    async fn seed_dict(&self) -> Result<Option<Arc<SeedDict>>, FetchError> {
        Ok(match self.events.seed_dict_listener().get_latest().event {
            DictionaryUpdate::Invalidate => None,
            DictionaryUpdate::New(dict) => Some(dict),
        })
    }

    async fn mask_length(&self) -> Result<Option<usize>, FetchError> {
        Ok(match self.events.mask_length_listener().get_latest().event {
            MaskLengthUpdate::Invalidate => None,
            MaskLengthUpdate::New(len) => Some(len),
        })
    }

    async fn model(&self) -> Result<Option<Arc<Model>>, FetchError> {
        Ok(match self.events.model_listener().get_latest().event {
            ModelUpdate::Invalidate => None,
            ModelUpdate::New(model) => Some(model),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xaynet_core::{common::RoundParameters, mask::MaskConfig, RoundSeed};

    fn params() -> RoundParameters {
        RoundParameters {
            seed: RoundSeed::zeroed(),
            sum: 0.5,
            update: 0.5,
            mask_config: MaskConfig {
                group_type: xaynet_core::mask::GroupType::Prime,
                data_type: xaynet_core::mask::DataType::F32,
                bound_type: xaynet_core::mask::BoundType::B0,
                model_type: xaynet_core::mask::ModelType::M3,
            },
            model_length: 1,
        }
    }

    #[tokio::test]
    async fn freshly_initialized_fetcher_has_no_tables_yet() {
        use xaynet_core::crypto::ByteObject;
        let (_publisher, subscriber) = crate::state_machine::events::EventPublisher::init(0, params());
        let fetcher = EventFetcher::new(subscriber);

        assert!(fetcher.sum_dict().await.unwrap().is_none());
        assert!(fetcher.seed_dict().await.unwrap().is_none());
        assert!(fetcher.mask_length().await.unwrap().is_none());
        assert!(fetcher.model().await.unwrap().is_none());
        assert_eq!(fetcher.round_params().await.unwrap().seed, RoundSeed::zeroed());
        let (round_id, phase) = fetcher.round_and_phase().await.unwrap();
        assert_eq!(round_id, 0);
        assert_eq!(phase, crate::state_machine::phases::PhaseName::Idle);
    }
}
