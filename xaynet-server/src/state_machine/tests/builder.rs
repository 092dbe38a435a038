//! Drops a [`StateMachine`] into an arbitrary phase, wired to a real, disposable Redis instance,
//! without driving any of the phases leading up to it.
//!
//! Phase tests reach for this instead of [`crate::state_machine::coordinator::CoordinatorState::new`]
//! because they want to start already in, say, the [`Sum2`](crate::state_machine::phases::Sum2)
//! phase with a hand-built `SumDict`, not replay the whole round to get there.

use xaynet_core::{
    common::RoundParameters,
    mask::MaskConfig,
    RoundSeed,
};

use crate::{
    settings::RedisSettings,
    state_machine::{
        coordinator::CoordinatorState,
        events::{EventPublisher, EventSubscriber},
        phases::{self, Handler, Phase, PhaseName, PhaseState, Shared, IO},
        requests::{self, RequestSender},
        StateMachine,
    },
    storage::redis::RedisStore,
};

/// A Redis instance every test process shares; [`serial_test::serial`] keeps tests from racing
/// on its keyspace.
const TEST_REDIS_URL: &str = "redis://127.0.0.1/";

#[derive(Debug)]
pub struct StateMachineBuilder<P> {
    shared: Shared,
    request_tx: RequestSender,
    event_subscriber: EventSubscriber,
    phase: P,
}

impl StateMachineBuilder<phases::Idle> {
    /// Connects to [`TEST_REDIS_URL`] and builds a fresh [`Idle`](phases::Idle) machine with
    /// small, fast-moving defaults, ready to be reshaped with the `with_*` setters below.
    pub fn new() -> Self {
        let redis = futures::executor::block_on(RedisStore::new(&RedisSettings {
            url: TEST_REDIS_URL.to_string(),
        }))
        .expect("failed to connect to the test Redis instance");

        let seed = RoundSeed::generate();
        let mask_config: MaskConfig = super::utils::mask_settings().into();

        let state = CoordinatorState {
            seed,
            sum_ratio: 0.5,
            update_ratio: 0.5,
            min_sum_count: 1,
            max_sum_count: 100,
            min_update_count: 1,
            max_update_count: 100,
            min_sum2_count: 1,
            max_sum2_count: 100,
            min_sum_time: 0,
            max_sum_time: 2,
            min_update_time: 0,
            max_update_time: 2,
            min_sum2_time: 0,
            max_sum2_time: 2,
            mask_config: mask_config.into(),
            model_size: 1,
            round_id: 0,
            phase: PhaseName::Idle,
        };

        let round_params = RoundParameters {
            seed: state.seed,
            sum: state.sum_ratio,
            update: state.update_ratio,
            mask_config,
            model_length: state.model_size,
        };
        let (events, event_subscriber) = EventPublisher::init(state.round_id, round_params);
        let (request_tx, request_rx) = requests::channel();

        let io = IO {
            redis,
            events,
            request_rx,
            #[cfg(feature = "metrics")]
            metrics_tx: None,
        };

        Self {
            shared: Shared::new(state, io),
            request_tx,
            event_subscriber,
            phase: phases::Idle,
        }
    }
}

impl<P> StateMachineBuilder<P>
where
    PhaseState<P>: Handler + Phase,
    StateMachine: From<PhaseState<P>>,
{
    /// Finalizes the machine, re-broadcasting the round parameters and this phase's name so a
    /// test's [`EventSubscriber`] listeners see a consistent snapshot.
    pub fn build(self) -> (StateMachine, RequestSender, EventSubscriber) {
        let Self {
            mut shared,
            request_tx,
            event_subscriber,
            phase,
        } = self;

        let round_id = shared.state.round_id;
        shared.io.events.broadcast_params(
            round_id,
            RoundParameters {
                seed: shared.state.seed,
                sum: shared.state.sum_ratio,
                update: shared.state.update_ratio,
                mask_config: shared.state.mask_config.vector,
                model_length: shared.state.model_size,
            },
        );
        shared
            .io
            .events
            .broadcast_phase(round_id, <PhaseState<P> as Phase>::NAME);

        let state = PhaseState {
            inner: phase,
            shared,
        };
        (StateMachine::from(state), request_tx, event_subscriber)
    }

    pub fn with_seed(mut self, seed: RoundSeed) -> Self {
        self.shared.state.seed = seed;
        self
    }

    pub fn with_sum_ratio(mut self, sum_ratio: f64) -> Self {
        self.shared.state.sum_ratio = sum_ratio;
        self
    }

    pub fn with_update_ratio(mut self, update_ratio: f64) -> Self {
        self.shared.state.update_ratio = update_ratio;
        self
    }

    pub fn with_min_sum(mut self, min_sum_count: usize) -> Self {
        self.shared.state.min_sum_count = min_sum_count;
        self
    }

    pub fn with_min_update(mut self, min_update_count: usize) -> Self {
        self.shared.state.min_update_count = min_update_count;
        self
    }

    pub fn with_min_sum2(mut self, min_sum2_count: usize) -> Self {
        self.shared.state.min_sum2_count = min_sum2_count;
        self
    }

    #[allow(dead_code)]
    pub fn with_model_size(mut self, model_size: usize) -> Self {
        self.shared.state.model_size = model_size;
        self
    }

    pub fn with_mask_config(mut self, mask_config: MaskConfig) -> Self {
        self.shared.state.mask_config = mask_config.into();
        self
    }

    pub fn with_phase<S>(self, phase: S) -> StateMachineBuilder<S> {
        let Self {
            shared,
            request_tx,
            event_subscriber,
            ..
        } = self;
        StateMachineBuilder {
            shared,
            request_tx,
            event_subscriber,
            phase,
        }
    }
}
