//! The broadcast side-channel participants (and the [`crate::services::fetchers::Fetcher`]
//! layer built on top of it) poll for round state: the current phase, the `SumDict`/`SeedDict`
//! tables, the aggregated model's length, and the final unmasked model.
//!
//! Every kind of update is carried on its own [`tokio::sync::watch`] channel so that fetching
//! "the latest value" never blocks and never misses an update: a watch receiver always reads the
//! most recent value sent, even if it was sent before the receiver last looked.

use std::sync::Arc;

use tokio::sync::watch;

use xaynet_core::{common::RoundParameters, mask::Model, SeedDict, SumDict};

use crate::state_machine::phases::PhaseName;

/// An event, tagged with the id of the round it was emitted during.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Event<E> {
    /// The id of the round this event was emitted during.
    pub round_id: u64,
    /// The event itself.
    pub event: E,
}

/// A dictionary-shaped event: either the dictionary was invalidated (a new round started and
/// hasn't published one yet) or a new one is available.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DictionaryUpdate<D> {
    Invalidate,
    New(D),
}

/// The aggregated model's length, published once the update phase has enough data to know it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum MaskLengthUpdate {
    Invalidate,
    New(usize),
}

/// The most recently unmasked global model.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ModelUpdate {
    Invalidate,
    New(Arc<Model>),
}

/// A read-only handle onto the latest value of a single event channel.
#[derive(Clone)]
pub struct EventListener<E> {
    receiver: watch::Receiver<Event<E>>,
}

impl<E: Clone> EventListener<E> {
    fn new(receiver: watch::Receiver<Event<E>>) -> Self {
        Self { receiver }
    }

    /// Returns the most recently broadcast value.
    ///
    /// A freshly cloned [`watch::Receiver`] has not "seen" its current value yet, so the first
    /// `recv()` on it resolves immediately with whatever was last sent, without waiting for a
    /// subsequent update; that's what lets this method be synchronous from the caller's point of
    /// view even though the underlying channel is async.
    pub fn get_latest(&self) -> Event<E> {
        futures::executor::block_on(self.receiver.clone().recv())
            .expect("event channel sender was dropped")
    }
}

/// The publishing half of the event broadcaster; owned by [`crate::state_machine::phases::IO`].
pub struct EventPublisher {
    round_params_tx: watch::Sender<Event<RoundParameters>>,
    phase_tx: watch::Sender<Event<PhaseName>>,
    sum_dict_tx: watch::Sender<Event<DictionaryUpdate<Arc<SumDict>>>>,
    seed_dict_tx: watch::Sender<Event<DictionaryUpdate<Arc<SeedDict>>>>,
    mask_length_tx: watch::Sender<Event<MaskLengthUpdate>>,
    model_tx: watch::Sender<Event<ModelUpdate>>,
}

/// The subscribing half of the event broadcaster; cloneable, handed out to every
/// [`crate::services::fetchers::Fetcher`] and to tests.
#[derive(Clone)]
pub struct EventSubscriber {
    round_params_rx: watch::Receiver<Event<RoundParameters>>,
    phase_rx: watch::Receiver<Event<PhaseName>>,
    sum_dict_rx: watch::Receiver<Event<DictionaryUpdate<Arc<SumDict>>>>,
    seed_dict_rx: watch::Receiver<Event<DictionaryUpdate<Arc<SeedDict>>>>,
    mask_length_rx: watch::Receiver<Event<MaskLengthUpdate>>,
    model_rx: watch::Receiver<Event<ModelUpdate>>,
}

impl EventPublisher {
    /// Builds a fresh broadcaster, initialized with the given round's parameters, and the
    /// matching subscriber handle.
    pub fn init(round_id: u64, round_params: RoundParameters) -> (Self, EventSubscriber) {
        let (round_params_tx, round_params_rx) = watch::channel(Event {
            round_id,
            event: round_params,
        });
        let (phase_tx, phase_rx) = watch::channel(Event {
            round_id,
            event: PhaseName::Idle,
        });
        let (sum_dict_tx, sum_dict_rx) = watch::channel(Event {
            round_id,
            event: DictionaryUpdate::Invalidate,
        });
        let (seed_dict_tx, seed_dict_rx) = watch::channel(Event {
            round_id,
            event: DictionaryUpdate::Invalidate,
        });
        let (mask_length_tx, mask_length_rx) = watch::channel(Event {
            round_id,
            event: MaskLengthUpdate::Invalidate,
        });
        let (model_tx, model_rx) = watch::channel(Event {
            round_id,
            event: ModelUpdate::Invalidate,
        });
        (
            Self {
                round_params_tx,
                phase_tx,
                sum_dict_tx,
                seed_dict_tx,
                mask_length_tx,
                model_tx,
            },
            EventSubscriber {
                round_params_rx,
                phase_rx,
                sum_dict_rx,
                seed_dict_rx,
                mask_length_rx,
                model_rx,
            },
        )
    }

    pub fn broadcast_params(&mut self, round_id: u64, params: RoundParameters) {
        let _ = self.round_params_tx.broadcast(Event {
            round_id,
            event: params,
        });
    }

    pub fn broadcast_phase(&mut self, round_id: u64, phase: PhaseName) {
        let _ = self.phase_tx.broadcast(Event {
            round_id,
            event: phase,
        });
    }

    pub fn broadcast_sum_dict(&mut self, update: DictionaryUpdate<Arc<SumDict>>) {
        let round_id = self.sum_dict_tx.borrow().round_id;
        let _ = self.sum_dict_tx.broadcast(Event {
            round_id,
            event: update,
        });
    }

    pub fn broadcast_seed_dict(&mut self, update: DictionaryUpdate<Arc<SeedDict>>) {
        let round_id = self.seed_dict_tx.borrow().round_id;
        let _ = self.seed_dict_tx.broadcast(Event {
            round_id,
            event: update,
        });
    }

    pub fn broadcast_mask_length(&mut self, update: MaskLengthUpdate) {
        let round_id = self.mask_length_tx.borrow().round_id;
        let _ = self.mask_length_tx.broadcast(Event {
            round_id,
            event: update,
        });
    }

    pub fn broadcast_model(&mut self, update: ModelUpdate) {
        let round_id = self.model_tx.borrow().round_id;
        let _ = self.model_tx.broadcast(Event {
            round_id,
            event: update,
        });
    }

    /// Bumps every channel's round id and resets the dictionary/mask-length/model channels to
    /// [`DictionaryUpdate::Invalidate`]/[`MaskLengthUpdate::Invalidate`]/[`ModelUpdate::Invalidate`],
    /// as the [`Idle`](crate::state_machine::phases::Idle) phase does at the start of every round.
    pub fn start_round(&mut self, round_id: u64, params: RoundParameters) {
        self.broadcast_params(round_id, params);
        self.broadcast_phase(round_id, PhaseName::Idle);
        let _ = self.sum_dict_tx.broadcast(Event {
            round_id,
            event: DictionaryUpdate::Invalidate,
        });
        let _ = self.seed_dict_tx.broadcast(Event {
            round_id,
            event: DictionaryUpdate::Invalidate,
        });
        let _ = self.mask_length_tx.broadcast(Event {
            round_id,
            event: MaskLengthUpdate::Invalidate,
        });
    }
}

impl EventSubscriber {
    pub fn params_listener(&self) -> EventListener<RoundParameters> {
        EventListener::new(self.round_params_rx.clone())
    }

    pub fn phase_listener(&self) -> EventListener<PhaseName> {
        EventListener::new(self.phase_rx.clone())
    }

    pub fn sum_dict_listener(&self) -> EventListener<DictionaryUpdate<Arc<SumDict>>> {
        EventListener::new(self.sum_dict_rx.clone())
    }

    pub fn seed_dict_listener(&self) -> EventListener<DictionaryUpdate<Arc<SeedDict>>> {
        EventListener::new(self.seed_dict_rx.clone())
    }

    pub fn mask_length_listener(&self) -> EventListener<MaskLengthUpdate> {
        EventListener::new(self.mask_length_rx.clone())
    }

    pub fn model_listener(&self) -> EventListener<ModelUpdate> {
        EventListener::new(self.model_rx.clone())
    }
}
