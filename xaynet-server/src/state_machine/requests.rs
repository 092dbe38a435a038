//! The requests phases accept, and the channel pair used to submit one and await its outcome.

use std::convert::TryFrom;

use thiserror::Error;
use tokio::{
    stream::StreamExt,
    sync::{mpsc, oneshot},
};

use xaynet_core::{
    mask::MaskObject,
    message::{Message, Payload},
    LocalSeedDict,
    SumParticipantEphemeralPublicKey,
    SumParticipantPublicKey,
    UpdateParticipantPublicKey,
};

use crate::state_machine::StateMachineError;

/// A sum message, stripped of everything the state machine doesn't need.
#[derive(Debug)]
pub struct SumRequest {
    pub participant_pk: SumParticipantPublicKey,
    pub ephm_pk: SumParticipantEphemeralPublicKey,
}

/// An update message, stripped of everything the state machine doesn't need.
#[derive(Debug)]
pub struct UpdateRequest {
    pub participant_pk: UpdateParticipantPublicKey,
    pub local_seed_dict: LocalSeedDict,
    pub masked_model: MaskObject,
    pub masked_scalar: MaskObject,
}

/// A sum2 message, stripped of everything the state machine doesn't need.
#[derive(Debug)]
pub struct Sum2Request {
    pub participant_pk: SumParticipantPublicKey,
    pub model_mask: MaskObject,
}

/// A request submitted to the state machine, already de-sugared from the wire [`Message`] it was
/// parsed from.
#[derive(Debug)]
pub enum StateMachineRequest {
    Sum(SumRequest),
    Update(UpdateRequest),
    Sum2(Sum2Request),
}

impl TryFrom<Message> for StateMachineRequest {
    type Error = RequestError;

    fn try_from(msg: Message) -> Result<Self, Self::Error> {
        let participant_pk = msg.header.participant_pk;
        match msg.payload {
            Payload::Sum(sum) => Ok(StateMachineRequest::Sum(SumRequest {
                participant_pk,
                ephm_pk: sum.ephm_pk,
            })),
            Payload::Update(update) => Ok(StateMachineRequest::Update(UpdateRequest {
                participant_pk,
                local_seed_dict: update.local_seed_dict,
                masked_model: update.masked_model,
                masked_scalar: update.masked_scalar,
            })),
            Payload::Sum2(sum2) => Ok(StateMachineRequest::Sum2(Sum2Request {
                participant_pk,
                model_mask: sum2.model_mask,
            })),
            Payload::Chunk(_) => Err(RequestError::UnexpectedChunk),
        }
    }
}

/// The response a request sender gets back: whatever the phase handler decided, or a reason the
/// request could never reach one.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("the coordinator is shutting down and is no longer accepting requests")]
    CoordinatorShutdown,
    #[error("the request was rejected: {0}")]
    Rejected(#[from] StateMachineError),
    #[error("a chunk reached the state machine boundary unassembled")]
    UnexpectedChunk,
}

type ResponseSender = oneshot::Sender<Result<(), StateMachineError>>;
type RequestItem = (StateMachineRequest, ResponseSender);

/// The sending half of the request channel, cloned and handed to every pre-processing service.
#[derive(Clone)]
pub struct RequestSender {
    tx: mpsc::UnboundedSender<RequestItem>,
}

impl RequestSender {
    pub(in crate::state_machine) fn new(tx: mpsc::UnboundedSender<RequestItem>) -> Self {
        Self { tx }
    }

    /// Submits an already-built [`StateMachineRequest`] and waits for the phase handler's
    /// decision.
    pub async fn request(&self, req: StateMachineRequest) -> Result<(), RequestError> {
        let (response_tx, response_rx) = oneshot::channel();
        self.tx
            .send((req, response_tx))
            .map_err(|_| RequestError::CoordinatorShutdown)?;
        response_rx
            .await
            .map_err(|_| RequestError::CoordinatorShutdown)?
            .map_err(RequestError::Rejected)
    }

    /// Parses `msg` into a [`StateMachineRequest`] and submits it.
    pub async fn msg(&self, msg: &Message) -> Result<(), RequestError> {
        let req = StateMachineRequest::try_from(msg.clone())?;
        self.request(req).await
    }
}

/// The receiving half of the request channel; owned by [`crate::state_machine::phases::IO`].
pub struct RequestReceiver {
    rx: mpsc::UnboundedReceiver<RequestItem>,
}

impl RequestReceiver {
    pub(in crate::state_machine) fn new(rx: mpsc::UnboundedReceiver<RequestItem>) -> Self {
        Self { rx }
    }

    pub(in crate::state_machine) async fn next(&mut self) -> Option<RequestItem> {
        StreamExt::next(&mut self.rx).await
    }
}

/// Builds a fresh request channel.
pub fn channel() -> (RequestSender, RequestReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RequestSender::new(tx), RequestReceiver::new(rx))
}
