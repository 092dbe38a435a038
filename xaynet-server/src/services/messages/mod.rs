//! Turns a raw framed message into a [`crate::state_machine::requests::StateMachineRequest`] and
//! forwards it to the state machine: parse the wire bytes, reassemble multi-part messages,
//! sanity-check eligibility with the [`pre_processor`] services, then hand the result to the
//! [`RequestSender`].

pub mod pre_processor;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tower::Service;
use xaynet_core::message::{traits::FromBytes, DecodeError, Message, Payload};

use self::pre_processor::{
    PreProcessorError,
    Sum2PreProcessorService,
    SumPreProcessorService,
    UpdatePreProcessorService,
};
use crate::{
    multipart::MultipartBuffer,
    state_machine::{
        events::EventSubscriber,
        requests::{RequestError, RequestSender},
    },
};

/// Everything that can go wrong handling an incoming message, end to end.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("the message could not be parsed: {0}")]
    Parsing(#[from] DecodeError),
    #[error("the message was rejected: {0}")]
    PreProcessor(#[from] PreProcessorError),
    #[error("the message could not be forwarded to the coordinator: {0}")]
    Request(#[from] RequestError),
}

/// The entry point for every message a participant sends, whether it arrived as one request or
/// had to be reassembled from several multi-part chunks.
#[derive(Clone)]
pub struct PetMessageHandler {
    events: EventSubscriber,
    request_tx: RequestSender,
    multipart: Arc<Mutex<MultipartBuffer>>,
    sum_pre_processor: SumPreProcessorService,
    update_pre_processor: UpdatePreProcessorService,
    sum2_pre_processor: Sum2PreProcessorService,
}

impl PetMessageHandler {
    pub fn new(events: EventSubscriber, request_tx: RequestSender) -> Self {
        Self {
            events,
            request_tx,
            multipart: Arc::new(Mutex::new(MultipartBuffer::new())),
            sum_pre_processor: SumPreProcessorService,
            update_pre_processor: UpdatePreProcessorService,
            sum2_pre_processor: Sum2PreProcessorService,
        }
    }

    /// Parses, pre-processes and forwards a message, reassembling it first if it arrived in
    /// parts. Returns `Ok(())` both when the message was accepted and when it was merely one more
    /// chunk of a still-incomplete multi-part message.
    pub async fn handle_message(&self, bytes: Vec<u8>) -> Result<(), ServiceError> {
        let message = Message::from_bytes(&bytes)?;
        match message.payload {
            Payload::Chunk(chunk) => {
                let phase = self.events.phase_listener().get_latest().event;
                let reassembled = self.multipart.lock().await.add_chunk(chunk, phase);
                match reassembled {
                    Some(bytes) => self.dispatch(Message::from_bytes(&bytes)?).await,
                    None => Ok(()),
                }
            }
            _ => self.dispatch(message).await,
        }
    }

    async fn dispatch(&self, message: Message) -> Result<(), ServiceError> {
        let Message { header, payload } = message;
        let params = self.events.params_listener().get_latest().event;

        let processed = match payload {
            Payload::Sum(sum) => {
                let mut service = self.sum_pre_processor.clone();
                service.call((header, sum, params)).await.unwrap()?
            }
            Payload::Update(update) => {
                let mut service = self.update_pre_processor.clone();
                service.call((header, update, params)).await.unwrap()?
            }
            Payload::Sum2(sum2) => {
                let mut service = self.sum2_pre_processor.clone();
                service.call((header, sum2, params)).await.unwrap()?
            }
            Payload::Chunk(_) => {
                // A chunk reassembled from other chunks; multipart messages cannot nest.
                return Err(ServiceError::Parsing(anyhow::anyhow!(
                    "reassembled message is itself a chunk"
                )));
            }
        };

        self.request_tx.msg(&processed).await?;
        Ok(())
    }
}
