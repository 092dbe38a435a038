pub mod sum;
pub mod sum2;
pub mod update;

use thiserror::Error;
use xaynet_core::message::Message;

pub use self::{
    sum::{SumPreProcessorService, SumRequest},
    sum2::{Sum2PreProcessorService, Sum2Request},
    update::{UpdatePreProcessorService, UpdateRequest},
};

/// What can go wrong while sanity-checking a parsed message before it reaches the state machine.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum PreProcessorError {
    #[error("invalid sum signature")]
    InvalidSumSignature,
    #[error("the participant is not eligible for the sum task")]
    NotSumEligible,
    #[error("invalid update signature")]
    InvalidUpdateSignature,
    #[error("the participant is not eligible for the update task")]
    NotUpdateEligible,
}

/// The outcome of a pre-processing step: either the message is handed back unchanged, ready for
/// the state machine, or it is rejected with the reason why.
pub type PreProcessorResponse = Result<Message, PreProcessorError>;
