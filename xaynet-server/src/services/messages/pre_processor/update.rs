use std::task::Poll;

use futures::{
    future::{ready, Ready},
    task::Context,
};
use tower::Service;
use xaynet_core::{
    common::RoundParameters,
    crypto::ByteObject,
    message::{Header, Message, Payload, Update},
};

use crate::services::messages::pre_processor::{PreProcessorError, PreProcessorResponse};

/// Request type for [`UpdatePreProcessorService`]
pub type UpdateRequest = (Header, Update, RoundParameters);

/// A service for performing sanity checks and preparing an update request to be handled by the
/// state machine. The coordinator cannot rely on a client's own task selection being honest, so
/// besides checking `update_signature` this also rejects a message whose `sum_signature` turns
/// out to be sum-eligible too: such a participant must register as sum, not update.
#[derive(Debug, Clone)]
pub struct UpdatePreProcessorService;

impl Service<UpdateRequest> for UpdatePreProcessorService {
    type Response = PreProcessorResponse;
    type Error = ::std::convert::Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, (header, message, params): UpdateRequest) -> Self::Future {
        let pre_processor = UpdatePreProcessor {
            header,
            message,
            params,
        };
        ready(Ok(pre_processor.call()))
    }
}

struct UpdatePreProcessor {
    header: Header,
    message: Update,
    params: RoundParameters,
}

impl UpdatePreProcessor {
    fn call(self) -> PreProcessorResponse {
        if !self.has_valid_update_signature() {
            return Err(PreProcessorError::InvalidUpdateSignature);
        }
        if !self.is_eligible_for_update_task() {
            return Err(PreProcessorError::NotUpdateEligible);
        }
        if self.is_eligible_for_sum_task() {
            return Err(PreProcessorError::NotUpdateEligible);
        }

        let Self {
            header, message, ..
        } = self;
        Ok(Message {
            header,
            payload: Payload::Update(message),
        })
    }

    /// Check whether this request contains a valid update signature
    fn has_valid_update_signature(&self) -> bool {
        let seed = &self.params.seed;
        let signature = &self.message.update_signature;
        let pk = &self.header.participant_pk;
        pk.verify_detached(&signature, &[seed.as_slice(), b"update"].concat())
    }

    /// Check whether this request comes from a participant that is eligible for the update task.
    fn is_eligible_for_update_task(&self) -> bool {
        self.message.update_signature.is_eligible(self.params.update)
    }

    /// Check whether this request's sum signature also happens to be sum-eligible: per the
    /// admission rules a participant registers as sum over update when both are true, so an
    /// update message from such a participant is rejected rather than silently admitted.
    fn is_eligible_for_sum_task(&self) -> bool {
        self.message.sum_signature.is_eligible(self.params.sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xaynet_client::participant::Participant;
    use xaynet_core::{
        mask::{FromPrimitives, Model},
        RoundSeed,
        SumDict,
    };

    fn params(sum: f64, update: f64) -> RoundParameters {
        RoundParameters {
            seed: RoundSeed::generate(),
            sum,
            update,
            mask_config: crate::state_machine::tests::utils::mask_settings().into(),
            model_length: 4,
        }
    }

    #[test]
    fn rejects_an_update_message_from_a_participant_thats_also_sum_eligible() {
        let params = params(0.99, 0.99);
        let empty_sum_dict = SumDict::new();
        let model = Model::from_primitives(std::iter::repeat(0_f32).take(4)).unwrap();

        let (header, message) = loop {
            let mut participant = Participant::new();
            let msg = participant.compose_update_message(
                &params,
                &empty_sum_dict,
                params.mask_config,
                1.0,
                model.clone(),
            );
            let (header, update) = match msg {
                Message {
                    header,
                    payload: Payload::Update(update),
                } => (header, update),
                _ => unreachable!(),
            };
            if update.sum_signature.is_eligible(params.sum) && update.update_signature.is_eligible(params.update) {
                break (header, update);
            }
        };

        let pre_processor = UpdatePreProcessor {
            header,
            message,
            params,
        };
        assert_eq!(
            pre_processor.call().unwrap_err(),
            PreProcessorError::NotUpdateEligible
        );
    }
}
