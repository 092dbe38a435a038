//! The thin HTTP surface participants poll and post to.
//!
//! Routing only: a GET endpoint for the round information participants need to decide whether
//! they're eligible, one GET endpoint per published table (`SumDict`, `SeedDict`, mask length,
//! model), and a single POST endpoint every phase's message (and multi-part chunk) goes through.
//! No TLS, no auth beyond the PET signatures already carried on the wire, matching the deliberate
//! narrowness of this surface relative to the protocol core it fronts.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use serde::Serialize;
use warp::{
    http::{Response, StatusCode},
    Filter,
};

use xaynet_core::{crypto::ByteObject, mask::MaskConfig, SumParticipantPublicKey};

use crate::{
    services::{
        fetchers::{FetchError, Fetcher},
        messages::{pre_processor::PreProcessorError, PetMessageHandler, ServiceError},
    },
    state_machine::{phases::PhaseName, requests::RequestError, StateMachineError},
};

/// The body returned by the round information endpoint.
#[derive(Debug, Serialize)]
struct RoundInfo {
    round: u64,
    phase: PhaseName,
    seed: Vec<u8>,
    model_length: usize,
    mask_config: MaskConfig,
    sum: f64,
    update: f64,
}

/// Starts the HTTP server at `addr`, serving `fetcher`'s read-only endpoints and forwarding
/// posted messages to `handler`.
pub async fn serve<F>(addr: impl Into<SocketAddr> + 'static, fetcher: F, handler: PetMessageHandler)
where
    F: Fetcher + Send + Sync + 'static,
{
    let fetcher = Arc::new(fetcher);
    let handler = Arc::new(handler);

    let message = warp::path!("message")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_handler(handler))
        .and_then(handle_message);

    let params = warp::path!("params")
        .and(warp::get())
        .and(with_fetcher(fetcher.clone()))
        .and_then(handle_params);

    let sums = warp::path!("sums")
        .and(warp::get())
        .and(with_fetcher(fetcher.clone()))
        .and_then(handle_sums);

    let seeds = warp::path!("seeds")
        .and(warp::get())
        .and(warp::body::bytes())
        .and(with_fetcher(fetcher.clone()))
        .and_then(handle_seeds);

    let length = warp::path!("length")
        .and(warp::get())
        .and(with_fetcher(fetcher.clone()))
        .and_then(handle_length);

    let model = warp::path!("model")
        .and(warp::get())
        .and(with_fetcher(fetcher))
        .and_then(handle_model);

    let routes = message
        .or(params)
        .or(sums)
        .or(seeds)
        .or(length)
        .or(model)
        .recover(handle_reject)
        .with(warp::log("xaynet_server::rest"));

    warp::serve(routes).run(addr).await
}

fn with_handler(
    handler: Arc<PetMessageHandler>,
) -> impl Filter<Extract = (Arc<PetMessageHandler>,), Error = Infallible> + Clone {
    warp::any().map(move || handler.clone())
}

fn with_fetcher<F: Fetcher + Send + Sync + 'static>(
    fetcher: Arc<F>,
) -> impl Filter<Extract = (Arc<F>,), Error = Infallible> + Clone {
    warp::any().map(move || fetcher.clone())
}

/// Maps a failure to handle a posted message onto the status codes participants are told to
/// expect: `400` malformed/signature-invalid, `409` rules-level rejection, `503` while the
/// coordinator is unavailable to accept it.
fn status_of(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Parsing(_) => StatusCode::BAD_REQUEST,
        ServiceError::PreProcessor(PreProcessorError::InvalidSumSignature)
        | ServiceError::PreProcessor(PreProcessorError::InvalidUpdateSignature) => {
            StatusCode::BAD_REQUEST
        }
        ServiceError::PreProcessor(PreProcessorError::NotSumEligible)
        | ServiceError::PreProcessor(PreProcessorError::NotUpdateEligible) => {
            StatusCode::CONFLICT
        }
        ServiceError::Request(RequestError::CoordinatorShutdown) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ServiceError::Request(RequestError::UnexpectedChunk) => StatusCode::BAD_REQUEST,
        ServiceError::Request(RequestError::Rejected(state_machine_error)) => {
            match state_machine_error {
                StateMachineError::MessageRejected
                | StateMachineError::AggregationFailed
                | StateMachineError::InvalidLocalSeedDict => StatusCode::CONFLICT,
                StateMachineError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            }
        }
    }
}

async fn handle_message(
    body: Bytes,
    handler: Arc<PetMessageHandler>,
) -> Result<impl warp::Reply, Infallible> {
    Ok(match handler.handle_message(body.to_vec()).await {
        Ok(()) => warp::reply::with_status(Vec::new(), StatusCode::ACCEPTED),
        Err(err) => {
            tracing::warn!("rejected message: {}", err);
            warp::reply::with_status(Vec::new(), status_of(&err))
        }
    })
}

async fn handle_params<F: Fetcher>(fetcher: Arc<F>) -> Result<impl warp::Reply, Infallible> {
    Ok(match fetcher.round_params().await {
        Ok(params) => {
            let (round, phase) = fetcher
                .round_and_phase()
                .await
                .unwrap_or((0, PhaseName::Idle));
            let info = RoundInfo {
                round,
                phase,
                seed: params.seed.as_slice().to_vec(),
                model_length: params.model_length,
                mask_config: params.mask_config,
                sum: params.sum,
                update: params.update,
            };
            let bytes = bincode::serialize(&info).expect("round info is always serializable");
            Response::builder()
                .header("Content-Type", "application/octet-stream")
                .status(StatusCode::OK)
                .body(bytes)
                .unwrap()
        }
        Err(FetchError::ChannelClosed) => Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Vec::new())
            .unwrap(),
    })
}

async fn handle_sums<F: Fetcher>(fetcher: Arc<F>) -> Result<impl warp::Reply, Infallible> {
    Ok(match fetcher.sum_dict().await {
        Ok(Some(dict)) => {
            let bytes = bincode::serialize(dict.as_ref()).expect("sum dict is always serializable");
            Response::builder()
                .header("Content-Type", "application/octet-stream")
                .status(StatusCode::OK)
                .body(bytes)
                .unwrap()
        }
        Ok(None) => Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Vec::new())
            .unwrap(),
        Err(FetchError::ChannelClosed) => Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Vec::new())
            .unwrap(),
    })
}

async fn handle_seeds<F: Fetcher>(
    pk_bytes: Bytes,
    fetcher: Arc<F>,
) -> Result<impl warp::Reply, Infallible> {
    let pk = match SumParticipantPublicKey::from_slice(&pk_bytes) {
        Some(pk) => pk,
        None => {
            return Ok(Response::builder()
                .status(StatusCode::BAD_REQUEST)
                .body(Vec::new())
                .unwrap())
        }
    };

    Ok(match fetcher.seed_dict().await {
        Ok(Some(dict)) => match dict.get(&pk) {
            Some(seeds) => {
                let bytes = bincode::serialize(seeds).expect("seed dict entry is always serializable");
                Response::builder()
                    .header("Content-Type", "application/octet-stream")
                    .status(StatusCode::OK)
                    .body(bytes)
                    .unwrap()
            }
            None => Response::builder()
                .status(StatusCode::NO_CONTENT)
                .body(Vec::new())
                .unwrap(),
        },
        Ok(None) => Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Vec::new())
            .unwrap(),
        Err(FetchError::ChannelClosed) => Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Vec::new())
            .unwrap(),
    })
}

async fn handle_length<F: Fetcher>(fetcher: Arc<F>) -> Result<impl warp::Reply, Infallible> {
    Ok(match fetcher.mask_length().await {
        Ok(Some(len)) => Response::builder()
            .status(StatusCode::OK)
            .body(len.to_string().into_bytes())
            .unwrap(),
        Ok(None) => Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Vec::new())
            .unwrap(),
        Err(FetchError::ChannelClosed) => Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Vec::new())
            .unwrap(),
    })
}

async fn handle_model<F: Fetcher>(fetcher: Arc<F>) -> Result<impl warp::Reply, Infallible> {
    Ok(match fetcher.model().await {
        Ok(Some(model)) => {
            let bytes = bincode::serialize(model.as_ref()).expect("model is always serializable");
            Response::builder()
                .header("Content-Type", "application/octet-stream")
                .status(StatusCode::OK)
                .body(bytes)
                .unwrap()
        }
        Ok(None) => Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(Vec::new())
            .unwrap(),
        Err(FetchError::ChannelClosed) => Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(Vec::new())
            .unwrap(),
    })
}

async fn handle_reject(err: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let code = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        tracing::error!("unhandled rejection: {:?}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok(warp::reply::with_status(Vec::new(), code))
}
