//! The coordinator binary: loads configuration, connects to Redis, starts the round state
//! machine, and serves the participant-facing HTTP API.

use std::process;

use structopt::StructOpt;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use xaynet_core::{
    common::RoundParameters,
    mask::{Aggregation, MaskConfig, MaskConfigPair, MaskObject},
    EncryptedMaskSeed,
    SeedDict,
    SumDict,
    SumParticipantEphemeralPublicKey,
    SumParticipantPublicKey,
    UpdateParticipantPublicKey,
    UpdateSeedDict,
};
use xaynet_core::crypto::ByteObject;
use xaynet_server::{
    rest,
    services::{fetchers::EventFetcher, messages::PetMessageHandler},
    settings::Settings,
    state_machine::{
        coordinator::CoordinatorState,
        events::EventPublisher,
        phases::{sum2::MaskDict, Idle, PhaseName, PhaseState, Shared, Sum, Sum2, Unmask, Update, IO},
        requests,
        StateMachine,
    },
    storage::redis::RedisStore,
};

/// Rebuilds the round's `SumDict` from whatever admissions the state store durably recorded.
async fn load_sum_dict(redis: &RedisStore, round_id: u64) -> SumDict {
    redis
        .sum_dict(round_id)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(pk, ephm_pk)| {
            Some((
                SumParticipantPublicKey::from_slice(&pk)?,
                SumParticipantEphemeralPublicKey::from_slice(&ephm_pk)?,
            ))
        })
        .collect()
}

/// Rebuilds the round's `SeedDict` by fetching each sum participant's slice in turn.
async fn load_seed_dict(redis: &RedisStore, round_id: u64, sum_dict: &SumDict) -> SeedDict {
    let mut seed_dict = SeedDict::new();
    for sum_pk in sum_dict.keys() {
        let entries = redis.seed_dict(round_id, sum_pk).await.unwrap_or_default();
        let mut update_seed_dict = UpdateSeedDict::new();
        for (update_pk, encrypted_seed) in entries {
            if let Some(update_pk) = UpdateParticipantPublicKey::from_slice(&update_pk) {
                update_seed_dict.insert(update_pk, EncryptedMaskSeed::from(encrypted_seed));
            }
        }
        seed_dict.insert(*sum_pk, update_seed_dict);
    }
    seed_dict
}

/// Restores the round's running aggregators, or starts fresh ones if no update has been durably
/// recorded yet (e.g. resuming right after the sum phase handed off).
async fn load_aggregation(
    redis: &RedisStore,
    round_id: u64,
    mask_config: MaskConfigPair,
    model_size: usize,
) -> (Aggregation, Aggregation) {
    match redis.aggregation(round_id).await {
        Ok(Some(pair)) => pair,
        _ => (
            Aggregation::new(mask_config, model_size),
            Aggregation::new(mask_config, 1),
        ),
    }
}

/// Rebuilds the sum2 mask tally from the state store's vote counts.
async fn load_mask_dict(redis: &RedisStore, round_id: u64) -> MaskDict {
    redis
        .best_masks(round_id)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(bytes, score)| {
            bincode::deserialize::<MaskObject>(&bytes)
                .ok()
                .map(|mask| (mask, score as u64))
        })
        .collect()
}

#[derive(Debug, StructOpt)]
#[structopt(name = "coordinator")]
struct CliArgs {
    /// Path to the configuration file.
    #[structopt(short, long)]
    config_path: String,
}

fn init_logging(filter: &str) {
    FmtSubscriber::builder()
        .with_env_filter(filter.to_string())
        .init();
}

#[tokio::main]
async fn main() {
    let args = CliArgs::from_args();
    let settings = Settings::new(&args.config_path).unwrap_or_else(|err| {
        eprintln!("failed to load settings: {}", err);
        process::exit(1);
    });

    init_logging(&settings.log.filter);

    let redis = RedisStore::new(&settings.redis)
        .await
        .unwrap_or_else(|err| {
            eprintln!("failed to connect to redis: {}", err);
            process::exit(1);
        });

    let mask_config: MaskConfig = settings.mask.into();
    let state = if settings.restore.enable {
        match redis.coordinator_state().await {
            Ok(Some(state)) => {
                info!("resuming from a persisted coordinator state snapshot");
                state
            }
            Ok(None) => {
                warn!("restore enabled but no snapshot found, starting a fresh round");
                CoordinatorState::new(settings.pet, mask_config.into(), settings.model.length)
            }
            Err(err) => {
                eprintln!("failed to load the persisted coordinator state: {}", err);
                process::exit(1);
            }
        }
    } else {
        CoordinatorState::new(settings.pet, mask_config.into(), settings.model.length)
    };

    let round_params = RoundParameters {
        seed: state.seed,
        sum: state.sum_ratio,
        update: state.update_ratio,
        mask_config: state.mask_config.vector,
        model_length: state.model_size,
    };
    let (events, event_subscriber) = EventPublisher::init(state.round_id, round_params);
    let (request_tx, request_rx) = requests::channel();

    #[cfg(feature = "metrics")]
    let metrics_tx = {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tokio::spawn(xaynet_server::metrics::run(rx, settings.metrics));
        Some(tx)
    };

    let phase = state.phase;
    let round_id = state.round_id;
    let mask_config = state.mask_config;
    let model_size = state.model_size;

    let io = IO {
        redis,
        events,
        request_rx,
        #[cfg(feature = "metrics")]
        metrics_tx,
    };
    let shared = Shared::new(state, io);

    // A coordinator restart resumes the phase the persisted snapshot left off at, rebuilding
    // that phase's round tables from the state store rather than silently dropping back to a
    // fresh round.
    let state_machine: StateMachine = match phase {
        PhaseName::Sum => {
            let sum_dict = load_sum_dict(&shared.io.redis, round_id).await;
            info!("resuming the sum phase with {} admitted participants", sum_dict.len());
            PhaseState::<Sum>::resume(shared, sum_dict).into()
        }
        PhaseName::Update => {
            let sum_dict = load_sum_dict(&shared.io.redis, round_id).await;
            let seed_dict = load_seed_dict(&shared.io.redis, round_id, &sum_dict).await;
            let (model_agg, scalar_agg) = load_aggregation(&shared.io.redis, round_id, mask_config, model_size).await;
            info!("resuming the update phase");
            PhaseState::<Update>::resume(shared, sum_dict, seed_dict, model_agg, scalar_agg).into()
        }
        PhaseName::Sum2 => {
            let sum_dict = load_sum_dict(&shared.io.redis, round_id).await;
            let (model_agg, scalar_agg) = load_aggregation(&shared.io.redis, round_id, mask_config, model_size).await;
            let mask_dict = load_mask_dict(&shared.io.redis, round_id).await;
            info!("resuming the sum2 phase");
            PhaseState::<Sum2>::resume(shared, sum_dict, model_agg, scalar_agg, mask_dict).into()
        }
        PhaseName::Unmask => {
            let (model_agg, scalar_agg) = load_aggregation(&shared.io.redis, round_id, mask_config, model_size).await;
            let mask_dict = load_mask_dict(&shared.io.redis, round_id).await;
            info!("resuming the unmask phase");
            PhaseState::<Unmask>::new(shared, model_agg, scalar_agg, mask_dict).into()
        }
        PhaseName::Idle | PhaseName::Failed | PhaseName::Shutdown => PhaseState::<Idle>::new(shared).into(),
    };

    let handler = PetMessageHandler::new(event_subscriber.clone(), request_tx);
    let fetcher = EventFetcher::new(event_subscriber);

    tokio::select! {
        biased;

        _ = signal::ctrl_c() => {
            info!("received shutdown signal");
        }
        _ = state_machine.run() => {
            warn!("the state machine's request channel closed, shutting down");
        }
        _ = rest::serve(settings.api.bind_address, fetcher, handler) => {}
    }
}
