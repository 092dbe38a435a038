//! A Redis-backed implementation of the coordinator's durable state.
//!
//! Every write here is either a single command or a `redis::Script` wrapping a handful of
//! commands the server evaluates atomically, so that two coordinator processes racing on the
//! same Redis instance (a restart overlapping the old process's shutdown, say) can never
//! interleave a read-modify-write.

use redis::{aio::ConnectionManager, AsyncCommands, RedisResult, Script};

use xaynet_core::{
    crypto::ByteObject, mask::{Aggregation, MaskObject}, SumParticipantEphemeralPublicKey,
    SumParticipantPublicKey, UpdateParticipantPublicKey,
};

use crate::{settings::RedisSettings, state_machine::coordinator::CoordinatorState, storage::StorageError};

const COORDINATOR_STATE_KEY: &str = "coordinator_state";

fn sum_dict_key(round_id: u64) -> Vec<u8> {
    format!("round:{}:sum_dict", round_id).into_bytes()
}

/// Redis keys are binary-safe, so the participant's raw public key bytes are appended directly
/// rather than hex-encoded.
fn seed_dict_key(round_id: u64, sum_pk: &SumParticipantPublicKey) -> Vec<u8> {
    seed_dict_key_bytes(round_id, sum_pk.as_slice())
}

fn seed_dict_key_bytes(round_id: u64, sum_pk: &[u8]) -> Vec<u8> {
    let mut key = format!("round:{}:seed_dict:", round_id).into_bytes();
    key.extend_from_slice(sum_pk);
    key
}

fn mask_dict_key(round_id: u64) -> Vec<u8> {
    format!("round:{}:mask_dict", round_id).into_bytes()
}

fn aggregation_key(round_id: u64) -> Vec<u8> {
    format!("round:{}:aggregation", round_id).into_bytes()
}

/// A thin, clonable wrapper around a Redis connection manager, exposing the coordinator's
/// per-round atomic state-store operations plus [`CoordinatorState`] snapshot/restore.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connects to the Redis instance described by `settings`.
    pub async fn new(settings: &RedisSettings) -> Result<Self, StorageError> {
        let client = redis::Client::open(settings.url.as_str())?;
        let connection = client.get_tokio_connection_manager().await?;
        Ok(Self { connection })
    }

    /// (1) Atomically adds a sum participant's ephemeral key to the round's `SumDict`.
    ///
    /// Returns `true` if this was a new entry, `false` if the participant was already present
    /// (e.g. a retransmitted sum message).
    pub async fn add_sum_participant(
        &self,
        round_id: u64,
        pk: &SumParticipantPublicKey,
        ephm_pk: &SumParticipantEphemeralPublicKey,
    ) -> Result<bool, StorageError> {
        const SCRIPT: &str = r#"
            if redis.call("HSETNX", KEYS[1], ARGV[1], ARGV[2]) == 1 then
                return 1
            else
                return 0
            end
        "#;
        let added: i64 = Script::new(SCRIPT)
            .key(sum_dict_key(round_id))
            .arg(pk.as_slice())
            .arg(ephm_pk.as_slice())
            .invoke_async(&mut self.connection.clone())
            .await?;
        Ok(added == 1)
    }

    /// (2) Fetches the round's `SumDict` as a flat list of `(participant_pk, ephm_pk)` pairs.
    pub async fn sum_dict(
        &self,
        round_id: u64,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let entries: Vec<(Vec<u8>, Vec<u8>)> = self
            .connection
            .clone()
            .hgetall(sum_dict_key(round_id))
            .await?;
        Ok(entries)
    }

    /// (3) Atomically appends one update participant's encrypted mask seed share to a sum
    /// participant's slice of the global `SeedDict`, rejecting a duplicate contribution from the
    /// same update participant.
    pub async fn add_seed(
        &self,
        round_id: u64,
        sum_pk: &SumParticipantPublicKey,
        update_pk: &UpdateParticipantPublicKey,
        encrypted_seed: &[u8],
    ) -> Result<bool, StorageError> {
        const SCRIPT: &str = r#"
            if redis.call("HSETNX", KEYS[1], ARGV[1], ARGV[2]) == 1 then
                return 1
            else
                return 0
            end
        "#;
        let added: i64 = Script::new(SCRIPT)
            .key(seed_dict_key(round_id, sum_pk))
            .arg(update_pk.as_slice())
            .arg(encrypted_seed)
            .invoke_async(&mut self.connection.clone())
            .await?;
        Ok(added == 1)
    }

    /// (4) Fetches a single sum participant's slice of the `SeedDict`.
    pub async fn seed_dict(
        &self,
        round_id: u64,
        sum_pk: &SumParticipantPublicKey,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let entries: Vec<(Vec<u8>, Vec<u8>)> = self
            .connection
            .clone()
            .hgetall(seed_dict_key(round_id, sum_pk))
            .await?;
        Ok(entries)
    }

    /// (5) Atomically increments a candidate mask's vote count in the round's mask tally.
    pub async fn incr_mask_score(
        &self,
        round_id: u64,
        mask: &MaskObject,
    ) -> Result<i64, StorageError> {
        let encoded = bincode::serialize(mask)?;
        let score: i64 = self
            .connection
            .clone()
            .zincr(mask_dict_key(round_id), encoded, 1_i64)
            .await?;
        Ok(score)
    }

    /// (6) Fetches the candidate mask(s) with the highest vote count, highest first; a tie is
    /// broken deterministically downstream by the caller, not by this store.
    pub async fn best_masks(&self, round_id: u64) -> Result<Vec<(Vec<u8>, i64)>, StorageError> {
        let entries: Vec<(Vec<u8>, i64)> = self
            .connection
            .clone()
            .zrevrange_withscores(mask_dict_key(round_id), 0, -1)
            .await?;
        Ok(entries)
    }

    /// (7) Drops every round-scoped key once a round has concluded (successfully or not),
    /// including a seed dict slice per sum participant the round ever admitted.
    pub async fn flush_round(&self, round_id: u64) -> Result<(), StorageError> {
        let sum_entries = self.sum_dict(round_id).await.unwrap_or_default();
        let mut conn = self.connection.clone();
        for (sum_pk, _) in &sum_entries {
            let _: RedisResult<()> = conn.del(seed_dict_key_bytes(round_id, sum_pk)).await;
        }
        let _: RedisResult<()> = conn.del(mask_dict_key(round_id)).await;
        let _: RedisResult<()> = conn.del(sum_dict_key(round_id)).await;
        let _: RedisResult<()> = conn.del(aggregation_key(round_id)).await;
        Ok(())
    }

    /// Persists the round's running masked-model and masked-scalar aggregators, so that a
    /// crash between two accepted update messages loses at most the in-flight request rather
    /// than every update admitted so far this round.
    pub async fn set_aggregation(
        &self,
        round_id: u64,
        model_agg: &Aggregation,
        scalar_agg: &Aggregation,
    ) -> Result<(), StorageError> {
        let encoded = bincode::serialize(&(model_agg, scalar_agg))?;
        let _: () = self
            .connection
            .clone()
            .set(aggregation_key(round_id), encoded)
            .await?;
        Ok(())
    }

    /// Restores the round's persisted aggregators, if any update has been durably recorded yet.
    pub async fn aggregation(
        &self,
        round_id: u64,
    ) -> Result<Option<(Aggregation, Aggregation)>, StorageError> {
        let encoded: Option<Vec<u8>> = self.connection.clone().get(aggregation_key(round_id)).await?;
        match encoded {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Persists a snapshot of [`CoordinatorState`] so a restarted coordinator can resume the
    /// round it left off at.
    pub async fn set_coordinator_state(&self, state: &CoordinatorState) -> Result<(), StorageError> {
        let encoded = bincode::serialize(state)?;
        let _: () = self
            .connection
            .clone()
            .set(COORDINATOR_STATE_KEY, encoded)
            .await?;
        Ok(())
    }

    /// Restores the most recently persisted [`CoordinatorState`], if any.
    pub async fn coordinator_state(&self) -> Result<Option<CoordinatorState>, StorageError> {
        let encoded: Option<Vec<u8>> = self.connection.clone().get(COORDINATOR_STATE_KEY).await?;
        match encoded {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }
}
