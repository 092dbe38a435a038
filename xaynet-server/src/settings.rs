//! Loads the coordinator's configuration from a TOML file, overridable by `XAYNET__`-prefixed
//! environment variables.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

use xaynet_core::mask::{BoundType, DataType, GroupType, MaskConfig, ModelType};

#[derive(Debug, Error)]
/// An error loading or validating the coordinator's [`Settings`].
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Loading(#[from] ConfigError),
    #[error("invalid settings: {0}")]
    Validation(#[from] ValidationErrors),
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_pet_settings"))]
/// Settings controlling the PET protocol's selection thresholds and phase timings
/// (`pet.*`).
pub struct PetSettings {
    /// `pet.sum.prob`: the sum selection probability `t_sum`.
    pub sum: f64,
    /// `pet.update.prob`: the update selection probability `t_update`.
    pub update: f64,

    /// `pet.sum.count.min`
    pub min_sum_count: usize,
    /// `pet.sum.count.max`
    pub max_sum_count: usize,
    /// `pet.update.count.min`
    pub min_update_count: usize,
    /// `pet.update.count.max`
    pub max_update_count: usize,
    /// `pet.sum2.count.min`
    pub min_sum2_count: usize,
    /// `pet.sum2.count.max`
    pub max_sum2_count: usize,

    /// `pet.sum.time.min`, in seconds.
    pub min_sum_time: u64,
    /// `pet.sum.time.max`, in seconds.
    pub max_sum_time: u64,
    /// `pet.update.time.min`, in seconds.
    pub min_update_time: u64,
    /// `pet.update.time.max`, in seconds.
    pub max_update_time: u64,
    /// `pet.sum2.time.min`, in seconds.
    pub min_sum2_time: u64,
    /// `pet.sum2.time.max`, in seconds.
    pub max_sum2_time: u64,
}

/// Checks that the two selection probabilities are chosen so both roles are reachable
/// (`0 < t_sum < t_update < 1`) and that every `min <= max` pair is consistent.
fn validate_pet_settings(s: &PetSettings) -> Result<(), ValidationError> {
    if !(s.sum > 0. && s.sum < 1.) {
        return Err(ValidationError::new("pet.sum.prob must be in (0, 1)"));
    }
    if !(s.update > 0. && s.update < 1.) {
        return Err(ValidationError::new("pet.update.prob must be in (0, 1)"));
    }
    // in expectation both a sum and an update participant must be reachable from the same
    // draw, which requires the two events not to exhaust the probability space between them.
    if s.sum + s.update - s.sum * s.update >= 1. {
        return Err(ValidationError::new(
            "pet.sum.prob and pet.update.prob leave no room for both roles to be selected",
        ));
    }
    if s.min_sum_count > s.max_sum_count
        || s.min_update_count > s.max_update_count
        || s.min_sum2_count > s.max_sum2_count
    {
        return Err(ValidationError::new("count.min must not exceed count.max"));
    }
    if s.min_sum_time > s.max_sum_time
        || s.min_update_time > s.max_update_time
        || s.min_sum2_time > s.max_sum2_time
    {
        return Err(ValidationError::new("time.min must not exceed time.max"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Serialize, Validate)]
/// The model vector length, `L` (`model.length`).
pub struct ModelSettings {
    pub length: usize,
}

#[derive(Debug, Copy, Clone, Deserialize, Serialize)]
/// The masking configuration enumerants, `M` (`mask.*`).
///
/// Deserialized from the variant names of [`GroupType`]/[`DataType`]/[`BoundType`]/
/// [`ModelType`] so a TOML file reads as `group_type = "Prime"` etc.
pub struct MaskSettings {
    pub group_type: GroupType,
    pub data_type: DataType,
    pub bound_type: BoundType,
    pub model_type: ModelType,
}

impl From<MaskSettings> for MaskConfig {
    fn from(s: MaskSettings) -> Self {
        MaskConfig {
            group_type: s.group_type,
            data_type: s.data_type,
            bound_type: s.bound_type,
            model_type: s.model_type,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
/// The transport surface (`api.*`); the protocol core has nothing to say about it, but a bind address is
/// required for the (ambient) `warp` server to have somewhere to listen.
pub struct ApiSettings {
    pub bind_address: std::net::SocketAddr,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
/// The Redis connection used by the state store (`redis.url`).
pub struct RedisSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize)]
/// Tracing/log level configuration; not part of the protocol, but every `xaynet-server` binary
/// needs to decide how verbose to be.
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[cfg(feature = "metrics")]
#[derive(Debug, Deserialize, Serialize)]
/// InfluxDB connection settings; compiled in only with the `metrics` feature.
pub struct MetricsSettings {
    pub influxdb: InfluxSettings,
}

#[cfg(feature = "metrics")]
#[derive(Debug, Deserialize, Serialize)]
pub struct InfluxSettings {
    pub url: String,
    pub db: String,
}

#[derive(Debug, Deserialize, Serialize)]
/// Whether to restore the [`crate::state_machine::coordinator::CoordinatorState`] snapshot on
/// startup (`restore.enable`).
pub struct RestoreSettings {
    #[serde(default)]
    pub enable: bool,
}

#[derive(Debug, Deserialize, Serialize)]
/// The coordinator's full configuration, loaded once at startup.
pub struct Settings {
    pub api: ApiSettings,
    pub pet: PetSettings,
    pub mask: MaskSettings,
    pub model: ModelSettings,
    pub redis: RedisSettings,
    #[serde(default)]
    pub log: LoggingSettings,
    #[serde(default)]
    pub restore: RestoreSettings,
    #[cfg(feature = "metrics")]
    pub metrics: MetricsSettings,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for RestoreSettings {
    fn default() -> Self {
        Self { enable: false }
    }
}

impl Settings {
    /// Loads settings from `path` (a TOML file), then applies any `XAYNET__`-prefixed
    /// environment variable overrides (e.g. `XAYNET__API__BIND_ADDRESS`).
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let mut config = Config::new();
        config.merge(File::from(path.as_ref()))?;
        config.merge(Environment::with_prefix("xaynet").separator("__"))?;
        let settings: Self = config.try_into()?;
        settings.pet.validate()?;
        settings.model.validate()?;
        settings.api.validate()?;
        settings.redis.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet_settings() -> PetSettings {
        PetSettings {
            sum: 0.4,
            update: 0.5,
            min_sum_count: 1,
            max_sum_count: 10,
            min_update_count: 1,
            max_update_count: 10,
            min_sum2_count: 1,
            max_sum2_count: 10,
            min_sum_time: 1,
            max_sum_time: 10,
            min_update_time: 1,
            max_update_time: 10,
            min_sum2_time: 1,
            max_sum2_time: 10,
        }
    }

    #[test]
    fn accepts_reasonable_thresholds() {
        assert!(pet_settings().validate().is_ok());
    }

    #[test]
    fn rejects_starving_thresholds() {
        let mut settings = pet_settings();
        settings.sum = 0.9;
        settings.update = 0.9;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_inverted_count_bounds() {
        let mut settings = pet_settings();
        settings.min_sum_count = 5;
        settings.max_sum_count = 1;
        assert!(settings.validate().is_err());
    }
}
