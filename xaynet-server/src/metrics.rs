//! Metrics emission (feature-gated; the protocol core has nothing to say about it).
//!
//! A phase handler that wants to record something sends a [`Metric`] down the unbounded channel
//! carried in [`crate::state_machine::phases::IO::metrics_tx`], wrapped in the
//! [`xaynet_macros::metrics!`] call-site helper so the whole statement - sender included -
//! disappears when this feature is off. [`run`] drains the receiving half into InfluxDB.

use chrono::Utc;
use influxdb::{Client, Timestamp, WriteQuery};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use crate::{settings::MetricsSettings, state_machine::phases::PhaseName};

/// A single metrics event, tagged with the round it was recorded during.
#[derive(Debug, Clone)]
pub enum Metric {
    /// A message of some kind was accepted by a phase handler.
    Message {
        kind: &'static str,
        round_id: u64,
        phase: PhaseName,
    },
    /// A phase ran to completion (or failure) after this many seconds.
    PhaseDuration {
        phase: PhaseName,
        round_id: u64,
        seconds: f64,
    },
    /// A round reached a terminal outcome (`Unmask` committed a model, or `Failed` discarded
    /// one).
    RoundOutcome { round_id: u64, success: bool },
}

impl Metric {
    fn into_query(self) -> WriteQuery {
        match self {
            Metric::Message {
                kind,
                round_id,
                phase,
            } => WriteQuery::new(Timestamp::Now, "messages")
                .add_tag("kind", kind)
                .add_tag("phase", format!("{:?}", phase))
                .add_field("round_id", round_id as i64),
            Metric::PhaseDuration {
                phase,
                round_id,
                seconds,
            } => WriteQuery::new(Timestamp::Now, "phase_duration")
                .add_tag("phase", format!("{:?}", phase))
                .add_field("round_id", round_id as i64)
                .add_field("seconds", seconds),
            Metric::RoundOutcome { round_id, success } => {
                WriteQuery::new(Timestamp::Now, "round_outcome")
                    .add_field("round_id", round_id as i64)
                    .add_field("success", success)
            }
        }
    }
}

/// Counters for each message kind, grouped by the phase that accepted them.
pub mod message {
    pub mod sum {
        use crate::{metrics::Metric, state_machine::phases::PhaseName};

        pub fn increment(round_id: u64, phase: PhaseName) -> Metric {
            Metric::Message {
                kind: "sum",
                round_id,
                phase,
            }
        }
    }

    pub mod update {
        use crate::{metrics::Metric, state_machine::phases::PhaseName};

        pub fn increment(round_id: u64, phase: PhaseName) -> Metric {
            Metric::Message {
                kind: "update",
                round_id,
                phase,
            }
        }
    }

    pub mod sum2 {
        use crate::{metrics::Metric, state_machine::phases::PhaseName};

        pub fn increment(round_id: u64, phase: PhaseName) -> Metric {
            Metric::Message {
                kind: "sum2",
                round_id,
                phase,
            }
        }
    }
}

/// Drains `rx`, writing every [`Metric`] it receives to the InfluxDB database described by
/// `settings`. Runs until the channel closes, i.e. for the coordinator's whole lifetime.
pub async fn run(mut rx: UnboundedReceiver<Metric>, settings: MetricsSettings) {
    use tokio::stream::StreamExt;

    let client = Client::new(settings.influxdb.url, settings.influxdb.db);
    while let Some(metric) = rx.next().await {
        // a dropped point is not worth taking the coordinator down over.
        if let Err(err) = client.query(&metric.into_query()).await {
            warn!("failed to write metric to influxdb: {}", err);
        }
    }
    // silence the unused-import warning for `chrono::Utc` until a metric needs an explicit
    // timestamp rather than `Timestamp::Now`.
    let _ = Utc::now();
}
