#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/xaynetwork/xaynet/master/assets/logo.png",
    issue_tracker_base_url = "https://github.com/xaynetwork/xaynet/issues",
    html_favicon_url = "https://raw.githubusercontent.com/xaynetwork/xaynet/master/assets/favicon.png"
)]

//! `xaynet-server` runs the coordinator side of a federated learning round: the PET protocol
//! phase machine, the Redis-backed state store behind it, the services layer that turns an
//! incoming wire message into a state machine request, and the thin HTTP surface participants
//! talk to.

#[macro_use]
extern crate async_trait;
#[macro_use]
extern crate serde;
#[macro_use]
extern crate tracing;
#[macro_use]
extern crate validator_derive;
#[macro_use]
extern crate xaynet_macros;

pub mod multipart;
pub mod rest;
pub mod services;
pub mod settings;
pub mod state_machine;
pub mod storage;

#[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
#[cfg(feature = "metrics")]
pub mod metrics;
