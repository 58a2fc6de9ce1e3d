// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

//! Crash diagnostic pipeline.
//!
//! Diagnostic payloads delivered by the operating system are decoded,
//! annotated with the panic recorded during the previous run and with local
//! symbol information, then persisted to a report directory and uploaded.
//! A report file stays on disk until the endpoint accepts it or it ages out,
//! so pending uploads survive restarts and crashes.
//!
//! ```no_run
//! use meter_reporter::shared::configuration::ReporterConfiguration;
//! use meter_reporter::ReporterBuilder;
//!
//! # async fn run(payloads: Vec<Vec<u8>>) -> anyhow::Result<()> {
//! let config = ReporterConfiguration::for_endpoint("https://collect.example.com/reports/")?;
//! let (handle, _join) = ReporterBuilder::new(config).spawn()?;
//! handle.receive_payloads(payloads)?;
//! handle.flush().await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "collector")]
pub mod collector;
pub mod diagnostic;
mod error;
pub mod ingest;
pub mod shared;
pub mod store;
pub mod symbolizer;
pub mod upload;
mod worker;

pub use error::ReporterError;
pub use worker::{ReporterActions, ReporterBuilder, ReporterHandle};
