// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Uploads diagnostic payload files, plus whatever reports earlier runs left
//! behind, then exits.
//!
//! Configuration is read from `METER_REPORTER_*` environment variables and
//! logging is controlled with `RUST_LOG` (`info` when unset).

use anyhow::Context;
use clap::Parser;
use meter_reporter::ingest::{FileSource, PayloadKind};
use meter_reporter::shared::configuration::ReporterConfiguration;
use meter_reporter::ReporterBuilder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "meter-reporter-upload")]
#[command(about = "Upload diagnostic payload files and any reports left by previous runs")]
struct Args {
    /// Upload the files as opaque payloads, without decoding or correlation
    #[arg(long)]
    legacy: bool,
    /// Payload files, ingested as a single batch
    paths: Vec<PathBuf>,
}

impl Args {
    fn payload_kind(&self) -> PayloadKind {
        if self.legacy {
            PayloadKind::Legacy
        } else {
            PayloadKind::Diagnostic
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();

    let config = ReporterConfiguration::from_env().context("invalid configuration")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let kind = args.payload_kind();
    runtime.block_on(async move {
        let (handle, join) = ReporterBuilder::new(config)
            .payload_source(Box::new(FileSource::new(args.paths, kind)))
            .spawn()?;
        handle.flush().await?;
        handle.stop().await?;
        join.await?;
        anyhow::Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flag_and_paths() {
        let args = Args::try_parse_from(["meter-reporter-upload", "--legacy", "a.json", "b.json"])
            .unwrap();
        assert_eq!(args.payload_kind(), PayloadKind::Legacy);
        assert_eq!(
            args.paths,
            vec![PathBuf::from("a.json"), PathBuf::from("b.json")]
        );

        let args = Args::try_parse_from(["meter-reporter-upload", "c.json"]).unwrap();
        assert_eq!(args.payload_kind(), PayloadKind::Diagnostic);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Args::try_parse_from(["meter-reporter-upload", "--bogus", "a.json"]).is_err());
    }

    #[test]
    fn log_filter_defaults_to_info() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(env_filter().to_string(), "info");
    }
}
