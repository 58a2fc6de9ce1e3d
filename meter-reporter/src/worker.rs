// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::ingest::{Ingestor, PayloadKind, PayloadSink, PayloadSource, PayloadSourceKind};
use crate::shared::configuration::ReporterConfiguration;
use crate::shared::constants;
use crate::store::UploadScheduler;
use crate::symbolizer::{self, ModuleEnumerator, SymbolResolver};
use crate::upload::{Transport, UploadCompletion};

use anyhow::Result;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug)]
pub enum ReporterActions {
    ReceivePayloads {
        kind: PayloadKind,
        payloads: Vec<Vec<u8>>,
    },
    /// Expire old reports and resubmit the others.
    ResubmitPending,
    /// Answered once no upload is in flight.
    Flush(oneshot::Sender<()>),
    Stop,
}

/// Owns the report directory. Everything that touches it, apart from the
/// panic hook, runs on this task.
pub struct ReporterWorker {
    enabled: bool,
    scheduler: UploadScheduler,
    ingestor: Ingestor,
    mailbox: mpsc::Receiver<ReporterActions>,
    completions: mpsc::UnboundedReceiver<UploadCompletion>,
    flush_waiters: Vec<oneshot::Sender<()>>,
}

impl ReporterWorker {
    async fn run(mut self) {
        use ReporterActions::*;

        loop {
            let action = tokio::select! {
                Some(completion) = self.completions.recv() => {
                    self.scheduler.handle_completion(completion);
                    self.notify_flush_waiters();
                    continue;
                }
                action = self.mailbox.recv() => action,
            };
            let Some(action) = action else {
                debug!("All reporter handles dropped, stopping");
                return;
            };

            match action {
                ReceivePayloads { kind, payloads } => {
                    if !self.enabled {
                        warn!(
                            payloads = payloads.len(),
                            "Report directory unavailable, dropping payloads"
                        );
                        continue;
                    }
                    let summary = self.ingestor.ingest(&mut self.scheduler, kind, payloads);
                    info!(
                        persisted = summary.persisted,
                        raw = summary.raw,
                        dropped_simulated = summary.dropped_simulated,
                        write_failures = summary.write_failures,
                        correlated = summary.correlated,
                        "Ingested payload batch"
                    );
                }
                ResubmitPending => {
                    if !self.enabled {
                        continue;
                    }
                    match self.scheduler.resubmit_pending(SystemTime::now()) {
                        Ok(summary) => debug!(?summary, "Resubmitted pending reports"),
                        Err(e) => error!(error = %e, "Failed to list report directory"),
                    }
                }
                Flush(waiter) => {
                    self.flush_waiters.push(waiter);
                    self.notify_flush_waiters();
                }
                Stop => {
                    debug!(
                        in_flight = self.scheduler.in_flight(),
                        "Stopping reporter"
                    );
                    return;
                }
            }
        }
    }

    fn notify_flush_waiters(&mut self) {
        if self.scheduler.in_flight() > 0 {
            return;
        }
        for waiter in self.flush_waiters.drain(..) {
            let _ = waiter.send(());
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReporterHandle {
    sender: mpsc::Sender<ReporterActions>,
}

impl ReporterHandle {
    pub fn try_send_msg(&self, msg: ReporterActions) -> Result<()> {
        Ok(self.sender.try_send(msg)?)
    }

    pub async fn send_msg(&self, msg: ReporterActions) -> Result<()> {
        Ok(self.sender.send(msg).await?)
    }

    /// Queues a batch of diagnostic payloads. Callable from any thread.
    pub fn receive_payloads(&self, payloads: Vec<Vec<u8>>) -> Result<()> {
        self.receive(PayloadKind::Diagnostic, payloads)
    }

    /// Queues a batch of opaque payloads, uploaded as they are.
    pub fn receive_legacy_payloads(&self, payloads: Vec<Vec<u8>>) -> Result<()> {
        self.receive(PayloadKind::Legacy, payloads)
    }

    fn receive(&self, kind: PayloadKind, payloads: Vec<Vec<u8>>) -> Result<()> {
        if payloads.is_empty() {
            return Ok(());
        }
        self.try_send_msg(ReporterActions::ReceivePayloads { kind, payloads })
    }

    pub fn sweep(&self) -> Result<()> {
        self.try_send_msg(ReporterActions::ResubmitPending)
    }

    /// Resolves once every message sent before it has been handled and no
    /// upload is in flight.
    pub async fn flush(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send_msg(ReporterActions::Flush(tx)).await?;
        Ok(rx.await?)
    }

    pub fn send_stop(&self) -> Result<()> {
        self.try_send_msg(ReporterActions::Stop)
    }

    pub async fn stop(&self) -> Result<()> {
        self.send_msg(ReporterActions::Stop).await
    }
}

pub struct ReporterBuilder {
    config: ReporterConfiguration,
    transport: Option<Arc<dyn Transport>>,
    module_enumerator: Option<Box<dyn ModuleEnumerator>>,
    symbol_resolver: Option<Box<dyn SymbolResolver>>,
    payload_source: Option<Box<dyn PayloadSource>>,
    install_exception_recorder: bool,
}

impl ReporterBuilder {
    pub fn new(config: ReporterConfiguration) -> Self {
        Self {
            config,
            transport: None,
            module_enumerator: None,
            symbol_resolver: None,
            payload_source: None,
            install_exception_recorder: cfg!(feature = "collector"),
        }
    }

    /// Defaults to [`crate::upload::HttpTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn module_enumerator(mut self, enumerator: Box<dyn ModuleEnumerator>) -> Self {
        self.module_enumerator = Some(enumerator);
        self
    }

    pub fn symbol_resolver(mut self, resolver: Box<dyn SymbolResolver>) -> Self {
        self.symbol_resolver = Some(resolver);
        self
    }

    pub fn payload_source(mut self, source: Box<dyn PayloadSource>) -> Self {
        self.payload_source = Some(source);
        self
    }

    /// Whether to install the process-wide panic hook that records the
    /// exception correlated with the next crash diagnostic.
    pub fn install_exception_recorder(mut self, install: bool) -> Self {
        self.install_exception_recorder = install;
        self
    }

    /// Prepares the directory, runs the startup sweep and subscribes the
    /// payload source. Must be called from within a tokio runtime when the
    /// default transport is used.
    fn build_worker(self) -> Result<(ReporterHandle, ReporterWorker)> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.config)?,
        };
        let (tx, mailbox) = mpsc::channel(constants::MAILBOX_CAPACITY);
        let (completions_tx, completions) = mpsc::unbounded_channel();

        let mut ingestor = Ingestor::new(
            self.config.filter_simulated_payloads(),
            self.module_enumerator
                .unwrap_or_else(symbolizer::default_module_enumerator),
            self.symbol_resolver,
        );
        let mut scheduler = UploadScheduler::new(self.config, transport, completions_tx);

        let enabled = match scheduler.store().create_directory_if_needed() {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Crash reporting disabled for this session");
                false
            }
        };

        if enabled {
            // Read before the sweep removes the file: a panic that ended the
            // previous run belongs to a crash delivered during this one.
            ingestor.carry_exception_info(scheduler.store().take_exception_info());
            if self.install_exception_recorder {
                install_exception_recorder(&scheduler);
            }
            match scheduler.sweep_on_startup(SystemTime::now()) {
                Ok(summary) => info!(
                    expired = summary.expired,
                    resubmitted = summary.resubmitted,
                    removed_exception_info = summary.removed_exception_info,
                    "Swept report directory"
                ),
                Err(e) => error!(error = %e, "Failed to sweep report directory"),
            }
            if let Some(source) = self.payload_source {
                start_source(source, &tx);
            }
        }

        let worker = ReporterWorker {
            enabled,
            scheduler,
            ingestor,
            mailbox,
            completions,
            flush_waiters: Vec::new(),
        };
        Ok((ReporterHandle { sender: tx }, worker))
    }

    /// Starts the reporter on the current tokio runtime. The startup sweep has
    /// run by the time this returns.
    pub fn spawn(self) -> Result<(ReporterHandle, JoinHandle<()>)> {
        let runtime = Handle::try_current()?;
        let (handle, worker) = self.build_worker()?;
        let join_handle = runtime.spawn(worker.run());
        Ok((handle, join_handle))
    }

    /// Starts the reporter on a dedicated thread with its own runtime.
    pub fn run(self) -> Result<ReporterHandle> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (handle, worker) = {
            let _guard = runtime.enter();
            self.build_worker()?
        };

        std::thread::spawn(move || {
            runtime.block_on(worker.run());
        });

        Ok(handle)
    }
}

fn start_source(source: Box<dyn PayloadSource>, tx: &mpsc::Sender<ReporterActions>) {
    match source.kind() {
        PayloadSourceKind::Unavailable => {
            info!("No diagnostic payload source available on this platform");
        }
        kind => {
            if let Some(payload_kind) = kind.payload_kind() {
                debug!(?kind, "Subscribing to diagnostic payloads");
                source.start(PayloadSink::new(tx.clone(), payload_kind));
            }
        }
    }
}

#[cfg(feature = "http-transport")]
fn default_transport(config: &ReporterConfiguration) -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::upload::HttpTransport::new(config)?))
}

#[cfg(not(feature = "http-transport"))]
fn default_transport(_config: &ReporterConfiguration) -> Result<Arc<dyn Transport>> {
    anyhow::bail!("no transport configured and the http-transport feature is disabled")
}

#[cfg(feature = "collector")]
fn install_exception_recorder(scheduler: &UploadScheduler) {
    match crate::collector::install() {
        Ok(newly_installed) => {
            debug!(newly_installed, "Exception recorder installed");
            crate::collector::set_destination(Some(scheduler.store().exception_info_path()));
        }
        Err(e) => warn!(error = %e, "Failed to install exception recorder"),
    }
}

#[cfg(not(feature = "collector"))]
fn install_exception_recorder(_scheduler: &UploadScheduler) {
    debug!("Exception recorder not compiled in");
}
