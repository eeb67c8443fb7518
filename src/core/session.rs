//! Runs the orchestrator's I/O off the owning thread.
//!
//! Every [`Command`] is executed on its own worker thread against a
//! [`SampleApi`]; results come back as [`Completion`]s over a channel and are
//! applied on the thread that owns the [`Session`].

use crate::{
    config::ClientConfig,
    core::{
        orchestrator::{Command, Completion, Orchestrator},
        player::EngineFactory,
        request::GenerateRejected,
    },
    error::{ClientError, Result},
    io::net::{ApiClient, SampleApi},
};
use anyhow::anyhow;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::{path::PathBuf, sync::Arc, thread, time::Duration};

pub struct Session {
    orchestrator: Orchestrator,
    api: Arc<dyn SampleApi>,
    download_dir: PathBuf,
    idle_timeout: Duration,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    pending: usize,
}

impl Session {
    pub fn new(
        config: &ClientConfig,
        api: Arc<dyn SampleApi>,
        factory: Box<dyn EngineFactory>,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            orchestrator: Orchestrator::new(config, factory),
            api,
            download_dir: config.download_dir.clone(),
            // every job is bounded by the HTTP timeout; leave room for connect
            idle_timeout: config.request_timeout() + config.connect_timeout(),
            tx,
            rx,
            pending: 0,
        }
    }

    /// Session talking to the HTTP service described by `config`.
    pub fn connect(config: &ClientConfig, factory: Box<dyn EngineFactory>) -> Result<Self> {
        let api = ApiClient::new(config)?;
        Ok(Self::new(config, Arc::new(api), factory))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator {
        &mut self.orchestrator
    }

    pub fn api(&self) -> &dyn SampleApi {
        self.api.as_ref()
    }

    /// Jobs dispatched but not yet applied.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn generate(&mut self) -> std::result::Result<(), GenerateRejected> {
        let cmd = self.orchestrator.generate()?;
        self.dispatch(cmd);
        Ok(())
    }

    pub fn download(&mut self, id: &str) {
        let cmd = self.orchestrator.download(id);
        self.dispatch(cmd);
    }

    fn dispatch(&mut self, cmd: Command) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let dir = self.download_dir.clone();
        self.pending += 1;
        thread::spawn(move || {
            let completion = execute(api.as_ref(), cmd, &dir);
            // The session may be gone already; nothing to deliver to then.
            let _ = tx.send(completion);
        });
    }

    fn deliver(&mut self, completion: Completion) {
        self.pending = self.pending.saturating_sub(1);
        for follow in self.orchestrator.apply(completion) {
            self.dispatch(follow);
        }
        self.orchestrator.pump_engine_signals();
    }

    /// Applies whatever has completed so far without blocking.
    pub fn pump(&mut self) -> usize {
        let mut n = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.deliver(completion);
            n += 1;
        }
        self.orchestrator.pump_engine_signals();
        n
    }

    /// Blocks until every dispatched job, including follow-ups, is applied.
    pub fn run_until_idle(&mut self) -> Result<usize> {
        let mut n = 0;
        while self.pending > 0 {
            match self.rx.recv_timeout(self.idle_timeout) {
                Ok(completion) => {
                    self.deliver(completion);
                    n += 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(ClientError::Anyhow(anyhow!(
                        "timed out with {} request(s) outstanding",
                        self.pending
                    )));
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.orchestrator.pump_engine_signals();
        Ok(n)
    }
}

/// Performs one command and maps failures onto the error taxonomy.
pub fn execute(api: &dyn SampleApi, cmd: Command, download_dir: &std::path::Path) -> Completion {
    match cmd {
        Command::Generate {
            ticket,
            source,
            params,
        } => Completion::Generated {
            ticket,
            outcome: api
                .generate(&source, &params)
                .map_err(|e| ClientError::GenerationFailed(e.to_string())),
        },
        Command::RefreshHistory { ticket } => Completion::HistoryFetched {
            ticket,
            outcome: api
                .list_all_audio()
                .map_err(|e| ClientError::HistoryFetchFailed(e.to_string())),
        },
        Command::Download { id } => {
            let outcome = api
                .download_audio(&id, download_dir)
                .map_err(|e| ClientError::DownloadFailed {
                    id: id.clone(),
                    reason: e.to_string(),
                });
            Completion::Downloaded { id, outcome }
        }
    }
}
