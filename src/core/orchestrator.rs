//! The sample lifecycle state machine.
//!
//! The orchestrator never performs I/O itself. User actions return a
//! [`Command`] for the runtime to execute, and finished I/O comes back as a
//! [`Completion`] that may yield follow-up commands. Applying a generation
//! result always happens before the history refresh it triggers, because that
//! refresh command is only produced while the result is being applied.

use crate::{
    config::ClientConfig,
    core::{
        gallery::ResultGallery,
        history::{History, RefreshTicket},
        player::{
            EngineFactory, EngineHost, EngineSignal, LoadId, PlayerSource, PlayerState,
            WaveformPlayer,
        },
        request::{GenerateRejected, GenerationEvent, GenerationRequest, GenerationTicket},
        source::{accept_drop, DroppedFile, UploadRejection},
    },
    error::ClientError,
    types::{AudioSource, GenerationParameters, Notice, SlotId, GENERATION_ERROR, UPLOAD_WARNING},
};
use std::path::PathBuf;

/// I/O the runtime must perform on the orchestrator's behalf.
#[derive(Debug, Clone)]
pub enum Command {
    Generate {
        ticket: GenerationTicket,
        source: AudioSource,
        params: GenerationParameters,
    },
    RefreshHistory {
        ticket: RefreshTicket,
    },
    Download {
        id: String,
    },
}

#[derive(Debug)]
pub enum Completion {
    Generated {
        ticket: GenerationTicket,
        outcome: Result<Vec<String>, ClientError>,
    },
    HistoryFetched {
        ticket: RefreshTicket,
        outcome: Result<Vec<String>, ClientError>,
    },
    Downloaded {
        id: String,
        outcome: Result<PathBuf, ClientError>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotView {
    pub id: Option<String>,
    pub state: PlayerState,
}

/// Read-only picture of everything a front end renders.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    pub source_name: Option<String>,
    pub input: PlayerState,
    pub params: GenerationParameters,
    pub busy: bool,
    pub can_generate: bool,
    pub gallery: Vec<SlotView>,
    pub history: Vec<SlotView>,
}

pub struct Orchestrator {
    api_base: String,
    host: EngineHost,
    source: Option<AudioSource>,
    params: GenerationParameters,
    input: WaveformPlayer,
    request: GenerationRequest,
    gallery: ResultGallery,
    history: History,
    notices: Vec<Notice>,
    downloads: Vec<PathBuf>,
    mounted: bool,
}

impl Orchestrator {
    pub fn new(config: &ClientConfig, factory: Box<dyn EngineFactory>) -> Self {
        Self {
            api_base: config.api_base().to_string(),
            host: EngineHost::new(factory),
            source: None,
            params: GenerationParameters::default(),
            input: WaveformPlayer::new(SlotId::Input),
            request: GenerationRequest::new(),
            gallery: ResultGallery::new(),
            history: History::new(),
            notices: Vec::new(),
            downloads: Vec::new(),
            mounted: true,
        }
    }

    pub fn source(&self) -> Option<&AudioSource> {
        self.source.as_ref()
    }

    pub fn params(&self) -> GenerationParameters {
        self.params
    }

    pub fn gallery(&self) -> &ResultGallery {
        &self.gallery
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.request.generation()
    }

    pub fn is_busy(&self) -> bool {
        self.request.is_busy()
    }

    /// Whether the generate control is enabled.
    pub fn can_generate(&self) -> bool {
        self.mounted && self.source.is_some() && !self.request.is_busy()
    }

    /// Handles one drop event. On rejection the current source is kept and a
    /// warning notice is queued.
    pub fn drop_files(&mut self, files: Vec<DroppedFile>) -> Result<(), UploadRejection> {
        let source = match accept_drop(files) {
            Ok(source) => source,
            Err(rejection) => {
                tracing::warn!(%rejection, "upload rejected");
                self.notices.push(Notice::warn(UPLOAD_WARNING));
                return Err(rejection);
            }
        };

        tracing::info!(name = %source.name, bytes = source.len(), "audio source replaced");
        let player_source = PlayerSource::Local {
            name: source.name.clone(),
            bytes: source.bytes.clone(),
        };
        self.source = Some(source);
        if self.mounted {
            self.input.bind(player_source, &self.host);
        }
        Ok(())
    }

    pub fn set_pitch_shift(&mut self, value: f32) {
        self.params.set_pitch_shift(value);
    }

    pub fn set_variation(&mut self, value: f32) {
        self.params.set_variation(value);
    }

    /// Opens the single-flight gate and returns the request to send.
    pub fn generate(&mut self) -> Result<Command, GenerateRejected> {
        if !self.mounted {
            return Err(GenerateRejected::Unmounted);
        }
        let ticket = self.request.begin(self.source.as_ref())?;
        let source = self.source.clone().ok_or(GenerateRejected::NoSource)?;
        tracing::info!(
            ticket = ticket.0,
            name = %source.name,
            params = ?self.params,
            "generation requested"
        );
        Ok(Command::Generate {
            ticket,
            source,
            params: self.params,
        })
    }

    pub fn download(&self, id: &str) -> Command {
        Command::Download { id: id.to_string() }
    }

    /// Applies finished I/O and returns any follow-up commands.
    pub fn apply(&mut self, completion: Completion) -> Vec<Command> {
        match completion {
            Completion::Generated { ticket, outcome } => self.apply_generated(ticket, outcome),
            Completion::HistoryFetched { ticket, outcome } => {
                match outcome {
                    Ok(urls) => {
                        if self.mounted {
                            self.history.apply_refresh(ticket, urls, &self.api_base, &self.host);
                        }
                    }
                    Err(error) => self.history.refresh_failed(ticket, &error),
                }
                Vec::new()
            }
            Completion::Downloaded { id, outcome } => {
                match outcome {
                    Ok(path) => {
                        tracing::info!(%id, path = %path.display(), "sample saved");
                        self.downloads.push(path);
                    }
                    Err(error) => tracing::error!(%id, %error, "error downloading sample"),
                }
                Vec::new()
            }
        }
    }

    fn apply_generated(
        &mut self,
        ticket: GenerationTicket,
        outcome: Result<Vec<String>, ClientError>,
    ) -> Vec<Command> {
        let Some(event) = self.request.complete(ticket, outcome) else {
            return Vec::new();
        };

        match &event {
            GenerationEvent::Succeeded { generation, result } => {
                tracing::info!(
                    generation,
                    results = result.file_urls.len(),
                    "generation succeeded"
                );
                if self.mounted {
                    self.gallery.replace(result, &self.api_base, &self.host);
                }
            }
            GenerationEvent::Failed { ticket, error } => {
                tracing::error!(ticket = ticket.0, %error, "generation failed");
                self.notices.push(Notice::error(GENERATION_ERROR));
            }
        }

        if !self.mounted {
            return Vec::new();
        }
        self.history
            .observe(&event, self.source.is_some())
            .map(|ticket| Command::RefreshHistory { ticket })
            .into_iter()
            .collect()
    }

    pub fn player(&self, slot: SlotId) -> Option<&WaveformPlayer> {
        match slot {
            SlotId::Input => Some(&self.input),
            SlotId::Result(i) => self.gallery.slot(i).map(|s| &s.player),
            SlotId::History(i) => self.history.player(i),
        }
    }

    fn player_mut(&mut self, slot: SlotId) -> Option<&mut WaveformPlayer> {
        match slot {
            SlotId::Input => Some(&mut self.input),
            SlotId::Result(i) => self.gallery.player_mut(i),
            SlotId::History(i) => self.history.player_mut(i),
        }
    }

    /// Play from the start, or pause, the player in `slot`.
    pub fn toggle_playback(&mut self, slot: SlotId) -> bool {
        self.player_mut(slot).is_some_and(WaveformPlayer::toggle)
    }

    pub fn engine_ready(&mut self, slot: SlotId, load: LoadId) -> bool {
        self.player_mut(slot).is_some_and(|p| p.engine_ready(load))
    }

    pub fn playback_finished(&mut self, slot: SlotId) -> bool {
        self.player_mut(slot).is_some_and(WaveformPlayer::finished)
    }

    /// Drains `ready`/`finish` callbacks the engines have fired so far.
    pub fn pump_engine_signals(&mut self) -> usize {
        let mut n = 0;
        while let Some(signal) = self.host.try_next() {
            match signal {
                EngineSignal::Ready { slot, load } => {
                    self.engine_ready(slot, load);
                }
                EngineSignal::Finished { slot } => {
                    self.playback_finished(slot);
                }
            }
            n += 1;
        }
        n
    }

    /// Tears down every engine. Later completions only close the generation
    /// gate; they bind nothing and schedule no refresh.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.input.dispose();
        self.gallery.dispose_all();
        self.history.dispose_all();
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn drain_downloads(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.downloads)
    }

    pub fn snapshot(&self) -> ViewState {
        ViewState {
            source_name: self.source.as_ref().map(|s| s.name.clone()),
            input: self.input.state(),
            params: self.params,
            busy: self.request.is_busy(),
            can_generate: self.can_generate(),
            gallery: self
                .gallery
                .slots()
                .map(|s| SlotView {
                    id: s.id.clone(),
                    state: s.player.state(),
                })
                .collect(),
            history: self
                .history
                .entries()
                .iter()
                .enumerate()
                .map(|(i, e)| SlotView {
                    id: Some(e.url.clone()),
                    state: self
                        .history
                        .player(i)
                        .map_or(PlayerState::Uninitialized, WaveformPlayer::state),
                })
                .collect(),
        }
    }
}
