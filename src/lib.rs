//! # autosampler-client
//!
//! Client core for a sample-variation service: accepts one uploaded audio
//! sample, requests AI-generated variations, and keeps the result gallery,
//! the server-side history and every per-slot playback engine consistent.

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

pub use crate::{
    config::ClientConfig,
    core::{
        gallery::ResultGallery,
        headless::{HeadlessEngine, HeadlessEngineFactory},
        history::{History, RefreshTicket},
        orchestrator::{Command, Completion, Orchestrator, SlotView, ViewState},
        player::{
            EngineCallbacks, EngineFactory, EngineHost, EngineSignal, LoadId, PlaybackEngine,
            PlayerEvent, PlayerSource, PlayerState, WaveformPlayer,
        },
        request::{GenerateRejected, GenerationEvent, GenerationRequest, GenerationTicket},
        session::Session,
        source::{accept_drop, DroppedFile, UploadRejection},
    },
    error::{ClientError, Result},
    io::{
        net::{ApiClient, SampleApi},
        progress::{clear_download_progress_callback, set_download_progress_callback},
    },
    types::{
        AudioSource, GenerationParameters, GenerationResult, HistoryEntry, Notice, NoticeLevel,
        SlotId, GALLERY_SLOTS, MAX_UPLOAD_BYTES,
    },
};
