use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// Largest upload the client will send, in bytes (2 MiB).
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Number of result positions in the gallery.
pub const GALLERY_SLOTS: usize = 4;

pub const UPLOAD_WARNING: &str =
    "Audio upload failed! Make sure to upload only audio files no more than 2MB.";

pub const GENERATION_ERROR: &str = "Sample generation failed! File cannot be read.";

/// The single input sample selected by the user.
///
/// Never mutated after creation; a new drop replaces it wholesale.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioSource {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub mime_type: String,
}

impl AudioSource {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub pitch_shift: f32,
    pub variation: f32,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            pitch_shift: 0.0,
            variation: 0.0,
        }
    }
}

impl GenerationParameters {
    pub fn new(pitch_shift: f32, variation: f32) -> Self {
        let mut p = Self::default();
        p.set_pitch_shift(pitch_shift);
        p.set_variation(variation);
        p
    }

    /// Clamps into [0, 1]. NaN leaves the current value in place.
    pub fn set_pitch_shift(&mut self, value: f32) {
        self.pitch_shift = clamp_unit(value, self.pitch_shift);
    }

    pub fn set_variation(&mut self, value: f32) {
        self.variation = clamp_unit(value, self.variation);
    }
}

fn clamp_unit(value: f32, current: f32) -> f32 {
    if value.is_nan() {
        current
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Identifiers produced by one successful generation, in server order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationResult {
    pub file_urls: Vec<String>,
}

impl GenerationResult {
    /// Keeps at most [`GALLERY_SLOTS`] identifiers; the rest have nowhere to go.
    pub fn from_urls(mut file_urls: Vec<String>) -> Self {
        if file_urls.len() > GALLERY_SLOTS {
            tracing::debug!(
                returned = file_urls.len(),
                "server returned more results than gallery slots"
            );
            file_urls.truncate(GALLERY_SLOTS);
        }
        Self { file_urls }
    }
}

/// Body of both `/api/generate` and `/api/get_all_audio`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileUrlsResponse {
    pub file_urls: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub url: String,
}

/// A fixed UI position owning at most one playback engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotId {
    Input,
    Result(usize),
    History(usize),
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotId::Input => write!(f, "input"),
            SlotId::Result(i) => write!(f, "result[{i}]"),
            SlotId::History(i) => write!(f, "history[{i}]"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Warn,
    Error,
}

/// A user-facing message, the headless equivalent of a toast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}
