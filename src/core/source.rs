use crate::{
    error::Result,
    types::{AudioSource, MAX_UPLOAD_BYTES},
};
use std::{fs, path::Path, sync::Arc};
use thiserror::Error;

/// One file handed over by a drop or file-picker event, not yet validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DroppedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".into());
        let mime_type = path
            .extension()
            .and_then(|e| e.to_str())
            .map(mime_for_extension)
            .unwrap_or("application/octet-stream");
        Ok(Self::new(name, mime_type, bytes))
    }
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "wav" | "wave" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "aif" | "aiff" => "audio/aiff",
        "m4a" => "audio/mp4",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("no file was dropped")]
    Empty,

    #[error("{count} files dropped, only one is accepted")]
    TooManyFiles { count: usize },

    #[error("`{name}` is {size} bytes, the limit is {limit}")]
    TooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    #[error("`{name}` has type `{mime_type}`, expected audio/*")]
    NotAudio { name: String, mime_type: String },
}

pub fn is_audio_mime(mime_type: &str) -> bool {
    let m = mime_type.trim().to_ascii_lowercase();
    m.strip_prefix("audio/").is_some_and(|sub| !sub.is_empty())
}

/// Validates one drop event and turns its single file into an [`AudioSource`].
pub fn accept_drop(
    mut files: Vec<DroppedFile>,
) -> std::result::Result<AudioSource, UploadRejection> {
    let file = match files.len() {
        0 => return Err(UploadRejection::Empty),
        1 => files.remove(0),
        count => return Err(UploadRejection::TooManyFiles { count }),
    };

    if file.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadRejection::TooLarge {
            name: file.name,
            size: file.bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }

    if !is_audio_mime(&file.mime_type) {
        return Err(UploadRejection::NotAudio {
            name: file.name,
            mime_type: file.mime_type,
        });
    }

    Ok(AudioSource {
        name: file.name,
        bytes: Arc::from(file.bytes),
        mime_type: file.mime_type,
    })
}
