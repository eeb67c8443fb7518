use directories::UserDirs;
use std::path::PathBuf;

/// The user's download folder, or the working directory when there is none.
pub fn default_download_dir() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.download_dir().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// File name a downloaded sample is saved under.
///
/// Identifiers are opaque, so only their last path component is used.
pub fn download_file_name(id: &str) -> String {
    id.rsplit(['/', '\\'])
        .find(|part| !part.is_empty() && *part != "." && *part != "..")
        .map(str::to_string)
        .unwrap_or_else(|| "sample.wav".into())
}
