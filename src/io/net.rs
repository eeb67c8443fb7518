use crate::{
    config::ClientConfig,
    error::Result,
    io::{paths::download_file_name, progress::emit_download_progress},
    types::{AudioSource, FileUrlsResponse, GenerationParameters},
};
use reqwest::blocking::{multipart, Client};
use std::{
    fs,
    fs::File,
    io::{Read, Write},
    path::{Path, PathBuf},
};

pub fn http_client(cfg: &ClientConfig) -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.request_timeout())
        .build()?;
    Ok(client)
}

/// URL the playback engine streams a generated sample from.
pub fn audio_url(base: &str, id: &str) -> String {
    format!("{}/api/get_audio/{}", base.trim_end_matches('/'), id)
}

/// The remote inference service.
pub trait SampleApi: Send + Sync {
    /// POST `/api/generate`; returns the generated identifiers in server order.
    fn generate(&self, source: &AudioSource, params: &GenerationParameters) -> Result<Vec<String>>;

    /// GET `/api/get_all_audio`; the full server-side history.
    fn list_all_audio(&self) -> Result<Vec<String>>;

    /// GET `/api/get_audio/{id}` into `dest_dir`, returning the saved path.
    fn download_audio(&self, id: &str, dest_dir: &Path) -> Result<PathBuf>;

    fn audio_url(&self, id: &str) -> String;
}

pub struct ApiClient {
    client: Client,
    base: String,
}

impl ApiClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: http_client(cfg)?,
            base: cfg.api_base().to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl SampleApi for ApiClient {
    fn generate(&self, source: &AudioSource, params: &GenerationParameters) -> Result<Vec<String>> {
        let file = multipart::Part::bytes(source.bytes.to_vec())
            .file_name(source.name.clone())
            .mime_str(&source.mime_type)?;
        let form = multipart::Form::new()
            .part("file", file)
            .text("pitch_shift", format!("{:.2}", params.pitch_shift))
            .text("variation", format!("{:.2}", params.variation));

        // A failure status is an error before the body is ever parsed.
        let body: FileUrlsResponse = self
            .client
            .post(self.endpoint("/api/generate"))
            .multipart(form)
            .send()?
            .error_for_status()?
            .json()?;

        tracing::info!(source = %source.name, count = body.file_urls.len(), "generated samples");
        Ok(body.file_urls)
    }

    fn list_all_audio(&self) -> Result<Vec<String>> {
        let body: FileUrlsResponse = self
            .client
            .get(self.endpoint("/api/get_all_audio"))
            .send()?
            .error_for_status()?
            .json()?;
        Ok(body.file_urls)
    }

    fn download_audio(&self, id: &str, dest_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dest_dir)?;
        let dest = dest_dir.join(download_file_name(id));
        download_with_progress(&self.client, &self.audio_url(id), &dest)?;
        Ok(dest)
    }

    fn audio_url(&self, id: &str) -> String {
        audio_url(&self.base, id)
    }
}

pub fn download_with_progress(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let tmp = part_path(dest);

    let result = stream_to(client, url, &tmp);
    if result.is_err() {
        fs::remove_file(&tmp).ok();
    }
    let (downloaded, total) = result?;

    if dest.exists() {
        fs::remove_file(dest).ok();
    }

    fs::rename(&tmp, dest)?;

    emit_download_progress(total.max(downloaded), total.max(downloaded));

    Ok(())
}

fn stream_to(client: &Client, url: &str, tmp: &Path) -> Result<(u64, u64)> {
    let mut resp = client.get(url).send()?.error_for_status()?;

    let total = resp.content_length().unwrap_or(0);

    emit_download_progress(0, total);

    let mut file = File::create(tmp)?;
    let mut downloaded: u64 = 0;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = resp.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        downloaded += n as u64;
        emit_download_progress(downloaded, total);
    }
    file.flush()?;

    Ok((downloaded, total))
}

// `a.wav` -> `a.wav.part`, so the extension of the final file is never lost.
fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
