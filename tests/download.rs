use std::{
    fs,
    sync::{Arc, Mutex},
};

use httpmock::prelude::*;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use tempfile::tempdir;

use autosampler_client::{set_download_progress_callback, ApiClient, ClientConfig, SampleApi};

fn make_fake_sample_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    let mut rng = StdRng::seed_from_u64(7);
    rng.fill_bytes(&mut data);
    data
}

#[test]
fn downloads_sample_into_dir_and_reports_progress() {
    let tmp = tempdir().unwrap();
    let bytes = make_fake_sample_bytes(300 * 1024);

    let server = MockServer::start();
    let audio = server.mock(|when, then| {
        when.method(GET).path("/api/get_audio/a.wav");
        then.status(200)
            .header("Content-Type", "audio/wav")
            .header("Content-Length", bytes.len().to_string().as_str())
            .body(bytes.clone());
    });

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    set_download_progress_callback(move |done, total| {
        sink.lock().unwrap().push((done, total));
    });

    let cfg = ClientConfig::default().with_base_url(server.base_url());
    let client = ApiClient::new(&cfg).unwrap();
    let path = client.download_audio("a.wav", tmp.path()).expect("download failed");

    assert_eq!(path, tmp.path().join("a.wav"));
    assert_eq!(fs::read(&path).unwrap(), bytes);
    assert!(!tmp.path().join("a.wav.part").exists());
    audio.assert_hits(1);

    let n = bytes.len() as u64;
    assert!(seen.lock().unwrap().contains(&(n, n)), "final progress reported");
}

#[test]
fn failed_download_leaves_no_files_behind() {
    let tmp = tempdir().unwrap();

    let server = MockServer::start();
    let _missing = server.mock(|when, then| {
        when.method(GET).path("/api/get_audio/gone.wav");
        then.status(404);
    });

    let cfg = ClientConfig::default().with_base_url(server.base_url());
    let client = ApiClient::new(&cfg).unwrap();
    let err = client.download_audio("gone.wav", tmp.path()).unwrap_err();
    assert!(err.to_string().contains("404"), "got: {err}");

    assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn identifiers_cannot_escape_the_download_dir() {
    let tmp = tempdir().unwrap();
    let dest = tmp.path().join("out");

    let server = MockServer::start();
    let _audio = server.mock(|when, then| {
        when.method(GET).path_contains("evil.wav");
        then.status(200).body("RIFF");
    });

    let cfg = ClientConfig::default().with_base_url(server.base_url());
    let client = ApiClient::new(&cfg).unwrap();
    let path = client.download_audio("nested/evil.wav", &dest).unwrap();
    assert_eq!(path, dest.join("evil.wav"));
}
