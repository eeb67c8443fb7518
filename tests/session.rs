mod common;

use std::{cell::RefCell, fs, path::Path, rc::Rc, sync::Arc};

use httpmock::prelude::*;
use serde_json::json;
use tempfile::tempdir;

use autosampler_client::{
    ApiClient, ClientConfig, DroppedFile, GenerateRejected, GenerationParameters, Notice,
    NoticeLevel, PlayerState, Session, SlotId,
};
use common::{ids, kick_wav, recording_factory, EngineLog};

fn session_for(server: &MockServer, download_dir: &Path) -> (Session, Rc<RefCell<EngineLog>>) {
    let cfg = ClientConfig::default()
        .with_base_url(server.base_url())
        .with_download_dir(download_dir);
    let api = ApiClient::new(&cfg).unwrap();
    let (factory, log) = recording_factory();
    (Session::new(&cfg, Arc::new(api), factory), log)
}

fn drop_kick(session: &mut Session) {
    let kick = DroppedFile::new("kick.wav", "audio/wav", kick_wav(1_100_000));
    session.orchestrator_mut().drop_files(vec![kick]).unwrap();
}

#[test]
fn kick_scenario_fills_gallery_and_refreshes_history() {
    let tmp = tempdir().unwrap();
    let server = MockServer::start();

    let generate = server.mock(|when, then| {
        when.method(POST)
            .path("/api/generate")
            .header_exists("content-type");
        then.status(200)
            .json_body(json!({ "file_urls": ["a.wav", "b.wav", "c.wav", "d.wav"] }));
    });
    let history = server.mock(|when, then| {
        when.method(GET).path("/api/get_all_audio");
        then.status(200)
            .json_body(json!({ "file_urls": ["a.wav", "b.wav", "c.wav", "d.wav"] }));
    });

    let (mut session, log) = session_for(&server, tmp.path());
    drop_kick(&mut session);
    assert_eq!(session.orchestrator().source().unwrap().name, "kick.wav");

    let orch = session.orchestrator_mut();
    orch.set_pitch_shift(0.3);
    orch.set_variation(0.7);
    assert_eq!(orch.params(), GenerationParameters::new(0.3, 0.7));

    session.generate().unwrap();
    assert!(session.orchestrator().is_busy());
    session.run_until_idle().unwrap();

    generate.assert_hits(1);
    history.assert_hits(1);

    let view = session.orchestrator().snapshot();
    let gallery: Vec<_> = view.gallery.iter().map(|s| s.id.clone().unwrap()).collect();
    assert_eq!(gallery, ids(&["a.wav", "b.wav", "c.wav", "d.wav"]));
    assert!(view.gallery.iter().all(|s| s.state == PlayerState::Ready));
    assert_eq!(view.history.len(), 4);
    assert!(!view.busy);
    assert!(view.can_generate);
    assert!(session.orchestrator_mut().drain_notices().is_empty());

    let log = log.borrow();
    let result0 = format!("{}/api/get_audio/a.wav", server.base_url());
    assert!(log.loads.contains(&(SlotId::Result(0), result0)));
    assert!(log.loads.contains(&(SlotId::Input, "kick.wav".to_string())));
    assert_eq!(log.max_live_per_slot, 1);
}

#[test]
fn server_error_keeps_gallery_and_skips_history() {
    let tmp = tempdir().unwrap();
    let server = MockServer::start();

    let generate = server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(500).body("boom");
    });
    let history = server.mock(|when, then| {
        when.method(GET).path("/api/get_all_audio");
        then.status(200).json_body(json!({ "file_urls": [] }));
    });

    let (mut session, _log) = session_for(&server, tmp.path());
    drop_kick(&mut session);
    session.generate().unwrap();
    session.run_until_idle().unwrap();

    generate.assert_hits(1);
    history.assert_hits(0);

    let orch = session.orchestrator_mut();
    assert_eq!(orch.generation(), 0);
    assert_eq!(orch.gallery().filled(), 0);
    let notices = orch.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(orch.can_generate(), "gate reopens after failure");
}

#[test]
fn oversized_upload_is_rejected_before_any_request() {
    let tmp = tempdir().unwrap();
    let server = MockServer::start();
    let generate = server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200).json_body(json!({ "file_urls": [] }));
    });

    let (mut session, log) = session_for(&server, tmp.path());
    let big = DroppedFile::new("big.wav", "audio/wav", kick_wav(3_000_000));
    assert!(session.orchestrator_mut().drop_files(vec![big]).is_err());

    let orch = session.orchestrator_mut();
    assert!(orch.source().is_none());
    assert_eq!(
        orch.drain_notices(),
        vec![Notice::warn(autosampler_client::types::UPLOAD_WARNING)]
    );
    assert_eq!(session.generate().unwrap_err(), GenerateRejected::NoSource);
    assert_eq!(session.pending(), 0);
    generate.assert_hits(0);
    assert_eq!(log.borrow().created, 0);
}

#[test]
fn generate_is_single_flight() {
    let tmp = tempdir().unwrap();
    let server = MockServer::start();

    let generate = server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200)
            .delay(std::time::Duration::from_millis(200))
            .json_body(json!({ "file_urls": ["a.wav", "b.wav"] }));
    });
    let _history = server.mock(|when, then| {
        when.method(GET).path("/api/get_all_audio");
        then.status(200).json_body(json!({ "file_urls": ["a.wav", "b.wav"] }));
    });

    let (mut session, _log) = session_for(&server, tmp.path());
    drop_kick(&mut session);

    session.generate().unwrap();
    assert_eq!(session.generate().unwrap_err(), GenerateRejected::InFlight);
    assert_eq!(session.generate().unwrap_err(), GenerateRejected::InFlight);
    session.run_until_idle().unwrap();

    generate.assert_hits(1);
    let view = session.orchestrator().snapshot();
    let got: Vec<_> = view.gallery.iter().map(|s| s.id.as_deref()).collect();
    assert_eq!(got, [Some("a.wav"), Some("b.wav"), None, None]);
    assert_eq!(session.orchestrator().generation(), 1);
}

#[test]
fn history_grows_across_generations_and_survives_fetch_failure() {
    let tmp = tempdir().unwrap();
    let server = MockServer::start();

    let _generate = server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200)
            .json_body(json!({ "file_urls": ["a.wav", "b.wav", "c.wav", "d.wav"] }));
    });
    let mut history = server.mock(|when, then| {
        when.method(GET).path("/api/get_all_audio");
        then.status(200)
            .json_body(json!({ "file_urls": ["a.wav", "b.wav", "c.wav", "d.wav"] }));
    });

    let (mut session, log) = session_for(&server, tmp.path());
    drop_kick(&mut session);

    session.generate().unwrap();
    session.run_until_idle().unwrap();
    let first = session.orchestrator().history().len();
    assert_eq!(first, 4);

    history.delete();
    history = server.mock(|when, then| {
        when.method(GET).path("/api/get_all_audio");
        then.status(200).json_body(json!({
            "file_urls": ["a.wav", "b.wav", "c.wav", "d.wav", "e.wav", "f.wav", "g.wav", "h.wav"]
        }));
    });

    session.generate().unwrap();
    session.run_until_idle().unwrap();
    let second = session.orchestrator().history().len();
    assert!(second >= first);
    assert_eq!(second, 8);
    history.assert_hits(1);

    history.delete();
    let _broken = server.mock(|when, then| {
        when.method(GET).path("/api/get_all_audio");
        then.status(503);
    });

    session.generate().unwrap();
    session.run_until_idle().unwrap();
    assert_eq!(session.orchestrator().history().len(), 8, "last good list kept");
    assert!(session.orchestrator_mut().drain_notices().is_empty());
    assert_eq!(log.borrow().max_live_per_slot, 1);
}

#[test]
fn downloads_run_through_the_session() {
    let tmp = tempdir().unwrap();
    let server = MockServer::start();

    let _a = server.mock(|when, then| {
        when.method(GET).path("/api/get_audio/a.wav");
        then.status(200).body("RIFF-a");
    });
    let _b = server.mock(|when, then| {
        when.method(GET).path("/api/get_audio/b.wav");
        then.status(404);
    });

    let (mut session, _log) = session_for(&server, tmp.path());
    session.download("a.wav");
    session.download("b.wav");
    session.run_until_idle().unwrap();

    let saved = session.orchestrator_mut().drain_downloads();
    assert_eq!(saved, vec![tmp.path().join("a.wav")]);
    assert_eq!(fs::read(tmp.path().join("a.wav")).unwrap(), b"RIFF-a");
    assert!(!tmp.path().join("b.wav").exists());
    assert!(
        session.orchestrator_mut().drain_notices().is_empty(),
        "download failures are not user-facing"
    );
}

#[test]
fn unmount_releases_every_engine() {
    let tmp = tempdir().unwrap();
    let server = MockServer::start();

    let _generate = server.mock(|when, then| {
        when.method(POST).path("/api/generate");
        then.status(200).json_body(json!({ "file_urls": ["a.wav", "b.wav"] }));
    });
    let _history = server.mock(|when, then| {
        when.method(GET).path("/api/get_all_audio");
        then.status(200).json_body(json!({ "file_urls": ["a.wav", "b.wav"] }));
    });

    let (mut session, log) = session_for(&server, tmp.path());
    drop_kick(&mut session);
    session.generate().unwrap();
    session.run_until_idle().unwrap();

    session.orchestrator_mut().unmount();
    let log = log.borrow();
    assert_eq!(log.created, log.destroyed);
    assert_eq!(log.live_in(SlotId::Input), 0);
    assert_eq!(log.live_in(SlotId::History(1)), 0);
}
