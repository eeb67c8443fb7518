use crate::{
    core::player::{EngineCallbacks, EngineFactory, LoadId, PlaybackEngine},
    types::SlotId,
};
use std::sync::Arc;

/// Engine for front ends without a renderer: it tracks what is loaded, logs
/// transport calls and reports ready as soon as a source is handed over.
pub struct HeadlessEngine {
    callbacks: EngineCallbacks,
    loaded: Option<String>,
}

impl PlaybackEngine for HeadlessEngine {
    fn load_bytes(&mut self, load: LoadId, name: &str, bytes: Arc<[u8]>) {
        tracing::debug!(slot = %self.callbacks.slot(), name, bytes = bytes.len(), "load local");
        self.loaded = Some(name.to_string());
        self.callbacks.ready(load);
    }

    fn load_url(&mut self, load: LoadId, url: &str) {
        tracing::debug!(slot = %self.callbacks.slot(), url, "load remote");
        self.loaded = Some(url.to_string());
        self.callbacks.ready(load);
    }

    fn empty(&mut self) {
        self.loaded = None;
    }

    fn seek_to(&mut self, progress: f32) {
        tracing::trace!(slot = %self.callbacks.slot(), progress, "seek");
    }

    fn play(&mut self) {
        tracing::debug!(slot = %self.callbacks.slot(), loaded = ?self.loaded, "play");
    }

    fn pause(&mut self) {
        tracing::debug!(slot = %self.callbacks.slot(), "pause");
    }

    fn destroy(&mut self) {
        self.loaded = None;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessEngineFactory;

impl EngineFactory for HeadlessEngineFactory {
    fn create(&self, _slot: SlotId, callbacks: EngineCallbacks) -> Box<dyn PlaybackEngine> {
        Box::new(HeadlessEngine {
            callbacks,
            loaded: None,
        })
    }
}
