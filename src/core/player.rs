//! Per-slot playback engine lifecycle.
//!
//! A [`WaveformPlayer`] owns at most one [`PlaybackEngine`]. The engine is
//! constructed on the first bind, emptied and reloaded on later binds, and
//! destroyed on release or dispose. Every state change goes through
//! [`PlayerState::next`].

use crate::types::SlotId;
use crossbeam_channel::{Receiver, Sender};
use std::{cell::Cell, fmt, sync::Arc};

/// Correlates an engine's ready signal with the load that caused it.
/// Handed out by [`EngineHost`], so ids are never reused by a later player
/// in the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadId(pub u64);

/// What a slot plays: local bytes from the upload, or a remote stream.
#[derive(Clone)]
pub enum PlayerSource {
    Local { name: String, bytes: Arc<[u8]> },
    Remote(String),
}

impl PartialEq for PlayerSource {
    // Local sources compare by buffer identity: a fresh drop of an identical
    // file is still a new source and reloads the slot.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Local { name: a, bytes: x }, Self::Local { name: b, bytes: y }) => {
                a == b && Arc::ptr_eq(x, y)
            }
            (Self::Remote(a), Self::Remote(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for PlayerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { name, bytes } => f
                .debug_struct("Local")
                .field("name", name)
                .field("len", &bytes.len())
                .finish(),
            Self::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
        }
    }
}

/// The external waveform renderer/player for one slot.
pub trait PlaybackEngine {
    fn load_bytes(&mut self, load: LoadId, name: &str, bytes: Arc<[u8]>);
    fn load_url(&mut self, load: LoadId, url: &str);
    /// Drops loaded content, keeping the engine itself alive.
    fn empty(&mut self);
    /// `progress` is a fraction of the duration, 0.0 being the start.
    fn seek_to(&mut self, progress: f32);
    fn play(&mut self);
    fn pause(&mut self);
    /// Releases every audio resource. No method is called afterwards.
    fn destroy(&mut self);
}

pub trait EngineFactory {
    /// Builds the engine for `slot`; it reports back through `callbacks`.
    fn create(&self, slot: SlotId, callbacks: EngineCallbacks) -> Box<dyn PlaybackEngine>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineSignal {
    Ready { slot: SlotId, load: LoadId },
    Finished { slot: SlotId },
}

/// The `ready`/`finish` callbacks attached to an engine at construction.
#[derive(Clone)]
pub struct EngineCallbacks {
    slot: SlotId,
    tx: Sender<EngineSignal>,
}

impl EngineCallbacks {
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn ready(&self, load: LoadId) {
        let _ = self.tx.send(EngineSignal::Ready {
            slot: self.slot,
            load,
        });
    }

    pub fn finished(&self) {
        let _ = self.tx.send(EngineSignal::Finished { slot: self.slot });
    }
}

/// Builds engines and collects their signals for the owning thread.
pub struct EngineHost {
    factory: Box<dyn EngineFactory>,
    tx: Sender<EngineSignal>,
    rx: Receiver<EngineSignal>,
    loads: Cell<u64>,
}

impl EngineHost {
    pub fn new(factory: Box<dyn EngineFactory>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            factory,
            tx,
            rx,
            loads: Cell::new(0),
        }
    }

    pub(crate) fn next_load(&self) -> LoadId {
        let n = self.loads.get() + 1;
        self.loads.set(n);
        LoadId(n)
    }

    fn create(&self, slot: SlotId) -> Box<dyn PlaybackEngine> {
        self.factory.create(
            slot,
            EngineCallbacks {
                slot,
                tx: self.tx.clone(),
            },
        )
    }

    pub fn try_next(&self) -> Option<EngineSignal> {
        self.rx.try_recv().ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Uninitialized,
    Loading,
    Ready,
    Playing,
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerEvent {
    Bind,
    EngineReady,
    Toggle,
    Finish,
    Release,
    Dispose,
}

impl PlayerState {
    /// The transition table. `None` means the event is ignored in this state.
    pub fn next(self, event: PlayerEvent) -> Option<PlayerState> {
        use PlayerEvent as E;
        use PlayerState as S;
        match (self, event) {
            (S::Disposed, _) => None,
            (_, E::Dispose) => Some(S::Disposed),
            (S::Uninitialized | S::Loading | S::Ready | S::Playing, E::Bind) => Some(S::Loading),
            (S::Loading, E::EngineReady) => Some(S::Ready),
            (S::Ready, E::Toggle) => Some(S::Playing),
            (S::Playing, E::Toggle) => Some(S::Ready),
            (S::Playing, E::Finish) => Some(S::Ready),
            (S::Loading | S::Ready | S::Playing, E::Release) => Some(S::Uninitialized),
            _ => None,
        }
    }

    pub fn is_live(self) -> bool {
        matches!(self, Self::Loading | Self::Ready | Self::Playing)
    }
}

pub struct WaveformPlayer {
    slot: SlotId,
    state: PlayerState,
    engine: Option<Box<dyn PlaybackEngine>>,
    source: Option<PlayerSource>,
    current_load: Option<LoadId>,
}

impl WaveformPlayer {
    pub fn new(slot: SlotId) -> Self {
        Self {
            slot,
            state: PlayerState::Uninitialized,
            engine: None,
            source: None,
            current_load: None,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn source(&self) -> Option<&PlayerSource> {
        self.source.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlayerState::Playing
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    /// Points the slot at `source`. Returns the new load, or `None` when the
    /// source is unchanged or the player is disposed.
    pub fn bind(&mut self, source: PlayerSource, host: &EngineHost) -> Option<LoadId> {
        if self.state.is_live() && self.source.as_ref() == Some(&source) {
            return None;
        }
        let next = self.state.next(PlayerEvent::Bind)?;

        let was_playing = self.state == PlayerState::Playing;
        let engine: &mut Box<dyn PlaybackEngine> = match self.engine {
            Some(ref mut engine) => {
                if was_playing {
                    engine.pause();
                }
                engine.empty();
                engine
            }
            None => {
                tracing::debug!(slot = %self.slot, "constructing playback engine");
                self.engine.insert(host.create(self.slot))
            }
        };

        let load = host.next_load();
        match &source {
            PlayerSource::Local { name, bytes } => {
                engine.load_bytes(load, name, Arc::clone(bytes))
            }
            PlayerSource::Remote(url) => engine.load_url(load, url),
        }

        tracing::debug!(slot = %self.slot, ?source, load = load.0, "binding player");
        self.state = next;
        self.source = Some(source);
        self.current_load = Some(load);
        Some(load)
    }

    /// Applies an engine `ready` signal. Signals from superseded loads are ignored.
    pub fn engine_ready(&mut self, load: LoadId) -> bool {
        if self.current_load != Some(load) {
            return false;
        }
        self.apply(PlayerEvent::EngineReady)
    }

    /// Restart-from-the-top play, or pause when already playing.
    pub fn toggle(&mut self) -> bool {
        let Some(next) = self.state.next(PlayerEvent::Toggle) else {
            return false;
        };
        if let Some(engine) = self.engine.as_mut() {
            if next == PlayerState::Playing {
                engine.seek_to(0.0);
                engine.play();
            } else {
                engine.pause();
            }
        }
        self.state = next;
        true
    }

    pub fn finished(&mut self) -> bool {
        let Some(next) = self.state.next(PlayerEvent::Finish) else {
            return false;
        };
        if let Some(engine) = self.engine.as_mut() {
            engine.seek_to(0.0);
        }
        self.state = next;
        true
    }

    /// Tears the engine down; the slot can be bound again later.
    pub fn release(&mut self) -> bool {
        let Some(next) = self.state.next(PlayerEvent::Release) else {
            return false;
        };
        self.teardown();
        self.state = next;
        true
    }

    /// Terminal teardown for an unmounted view.
    pub fn dispose(&mut self) {
        if let Some(next) = self.state.next(PlayerEvent::Dispose) {
            self.teardown();
            self.state = next;
        }
    }

    fn apply(&mut self, event: PlayerEvent) -> bool {
        match self.state.next(event) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }

    fn teardown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            tracing::debug!(slot = %self.slot, "destroying playback engine");
            engine.destroy();
        }
        self.source = None;
        self.current_load = None;
    }
}

impl Drop for WaveformPlayer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for WaveformPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveformPlayer")
            .field("slot", &self.slot)
            .field("state", &self.state)
            .field("source", &self.source)
            .field("has_engine", &self.engine.is_some())
            .finish()
    }
}
