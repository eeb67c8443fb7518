#![allow(dead_code)]

use std::{cell::RefCell, collections::HashMap, io::Cursor, rc::Rc, sync::Arc};

use autosampler_client::{EngineCallbacks, EngineFactory, LoadId, PlaybackEngine, SlotId};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Everything the recording engines saw, shared across slots.
#[derive(Default, Debug)]
pub struct EngineLog {
    pub live: HashMap<SlotId, usize>,
    pub max_live_per_slot: usize,
    pub created: usize,
    pub destroyed: usize,
    pub loads: Vec<(SlotId, String)>,
}

impl EngineLog {
    pub fn live_in(&self, slot: SlotId) -> usize {
        self.live.get(&slot).copied().unwrap_or(0)
    }
}

struct RecordingEngine {
    slot: SlotId,
    callbacks: EngineCallbacks,
    log: Rc<RefCell<EngineLog>>,
}

impl PlaybackEngine for RecordingEngine {
    fn load_bytes(&mut self, load: LoadId, name: &str, _bytes: Arc<[u8]>) {
        self.log.borrow_mut().loads.push((self.slot, name.to_string()));
        self.callbacks.ready(load);
    }

    fn load_url(&mut self, load: LoadId, url: &str) {
        self.log.borrow_mut().loads.push((self.slot, url.to_string()));
        self.callbacks.ready(load);
    }

    fn empty(&mut self) {}
    fn seek_to(&mut self, _progress: f32) {}
    fn play(&mut self) {}
    fn pause(&mut self) {}

    fn destroy(&mut self) {
        let mut log = self.log.borrow_mut();
        log.destroyed += 1;
        if let Some(n) = log.live.get_mut(&self.slot) {
            *n -= 1;
        }
    }
}

pub struct RecordingFactory(pub Rc<RefCell<EngineLog>>);

impl EngineFactory for RecordingFactory {
    fn create(&self, slot: SlotId, callbacks: EngineCallbacks) -> Box<dyn PlaybackEngine> {
        let mut log = self.0.borrow_mut();
        log.created += 1;
        let n = {
            let n = log.live.entry(slot).or_default();
            *n += 1;
            *n
        };
        log.max_live_per_slot = log.max_live_per_slot.max(n);
        Box::new(RecordingEngine {
            slot,
            callbacks,
            log: Rc::clone(&self.0),
        })
    }
}

pub fn recording_factory() -> (Box<dyn EngineFactory>, Rc<RefCell<EngineLog>>) {
    let log = Rc::new(RefCell::new(EngineLog::default()));
    (Box::new(RecordingFactory(Rc::clone(&log))), log)
}

/// A mono 16-bit WAV of decaying seeded noise, close to `target_len` bytes.
pub fn kick_wav(target_len: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let frames = target_len.saturating_sub(44) / 2;
    let mut rng = StdRng::seed_from_u64(42);

    let mut cursor = Cursor::new(Vec::with_capacity(target_len));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..frames {
            let env = (-(i as f32) / 4_000.0).exp();
            let s = rng.gen_range(-1.0f32..1.0) * env;
            writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}
