use crate::{
    core::player::{EngineHost, PlayerSource, WaveformPlayer},
    io::net::audio_url,
    types::{GenerationResult, SlotId, GALLERY_SLOTS},
};

#[derive(Debug)]
pub struct ResultSlot {
    pub id: Option<String>,
    pub player: WaveformPlayer,
}

/// The four result positions of the most recent generation.
#[derive(Debug)]
pub struct ResultGallery {
    slots: [ResultSlot; GALLERY_SLOTS],
}

impl Default for ResultGallery {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultGallery {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|i| ResultSlot {
                id: None,
                player: WaveformPlayer::new(SlotId::Result(i)),
            }),
        }
    }

    /// Replaces every slot with `result`, in server order. Slots past the end
    /// of `result` are emptied and their engines released.
    pub fn replace(&mut self, result: &GenerationResult, api_base: &str, host: &EngineHost) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            match result.file_urls.get(i).filter(|id| !id.is_empty()) {
                Some(id) => {
                    slot.id = Some(id.clone());
                    slot.player
                        .bind(PlayerSource::Remote(audio_url(api_base, id)), host);
                }
                None => {
                    slot.id = None;
                    slot.player.release();
                }
            }
        }
        tracing::debug!(filled = self.filled(), "gallery replaced");
    }

    pub fn filled(&self) -> usize {
        self.slots.iter().filter(|s| s.id.is_some()).count()
    }

    pub fn ids(&self) -> Vec<Option<String>> {
        self.slots.iter().map(|s| s.id.clone()).collect()
    }

    pub fn slot(&self, index: usize) -> Option<&ResultSlot> {
        self.slots.get(index)
    }

    pub fn player_mut(&mut self, index: usize) -> Option<&mut WaveformPlayer> {
        self.slots.get_mut(index).map(|s| &mut s.player)
    }

    pub fn slots(&self) -> impl Iterator<Item = &ResultSlot> {
        self.slots.iter()
    }

    pub fn dispose_all(&mut self) {
        for slot in &mut self.slots {
            slot.player.dispose();
        }
    }
}
