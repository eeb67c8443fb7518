use crate::{
    core::{
        player::{EngineHost, PlayerSource, WaveformPlayer},
        request::GenerationEvent,
    },
    error::ClientError,
    io::net::audio_url,
    types::{HistoryEntry, SlotId},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(pub u64);

/// Every sample the server has generated, refreshed wholesale.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    players: Vec<WaveformPlayer>,
    issued: u64,
    applied: u64,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn player(&self, index: usize) -> Option<&WaveformPlayer> {
        self.players.get(index)
    }

    pub fn player_mut(&mut self, index: usize) -> Option<&mut WaveformPlayer> {
        self.players.get_mut(index)
    }

    /// Reacts to a finished generation: a success while a source is present
    /// schedules a refresh.
    pub fn observe(
        &mut self,
        event: &GenerationEvent,
        source_present: bool,
    ) -> Option<RefreshTicket> {
        match event {
            GenerationEvent::Succeeded { generation, .. } if source_present => {
                self.issued += 1;
                tracing::debug!(generation, ticket = self.issued, "scheduling history refresh");
                Some(RefreshTicket(self.issued))
            }
            _ => None,
        }
    }

    /// Replaces the list with the server's. A response older than one
    /// already applied is dropped. Returns whether it was applied.
    pub fn apply_refresh(
        &mut self,
        ticket: RefreshTicket,
        urls: Vec<String>,
        api_base: &str,
        host: &EngineHost,
    ) -> bool {
        if ticket.0 <= self.applied {
            tracing::debug!(
                ticket = ticket.0,
                applied = self.applied,
                "dropping stale history refresh"
            );
            return false;
        }
        self.applied = ticket.0;

        self.entries = urls.into_iter().map(|url| HistoryEntry { url }).collect();

        // Views for vanished entries are unmounted.
        for mut gone in self.players.drain(self.entries.len().min(self.players.len())..) {
            gone.dispose();
        }
        while self.players.len() < self.entries.len() {
            let i = self.players.len();
            self.players.push(WaveformPlayer::new(SlotId::History(i)));
        }

        for (entry, player) in self.entries.iter().zip(self.players.iter_mut()) {
            if entry.url.is_empty() {
                player.release();
            } else {
                player.bind(PlayerSource::Remote(audio_url(api_base, &entry.url)), host);
            }
        }

        tracing::info!(entries = self.entries.len(), "history refreshed");
        true
    }

    /// Keeps the last good list.
    pub fn refresh_failed(&mut self, ticket: RefreshTicket, error: &ClientError) {
        tracing::error!(
            ticket = ticket.0,
            %error,
            "history refresh failed, keeping {} entries",
            self.entries.len()
        );
    }

    pub fn dispose_all(&mut self) {
        for player in &mut self.players {
            player.dispose();
        }
    }
}
