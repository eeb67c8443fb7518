use crate::{
    error::ClientError,
    types::{AudioSource, GenerationResult},
};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GenerateRejected {
    #[error("no audio source selected")]
    NoSource,

    #[error("a generation request is already in flight")]
    InFlight,

    #[error("the view has been unmounted")]
    Unmounted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationTicket(pub u64);

/// Emitted once per finished request; observers react to it.
#[derive(Debug)]
pub enum GenerationEvent {
    Succeeded {
        generation: u64,
        result: GenerationResult,
    },
    Failed {
        ticket: GenerationTicket,
        error: ClientError,
    },
}

/// Single-flight gate around `/api/generate`.
#[derive(Debug, Default)]
pub struct GenerationRequest {
    in_flight: Option<GenerationTicket>,
    issued: u64,
    succeeded: u64,
}

impl GenerationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Number of successful generations so far.
    pub fn generation(&self) -> u64 {
        self.succeeded
    }

    pub fn begin(
        &mut self,
        source: Option<&AudioSource>,
    ) -> Result<GenerationTicket, GenerateRejected> {
        if source.is_none() {
            return Err(GenerateRejected::NoSource);
        }
        if self.in_flight.is_some() {
            return Err(GenerateRejected::InFlight);
        }
        self.issued += 1;
        let ticket = GenerationTicket(self.issued);
        self.in_flight = Some(ticket);
        Ok(ticket)
    }

    /// Closes the gate. Returns `None` for a ticket that is not in flight.
    pub fn complete(
        &mut self,
        ticket: GenerationTicket,
        outcome: Result<Vec<String>, ClientError>,
    ) -> Option<GenerationEvent> {
        if self.in_flight != Some(ticket) {
            tracing::warn!(ticket = ticket.0, "completion for a request that is not in flight");
            return None;
        }
        self.in_flight = None;

        Some(match outcome {
            Ok(urls) => {
                self.succeeded += 1;
                GenerationEvent::Succeeded {
                    generation: self.succeeded,
                    result: GenerationResult::from_urls(urls),
                }
            }
            Err(error) => GenerationEvent::Failed { ticket, error },
        })
    }
}
