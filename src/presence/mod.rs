// Presence publishing
// Turns a track into a rich presence payload and hands it to the chat client

pub mod discord;

use crate::config::DiscordConfig;
use crate::scrobbler::Track;
use crate::text_cleanup::TextCleaner;
use chrono::Utc;
use thiserror::Error;

pub use discord::DiscordPresence;

/// What the chat client displays for the current track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresencePayload {
    /// Track name
    pub state: String,
    /// Track artist
    pub details: String,
    pub large_image: String,
    pub large_text: Option<String>,
    /// Epoch seconds
    pub start: i64,
    /// Epoch seconds, only when the duration is known
    pub end: Option<i64>,
}

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("failed to start the presence runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to reach Discord: {0}")]
    Connect(#[source] discord_sdk::Error),

    #[error("Discord handshake failed: {0}")]
    Handshake(String),

    #[error("Discord handshake timed out")]
    HandshakeTimeout,

    #[error("Discord rejected the activity: {0}")]
    Ipc(#[source] discord_sdk::Error),
}

/// Local rich presence client
pub trait PresenceClient {
    fn update(&mut self, payload: &PresencePayload) -> Result<(), PresenceError>;
    fn clear(&mut self) -> Result<(), PresenceError>;
}

/// Maps tracks to payloads and forwards them to a presence client
pub struct Publisher<C> {
    client: C,
    large_image: String,
    large_text: Option<String>,
    cleaner: TextCleaner,
}

impl<C: PresenceClient> Publisher<C> {
    pub fn new(client: C, config: &DiscordConfig, cleaner: TextCleaner) -> Self {
        Self {
            client,
            large_image: config.large_image.clone(),
            large_text: config.large_text.clone(),
            cleaner,
        }
    }

    /// Payload for `track` starting at `now` (epoch seconds)
    pub fn payload_for(&self, track: &Track, now: i64) -> PresencePayload {
        PresencePayload {
            state: self.cleaner.clean(&track.name).into_owned(),
            details: self.cleaner.clean(&track.artist).into_owned(),
            large_image: self.large_image.clone(),
            large_text: self.large_text.clone(),
            start: now,
            end: track.duration_secs().map(|secs| now + secs),
        }
    }

    pub fn update(&mut self, track: &Track) -> Result<PresencePayload, PresenceError> {
        let payload = self.payload_for(track, Utc::now().timestamp());
        self.client.update(&payload)?;
        Ok(payload)
    }

    pub fn clear(&mut self) -> Result<(), PresenceError> {
        self.client.clear()
    }
}
