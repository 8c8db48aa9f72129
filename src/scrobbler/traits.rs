// Common types and traits at the scrobbling service boundary

use super::lastfm::LastFmError;
use std::fmt;

/// A track reported by the scrobbling service
#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub artist: String,
    /// Duration in milliseconds, when the service knows it
    pub duration: Option<u64>,
}

impl Track {
    pub fn new(name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: Option<u64>) -> Self {
        self.duration = duration_ms;
        self
    }

    /// Duration in whole seconds
    pub fn duration_secs(&self) -> Option<i64> {
        self.duration.map(|ms| (ms / 1000) as i64)
    }
}

// Identity is (name, artist), compared case-insensitively like Last.fm does.
// Duration never takes part.
impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.name.to_lowercase() == other.name.to_lowercase()
            && self.artist.to_lowercase() == other.artist.to_lowercase()
    }
}

impl Eq for Track {}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.name)
    }
}

/// Source of the "now playing" track for one user
pub trait NowPlayingSource {
    /// Track currently playing, `None` when nothing is
    fn now_playing(&self) -> Result<Option<Track>, LastFmError>;

    /// Look up the duration (ms) of a track
    fn duration(&self, track: &Track) -> Result<Option<u64>, LastFmError>;
}

/// Authorization page the user has to visit, and the token it grants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAuthRequest {
    pub url: String,
    pub token: String,
}

/// Session obtained once the user has authorized the token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Account name the session belongs to
    pub name: String,
    pub key: String,
}

/// Web authorization handshake
pub trait WebAuth {
    fn web_auth_request(&self) -> Result<WebAuthRequest, LastFmError>;

    /// Fails with a pending-authorization error until the user approves the token
    fn session_from_token(&self, request: &WebAuthRequest) -> Result<Session, LastFmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_duration_and_case() {
        let a = Track::new("Song", "Artist").with_duration(Some(180_000));
        let b = Track::new("song", "ARTIST").with_duration(None);
        assert_eq!(a, b);
    }

    #[test]
    fn name_or_artist_change_is_a_different_track() {
        let a = Track::new("Song", "Artist");
        assert_ne!(a, Track::new("Other", "Artist"));
        assert_ne!(a, Track::new("Song", "Someone Else"));
    }

    #[test]
    fn duration_is_truncated_to_seconds() {
        let track = Track::new("Song", "Artist").with_duration(Some(215_999));
        assert_eq!(track.duration_secs(), Some(215));
        assert_eq!(track.to_string(), "Artist - Song");
    }
}
