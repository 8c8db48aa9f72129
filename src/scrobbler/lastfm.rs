// Last.fm client
// Blocking REST calls against the 2.0 API, JSON format

use super::traits::{NowPlayingSource, Track};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

const API_ROOT: &str = "https://ws.audioscrobbler.com/2.0/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// "This token has not been authorized"
pub const ERROR_TOKEN_NOT_AUTHORIZED: u32 = 14;

#[derive(Debug, Error)]
pub enum LastFmError {
    #[error("Last.fm request failed: {0}")]
    Http(#[from] attohttpc::Error),

    #[error("Last.fm error {code}: {message}")]
    Api { code: u32, message: String },

    #[error("Last.fm answered with HTTP {0}")]
    Status(u16),

    #[error("unexpected Last.fm response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl LastFmError {
    /// The user has not approved the web authorization token yet
    pub fn is_pending_authorization(&self) -> bool {
        matches!(self, Self::Api { code, .. } if *code == ERROR_TOKEN_NOT_AUTHORIZED)
    }

    /// Failures that usually go away on their own: network trouble, 5xx,
    /// "operation failed", "service offline", "temporarily unavailable", rate limiting
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Status(status) => *status >= 500,
            Self::Api { code, .. } => matches!(code, 8 | 11 | 16 | 29),
            Self::Parse(_) => false,
        }
    }
}

/// Last.fm API client
#[derive(Debug, Clone)]
pub struct LastFm {
    api_key: String,
    api_secret: String,
    session_key: Option<String>,
}

impl LastFm {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            session_key: None,
        }
    }

    /// Attach a session key; subsequent calls are signed with it
    pub fn authenticate_with_session_key(&mut self, session_key: &str) {
        self.session_key = Some(session_key.to_string());
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Handle on one user's profile
    pub fn user(self, username: impl Into<String>) -> LastFmUser {
        LastFmUser {
            client: self,
            username: username.into(),
        }
    }

    /// Call an API method. `signed` calls carry the session key (when one is
    /// set) and an `api_sig`.
    pub(crate) fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
        signed: bool,
    ) -> Result<T, LastFmError> {
        let signature: String;
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 5);
        query.push(("method", method));
        query.push(("api_key", self.api_key.as_str()));
        query.extend_from_slice(params);

        if signed {
            if let Some(sk) = &self.session_key {
                query.push(("sk", sk.as_str()));
            }
            signature = sign(&query, &self.api_secret);
            query.push(("api_sig", signature.as_str()));
        }
        query.push(("format", "json"));

        log::debug!("Last.fm call: {}", method);

        let response = attohttpc::get(API_ROOT)
            .params(&query)
            .timeout(REQUEST_TIMEOUT)
            .send()?;

        let status = response.status();
        let body = response.text()?;

        // Last.fm reports API errors in the body, often alongside a 4xx status
        match parse_response(&body) {
            Err(LastFmError::Parse(_)) if !status.is_success() => {
                Err(LastFmError::Status(status.as_u16()))
            }
            other => other,
        }
    }
}

/// Compute `api_sig`: md5 over the sorted name/value pairs followed by the secret.
/// `format` and `callback` are excluded.
pub fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut signed: Vec<&(&str, &str)> = params
        .iter()
        .filter(|(name, _)| *name != "format" && *name != "callback")
        .collect();
    signed.sort_by(|a, b| a.0.cmp(b.0));

    let mut raw = String::new();
    for (name, value) in signed {
        raw.push_str(name);
        raw.push_str(value);
    }
    raw.push_str(secret);

    format!("{:x}", md5::compute(raw))
}

/// Decode a response body, turning `{"error": .., "message": ..}` into `LastFmError::Api`
pub(crate) fn parse_response<T: DeserializeOwned>(body: &str) -> Result<T, LastFmError> {
    let value: Value = serde_json::from_str(body)?;

    if let Some(code) = value.get("error").and_then(Value::as_u64) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(LastFmError::Api {
            code: code as u32,
            message,
        });
    }

    Ok(serde_json::from_value(value)?)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecentTracksResponse {
    recenttracks: RecentTracks,
}

#[derive(Debug, Deserialize)]
struct RecentTracks {
    #[serde(default)]
    track: OneOrMany<RecentTrack>,
}

#[derive(Debug, Deserialize)]
struct RecentTrack {
    name: String,
    artist: TextNode,
    #[serde(rename = "@attr", default)]
    attr: Option<RecentTrackAttr>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "#text")]
    text: String,
}

#[derive(Debug, Deserialize)]
struct RecentTrackAttr {
    #[serde(default)]
    nowplaying: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackInfoResponse {
    track: TrackInfo,
}

#[derive(Debug, Deserialize)]
struct TrackInfo {
    #[serde(default)]
    duration: Option<Value>,
}

/// Pick the track flagged as now playing out of a `user.getRecentTracks` body
fn now_playing_from(response: RecentTracksResponse) -> Option<Track> {
    response
        .recenttracks
        .track
        .into_vec()
        .into_iter()
        .find(|t| {
            t.attr
                .as_ref()
                .and_then(|a| a.nowplaying.as_deref())
                .is_some_and(|flag| flag == "true")
        })
        .map(|t| Track::new(t.name, t.artist.text))
}

/// Milliseconds from a `track.getInfo` body. 0 means unknown.
fn duration_from(response: TrackInfoResponse) -> Option<u64> {
    let ms = match response.track.duration? {
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        Value::Number(n) => n.as_u64()?,
        _ => return None,
    };
    (ms > 0).then_some(ms)
}

/// One user's profile, the equivalent of looking a user up on the network
#[derive(Debug, Clone)]
pub struct LastFmUser {
    client: LastFm,
    username: String,
}

impl LastFmUser {
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl NowPlayingSource for LastFmUser {
    fn now_playing(&self) -> Result<Option<Track>, LastFmError> {
        let response: RecentTracksResponse = self.client.call(
            "user.getRecentTracks",
            &[("user", self.username.as_str()), ("limit", "1")],
            true,
        )?;
        Ok(now_playing_from(response))
    }

    fn duration(&self, track: &Track) -> Result<Option<u64>, LastFmError> {
        let response: TrackInfoResponse = self.client.call(
            "track.getInfo",
            &[("artist", track.artist.as_str()), ("track", track.name.as_str())],
            false,
        )?;
        Ok(duration_from(response))
    }
}
