// Scrobbling service module
// Last.fm client used to read the user's now playing track

pub mod lastfm;
pub mod lastfm_auth;
pub mod traits;

pub use lastfm::{LastFm, LastFmError, LastFmUser};
pub use traits::{NowPlayingSource, Session, Track, WebAuth, WebAuthRequest};
