//! Mirror the track a Last.fm user is listening to into Discord Rich Presence.
//!
//! The binary authorizes against Last.fm once, keeps the session in a small
//! credential file, then polls the user's now playing track and pushes it to
//! the local Discord client. With the `tray` feature the poller runs in the
//! background behind a tray icon that can pause the mirroring.

pub mod cli;
pub mod config;
pub mod control;
pub mod credentials;
pub mod logging;
pub mod monitor;
pub mod presence;
pub mod process;
pub mod scrobbler;
pub mod text_cleanup;
pub mod ui;
