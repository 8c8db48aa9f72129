// Now playing monitor
// Polls Last.fm and mirrors the current track to the presence client

use crate::control::{PauseSwitch, StatusSender, StatusUpdate};
use crate::presence::{PresenceClient, PresenceError, Publisher};
use crate::process::ProcessProbe;
use crate::scrobbler::{LastFmError, NowPlayingSource, Track};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// What a single poll did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Mirroring is paused; presence was cleared
    Paused,
    /// A new track was pushed to the presence client
    Published(Track),
    /// Same track as last time, nothing to do
    Unchanged,
    /// Nothing reported but the player is still running; presence left as is
    SuspectedPause,
    /// Nothing playing; presence was cleared
    Cleared,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Scrobbler(#[from] LastFmError),

    #[error(transparent)]
    Presence(#[from] PresenceError),
}

pub struct PresenceMonitor<S, C, P> {
    source: S,
    publisher: Publisher<C>,
    probe: P,
    player_process: Option<String>,
    pause: Option<PauseSwitch>,
    status: Option<StatusSender>,
    last_seen: Option<Track>,
    paused_reported: bool,
    interval: Duration,
}

impl<S, C, P> PresenceMonitor<S, C, P>
where
    S: NowPlayingSource,
    C: PresenceClient,
    P: ProcessProbe,
{
    pub fn new(
        source: S,
        publisher: Publisher<C>,
        probe: P,
        player_process: Option<String>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            publisher,
            probe,
            player_process,
            pause: None,
            status: None,
            last_seen: None,
            paused_reported: false,
            interval,
        }
    }

    /// Let a tray pause the mirroring
    pub fn with_pause(mut self, pause: PauseSwitch) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Report track changes to a tray
    pub fn with_status(mut self, status: StatusSender) -> Self {
        self.status = Some(status);
        self
    }

    pub fn last_seen(&self) -> Option<&Track> {
        self.last_seen.as_ref()
    }

    /// One iteration, checked in priority order: paused, new track,
    /// player still running, stopped.
    ///
    /// `last_seen` only moves after a successful publish. A stop does not
    /// reset it, so the same track coming back is not republished.
    pub fn poll(&mut self) -> Result<PollOutcome, MonitorError> {
        if self.pause.as_ref().is_some_and(PauseSwitch::is_paused) {
            self.publisher.clear()?;
            if !self.paused_reported {
                self.notify(StatusUpdate::Stopped);
                self.paused_reported = true;
            }
            return Ok(PollOutcome::Paused);
        }
        self.paused_reported = false;

        match self.source.now_playing()? {
            Some(track) if self.last_seen.as_ref() != Some(&track) => {
                // A missing duration only drops the end timestamp
                let duration = self.source.duration(&track).unwrap_or_else(|e| {
                    log::warn!("No duration for {}: {}", track, e);
                    None
                });
                let track = track.with_duration(duration);

                self.publisher.update(&track)?;
                log::info!("Now playing: {}", track);

                self.notify(StatusUpdate::NowPlaying(track.name.clone()));
                self.last_seen = Some(track.clone());
                Ok(PollOutcome::Published(track))
            }
            Some(_) => Ok(PollOutcome::Unchanged),
            // Leaves the presence untouched, the clear below does not run either
            None if self.last_seen.is_some() && self.player_running() => {
                log::info!("song paused ?");
                Ok(PollOutcome::SuspectedPause)
            }
            None => {
                self.publisher.clear()?;
                self.notify(StatusUpdate::Stopped);
                Ok(PollOutcome::Cleared)
            }
        }
    }

    /// Poll once, logging instead of returning errors
    pub fn tick(&mut self) -> Option<PollOutcome> {
        match self.poll() {
            Ok(outcome) => {
                log::debug!("Poll: {:?}", outcome);
                Some(outcome)
            }
            Err(MonitorError::Scrobbler(e)) if e.is_transient() => {
                log::warn!("Error: {}", e);
                None
            }
            Err(MonitorError::Scrobbler(e)) => {
                log::error!("Error: {}", e);
                None
            }
            Err(MonitorError::Presence(e)) => {
                log::error!("Error: {}", e);
                None
            }
        }
    }

    /// Poll forever
    pub fn run(&mut self) {
        self.run_until(|| false);
    }

    /// Poll until `stop` says so, sleeping the fixed interval after every
    /// iteration whatever its outcome
    pub fn run_until(&mut self, mut stop: impl FnMut() -> bool) {
        log::info!("Polling every {:?}", self.interval);
        while !stop() {
            self.tick();
            thread::sleep(self.interval);
        }
    }

    fn player_running(&mut self) -> bool {
        match self.player_process.as_deref() {
            Some(name) => self.probe.is_running(name),
            None => false,
        }
    }

    fn notify(&self, update: StatusUpdate) {
        if let Some(status) = &self.status {
            // The tray may be gone already
            let _ = status.send(update);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscordConfig;
    use crate::control::status_channel;
    use crate::presence::testing::{Call, RecordingClient};
    use crate::text_cleanup::TextCleaner;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Plays back a script of now playing answers
    #[derive(Clone, Default)]
    struct ScriptedSource {
        answers: Rc<RefCell<VecDeque<Result<Option<Track>, LastFmError>>>>,
        duration: Option<u64>,
        duration_fails: bool,
        duration_lookups: Rc<Cell<u32>>,
    }

    impl ScriptedSource {
        fn then(self, answer: Option<Track>) -> Self {
            self.answers.borrow_mut().push_back(Ok(answer));
            self
        }

        fn then_fail(self) -> Self {
            self.answers.borrow_mut().push_back(Err(LastFmError::Status(503)));
            self
        }
    }

    impl NowPlayingSource for ScriptedSource {
        fn now_playing(&self) -> Result<Option<Track>, LastFmError> {
            self.answers.borrow_mut().pop_front().unwrap_or(Ok(None))
        }

        fn duration(&self, _track: &Track) -> Result<Option<u64>, LastFmError> {
            self.duration_lookups.set(self.duration_lookups.get() + 1);
            if self.duration_fails {
                return Err(LastFmError::Api {
                    code: 6,
                    message: "Track not found".to_string(),
                });
            }
            Ok(self.duration)
        }
    }

    struct FakeProbe {
        running: bool,
        asked: Rc<RefCell<Vec<String>>>,
    }

    impl ProcessProbe for FakeProbe {
        fn is_running(&mut self, executable: &str) -> bool {
            self.asked.borrow_mut().push(executable.to_string());
            self.running
        }
    }

    struct Harness {
        monitor: PresenceMonitor<ScriptedSource, RecordingClient, FakeProbe>,
        client: RecordingClient,
        probe_asked: Rc<RefCell<Vec<String>>>,
    }

    fn harness(source: ScriptedSource, player_running: bool) -> Harness {
        timed_harness(source, player_running, Duration::ZERO)
    }

    fn timed_harness(source: ScriptedSource, player_running: bool, interval: Duration) -> Harness {
        let client = RecordingClient::default();
        let probe_asked = Rc::new(RefCell::new(Vec::new()));
        let probe = FakeProbe {
            running: player_running,
            asked: probe_asked.clone(),
        };
        let publisher = Publisher::new(
            client.clone(),
            &DiscordConfig::default(),
            TextCleaner::default(),
        );
        let monitor = PresenceMonitor::new(
            source,
            publisher,
            probe,
            Some("TIDAL.exe".to_string()),
            interval,
        );
        Harness {
            monitor,
            client,
            probe_asked,
        }
    }

    fn song_a() -> Track {
        Track::new("Digital Love", "Daft Punk")
    }

    fn song_b() -> Track {
        Track::new("Playground Love", "Air")
    }

    #[test]
    fn new_track_is_published_once() {
        let source = ScriptedSource {
            duration: Some(301_000),
            ..Default::default()
        }
        .then(Some(song_a()))
        .then(Some(song_a()));
        let lookups = source.duration_lookups.clone();
        let mut h = harness(source, false);

        let first = h.monitor.poll().unwrap();
        assert_eq!(first, PollOutcome::Published(song_a()));
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Unchanged);

        let updates = h.client.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].state, "Digital Love");
        assert_eq!(updates[0].details, "Daft Punk");
        assert_eq!(updates[0].end, Some(updates[0].start + 301));
        assert_eq!(h.client.clears(), 0);
        assert_eq!(lookups.get(), 1);
        assert_eq!(h.monitor.last_seen().and_then(|t| t.duration), Some(301_000));
    }

    #[test]
    fn duration_change_alone_is_not_a_new_track() {
        let source = ScriptedSource::default()
            .then(Some(song_a().with_duration(Some(1_000))))
            .then(Some(song_a().with_duration(Some(999_000))));
        let mut h = harness(source, false);

        h.monitor.poll().unwrap();
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Unchanged);
        assert_eq!(h.client.updates().len(), 1);
    }

    #[test]
    fn switching_tracks_publishes_the_new_one() {
        let source = ScriptedSource::default()
            .then(Some(song_a()))
            .then(Some(song_b()));
        let mut h = harness(source, false);

        h.monitor.poll().unwrap();
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Published(song_b()));

        let updates = h.client.updates();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].state, "Playground Love");
        assert_eq!(updates[1].details, "Air");
        assert_eq!(h.monitor.last_seen(), Some(&song_b()));
    }

    #[test]
    fn stop_without_player_clears_once() {
        let source = ScriptedSource::default().then(Some(song_a())).then(None);
        let mut h = harness(source, false);

        h.monitor.poll().unwrap();
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Cleared);

        assert_eq!(h.client.updates().len(), 1);
        assert_eq!(h.client.clears(), 1);
        assert_eq!(*h.probe_asked.borrow(), vec!["TIDAL.exe".to_string()]);
    }

    #[test]
    fn stop_with_player_running_neither_updates_nor_clears() {
        let source = ScriptedSource::default().then(Some(song_a())).then(None);
        let mut h = harness(source, true);

        h.monitor.poll().unwrap();
        let calls_before = h.client.calls.borrow().len();

        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::SuspectedPause);
        assert_eq!(h.client.calls.borrow().len(), calls_before);
        assert_eq!(h.monitor.last_seen(), Some(&song_a()));
    }

    #[test]
    fn nothing_ever_played_clears_without_probing() {
        let mut h = harness(ScriptedSource::default().then(None), true);

        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Cleared);
        assert_eq!(h.client.clears(), 1);
        assert!(h.probe_asked.borrow().is_empty());
    }

    #[test]
    fn no_player_configured_means_stop_clears() {
        let source = ScriptedSource::default().then(Some(song_a())).then(None);
        let mut h = harness(source, true);
        h.monitor.player_process = None;

        h.monitor.poll().unwrap();
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Cleared);
        assert!(h.probe_asked.borrow().is_empty());
    }

    #[test]
    fn paused_clears_and_never_updates() {
        let source = ScriptedSource::default()
            .then(Some(song_a()))
            .then(Some(song_b()));
        let answers = source.answers.clone();
        let pause = PauseSwitch::new();
        pause.set_paused(true);
        let mut h = harness(source, true);
        h.monitor = h.monitor.with_pause(pause.clone());

        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Paused);
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Paused);

        assert!(h.client.updates().is_empty());
        assert_eq!(h.client.clears(), 2);
        // Last.fm is not even asked while paused
        assert_eq!(answers.borrow().len(), 2);

        pause.set_paused(false);
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Published(song_a()));
    }

    #[test]
    fn status_channel_follows_track_and_stop() {
        let source = ScriptedSource::default().then(Some(song_a())).then(None);
        let (tx, rx) = status_channel();
        let mut h = harness(source, false);
        h.monitor = h.monitor.with_status(tx);

        h.monitor.poll().unwrap();
        h.monitor.poll().unwrap();

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                StatusUpdate::NowPlaying("Digital Love".to_string()),
                StatusUpdate::Stopped
            ]
        );
    }

    #[test]
    fn failed_publish_keeps_last_seen() {
        let source = ScriptedSource::default()
            .then(Some(song_a()))
            .then(Some(song_a()));
        let mut h = harness(source, false);
        *h.client.failing.borrow_mut() = true;

        assert!(matches!(h.monitor.poll(), Err(MonitorError::Presence(_))));
        assert_eq!(h.monitor.last_seen(), None);

        *h.client.failing.borrow_mut() = false;
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Published(song_a()));
    }

    #[test]
    fn errors_do_not_stop_the_loop() {
        let source = ScriptedSource::default()
            .then_fail()
            .then(Some(song_a()));
        let mut h = harness(source, false);

        let mut iterations = 0;
        h.monitor.run_until(|| {
            iterations += 1;
            iterations > 2
        });

        assert_eq!(h.client.updates().len(), 1);
        assert_eq!(h.monitor.last_seen(), Some(&song_a()));
        assert_eq!(
            *h.client.calls.borrow(),
            vec![Call::Update(h.client.updates()[0].clone())]
        );
    }

    #[test]
    fn failed_duration_lookup_still_publishes() {
        let obscure = Track::new("Obscure Demo", "Unknown Band");
        let source = ScriptedSource {
            duration_fails: true,
            ..Default::default()
        }
        .then(Some(obscure.clone()))
        .then(Some(obscure.clone()));
        let lookups = source.duration_lookups.clone();
        let mut h = harness(source, false);

        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Published(obscure.clone()));
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Unchanged);

        let updates = h.client.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].state, "Obscure Demo");
        assert_eq!(updates[0].end, None);
        assert_eq!(h.monitor.last_seen(), Some(&obscure));
        assert_eq!(lookups.get(), 1);
    }

    #[test]
    fn loop_waits_the_interval_after_an_error() {
        let interval = Duration::from_millis(20);
        let source = ScriptedSource::default()
            .then_fail()
            .then(Some(song_a()));
        let mut h = timed_harness(source, false, interval);

        let started = std::time::Instant::now();
        let mut iterations = 0;
        h.monitor.run_until(|| {
            iterations += 1;
            iterations > 2
        });

        assert!(started.elapsed() >= interval * 2);
        assert_eq!(h.client.updates().len(), 1);
        assert_eq!(h.monitor.last_seen(), Some(&song_a()));
    }

    #[test]
    fn pausing_reports_stopped_once() {
        let source = ScriptedSource::default().then(Some(song_a()));
        let (tx, rx) = status_channel();
        let pause = PauseSwitch::new();
        let mut h = harness(source, false);
        h.monitor = h.monitor.with_pause(pause.clone()).with_status(tx);

        h.monitor.poll().unwrap();
        pause.set_paused(true);
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Paused);
        assert_eq!(h.monitor.poll().unwrap(), PollOutcome::Paused);

        assert_eq!(
            rx.try_iter().collect::<Vec<_>>(),
            vec![
                StatusUpdate::NowPlaying("Digital Love".to_string()),
                StatusUpdate::Stopped
            ]
        );
    }
}
