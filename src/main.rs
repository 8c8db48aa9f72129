use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use scrobble_presence::cli::Cli;
use scrobble_presence::config::Config;
use scrobble_presence::credentials::{AuthorizeError, Credential, CredentialStore, SystemBrowser};
use scrobble_presence::monitor::PresenceMonitor;
use scrobble_presence::presence::{DiscordPresence, Publisher};
use scrobble_presence::process::SystemProcesses;
use scrobble_presence::scrobbler::LastFm;
use scrobble_presence::text_cleanup::TextCleaner;
use scrobble_presence::{logging, ui};

#[cfg(feature = "tray")]
type Monitor = PresenceMonitor<
    scrobble_presence::scrobbler::LastFmUser,
    DiscordPresence,
    SystemProcesses,
>;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    cli.ensure_tray_available()?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    let mut lastfm = LastFm::new(&config.lastfm.api_key, &config.lastfm.api_secret);
    let credential = obtain_credential(&cli, &config, &lastfm)?;
    lastfm.authenticate_with_session_key(&credential.session_key);

    let discord =
        DiscordPresence::connect(&config.discord).context("Failed to connect to Discord")?;
    let publisher = Publisher::new(discord, &config.discord, TextCleaner::new(&config.cleanup));

    let monitor = PresenceMonitor::new(
        lastfm.user(&credential.username),
        publisher,
        SystemProcesses::new(),
        config.player_process.clone(),
        Duration::from_secs(config.refresh_interval),
    );

    #[cfg(feature = "tray")]
    if cli.tray {
        return run_with_tray(monitor);
    }

    let mut monitor = monitor;
    monitor.run();
    Ok(())
}

/// Load the stored session, or run the first-time web authorization
fn obtain_credential(cli: &Cli, config: &Config, lastfm: &LastFm) -> Result<Credential> {
    let store = CredentialStore::new(config.session_file_path()?);

    if store.exists() {
        return match store.load() {
            Ok(credential) => {
                log::info!("Found session for {}", credential.username);
                Ok(credential)
            }
            Err(e) => {
                eprintln!("Error reading session file: {}", e);
                std::process::exit(1);
            }
        };
    }

    log::info!("No session at {:?}, starting Last.fm authorization", store.path());
    let prompt = ui::username_prompt(cli.username.clone(), cli.tray);
    let poll_interval = Duration::from_secs(config.auth_poll_interval);

    match store.authorize(lastfm, &SystemBrowser, prompt.as_ref(), poll_interval) {
        Ok(credential) => Ok(credential),
        Err(AuthorizeError::Cancelled) if cli.tray => {
            log::info!("Authorization cancelled");
            std::process::exit(0);
        }
        Err(e) => Err(e).context("Last.fm authorization failed"),
    }
}

#[cfg(feature = "tray")]
fn run_with_tray(monitor: Monitor) -> Result<()> {
    use scrobble_presence::control::{status_channel, PauseSwitch};

    let pause = PauseSwitch::new();
    let (status_tx, status_rx) = status_channel();
    let mut monitor = monitor.with_pause(pause.clone()).with_status(status_tx);

    // Never joined; the process exits from the tray's Quit item
    std::thread::Builder::new()
        .name("poller".to_string())
        .spawn(move || monitor.run())
        .context("Failed to start the poller thread")?;

    ui::tray::run(pause, status_rx)?;

    log::info!("Exiting");
    std::process::exit(0);
}
