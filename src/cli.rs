// Command line arguments

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "scrobble-presence", version, about)]
pub struct Cli {
    /// Path to the configuration file (defaults to the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Poll in the background and show a tray icon to pause/resume
    #[arg(long)]
    pub tray: bool,

    /// Username stored after the first authorization, instead of asking for it
    #[arg(long, env = "SCROBBLE_PRESENCE_USERNAME")]
    pub username: Option<String>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// `--tray` needs the `tray` feature; checked before any authorization
    pub fn ensure_tray_available(&self) -> anyhow::Result<()> {
        if self.tray && !cfg!(feature = "tray") {
            anyhow::bail!("this build has no tray support, rebuild with `--features tray`");
        }
        Ok(())
    }
}
