// Logging setup: env_logger, RUST_LOG wins over the built-in default

use env_logger::{Env, WriteStyle};

/// Default filter when RUST_LOG is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

pub fn init(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter(verbose)));

    // env_logger writes to stderr; no colours when that is piped or a file
    if !atty::is(atty::Stream::Stderr) {
        builder.write_style(WriteStyle::Never);
    }

    builder.init();
}
