// User-facing pieces: username prompt and the optional tray

#[cfg(target_os = "macos")]
pub mod dialog;
pub mod prompt;
#[cfg(feature = "tray")]
pub mod tray;

use prompt::{FixedUsername, UsernamePrompt};

/// Pick how the username is obtained: a preset value wins, then the
/// native dialog where there is one, then the terminal. Only a
/// `cancellable` dialog offers a Cancel button.
pub fn username_prompt(preset: Option<String>, cancellable: bool) -> Box<dyn UsernamePrompt> {
    if let Some(name) = preset.filter(|name| !name.trim().is_empty()) {
        return Box::new(FixedUsername(name));
    }

    #[cfg(target_os = "macos")]
    {
        Box::new(dialog::AlertPrompt { cancellable })
    }

    #[cfg(not(target_os = "macos"))]
    {
        let _ = cancellable;
        Box::new(prompt::ConsolePrompt)
    }
}
