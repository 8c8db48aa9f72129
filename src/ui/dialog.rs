// Native username dialog using NSAlert with a text field accessory

use super::prompt::UsernamePrompt;
use objc2_app_kit::{
    NSAlert, NSAlertFirstButtonReturn, NSAlertStyle, NSApplication, NSTextField, NSView,
};
use objc2_foundation::{MainThreadMarker, NSPoint, NSRect, NSSize, NSString};

/// `cancellable` adds a Cancel button; only the tray variant can back out
pub struct AlertPrompt {
    pub cancellable: bool,
}

fn button_titles(cancellable: bool) -> &'static [&'static str] {
    if cancellable {
        &["Ok", "Cancel"]
    } else {
        &["Ok"]
    }
}

impl UsernamePrompt for AlertPrompt {
    fn ask_username(&self, suggestion: Option<&str>) -> Option<String> {
        // SAFETY: the prompt runs during startup, before the poller thread or
        // the tray event loop exist, so we are on the main thread
        let mtm = unsafe { MainThreadMarker::new_unchecked() };

        unsafe {
            let app = NSApplication::sharedApplication(mtm);
            app.activateIgnoringOtherApps(true);

            let alert = NSAlert::new(mtm);
            alert.setAlertStyle(NSAlertStyle::Informational);
            alert.setMessageText(&NSString::from_str("Enter your Last.fm username"));
            alert.setInformativeText(&NSString::from_str(
                "The authorized session will be stored for this account.",
            ));

            for title in button_titles(self.cancellable) {
                alert.addButtonWithTitle(&NSString::from_str(title));
            }

            let field =
                NSTextField::textFieldWithString(&NSString::from_str(suggestion.unwrap_or("")), mtm);
            field.setFrame(NSRect::new(NSPoint::new(0.0, 0.0), NSSize::new(240.0, 24.0)));
            let accessory: &NSView = &field;
            alert.setAccessoryView(Some(accessory));

            if alert.runModal() != NSAlertFirstButtonReturn {
                log::info!("Username dialog cancelled");
                return None;
            }

            let answer = field.stringValue().to_string();
            let answer = answer.trim();
            if answer.is_empty() {
                None
            } else {
                Some(answer.to_string())
            }
        }
    }
}
