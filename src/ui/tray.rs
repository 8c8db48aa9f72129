// System tray implementation

use crate::control::{PauseSwitch, StatusReceiver, StatusUpdate};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tray_icon::{
    menu::{Menu, MenuEvent, MenuItem, PredefinedMenuItem},
    Icon, TrayIcon, TrayIconBuilder,
};
use winit::{
    application::ApplicationHandler,
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::WindowId,
};

/// How often the event loop wakes up to drain menu events and status updates
const TICK: Duration = Duration::from_millis(200);
const ICON_SIZE: u32 = 32;

/// Result of handling pending menu events
#[derive(Debug, PartialEq, Eq)]
pub enum TrayAction {
    Nothing,
    Toggled { paused: bool },
    Quit,
}

/// Text of the read-only title item
pub fn title_text(update: &StatusUpdate) -> String {
    match update {
        StatusUpdate::NowPlaying(name) => name.clone(),
        StatusUpdate::Stopped => "Nothing playing".to_string(),
    }
}

/// Label of the toggle item for the given pause state
pub fn toggle_text(paused: bool) -> &'static str {
    if paused {
        "Resume"
    } else {
        "Pause"
    }
}

/// Round accent-coloured icon, so no image asset has to ship with the binary
fn build_icon() -> Result<Icon> {
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 1.0;
    let mut rgba = Vec::with_capacity((ICON_SIZE * ICON_SIZE * 4) as usize);

    for y in 0..ICON_SIZE {
        for x in 0..ICON_SIZE {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let inside = (dx * dx + dy * dy).sqrt() <= radius;
            let alpha = if inside { 0xff } else { 0x00 };
            rgba.extend_from_slice(&[0xd5, 0x10, 0x07, alpha]);
        }
    }

    Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE).context("Failed to build tray icon image")
}

/// System tray manager
pub struct TrayManager {
    _tray_icon: TrayIcon,
    pause: PauseSwitch,
    title_item: MenuItem,
    toggle_item: MenuItem,
    quit_item: MenuItem,
}

impl TrayManager {
    /// Create a new tray manager
    pub fn new(pause: PauseSwitch) -> Result<Self> {
        let title_item = MenuItem::new("Nothing playing", false, None);
        let toggle_item = MenuItem::new(toggle_text(pause.is_paused()), true, None);
        let separator = PredefinedMenuItem::separator();
        let quit_item = MenuItem::new("Quit", true, None);

        let menu = Menu::new();
        menu.append(&title_item)
            .context("Failed to add title item")?;
        menu.append(&toggle_item)
            .context("Failed to add pause item")?;
        menu.append(&separator)
            .context("Failed to add separator")?;
        menu.append(&quit_item)
            .context("Failed to add quit item")?;

        let tray_icon = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip("Scrobble Presence")
            .with_icon(build_icon()?)
            .build()
            .context("Failed to create tray icon")?;

        Ok(Self {
            _tray_icon: tray_icon,
            pause,
            title_item,
            toggle_item,
            quit_item,
        })
    }

    /// Mirror a poller status update in the title item
    pub fn apply_status(&self, update: &StatusUpdate) {
        self.title_item.set_text(title_text(update));
    }

    /// Drain pending menu events
    pub fn handle_events(&self) -> TrayAction {
        let mut action = TrayAction::Nothing;

        while let Ok(event) = MenuEvent::receiver().try_recv() {
            if event.id == self.quit_item.id() {
                log::info!("Quit menu item clicked");
                return TrayAction::Quit;
            }
            if event.id == self.toggle_item.id() {
                let paused = self.pause.toggle();
                self.toggle_item.set_text(toggle_text(paused));
                log::info!("Presence {}", if paused { "paused" } else { "resumed" });
                action = TrayAction::Toggled { paused };
            }
        }

        action
    }
}

struct TrayApp {
    pause: PauseSwitch,
    status: StatusReceiver,
    tray: Option<TrayManager>,
    error: Option<anyhow::Error>,
}

impl ApplicationHandler for TrayApp {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        // The tray has to be created once the event loop is running
        if cause == StartCause::Init {
            match TrayManager::new(self.pause.clone()) {
                Ok(tray) => self.tray = Some(tray),
                Err(e) => {
                    self.error = Some(e);
                    event_loop.exit();
                }
            }
        }
    }

    fn resumed(&mut self, _event_loop: &ActiveEventLoop) {}

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, _event: WindowEvent) {}

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        #[cfg(target_os = "linux")]
        while gtk::events_pending() {
            gtk::main_iteration_do(false);
        }

        if let Some(tray) = &self.tray {
            for update in self.status.try_iter() {
                tray.apply_status(&update);
            }

            if tray.handle_events() == TrayAction::Quit {
                event_loop.exit();
                return;
            }
        }

        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + TICK));
    }
}

/// Run the tray on the calling (main) thread until Quit is chosen
pub fn run(pause: PauseSwitch, status: StatusReceiver) -> Result<()> {
    // The appindicator backend needs GTK on this thread
    #[cfg(target_os = "linux")]
    gtk::init().context("Failed to initialize GTK")?;

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = TrayApp {
        pause,
        status,
        tray: None,
        error: None,
    };

    event_loop
        .run_app(&mut app)
        .context("Tray event loop failed")?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
