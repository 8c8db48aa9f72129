//! Discord Rich Presence client using discord-sdk
//!
//! The SDK is async; the poller is not. The client owns a one-worker tokio
//! runtime that keeps the IPC connection serviced between calls, and each
//! call blocks on it.
//!
//! The connection is made exactly once. If the Discord client goes away
//! later, updates fail and the poller logs them; nothing reconnects.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use discord_sdk::{
    activity::{ActivityBuilder, Assets},
    wheel::{UserState, Wheel},
    Discord, Subscriptions,
};
use tokio::runtime::{self, Runtime};

use super::{PresenceClient, PresenceError, PresencePayload};
use crate::config::DiscordConfig;

pub struct DiscordPresence {
    runtime: Runtime,
    discord: Discord,
    _wheel: Wheel,
}

impl DiscordPresence {
    /// Connect to the local Discord client and wait for the handshake
    pub fn connect(config: &DiscordConfig) -> Result<Self, PresenceError> {
        let runtime = runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("discord-ipc")
            .enable_all()
            .build()
            .map_err(PresenceError::Runtime)?;

        let app_id = config.app_id;
        let handshake_timeout = Duration::from_secs(config.handshake_timeout);

        let (discord, wheel) = runtime.block_on(async move {
            let (wheel, handler) = Wheel::new(Box::new(|err| {
                log::warn!("Discord error: {:?}", err);
            }));

            let mut user_spoke = wheel.user();

            let discord = Discord::new(app_id, Subscriptions::ACTIVITY, Box::new(handler))
                .map_err(PresenceError::Connect)?;

            log::info!("Discord connecting...");

            let user = tokio::time::timeout(handshake_timeout, async {
                if user_spoke.0.changed().await.is_err() {
                    return Err(PresenceError::Handshake(
                        "Discord connection closed".to_string(),
                    ));
                }
                match &*user_spoke.0.borrow() {
                    UserState::Connected(user) => Ok(user.clone()),
                    UserState::Disconnected(err) => {
                        Err(PresenceError::Handshake(format!("{:?}", err)))
                    }
                }
            })
            .await
            .map_err(|_| PresenceError::HandshakeTimeout)??;

            log::info!("Discord Rich Presence connected as {}", user.username);

            Ok::<_, PresenceError>((discord, wheel))
        })?;

        Ok(Self {
            runtime,
            discord,
            _wheel: wheel,
        })
    }
}

fn to_system_time(epoch_secs: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(epoch_secs.max(0) as u64)
}

impl PresenceClient for DiscordPresence {
    fn update(&mut self, payload: &PresencePayload) -> Result<(), PresenceError> {
        let mut activity = ActivityBuilder::new()
            .state(payload.state.as_str())
            .details(payload.details.as_str())
            .assets(Assets::default().large(payload.large_image.as_str(), payload.large_text.as_deref()))
            .start_timestamp(to_system_time(payload.start));
        if let Some(end) = payload.end {
            activity = activity.end_timestamp(to_system_time(end));
        }

        self.runtime
            .block_on(self.discord.update_activity(activity))
            .map_err(PresenceError::Ipc)?;
        log::debug!("Discord activity updated");
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PresenceError> {
        self.runtime
            .block_on(self.discord.clear_activity())
            .map_err(PresenceError::Ipc)?;
        log::debug!("Discord activity cleared");
        Ok(())
    }
}
