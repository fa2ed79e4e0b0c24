//! Async driver
//!
//! Runs a [`MediaSession`] on a tokio runtime: backend events and host
//! commands arrive over channels, timers are driven by a fixed poll
//! interval, and queued [`PlayerEvent`]s are forwarded to the host.
//!
//! Sessions are single threaded, so the returned future is not `Send`.
//! Await it directly or run it on a `LocalSet`.

use crate::controller::MediaEvent;
use crate::error::Result;
use crate::events::PlayerEvent;
use crate::media_session::MediaSession;
use couch_core::{ItemId, MediaBackend};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default spacing between timer polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Host request handled by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionCommand {
    Play,
    Pause,
    Seek { time: f64 },
    SetVolume { volume: f64 },
    SetMuted { muted: bool },
    SetPlaybackRate { rate: f64 },
    ToggleFullscreen,
    PlayItem { item_id: ItemId },
    PlayNext,
    PlayPrevious,
    ConfirmAutoPlay,
    CancelAutoPlay,
    SetAutoPlayEnabled { enabled: bool },
    /// Tear down and return the session
    Shutdown,
}

fn apply_command<B: MediaBackend>(session: &mut MediaSession<B>, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Play => session.controller_mut().play()?,
        SessionCommand::Pause => session.controller_mut().pause()?,
        SessionCommand::Seek { time } => session.controller_mut().seek(time)?,
        SessionCommand::SetVolume { volume } => session.controller_mut().set_volume(volume)?,
        SessionCommand::SetMuted { muted } => session.controller_mut().set_muted(muted)?,
        SessionCommand::SetPlaybackRate { rate } => {
            session.controller_mut().set_playback_rate(rate)?;
        }
        SessionCommand::ToggleFullscreen => session.controller_mut().toggle_fullscreen()?,
        SessionCommand::PlayItem { item_id } => {
            session.play_item(&item_id)?;
        }
        SessionCommand::PlayNext => {
            if session.play_next().is_none() {
                debug!("no next item");
            }
        }
        SessionCommand::PlayPrevious => {
            if session.play_previous().is_none() {
                debug!("no previous item");
            }
        }
        SessionCommand::ConfirmAutoPlay => {
            session.confirm_autoplay();
        }
        SessionCommand::CancelAutoPlay => {
            session.cancel_autoplay();
        }
        SessionCommand::SetAutoPlayEnabled { enabled } => {
            session.playlist_mut().set_autoplay_enabled(enabled);
        }
        SessionCommand::Shutdown => {}
    }
    Ok(())
}

fn forward<B: MediaBackend>(session: &mut MediaSession<B>, events_tx: &mpsc::UnboundedSender<PlayerEvent>) {
    for event in session.drain_events() {
        if events_tx.send(event).is_err() {
            debug!("event receiver dropped");
            break;
        }
    }
}

/// Drive `session` until shutdown
///
/// Returns the torn down session once `Shutdown` arrives or the command
/// channel closes. A closed media channel only stops backend events.
pub async fn run_session<B: MediaBackend>(
    mut session: MediaSession<B>,
    mut media_rx: mpsc::Receiver<MediaEvent>,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    events_tx: mpsc::UnboundedSender<PlayerEvent>,
    poll_interval: Duration,
) -> MediaSession<B> {
    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(?poll_interval, "session driver started");

    loop {
        tokio::select! {
            // Backend events
            Some(event) = media_rx.recv() => {
                session.handle_media_event(event, Instant::now().into_std());
            }
            // Host commands
            command = command_rx.recv() => {
                match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => {
                        if let Err(e) = apply_command(&mut session, command) {
                            warn!("Command failed: {}", e);
                        }
                    }
                }
            }
            // Timers
            _ = poll.tick() => {
                session.poll(Instant::now().into_std());
            }
        }
        forward(&mut session, &events_tx);
    }

    session.teardown();
    forward(&mut session, &events_tx);
    info!("session driver stopped");
    session
}
