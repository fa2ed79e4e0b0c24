//! Shared fixtures for integration tests

use couch_core::{
    BackendError, Capability, MediaBackend, MediaTrack, PlaylistItem, PlaylistRail, RailType,
    TrackKind,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Install a test subscriber once; `RUST_LOG` controls verbosity
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn item(id: &str) -> PlaylistItem {
    PlaylistItem::new(id, format!("Item {id}"), format!("https://cdn.example.com/{id}.mpd"))
}

pub fn rail(id: &str, priority: i32, items: &[&str]) -> PlaylistRail {
    PlaylistRail::new(id, id.to_uppercase(), RailType::Queue)
        .with_priority(priority)
        .with_items(items.iter().map(|id| item(id)).collect())
}

/// Rails A=[1,2] (priority 0) and B=[3,4] (priority 1)
pub fn two_rails() -> Vec<PlaylistRail> {
    vec![rail("A", 0, &["1", "2"]), rail("B", 1, &["3", "4"])]
}

/// Calls made against a [`FakeBackend`]
#[derive(Debug, Default, Clone)]
pub struct BackendLog {
    pub plays: usize,
    pub pauses: usize,
    pub seeks: Vec<f64>,
    pub volumes: Vec<f64>,
    pub destroyed: usize,
}

/// In-memory backend recording every call
#[derive(Debug, Clone)]
pub struct FakeBackend {
    pub log: Rc<RefCell<BackendLog>>,
    pub capabilities: Vec<Capability>,
    pub fail_play: Option<BackendError>,
    pub audio: Vec<MediaTrack>,
    pub text: Vec<MediaTrack>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(BackendLog::default())),
            capabilities: Capability::REQUIRED.to_vec(),
            fail_play: None,
            audio: vec![
                MediaTrack::new("en", TrackKind::Audio, "English").selected(true),
                MediaTrack::new("fr", TrackKind::Audio, "Français"),
            ],
            text: vec![MediaTrack::new("en-cc", TrackKind::Text, "English CC")],
        }
    }

    pub fn log(&self) -> Rc<RefCell<BackendLog>> {
        Rc::clone(&self.log)
    }
}

impl MediaBackend for FakeBackend {
    fn capabilities(&self) -> Vec<Capability> {
        self.capabilities.clone()
    }

    fn play(&mut self) -> Result<(), BackendError> {
        self.log.borrow_mut().plays += 1;
        match &self.fail_play {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn pause(&mut self) -> Result<(), BackendError> {
        self.log.borrow_mut().pauses += 1;
        Ok(())
    }

    fn seek(&mut self, time: f64) -> Result<(), BackendError> {
        self.log.borrow_mut().seeks.push(time);
        Ok(())
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), BackendError> {
        self.log.borrow_mut().volumes.push(volume);
        Ok(())
    }

    fn set_muted(&mut self, _muted: bool) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_playback_rate(&mut self, _rate: f64) -> Result<(), BackendError> {
        Ok(())
    }

    fn enter_fullscreen(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn enter_picture_in_picture(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn exit_picture_in_picture(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn audio_tracks(&self) -> Vec<MediaTrack> {
        self.audio.clone()
    }

    fn video_tracks(&self) -> Vec<MediaTrack> {
        Vec::new()
    }

    fn text_tracks(&self) -> Vec<MediaTrack> {
        self.text.clone()
    }

    fn select_audio_track(&mut self, id: &str) -> Result<(), BackendError> {
        select(&mut self.audio, Some(id))
    }

    fn select_video_track(&mut self, id: &str) -> Result<(), BackendError> {
        Err(BackendError::UnknownTrack(id.to_string()))
    }

    fn select_text_track(&mut self, id: Option<&str>) -> Result<(), BackendError> {
        select(&mut self.text, id)
    }

    fn destroy(&mut self) {
        self.log.borrow_mut().destroyed += 1;
    }
}

fn select(tracks: &mut [MediaTrack], id: Option<&str>) -> Result<(), BackendError> {
    if let Some(id) = id {
        if !tracks.iter().any(|track| track.id == id) {
            return Err(BackendError::UnknownTrack(id.to_string()));
        }
    }
    for track in tracks.iter_mut() {
        track.selected = Some(track.id.as_str()) == id;
    }
    Ok(())
}
