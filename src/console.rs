//! Terminal rendering of view events
//!
//! Prints each utterance as a timestamped line and "plays" reply audio by
//! saving it as a WAV file next to the transcript.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};

use crate::audio::decode_wav;
use crate::session::{ViewEvent, ViewSink};

pub struct ConsoleView {
    playback_dir: PathBuf,
    replies_saved: AtomicUsize,
}

impl ConsoleView {
    pub fn new(playback_dir: impl Into<PathBuf>) -> Result<Self> {
        let playback_dir = playback_dir.into();
        fs::create_dir_all(&playback_dir)
            .with_context(|| format!("Failed to create playback directory {:?}", playback_dir))?;

        Ok(Self {
            playback_dir,
            replies_saved: AtomicUsize::new(0),
        })
    }

    pub fn playback_dir(&self) -> &Path {
        &self.playback_dir
    }

    /// Save reply audio and return where it went
    pub fn save_reply_audio(&self, audio: &[u8]) -> Result<PathBuf> {
        let index = self.replies_saved.fetch_add(1, Ordering::SeqCst);
        let path = self.playback_dir.join(format!(
            "reply-{}-{:03}.wav",
            Local::now().format("%Y%m%d-%H%M%S"),
            index
        ));

        fs::write(&path, audio).with_context(|| format!("Failed to write {:?}", path))?;

        match decode_wav(audio) {
            Ok(decoded) => info!(
                "Reply audio saved to {} ({:.1}s, {}Hz)",
                path.display(),
                decoded.duration_seconds(),
                decoded.sample_rate
            ),
            Err(e) => info!("Reply audio saved to {} (not 16-bit PCM WAV: {})", path.display(), e),
        }

        Ok(path)
    }
}

impl ViewSink for ConsoleView {
    fn render(&self, event: ViewEvent) {
        let time = Local::now().format("%H:%M:%S");
        match event {
            ViewEvent::UserUtterance(text) => println!("[{}] you: {}", time, text),
            ViewEvent::AssistantUtterance(text) => println!("[{}] assistant: {}", time, text),
            ViewEvent::SystemNotice(text) => println!("[{}] * {}", time, text),
            ViewEvent::StatusChanged(text) => println!("-- {} --", text),
            ViewEvent::PlayAudio(audio) => match self.save_reply_audio(&audio) {
                Ok(path) => println!("[{}] ♪ {}", time, path.display()),
                Err(e) => error!("Error playing audio: {:#}", e),
            },
        }
    }
}
