//! Audio playback for finished briefings.
//!
//! The console has no audio stack of its own. Clips are written to the cache
//! directory and an external player (mpv, ffplay, afplay, ...) is spawned
//! detached from the TUI with all stdio closed.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use super::AudioClip;

/// Playback failures
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("failed to write clip to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to start player '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

/// Something that can play a clip
pub trait Playback: Send {
    fn play(&mut self, clip: &AudioClip) -> Result<(), PlaybackError>;
}

/// Writes the clip to disk and runs a player command on it
pub struct CommandPlayer {
    /// Program followed by its arguments; the clip path is appended
    command: Vec<String>,
    dir: PathBuf,
    /// Previous playback, stopped when a new clip starts
    child: Option<Child>,
}

impl CommandPlayer {
    /// Returns None when the command is empty
    pub fn new(command: Vec<String>, dir: impl Into<PathBuf>) -> Option<Self> {
        if command.first().map_or(true, |p| p.trim().is_empty()) {
            return None;
        }
        Some(Self {
            command,
            dir: dir.into(),
            child: None,
        })
    }

    /// Default clip directory under the user cache dir
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("threat-console")
    }

    fn clip_path(&self, clip: &AudioClip) -> PathBuf {
        self.dir.join(format!("briefing-case-{}.mp3", clip.case_id))
    }

    fn write_clip(path: &Path, clip: &AudioClip) -> Result<(), PlaybackError> {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &clip.bytes)
        };
        write().map_err(|source| PlaybackError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn stop_previous(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                child.kill().ok();
            }
            child.wait().ok();
        }
    }
}

impl Playback for CommandPlayer {
    fn play(&mut self, clip: &AudioClip) -> Result<(), PlaybackError> {
        let path = self.clip_path(clip);
        self.stop_previous();
        Self::write_clip(&path, clip)?;

        let program = &self.command[0];
        let child = Command::new(program)
            .args(&self.command[1..])
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PlaybackError::Spawn {
                program: program.clone(),
                source,
            })?;

        tracing::info!("Playing briefing {} with {}", path.display(), program);
        self.child = Some(child);
        Ok(())
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        self.stop_previous();
    }
}

/// Keeps clips in memory only
#[derive(Debug, Default)]
pub struct NullPlayer;

impl Playback for NullPlayer {
    fn play(&mut self, clip: &AudioClip) -> Result<(), PlaybackError> {
        tracing::info!(
            case_id = clip.case_id,
            bytes = clip.bytes.len(),
            "No audio player configured, briefing kept in memory"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> AudioClip {
        AudioClip {
            case_id: 2,
            bytes: b"ID3 fake".to_vec(),
        }
    }

    #[test]
    fn test_empty_command_disables() {
        assert!(CommandPlayer::new(vec![], "/tmp").is_none());
        assert!(CommandPlayer::new(vec!["  ".to_string()], "/tmp").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_writes_clip_and_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let mut player = CommandPlayer::new(vec!["true".to_string()], dir.path().join("clips")).unwrap();

        player.play(&clip()).unwrap();
        let written = std::fs::read(dir.path().join("clips/briefing-case-2.mp3")).unwrap();
        assert_eq!(written, b"ID3 fake");

        // Second play replaces the first without error
        player.play(&clip()).unwrap();
    }

    #[test]
    fn test_missing_program() {
        let dir = tempfile::tempdir().unwrap();
        let mut player =
            CommandPlayer::new(vec!["threat-console-no-such-player".to_string()], dir.path()).unwrap();
        assert!(matches!(player.play(&clip()), Err(PlaybackError::Spawn { .. })));
    }

    #[test]
    fn test_null_player() {
        assert!(NullPlayer.play(&clip()).is_ok());
    }
}
