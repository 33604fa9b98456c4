use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::phase::Phase;
use crate::ui::theme::{parse_hex_color, Theme};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Case fixture file; built-in demo cases when unset
    pub cases_file: Option<PathBuf>,
    pub speech: SpeechConfig,
    pub timing: TimingConfig,
    pub assets: AssetsConfig,
    pub appearance: AppearanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speech synthesis endpoint (OpenAI-compatible `/audio/speech`)
    pub endpoint: String,
    pub model: String,
    pub voice: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key, takes precedence over `api_key_env`
    pub api_key: Option<String>,
    /// Player command; the audio file path is appended as last argument.
    /// Empty disables playback (clips are still kept).
    pub player: Vec<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
            model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            player: vec![
                "mpv".to_string(),
                "--no-video".to_string(),
                "--really-quiet".to_string(),
            ],
            request_timeout_secs: 60,
            connect_timeout_secs: 10,
        }
    }
}

impl SpeechConfig {
    /// Resolve the credential. Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Lifetime of transient notices
    pub notice_secs: u64,
    /// Auto-advance to the next case every N seconds (0 = off)
    pub rotation_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            notice_secs: 3,
            rotation_secs: 0,
        }
    }
}

impl TimingConfig {
    pub fn notice_duration(&self) -> Duration {
        Duration::from_secs(self.notice_secs)
    }

    pub fn rotation_interval(&self) -> Option<Duration> {
        (self.rotation_secs > 0).then(|| Duration::from_secs(self.rotation_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Base directory for relative asset references
    pub root: PathBuf,
    pub map_image: String,
    pub en_route_video: String,
    pub scanning_video: String,
    pub negotiation_video: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            map_image: "images/map_view.jpg".to_string(),
            en_route_video: "videos/drone_enroute.mp4".to_string(),
            scanning_video: "videos/drone_scanning.mp4".to_string(),
            negotiation_video: "videos/drone_negotiation.mp4".to_string(),
        }
    }
}

impl AssetsConfig {
    /// Feed video for a phase; idle has none
    pub fn phase_video(&self, phase: Phase) -> Option<&str> {
        match phase {
            Phase::Idle => None,
            Phase::EnRoute => Some(&self.en_route_video),
            Phase::Scanning => Some(&self.scanning_video),
            Phase::Negotiation => Some(&self.negotiation_video),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Theme preset name
    pub theme: String,
    /// Accent colour override (#rrggbb)
    pub accent: Option<String>,
    /// Render subject thumbnails through a terminal graphics protocol
    pub thumbnails: bool,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            theme: "console".to_string(),
            accent: None,
            thumbnails: true,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let expanded = shellexpand::tilde(path);
        let path = Path::new(expanded.as_ref());

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            tracing::info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Theme preset with the accent override applied
    pub fn resolve_theme(&self) -> Theme {
        let mut theme = Theme::from_preset(&self.appearance.theme).unwrap_or_else(|| {
            tracing::warn!("Unknown theme '{}', using default", self.appearance.theme);
            Theme::default()
        });

        if let Some(ref accent) = self.appearance.accent {
            match parse_hex_color(accent) {
                Ok(color) => theme.accent = color,
                Err(e) => tracing::warn!("Ignoring accent '{}': {}", accent, e),
            }
        }

        theme
    }
}
