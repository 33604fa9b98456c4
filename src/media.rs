//! Static media: drone feed clips, the mission map and subject thumbnails.
//!
//! Assets are plain file references. A reference that does not resolve to a
//! readable file flips the fallback flag for its slot and the UI shows a
//! placeholder instead ("NO SIGNAL DETECTED", "MAP DATA UNAVAILABLE.",
//! "NO IMAGE"). Nothing is retried.
//!
//! Thumbnails go through the terminal graphics protocol (Kitty, Sixel,
//! iTerm2) when one is detected; otherwise subjects render text-only.

use parking_lot::Mutex;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A place on the dashboard that shows external media
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaSlot {
    DroneFeed,
    Map,
    SubjectImage(String),
}

/// Media lookup failures
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("asset not found: {0}")]
    Missing(PathBuf),

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("terminal has no graphics protocol")]
    NoGraphics,
}

/// Resolves asset references against a root directory
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Absolute references are used as-is, anything else hangs off the root.
    /// A leading `/` alone does not make a web-style path like
    /// `/images/x.jpg` absolute if it does not exist on disk.
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() && path.exists() {
            return path.to_path_buf();
        }
        self.root.join(reference.trim_start_matches('/'))
    }

    /// Check that a reference points at an existing file
    pub fn probe(&self, reference: &str) -> Result<PathBuf, MediaError> {
        let path = self.resolve(reference);
        if path.is_file() {
            Ok(path)
        } else {
            Err(MediaError::Missing(path))
        }
    }
}

/// Fallback flags, one per slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaFlags {
    drone_feed: bool,
    map: bool,
    subject_images: HashSet<String>,
}

impl MediaFlags {
    /// Flip the flag for a slot. Returns true if it was not already set.
    pub fn fail(&mut self, slot: &MediaSlot) -> bool {
        match slot {
            MediaSlot::DroneFeed => !std::mem::replace(&mut self.drone_feed, true),
            MediaSlot::Map => !std::mem::replace(&mut self.map, true),
            MediaSlot::SubjectImage(name) => self.subject_images.insert(name.clone()),
        }
    }

    /// Clear the flag for a slot
    pub fn recover(&mut self, slot: &MediaSlot) {
        match slot {
            MediaSlot::DroneFeed => self.drone_feed = false,
            MediaSlot::Map => self.map = false,
            MediaSlot::SubjectImage(name) => {
                self.subject_images.remove(name);
            }
        }
    }

    pub fn is_failed(&self, slot: &MediaSlot) -> bool {
        match slot {
            MediaSlot::DroneFeed => self.drone_feed,
            MediaSlot::Map => self.map,
            MediaSlot::SubjectImage(name) => self.subject_images.contains(name),
        }
    }

    /// Number of slots currently showing a fallback
    pub fn failed_count(&self) -> usize {
        usize::from(self.drone_feed) + usize::from(self.map) + self.subject_images.len()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Thumbnail manager - decodes subject images and caches their protocols
/// Must be initialized once at startup before entering raw mode
pub struct ThumbnailManager {
    /// The picker determines the graphics protocol and font size
    picker: Option<Picker>,
    /// Cache of loaded protocols by asset reference
    cache: HashMap<String, Arc<Mutex<StatefulProtocol>>>,
}

impl ThumbnailManager {
    /// Create a thumbnail manager by querying the terminal
    /// MUST be called before entering raw mode / alternate screen
    pub fn new() -> Self {
        let picker = match Picker::from_query_stdio() {
            Ok(p) => {
                tracing::info!("Graphics protocol detected: {:?}", p.protocol_type());
                Some(p)
            }
            Err(e) => {
                tracing::debug!("No graphics protocol available: {}", e);
                None
            }
        };

        Self {
            picker,
            cache: HashMap::new(),
        }
    }

    /// Manager that never renders images
    pub fn disabled() -> Self {
        Self {
            picker: None,
            cache: HashMap::new(),
        }
    }

    pub fn supports_graphics(&self) -> bool {
        self.picker.is_some()
    }

    /// Load a thumbnail, returning the cached protocol if available
    pub fn load(
        &mut self,
        reference: &str,
        library: &MediaLibrary,
    ) -> Result<Arc<Mutex<StatefulProtocol>>, MediaError> {
        if let Some(cached) = self.cache.get(reference) {
            return Ok(cached.clone());
        }

        let path = library.probe(reference)?;
        let picker = self.picker.as_mut().ok_or(MediaError::NoGraphics)?;

        let dyn_img = image::open(&path).map_err(|e| MediaError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let protocol = Arc::new(Mutex::new(picker.new_resize_protocol(dyn_img)));
        self.cache.insert(reference.to_string(), protocol.clone());

        Ok(protocol)
    }

    /// Get a cached protocol without touching the disk
    pub fn get_cached(&self, reference: &str) -> Option<Arc<Mutex<StatefulProtocol>>> {
        self.cache.get(reference).cloned()
    }
}

impl Default for ThumbnailManager {
    fn default() -> Self {
        Self::disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_web_paths() {
        let library = MediaLibrary::new("/srv/assets");
        assert_eq!(
            library.resolve("images/map_view.jpg"),
            PathBuf::from("/srv/assets/images/map_view.jpg")
        );
        assert_eq!(
            library.resolve("/videos/drone_enroute.mp4"),
            PathBuf::from("/srv/assets/videos/drone_enroute.mp4")
        );
    }

    #[test]
    fn test_probe() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/map_view.jpg"), b"not really a jpeg").unwrap();

        let library = MediaLibrary::new(dir.path());
        assert!(library.probe("images/map_view.jpg").is_ok());
        assert!(matches!(library.probe("images/missing.jpg"), Err(MediaError::Missing(_))));
        // Directories are not assets
        assert!(library.probe("images").is_err());
    }

    #[test]
    fn test_flags_one_per_slot() {
        let mut flags = MediaFlags::default();
        assert!(flags.fail(&MediaSlot::Map));
        assert!(!flags.fail(&MediaSlot::Map));
        assert_eq!(flags.failed_count(), 1);
        assert!(!flags.is_failed(&MediaSlot::DroneFeed));

        let subject = MediaSlot::SubjectImage("Subject A".to_string());
        assert!(flags.fail(&subject));
        assert!(!flags.is_failed(&MediaSlot::SubjectImage("Subject B".to_string())));
        assert_eq!(flags.failed_count(), 2);

        flags.recover(&MediaSlot::Map);
        assert!(!flags.is_failed(&MediaSlot::Map));
        assert!(flags.is_failed(&subject));
    }

    #[test]
    fn test_disabled_thumbnails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        let library = MediaLibrary::new(dir.path());

        let mut thumbs = ThumbnailManager::disabled();
        assert!(!thumbs.supports_graphics());
        assert!(matches!(thumbs.load("a.png", &library), Err(MediaError::NoGraphics)));
        assert!(matches!(thumbs.load("b.png", &library), Err(MediaError::Missing(_))));
        assert!(thumbs.get_cached("a.png").is_none());
    }
}
