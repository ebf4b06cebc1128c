use crate::{CoreResult, RecorderError};

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use directories::ProjectDirs;
use tracing::{debug, instrument};
use uuid::Uuid;

const DEFAULT_EXTENSION: &str = "wav";

/// Decides where recordings land.
///
/// Implementations return absolute paths and make sure the parent directory
/// exists.
pub trait PathResolver: Send {
    /// Resolve a caller-supplied target, or pick one when none is given.
    fn resolve(&self, requested: Option<&Path>) -> CoreResult<PathBuf>;

    /// Next segment path after `current`, used when the session rotates files.
    /// Must never return an existing file.
    fn rotate(&self, current: &Path) -> CoreResult<PathBuf> {
        Ok(next_segment_path(current))
    }
}

/// Resolves targets under a configured directory, or the platform data
/// directory when none is configured.
#[derive(Debug, Clone, Default)]
pub struct DefaultPathResolver {
    base_dir: Option<PathBuf>,
}

impl DefaultPathResolver {
    /// Resolver rooted at `base_dir`, or at the platform data directory.
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }

    #[track_caller]
    fn recordings_dir(&self) -> CoreResult<PathBuf> {
        if let Some(dir) = &self.base_dir {
            return absolutize(dir);
        }

        let proj_dirs = ProjectDirs::from("com", "live-recorder", "Live-Recorder")
            .ok_or_else(|| RecorderError::path("Failed to get data directory"))?;

        Ok(proj_dirs.data_dir().join("recordings"))
    }
}

impl PathResolver for DefaultPathResolver {
    #[track_caller]
    #[instrument(skip(self))]
    fn resolve(&self, requested: Option<&Path>) -> CoreResult<PathBuf> {
        let target = match requested {
            Some(path) => {
                let path = absolutize(path)?;
                if path.is_dir() {
                    unused_generated_path(&path)
                } else {
                    path
                }
            }
            None => unused_generated_path(&self.recordings_dir()?),
        };

        ensure_parent(&target)?;
        debug!(path = ?target, "Output target resolved");

        Ok(target)
    }
}

/// `recording_<date>-<time>-<millis>.wav` in local time.
///
/// The stem never ends in `_<digits>`, so rotating a generated name always
/// appends a fresh segment number.
pub fn timestamped_file_name() -> String {
    format!(
        "recording_{}.{}",
        Local::now().format("%Y%m%d-%H%M%S-%3f"),
        DEFAULT_EXTENSION
    )
}

// Generated names never overwrite an earlier take or one of its segments.
fn unused_generated_path(dir: &Path) -> PathBuf {
    let candidate = dir.join(timestamped_file_name());
    if candidate.exists() {
        next_segment_path(&candidate)
    } else {
        candidate
    }
}

/// First free `<stem>_<n>.<ext>` next to `current`.
///
/// A trailing `_<n>` on the current stem is treated as a previous rotation, so
/// `take_2.wav` rotates to `take_3.wav` rather than `take_2_1.wav`. A number
/// too large to increment is kept as part of the stem.
pub fn next_segment_path(current: &Path) -> PathBuf {
    let parent = current.parent().map(Path::to_path_buf).unwrap_or_default();
    let extension = current
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or(DEFAULT_EXTENSION)
        .to_string();
    let stem = current
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("recording");

    let (base, start) = match stem.rsplit_once('_') {
        Some((base, n)) if !base.is_empty() => {
            match n.parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
                Some(next) => (base, next),
                None => (stem, 1),
            }
        }
        _ => (stem, 1),
    };

    (start..=u64::MAX)
        .map(|n| parent.join(format!("{}_{}.{}", base, n, extension)))
        .find(|candidate| candidate != current && !candidate.exists())
        .unwrap_or_else(|| {
            parent.join(format!("{}_{}.{}", stem, Uuid::new_v4().simple(), extension))
        })
}

#[track_caller]
fn absolutize(path: &Path) -> CoreResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| RecorderError::path(format!("Failed to read working directory: {}", e)))?;
    Ok(cwd.join(path))
}

#[track_caller]
fn ensure_parent(path: &Path) -> CoreResult<()> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(|e| {
            RecorderError::path(format!("Failed to create {}: {}", parent.display(), e))
        })?;
        debug!(dir = ?parent, "Created output directory");
    }
    Ok(())
}
