use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use fractour_core::{Complex, IterationBudget, Julia, PlaneBounds};

use crate::error::SessionError;

// ---------------------------------------------------------------------------
// Tour timing
// ---------------------------------------------------------------------------

/// Pacing of tour playback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TourTiming {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_seconds_per_keyframe")]
    pub seconds_per_keyframe: f64,
}

fn default_fps() -> u32 {
    60
}
fn default_seconds_per_keyframe() -> f64 {
    3.0
}

impl Default for TourTiming {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            seconds_per_keyframe: default_seconds_per_keyframe(),
        }
    }
}

impl TourTiming {
    /// Number of ticks a tour over `keyframes` keyframes plays.
    pub fn total_frames(&self, keyframes: usize) -> u64 {
        let segments = keyframes.saturating_sub(1) as f64;
        (segments * self.seconds_per_keyframe * self.fps as f64).round() as u64
    }

    /// Wall-clock time between ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }

    /// Replace unusable values with the defaults.
    pub(crate) fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            fps: if self.fps == 0 { defaults.fps } else { self.fps },
            seconds_per_keyframe: if self.seconds_per_keyframe.is_finite()
                && self.seconds_per_keyframe > 0.0
            {
                self.seconds_per_keyframe
            } else {
                defaults.seconds_per_keyframe
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub budget: IterationBudget,
    #[serde(default)]
    pub tour: TourTiming,
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,
    #[serde(default = "default_julia_c")]
    pub julia_c: Complex,
    #[serde(default)]
    pub initial_bounds: PlaneBounds,
}

fn default_undo_capacity() -> usize {
    100
}
fn default_julia_c() -> Complex {
    Julia::DEFAULT_C
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            budget: IterationBudget::default(),
            tour: TourTiming::default(),
            undo_capacity: default_undo_capacity(),
            julia_c: default_julia_c(),
            initial_bounds: PlaneBounds::default(),
        }
    }
}

impl EngineConfig {
    /// Read a config file, reporting every failure.
    pub fn try_load(path: &Path) -> Result<Self, SessionError> {
        let json = fs::read_to_string(path).map_err(|source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&json).map_err(|source| SessionError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(config.sanitized())
    }

    /// Read a config file, falling back to defaults when it is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Using default config: {e}");
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    pub(crate) fn sanitized(mut self) -> Self {
        self.tour = self.tour.sanitized();
        if self.undo_capacity == 0 {
            warn!("undo_capacity must be at least 1, using the default");
            self.undo_capacity = default_undo_capacity();
        }
        if self.budget.base == 0 {
            warn!("budget.base must be at least 1, using the default");
            self.budget = IterationBudget::default();
        }
        if self.initial_bounds.validate().is_err() {
            warn!("initial_bounds are invalid, using the default");
            self.initial_bounds = PlaneBounds::default();
        }
        if !self.julia_c.is_finite() {
            self.julia_c = default_julia_c();
        }
        self
    }
}
