//! Saved-view records: plane bounds plus the fractal and color selection.
//!
//! ```json
//! {
//!   "plain": { "xMin": -2.0, "xMax": 1.0, "yMin": -1.0, "yMax": 1.0 },
//!   "fractalType": "julia",
//!   "colorType": "ice"
//! }
//! ```
//!
//! Unknown type tags are rejected rather than replaced with a default.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use fractour_core::{FractalKind, PlaneBounds};
use fractour_render::ColorKind;

use crate::error::SessionError;

/// A decoded saved view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavedView {
    pub bounds: PlaneBounds,
    pub fractal: FractalKind,
    pub color: ColorKind,
}

/// On-disk shape. Tags stay strings so unknown values surface as our own
/// errors instead of serde's.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Record {
    plain: PlaneBounds,
    fractal_type: String,
    color_type: String,
}

impl SavedView {
    pub fn new(bounds: PlaneBounds, fractal: FractalKind, color: ColorKind) -> Self {
        Self {
            bounds,
            fractal,
            color,
        }
    }

    /// Encode as pretty JSON.
    pub fn to_json(&self) -> Result<String, SessionError> {
        check_bounds(&self.bounds)?;
        let record = Record {
            plain: self.bounds,
            fractal_type: self.fractal.tag().to_owned(),
            color_type: self.color.tag().to_owned(),
        };
        Ok(serde_json::to_string_pretty(&record)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let record: Record = serde_json::from_str(json)?;
        Self::from_record(record)
    }

    fn from_record(record: Record) -> Result<Self, SessionError> {
        let fractal = FractalKind::from_tag(&record.fractal_type)
            .ok_or(SessionError::UnsupportedFractal(record.fractal_type))?;
        let color = ColorKind::from_tag(&record.color_type)
            .ok_or(SessionError::UnsupportedColor(record.color_type))?;
        check_bounds(&record.plain)?;
        Ok(Self::new(record.plain, fractal, color))
    }
}

fn check_bounds(bounds: &PlaneBounds) -> Result<(), SessionError> {
    let finite = [bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max]
        .iter()
        .all(|v| v.is_finite());
    if !finite {
        return Err(SessionError::NonFiniteBounds);
    }
    bounds.validate()?;
    Ok(())
}

/// Write `view` to `path`, creating parent directories.
pub fn save(path: &Path, view: &SavedView) -> Result<(), SessionError> {
    let json = view.to_json()?;
    let io_err = |source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, json).map_err(io_err)?;
    info!(
        fractal = view.fractal.tag(),
        color = view.color.tag(),
        "Saved view to {}",
        path.display()
    );
    Ok(())
}

pub fn load(path: &Path) -> Result<SavedView, SessionError> {
    let json = fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record: Record = serde_json::from_str(&json).map_err(|source| SessionError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    let view = SavedView::from_record(record)?;
    debug!(
        fractal = view.fractal.tag(),
        color = view.color.tag(),
        "Loaded view from {}",
        path.display()
    );
    Ok(view)
}
