//! Display geometry and coordinate denormalization.
//!
//! Viewers send pointer positions normalized to their viewport (0..=1 on
//! each axis) so they never need to know the host's resolution.  The host
//! turns those into pixels against the geometry its input backend reported
//! once at startup.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while parsing a geometry report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    /// The text did not contain two whitespace-separated integers.
    #[error("expected \"<width> <height>\", got {0:?}")]
    Malformed(String),

    /// One of the dimensions was zero.
    #[error("display geometry must be non-zero, got {width}x{height}")]
    Empty { width: u32, height: u32 },
}

/// Pixel size of the primary display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: u32,
    pub height: u32,
}

impl ScreenGeometry {
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::Empty { width, height });
        }
        Ok(ScreenGeometry { width, height })
    }

    /// Converts a normalized position to pixels, clamped to
    /// `[0, width-1] × [0, height-1]`.
    ///
    /// Out-of-range input is clamped, not rejected: `(1.5, -0.2)` lands on
    /// `(width-1, 0)`.  Returns `None` only for non-finite input.
    pub fn denormalize(&self, x: f64, y: f64) -> Option<(i32, i32)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some((scale(x, self.width), scale(y, self.height)))
    }
}

fn scale(v: f64, extent: u32) -> i32 {
    let max = f64::from(extent.saturating_sub(1));
    (v * f64::from(extent)).floor().clamp(0.0, max) as i32
}

impl fmt::Display for ScreenGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Parses `"<width> <height>"` as printed by `xdotool getdisplaygeometry`
/// and by the Windows geometry script.
///
/// Surrounding whitespace and trailing output lines are ignored.
pub fn parse_geometry(text: &str) -> Result<ScreenGeometry, GeometryError> {
    let malformed = || GeometryError::Malformed(text.trim().to_owned());
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).ok_or_else(malformed)?;
    let mut parts = line.split_whitespace();
    let width = parts.next().and_then(|w| w.parse().ok()).ok_or_else(malformed)?;
    let height = parts.next().and_then(|h| h.parse().ok()).ok_or_else(malformed)?;
    if parts.next().is_some() {
        return Err(malformed());
    }
    ScreenGeometry::new(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hd() -> ScreenGeometry {
        ScreenGeometry::new(1920, 1080).unwrap()
    }

    #[test]
    fn test_out_of_range_input_clamps_to_edges() {
        assert_eq!(hd().denormalize(1.5, -0.2), Some((1919, 0)));
        assert_eq!(hd().denormalize(-3.0, 7.0), Some((0, 1079)));
    }

    #[test]
    fn test_unit_corners_stay_on_screen() {
        assert_eq!(hd().denormalize(0.0, 0.0), Some((0, 0)));
        assert_eq!(hd().denormalize(1.0, 1.0), Some((1919, 1079)));
    }

    #[test]
    fn test_centre_maps_to_middle_pixel() {
        assert_eq!(hd().denormalize(0.5, 0.5), Some((960, 540)));
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        assert_eq!(hd().denormalize(f64::NAN, 0.5), None);
        assert_eq!(hd().denormalize(0.5, f64::INFINITY), None);
    }

    #[test]
    fn test_parse_geometry_accepts_tool_output() {
        assert_eq!(parse_geometry("1920 1080\n"), Ok(hd()));
        assert_eq!(parse_geometry("  2560   1440  \r\n"), Ok(ScreenGeometry::new(2560, 1440).unwrap()));
    }

    #[test]
    fn test_parse_geometry_rejects_garbage() {
        assert!(matches!(parse_geometry(""), Err(GeometryError::Malformed(_))));
        assert!(matches!(parse_geometry("1920"), Err(GeometryError::Malformed(_))));
        assert!(matches!(parse_geometry("wide tall"), Err(GeometryError::Malformed(_))));
        assert!(matches!(parse_geometry("1 2 3"), Err(GeometryError::Malformed(_))));
        assert_eq!(
            parse_geometry("0 1080"),
            Err(GeometryError::Empty { width: 0, height: 1080 })
        );
    }

    #[test]
    fn test_display_formats_as_w_x_h() {
        assert_eq!(hd().to_string(), "1920x1080");
    }
}
