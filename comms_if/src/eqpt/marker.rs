//! # Marker observations
//!
//! Observations of the tracked fiducial marker, as produced by the external detection pipeline.
//! All coordinates are in pixels of the frame the observation was computed against, with the
//! origin in the top left corner, x increasing to the right and y increasing downwards.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::Instant;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A single frame's detection of the marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    /// Centroid of the marker.
    pub center_px: Point2<f64>,

    /// Apparent size of the marker in the image. Larger values mean the marker is closer.
    pub size_px: f64,

    /// Corners of the marker, if the detector provides them.
    #[serde(default)]
    pub corners_px: Option<MarkerCorners>,
}

/// The ordered quadrilateral outlining a detected marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerCorners {
    pub top_left: Point2<f64>,
    pub top_right: Point2<f64>,
    pub bottom_right: Point2<f64>,
    pub bottom_left: Point2<f64>,
}

/// Size of the frame an observation was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub width_px: u32,
    pub height_px: u32,
}

/// Everything the detection pipeline knows about one video frame.
#[derive(Debug, Clone)]
pub struct FrameObservation {
    /// Monotonic capture time of the frame.
    pub timestamp: Instant,

    /// Geometry of the frame.
    pub geometry: FrameGeometry,

    /// The marker observation, or `None` if no marker was detected in this frame.
    pub marker: Option<MarkerObservation>,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of per-frame marker observations.
pub trait MarkerSource {
    /// Get the observation for the next frame.
    ///
    /// Returns `None` once the source has no more frames to provide. Capture times are
    /// monotonically increasing between calls.
    fn next_frame(&mut self) -> Option<FrameObservation>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MarkerObservation {
    /// Create a new observation without any corner information.
    pub fn new(center_px: Point2<f64>, size_px: f64) -> Self {
        Self {
            center_px,
            size_px,
            corners_px: None,
        }
    }

    /// Add corner information to the observation.
    pub fn with_corners(mut self, corners: MarkerCorners) -> Self {
        self.corners_px = Some(corners);
        self
    }
}

impl MarkerCorners {
    /// Length of the left edge (top left to bottom left).
    pub fn left_edge_px(&self) -> f64 {
        (self.bottom_left - self.top_left).norm()
    }

    /// Length of the right edge (top right to bottom right).
    pub fn right_edge_px(&self) -> f64 {
        (self.bottom_right - self.top_right).norm()
    }

    /// Build an axis aligned square of the given side length centred on a point.
    pub fn square(center_px: Point2<f64>, side_px: f64) -> Self {
        let h = side_px / 2.0;
        Self {
            top_left: Point2::new(center_px.x - h, center_px.y - h),
            top_right: Point2::new(center_px.x + h, center_px.y - h),
            bottom_right: Point2::new(center_px.x + h, center_px.y + h),
            bottom_left: Point2::new(center_px.x - h, center_px.y + h),
        }
    }
}

impl FrameGeometry {
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// A geometry is valid if neither dimension is zero.
    pub fn is_valid(&self) -> bool {
        self.width_px > 0 && self.height_px > 0
    }

    /// The x coordinate of the centre of the frame.
    pub fn center_x_px(&self) -> f64 {
        self.width_px as f64 / 2.0
    }

    /// The y coordinate of the centre of the frame.
    pub fn center_y_px(&self) -> f64 {
        self.height_px as f64 / 2.0
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_edges() {
        let sq = MarkerCorners::square(Point2::new(100.0, 50.0), 20.0);
        assert_eq!(sq.left_edge_px(), 20.0);
        assert_eq!(sq.right_edge_px(), 20.0);

        let trapezoid = MarkerCorners {
            top_left: Point2::new(0.0, 2.0),
            top_right: Point2::new(10.0, 0.0),
            bottom_right: Point2::new(10.0, 12.0),
            bottom_left: Point2::new(0.0, 10.0),
        };
        assert_eq!(trapezoid.left_edge_px(), 8.0);
        assert_eq!(trapezoid.right_edge_px(), 12.0);
    }

    #[test]
    fn test_observation_json() {
        let obs: MarkerObservation = serde_json::from_str(
            r#"{"center_px": [320.0, 240.0], "size_px": 80.0}"#
        ).unwrap();
        assert_eq!(obs, MarkerObservation::new(Point2::new(320.0, 240.0), 80.0));
    }

    #[test]
    fn test_geometry() {
        let g = FrameGeometry::new(640, 480);
        assert!(g.is_valid());
        assert_eq!(g.center_x_px(), 320.0);
        assert_eq!(g.center_y_px(), 240.0);
        assert!(!FrameGeometry::new(0, 480).is_valid());
    }
}
