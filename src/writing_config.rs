//! Settings shared by strokes, letters, strings and the joint space driver.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use std::f64::consts::PI;

use crate::motion_error::MotionError;

/// Axis aligned box that pen strokes must stay within, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl Bounds {
    pub fn new(min: Vector3<f64>, max: Vector3<f64>) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WritingConfig {
    /// Sampling frequency of generated trajectories, Hz.
    pub frequency: f64,

    /// How high the pen rises above the surface during a lift, mm.
    pub lift_height: f64,

    /// Time to rise and, separately, to come down, s.
    pub lift_duration: f64,

    /// Time to travel between the raised points of a lift, s.
    pub move_duration: f64,

    /// Tolerance for positions that must coincide, mm.
    pub epsilon: f64,

    /// Distance along x between the origins of consecutive letters, mm.
    pub letter_pitch: f64,

    /// If set, every waypoint of a pen stroke must be inside.
    pub bounds: Option<Bounds>,

    /// Placement of the writing surface in the robot base frame.
    pub canvas: Isometry3<f64>,
}

impl WritingConfig {
    /// Orientation of the pen pointing straight down into the canvas (half turn about x).
    pub fn pen_down() -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), PI)
    }

    pub fn with_canvas(self, canvas: Isometry3<f64>) -> Self {
        WritingConfig { canvas, ..self }
    }

    pub fn with_bounds(self, bounds: Bounds) -> Self {
        WritingConfig { bounds: Some(bounds), ..self }
    }

    /// Checks that all scalar settings are finite, and that frequency, tolerance and
    /// durations are positive.
    pub fn validate(&self) -> Result<(), MotionError> {
        let positive = [
            ("frequency", self.frequency),
            ("epsilon", self.epsilon),
            ("lift_duration", self.lift_duration),
            ("move_duration", self.move_duration),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(MotionError::InvalidConfig(format!("{} must be positive (got {})", name, value)));
            }
        }
        for (name, value) in [("lift_height", self.lift_height), ("letter_pitch", self.letter_pitch)] {
            if !value.is_finite() {
                return Err(MotionError::InvalidConfig(format!("{} must be finite (got {})", name, value)));
            }
        }
        Ok(())
    }
}

impl Default for WritingConfig {
    fn default() -> Self {
        WritingConfig {
            frequency: 50.0,
            lift_height: 10.0,
            lift_duration: 0.5,
            move_duration: 1.0,
            epsilon: 1e-6,
            letter_pitch: 100.0,
            bounds: None,
            canvas: Isometry3::from_parts(
                Translation3::new(150.0, -50.0, 100.0),
                UnitQuaternion::identity(),
            ),
        }
    }
}
