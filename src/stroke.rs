//! Strokes: single continuous moves of the pen, either touching the surface or lifted.

use nalgebra::Vector3;

use crate::annotations::PathFlags;
use crate::motion_error::MotionError;
use crate::trajectory::{CubicSpline, Trajectory, Waypoint};
use crate::writing_config::WritingConfig;

/// Anything that has been sampled into a Cartesian trajectory.
pub trait HasTrajectory {
    fn trajectory(&self) -> &Trajectory;

    fn duration(&self) -> f64 {
        self.trajectory().duration()
    }

    /// Position of the first sample.
    fn start(&self) -> Vector3<f64> {
        self.trajectory().start_position().unwrap_or_else(Vector3::zeros)
    }

    /// Position of the last sample.
    fn end(&self) -> Vector3<f64> {
        self.trajectory().end_position().unwrap_or_else(Vector3::zeros)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeKind {
    /// The pen touches the surface.
    Pen,
    /// The pen rises, travels and comes down without touching.
    Lift,
}

impl StrokeKind {
    fn flags(&self) -> PathFlags {
        match self {
            StrokeKind::Pen => PathFlags::PEN_DOWN,
            StrokeKind::Lift => PathFlags::LIFT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stroke {
    kind: StrokeKind,
    waypoints: Vec<Waypoint>,
    trajectory: Trajectory,
}

impl Stroke {
    /// Pen stroke through the given positions at the given times, sampled at the configured
    /// frequency. If the configuration has bounds, all positions must be inside.
    pub fn new(positions: &[Vector3<f64>], times: &[f64], config: &WritingConfig) -> Result<Self, MotionError> {
        if let Some(bounds) = &config.bounds {
            if let Some(index) = positions.iter().position(|p| !bounds.contains(p)) {
                return Err(MotionError::OutOfBounds { index });
            }
        }
        Self::build(StrokeKind::Pen, positions, times, config)
    }

    /// Lift from `start` to `end`: rise by the lift height, travel, come down.
    pub fn lift(start: &Vector3<f64>, end: &Vector3<f64>, config: &WritingConfig) -> Result<Self, MotionError> {
        let up = Vector3::z() * config.lift_height;
        let rise = config.lift_duration;
        let travel = config.move_duration;
        let positions = [*start, start + up, end + up, *end];
        let times = [0.0, rise, rise + travel, 2.0 * rise + travel];
        Self::build(StrokeKind::Lift, &positions, &times, config)
    }

    fn build(kind: StrokeKind, positions: &[Vector3<f64>], times: &[f64], config: &WritingConfig) -> Result<Self, MotionError> {
        let spline = CubicSpline::from_parts(positions, times)?;
        let trajectory = spline.sample(config.frequency, kind.flags())?;
        let waypoints = positions.iter().zip(times)
            .map(|(p, t)| Waypoint::new(*p, *t))
            .collect();
        Ok(Stroke { kind, waypoints, trajectory })
    }

    pub fn kind(&self) -> StrokeKind {
        self.kind
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

impl HasTrajectory for Stroke {
    fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}
