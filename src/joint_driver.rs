//! Converts Cartesian writing trajectories into joint trajectories.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use tracing::{info, warn};

use crate::annotations::PathFlags;
use crate::kinematic_traits::{IkFlags, Joints, Kinematics, Pose, JOINTS_AT_ZERO};
use crate::motion_error::MotionError;
use crate::trajectory::Trajectory;
use crate::utils::pen_kinematics::is_valid;
use crate::utils::pose_distance;

/// Orientation of the pen in canvas coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Orientation {
    /// Same orientation for every sample.
    Fixed(UnitQuaternion<f64>),
    /// One orientation per sample of the trajectory.
    PerSample(Vec<UnitQuaternion<f64>>),
}

impl Orientation {
    fn at(&self, index: usize) -> &UnitQuaternion<f64> {
        match self {
            Orientation::Fixed(rotation) => rotation,
            Orientation::PerSample(rotations) => &rotations[index],
        }
    }
}

/// Difference between the commanded pose and the forward kinematics of the solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    /// Distance between positions, mm.
    pub translation: f64,
    /// Angle between orientations, radians.
    pub rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointSample {
    pub time: f64,
    pub joints: Joints,
    pub ik_flags: IkFlags,
    pub path_flags: PathFlags,
    /// Only present if the driver verifies solutions.
    pub deviation: Option<Deviation>,
}

#[derive(Debug, Clone, Default)]
pub struct JointTrajectory {
    pub samples: Vec<JointSample>,
}

impl JointTrajectory {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn joints(&self) -> Vec<Joints> {
        self.samples.iter().map(|s| s.joints).collect()
    }

    /// Largest change of any single joint between consecutive samples, radians.
    pub fn max_joint_step(&self) -> f64 {
        self.samples.windows(2)
            .flat_map(|w| (0..6).map(move |j| (w[1].joints[j] - w[0].joints[j]).abs()))
            .fold(0.0, f64::max)
    }

    /// Number of samples whose solution does not reach the commanded pose.
    pub fn unreachable(&self) -> usize {
        self.samples.iter().filter(|s| s.ik_flags.intersects(IkFlags::UNREACHABLE)).count()
    }

    /// Worst translation and rotation deviation over all verified samples.
    pub fn max_deviation(&self) -> Option<Deviation> {
        self.samples.iter()
            .filter_map(|s| s.deviation)
            .reduce(|a, b| Deviation {
                translation: a.translation.max(b.translation),
                rotation: a.rotation.max(b.rotation),
            })
    }
}

/// Walks a trajectory through the inverse kinematics, each solution continuing from the
/// previous one. The first sample continues from the all-zero configuration.
pub struct JointSpaceDriver<'a> {
    robot: &'a dyn Kinematics,
    /// Placement of the canvas in the robot base frame.
    canvas: Isometry3<f64>,
    verify: bool,
}

impl<'a> JointSpaceDriver<'a> {
    pub fn new(robot: &'a dyn Kinematics, canvas: Isometry3<f64>) -> Self {
        JointSpaceDriver { robot, canvas, verify: false }
    }

    /// If set, forward kinematics is run on every solution and the deviation is recorded.
    pub fn with_verification(self, verify: bool) -> Self {
        JointSpaceDriver { verify, ..self }
    }

    /// Pose of the pen in the robot base frame for a position and orientation on the canvas.
    pub fn base_pose(&self, position: &Vector3<f64>, orientation: &UnitQuaternion<f64>) -> Pose {
        self.canvas * Pose::from_parts(Translation3::from(*position), *orientation)
    }

    pub fn drive(&self, trajectory: &Trajectory, orientation: &Orientation) -> Result<JointTrajectory, MotionError> {
        if let Orientation::PerSample(rotations) = orientation {
            if rotations.len() != trajectory.len() {
                return Err(MotionError::OrientationCount { expected: trajectory.len(), found: rotations.len() });
            }
        }

        let (samples, _) = (0..trajectory.len()).fold(
            (Vec::with_capacity(trajectory.len()), JOINTS_AT_ZERO),
            |(mut samples, previous), i| {
                let pose = self.base_pose(&trajectory.positions[i], orientation.at(i));
                let solution = self.robot.inverse_continuing(&pose, &previous);
                if !solution.is_reachable() || !is_valid(&solution.joints) {
                    warn!("Sample {} at t = {:.3} not reachable: {:?}",
                          i, trajectory.times[i], solution.flags);
                }
                let deviation = self.verify.then(|| {
                    let (translation, rotation) = pose_distance(&pose, &self.robot.forward(&solution.joints));
                    Deviation { translation, rotation }
                });
                samples.push(JointSample {
                    time: trajectory.times[i],
                    joints: solution.joints,
                    ik_flags: solution.flags,
                    path_flags: trajectory.flags[i],
                    deviation,
                });
                (samples, solution.joints)
            },
        );

        let result = JointTrajectory { samples };
        info!("Joint trajectory of {} samples, max joint step {:.5} rad, {} unreachable",
              result.len(), result.max_joint_step(), result.unreachable());
        Ok(result)
    }
}
