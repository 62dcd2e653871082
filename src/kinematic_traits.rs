extern crate nalgebra as na;

use bitflags::bitflags;
use na::Isometry3;

/// Pose is used a pose of the pen tip. It contains both Cartesian position and rotation quaternion
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(250.0, 0.0, 120.0);
/// // Pen pointing straight down
/// let rotation = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI);
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Six rotary joints of the robot, in radians. Values returned by the solver are
/// normalized into (-pi, pi].
pub type Joints = [f64; 6];

/// The all-zero configuration, also used as the seed of the joint space driver.
pub const JOINTS_AT_ZERO: Joints = [0.0; 6];

/// Joint indices
pub const J1: usize = 0;
pub const J2: usize = 1;
pub const J3: usize = 2;
pub const J4: usize = 3;
pub const J5: usize = 4;
pub const J6: usize = 5;

bitflags! {
    /// Diagnostics attached to every inverse kinematics solution.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct IkFlags: u32 {
        const NONE = 0b0000_0000;

        /// The law of cosines argument for the elbow was outside [-1, 1] and has been clamped.
        /// The target is not reachable, the solution points towards it with the arm
        /// fully stretched or folded.
        const ELBOW_CLAMPED =      0b0000_0001;

        /// The wrist centre is on the axis of joint 1, J1 kept the previous value.
        const SHOULDER_SINGULAR =  0b0000_0010;

        /// J5 is at 0 or pi, only the sum of J4 and J6 is defined. J4 kept the previous value.
        const WRIST_SINGULAR =     0b0000_0100;

        /// None of the wrist candidates matched the wrist rotation, the first
        /// enumerated one was returned.
        const WRIST_FALLBACK =     0b0000_1000;

        /// Combined flag for solutions that do not reach the target pose.
        const UNREACHABLE = Self::ELBOW_CLAMPED.bits() | Self::WRIST_FALLBACK.bits();
    }
}

/// Result of the inverse kinematics. There is always exactly one solution, possibly flagged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IkSolution {
    pub joints: Joints,
    pub flags: IkFlags,
}

impl IkSolution {
    /// True if the solution is expected to reach the commanded pose.
    pub fn is_reachable(&self) -> bool {
        !self.flags.intersects(IkFlags::UNREACHABLE)
    }
}

pub trait Kinematics {
    /// Find the joint configuration for the pose without knowing where the robot is.
    /// The positive elbow root and the first verified wrist candidate are taken.
    fn inverse(&self, pose: &Pose) -> IkSolution;

    /// Find the joint configuration for the pose, choosing among alternative solutions
    /// the one closest to the previous joint positions.
    fn inverse_continuing(&self, pose: &Pose, previous: &Joints) -> IkSolution;

    /// Pose of the pen tip for the given joint configuration.
    fn forward(&self, qs: &Joints) -> Pose;
}
