//! Analytic forward and inverse kinematics of the pen writing arm.

use crate::dh_chain;
use crate::kinematic_traits::{IkFlags, IkSolution, Joints, Kinematics, Pose, J1, J3, J4, J5, J6};
use crate::motion_error::MotionError;
use crate::parameters::pen_kinematics::{DhLink, Parameters};
use crate::utils::{angle_set_distance, normalize_joints, unit_circle_distance};
use nalgebra::{Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3};
use std::f64::consts::PI;
use tracing::debug;

/// Below this sine of J5 the wrist is treated as singular.
const SINGULARITY_THRESHOLD: f64 = 1e-8;

/// Tolerance when checking wrist candidates against the wrist rotation.
const WRIST_TOLERANCE: f64 = 1e-9;

/// Overshoot of the law of cosines argument tolerated as rounding error.
const REACH_TOLERANCE: f64 = 1e-9;

/// Below this horizontal distance the wrist centre is considered on the J1 axis.
const SHOULDER_THRESHOLD: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
pub struct PenArmKinematics {
    /// The parameters that were used to construct this solver.
    parameters: Parameters,
    links: [DhLink; 6],
}

impl PenArmKinematics {
    /// Creates a new `PenArmKinematics` instance with the given parameters.
    pub fn new(parameters: Parameters) -> Self {
        PenArmKinematics { parameters, links: parameters.dh_links() }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn links(&self) -> &[DhLink; 6] {
        &self.links
    }

    /// Transform between frames `from` and `to` (0 = base, 6 = last joint) for the given joints.
    /// See [`dh_chain::transform`].
    pub fn transform(&self, joints: &Joints, from: usize, to: usize) -> Result<Matrix4<f64>, MotionError> {
        dh_chain::transform(&self.links, joints, from, to)
    }

    /// Position and orientation of the pen tip.
    pub fn forward_parts(&self, joints: &Joints) -> (Vector3<f64>, Matrix3<f64>) {
        let flange = dh_chain::flange(&self.links, joints);
        let rotation: Matrix3<f64> = flange.fixed_view::<3, 3>(0, 0).into_owned();
        let origin: Vector3<f64> = flange.fixed_view::<3, 1>(0, 3).into_owned();
        let tip = origin + rotation.column(2) * self.parameters.tool_length;
        (tip, rotation)
    }

    /// Solves the joints for the given orientation and position of the pen tip.
    /// If `previous` is given, branches closest to it are taken.
    pub fn solve(&self, orientation: &Matrix3<f64>, position: &Vector3<f64>,
                 previous: Option<&Joints>) -> IkSolution {
        let mut flags = IkFlags::NONE;

        let wrist_center = position - orientation.column(2) * self.parameters.tool_length;
        let [q1, q2, q3] = self.solve_arm(&wrist_center, previous, &mut flags);
        let [q4, q5, q6] = self.solve_wrist([q1, q2, q3], orientation, previous, &mut flags);

        if !flags.is_empty() {
            debug!("IK flags {:?} for position {:?}", flags, position);
        }

        IkSolution {
            joints: normalize_joints(&[q1, q2, q3, q4, q5, q6]),
            flags,
        }
    }

    /// Joints 1 to 3 placing the wrist centre. The arm is treated as a planar two link arm
    /// with effective link lengths, whose angles are then corrected for the link offsets.
    fn solve_arm(&self, wrist: &Vector3<f64>, previous: Option<&Joints>, flags: &mut IkFlags) -> [f64; 3] {
        let p = &self.parameters;
        let phi1 = p.upper_arm_angle();
        let phi2 = p.forearm_angle();
        let l2 = p.upper_arm_reach();
        let l3 = p.forearm_reach();

        let q1 = if wrist.x.hypot(wrist.y) < SHOULDER_THRESHOLD {
            flags.insert(IkFlags::SHOULDER_SINGULAR);
            previous.map_or(0.0, |prev| prev[J1])
        } else {
            f64::atan2(wrist.y, wrist.x)
        };

        let a = wrist.x * q1.cos() + wrist.y * q1.sin();
        let b = wrist.z - p.shoulder_height;

        let cos_elbow = (a * a + b * b - l2 * l2 - l3 * l3) / (2.0 * l2 * l3);
        if cos_elbow.abs() > 1.0 + REACH_TOLERANCE {
            flags.insert(IkFlags::ELBOW_CLAMPED);
        }
        let mut elbow = cos_elbow.clamp(-1.0, 1.0).acos();

        if let Some(prev) = previous {
            let prev_elbow = phi1 + phi2 - p.elbow_zero_offset - prev[J3];
            if unit_circle_distance(-elbow, prev_elbow) < unit_circle_distance(elbow, prev_elbow) {
                elbow = -elbow;
            }
        }

        let (se, ce) = elbow.sin_cos();
        let shoulder = f64::atan2(
            b * (l2 + l3 * ce) - a * l3 * se,
            a * (l2 + l3 * ce) + b * l3 * se,
        );

        let q2 = PI / 2.0 - phi1 - shoulder;
        let q3 = phi1 + phi2 - elbow - p.elbow_zero_offset;
        [q1, q2, q3]
    }

    /// Joints 4 to 6 of the spherical wrist.
    fn solve_wrist(&self, arm: [f64; 3], orientation: &Matrix3<f64>,
                   previous: Option<&Joints>, flags: &mut IkFlags) -> [f64; 3] {
        let joints = [arm[0], arm[1], arm[2], 0.0, 0.0, 0.0];
        let r_0_3 = dh_chain::base_rotation(&self.links, &joints, 3);
        let w = r_0_3.transpose() * orientation;

        let sin_q5 = w[(0, 2)].hypot(w[(2, 2)]);
        if sin_q5 < SINGULARITY_THRESHOLD {
            flags.insert(IkFlags::WRIST_SINGULAR);
            return self.singular_wrist(&w, previous);
        }

        let q4 = -f64::atan2(w[(2, 2)], w[(0, 2)]);
        let q5 = f64::atan2(sin_q5, w[(1, 2)]);
        let q6 = -f64::atan2(w[(1, 1)], w[(1, 0)]);

        let mut candidates: Vec<[f64; 3]> = Vec::with_capacity(8);
        for t4 in [q4, q4 + PI] {
            for t5 in [q5, -q5] {
                for t6 in [q6, q6 + PI] {
                    candidates.push([t4, t5, t6]);
                }
            }
        }

        let verified: Vec<[f64; 3]> = candidates
            .iter()
            .filter(|c| Self::matches_wrist(c, &w))
            .cloned()
            .collect();

        if verified.is_empty() {
            flags.insert(IkFlags::WRIST_FALLBACK);
            return candidates[0];
        }

        match previous {
            Some(prev) => {
                let prev_wrist = &prev[J4..=J6];
                verified
                    .iter()
                    .min_by(|a, b| {
                        angle_set_distance(&a[..], prev_wrist)
                            .total_cmp(&angle_set_distance(&b[..], prev_wrist))
                    })
                    .cloned()
                    .unwrap_or(verified[0])
            }
            None => verified[0],
        }
    }

    /// Checks the wrist candidate against the entries of the wrist rotation that
    /// depend on it.
    fn matches_wrist(candidate: &[f64; 3], w: &Matrix3<f64>) -> bool {
        let (s4, c4) = candidate[0].sin_cos();
        let (s5, _) = candidate[1].sin_cos();
        let (s6, c6) = candidate[2].sin_cos();

        (s5 * c6 - w[(1, 0)]).abs() <= WRIST_TOLERANCE
            && (s5 * s6 + w[(1, 1)]).abs() <= WRIST_TOLERANCE
            && (c4 * s5 + w[(0, 2)]).abs() <= WRIST_TOLERANCE
            && (s4 * s5 - w[(2, 2)]).abs() <= WRIST_TOLERANCE
    }

    /// With J5 at 0 or pi, J4 and J6 rotate about the same axis. J4 is kept where it was
    /// and J6 takes the remaining rotation.
    fn singular_wrist(&self, w: &Matrix3<f64>, previous: Option<&Joints>) -> [f64; 3] {
        let q4 = previous.map_or(0.0, |prev| prev[J4]);
        let q5 = if w[(1, 2)] >= 0.0 { 0.0 } else { PI };

        let partial = self.links[J4].rotation(q4)
            * self.links[J5].rotation(q5)
            * self.links[J6].rotation(0.0);
        let residual = partial.transpose() * w;
        let q6 = f64::atan2(residual[(1, 0)], residual[(0, 0)]);
        [q4, q5, q6]
    }
}

impl Kinematics for PenArmKinematics {
    fn inverse(&self, pose: &Pose) -> IkSolution {
        let rotation = pose.rotation.to_rotation_matrix().into_inner();
        self.solve(&rotation, &pose.translation.vector, None)
    }

    fn inverse_continuing(&self, pose: &Pose, previous: &Joints) -> IkSolution {
        let rotation = pose.rotation.to_rotation_matrix().into_inner();
        self.solve(&rotation, &pose.translation.vector, Some(previous))
    }

    fn forward(&self, joints: &Joints) -> Pose {
        let (tip, rotation) = self.forward_parts(joints);
        let rotation = Rotation3::from_matrix_unchecked(rotation);
        Pose::from_parts(Translation3::from(tip),
                         UnitQuaternion::from_rotation_matrix(&rotation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::JOINTS_AT_ZERO;
    use crate::utils::{angle_difference, assert_pose_eq, normalize_angle};
    use std::f64::consts::FRAC_1_SQRT_2;

    fn pen_down() -> Matrix3<f64> {
        Matrix3::new(1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0)
    }

    fn robot() -> PenArmKinematics {
        PenArmKinematics::new(Parameters::pen_arm())
    }

    #[test]
    fn test_forward_at_zero_golden() {
        let (tip, rotation) = robot().forward_parts(&JOINTS_AT_ZERO);
        assert!((tip - Vector3::new(278.194480196478, 0.0, 713.620887067671)).norm() < 1e-9,
                "Unexpected tip {:?}", tip);
        let expected = Matrix3::new(
            -FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2,
            0.0, -1.0, 0.0,
            FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2,
        );
        assert!((rotation - expected).amax() < 1e-12, "Unexpected rotation {}", rotation);
    }

    #[test]
    fn test_forward_pose_matches_parts() {
        let r = robot();
        let joints = [0.3, 0.2, -0.4, 0.7, 0.5, -0.2];
        let (tip, rotation) = r.forward_parts(&joints);
        let pose = r.forward(&joints);
        assert!((pose.translation.vector - tip).norm() < 1e-9);
        assert!((pose.rotation.to_rotation_matrix().into_inner() - rotation).amax() < 1e-9);
    }

    #[test]
    fn test_transform_between_frames() {
        let r = robot();
        let joints = [0.3, 0.2, -0.4, 0.7, 0.5, -0.2];
        let flange = r.transform(&joints, 6, 0).unwrap();
        assert!((flange - dh_chain::flange(r.links(), &joints)).amax() < 1e-12);
        let back = r.transform(&joints, 0, 6).unwrap();
        assert!((flange * back - Matrix4::identity()).amax() < 1e-9);
        assert_eq!(r.transform(&joints, 0, 7), Err(MotionError::FrameOutOfRange { frame: 7, max: 6 }));
    }

    #[test]
    fn test_inverse_recovers_joints() {
        let r = robot();
        let joints = [0.3, 0.4, 0.6, 0.7, 0.5, -0.2];
        let pose = r.forward(&joints);
        let solution = r.inverse_continuing(&pose, &joints);
        assert!(solution.is_reachable());
        for i in 0..6 {
            assert!((solution.joints[i] - joints[i]).abs() < 1e-7,
                    "Joint {} differs: {:?} vs {:?}", i, solution.joints, joints);
        }
    }

    #[test]
    fn test_inverse_without_previous_reaches_pose() {
        let r = robot();
        let joints = [-0.5, 0.9, 1.3, 1.047, 0.449, -0.785];
        let pose = r.forward(&joints);
        let solution = r.inverse(&pose);
        assert!(solution.is_reachable());
        assert_pose_eq(&pose, &r.forward(&solution.joints), 1e-6, 1e-6);
    }

    #[test]
    fn test_elbow_branch_follows_previous() {
        let r = robot();
        let joints = [0.2, 0.5, 0.9, 0.1, 0.6, 0.1];
        let pose = r.forward(&joints);
        let up = r.inverse_continuing(&pose, &joints);

        // Other elbow root, found by starting from the mirrored elbow.
        let p = r.parameters();
        let alpha3 = p.upper_arm_angle() + p.forearm_angle() - p.elbow_zero_offset - joints[J3];
        let mirrored = p.upper_arm_angle() + p.forearm_angle() + alpha3 - p.elbow_zero_offset;
        let hint = [joints[0], joints[1], mirrored, joints[3], joints[4], joints[5]];
        let down = r.inverse_continuing(&pose, &hint);

        assert!((up.joints[J3] - joints[J3]).abs() < 1e-7);
        assert!((down.joints[J3] - up.joints[J3]).abs() > 0.1);
        assert_pose_eq(&pose, &r.forward(&down.joints), 1e-6, 1e-6);
    }

    #[test]
    fn test_wrist_branch_follows_previous() {
        let r = robot();
        let joints = [0.2, 0.5, 0.9, 0.4, 0.6, -0.3];
        let pose = r.forward(&joints);

        // Flipped wrist: J4 + pi, -J5, J6 + pi gives the same orientation.
        let flipped = [joints[0], joints[1], joints[2],
            normalize_angle(joints[3] + PI), -joints[4], normalize_angle(joints[5] + PI)];
        let solution = r.inverse_continuing(&pose, &flipped);
        for i in J4..=J6 {
            assert!((solution.joints[i] - flipped[i]).abs() < 1e-7,
                    "Wrist joint {} differs: {:?} vs {:?}", i, solution.joints, flipped);
        }
        assert_pose_eq(&pose, &r.forward(&solution.joints), 1e-6, 1e-6);
    }

    #[test]
    fn test_wrist_singularity_keeps_j4() {
        let r = robot();
        let joints = [0.3, 0.2, -0.4, 0.7, 0.0, -0.2];
        let pose = r.forward(&joints);
        let previous = [0.3, 0.2, -0.4, 0.0, 0.1, 0.0];
        let solution = r.inverse_continuing(&pose, &previous);
        assert!(solution.flags.contains(IkFlags::WRIST_SINGULAR));
        assert!(solution.joints[J4].abs() < 1e-12);
        assert!((solution.joints[J6] - 0.5).abs() < 1e-7, "J4 + J6 must be preserved");
        assert_pose_eq(&pose, &r.forward(&solution.joints), 1e-6, 1e-6);
    }

    #[test]
    fn test_wrist_singularity_at_half_turn() {
        let r = robot();
        let joints = [0.3, 0.2, -0.4, 0.7, PI, -0.2];
        let pose = r.forward(&joints);
        let solution = r.inverse_continuing(&pose, &joints);
        assert!(solution.flags.contains(IkFlags::WRIST_SINGULAR));
        assert_eq!(solution.joints[J4], 0.7);
        assert_eq!(solution.joints[J5], PI);
        assert!((solution.joints[J6] - joints[J6]).abs() < 1e-7, "Got {:?}", solution.joints);
        assert_pose_eq(&pose, &r.forward(&solution.joints), 1e-6, 1e-6);
    }

    #[test]
    fn test_shoulder_singularity_keeps_j1() {
        let r = robot();
        // Pen pointing down right above the base puts the wrist centre on the J1 axis.
        let target = Vector3::new(0.0, 0.0, 436.0);
        let previous = [0.8, 0.3, 0.5, 0.1, 0.5, 0.2];

        let solution = r.solve(&pen_down(), &target, Some(&previous));
        assert!(solution.flags.contains(IkFlags::SHOULDER_SINGULAR));
        assert!(solution.is_reachable());
        assert_eq!(solution.joints[J1], 0.8);
        let (tip, rotation) = r.forward_parts(&solution.joints);
        assert!((tip - target).norm() < 1e-9, "Tip {:?}", tip);
        assert!((rotation - pen_down()).amax() < 1e-9, "Rotation {}", rotation);

        let solution = r.solve(&pen_down(), &target, None);
        assert!(solution.flags.contains(IkFlags::SHOULDER_SINGULAR));
        assert_eq!(solution.joints[J1], 0.0);
        let (tip, _) = r.forward_parts(&solution.joints);
        assert!((tip - target).norm() < 1e-9, "Tip {:?}", tip);
    }

    #[test]
    fn test_non_orthonormal_orientation_falls_back() {
        let r = robot();
        let skewed = Matrix3::new(1.0, 0.01, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0);
        let solution = r.solve(&skewed, &Vector3::new(250.0, 0.0, 120.0), None);
        assert!(solution.flags.contains(IkFlags::WRIST_FALLBACK));
        assert!(!solution.is_reachable());

        // The first candidate is the principal one, before any flips.
        let w = dh_chain::base_rotation(r.links(), &solution.joints, 3).transpose() * skewed;
        let expected = [
            -f64::atan2(w[(2, 2)], w[(0, 2)]),
            f64::atan2(w[(0, 2)].hypot(w[(2, 2)]), w[(1, 2)]),
            -f64::atan2(w[(1, 1)], w[(1, 0)]),
        ].map(normalize_angle);
        for (i, q) in expected.iter().enumerate() {
            assert!(angle_difference(*q, solution.joints[J4 + i]).abs() < 1e-9,
                    "Wrist {:?} vs {:?}", &solution.joints[J4..], expected);
        }
    }

    #[test]
    fn test_zero_configuration_round_trip() {
        let r = robot();
        let pose = r.forward(&JOINTS_AT_ZERO);
        let solution = r.inverse_continuing(&pose, &JOINTS_AT_ZERO);
        for q in solution.joints {
            assert!(q.abs() < 1e-9, "Expected zeros, got {:?}", solution.joints);
        }
    }

    #[test]
    fn test_unreachable_target_is_flagged() {
        let r = robot();
        let solution = r.solve(&pen_down(), &Vector3::new(2000.0, 0.0, 100.0), None);
        assert!(solution.flags.contains(IkFlags::ELBOW_CLAMPED));
        assert!(!solution.is_reachable());
        assert!(solution.joints.iter().all(|q| q.is_finite()));
    }

    #[test]
    fn test_angles_are_normalized() {
        let r = robot();
        let joints = [3.0, 0.4, 0.6, -3.0, 0.5, 3.1];
        let pose = r.forward(&joints);
        let solution = r.inverse_continuing(&pose, &joints);
        for q in solution.joints {
            assert!(q > -PI && q <= PI);
        }
        assert_pose_eq(&pose, &r.forward(&solution.joints), 1e-6, 1e-6);
    }
}
