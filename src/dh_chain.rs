//! Homogeneous transforms along the modified Denavit-Hartenberg chain.
//!
//! Frames are numbered 0 (base) to 6 (flange of the last joint). The transform of link `i`
//! maps coordinates of frame `i` into frame `i - 1`.

use nalgebra::{Matrix3, Matrix4, Vector3};

use crate::kinematic_traits::Joints;
use crate::motion_error::MotionError;
use crate::parameters::pen_kinematics::DhLink;

/// Index of the last frame of the chain.
pub const LAST_FRAME: usize = 6;

impl DhLink {
    /// Transform of this link for the given joint value, `Rx(alpha) Tx(a) Rz(theta) Tz(d)`.
    pub fn transform(&self, q: f64) -> Matrix4<f64> {
        let theta = q + self.theta_offset;
        let (st, ct) = theta.sin_cos();
        let (sa, ca) = self.alpha.sin_cos();

        Matrix4::new(
            ct, -st, 0.0, self.a,
            st * ca, ct * ca, -sa, -self.d * sa,
            st * sa, ct * sa, ca, self.d * ca,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation part of the link transform only.
    pub fn rotation(&self, q: f64) -> Matrix3<f64> {
        self.transform(q).fixed_view::<3, 3>(0, 0).into_owned()
    }
}

/// Exact inverse of a rigid homogeneous transform: `[R^T, -R^T p]`.
pub fn rigid_inverse(m: &Matrix4<f64>) -> Matrix4<f64> {
    let rt: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).transpose();
    let p: Vector3<f64> = m.fixed_view::<3, 1>(0, 3).into_owned();

    let mut inverse = Matrix4::identity();
    inverse.fixed_view_mut::<3, 3>(0, 0).copy_from(&rt);
    inverse.fixed_view_mut::<3, 1>(0, 3).copy_from(&(-rt * p));
    inverse
}

/// Product of the link transforms `first + 1 ..= last`, the pose of frame `last` in frame `first`.
fn compose(links: &[DhLink; 6], joints: &Joints, first: usize, last: usize) -> Matrix4<f64> {
    (first..last).fold(Matrix4::identity(), |acc, i| acc * links[i].transform(joints[i]))
}

/// Transform between two frames of the chain.
///
/// If `from` is downstream of `to` (`from > to`), the returned matrix is the pose of frame `from`
/// expressed in frame `to`, obtained by multiplying the link transforms in chain order. If `from`
/// is upstream, the chain between the frames is composed and then inverted algebraically, so
/// that `transform(a, b)` is the exact inverse of `transform(b, a)`.
pub fn transform(links: &[DhLink; 6], joints: &Joints, from: usize, to: usize) -> Result<Matrix4<f64>, MotionError> {
    for frame in [from, to] {
        if frame > LAST_FRAME {
            return Err(MotionError::FrameOutOfRange { frame, max: LAST_FRAME });
        }
    }
    if from >= to {
        Ok(compose(links, joints, to, from))
    } else {
        Ok(rigid_inverse(&compose(links, joints, from, to)))
    }
}

/// Pose of the last frame in the base frame.
pub fn flange(links: &[DhLink; 6], joints: &Joints) -> Matrix4<f64> {
    compose(links, joints, 0, LAST_FRAME)
}

/// Rotation of frame `last` in the base frame, using only the first `last` joints.
pub fn base_rotation(links: &[DhLink; 6], joints: &Joints, last: usize) -> Matrix3<f64> {
    (0..last.min(LAST_FRAME)).fold(Matrix3::identity(), |acc, i| acc * links[i].rotation(joints[i]))
}
