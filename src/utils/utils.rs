//! Helper functions

use crate::kinematic_traits::Joints;
use nalgebra::{Isometry3, UnitQuaternion};
use std::f64::consts::PI;

/// Checks the solution for validity.
pub(crate) mod pen_kinematics {
    use crate::kinematic_traits::Joints;

    /// Checks if all elements in the array are finite
    pub fn is_valid(qs: &Joints) -> bool {
        qs.iter().all(|&q| q.is_finite())
    }
}

/// Wraps the angle into (-pi, pi].
pub fn normalize_angle(angle: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let wrapped = angle % two_pi;
    if wrapped > PI {
        wrapped - two_pi
    } else if wrapped <= -PI {
        wrapped + two_pi
    } else {
        wrapped
    }
}

/// Normalizes all joints into (-pi, pi].
pub fn normalize_joints(joints: &Joints) -> Joints {
    joints.map(normalize_angle)
}

/// Signed shortest rotation from `from` to `to`, in (-pi, pi].
pub fn angle_difference(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Distance between two angles measured on their sine/cosine components, so that
/// angles differing by a full turn are identical.
pub fn unit_circle_distance(a: f64, b: f64) -> f64 {
    (a.sin() - b.sin()).abs() + (a.cos() - b.cos()).abs()
}

/// Angular distance between two sets of angles as the negated sum of the dot products of
/// their unit vectors. Smaller is closer, identical sets of n angles give -n.
pub fn angle_set_distance(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "Expected same number of angles");
    -a.iter().zip(b).map(|(x, y)| (x - y).cos()).sum::<f64>()
}

/// Print joint values, converting radians to degrees.
pub fn dump_joints(joints: &Joints) {
    let row: Vec<String> = to_degrees(joints).iter()
        .map(|degrees| format!("{:5.2}", degrees))
        .collect();
    println!("[{}]", row.join(" "));
}

pub fn dump_pose(isometry: &Isometry3<f64>) {
    let translation = isometry.translation.vector;
    let rotation: UnitQuaternion<f64> = isometry.rotation;

    println!(
        "x: {:.5}, y: {:.5}, z: {:.5},  quat: {:.5},{:.5},{:.5},{:.5}",
        translation.x, translation.y, translation.z, rotation.i, rotation.j, rotation.k, rotation.w
    );
}

/// Allows to specify joint values in degrees (converts to radians)
#[allow(dead_code)]
pub fn as_radians(degrees: [i32; 6]) -> Joints {
    std::array::from_fn(|i| (degrees[i] as f64).to_radians())
}

/// Convert joints that are array of f64's in radians to degrees
pub fn to_degrees(angles: &Joints) -> Joints {
    angles.map(f64::to_degrees)
}

/// formatting for YAML output
pub(crate) fn deg(x: &f64) -> String {
    if *x == 0.0 {
        return "0".to_string();
    }
    format!("deg({:.4})", x.to_degrees())
}

/// Translation and rotation distance between two poses.
pub fn pose_distance(ta: &Isometry3<f64>, tb: &Isometry3<f64>) -> (f64, f64) {
    let translation_distance = (ta.translation.vector - tb.translation.vector).norm();
    let angular_distance = ta.rotation.angle_to(&tb.rotation);
    (translation_distance, angular_distance)
}

pub fn assert_pose_eq(ta: &Isometry3<f64>, tb: &Isometry3<f64>,
                      distance_tolerance: f64, angular_tolerance: f64) -> bool {
    fn bad(ta: &Isometry3<f64>, tb: &Isometry3<f64>) {
        dump_pose(ta);
        dump_pose(tb);
    }

    let (translation_distance, angular_distance) = pose_distance(ta, tb);

    if translation_distance > distance_tolerance {
        bad(ta, tb);
        panic!("Poses have too different translations: {}", translation_distance);
    }

    if angular_distance > angular_tolerance {
        bad(ta, tb);
        panic!("Poses have too different angles: {}", angular_distance);
    }
    true
}
