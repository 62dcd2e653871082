//! Rust implementation of forward and inverse kinematics for a six-axis pen writing arm, with
//! cubic trajectory generation and composition of strokes into letters and strings of letters.
//!
//! # Features
//!
//! - Forward kinematics composes the modified Denavit-Hartenberg table of the arm. Transforms
//!   between any two frames of the chain are available, upstream ones as exact rigid inverses.
//! - Inverse kinematics is analytic and returns exactly one solution. If the previous joint
//!   positions are provided, the elbow and wrist branches closest to them are taken, so that
//!   dense paths produce no unnecessary jumps.
//! - Singularities (wrist centre on the J1 axis, J5 = 0 or J5 = ±180°) keep the previous values of
//!   the undetermined joints. Unreachable targets are clamped and reported with flags, never
//!   with errors.
//! - Timed waypoints are turned into dense position, velocity and acceleration samples by
//!   a piecewise cubic that passes through every waypoint and starts and ends at rest.
//! - Strokes are composed into letters and letters into strings, with pen lifts inserted
//!   between strokes that do not touch. Time always increases and the pen never jumps.
//! - The joint space driver walks the composed trajectory through the inverse kinematics,
//!   carrying the previous solution forward, and can verify every solution with the forward
//!   kinematics.
//!
//! # Parameters
//!
//! The arm is described by its shoulder height, upper arm and forearm lengths with their small
//! perpendicular offsets, the length of the pen and the zero offset of the elbow. To use the
//! library, fill out a `pen_kinematics::Parameters` data structure or use `Parameters::pen_arm()`.
//!
//! ```
//! use rs_pen_kinematics::kinematic_traits::{Kinematics, JOINTS_AT_ZERO};
//! use rs_pen_kinematics::kinematics_impl::PenArmKinematics;
//! use rs_pen_kinematics::parameters::pen_kinematics::Parameters;
//!
//! let robot = PenArmKinematics::new(Parameters::pen_arm());
//! let pose = robot.forward(&JOINTS_AT_ZERO);
//! let solution = robot.inverse_continuing(&pose, &JOINTS_AT_ZERO);
//! assert!(solution.is_reachable());
//! ```

pub mod parameters;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;
pub mod parameter_error;
pub mod motion_error;

#[path = "utils/utils.rs"]
pub mod utils;
pub mod kinematic_traits;
pub mod dh_chain;
pub mod kinematics_impl;

pub mod annotations;
pub mod trajectory;
pub mod writing_config;
pub mod stroke;
pub mod letter;
pub mod joint_driver;
pub mod joint_record;
