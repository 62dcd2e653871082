//! Defines the arm parameter data structure and the DH table derived from it

pub mod pen_kinematics {
    use crate::utils::deg;
    use std::f64::consts::PI;

    /// One row of the modified (Craig) Denavit-Hartenberg table. The transform of the link is
    /// `Rx(alpha) * Tx(a) * Rz(theta) * Tz(d)` with `theta = q + theta_offset`.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct DhLink {
        /// Twist angle between the previous and this joint axis.
        pub alpha: f64,

        /// Link length along the previous x axis.
        pub a: f64,

        /// Link offset along this z axis.
        pub d: f64,

        /// Constant added to the joint angle.
        pub theta_offset: f64,
    }

    /// Parameters for the kinematic model of the writing arm. The DH table and the
    /// constants of the analytic inverse are both derived from these values, so that
    /// forward and inverse kinematics can never disagree about the geometry.
    #[derive(Debug, Clone, Copy)]
    pub struct Parameters {
        /// Height of the shoulder (joint 2 axis) above the base.
        pub shoulder_height: f64,

        /// Length of the upper arm between joint 2 and joint 3.
        pub upper_arm_length: f64,

        /// Small perpendicular offset of the upper arm.
        pub upper_arm_offset: f64,

        /// Length of the forearm from joint 3 to the wrist centre.
        pub forearm_length: f64,

        /// Small perpendicular offset of the forearm.
        pub forearm_offset: f64,

        /// Distance from the wrist centre to the pen tip along the last joint axis.
        pub tool_length: f64,

        /// Angle of the forearm against the upper arm when joint 3 reads zero.
        pub elbow_zero_offset: f64,
    }

    impl Parameters {
        /// The desktop arm used for pen writing, millimeters.
        pub fn pen_arm() -> Self {
            Parameters {
                shoulder_height: 159.0,
                upper_arm_length: 264.0,
                upper_arm_offset: 30.0,
                forearm_length: 258.0,
                forearm_offset: 30.0,
                tool_length: 123.0,
                elbow_zero_offset: PI / 4.0,
            }
        }

        /// Effective (straight) length of the upper arm.
        pub fn upper_arm_reach(&self) -> f64 {
            self.upper_arm_offset.hypot(self.upper_arm_length)
        }

        /// Effective (straight) length of the forearm.
        pub fn forearm_reach(&self) -> f64 {
            self.forearm_offset.hypot(self.forearm_length)
        }

        /// Corrective angle of the upper arm caused by its offset.
        pub fn upper_arm_angle(&self) -> f64 {
            f64::atan2(self.upper_arm_offset, self.upper_arm_length)
        }

        /// Corrective angle of the forearm caused by its offset.
        pub fn forearm_angle(&self) -> f64 {
            f64::atan2(self.forearm_offset, self.forearm_length)
        }

        /// The six DH rows of the arm.
        pub fn dh_links(&self) -> [DhLink; 6] {
            let arm_angle = self.upper_arm_angle();
            [
                DhLink { alpha: 0.0, a: 0.0, d: self.shoulder_height, theta_offset: 0.0 },
                DhLink { alpha: -PI / 2.0, a: 0.0, d: 0.0, theta_offset: -PI / 2.0 + arm_angle },
                DhLink {
                    alpha: 0.0,
                    a: self.upper_arm_reach(),
                    d: 0.0,
                    theta_offset: -self.elbow_zero_offset - arm_angle,
                },
                DhLink { alpha: -PI / 2.0, a: self.forearm_offset, d: self.forearm_length, theta_offset: 0.0 },
                DhLink { alpha: PI / 2.0, a: 0.0, d: 0.0, theta_offset: 0.0 },
                DhLink { alpha: -PI / 2.0, a: 0.0, d: 0.0, theta_offset: 0.0 },
            ]
        }

        /// Convert to string yaml representation (quick viewing, etc).
        pub fn to_yaml(&self) -> String {
            format!(
                "pen_arm_geometric_parameters:\n  \
              shoulder_height: {}\n  \
              upper_arm_length: {}\n  \
              upper_arm_offset: {}\n  \
              forearm_length: {}\n  \
              forearm_offset: {}\n  \
              tool_length: {}\n\
            pen_arm_elbow_zero_offset: {}\n",
                self.shoulder_height,
                self.upper_arm_length,
                self.upper_arm_offset,
                self.forearm_length,
                self.forearm_offset,
                self.tool_length,
                deg(&self.elbow_zero_offset),
            )
        }
    }

    impl Default for Parameters {
        fn default() -> Self {
            Self::pen_arm()
        }
    }
}
