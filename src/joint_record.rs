//! Text formats of joint trajectories.
//!
//! The record lists all angles of one joint after its label, in degrees, joints separated by `;`:
//! ```text
//! J1:0.0000,1.2500,2.5000;J2:...;J6:...
//! ```
//! The datagram payload carries the six angles of a single sample in degrees, comma separated.

use crate::joint_driver::JointTrajectory;
use crate::kinematic_traits::Joints;
use crate::parameter_error::ParameterError;

const LABELS: [&str; 6] = ["J1", "J2", "J3", "J4", "J5", "J6"];

fn format_degrees(radians: f64) -> String {
    format!("{:.4}", radians.to_degrees())
}

/// Formats the joints of all samples as a joint record.
pub fn to_record(joints: &[Joints]) -> String {
    LABELS.iter().enumerate()
        .map(|(j, label)| {
            let values: Vec<String> = joints.iter().map(|q| format_degrees(q[j])).collect();
            format!("{}:{}", label, values.join(","))
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Joint record of a driven trajectory.
pub fn trajectory_record(trajectory: &JointTrajectory) -> String {
    to_record(&trajectory.joints())
}

/// Parses a joint record back into joint configurations, in radians.
pub fn parse_record(record: &str) -> Result<Vec<Joints>, ParameterError> {
    let parts: Vec<&str> = record.trim().split(';').collect();
    if parts.len() != LABELS.len() {
        return Err(ParameterError::InvalidLength { expected: LABELS.len(), found: parts.len() });
    }

    let mut columns: Vec<Vec<f64>> = Vec::with_capacity(LABELS.len());
    for (part, label) in parts.iter().zip(LABELS) {
        let (found, values) = part.split_once(':')
            .ok_or_else(|| ParameterError::ParseError(format!("No label in '{}'", part)))?;
        if found.trim() != label {
            return Err(ParameterError::MissingField(label.to_string()));
        }
        let column = if values.trim().is_empty() {
            Vec::new()
        } else {
            values.split(',')
                .map(parse_degrees)
                .collect::<Result<Vec<f64>, ParameterError>>()?
        };
        if let Some(first) = columns.first() {
            if column.len() != first.len() {
                return Err(ParameterError::InvalidLength { expected: first.len(), found: column.len() });
            }
        }
        columns.push(column);
    }

    let samples = columns[0].len();
    Ok((0..samples)
        .map(|i| std::array::from_fn(|j| columns[j][i]))
        .collect())
}

fn parse_degrees(value: &str) -> Result<f64, ParameterError> {
    value.trim().parse::<f64>()
        .map(f64::to_radians)
        .map_err(|e| ParameterError::ParseError(format!("'{}': {}", value.trim(), e)))
}

/// Payload streamed to the controller for one sample.
pub fn datagram_payload(joints: &Joints) -> String {
    joints.iter().map(|q| format_degrees(*q)).collect::<Vec<_>>().join(",")
}

/// Writes the joint record of the trajectory to the given file.
#[cfg(feature = "allow_filesystem")]
pub fn write_record<P: AsRef<std::path::Path>>(path: P, trajectory: &JointTrajectory) -> Result<(), ParameterError> {
    std::fs::write(path, trajectory_record(trajectory))?;
    Ok(())
}

/// Reads a joint record from the given file.
#[cfg(feature = "allow_filesystem")]
pub fn read_record<P: AsRef<std::path::Path>>(path: P) -> Result<Vec<Joints>, ParameterError> {
    let contents = std::fs::read_to_string(path)?;
    parse_record(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::as_radians;

    #[test]
    fn test_record_format() {
        let joints = vec![as_radians([0, 10, 20, 30, 40, 50]), as_radians([1, -10, 90, 0, 180, -45])];
        assert_eq!(
            to_record(&joints),
            "J1:0.0000,1.0000;J2:10.0000,-10.0000;J3:20.0000,90.0000;\
             J4:30.0000,0.0000;J5:40.0000,180.0000;J6:50.0000,-45.0000"
        );
    }

    #[test]
    fn test_parse_record() {
        let joints = vec![[0.1, -0.2, 0.3, -0.4, 0.5, -0.6], [1.0, 2.0, 3.0, -1.0, -2.0, -3.0]];
        let parsed = parse_record(&to_record(&joints)).unwrap();
        assert_eq!(parsed.len(), 2);
        for (a, b) in parsed.iter().zip(&joints) {
            for j in 0..6 {
                // Four decimals of a degree.
                assert!((a[j] - b[j]).abs() < 1e-5_f64.to_radians() * 10.0);
            }
        }
        assert!(parse_record(&to_record(&[])).unwrap().is_empty());
    }

    #[test]
    fn test_parse_record_errors() {
        assert!(matches!(parse_record("J1:0;J2:0"),
            Err(ParameterError::InvalidLength { expected: 6, found: 2 })));
        assert!(matches!(parse_record("J1:0;J2:0;J3:0;J4:0;J5:0;J7:0"),
            Err(ParameterError::MissingField(_))));
        assert!(matches!(parse_record("J1:0;J2:0;J3:0;J4:0;J5:0;J6:0,1"),
            Err(ParameterError::InvalidLength { expected: 1, found: 2 })));
        assert!(matches!(parse_record("J1:0;J2:x;J3:0;J4:0;J5:0;J6:0"),
            Err(ParameterError::ParseError(_))));
    }

    #[test]
    fn test_datagram_payload() {
        let joints = as_radians([15, 0, -30, 90, 0, 180]);
        assert_eq!(datagram_payload(&joints), "15.0000,0.0000,-30.0000,90.0000,0.0000,180.0000");
    }
}
