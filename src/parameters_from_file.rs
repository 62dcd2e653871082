//! Supports reading arm parameters and writing configuration from YAML files (optional)

use std::path::Path;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use yaml_rust2::{Yaml, YamlLoader};

use crate::parameter_error::ParameterError;
use crate::parameters::pen_kinematics::Parameters;
use crate::writing_config::{Bounds, WritingConfig};

impl Parameters {
    /// Read the arm geometry from YAML file. YAML file like this is supported:
    /// ```yaml
    /// # Desktop pen writing arm, millimeters
    /// pen_arm_geometric_parameters:
    ///   shoulder_height: 159
    ///   upper_arm_length: 264
    ///   upper_arm_offset: 30
    ///   forearm_length: 258
    ///   forearm_offset: 30
    ///   tool_length: 123
    /// pen_arm_elbow_zero_offset: deg(45.0)
    /// ```
    /// The elbow zero offset is optional and defaults to zero. Angles are radians unless
    /// written as deg(angle).
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let doc = load(contents)?;
        let params = &doc["pen_arm_geometric_parameters"];
        if params.is_badvalue() {
            return Err(ParameterError::MissingField("pen_arm_geometric_parameters".to_string()));
        }

        let length = |field: &str| -> Result<f64, ParameterError> {
            let value = required_number(params, field)?;
            if value < 0.0 {
                return Err(ParameterError::ParseError(format!("{} must not be negative (got {})", field, value)));
            }
            Ok(value)
        };

        let elbow_zero_offset = match &doc["pen_arm_elbow_zero_offset"] {
            Yaml::BadValue => 0.0,
            value => angle(value, "pen_arm_elbow_zero_offset")?,
        };

        Ok(Parameters {
            shoulder_height: length("shoulder_height")?,
            upper_arm_length: length("upper_arm_length")?,
            upper_arm_offset: length("upper_arm_offset")?,
            forearm_length: length("forearm_length")?,
            forearm_offset: length("forearm_offset")?,
            tool_length: length("tool_length")?,
            elbow_zero_offset,
        })
    }
}

impl WritingConfig {
    /// Read the writing configuration from YAML file. All fields are optional, missing ones
    /// keep their default values:
    /// ```yaml
    /// writing:
    ///   frequency: 50
    ///   lift_height: 10
    ///   lift_duration: 0.5
    ///   move_duration: 1.0
    ///   epsilon: 0.000001
    ///   letter_pitch: 100
    ///   bounds:
    ///     min: [0, 0, 0]
    ///     max: [400, 100, 0]
    ///   canvas:
    ///     origin: [150, -50, 100]
    ///     rotation: [0, 0, deg(90)] # roll, pitch, yaw
    /// ```
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, ParameterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ParameterError> {
        let doc = load(contents)?;
        let writing = &doc["writing"];
        let mut config = WritingConfig::default();
        if writing.is_badvalue() {
            return Ok(config);
        }

        let positive = |field: &str, default: f64| -> Result<f64, ParameterError> {
            let value = optional_number(writing, field)?.unwrap_or(default);
            if !(value > 0.0) {
                return Err(ParameterError::ParseError(format!("{} must be positive (got {})", field, value)));
            }
            Ok(value)
        };

        config.frequency = positive("frequency", config.frequency)?;
        config.lift_height = optional_number(writing, "lift_height")?.unwrap_or(config.lift_height);
        config.lift_duration = positive("lift_duration", config.lift_duration)?;
        config.move_duration = positive("move_duration", config.move_duration)?;
        config.epsilon = positive("epsilon", config.epsilon)?;
        config.letter_pitch = optional_number(writing, "letter_pitch")?.unwrap_or(config.letter_pitch);

        let bounds = &writing["bounds"];
        if !bounds.is_badvalue() {
            config.bounds = Some(Bounds::new(
                vector(&bounds["min"], "bounds.min")?,
                vector(&bounds["max"], "bounds.max")?,
            ));
        }

        let canvas = &writing["canvas"];
        if !canvas.is_badvalue() {
            let origin = match &canvas["origin"] {
                Yaml::BadValue => config.canvas.translation.vector,
                value => vector(value, "canvas.origin")?,
            };
            let rotation = match &canvas["rotation"] {
                Yaml::BadValue => config.canvas.rotation,
                value => {
                    let rpy = angles(value, "canvas.rotation")?;
                    UnitQuaternion::from_euler_angles(rpy[0], rpy[1], rpy[2])
                }
            };
            config.canvas = Isometry3::from_parts(Translation3::from(origin), rotation);
        }

        Ok(config)
    }
}

fn load(contents: &str) -> Result<Yaml, ParameterError> {
    let mut docs = YamlLoader::load_from_str(contents)
        .map_err(|e| ParameterError::ParseError(format!("{}", e)))?;
    if docs.is_empty() {
        return Err(ParameterError::ParseError("Empty YAML document".to_string()));
    }
    Ok(docs.swap_remove(0))
}

fn number(value: &Yaml, field: &str) -> Result<f64, ParameterError> {
    match value {
        Yaml::Integer(i) => Ok(*i as f64),
        Yaml::Real(_) => value.as_f64()
            .ok_or_else(|| ParameterError::ParseError(format!("{} is not a number", field))),
        _ => Err(ParameterError::ParseError(format!("{} must be a number", field))),
    }
}

fn required_number(parent: &Yaml, field: &str) -> Result<f64, ParameterError> {
    match &parent[field] {
        Yaml::BadValue => Err(ParameterError::MissingField(field.to_string())),
        value => number(value, field),
    }
}

fn optional_number(parent: &Yaml, field: &str) -> Result<Option<f64>, ParameterError> {
    match &parent[field] {
        Yaml::BadValue => Ok(None),
        value => number(value, field).map(Some),
    }
}

/// Angle in radians, or in degrees if written as deg(angle).
fn angle(value: &Yaml, field: &str) -> Result<f64, ParameterError> {
    match value {
        Yaml::String(text) => {
            let inner = text.trim()
                .strip_prefix("deg(")
                .and_then(|rest| rest.strip_suffix(')'))
                .ok_or_else(|| ParameterError::WrongAngle(format!("{}: {}", field, text)))?;
            inner.trim().parse::<f64>()
                .map(f64::to_radians)
                .map_err(|_| ParameterError::WrongAngle(format!("{}: {}", field, text)))
        }
        _ => number(value, field),
    }
}

fn array<'a>(value: &'a Yaml, field: &str, expected: usize) -> Result<&'a Vec<Yaml>, ParameterError> {
    match value {
        Yaml::Array(items) if items.len() == expected => Ok(items),
        Yaml::Array(items) => Err(ParameterError::InvalidLength { expected, found: items.len() }),
        Yaml::BadValue => Err(ParameterError::MissingField(field.to_string())),
        _ => Err(ParameterError::ParseError(format!("{} must be a list", field))),
    }
}

fn vector(value: &Yaml, field: &str) -> Result<Vector3<f64>, ParameterError> {
    let items = array(value, field, 3)?;
    Ok(Vector3::new(number(&items[0], field)?, number(&items[1], field)?, number(&items[2], field)?))
}

fn angles(value: &Yaml, field: &str) -> Result<[f64; 3], ParameterError> {
    let items = array(value, field, 3)?;
    Ok([angle(&items[0], field)?, angle(&items[1], field)?, angle(&items[2], field)?])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_parameters_from_yaml_str() {
        let yaml = "pen_arm_geometric_parameters:\n  \
            shoulder_height: 159\n  upper_arm_length: 264.0\n  upper_arm_offset: 30\n  \
            forearm_length: 258\n  forearm_offset: 30\n  tool_length: 123.5\n\
            pen_arm_elbow_zero_offset: deg(45.0)\n";
        let parameters = Parameters::from_yaml_str(yaml).unwrap();
        assert_eq!(parameters.shoulder_height, 159.0);
        assert_eq!(parameters.tool_length, 123.5);
        assert!((parameters.elbow_zero_offset - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_to_yaml_reads_back() {
        let original = Parameters::pen_arm();
        let parameters = Parameters::from_yaml_str(&original.to_yaml()).unwrap();
        assert_eq!(parameters.forearm_length, original.forearm_length);
        assert!((parameters.elbow_zero_offset - original.elbow_zero_offset).abs() < 1e-6);
    }

    #[test]
    fn test_missing_field() {
        let yaml = "pen_arm_geometric_parameters:\n  shoulder_height: 159\n";
        assert!(matches!(Parameters::from_yaml_str(yaml),
            Err(ParameterError::MissingField(field)) if field == "upper_arm_length"));
        assert!(matches!(Parameters::from_yaml_str("other: 1\n"), Err(ParameterError::MissingField(_))));
    }

    #[test]
    fn test_wrong_angle() {
        let yaml = "pen_arm_geometric_parameters:\n  \
            shoulder_height: 159\n  upper_arm_length: 264\n  upper_arm_offset: 30\n  \
            forearm_length: 258\n  forearm_offset: 30\n  tool_length: 123\n\
            pen_arm_elbow_zero_offset: grad(50)\n";
        assert!(matches!(Parameters::from_yaml_str(yaml), Err(ParameterError::WrongAngle(_))));
    }

    #[test]
    fn test_writing_config_defaults_kept() {
        let config = WritingConfig::from_yaml_str("writing:\n  frequency: 100\n").unwrap();
        assert_eq!(config.frequency, 100.0);
        assert_eq!(config.lift_height, WritingConfig::default().lift_height);
        assert_eq!(config.canvas, WritingConfig::default().canvas);
        assert!(config.bounds.is_none());
    }

    #[test]
    fn test_writing_config_rejects_bad_values() {
        assert!(matches!(WritingConfig::from_yaml_str("writing:\n  frequency: 0\n"),
            Err(ParameterError::ParseError(_))));
        assert!(matches!(WritingConfig::from_yaml_str("writing:\n  bounds:\n    min: [0, 0]\n    max: [1, 1, 1]\n"),
            Err(ParameterError::InvalidLength { expected: 3, found: 2 })));
    }
}
