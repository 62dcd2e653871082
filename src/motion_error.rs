//! Errors reported when constructing strokes, letters, strings and joint trajectories

/// Contract violations detected while building motions. None of these is recoverable,
/// the caller must supply corrected input.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Positions and timestamps have different lengths.
    LengthMismatch { positions: usize, times: usize },
    /// Fewer than two waypoints.
    TooFewWaypoints(usize),
    /// Timestamp at the given index is not above the previous one.
    NonIncreasingTime { index: usize },
    /// A waypoint coordinate or timestamp is NaN or infinite.
    NonFinite { index: usize },
    /// Sampling frequency must be finite and positive.
    InvalidFrequency(f64),
    /// Waypoint at the given index is outside the configured bounding box.
    OutOfBounds { index: usize },
    /// Move at the given index does not start where the previous one ends.
    Discontinuity { index: usize, gap: f64 },
    /// Letter without strokes or string without letters.
    EmptyComposition(String),
    /// Frame index beyond the last frame of the chain.
    FrameOutOfRange { frame: usize, max: usize },
    /// Per-sample orientations do not match the number of samples.
    OrientationCount { expected: usize, found: usize },
    /// Writing configuration or letter pitch outside its valid range.
    InvalidConfig(String),
}

impl std::fmt::Display for MotionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            MotionError::LengthMismatch { positions, times } =>
                write!(f, "Length mismatch: {} positions but {} timestamps", positions, times),
            MotionError::TooFewWaypoints(found) =>
                write!(f, "At least two waypoints are required, found {}", found),
            MotionError::NonIncreasingTime { index } =>
                write!(f, "Timestamps must be strictly increasing, violated at index {}", index),
            MotionError::NonFinite { index } =>
                write!(f, "Waypoint {} contains a non-finite value", index),
            MotionError::InvalidFrequency(frequency) =>
                write!(f, "Invalid sampling frequency: {}", frequency),
            MotionError::OutOfBounds { index } =>
                write!(f, "Waypoint {} is outside the bounding box", index),
            MotionError::Discontinuity { index, gap } =>
                write!(f, "Move {} must start where move {} ends (gap {:.6})", index, index.saturating_sub(1), gap),
            MotionError::EmptyComposition(ref what) =>
                write!(f, "Nothing to compose: {}", what),
            MotionError::FrameOutOfRange { frame, max } =>
                write!(f, "Frame {} is out of range, the last frame is {}", frame, max),
            MotionError::OrientationCount { expected, found } =>
                write!(f, "Expected {} orientations, found {}", expected, found),
            MotionError::InvalidConfig(ref what) =>
                write!(f, "Invalid writing configuration: {}", what),
        }
    }
}

impl std::error::Error for MotionError {}
