//! Piecewise cubic trajectories through timed waypoints.
//!
//! Every axis is fitted independently with one cubic per pair of consecutive waypoints. The
//! velocity is zero at the first and the last waypoint and equals the mean of the incoming and
//! outgoing secant velocities at every interior waypoint. This makes position and velocity
//! continuous; acceleration may jump at the waypoints.

use nalgebra::Vector3;

use crate::annotations::PathFlags;
use crate::motion_error::MotionError;

/// Absorbs floating point error when computing the number of samples.
const SAMPLE_COUNT_GUARD: f64 = 1e-9;

/// Timed position the trajectory must pass through exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub position: Vector3<f64>,
    pub time: f64,
}

impl Waypoint {
    pub fn new(position: Vector3<f64>, time: f64) -> Self {
        Waypoint { position, time }
    }
}

/// Position, velocity and acceleration at some instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub acceleration: Vector3<f64>,
}

/// `p(s) = a + b s + c s^2 + d s^3` with `s` the time since the start of the segment.
#[derive(Debug, Clone, Copy)]
struct CubicSegment {
    start: f64,
    end: f64,
    a: Vector3<f64>,
    b: Vector3<f64>,
    c: Vector3<f64>,
    d: Vector3<f64>,
}

impl CubicSegment {
    /// Hermite form: boundary positions and boundary velocities.
    fn new(from: &Waypoint, to: &Waypoint, v_from: &Vector3<f64>, v_to: &Vector3<f64>) -> Self {
        let h = to.time - from.time;
        let dp = to.position - from.position;
        CubicSegment {
            start: from.time,
            end: to.time,
            a: from.position,
            b: *v_from,
            c: (dp * 3.0 / h - v_from * 2.0 - v_to) / h,
            d: (-dp * 2.0 / h + v_from + v_to) / (h * h),
        }
    }

    fn evaluate(&self, t: f64) -> Sample {
        let s = t - self.start;
        Sample {
            time: t,
            position: self.a + self.b * s + self.c * (s * s) + self.d * (s * s * s),
            velocity: self.b + self.c * (2.0 * s) + self.d * (3.0 * s * s),
            acceleration: self.c * 2.0 + self.d * (6.0 * s),
        }
    }
}

/// Fitted cubic curve through all waypoints.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    segments: Vec<CubicSegment>,
}

impl CubicSpline {
    /// Fits the spline. At least two waypoints with strictly increasing finite times are required.
    pub fn new(waypoints: &[Waypoint]) -> Result<Self, MotionError> {
        validate(waypoints)?;

        let n = waypoints.len();
        let mut velocities = vec![Vector3::zeros(); n];
        for i in 1..n - 1 {
            let incoming = secant(&waypoints[i - 1], &waypoints[i]);
            let outgoing = secant(&waypoints[i], &waypoints[i + 1]);
            velocities[i] = (incoming + outgoing) / 2.0;
        }

        let segments = (0..n - 1)
            .map(|i| CubicSegment::new(&waypoints[i], &waypoints[i + 1],
                                       &velocities[i], &velocities[i + 1]))
            .collect();
        Ok(CubicSpline { segments })
    }

    /// Fits the spline through separate position and time lists of equal length.
    pub fn from_parts(positions: &[Vector3<f64>], times: &[f64]) -> Result<Self, MotionError> {
        if positions.len() != times.len() {
            return Err(MotionError::LengthMismatch { positions: positions.len(), times: times.len() });
        }
        let waypoints: Vec<Waypoint> = positions.iter().zip(times)
            .map(|(p, t)| Waypoint::new(*p, *t))
            .collect();
        Self::new(&waypoints)
    }

    pub fn start_time(&self) -> f64 {
        self.segments[0].start
    }

    pub fn end_time(&self) -> f64 {
        self.segments[self.segments.len() - 1].end
    }

    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    /// Evaluates the spline at the given time, clamped into the time range. At a waypoint
    /// the earlier segment is used.
    pub fn evaluate(&self, t: f64) -> Sample {
        let t = t.clamp(self.start_time(), self.end_time());
        let index = self.segments
            .partition_point(|segment| segment.end < t)
            .min(self.segments.len() - 1);
        self.segments[index].evaluate(t)
    }

    /// Samples the spline uniformly at the given frequency, from the first to the last
    /// waypoint time inclusive. All samples get the given flags.
    pub fn sample(&self, frequency: f64, flags: PathFlags) -> Result<Trajectory, MotionError> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(MotionError::InvalidFrequency(frequency));
        }
        let start = self.start_time();
        let end = self.end_time();
        let count = sample_count(end - start, frequency);

        let mut trajectory = Trajectory::with_capacity(count);
        let mut index = 0;
        for k in 0..count {
            let t = if k + 1 == count {
                end
            } else {
                start + (end - start) * k as f64 / (count - 1) as f64
            };
            while index + 1 < self.segments.len() && self.segments[index].end < t {
                index += 1;
            }
            trajectory.push(&self.segments[index].evaluate(t), flags);
        }
        trajectory.moves = 1;
        Ok(trajectory)
    }
}

/// Number of samples covering the duration at the given frequency, both ends included.
pub fn sample_count(duration: f64, frequency: f64) -> usize {
    let count = (duration * frequency + SAMPLE_COUNT_GUARD).floor() as usize + 1;
    count.max(2)
}

fn secant(from: &Waypoint, to: &Waypoint) -> Vector3<f64> {
    (to.position - from.position) / (to.time - from.time)
}

fn validate(waypoints: &[Waypoint]) -> Result<(), MotionError> {
    if waypoints.len() < 2 {
        return Err(MotionError::TooFewWaypoints(waypoints.len()));
    }
    for (index, waypoint) in waypoints.iter().enumerate() {
        if !waypoint.time.is_finite() || waypoint.position.iter().any(|v| !v.is_finite()) {
            return Err(MotionError::NonFinite { index });
        }
        if index > 0 && waypoint.time <= waypoints[index - 1].time {
            return Err(MotionError::NonIncreasingTime { index });
        }
    }
    Ok(())
}

/// Dense samples of a motion: time, position, velocity and acceleration arrays of the same
/// length, plus flags describing each sample.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub positions: Vec<Vector3<f64>>,
    pub velocities: Vec<Vector3<f64>>,
    pub accelerations: Vec<Vector3<f64>>,
    pub flags: Vec<PathFlags>,

    /// Number of moves concatenated into this trajectory.
    moves: usize,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_capacity(capacity: usize) -> Self {
        Trajectory {
            times: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            accelerations: Vec::with_capacity(capacity),
            flags: Vec::with_capacity(capacity),
            moves: 0,
        }
    }

    fn push(&mut self, sample: &Sample, flags: PathFlags) {
        self.times.push(sample.time);
        self.positions.push(sample.position);
        self.velocities.push(sample.velocity);
        self.accelerations.push(sample.acceleration);
        self.flags.push(flags);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of moves this trajectory has been concatenated from.
    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn sample(&self, index: usize) -> Sample {
        Sample {
            time: self.times[index],
            position: self.positions[index],
            velocity: self.velocities[index],
            acceleration: self.accelerations[index],
        }
    }

    pub fn start_time(&self) -> f64 {
        self.times.first().copied().unwrap_or(0.0)
    }

    pub fn end_time(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time()
    }

    pub fn start_position(&self) -> Option<Vector3<f64>> {
        self.positions.first().copied()
    }

    pub fn end_position(&self) -> Option<Vector3<f64>> {
        self.positions.last().copied()
    }

    /// Appends another trajectory, shifted in space by `offset`, on the running clock of this one.
    /// The time axis of `other` is rebased to start where this trajectory ends (or at zero if
    /// empty). If this trajectory is not empty, the first sample of `other` must coincide with
    /// the last sample here within `epsilon`; it is then dropped so that no timestamp or position
    /// is duplicated, and the meeting sample is marked as a seam.
    pub fn append(&mut self, other: &Trajectory, offset: &Vector3<f64>, epsilon: f64) -> Result<(), MotionError> {
        let Some(first) = other.start_position() else {
            return Ok(());
        };
        let shift = self.end_time() - other.start_time();

        let skip = match self.end_position() {
            Some(last) => {
                let gap = (first + offset - last).norm();
                if !(gap <= epsilon) {
                    return Err(MotionError::Discontinuity { index: self.moves, gap });
                }
                if let Some(flags) = self.flags.last_mut() {
                    flags.insert(PathFlags::SEAM);
                }
                1
            }
            None => 0,
        };

        let n = other.len() - skip;
        self.times.reserve(n);
        self.positions.reserve(n);
        self.velocities.reserve(n);
        self.accelerations.reserve(n);
        self.flags.reserve(n);
        for i in skip..other.len() {
            self.times.push(other.times[i] + shift);
            self.positions.push(other.positions[i] + offset);
            self.velocities.push(other.velocities[i]);
            self.accelerations.push(other.accelerations[i]);
            self.flags.push(other.flags[i]);
        }
        self.moves += other.moves.max(1);
        Ok(())
    }

    /// True if the timestamps strictly increase.
    pub fn is_time_increasing(&self) -> bool {
        self.times.windows(2).all(|w| w[0] < w[1])
    }

    /// Largest distance between two consecutive samples.
    pub fn max_step(&self) -> f64 {
        self.positions.windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .fold(0.0, f64::max)
    }
}
