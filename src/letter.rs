//! Letters composed from strokes and strings composed from letters.
//!
//! Consecutive moves are joined on a running clock. Where a move does not start at the end of
//! the previous one, a lift is inserted. The first sample of every move after the first is
//! dropped, as it repeats the last sample of the previous move.

use nalgebra::Vector3;
use tracing::debug;

use crate::motion_error::MotionError;
use crate::stroke::{HasTrajectory, Stroke, StrokeKind};
use crate::trajectory::Trajectory;
use crate::writing_config::WritingConfig;

#[derive(Debug, Clone)]
pub struct Letter {
    symbol: char,
    moves: Vec<Stroke>,
    trajectory: Trajectory,
}

impl Letter {
    /// Composes the letter from the given strokes in writing order, inserting lifts between
    /// strokes that do not meet within the configured tolerance.
    pub fn new(symbol: char, strokes: Vec<Stroke>, config: &WritingConfig) -> Result<Self, MotionError> {
        config.validate()?;
        if strokes.is_empty() {
            return Err(MotionError::EmptyComposition(format!("letter '{}' has no strokes", symbol)));
        }

        let mut moves: Vec<Stroke> = Vec::with_capacity(2 * strokes.len() - 1);
        for stroke in strokes {
            if let Some(previous) = moves.last() {
                let (from, to) = (previous.end(), stroke.start());
                if !((to - from).norm() <= config.epsilon) {
                    debug!("Letter '{}': lift from {:?} to {:?}", symbol, from, to);
                    moves.push(Stroke::lift(&from, &to, config)?);
                }
            }
            moves.push(stroke);
        }

        let mut trajectory = Trajectory::new();
        for stroke in &moves {
            trajectory.append(stroke.trajectory(), &Vector3::zeros(), config.epsilon)?;
        }

        Ok(Letter { symbol, moves, trajectory })
    }

    pub fn symbol(&self) -> char {
        self.symbol
    }

    /// Strokes and inserted lifts in execution order.
    pub fn moves(&self) -> &[Stroke] {
        &self.moves
    }

    /// Number of inserted lifts.
    pub fn lifts(&self) -> usize {
        self.moves.iter().filter(|m| m.kind() == StrokeKind::Lift).count()
    }
}

impl HasTrajectory for Letter {
    fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

/// Letters written one after another along the x axis of the canvas.
#[derive(Debug, Clone)]
pub struct LetterString {
    letters: Vec<Letter>,
    pitch: f64,
    trajectory: Trajectory,
}

impl LetterString {
    /// Places letter `i` at `i * pitch` along x and joins consecutive letters with lifts.
    pub fn new(letters: Vec<Letter>, pitch: f64, config: &WritingConfig) -> Result<Self, MotionError> {
        config.validate()?;
        if !pitch.is_finite() {
            return Err(MotionError::InvalidConfig(format!("letter pitch must be finite (got {})", pitch)));
        }
        if letters.is_empty() {
            return Err(MotionError::EmptyComposition("string has no letters".to_string()));
        }

        let mut trajectory = Trajectory::new();
        for (i, letter) in letters.iter().enumerate() {
            let offset = Vector3::x() * (i as f64 * pitch);
            if let Some(from) = trajectory.end_position() {
                let to = letter.start() + offset;
                debug!("Lift to letter '{}' from {:?} to {:?}", letter.symbol(), from, to);
                let lift = Stroke::lift(&from, &to, config)?;
                trajectory.append(lift.trajectory(), &Vector3::zeros(), config.epsilon)?;
            }
            trajectory.append(letter.trajectory(), &offset, config.epsilon)?;
        }

        Ok(LetterString { letters, pitch, trajectory })
    }

    pub fn letters(&self) -> &[Letter] {
        &self.letters
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    /// The written text.
    pub fn text(&self) -> String {
        self.letters.iter().map(Letter::symbol).collect()
    }
}

impl HasTrajectory for LetterString {
    fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::annotations::PathFlags;

    fn stroke(points: &[[f64; 2]], times: &[f64], config: &WritingConfig) -> Stroke {
        let positions: Vec<Vector3<f64>> = points.iter()
            .map(|p| Vector3::new(p[0], p[1], 0.0))
            .collect();
        Stroke::new(&positions, times, config).unwrap()
    }

    pub(crate) fn letter_h(config: &WritingConfig) -> Letter {
        let strokes = vec![
            stroke(&[[20.0, 95.0], [20.0, 5.0]], &[0.0, 5.0], config),
            stroke(&[[20.0, 50.0], [80.0, 50.0]], &[0.0, 4.0], config),
            stroke(&[[80.0, 95.0], [80.0, 5.0]], &[0.0, 5.0], config),
        ];
        Letter::new('H', strokes, config).unwrap()
    }

    pub(crate) fn letter_c(config: &WritingConfig) -> Letter {
        let strokes = vec![stroke(
            &[[80.0, 80.0], [70.0, 90.0], [50.0, 95.0], [30.0, 90.0], [20.0, 50.0],
                [30.0, 10.0], [50.0, 5.0], [70.0, 10.0], [80.0, 20.0]],
            &[0.0, 1.5, 3.0, 4.5, 6.0, 7.5, 9.0, 10.5, 12.0],
            config,
        )];
        Letter::new('C', strokes, config).unwrap()
    }

    #[test]
    fn test_letter_h() {
        let config = WritingConfig::default();
        let h = letter_h(&config);
        let trajectory = h.trajectory();

        assert_eq!(h.moves().len(), 5);
        assert_eq!(h.lifts(), 2);
        assert_eq!(trajectory.len(), 251 + 101 + 201 + 101 + 251 - 4);
        assert!((h.duration() - 18.0).abs() < 1e-9);
        assert!(trajectory.is_time_increasing());
        assert_eq!(trajectory.start_time(), 0.0);
        assert_eq!(trajectory.flags.iter().filter(|f| f.contains(PathFlags::SEAM)).count(), 4);
        assert!(trajectory.max_step() < 3.0);
    }

    #[test]
    fn test_touching_strokes_need_no_lift() {
        let config = WritingConfig::default();
        let strokes = vec![
            stroke(&[[20.0, 5.0], [50.0, 95.0]], &[0.0, 4.0], &config),
            stroke(&[[50.0, 95.0], [80.0, 5.0]], &[0.0, 4.0], &config),
        ];
        let a = Letter::new('A', strokes, &config).unwrap();
        assert_eq!(a.lifts(), 0);
        assert_eq!(a.trajectory().len(), 201 + 201 - 1);
        assert!((a.duration() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_letter_is_rejected() {
        let config = WritingConfig::default();
        assert!(matches!(Letter::new('X', vec![], &config), Err(MotionError::EmptyComposition(_))));
        assert!(matches!(LetterString::new(vec![], 100.0, &config), Err(MotionError::EmptyComposition(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = WritingConfig::default();
        let strokes = || vec![
            stroke(&[[0.0, 0.0], [10.0, 0.0]], &[0.0, 1.0], &config),
            stroke(&[[50.0, 50.0], [60.0, 0.0]], &[0.0, 1.0], &config),
        ];

        let nan_epsilon = WritingConfig { epsilon: f64::NAN, ..config };
        assert!(matches!(Letter::new('X', strokes(), &nan_epsilon), Err(MotionError::InvalidConfig(_))));
        let zero_duration = WritingConfig { lift_duration: 0.0, ..config };
        assert!(matches!(Letter::new('X', strokes(), &zero_duration), Err(MotionError::InvalidConfig(_))));

        let x = Letter::new('X', strokes(), &config).unwrap();
        assert_eq!(x.lifts(), 1);
        assert!(matches!(LetterString::new(vec![x.clone()], f64::NAN, &config),
                         Err(MotionError::InvalidConfig(_))));
        assert!(matches!(LetterString::new(vec![x], 100.0, &nan_epsilon),
                         Err(MotionError::InvalidConfig(_))));
    }

    #[test]
    fn test_string_c_h() {
        let config = WritingConfig::default();
        let text = LetterString::new(vec![letter_c(&config), letter_h(&config)], 100.0, &config).unwrap();
        let trajectory = text.trajectory();

        assert_eq!(text.text(), "CH");
        assert_eq!(trajectory.len(), 601 + 101 + 901 - 2);
        assert!((text.duration() - 32.0).abs() < 1e-9);
        assert!(trajectory.is_time_increasing());

        // H is shifted by the pitch.
        let h_start = trajectory.positions.iter()
            .position(|p| (p - Vector3::new(120.0, 95.0, 0.0)).norm() < 1e-9);
        assert_eq!(h_start, Some(601 + 101 - 2));
        assert!((text.end() - Vector3::new(180.0, 5.0, 0.0)).norm() < 1e-9);
    }
}
