use anyhow::{bail, Context, Result};
use clap::Parser;
use nalgebra::Vector3;
use tracing::{info, Level};

use rs_pen_kinematics::joint_driver::{JointSpaceDriver, Orientation};
use rs_pen_kinematics::joint_record::{datagram_payload, trajectory_record, write_record};
use rs_pen_kinematics::kinematics_impl::PenArmKinematics;
use rs_pen_kinematics::letter::{Letter, LetterString};
use rs_pen_kinematics::parameters::pen_kinematics::Parameters;
use rs_pen_kinematics::stroke::{HasTrajectory, Stroke};
use rs_pen_kinematics::utils::dump_joints;
use rs_pen_kinematics::writing_config::WritingConfig;

/// Plans a short text for the pen writing arm and prints the joint record.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Text to write. Only the demo letters C, H, I, L and T are known.
    #[arg(short, long, default_value = "HI")]
    text: String,

    /// YAML file with the writing configuration.
    #[arg(short, long)]
    config: Option<String>,

    /// YAML file with the arm parameters. The built-in pen arm is used if not given.
    #[arg(short, long)]
    robot: Option<String>,

    /// Write the joint record to this file instead of printing it.
    #[arg(short, long)]
    output: Option<String>,

    /// Distance between letters, overrides the configuration.
    #[arg(short, long)]
    pitch: Option<f64>,
}

/// Strokes of a demo letter in a 100 x 100 cell: (x, y) waypoints and their times.
fn demo_strokes(symbol: char) -> Option<Vec<(Vec<[f64; 2]>, Vec<f64>)>> {
    let strokes = match symbol {
        'C' => vec![(
            vec![[80.0, 80.0], [70.0, 90.0], [50.0, 95.0], [30.0, 90.0], [20.0, 50.0],
                 [30.0, 10.0], [50.0, 5.0], [70.0, 10.0], [80.0, 20.0]],
            vec![0.0, 1.5, 3.0, 4.5, 6.0, 7.5, 9.0, 10.5, 12.0],
        )],
        'H' => vec![
            (vec![[20.0, 95.0], [20.0, 5.0]], vec![0.0, 5.0]),
            (vec![[20.0, 50.0], [80.0, 50.0]], vec![0.0, 4.0]),
            (vec![[80.0, 95.0], [80.0, 5.0]], vec![0.0, 5.0]),
        ],
        'I' => vec![
            (vec![[30.0, 95.0], [70.0, 95.0]], vec![0.0, 3.0]),
            (vec![[50.0, 95.0], [50.0, 5.0]], vec![0.0, 5.0]),
            (vec![[30.0, 5.0], [70.0, 5.0]], vec![0.0, 3.0]),
        ],
        'L' => vec![(vec![[20.0, 95.0], [20.0, 5.0], [80.0, 5.0]], vec![0.0, 5.0, 9.0])],
        'T' => vec![
            (vec![[20.0, 95.0], [80.0, 95.0]], vec![0.0, 4.0]),
            (vec![[50.0, 95.0], [50.0, 5.0]], vec![0.0, 5.0]),
        ],
        _ => return None,
    };
    Some(strokes)
}

fn letter(symbol: char, config: &WritingConfig) -> Result<Letter> {
    let Some(shapes) = demo_strokes(symbol) else {
        bail!("No demo strokes for letter '{}'", symbol);
    };
    let strokes = shapes.iter()
        .map(|(points, times)| {
            let positions: Vec<Vector3<f64>> = points.iter()
                .map(|p| Vector3::new(p[0], p[1], 0.0))
                .collect();
            Stroke::new(&positions, times, config)
        })
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Letter '{}'", symbol))?;
    Ok(Letter::new(symbol, strokes, config)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => WritingConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to read writing configuration from {}", path))?,
        None => WritingConfig::default(),
    };
    let parameters = match &args.robot {
        Some(path) => Parameters::from_yaml_file(path)
            .with_context(|| format!("Failed to read arm parameters from {}", path))?,
        None => Parameters::pen_arm(),
    };
    let pitch = args.pitch.unwrap_or(config.letter_pitch);

    let letters = args.text.to_uppercase().chars()
        .map(|symbol| letter(symbol, &config))
        .collect::<Result<Vec<_>>>()?;
    let text = LetterString::new(letters, pitch, &config)?;
    info!("Planned '{}': {} samples over {:.2} s", text.text(), text.trajectory().len(), text.duration());

    let robot = PenArmKinematics::new(parameters);
    let driver = JointSpaceDriver::new(&robot, config.canvas).with_verification(true);
    let joints = driver.drive(text.trajectory(), &Orientation::Fixed(WritingConfig::pen_down()))?;

    if let Some(deviation) = joints.max_deviation() {
        info!("Max deviation {:.3e} mm, {:.3e} rad", deviation.translation, deviation.rotation);
    }
    if let (Some(first), Some(last)) = (joints.samples.first(), joints.samples.last()) {
        println!("First sample: {}", datagram_payload(&first.joints));
        dump_joints(&first.joints);
        println!("Last sample: {}", datagram_payload(&last.joints));
        dump_joints(&last.joints);
    }

    match &args.output {
        Some(path) => {
            write_record(path, &joints).with_context(|| format!("Failed to write {}", path))?;
            info!("Joint record written to {}", path);
        }
        None => println!("{}", trajectory_record(&joints)),
    }
    Ok(())
}
