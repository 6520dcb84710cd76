mod input;
mod recorder;
mod sequence;

use std::path::PathBuf;

use anyhow::{Result, bail};
use mid_core::QuitFlag;
use mid_experiment::{Session, TaskConfig};
use mid_timing::{EmulatedPulseSource, MonotonicClock};
use rand::SeedableRng;
use rand::rngs::StdRng;

struct Args {
    sequence: Option<PathBuf>,
    subject: String,
    seed: u64,
    out: PathBuf,
    trials: usize,
    fmri: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        sequence: None,
        subject: "XXX000".to_string(),
        seed: 0,
        out: PathBuf::from("data"),
        trials: 18,
        fmri: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--subject" => {
                args.subject = it.next().unwrap_or_else(|| "XXX000".to_string());
            }
            "--seed" => {
                let v = it.next().unwrap_or_default();
                args.seed = v.parse()?;
            }
            "--out" => {
                args.out = PathBuf::from(it.next().unwrap_or_else(|| "data".to_string()));
            }
            "--trials" => {
                let v = it.next().unwrap_or_default();
                args.trials = v.parse()?;
            }
            "--fmri" => args.fmri = true,
            other if !other.starts_with("--") => args.sequence = Some(PathBuf::from(other)),
            other => bail!("unknown flag {other}"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = parse_args()?;
    if args.fmri {
        // The hardware pulse source needs a counter device wired in by the
        // deployment; this binary only ships the emulated backend.
        bail!("hardware mode needs a scanner counter device; run without --fmri");
    }

    let config = TaskConfig::default();
    let clock = MonotonicClock::new();
    let source = EmulatedPulseSource::new(clock.clone(), config.pulses_per_tr, config.tr());
    let quit = QuitFlag::new();
    let responses = input::StdinResponses::spawn(clock.clone(), quit.clone());
    let mut rng = StdRng::seed_from_u64(args.seed);

    let specs = match &args.sequence {
        Some(path) => sequence::load(path)?,
        None => sequence::demo(args.trials, &mut rng),
    };

    println!("=== MID TASK ({} trials, emulated scanner) ===", specs.len());
    println!("Type any key + Enter to respond, q + Enter to quit.\n");

    let mut session = Session::new(config.clone(), clock, source, responses, quit, rng)?;
    let summary = session.run(&specs)?;

    let run_dir = recorder::RunRecorder::create(&args.out, &args.subject)?;
    run_dir.write(&args.subject, &config, &summary)?;

    if !summary.completed {
        println!("\nSession ended early on quit; partial records kept.");
    }
    println!(
        "\nTrials recorded: {}   Total earned: ${}",
        summary.outcomes.len(),
        summary.total_earned
    );
    for snap in &summary.staircases {
        println!(
            "  {:<6} intensity {:>5.0} ms  sd {:>5.0} ms  ({} trials)",
            snap.level.name(),
            snap.intensity_s * 1000.0,
            snap.sd_s * 1000.0,
            snap.trials
        );
    }
    println!("Records written to {}", run_dir.dir().display());

    Ok(())
}
