//! Offline replay of a WAV file through the full detector pipeline.
//!
//! Samples are pushed through the ring buffer one display frame at a time and
//! each frame is stamped with a synthetic timestamp, so results are
//! reproducible and independent of wall-clock speed.
//!
//! ```text
//! replay <file.wav> [--fps N] [--settings PATH] [--levels]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;
use voxbridge_core::{
    buffering::{create_audio_ring_with_capacity, Producer, RING_CAPACITY},
    config::{load_settings, MonitorSettings},
    ipc::events::{AudioLevelEvent, DetectorEvent},
    FftAnalyzer, ManualScheduler, SignalMonitor, SignalObserver, SignalStateEvent,
};

#[derive(Debug)]
struct Args {
    wav: PathBuf,
    fps: u32,
    settings: Option<PathBuf>,
    levels: bool,
}

fn parse_args() -> Result<Args> {
    let mut wav = None;
    let mut fps = 60;
    let mut settings = None;
    let mut levels = false;

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--fps" => {
                let raw = it.next().context("--fps needs a value")?;
                fps = raw.parse().with_context(|| format!("bad --fps {raw}"))?;
            }
            "--settings" => settings = Some(it.next().context("--settings needs a path")?.into()),
            "--levels" => levels = true,
            other if other.starts_with("--") => bail!("unknown argument: {other}"),
            path => wav = Some(PathBuf::from(path)),
        }
    }

    let Some(wav) = wav else {
        bail!("usage: replay <file.wav> [--fps N] [--settings PATH] [--levels]");
    };
    if fps == 0 {
        bail!("--fps must be positive");
    }
    Ok(Args {
        wav,
        fps,
        settings,
        levels,
    })
}

/// Decode a WAV file to mono f32 in [-1, 1].
fn read_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("open {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

struct JsonLinePrinter {
    levels: bool,
    seq: u64,
}

impl SignalObserver for JsonLinePrinter {
    fn on_signal_state_changed(&mut self, event: &SignalStateEvent) {
        if let Ok(line) = serde_json::to_string(&DetectorEvent::SignalState(*event)) {
            println!("{line}");
        }
    }

    fn on_audio_level_changed(&mut self, level: u8) {
        self.seq += 1;
        if !self.levels {
            return;
        }
        let event = DetectorEvent::AudioLevel(AudioLevelEvent {
            seq: self.seq,
            level,
        });
        if let Ok(line) = serde_json::to_string(&event) {
            println!("{line}");
        }
    }
}

fn run() -> Result<()> {
    let args = parse_args()?;
    let settings = match &args.settings {
        Some(path) => load_settings(path),
        None => MonitorSettings::default(),
    };

    let (samples, sample_rate) = read_mono(&args.wav)?;
    let per_frame = (sample_rate / args.fps).max(1) as usize;
    info!(
        file = %args.wav.display(),
        sample_rate,
        frames = samples.len() / per_frame,
        "replaying"
    );

    let (mut producer, consumer) = create_audio_ring_with_capacity(RING_CAPACITY.max(2 * per_frame));
    let analyzer = FftAnalyzer::new(settings.analyzer.clone(), consumer)?;
    let mut monitor =
        SignalMonitor::new(settings.detector, ManualScheduler::new())?.with_analyzer(analyzer);
    monitor.subscribe(JsonLinePrinter {
        levels: args.levels,
        seq: 0,
    });

    monitor.start_monitoring()?;
    for (i, chunk) in samples.chunks(per_frame).enumerate() {
        producer.push_slice(chunk);
        let now = i as u64 * 1_000 / u64::from(args.fps);
        monitor.advance(now);
    }
    monitor.stop_monitoring();

    info!(ticks = monitor.ticks(), state = ?monitor.signal_state(), "replay finished");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("voxbridge_core=info,replay=info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("replay failed: {e:#}");
        std::process::exit(1);
    }
}
