//! Live microphone signal monitor.
//!
//! Opens the configured input device, runs the detector at the configured
//! refresh rate and prints detector events to stdout as JSON lines.
//!
//! ```text
//! mic_monitor [--settings PATH] [--seconds N] [--levels] [--list-devices]
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::info;
use voxbridge_core::{
    audio::{device::list_input_devices, AudioCapture},
    buffering::create_audio_ring,
    config::{default_settings_path, load_settings},
    ipc::events::{AudioLevelEvent, DetectorEvent},
    FftAnalyzer, RefreshClock, SignalMonitor, SignalObserver, SignalStateEvent,
};

#[derive(Debug)]
struct Args {
    settings: PathBuf,
    seconds: Option<u64>,
    levels: bool,
    list_devices: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        settings: default_settings_path(),
        seconds: None,
        levels: false,
        list_devices: false,
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--settings" => {
                args.settings = it.next().context("--settings needs a path")?.into();
            }
            "--seconds" => {
                let raw = it.next().context("--seconds needs a value")?;
                args.seconds = Some(raw.parse().with_context(|| format!("bad --seconds {raw}"))?);
            }
            "--levels" => args.levels = true,
            "--list-devices" => args.list_devices = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

/// Prints state changes (and optionally every level) as JSON lines.
struct JsonLinePrinter {
    levels: bool,
    seq: u64,
}

impl JsonLinePrinter {
    fn emit(event: &DetectorEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!("failed to serialise event: {e}"),
        }
    }
}

impl SignalObserver for JsonLinePrinter {
    fn on_signal_state_changed(&mut self, event: &SignalStateEvent) {
        Self::emit(&DetectorEvent::SignalState(*event));
    }

    fn on_audio_level_changed(&mut self, level: u8) {
        self.seq += 1;
        if self.levels {
            Self::emit(&DetectorEvent::AudioLevel(AudioLevelEvent {
                seq: self.seq,
                level,
            }));
        }
    }
}

fn run() -> Result<()> {
    let args = parse_args()?;

    if args.list_devices {
        println!("{}", serde_json::to_string_pretty(&list_input_devices())?);
        return Ok(());
    }

    let mut settings = load_settings(&args.settings);
    settings.apply_overrides(|key| std::env::var(key).ok());
    settings.normalize();
    info!(path = %args.settings.display(), ?settings, "settings loaded");

    let (producer, consumer) = create_audio_ring();
    let running = Arc::new(AtomicBool::new(true));
    let capture = AudioCapture::open_with_preference(
        producer,
        Arc::clone(&running),
        settings.preferred_input_device.as_deref(),
    )
    .context("failed to open microphone")?;

    let analyzer = FftAnalyzer::new(settings.analyzer.clone(), consumer)?;
    let mut monitor = SignalMonitor::new(settings.detector, RefreshClock::new(settings.refresh_hz))?
        .with_analyzer(analyzer);
    monitor.subscribe(JsonLinePrinter {
        levels: args.levels,
        seq: 0,
    });

    let stop = Arc::new(AtomicBool::new(false));
    if let Some(seconds) = args.seconds {
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            thread::sleep(Duration::from_secs(seconds));
            stop.store(true, Ordering::Relaxed);
        });
    }

    info!(sample_rate = capture.sample_rate, "listening");
    monitor.start_monitoring()?;
    monitor.run_until(&stop);

    capture.stop();
    info!(ticks = monitor.ticks(), state = ?monitor.signal_state(), "done");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("voxbridge_core=info,mic_monitor=info")),
        )
        .init();

    if let Err(e) = run() {
        eprintln!("mic_monitor failed: {e:#}");
        std::process::exit(1);
    }
}
