use pulsegrid::audio::{AudioDeviceManager, AudioOutput, OutputStatus};
use pulsegrid::{
    AudioClock, BufferCache, Channel, DecodedBuffer, EngineConfig, EventKind, NotificationBus,
    NullBackend, PatternBank, PlaybackMode, Sequence, SimulatedClock, StepGrid,
    TransportController, TransportEvent, VoiceBackend, create_voice_channel,
};
use std::f32::consts::PI;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const KIT_SAMPLE_RATE: u32 = 44_100;

struct Options {
    seconds: f64,
    bpm: Option<f64>,
    config: Option<PathBuf>,
    device: Option<String>,
    continuous: bool,
    list_devices: bool,
}

fn parse_args() -> Options {
    let mut options = Options {
        seconds: 8.0,
        bpm: None,
        config: None,
        device: None,
        continuous: false,
        list_devices: false,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seconds" => {
                if let Some(v) = args.next().and_then(|v| v.parse().ok()) {
                    options.seconds = v;
                }
            }
            "--bpm" => options.bpm = args.next().and_then(|v| v.parse().ok()),
            "--config" => options.config = args.next().map(PathBuf::from),
            "--device" => options.device = args.next(),
            "--continuous" => options.continuous = true,
            "--list-devices" => options.list_devices = true,
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
    }
    options
}

/// Decaying sine with optional noise, good enough for a demo kit
fn synth_hit(duration: f32, freq_start: f32, freq_end: f32, noise: f32, decay: f32) -> DecodedBuffer {
    let frames = (duration * KIT_SAMPLE_RATE as f32) as usize;
    let mut phase = 0.0f32;
    let mut seed = 0x1234_5678u32;
    let samples = (0..frames)
        .map(|i| {
            let t = i as f32 / frames as f32;
            let freq = freq_start + (freq_end - freq_start) * t;
            phase += 2.0 * PI * freq / KIT_SAMPLE_RATE as f32;
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let white = (seed as f32 / u32::MAX as f32) * 2.0 - 1.0;
            let envelope = (-t * decay).exp();
            (phase.sin() * (1.0 - noise) + white * noise) * envelope * 0.8
        })
        .collect();
    DecodedBuffer::from_mono(samples, KIT_SAMPLE_RATE)
}

fn build_kit(cache: &BufferCache) -> PatternBank {
    let kick = cache.insert(synth_hit(0.4, 120.0, 40.0, 0.0, 6.0));
    let snare = cache.insert(synth_hit(0.25, 220.0, 180.0, 0.6, 9.0));
    let hat = cache.insert(synth_hit(0.08, 8000.0, 8000.0, 0.9, 14.0));
    let crash = cache.insert(synth_hit(1.2, 5000.0, 4000.0, 0.95, 3.0));

    let bank = PatternBank::new();
    bank.add_channel(Channel::new("Kick").with_sample(kick));
    let snare_ch = bank.add_channel(Channel::new("Snare").with_sample(snare));
    let hat_ch = bank.add_channel(Channel::new("Hat").with_sample(hat));
    let crash_ch = bank.add_channel(Channel::new("Crash").with_sample(crash));

    bank.update_channel(snare_ch, |c| c.set_volume(0.8));
    bank.update_channel(hat_ch, |c| {
        c.set_volume(0.5);
        c.set_trim(0.0, 0.6);
    });
    bank.update_channel(crash_ch, |c| {
        c.set_volume(0.4);
        c.set_trim(0.0, 0.5);
        c.set_reverse(true);
    });

    bank.add_sequence(Sequence::with_grid(
        "Groove",
        StepGrid::from_patterns(
            16,
            &[
                "x... .... x... ....",
                ".... x... .... x...",
                "x.x. x.x. x.x. x.xx",
                "",
            ],
        ),
    ));
    bank.add_sequence(Sequence::with_grid(
        "Fill",
        StepGrid::from_patterns(
            16,
            &[
                "x..x ..x. x... x...",
                ".... x..x .xx. xxxx",
                "xxxx xxxx xxxx x...",
                ".... .... .... ...r",
            ],
        ),
    ));
    bank
}

fn main() {
    // Library logs go through the `log` facade, bridged into this subscriber
    let filter = EnvFilter::try_from_env("PULSEGRID_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    println!("=== pulsegrid ===\n");
    let options = parse_args();

    if options.list_devices {
        for device in AudioDeviceManager::new().list_output_devices() {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("  {}{}", device.name, marker);
        }
        return;
    }

    let mut config = match &options.config {
        Some(path) => match EngineConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                return;
            }
        },
        None => EngineConfig::default(),
    };
    if options.continuous {
        config.playback_mode = PlaybackMode::Continuous;
    }

    let cache = Arc::new(BufferCache::new());
    let bank = Arc::new(build_kit(&cache));

    // Audio device if there is one, otherwise a silent simulated timeline
    let (backend, mixer) = create_voice_channel(config.voice_queue_capacity, config.max_voices);
    let (output, clock, backend): (Option<AudioOutput>, Arc<dyn AudioClock>, Box<dyn VoiceBackend>) =
        match AudioOutput::open(options.device.as_deref(), mixer) {
            Ok(output) => {
                println!(
                    "Output: {} ({} Hz, {} channels)",
                    output.device_name(),
                    output.sample_rate(),
                    output.channels()
                );
                let clock: Arc<dyn AudioClock> = Arc::new(output.clock());
                let backend: Box<dyn VoiceBackend> = Box::new(backend);
                (Some(output), clock, backend)
            }
            Err(e) => {
                log::warn!("No audio output ({}), running silent", e);
                let clock: Arc<dyn AudioClock> = Arc::new(SimulatedClock::new());
                let backend: Box<dyn VoiceBackend> = Box::new(NullBackend);
                (None, clock, backend)
            }
        };

    let (bus, events) = NotificationBus::channel(config.notification_capacity);
    let transport = match TransportController::builder(config)
        .clock(clock)
        .pattern_store(bank)
        .buffers(cache)
        .voice_backend(backend)
        .notifications(bus)
        .build()
    {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            return;
        }
    };

    let playhead = events.dispatch_to(Arc::new(|event: &TransportEvent| match event.kind {
        EventKind::Bar => println!("bar {:>3}  (t = {:.3}s)", event.bar + 1, event.time),
        EventKind::Sequence => println!("-> sequence {}", event.sequence),
        kind if kind.is_transport() => println!("[{:?}]", kind),
        _ => {}
    }));

    if let Some(bpm) = options.bpm {
        if let Err(e) = transport.set_bpm(bpm) {
            eprintln!("ERROR: {}", e);
        }
    }
    if let Err(e) = transport.spawn_driver() {
        eprintln!("ERROR: {}", e);
        return;
    }

    transport.start();
    let half = Duration::from_secs_f64(options.seconds.max(1.0) / 2.0);
    thread::sleep(half);

    transport.pause();
    thread::sleep(Duration::from_millis(500));
    transport.resume();
    let faster = transport.bpm() * 1.25;
    let _ = transport.set_bpm(faster);
    thread::sleep(half);

    transport.stop();
    // let the stop fade reach the speakers
    thread::sleep(Duration::from_millis(100));
    transport.stop_driver();

    let stats = transport.stats();
    println!(
        "\n{} steps, {} triggers ({} dropped), {} late steps",
        stats.steps, stats.triggers, stats.dropped_triggers, stats.late_steps
    );
    if let Some(receiver) = playhead.shutdown() {
        if receiver.dropped() > 0 {
            println!("{} notifications dropped", receiver.dropped());
        }
    }
    if let Some(output) = output {
        if output.status() == OutputStatus::Error {
            eprintln!("Audio stream reported an error during playback");
        }
    }
}
