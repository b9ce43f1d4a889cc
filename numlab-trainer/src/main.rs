//! Number Listening Lab (numlab) - Main entry point
//!
//! Terminal trainer for spoken Mandarin numbers. Reads line commands from
//! stdin, renders the session snapshot to stdout and logs to stderr.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use numlab_common::events::{EventBus, LabEvent, TaskKind};
use numlab_common::LabConfig;
use numlab_trainer::audio::{AudioSink, DeviceSink, NullSink};
use numlab_trainer::db::SqliteScoreStore;
use numlab_trainer::speech::{EspeakSynthesizer, NullSynthesizer, SpeechSynthesizer};
use numlab_trainer::storage::{MemoryScoreStore, ScoreStore};
use numlab_trainer::terminal::{parse_line, render, HELP};
use numlab_trainer::{
    AudioRenderer, Command, FeedbackSynthesizer, SessionController, SessionHandle, TaskGenerator,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for numlab
#[derive(Parser, Debug)]
#[command(name = "numlab")]
#[command(about = "Listening trainer for spoken Mandarin numbers")]
#[command(version)]
struct Args {
    /// Config file (overrides NUMLAB_CONFIG and the per-user config file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Score database path
    #[arg(long, env = "NUMLAB_DB")]
    db: Option<PathBuf>,

    /// Start with stress mode enabled
    #[arg(long)]
    stress: bool,

    /// Disable speech and sound output
    #[arg(long)]
    no_audio: bool,

    /// Keep scores in memory only
    #[arg(long)]
    no_persist: bool,

    /// Seed for task generation and stress tempo
    #[arg(long, env = "NUMLAB_SEED")]
    seed: Option<u64>,

    /// Only practice one kind (phone, code, price)
    #[arg(long, value_parser = parse_kind)]
    kind: Option<TaskKind>,

    /// List audio output devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn parse_kind(s: &str) -> std::result::Result<TaskKind, String> {
    TaskKind::from_str(s).ok_or_else(|| format!("unknown task kind '{}' (phone, code, price)", s))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = LabConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(db) = &args.db {
        config.storage.database = db.clone();
    }
    if args.kind.is_some() {
        config.session.kind = args.kind;
    }
    if args.no_audio {
        config.audio.enabled = false;
    }

    // Initialize tracing (stderr, so the trainer owns stdout)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.list_devices {
        for device in DeviceSink::list_devices().context("Failed to list audio devices")? {
            println!("{}", device);
        }
        return Ok(());
    }

    info!("Starting numlab v{}", env!("CARGO_PKG_VERSION"));

    // Single control thread; stdin is read on the blocking pool
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    let result = runtime.block_on(run(args, config));

    // A pending stdin read would otherwise hold shutdown until the next line
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

async fn run(args: Args, config: LabConfig) -> Result<()> {
    let sink: Rc<dyn AudioSink> = if config.audio.enabled {
        match DeviceSink::open(config.audio.device.as_deref(), config.audio.sample_rate) {
            Ok(sink) => Rc::new(sink),
            Err(e) => {
                warn!("Audio output unavailable, continuing without cues: {}", e);
                Rc::new(NullSink::new(config.audio.sample_rate, e.to_string()))
            }
        }
    } else {
        Rc::new(NullSink::new(config.audio.sample_rate, "audio disabled"))
    };

    let speech: Box<dyn SpeechSynthesizer> = if config.audio.enabled {
        Box::new(EspeakSynthesizer::probe(&config.speech.espeak_binary).await)
    } else {
        Box::new(NullSynthesizer)
    };

    let (generator, renderer_rng) = match args.seed {
        Some(seed) => (
            TaskGenerator::seeded(seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (TaskGenerator::from_entropy(), StdRng::from_entropy()),
    };

    let renderer = AudioRenderer::new(
        speech,
        Rc::clone(&sink),
        config.speech.clone(),
        config.audio.clone(),
        renderer_rng,
    );
    let feedback = FeedbackSynthesizer::new(sink);
    let events = EventBus::new(64);

    let parts = Parts {
        generator,
        renderer,
        feedback,
        events,
        config: config.clone(),
        stress: args.stress,
    };

    if args.no_persist {
        info!("Scores kept in memory only");
        return run_session(parts, MemoryScoreStore::new()).await;
    }

    match SqliteScoreStore::open(&config.storage.database).await {
        Ok(store) => {
            let result = run_session(parts, store.clone()).await;
            store.close().await;
            result
        }
        Err(e) => {
            warn!(
                "Score database {} unavailable, scores will not persist: {}",
                config.storage.database.display(),
                e
            );
            run_session(parts, MemoryScoreStore::new()).await
        }
    }
}

struct Parts {
    generator: TaskGenerator,
    renderer: AudioRenderer,
    feedback: FeedbackSynthesizer,
    events: EventBus,
    config: LabConfig,
    stress: bool,
}

async fn run_session<S: ScoreStore>(parts: Parts, store: S) -> Result<()> {
    let Parts {
        generator,
        renderer,
        feedback,
        events,
        config,
        stress,
    } = parts;

    // Subscribe before start so the first snapshot is drawn
    let redraw = tokio::spawn(draw_snapshots(events.subscribe()));

    let mut controller =
        SessionController::new(generator, renderer, feedback, store, config.session, events);
    if stress {
        controller.set_stress_mode(true);
    }

    let handle = controller.handle();
    let input = tokio::spawn(read_commands(handle.clone()));
    tokio::spawn(shutdown_on_ctrl_c(handle));

    controller.run().await;

    input.abort();
    // Drain the final snapshot and SessionEnded
    let _ = tokio::time::timeout(Duration::from_millis(200), redraw).await;
    Ok(())
}

/// Forward parsed stdin lines into the session
async fn read_commands(handle: SessionHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !handle.send_all(parse_line(&line)) {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
    handle.send(Command::Shutdown);
}

/// Redraw on every snapshot until the session ends
async fn draw_snapshots(mut rx: tokio::sync::broadcast::Receiver<LabEvent>) {
    loop {
        match rx.recv().await {
            Ok(LabEvent::SnapshotUpdated { snapshot, .. }) => {
                println!("\n{}{}", render(&snapshot), HELP);
            }
            Ok(LabEvent::SessionEnded { .. }) => {
                println!("bye");
                break;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Display lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_on_ctrl_c(handle: SessionHandle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down");
        handle.send(Command::Shutdown);
    }
}
