mod link;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use link::SerialLink;
use openbci_lib::constants::BAUD_RATE;
use openbci_lib::{Command, DataMode, DecodedPacket, DecoderConfig, MemorySource, OpenBci, PortRegistry};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Stream, record and replay EEG samples from an OpenBCI board.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
    /// Optional path to a file to write logs to, in addition to the console.
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,
    /// JSON file with decoder settings; command-line flags take precedence.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Start streaming from a board and print every sample.
    Stream {
        /// Serial device path, e.g. /dev/ttyUSB0 or COM3.
        #[arg(short, long)]
        port: String,
        #[arg(short, long, default_value_t = BAUD_RATE)]
        baud: u32,
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,
        /// Poll interval in milliseconds.
        #[arg(short, long, default_value_t = 16)]
        tick_ms: u64,
        /// Stop after this many samples instead of running until Ctrl+C.
        #[arg(short, long)]
        samples: Option<u64>,
        /// Write the raw byte stream to this file.
        #[arg(short, long)]
        record: Option<PathBuf>,
        /// Print samples as JSON lines.
        #[arg(long)]
        json: bool,
        /// Turn the board's filters on or off before streaming.
        #[arg(long)]
        filters: Option<Toggle>,
        /// Channels (0-based) to disable before streaming.
        #[arg(long = "disable-channel")]
        disabled_channels: Vec<usize>,
        /// Trace received bytes as hex (needs -vv).
        #[arg(long)]
        echo: bool,
    },
    /// Decode a file recorded with `stream --record`.
    Replay {
        #[arg(short, long)]
        file: PathBuf,
        /// Bytes handed to the decoder per poll.
        #[arg(long, default_value_t = 150)]
        chunk: usize,
        #[arg(long)]
        json: bool,
    },
    /// Send a single command character, e.g. `v` for soft reset or `?` for settings.
    Send {
        #[arg(short, long)]
        port: String,
        #[arg(short, long, default_value_t = BAUD_RATE)]
        baud: u32,
        command: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Text,
    Binary,
    BinaryAux,
}

impl From<ModeArg> for DataMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Text => DataMode::Text,
            ModeArg::Binary => DataMode::Binary,
            ModeArg::BinaryAux => DataMode::BinaryWithAux,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

fn setup_logging(log_file_path: Option<&Path>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = if let Some(path) = log_file_path {
        let log_file =
            File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

fn load_config(path: Option<&Path>) -> Result<DecoderConfig> {
    let Some(path) = path else {
        return Ok(DecoderConfig::default());
    };
    let file = File::open(path).with_context(|| format!("Failed to open config file {:?}", path))?;
    let config = serde_json::from_reader(file).with_context(|| format!("Invalid config file {:?}", path))?;
    info!(?path, "Loaded decoder config");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file.as_deref(), &cli.verbose)?;
    let config = load_config(cli.config.as_deref())?;
    let registry = PortRegistry::new();

    let result = match cli.command {
        Cmd::Stream {
            port,
            baud,
            mode,
            tick_ms,
            samples,
            record,
            json,
            filters,
            disabled_channels,
            echo,
        } => {
            let mut config = config;
            if let Some(mode) = mode {
                config.data_mode = mode.into();
            }
            config.echo_bytes |= echo;
            let options = StreamOptions {
                tick: Duration::from_millis(tick_ms.max(1)),
                samples,
                record,
                json,
                filters,
                disabled_channels,
            };
            run_stream(&registry, &port, baud, config, options).await
        }
        Cmd::Replay { file, chunk, json } => run_replay(&file, chunk, json, config),
        Cmd::Send { port, baud, command } => run_send(&registry, &port, baud, &command),
    };

    if let Err(e) = result {
        error!("Application failed: {:?}", e);
        process::exit(1);
    }
    Ok(())
}

struct StreamOptions {
    tick: Duration,
    samples: Option<u64>,
    record: Option<PathBuf>,
    json: bool,
    filters: Option<Toggle>,
    disabled_channels: Vec<usize>,
}

fn open_session(registry: &PortRegistry, port: &str, baud: u32, config: DecoderConfig) -> Result<OpenBci<SerialLink>> {
    info!(port, baud, "Opening serial port");
    let link = SerialLink::open(port, baud).with_context(|| format!("Failed to open serial port {}", port))?;
    let mut session = OpenBci::new(config);
    session.attach_claimed(registry, port, link)?;
    Ok(session)
}

fn print_packet(packet: &DecodedPacket, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(packet)?);
    } else {
        println!("{}", packet);
    }
    Ok(())
}

async fn run_stream(
    registry: &PortRegistry,
    port: &str,
    baud: u32,
    config: DecoderConfig,
    options: StreamOptions,
) -> Result<()> {
    let mut session = open_session(registry, port, baud, config)?;
    if let Some(path) = &options.record {
        session
            .link_mut()
            .context("Session has no link")?
            .record_to(path)
            .with_context(|| format!("Failed to create recording {:?}", path))?;
        info!(?path, "Recording raw stream");
    }

    if let Some(filters) = options.filters {
        session.set_filters(matches!(filters, Toggle::On))?;
    }
    for &channel in &options.disabled_channels {
        session.set_channel(channel, false)?;
    }
    session.start_streaming()?;
    info!(mode = %session.data_mode(), "Streaming started");

    let mut ticker = tokio::time::interval(options.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut received: u64 = 0;
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Ctrl+C received, shutting down gracefully.");
                break;
            }
            _ = ticker.tick() => {
                session.update()?;
                for packet in session.drain() {
                    print_packet(&packet, options.json)?;
                    received += 1;
                }

                if let Some(stall) = session.take_stall() {
                    warn!(missed_cycles = stall.missed_cycles, "No samples received, restarting stream");
                    session.start_streaming()?;
                }

                if options.samples.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
        }
    }

    session.stop_streaming()?;
    let stats = session.stats();
    info!(
        received,
        bytes = stats.bytes_received,
        framing_errors = stats.framing_errors,
        overflows = stats.leftover_overflows,
        "Streaming stopped"
    );
    Ok(())
}

fn run_replay(file: &Path, chunk: usize, json: bool, config: DecoderConfig) -> Result<()> {
    let data = std::fs::read(file).with_context(|| format!("Failed to read recording {:?}", file))?;
    info!(?file, bytes = data.len(), chunk, "Replaying recording");

    let mut session = OpenBci::new(config);
    session.attach(MemorySource::new(&data).with_chunk_size(chunk));

    while session.link_mut().is_some_and(|link| !link.is_exhausted()) {
        session.update()?;
        for packet in session.drain() {
            print_packet(&packet, json)?;
        }
    }

    let stats = session.stats();
    info!(
        frames = stats.frames_decoded,
        framing_errors = stats.framing_errors,
        overflows = stats.leftover_overflows,
        trailing = session.leftover_len(),
        "Replay finished"
    );
    Ok(())
}

fn run_send(registry: &PortRegistry, port: &str, baud: u32, command: &str) -> Result<()> {
    let &[byte] = command.as_bytes() else {
        bail!("Expected a single command character, got {:?}", command);
    };
    let command = Command::try_from(byte)?;

    let mut session = open_session(registry, port, baud, DecoderConfig::default())?;
    session.send(command)?;
    Ok(())
}
