mod waveform;

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use clap::{Parser, Subcommand};
use tempo_visualiser_core::{
    parse_assignment, AppConfig, AudioSource, OnsetTempoTracker, PipelineCoordinator, Wave,
};
use tracing_subscriber::EnvFilter;

fn main() -> tempo_visualiser_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            input,
            config,
            params,
            no_pace,
            tick_ms,
            width,
        } => run_play(&input, config.as_deref(), &params, no_pace, tick_ms, width),
        Commands::Inspect { input } => run_inspect(&input),
        Commands::Resample {
            input,
            output,
            rate,
        } => run_resample(&input, &output, rate),
        Commands::Config { output } => run_config(output.as_deref()),
    }
}

fn run_play(
    input: &Path,
    config_path: Option<&Path>,
    params: &[String],
    no_pace: bool,
    tick_ms: u64,
    width: usize,
) -> tempo_visualiser_core::Result<()> {
    let mut config = match config_path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if no_pace {
        config.pipeline.pace_realtime = false;
    }
    for param in params {
        let (name, value) = parse_assignment(param)?;
        config.tracker.insert(name, value);
    }
    tracing::info!(?input, ?config, "starting playback");

    let tracker = OnsetTempoTracker::new(config.audio.sample_rate);
    let window = config.pipeline.ring_capacity;
    let mut pipeline = PipelineCoordinator::new(config, tracker)?;
    pipeline.start(AudioSource::File(input.to_path_buf()))?;

    let monitor = pipeline.monitor();
    let tick = Duration::from_millis(tick_ms.max(1));
    let mut stdout = io::stdout();
    let mut last_tempo = 0.0;

    loop {
        thread::sleep(tick);

        let tempo = monitor.current_tempo();
        if tempo != last_tempo {
            tracing::info!(tempo_bpm = tempo, "tempo estimate changed");
            last_tempo = tempo;
        }

        let snapshot = monitor.read_waveform_snapshot(window);
        let columns = waveform::column_extents(&snapshot, monitor.waveform_channels(), width);
        write!(
            stdout,
            "\r{tempo:6.1} BPM |{}|",
            waveform::render_line(&columns)
        )?;
        stdout.flush()?;

        if pipeline.source_finished() && monitor.queue_depth() == 0 {
            break;
        }
    }
    writeln!(stdout)?;

    let frames = monitor.frames_analysed();
    let tempo = pipeline.current_tempo();
    pipeline.stop()?;
    tracing::info!(frames, tempo_bpm = tempo, "playback finished");
    println!("{tempo:.1} BPM");
    Ok(())
}

fn run_inspect(input: &Path) -> tempo_visualiser_core::Result<()> {
    let wave = Wave::open(input)?;
    let header = wave.header();

    println!("file:            {}", input.display());
    println!("format tag:      {:#06x}", header.format_tag);
    println!("channels:        {}", header.channels);
    println!("sample rate:     {} Hz", header.sample_rate);
    println!("byte rate:       {}", header.byte_rate);
    println!("block align:     {}", header.block_align);
    println!("bits per sample: {}", header.bits_per_sample);
    println!("data size:       {} bytes", header.data_size);
    println!("frames:          {}", wave.num_samples());
    println!("duration:        {:.3} s", wave.duration_seconds());

    wave.close();
    Ok(())
}

fn run_resample(input: &Path, output: &Path, rate: u32) -> tempo_visualiser_core::Result<()> {
    tracing::info!(?input, ?output, rate, "resampling");

    let mut wave = Wave::open(input)?;
    let source_rate = wave.sample_rate();
    wave.decode_all()?;
    wave.resample(rate)?;
    wave.write(output)?;
    tracing::info!(
        source_rate,
        frames = wave.num_samples(),
        "wrote resampled file"
    );
    wave.close();
    Ok(())
}

fn run_config(output: Option<&Path>) -> tempo_visualiser_core::Result<()> {
    let json = AppConfig::default().to_json_pretty()?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            tracing::info!(?path, "wrote default configuration");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Tempo tracking waveform visualiser", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a WAV file through the pipeline and show tempo and waveform.
    Play {
        /// WAV file to analyse.
        input: PathBuf,
        /// JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Tracker parameter override, e.g. `-i max_tempo=180`.
        #[arg(short = 'i', long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,
        /// Feed the file as fast as the analysis keeps up.
        #[arg(long)]
        no_pace: bool,
        /// UI refresh interval in milliseconds.
        #[arg(long, default_value_t = 50)]
        tick_ms: u64,
        /// Waveform width in characters.
        #[arg(long, default_value_t = 64)]
        width: usize,
    },
    /// Print the header of a WAV file.
    Inspect {
        input: PathBuf,
    },
    /// Resample a WAV file by linear interpolation.
    Resample {
        input: PathBuf,
        output: PathBuf,
        /// Target sample rate in Hz.
        #[arg(short, long)]
        rate: u32,
    },
    /// Print or save the default configuration.
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
