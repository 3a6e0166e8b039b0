use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "trackburn", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Burn a GPS track overlay into a video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Probe a video file and print its media info as JSON.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Source video file.
    #[arg(long)]
    video: PathBuf,

    /// KML track file.
    #[arg(long)]
    track: PathBuf,

    /// Output video path.
    #[arg(long)]
    out: PathBuf,

    /// Seconds added to video time before track lookup (camera clock drift).
    #[arg(long, default_value_t = 0.0)]
    offset: f64,

    /// Overlay refresh rate in frames per second (1..=30).
    #[arg(long, default_value_t = 5)]
    overlay_fps: u32,

    /// Force the output frame rate instead of keeping the source rate.
    #[arg(long)]
    output_fps: Option<u32>,

    /// Disable the speed gauge panel.
    #[arg(long)]
    no_gauge: bool,

    /// Disable the info panel.
    #[arg(long)]
    no_info_panel: bool,

    /// Disable the mini-map panel.
    #[arg(long)]
    no_mini_map: bool,

    /// Full-scale gauge speed in the displayed unit.
    #[arg(long, default_value_t = 60.0)]
    max_speed: f64,

    /// Unit for displayed speeds.
    #[arg(long, value_enum, default_value_t = UnitChoice::Kmh)]
    unit: UnitChoice,

    /// Font file for panel text. Falls back to a host default when unset.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Video file to probe.
    #[arg(long)]
    video: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UnitChoice {
    Kmh,
    Ms,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn speed_unit(choice: UnitChoice) -> trackburn::SpeedUnit {
    match choice {
        UnitChoice::Kmh => trackburn::SpeedUnit::Kmh,
        UnitChoice::Ms => trackburn::SpeedUnit::Ms,
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut spec = trackburn::JobSpec::new(
        args.video,
        args.out.clone(),
        trackburn::TrackSource::KmlFile(args.track),
    );
    spec.offset_seconds = args.offset;
    spec.overlay_fps = args.overlay_fps;
    spec.output_fps = args.output_fps;
    spec.overlay.gauge.enabled = !args.no_gauge;
    spec.overlay.gauge.max_speed = args.max_speed;
    spec.overlay.info_panel.enabled = !args.no_info_panel;
    spec.overlay.mini_map.enabled = !args.no_mini_map;
    spec.overlay.speed_unit = speed_unit(args.unit);
    spec.overlay.font_path = args.font;

    let scheduler = trackburn::JobScheduler::new(trackburn::SchedulerConfig {
        max_running_jobs: 1,
        ..Default::default()
    });
    let handle = scheduler.submit(spec)?;

    let mut failure: Option<String> = None;
    for event in handle.events().iter() {
        match event {
            trackburn::JobEvent::Progress { percent, message } => match message {
                Some(stage) => eprintln!("{percent:5.1}% {stage}"),
                None => eprintln!("{percent:5.1}%"),
            },
            trackburn::JobEvent::Log { stream, message } => {
                eprintln!("[{stream}] {message}");
            }
            trackburn::JobEvent::Done { .. } => {}
            trackburn::JobEvent::Error { message } => failure = Some(message),
        }
    }

    match handle.state() {
        trackburn::JobState::Done => {
            eprintln!("wrote {}", args.out.display());
            Ok(())
        }
        trackburn::JobState::Cancelled => anyhow::bail!("job cancelled"),
        _ => anyhow::bail!(failure.unwrap_or_else(|| "job failed".to_string())),
    }
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let info = trackburn::probe_media(&args.video)?;
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}
