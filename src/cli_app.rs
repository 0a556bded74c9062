//! Top-level CLI definition and dispatch.

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::{Colorize, control};
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use compute_status::client::battery::SysfsBatteryProbe;
use compute_status::client::monitor::{BatteryProbe, ClientMonitor};
use compute_status::client::state_file::StateFileMonitor;
use compute_status::client::status::{ImageHandle, SlideshowAsset, StatusSnapshot};
use compute_status::core::config::Config;
use compute_status::core::errors::StatusError;
use compute_status::surface::decider::PresentationDecider;
use compute_status::surface::gate::{self, DisplayedState, GateVerdict};
use compute_status::surface::instruction::RenderInstruction;
use compute_status::surface::model::{SurfaceCmd, SurfaceModel, SurfaceMsg, needs_assets};
use compute_status::surface::runtime::RenderSink;
use compute_status::surface::slideshow::{SelectionUpdate, ViewportConstraints};
use compute_status::surface::update::update;

/// Status surface for a volunteer-computing client.
#[derive(Debug, Parser)]
#[command(
    name = "cstat",
    author,
    version,
    about = "Compute client status surface",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Decide what the surface shows for one status snapshot.
    Decide(DecideArgs),
    /// Feed a JSONL sequence of snapshots through the surface model.
    Replay(ReplayArgs),
    /// Run the live surface against the configured state file.
    #[cfg(feature = "watch")]
    Watch(WatchArgs),
    /// Show the effective configuration.
    Config,
}

#[derive(Debug, Clone, Copy, Args)]
struct ViewportArgs {
    /// Viewport height in pixels.
    #[arg(long, default_value_t = 1280, value_name = "PX")]
    height: u32,
    /// Viewport width in pixels.
    #[arg(long, default_value_t = 720, value_name = "PX")]
    width: u32,
}

#[derive(Debug, Clone, Args)]
struct DecideArgs {
    /// State file (`{"status": ..., "slideshow": [...]}`).
    #[arg(long, value_name = "FILE")]
    status: PathBuf,
    #[command(flatten)]
    viewport: ViewportArgs,
}

#[derive(Debug, Clone, Args)]
struct ReplayArgs {
    /// JSONL file, one snapshot per line.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    #[command(flatten)]
    viewport: ViewportArgs,
}

#[cfg(feature = "watch")]
#[derive(Debug, Clone, Args)]
struct WatchArgs {
    #[command(flatten)]
    viewport: ViewportArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    #[error(transparent)]
    Status(#[from] StatusError),
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Status(e) if !e.is_retryable() => 1,
            Self::Runtime(_) | Self::Io(_) | Self::Status(_) => 2,
            Self::Json(_) => 3,
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    match &cli.command {
        Command::Decide(args) => run_decide(cli, &config, args),
        Command::Replay(args) => run_replay(cli, &config, args),
        #[cfg(feature = "watch")]
        Command::Watch(args) => watch::run_watch(cli, &config, args),
        Command::Config => run_config(cli, &config),
    }
}

// ──────────────────── decide ────────────────────

fn run_decide(cli: &Cli, config: &Config, args: &DecideArgs) -> Result<(), CliError> {
    let control = args.status.with_extension("run-mode.json");
    let monitor = StateFileMonitor::new(&args.status, control);
    // Missing or malformed state files read as "not available".
    let status = monitor.status();
    let viewport = viewport_of(config, args.viewport);

    let verdict = gate::evaluate(&DisplayedState::UNINITIALIZED, &status);
    let instruction = if verdict.should_render() {
        let assets = if needs_assets(&status) {
            monitor.slideshow_assets()
        } else {
            Vec::new()
        };
        Some(decider_for(config).decide(&status, &viewport, &assets))
    } else {
        None
    };

    match output_mode(cli) {
        OutputMode::Human => {
            let mut sink = TextSink::new(OutputMode::Human);
            match &instruction {
                Some(instruction) => sink.render(instruction),
                None => println!("{}", "client not available".dimmed()),
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "decide",
            "verdict": verdict,
            "status": status,
            "instruction": instruction,
        }))?,
    }
    Ok(())
}

// ──────────────────── replay ────────────────────

/// One replay line: a bare snapshot or a snapshot with slide captions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReplayLine {
    Framed {
        status: StatusSnapshot,
        #[serde(default)]
        slides: Vec<String>,
    },
    Bare(StatusSnapshot),
}

impl ReplayLine {
    fn into_parts(self) -> (StatusSnapshot, Vec<SlideshowAsset>) {
        match self {
            Self::Framed { status, slides } => {
                let assets = slides
                    .into_iter()
                    .map(|name| {
                        let image = ImageHandle::new(name.clone(), Vec::new());
                        SlideshowAsset::new(name, image)
                    })
                    .collect();
                (status, assets)
            }
            Self::Bare(status) => (status, Vec::new()),
        }
    }
}

fn run_replay(cli: &Cli, config: &Config, args: &ReplayArgs) -> Result<(), CliError> {
    let raw = fs::read_to_string(&args.input).map_err(|e| {
        CliError::User(format!("cannot read {}: {e}", args.input.display()))
    })?;
    let mode = output_mode(cli);
    let decider = decider_for(config);
    let mut model = SurfaceModel::default();
    let _ = update(
        &mut model,
        SurfaceMsg::Attached {
            viewport: viewport_of(config, args.viewport),
        },
    );

    let mut renders = 0usize;
    let mut suppressed = 0usize;
    for (index, line) in raw.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: ReplayLine = serde_json::from_str(line)
            .map_err(|e| CliError::User(format!("line {line_no}: {e}")))?;
        let (status, assets) = parsed.into_parts();

        let verdict = gate::evaluate(&model.displayed, &status);
        let rendered = drive(&mut model, &decider, status, &assets);
        match verdict {
            GateVerdict::Render => renders += 1,
            GateVerdict::Unchanged => suppressed += 1,
            GateVerdict::Unavailable => {}
        }

        match mode {
            OutputMode::Human => {
                let label = match verdict {
                    GateVerdict::Render => "render".green(),
                    GateVerdict::Unchanged => "same  ".dimmed(),
                    GateVerdict::Unavailable => "n/a   ".yellow(),
                };
                let summary = rendered.as_ref().map(RenderInstruction::summary);
                println!("{line_no:>4} {label} {}", summary.unwrap_or_default());
            }
            OutputMode::Json => write_json_line(&json!({
                "line": line_no,
                "verdict": verdict,
                "view": rendered.as_ref().map(RenderInstruction::view_label),
                "instruction": rendered,
            }))?,
        }
    }

    match mode {
        OutputMode::Human => println!(
            "{} renders, {} suppressed",
            renders.to_string().bold(),
            suppressed.to_string().bold()
        ),
        OutputMode::Json => write_json_line(&json!({
            "command": "replay",
            "renders": renders,
            "suppressed": suppressed,
            "counters": model.counters,
        }))?,
    }
    Ok(())
}

/// Run one status through the reducer in-process, returning the rendered
/// instruction if the gate accepted it.
fn drive(
    model: &mut SurfaceModel,
    decider: &PresentationDecider,
    status: StatusSnapshot,
    assets: &[SlideshowAsset],
) -> Option<RenderInstruction> {
    let mut rendered = None;
    for cmd in update(model, SurfaceMsg::StatusChanged(status)).flatten() {
        let SurfaceCmd::Decide(status) = cmd else {
            continue;
        };
        let (instruction, probe_error) = decider.decide_traced(&status, &model.viewport, assets);
        for cmd in update(
            model,
            SurfaceMsg::Decided {
                status: *status,
                instruction: Box::new(instruction),
                probe_error,
            },
        )
        .flatten()
        {
            if let SurfaceCmd::Render(instruction) = cmd {
                rendered = Some(*instruction);
            }
        }
    }
    rendered
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, config: &Config) -> Result<(), CliError> {
    let hash = config.stable_hash()?;
    match output_mode(cli) {
        OutputMode::Human => {
            let toml_str = toml::to_string_pretty(config)
                .map_err(|e| CliError::Runtime(format!("failed to render config: {e}")))?;
            println!("# {} (hash {hash})", config.paths.config_file.display());
            print!("{toml_str}");
        }
        OutputMode::Json => write_json_line(&json!({
            "command": "config",
            "hash": hash,
            "config": config,
        }))?,
    }
    Ok(())
}

// ──────────────────── watch ────────────────────

#[cfg(feature = "watch")]
mod watch {
    use std::io::BufRead;
    use std::thread;
    use std::time::Duration;

    use crossbeam_channel::{RecvTimeoutError, bounded};

    use compute_status::client::monitor::ClientMonitor;
    use compute_status::daemon::poller::spawn_poller;
    use compute_status::daemon::signals::SignalHandler;
    use compute_status::logger::activity::{ActivityLoggerConfig, spawn_logger};
    use compute_status::logger::jsonl::JsonlConfig;
    use compute_status::surface::runtime::{SurfaceRuntimeConfig, spawn_surface};

    use super::{
        Arc, CliError, Cli, Config, SysfsBatteryProbe, StateFileMonitor, TextSink,
        WatchArgs, io, output_mode, write_json_line,
    };

    /// Commands read from stdin while watching.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum WatchCommand {
        Click,
        Select(usize),
        Quit,
    }

    pub(super) fn parse_command(line: &str) -> Option<WatchCommand> {
        let mut words = line.split_whitespace();
        match (words.next()?, words.next()) {
            ("click", None) => Some(WatchCommand::Click),
            ("quit" | "q", None) => Some(WatchCommand::Quit),
            ("select", Some(n)) => n.parse().ok().map(WatchCommand::Select),
            _ => None,
        }
    }

    pub(super) fn run_watch(cli: &Cli, config: &Config, args: &WatchArgs) -> Result<(), CliError> {
        let mode = output_mode(cli);
        let signals = SignalHandler::new();

        let monitor = Arc::new(StateFileMonitor::new(
            &config.client.state_file,
            &config.client.control_file,
        ));
        let probe = Arc::new(SysfsBatteryProbe::new(&config.client.battery_capacity_path));

        let logger = if config.logging.enabled {
            Some(spawn_logger(ActivityLoggerConfig {
                jsonl_config: JsonlConfig::from(&config.logging),
                ..ActivityLoggerConfig::default()
            })?)
        } else {
            None
        };

        let (handle, join) = spawn_surface(
            SurfaceRuntimeConfig {
                slideshow: config.slideshow,
                config_hash: config.stable_hash()?,
                ..SurfaceRuntimeConfig::default()
            },
            monitor.clone(),
            probe,
            Box::new(TextSink::new(mode)),
            logger.as_ref().map(|(h, _)| h.clone()),
        )?;
        handle.attach(args.viewport.width, args.viewport.height);

        let notifier = handle.clone();
        let poller = spawn_poller(
            monitor.clone(),
            Duration::from_millis(config.client.poll_interval_ms),
            move || notifier.notify(),
        )?;

        let (cmd_tx, cmd_rx) = bounded::<String>(16);
        thread::Builder::new()
            .name("cstat-stdin".to_string())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    let Ok(line) = line else { break };
                    if cmd_tx.send(line).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| CliError::Runtime(format!("failed to spawn stdin reader: {e}")))?;

        let mut stdin_open = true;
        while !signals.should_shutdown() {
            if signals.should_refresh() {
                monitor.force_refresh();
            }
            if !stdin_open {
                thread::sleep(Duration::from_millis(100));
                continue;
            }
            match cmd_rx.recv_timeout(Duration::from_millis(100)) {
                Ok(line) => match parse_command(&line) {
                    Some(WatchCommand::Click) => {
                        handle.activate_icon();
                    }
                    Some(WatchCommand::Select(index)) => {
                        handle.select_slide(index);
                    }
                    Some(WatchCommand::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => eprintln!("[CST-CLI] unknown command {line:?} (click, select N, quit)"),
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => stdin_open = false,
            }
        }

        poller.stop();
        handle.detach();
        handle.shutdown();
        let counters = join
            .join()
            .map_err(|_| CliError::Runtime("surface thread panicked".to_string()))?;

        if let Some((logger, logger_join)) = logger {
            logger.shutdown();
            let _ = logger_join.join();
        }

        match mode {
            super::OutputMode::Human => eprintln!(
                "[CST-CLI] {} notifications, {} renders, {} suppressed",
                counters.notifications, counters.renders, counters.suppressed
            ),
            super::OutputMode::Json => write_json_line(&serde_json::json!({
                "command": "watch",
                "counters": counters,
            }))?,
        }
        Ok(())
    }
}

// ──────────────────── sink ────────────────────

/// Prints instructions to stdout.
struct TextSink {
    mode: OutputMode,
}

impl TextSink {
    const fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    fn emit(&self, payload: &Value) {
        if let Err(e) = write_json_line(payload) {
            eprintln!("[CST-CLI] {e}");
        }
    }
}

impl RenderSink for TextSink {
    fn render(&mut self, instruction: &RenderInstruction) {
        match self.mode {
            OutputMode::Human => {
                let tag = match instruction.view_label() {
                    "disabled" => instruction.view_label().red(),
                    "paused" | "restarting" => instruction.view_label().yellow(),
                    "idle" => instruction.view_label().blue(),
                    other => other.green(),
                };
                println!("{} {}", tag.bold(), instruction.summary());
            }
            OutputMode::Json => self.emit(&json!({ "render": instruction })),
        }
    }

    fn update_slide(&mut self, update: &SelectionUpdate) {
        match self.mode {
            OutputMode::Human => println!(
                "{} {} ({})",
                "slide".green(),
                update.caption,
                update.image.as_ref().map_or("caption only", ImageHandle::label)
            ),
            OutputMode::Json => self.emit(&json!({ "slide": update })),
        }
    }

    fn warn(&mut self, message: &str) {
        match self.mode {
            OutputMode::Human => eprintln!("{} {message}", "warning:".yellow().bold()),
            OutputMode::Json => self.emit(&json!({ "warning": message })),
        }
    }
}

// ──────────────────── helpers ────────────────────

fn viewport_of(config: &Config, args: ViewportArgs) -> ViewportConstraints {
    ViewportConstraints::new(args.width, args.height, &config.slideshow)
}

fn decider_for(config: &Config) -> PresentationDecider {
    let probe: Arc<dyn BatteryProbe> =
        Arc::new(SysfsBatteryProbe::new(&config.client.battery_capacity_path));
    PresentationDecider::new(probe)
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("CSTAT_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute_status::client::status::{ComputingStatus, SuspendReason};

    #[test]
    fn output_mode_resolution_honors_precedence() {
        assert_eq!(resolve_output_mode(true, Some("human"), true), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("json"), true), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("human"), false), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, Some("auto"), true), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, None, false), OutputMode::Json);
    }

    #[test]
    fn exit_codes_split_user_and_environment_failures() {
        let missing = CliError::Status(StatusError::MissingConfig {
            path: PathBuf::from("/nope.toml"),
        });
        assert_eq!(missing.exit_code(), 1);
        let unreadable = CliError::Status(StatusError::ClientState {
            path: PathBuf::from("/status.json"),
            details: "gone".to_string(),
        });
        assert_eq!(unreadable.exit_code(), 2);
        assert_eq!(CliError::User("bad".to_string()).exit_code(), 1);
    }

    #[test]
    fn parses_decide_with_viewport() {
        let cli = Cli::try_parse_from([
            "cstat", "decide", "--status", "s.json", "--height", "900", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Decide(args) => {
                assert_eq!(args.viewport.height, 900);
                assert_eq!(args.viewport.width, 720);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn replay_lines_accept_bare_and_framed_snapshots() {
        let bare: ReplayLine =
            serde_json::from_str(r#"{"setup_status":"available","computing_status":"idle"}"#)
                .unwrap();
        let (status, assets) = bare.into_parts();
        assert_eq!(status.computing_status, ComputingStatus::Idle);
        assert!(assets.is_empty());

        let framed: ReplayLine = serde_json::from_str(
            r#"{"status":{"setup_status":"available","computing_status":"suspended",
                "computing_suspend_reason":4},"slides":["A","B"]}"#,
        )
        .unwrap();
        let (status, assets) = framed.into_parts();
        assert_eq!(status.computing_suspend_reason, SuspendReason::UserRequested);
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[1].project_name, "B");
    }

    #[test]
    fn drive_renders_once_per_change() {
        let decider = PresentationDecider::new(Arc::new(compute_status::client::monitor::NoBattery));
        let mut model = SurfaceModel::default();
        let _ = update(
            &mut model,
            SurfaceMsg::Attached {
                viewport: ViewportConstraints::default(),
            },
        );
        let idle = StatusSnapshot::available(ComputingStatus::Idle);
        assert!(drive(&mut model, &decider, idle.clone(), &[]).is_some());
        assert!(drive(&mut model, &decider, idle, &[]).is_none());
    }

    #[cfg(feature = "watch")]
    #[test]
    fn watch_commands_parse() {
        use watch::{WatchCommand, parse_command};
        assert_eq!(parse_command("click"), Some(WatchCommand::Click));
        assert_eq!(parse_command(" select 2 "), Some(WatchCommand::Select(2)));
        assert_eq!(parse_command("quit"), Some(WatchCommand::Quit));
        assert_eq!(parse_command("select x"), None);
        assert_eq!(parse_command("dance"), None);
        assert_eq!(parse_command(""), None);
    }
}
