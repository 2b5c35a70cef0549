//! mt - macrotap CLI
//!
//! Author gesture presets from the terminal and dry-run them against the
//! simulated dispatcher.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use macrotap::headless::{HeadlessPrompt, HeadlessSurface};
use macrotap::prelude::*;
use macrotap::{to_local, Settings};

/// Size of the virtual surface presets are authored on.
const SURFACE: Size = Size {
    width: 1080.0,
    height: 1920.0,
};

#[derive(Parser)]
#[command(name = "mt")]
#[command(about = "macrotap - author and replay gesture macros")]
#[command(version)]
struct Cli {
    /// Storage root (default: ~/.macrotap)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append an action to a preset
    Add {
        /// Preset name
        preset: String,

        #[command(subcommand)]
        gesture: GestureArgs,
    },

    /// Show the actions of a preset
    Show {
        /// Preset name
        preset: String,
    },

    /// List saved presets
    List,

    /// Delete a preset
    Delete {
        /// Preset name
        preset: String,
    },

    /// Remove one action from a preset
    Remove {
        /// Preset name
        preset: String,
        /// Action id
        id: ActionId,
    },

    /// Enable or disable one action
    Toggle {
        /// Preset name
        preset: String,
        /// Action id
        id: ActionId,
    },

    /// Show or set the default loop count (0 or less loops forever)
    Loops {
        #[arg(allow_negative_numbers = true)]
        count: Option<i32>,
    },

    /// Replay a preset with the simulated dispatcher (Ctrl+C to stop)
    Play {
        /// Preset name
        preset: String,

        /// Loop count for this run (default: saved setting)
        #[arg(long, allow_negative_numbers = true)]
        loops: Option<i32>,
    },
}

#[derive(Subcommand)]
enum GestureArgs {
    /// Tap at a point
    Click {
        x: f32,
        y: f32,
        /// Pause after the tap in ms
        #[arg(long)]
        delay: Option<String>,
    },

    /// Press and hold at a point
    LongClick {
        x: f32,
        y: f32,
        /// Hold time in ms
        #[arg(long)]
        duration: Option<String>,
        /// Pause after the press in ms
        #[arg(long)]
        delay: Option<String>,
    },

    /// Swipe from one point to another
    Swipe {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        /// Pause after the swipe in ms
        #[arg(long)]
        delay: Option<String>,
    },

    /// Do nothing for a while
    Wait {
        /// Wait time in ms
        duration: Option<String>,
        /// Pause after the wait in ms
        #[arg(long)]
        delay: Option<String>,
    },
}

impl GestureArgs {
    fn kind(&self) -> ActionKind {
        match self {
            GestureArgs::Click { .. } => ActionKind::Click,
            GestureArgs::LongClick { .. } => ActionKind::LongClick,
            GestureArgs::Swipe { .. } => ActionKind::Swipe,
            GestureArgs::Wait { .. } => ActionKind::Wait,
        }
    }

    fn points(&self) -> Vec<AbsolutePoint> {
        match self {
            GestureArgs::Click { x, y, .. } | GestureArgs::LongClick { x, y, .. } => {
                vec![AbsolutePoint::new(*x, *y)]
            }
            GestureArgs::Swipe { x1, y1, x2, y2, .. } => {
                vec![AbsolutePoint::new(*x1, *y1), AbsolutePoint::new(*x2, *y2)]
            }
            GestureArgs::Wait { .. } => Vec::new(),
        }
    }

    fn delay(&self) -> Option<&str> {
        match self {
            GestureArgs::Click { delay, .. }
            | GestureArgs::LongClick { delay, .. }
            | GestureArgs::Swipe { delay, .. }
            | GestureArgs::Wait { delay, .. } => delay.as_deref(),
        }
    }

    fn duration(&self) -> Option<&str> {
        match self {
            GestureArgs::LongClick { duration, .. } | GestureArgs::Wait { duration, .. } => {
                duration.as_deref()
            }
            GestureArgs::Click { .. } | GestureArgs::Swipe { .. } => None,
        }
    }
}

#[derive(Serialize)]
struct Output<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Error>,
}

impl<T: Serialize> Output<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(e: Error) -> Output<()> {
        Output {
            success: false,
            data: None,
            error: Some(e),
        }
    }
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

/// Where presets and settings live.
struct Workspace {
    storage: PresetStorage,
    settings_path: PathBuf,
    json: bool,
}

impl Workspace {
    fn open(dir: Option<PathBuf>, json: bool) -> Result<Self> {
        let root = match dir {
            Some(dir) => dir,
            None => {
                let home = std::env::var("HOME").context("HOME not set")?;
                PathBuf::from(home).join(".macrotap")
            }
        };
        let storage = PresetStorage::with_dir(root.join("presets"))?;
        Ok(Self {
            storage,
            settings_path: root.join("settings.json"),
            json,
        })
    }

    fn settings(&self) -> Settings {
        Settings::load(&self.settings_path)
    }

    fn existing(&self, preset: &str) -> Result<Vec<Action>> {
        if !self.storage.exists(preset) {
            return Err(Error::preset_not_found(preset).into());
        }
        Ok(self.storage.load(preset)?)
    }

    fn report<T: Serialize>(&self, data: T, text: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            print_json(&Output::ok(data))
        } else {
            text(&data);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    let result = Workspace::open(cli.dir, json).and_then(|ws| match cli.command {
        Commands::Add { preset, gesture } => add(&ws, &preset, &gesture),
        Commands::Show { preset } => show(&ws, &preset),
        Commands::List => list(&ws),
        Commands::Delete { preset } => delete(&ws, &preset),
        Commands::Remove { preset, id } => remove(&ws, &preset, id),
        Commands::Toggle { preset, id } => toggle(&ws, &preset, id),
        Commands::Loops { count } => loops(&ws, count),
        Commands::Play { preset, loops } => play(&ws, &preset, loops),
    });

    if let Err(e) = result {
        match e.downcast_ref::<Error>() {
            Some(err) if json => {
                let _ = print_json(&Output::<()>::err(err.clone()));
            }
            _ => eprintln!("Error: {}", e),
        }
        std::process::exit(1);
    }
}

/// Headless authoring session holding `actions`.
fn session_for(actions: Vec<Action>) -> AuthoringSession<HeadlessSurface, HeadlessPrompt> {
    let mut session = AuthoringSession::new(HeadlessSurface::new(SURFACE), HeadlessPrompt::new());
    session.load_actions(actions);
    session
}

fn add(ws: &Workspace, preset: &str, gesture: &GestureArgs) -> Result<()> {
    let mut session = session_for(ws.storage.load(preset)?);
    session.begin_create(gesture.kind());

    // Loaded actions have no visuals yet, so every marker is a new one.
    let markers = session.surface().marker_ids();
    for (marker, target) in markers.into_iter().zip(gesture.points()) {
        let Some(center) = session.surface().marker_center(marker) else {
            continue;
        };
        let local = to_local(target, session.surface().offset());
        session.handle_event(SurfaceEvent::Drag {
            marker,
            dx: local.x - center.x,
            dy: local.y - center.y,
        });
    }
    if let Some(delay) = gesture.delay() {
        session.prompt_mut().type_delay_after(delay);
    }
    if let Some(duration) = gesture.duration() {
        session.prompt_mut().type_duration(duration);
    }
    let id = session.confirm().context("nothing to confirm")?;

    let actions = session.actions();
    ws.storage.save(preset, &actions)?;
    let action = actions
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| Error::action_not_found(id))?;
    ws.report(action, |a| {
        println!("Added {} {} to {}", a.kind, a.id, preset);
    })
}

fn show(ws: &Workspace, preset: &str) -> Result<()> {
    let actions = ws.existing(preset)?;
    ws.report(actions, |actions| {
        println!("Preset: {}", preset);
        println!("Actions: {}", actions.len());
        for a in actions {
            let points: Vec<String> = a
                .points
                .iter()
                .map(|p| format!("({}, {})", p.x, p.y))
                .collect();
            println!(
                "  {:>3} {:<10} {:<24} duration {}ms, after {}ms{}",
                a.id,
                a.kind.to_string(),
                points.join(" -> "),
                a.duration,
                a.delay_after,
                if a.enabled { "" } else { " (disabled)" }
            );
        }
    })
}

fn list(ws: &Workspace) -> Result<()> {
    let names = ws.storage.list()?;
    ws.report(names, |names| {
        if names.is_empty() {
            println!("No presets saved.");
        } else {
            for n in names {
                println!("{}", n);
            }
        }
    })
}

fn delete(ws: &Workspace, preset: &str) -> Result<()> {
    ws.storage.delete(preset)?;
    ws.report(serde_json::json!({ "deleted": preset }), |_| {
        println!("Deleted: {}", preset);
    })
}

fn remove(ws: &Workspace, preset: &str, id: ActionId) -> Result<()> {
    let mut session = session_for(ws.existing(preset)?);
    let removed = session
        .delete_action(id)
        .ok_or_else(|| Error::action_not_found(id))?;
    ws.storage.save(preset, &session.actions())?;
    ws.report(removed, |a| {
        println!("Removed {} {} from {}", a.kind, a.id, preset);
    })
}

fn toggle(ws: &Workspace, preset: &str, id: ActionId) -> Result<()> {
    let mut session = session_for(ws.existing(preset)?);
    let enabled = session
        .macros()
        .get(id)
        .map(|a| !a.enabled)
        .ok_or_else(|| Error::action_not_found(id))?;
    session.set_enabled(id, enabled);
    ws.storage.save(preset, &session.actions())?;
    ws.report(serde_json::json!({ "id": id, "enabled": enabled }), |_| {
        println!(
            "Action {} {}",
            id,
            if enabled { "enabled" } else { "disabled" }
        );
    })
}

fn loops(ws: &Workspace, count: Option<i32>) -> Result<()> {
    let mut settings = ws.settings();
    if let Some(count) = count {
        settings.loop_count = count;
        settings.save(&ws.settings_path)?;
    }
    ws.report(settings, |s| {
        if s.loop_count <= 0 {
            println!("Loop count: infinite");
        } else {
            println!("Loop count: {}", s.loop_count);
        }
    })
}

fn play(ws: &Workspace, preset: &str, loops: Option<i32>) -> Result<()> {
    let actions = ws.existing(preset)?;
    let loop_count = loops.unwrap_or_else(|| ws.settings().loop_count);

    let (notifier, notifications) = Notifier::channel();
    let player = Player::new(SimulatedDispatcher::new(), MacroHandle::from_actions(actions))
        .with_notifier(notifier);
    player.set_loop_count(loop_count);

    std::thread::spawn(move || {
        for n in notifications.iter() {
            debug!("notification: {:?}", n);
        }
    });

    let runtime = tokio::runtime::Runtime::new()?;
    let stats = runtime.block_on(async {
        player.start()?;
        let p = player.clone();
        ctrlc::set_handler(move || p.stop())?;
        player.wait_stopped().await;
        Ok::<_, anyhow::Error>(player.stats())
    })?;

    ws.report(stats, |s| {
        println!(
            "Done! {} loops, {} gestures ({} failed), {} waits",
            s.loops_completed, s.gestures_dispatched, s.gestures_failed, s.waits
        );
    })
}
