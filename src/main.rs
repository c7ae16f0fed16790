use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use dockwave::dock::Rect;
use dockwave::{Config, DockApp, Icon, RecordingBackend};

static USAGE: &[&str] = &[
    "--sweep : Sweep a synthetic pointer across the main dock (default).",
    "--config <path> : Same, with the configuration read from <path>.",
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("info")
            .compact()
            .init();
    }

    let mut args = std::env::args().skip(1);
    let config = match args.next().as_deref() {
        None | Some("--sweep") => Config::load(),
        Some("--config") => {
            let path = PathBuf::from(args.next().context("--config needs a path")?);
            Config::from_path(&path)?
        }
        Some(other) => {
            tracing::error!("Unknown option: {}", other);
            println!("USAGE: dockwave [option]");
            println!();
            for line in USAGE {
                println!("\t{}", line);
            }
            return Ok(());
        }
    };

    run_sweep(config).await
}

/// Builds a demo dock and moves a pointer over it in real time.
async fn run_sweep(config: Config) -> anyhow::Result<()> {
    let screen = Rect::new(0, 0, config.screen.width as i32, config.screen.height as i32);
    let frame_ms = config.system.frame_interval_ms();
    let mut app = DockApp::new(config, RecordingBackend::new(screen))?;
    let main = app.main_dock();

    for (name, command) in [("terminal", "xterm"), ("browser", "firefox"), ("files", "nautilus")] {
        app.insert_icon(main, Icon::launcher(name, command, 48.0), false);
    }
    app.insert_icon(main, Icon::running_window("editor", 42, "Editor", 48.0), false);
    app.insert_icon(main, Icon::applet("clock", "clock", 48.0), false);
    let folder = app
        .insert_icon(main, Icon::launcher("folder", "", 48.0).with_order(10.0), false)
        .context("main dock vanished")?;
    let sub_dock = app.create_sub_dock(main, folder, "folder")?;
    for name in ["notes", "music"] {
        app.insert_icon(sub_dock, Icon::launcher(name, name, 48.0), false);
    }

    let dock = app.dock(main).context("main dock vanished")?;
    let start = dock.flat_row_offset() as i32;
    let end = start + dock.layout.flat_width as i32;
    let y = dock.window.height - dock.layout.min_height / 2;
    tracing::info!(
        "main dock {}x{} at ratio {:.2}",
        dock.layout.max_width,
        dock.layout.max_height,
        dock.layout.ratio
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(frame_ms));
    app.pointer_enter(main);
    let step = ((end - start) / 60).max(1);
    let mut x = start;
    while x <= end {
        ticker.tick().await;
        app.pointer_motion(main, x, y);
        app.advance_by(frame_ms);
        if let Some(frame) = app.snapshot(main) {
            let pointed = frame.icons.iter().find(|icon| icon.is_pointed);
            tracing::debug!(
                "x={} magnitude={:.2} pointed={:?}",
                x,
                frame.magnitude,
                pointed.map(|icon| icon.name.as_str())
            );
        }
        x += step;
    }

    app.pointer_leave(main, end, -10);
    // Auto-hide docks keep a hide-back timer around; a few seconds covers it.
    for _ in 0..(5000 / frame_ms).max(1) {
        if app.pending_timers() == 0 {
            break;
        }
        ticker.tick().await;
        app.advance_by(frame_ms);
    }

    for frame in app.snapshots() {
        tracing::info!(
            "{}: {:?} {:?}, {} icons",
            frame.name,
            frame.state,
            frame.window,
            frame.icons.len()
        );
    }
    tracing::info!("{} frames drawn", app.backend().frames_drawn());
    Ok(())
}
