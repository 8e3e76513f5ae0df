use clap::Parser;
use log::LevelFilter;
use std::io;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use pixelcam::cli::{handle_config_action, list_devices, Args, Command, RunSettings};
use pixelcam::config::Config;
use pixelcam::event_loop::{self, FrontEnd};
use pixelcam::render_loop::{NullSink, SharedSink};
use pixelcam::stream::{spawn_controller, NativeBackend, RouteOutcome, StreamEvent, StreamManager};
use pixelcam::terminal::{RawModeGuard, StatusBar, TerminalSink};

/// Our own modules log at `info` when headless and `warn` under the preview
/// (stderr shares the screen with it). `RUST_LOG` overrides both.
fn init_logging(headless: bool) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module(
        "pixelcam",
        if headless { LevelFilter::Info } else { LevelFilter::Warn },
    );
    builder.parse_default_env();
    builder.format_timestamp_millis().init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.headless);

    match args.command {
        Some(Command::ListDevices { video, audio }) => {
            if let Err(e) = list_devices(video, audio) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Command::Config { action }) => {
            if let Err(e) = handle_config_action(action, args.config.as_deref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            if let Err(e) = run(&args) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let config = Config::load(args.config.as_deref()).map_err(|e| e.to_string())?;
    let settings = RunSettings::resolve(args, &config).map_err(|e| e.to_string())?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to create async runtime: {}", e))?;
    rt.block_on(run_app(settings))
}

async fn run_app(settings: RunSettings) -> Result<(), String> {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut manager = StreamManager::new(
        NativeBackend::new(),
        settings.constraints.clone(),
        settings.block,
    )
    .with_events(event_tx);

    if let Err(e) = manager.refresh_devices().await {
        log::warn!("Could not list devices: {}", e);
    }
    manager
        .start()
        .await
        .map_err(|e| format!("Failed to start capture: {}", e))?;

    if let Some(output) = &settings.audio_output {
        match manager.route_audio_output(output).await {
            Ok(RouteOutcome::Routed(id)) => log::info!("Audio output routed to {}", id),
            Ok(RouteOutcome::FellBack(id)) => {
                log::warn!("Speaker '{}' unavailable, using {:?}", output, id)
            }
            Ok(RouteOutcome::Unsupported) => {}
            Err(e) => log::warn!("Could not route audio output: {}", e),
        }
    }

    if settings.headless {
        drop(event_rx);
        run_headless(manager, &settings).await
    } else {
        run_preview(manager, event_rx, &settings).await
    }
}

async fn run_headless(
    mut manager: StreamManager<NativeBackend>,
    settings: &RunSettings,
) -> Result<(), String> {
    let sink = Arc::new(Mutex::new(NullSink::default()));
    let shared: SharedSink = sink.clone();
    manager
        .start_rendering(shared, settings.rate)
        .await
        .map_err(|e| format!("Failed to start rendering: {}", e))?;
    log::info!(
        "Rendering headless at {} with {} blocks; press Ctrl-C to stop",
        settings.rate,
        settings.block
    );

    let (controller, task) = spawn_controller(manager);
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Could not wait for Ctrl-C: {}", e);
    }
    controller.shutdown().await;
    let _ = task.await;

    let frames = sink.lock().map(|s| s.frames_written()).unwrap_or(0);
    log::info!("Rendered {} frames", frames);
    Ok(())
}

async fn run_preview(
    mut manager: StreamManager<NativeBackend>,
    events: mpsc::UnboundedReceiver<StreamEvent>,
    settings: &RunSettings,
) -> Result<(), String> {
    let mut guard =
        RawModeGuard::enter().map_err(|e| format!("Failed to set up terminal: {}", e))?;
    let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));

    let sink = Arc::new(Mutex::new(TerminalSink::new(
        io::stdout(),
        settings.block,
        cols,
        rows,
    )));
    let front = FrontEnd::new(
        manager.devices().clone(),
        manager.selection().clone(),
        StatusBar::with_visibility(settings.status_bar),
        settings.block,
        settings.rate,
    );

    let shared: SharedSink = sink.clone();
    manager
        .start_rendering(shared, settings.rate)
        .await
        .map_err(|e| format!("Failed to start rendering: {}", e))?;

    let (controller, task) = spawn_controller(manager);
    let result = event_loop::run(front, controller.clone(), events, sink).await;

    controller.shutdown().await;
    let _ = task.await;
    let _ = guard.exit();

    result.map_err(|e| format!("Terminal error: {}", e))
}
