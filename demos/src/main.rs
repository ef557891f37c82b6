//! Headless pickview driver
//!
//! Loads model files into a viewer context, optionally runs a plane or
//! trajectory selection against the processing service by clicking a small
//! grid of pixels around the view centre, and prints the resulting object
//! list.
//!
//! ```text
//! pickview-demo scan.ply --select plane --service-url http://localhost:5000
//! RUST_LOG=pickview_viewer=debug pickview-demo model.obj
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use pickview_viewer::{AppContext, AppEvent, Frame, RenderSink, ViewerConfig};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Pixel spacing of the pick grid
const PICK_SPACING: f32 = 4.0;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Selection {
    Plane,
    Spline,
}

impl Selection {
    fn control(self) -> AppEvent {
        match self {
            Selection::Plane => AppEvent::ActivatePlane,
            Selection::Spline => AppEvent::ActivateSpline,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Load models and run remote plane/trajectory fitting headlessly")]
struct Args {
    /// OBJ or PLY files to load
    files: Vec<PathBuf>,
    /// JSON viewer configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the processing service base URL
    #[arg(long)]
    service_url: Option<String>,
    /// Pick points around the view centre and submit them
    #[arg(long, value_enum)]
    select: Option<Selection>,
    /// Number of points to pick; defaults to the operation's minimum
    #[arg(long)]
    picks: Option<usize>,
}

#[derive(Default)]
struct LogSink {
    frames: usize,
}

impl RenderSink for LogSink {
    fn render(&mut self, frame: &Frame<'_>) {
        self.frames += 1;
        debug!(frame = self.frames, nodes = frame.renderables.len(), eye = ?frame.eye, "frame");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path).with_context(|| format!("load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if let Some(url) = args.service_url {
        config.service.base_url = url;
    }
    let timeout = Duration::from_secs(config.service.timeout_secs + 1);

    let runtime = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    let mut app = AppContext::with_http_service(config, runtime.handle().clone())?;
    let mut sink = LogSink::default();

    for path in &args.files {
        let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        app.dispatch(AppEvent::LoadFile { name, bytes });
        println!("{}", app.status());
    }

    if let Some(selection) = args.select {
        run_selection(&mut app, &mut sink, selection, args.picks, timeout)?;
    }
    app.tick(&mut sink);

    for row in app.registry().list() {
        let state = if row.visible { "shown" } else { "hidden" };
        println!("{:>8}  {state:<6}  {}", row.id.to_string(), row.name);
    }
    println!("{}", app.status());
    Ok(())
}

fn run_selection(
    app: &mut AppContext,
    sink: &mut LogSink,
    selection: Selection,
    picks: Option<usize>,
    timeout: Duration,
) -> Result<()> {
    let params = &app.config().selection;
    let required = match selection {
        Selection::Plane => params.min_plane_points,
        Selection::Spline => params.min_spline_points,
    };
    let picks = picks.unwrap_or(required);

    app.dispatch(selection.control());

    let viewport = app.viewport();
    let side = (picks as f32).sqrt().ceil().max(1.0) as usize;
    let offset = (side as f32 - 1.0) * PICK_SPACING * 0.5;
    for i in 0..picks {
        let x = viewport.width * 0.5 - offset + (i % side) as f32 * PICK_SPACING;
        let y = viewport.height * 0.5 - offset + (i / side) as f32 * PICK_SPACING;
        app.dispatch(AppEvent::Click { x, y });
    }
    println!("{}", app.status());

    app.dispatch(selection.control());
    println!("{}", app.status());

    let deadline = Instant::now() + timeout;
    while app.selection().is_request_pending() {
        if Instant::now() > deadline {
            bail!("no reply from the processing service within {timeout:?}");
        }
        app.tick(sink);
        std::thread::sleep(Duration::from_millis(20));
    }
    Ok(())
}
