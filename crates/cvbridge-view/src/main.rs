//! cvbridge-view: show a camera or video file in a window
//!
//! The main thread drives the native pump for the whole run; capture,
//! display and key handling happen on a worker thread through the bridge.
//!
//! ## Usage
//!
//! ```bash
//! cvbridge-view --camera 0
//! cvbridge-view --file clip.avi --delay 40
//! cvbridge-view --software --max-frames 100 --log-level debug
//! ```
//!
//! ESC closes the window.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use cvbridge::highgui::{self, Window, WindowFlags};
use cvbridge::{Bridge, BridgeConfig, Capture, ClipSpec, NativeApi, SoftwareBackend};
use tracing::info;

const ESC: i32 = 27;

#[derive(Parser, Debug)]
#[command(name = "cvbridge-view")]
#[command(about = "Show a camera or video file in a window")]
#[command(version)]
struct Args {
    /// Camera index (negative picks any camera)
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    camera: i32,

    /// Video file to play instead of a camera
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Window title
    #[arg(short, long, default_value = "cvbridge")]
    window: String,

    /// Milliseconds to wait for a key between frames
    #[arg(short, long, default_value_t = 30)]
    delay: u64,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Bridge configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the in-process software provider
    #[arg(long)]
    software: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    cvbridge::logging::init_with_filter(&args.log_level);

    let mut config = match &args.config {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default(),
    };
    config.executor.require_main_thread = true;

    let (bridge, pump) = Bridge::start(config, provider(&args));
    let viewer = thread::Builder::new()
        .name("viewer".to_string())
        .spawn(move || view(&bridge, &args))?;

    // Returns once the viewer has dropped its bridge
    pump.drive()?;

    let shown = viewer.join().map_err(|_| "viewer thread panicked")??;
    info!(frames = shown, "done");
    Ok(())
}

fn provider(args: &Args) -> Arc<dyn NativeApi> {
    #[cfg(feature = "opencv")]
    if !args.software {
        return Arc::new(cvbridge::OpenCv::new());
    }
    #[cfg(not(feature = "opencv"))]
    if !args.software {
        tracing::warn!("built without the opencv feature, using the software provider");
    }

    let spec = ClipSpec::new(640, 480);
    let mut backend = SoftwareBackend::new().with_camera(args.camera, spec);
    if let Some(file) = &args.file {
        backend = backend.with_clip(file.to_string_lossy(), spec.with_frames(300));
    }
    Arc::new(backend)
}

/// Show frames until ESC, end of stream or the frame limit; returns the
/// number of frames shown.
fn view(bridge: &Bridge, args: &Args) -> cvbridge::Result<u64> {
    let mut capture = match &args.file {
        Some(path) => Capture::from_file(bridge, path)?,
        None => Capture::from_camera(bridge, args.camera)?,
    };
    let window = Window::new(bridge, &args.window, WindowFlags::AutoSize)?;
    let delay = Duration::from_millis(args.delay.max(1));
    info!(window = window.name(), provider = bridge.provider(), "viewing");

    let mut shown = 0;
    loop {
        let Some(frame) = capture.query_frame()? else {
            info!("end of stream");
            break;
        };
        window.show(&frame)?;
        shown += 1;

        if let Some(key) = highgui::wait_key(bridge, delay)? {
            if key & 0xff == ESC {
                break;
            }
        }
        if args.max_frames.is_some_and(|max| shown >= max) {
            break;
        }
    }
    Ok(shown)
}
