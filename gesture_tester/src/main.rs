use clap::Parser;
use opencv::{
    core::{Mat, Point, Rect, Scalar},
    highgui, imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use paddle_vision::core_modules::blob_detector::Blob;
use paddle_vision::{
    AcquisitionError, Frame, FrameSource, GestureController, TrackerConfig, TrackingPipeline, TrackingState,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const WINDOW: &str = "paddle_vision";
const PADDLE_WIDTH: i32 = 20;
const PADDLE_HEIGHT: i32 = 100;
const ESCAPE_KEY: i32 = 27;

#[derive(Parser, Debug)]
#[command(about = "Track two hands from a webcam and show the resulting paddles")]
struct Args {
    /// Camera device index.
    #[arg(long, default_value_t = 0)]
    camera: i32,

    /// TOML file with tracker settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show and track the raw camera image instead of the mirrored one.
    #[arg(long)]
    no_mirror: bool,
}

/// A webcam opened through OpenCV.
struct OpenCvCamera {
    capture: VideoCapture,
    frame: Mat,
}

impl OpenCvCamera {
    fn open(index: i32) -> Result<Self, AcquisitionError> {
        let capture = VideoCapture::new(index, videoio::CAP_ANY)
            .map_err(|err| AcquisitionError::DeviceUnavailable(err.to_string()))?;
        let opened = capture
            .is_opened()
            .map_err(|err| AcquisitionError::DeviceUnavailable(err.to_string()))?;
        if !opened {
            return Err(AcquisitionError::DeviceUnavailable(format!("camera {index} could not be opened")));
        }
        Ok(Self {
            capture,
            frame: Mat::default(),
        })
    }

    fn height(&self) -> Result<u32, AcquisitionError> {
        self.capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .map(|height| height as u32)
            .map_err(|err| AcquisitionError::DeviceUnavailable(err.to_string()))
    }
}

impl FrameSource for OpenCvCamera {
    fn next_frame(&mut self) -> Result<Frame, AcquisitionError> {
        let read_failed = |err: opencv::Error| AcquisitionError::ReadFailed(err.to_string());

        let grabbed = self.capture.read(&mut self.frame).map_err(read_failed)?;
        if !grabbed || self.frame.empty() {
            return Err(AcquisitionError::ReadFailed("camera returned no frame".into()));
        }

        // `try_clone` always yields a continuous buffer, which `data_bytes` requires.
        let continuous = self.frame.try_clone().map_err(read_failed)?;
        let data = continuous.data_bytes().map_err(read_failed)?.to_vec();
        Ok(Frame::from_bgr(continuous.cols() as u32, continuous.rows() as u32, data)?)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    // --- 1. Configuration ---
    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig {
            mirror: true,
            ..TrackerConfig::default()
        },
    };
    if args.no_mirror {
        config.mirror = false;
    }
    let mirror = config.mirror;

    // --- 2. Camera & Controller Initialization ---
    let camera = OpenCvCamera::open(args.camera)?;
    let initial_state = TrackingState::centered(camera.height()?);
    let pipeline = TrackingPipeline::new(config)?;
    let mut controller = GestureController::new(camera, pipeline, initial_state);

    highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE)?;
    info!(camera = args.camera, mirror, "tracking started, press ESC to quit");

    // --- 3. Main Processing Loop ---
    loop {
        let outcome = match controller.step_detailed() {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "skipping tick");
                if highgui::wait_key(16)? == ESCAPE_KEY {
                    break;
                }
                continue;
            }
        };

        // --- 4. Visualization ---
        // Draw in the same coordinates the tracker used.
        let frame = if mirror { outcome.frame.mirrored() } else { outcome.frame };
        let mut display = to_mat(&frame)?;
        draw_blobs(&mut display, &outcome.report.candidates)?;
        draw_paddles(&mut display, outcome.update.state, frame.width() as i32)?;

        highgui::imshow(WINDOW, &display)?;
        if highgui::wait_key(16)? == ESCAPE_KEY {
            break;
        }
    }

    info!(ticks = controller.ticks(), "tracking stopped");
    Ok(())
}

/// Copies a frame into a BGR `Mat` for display.
fn to_mat(frame: &Frame) -> opencv::Result<Mat> {
    let flat = Mat::from_slice(frame.as_bytes())?;
    let shaped = flat.reshape(3, frame.height() as i32)?;
    shaped.try_clone()
}

fn draw_blobs(display: &mut Mat, blobs: &[Blob]) -> opencv::Result<()> {
    for blob in blobs {
        let bounding_box = blob.bounding_box;
        let rect = Rect::new(
            bounding_box.x as i32,
            bounding_box.y as i32,
            bounding_box.width as i32,
            bounding_box.height as i32,
        );
        imgproc::rectangle(display, rect, Scalar::new(0.0, 255.0, 0.0, 0.0), 2, imgproc::LINE_8, 0)?;
        let (x, y) = blob.anchor();
        imgproc::circle(
            display,
            Point::new(x as i32, y as i32),
            4,
            Scalar::new(0.0, 255.0, 255.0, 0.0),
            -1,
            imgproc::LINE_8,
            0,
        )?;
    }
    Ok(())
}

fn draw_paddles(display: &mut Mat, state: TrackingState, width: i32) -> opencv::Result<()> {
    let paddles = [
        (PADDLE_WIDTH, state.left_y, Scalar::new(255.0, 0.0, 0.0, 0.0)),
        (width - PADDLE_WIDTH * 2, state.right_y, Scalar::new(0.0, 0.0, 255.0, 0.0)),
    ];
    for (x, y, color) in paddles {
        let rect = Rect::new(x, y - PADDLE_HEIGHT / 2, PADDLE_WIDTH, PADDLE_HEIGHT);
        imgproc::rectangle(display, rect, color, -1, imgproc::LINE_8, 0)?;
    }
    Ok(())
}
