// Replays a directory of recorded frames through the tracker and prints the paddle
// positions for every tick. Useful for tuning the color range offline.

use anyhow::Context;
use clap::Parser;
use paddle_vision::core_modules::color_mask::compute_mask;
use paddle_vision::core_modules::utils::image_helper::image_helper;
use paddle_vision::frame_source::ImageSequenceSource;
use paddle_vision::{AcquisitionError, GestureController, TrackerConfig, TrackingPipeline, TrackingState};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Replay recorded frames through the paddle tracker")]
struct Args {
    /// Directory of image files, processed in file name order.
    frames_dir: PathBuf,

    /// TOML file with tracker settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mirror frames horizontally before tracking.
    #[arg(long)]
    mirror: bool,

    /// Write each frame's mask and annotated frame into this directory.
    #[arg(long)]
    dump_masks: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrackerConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => TrackerConfig::default(),
    };
    config.mirror |= args.mirror;

    if let Some(dir) = &args.dump_masks {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let source = ImageSequenceSource::from_dir(&args.frames_dir)
        .with_context(|| format!("reading {}", args.frames_dir.display()))?;
    let Some((_, height)) = source.next_dimensions()? else {
        info!("no frames to replay");
        return Ok(());
    };

    let pipeline = TrackingPipeline::new(config)?;
    let mut controller = GestureController::new(source, pipeline, TrackingState::centered(height));

    loop {
        let outcome = match controller.step_detailed() {
            Ok(outcome) => outcome,
            Err(AcquisitionError::Exhausted) => break,
            Err(err) => return Err(err).context("frame acquisition failed"),
        };

        let update = &outcome.update;
        let observed: Vec<String> = update
            .positions
            .iter()
            .map(|p| format!("{}=({}, {})", p.side, p.x, p.y))
            .collect();
        println!(
            "tick {:>5}  left_y {:>4}  right_y {:>4}  blobs {:>3}  [{}]",
            update.tick,
            update.state.left_y,
            update.state.right_y,
            outcome.report.blobs_found,
            observed.join(", ")
        );

        if let Some(dir) = &args.dump_masks {
            let frame = if controller.pipeline().config().mirror {
                outcome.frame.mirrored()
            } else {
                outcome.frame
            };
            let mask = compute_mask(&frame, &controller.pipeline().config().color_range);
            image_helper::save_mask(dir.join(format!("mask_{:05}.png", update.tick)), &mask)?;
            image_helper::save_frame(
                dir.join(format!("frame_{:05}.png", update.tick)),
                &frame,
                &outcome.report.candidates,
            )?;
        }
    }

    info!(ticks = controller.ticks(), "replay complete");
    Ok(())
}
