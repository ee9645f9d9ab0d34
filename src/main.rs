use anyhow::{Context, Result};
use clap::Parser;
use cloak_fx::capture::{CaptureSource, WebcamCapture};
use cloak_fx::cloak::{mask_to_frame, Compositor};
use cloak_fx::config::{parse_hsv, CloakConfig};
use cloak_fx::output::{OutputSink, V4L2Output};
use cloak_fx::CloakError;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: String,

    /// Capture resolution width
    #[arg(long, default_value_t = 1280)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 720)]
    capture_height: u32,

    /// Output resolution width
    #[arg(long, default_value_t = 1280)]
    output_width: u32,

    /// Output resolution height
    #[arg(long, default_value_t = 720)]
    output_height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// TOML file with lower_bound, upper_bound and frames_needed
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lower HSV bound of the cloak color, as H,S,V (hue 0-179)
    #[arg(long, value_parser = parse_hsv)]
    lower_hsv: Option<[u8; 3]>,

    /// Upper HSV bound of the cloak color, as H,S,V (hue 0-179)
    #[arg(long, value_parser = parse_hsv)]
    upper_hsv: Option<[u8; 3]>,

    /// Number of frames averaged into the background before cloaking starts
    #[arg(long)]
    frames_needed: Option<usize>,

    /// Show the cloak mask (white = cloak) instead of the composited video
    #[arg(long)]
    show_mask: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => CloakConfig::load(path)?,
        None => CloakConfig::default(),
    }
    .with_overrides(args.lower_hsv, args.upper_hsv, args.frames_needed);

    let compositor = config
        .build_compositor()
        .context("Invalid cloak configuration")?;

    tracing::info!("cloak-fx starting");
    tracing::info!(
        "Cloak color: HSV {:?} to {:?}",
        config.lower_bound,
        config.upper_bound
    );
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);
    tracing::info!("Output: {}x{}", args.output_width, args.output_height);
    tracing::info!("Target FPS: {}", args.fps);

    // Initialize capture
    let mut capture = WebcamCapture::new(
        args.input_device,
        args.capture_width,
        args.capture_height,
    )
    .context("Failed to initialize webcam capture")?;

    // Initialize output
    let mut output = V4L2Output::new(&args.output_device, args.output_width, args.output_height)
        .context("Failed to initialize v4l2loopback output")?;

    tracing::info!(
        "Step out of the frame: the first {} frames are used as background",
        config.frames_needed
    );

    run_pipeline(&mut capture, &mut output, compositor, args.fps, args.show_mask)?;

    Ok(())
}

fn run_pipeline<C, O>(
    capture: &mut C,
    output: &mut O,
    mut compositor: Compositor,
    target_fps: u32,
    show_mask: bool,
) -> Result<()>
where
    C: CaptureSource,
    O: OutputSink,
{
    let frame_duration = Duration::from_secs_f32(1.0 / target_fps.max(1) as f32);
    let mut frame_count = 0u64;
    let mut dropped_count = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_process_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    tracing::info!("Starting main pipeline loop, show_mask={}", show_mask);
    tracing::info!("Press Ctrl+C to stop");

    loop {
        let loop_start = Instant::now();

        // Capture frame
        let capture_start = Instant::now();
        let frame = capture
            .capture_frame()
            .context("Failed to capture frame")?;
        total_capture_time += capture_start.elapsed();

        // Learn or cloak
        let process_start = Instant::now();
        let output_frame = match compositor.process(&frame) {
            Ok(_) if show_mask && compositor.is_active() => {
                mask_to_frame(&compositor.refined_mask(&frame)?)
            }
            Ok(composited) => composited,
            Err(CloakError::DimensionMismatch { .. }) => {
                dropped_count += 1;
                tracing::warn!(
                    "Dropping frame {}x{}, session is {:?} ({} dropped so far)",
                    frame.width(),
                    frame.height(),
                    compositor.dimensions(),
                    dropped_count
                );
                continue;
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to process frame")),
        };
        total_process_time += process_start.elapsed();

        // Output frame
        let output_start = Instant::now();
        output
            .write_frame(&output_frame)
            .context("Failed to write frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_process_ms = total_process_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let total_ms = avg_capture_ms + avg_process_ms + avg_output_ms;
            let actual_fps = 1000.0 / total_ms;

            tracing::info!(
                "Frame {} ({:?}): capture={:.1}ms, process={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}",
                frame_count,
                compositor.phase(),
                avg_capture_ms,
                avg_process_ms,
                avg_output_ms,
                total_ms,
                actual_fps
            );
        }

        // Frame rate limiting
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}
