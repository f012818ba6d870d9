// What you SEE:
// • The uploaded photo, fitted into an 800x600 canvas, with the overlay on top.
// • Drag the overlay with the left mouse; hold Shift while dragging to rotate.
// • Mouse wheel over the overlay scales it.
// • S saves (or previews on touch hosts), P previews, Esc closes preview / quits.

use std::fs;
use std::time::Instant;

use bolmaker::assets::ImageHandle;
use bolmaker::cli::CliArgs;
use bolmaker::config::EditorConfig;
use bolmaker::error::Error;
use bolmaker::export::{deliver, export_frame, DesktopHost, ExportMode, Host, Preview};
use bolmaker::gesture::InputEvent;
use bolmaker::logging;
use bolmaker::session::EditSession;
use bolmaker::types::{FrameBuffer, Point};
use bolmaker::window::{Drawer, PointerTracker};
use clap::Parser;
use tracing::{info, warn};

fn main() -> Result<(), Error> {
    let args = CliArgs::parse();

    /* --- Config + logging --- */
    let mut config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    logging::init(args.verbose || config.debug);
    config.initial_overlay = args.transform_over(config.initial_overlay);
    let start = config.initial_overlay;
    if !(start.width > 0.0 && start.height > 0.0)
        || start.width > config.max_overlay_width
        || start.height > config.max_overlay_height
    {
        return Err(Error::Config(format!("overlay size {}x{} out of bounds", start.width, start.height)));
    }

    /* --- Session: background from the command line, shared overlay asset --- */
    let overlay_path = args.overlay.clone().unwrap_or_else(|| config.overlay_asset.clone());
    let mut session = EditSession::new(
        &config,
        ImageHandle::from_path(&args.background),
        ImageHandle::from_path(&overlay_path),
    );
    let mut host = DesktopHost::new(&args.out_dir, args.touch);

    if args.headless {
        return run_headless(&args, &config, &mut session, &mut host);
    }

    /* --- Window sized to the logical canvas --- */
    let (w, h) = session.canvas_size();
    let mut drawer = Drawer::new("bolmaker", w, h)?;
    let mut tracker = PointerTracker::default();
    let save_mode = ExportMode::for_host(host.capabilities());
    let blank = FrameBuffer::new(w, h);
    let mut preview: Option<Preview> = None;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() {
        let now = Instant::now();

        /* 1) Inputs. The window is the canvas, so its origin is (0,0). */
        let events = tracker.update(drawer.mouse_pos(), drawer.left_mouse_down(), drawer.shift_down(), drawer.scroll_y());
        if let Some(shown) = &preview {
            // Preview is modal: input never reaches the overlay.
            if drawer.s_pressed_once() {
                if let Err(e) = host.download(&shown.artifact) {
                    warn!(error = %e, "saving preview failed");
                }
            }
            if drawer.esc_pressed_once() || events.iter().any(|e| matches!(e, InputEvent::PointerDown { .. })) {
                preview = None;
            }
        } else {
            if drawer.esc_pressed_once() {
                break;
            }
            // Focus lost mid-drag: the button-up will never arrive.
            if !drawer.is_active() {
                session.cancel_gesture();
            }
            for event in &events {
                session.handle_input(event, Point::default());
            }
            if drawer.s_pressed_once() {
                session.request_export(save_mode, now);
            }
            if drawer.p_pressed_once() {
                session.request_export(ExportMode::Preview, now);
            }
        }

        /* 2) Resume rendering; fire a due export. */
        let outcome = session.tick(now, &mut host);
        if let Some(e) = outcome.render_error {
            warn!(error = %e, "frame not rendered");
        }
        match outcome.export {
            Some(Ok(delivery)) => info!(?delivery, "export delivered"),
            Some(Err(e)) => warn!(error = %e, "export failed"),
            None => {}
        }
        if let Some(p) = host.take_preview() {
            preview = Some(p);
        }

        /* 3) Present: preview if open, else the last finished frame. */
        let frame = match &preview {
            Some(p) => &p.frame,
            None => session.frame().unwrap_or(&blank),
        };
        drawer.present(frame)?;
    }

    Ok(())
}

/// Render once with the configured transform and write the result.
fn run_headless(
    args: &CliArgs,
    config: &EditorConfig,
    session: &mut EditSession,
    host: &mut DesktopHost,
) -> Result<(), Error> {
    let outcome = session.tick(Instant::now(), host);
    if let Some(e) = outcome.render_error {
        return Err(e);
    }
    let Some(frame) = session.frame() else {
        return Err(Error::ImageDecode("render did not complete".into()));
    };
    match &args.output {
        Some(path) => {
            let artifact = export_frame(frame, session.background_name(), &config.filename_suffix)?;
            fs::write(path, &artifact.bytes)?;
            info!(path = %path.display(), "written");
        }
        None => {
            deliver(frame, session.background_name(), &config.filename_suffix, ExportMode::Save, host)?;
        }
    }
    Ok(())
}
