// One editing session: created when a background is chosen, dropped when the
// user goes back to pick another. Owns every piece of state explicitly.
//
// input → gesture interpreter → transform model → (re-render) → frame
//                                                   export reads the frame
//
// Everything runs on the caller's thread. The shell calls `tick` once per
// frame; that is where a pending render resumes and a due export fires.

use std::task::Poll;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::assets::ImageHandle;
use crate::compositor::{Compositor, RenderJob};
use crate::config::EditorConfig;
use crate::error::Error;
use crate::export::{deliver, Delivery, ExportMode, Host};
use crate::gesture::{GestureInterpreter, GestureState, InputEvent, Response};
use crate::transform::TransformModel;
use crate::types::{FrameBuffer, OverlayTransform, Point};

/// Export requested but not read back yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingExport {
    pub mode: ExportMode,
    pub due: Instant,
}

/// What happened during one `tick`.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub rendered: bool,
    pub render_error: Option<Error>,
    pub export: Option<Result<Delivery, Error>>,
}

pub struct EditSession {
    model: TransformModel,
    gestures: GestureInterpreter,
    compositor: Compositor,
    background: ImageHandle,
    overlay: ImageHandle,
    suffix: String,
    export_delay: Duration,
    frame: Option<FrameBuffer>,
    job: Option<RenderJob>,
    pending_export: Option<PendingExport>,
}

impl EditSession {
    pub fn new(config: &EditorConfig, background: ImageHandle, overlay: ImageHandle) -> Self {
        let mut session = Self {
            model: config.transform_model(),
            gestures: GestureInterpreter::new(config.gesture_tuning()),
            compositor: Compositor::new(config.canvas_width, config.canvas_height, config.watermark_style()),
            background,
            overlay,
            suffix: config.filename_suffix.clone(),
            export_delay: config.export_delay(),
            frame: None,
            job: None,
            pending_export: None,
        };
        session.invalidate();
        session
    }

    pub fn transform(&self) -> OverlayTransform {
        self.model.get()
    }

    pub fn gesture_state(&self) -> &GestureState {
        self.gestures.state()
    }

    /// Last completed frame. Stays on screen while a newer render is pending
    /// or after one failed.
    pub fn frame(&self) -> Option<&FrameBuffer> {
        self.frame.as_ref()
    }

    pub fn canvas_size(&self) -> (usize, usize) {
        (self.compositor.width, self.compositor.height)
    }

    pub fn background_name(&self) -> &str {
        self.background.name()
    }

    pub fn render_pending(&self) -> bool {
        self.job.is_some()
    }

    pub fn pending_export(&self) -> Option<PendingExport> {
        self.pending_export
    }

    /// Feed one input event; any transform change schedules a full redraw.
    pub fn handle_input(&mut self, event: &InputEvent, canvas_origin: Point) -> Response {
        let response = self.gestures.handle(event, canvas_origin, &mut self.model);
        if response.changed {
            self.invalidate();
        }
        response
    }

    /// All contacts lost abnormally: drop the gesture, keep what it did.
    pub fn cancel_gesture(&mut self) {
        self.gestures.cancel();
    }

    /// Redraw, then read the surface back once `export_delay` has passed.
    pub fn request_export(&mut self, mode: ExportMode, now: Instant) {
        self.invalidate();
        let due = now + self.export_delay;
        debug!(?mode, "export scheduled");
        self.pending_export = Some(PendingExport { mode, due });
    }

    pub fn tick(&mut self, now: Instant, host: &mut dyn Host) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if let Some(job) = self.job.as_mut() {
            match job.advance(&self.compositor, &mut self.background, &mut self.overlay) {
                Poll::Pending => {}
                Poll::Ready(result) => {
                    if let Some(job) = self.job.take() {
                        match result {
                            Ok(()) => {
                                self.frame = Some(job.into_frame());
                                outcome.rendered = true;
                            }
                            Err(e) => outcome.render_error = Some(e),
                        }
                    }
                }
            }
        }

        let due = matches!(self.pending_export, Some(p) if now >= p.due);
        if due && self.job.is_none() {
            if let Some(pending) = self.pending_export.take() {
                outcome.export = Some(self.export_now(pending.mode, host));
            }
        }
        outcome
    }

    fn export_now(&self, mode: ExportMode, host: &mut dyn Host) -> Result<Delivery, Error> {
        let Some(frame) = self.frame.as_ref() else {
            warn!("export requested before any frame rendered");
            return Err(Error::ImageEncode("no rendered frame to export".into()));
        };
        deliver(frame, self.background.name(), &self.suffix, mode, host)
    }

    fn invalidate(&mut self) {
        self.job = Some(RenderJob::new(&self.compositor, self.model.get()));
    }
}
