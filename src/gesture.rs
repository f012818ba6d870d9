// Gesture interpreter: raw pointer / wheel / touch events in, transform mutations out.
//
// States:
//   Idle             nothing in progress
//   Dragging         one pointer (mouse or first touch) grabbed the overlay
//   PinchRotateZoom  two contacts; everything is relative to a snapshot taken
//                    when the second contact arrived, never incremental
//
// Wheel zoom and shift-drag rotation are stateless on top of that.

use crate::transform::TransformModel;
use crate::types::{OverlayTransform, Point};
use tracing::debug;

/// One raw input event, coordinates in client space (the canvas origin is
/// subtracted by the interpreter).
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    PointerDown { pos: Point },
    /// `movement_x` is the horizontal delta since the previous move;
    /// `modifier` is the rotate key (shift).
    PointerMove { pos: Point, movement_x: f32, modifier: bool },
    PointerUp,
    PointerLeave,
    Wheel { pos: Point, delta_y: f32 },
    /// `touches` always lists every contact still on the surface.
    TouchStart { touches: Vec<Point> },
    TouchMove { touches: Vec<Point> },
    TouchEnd { touches: Vec<Point> },
    /// Native pinch/pan gesture events some hosts emit alongside touches.
    PlatformGesture,
}

/// What the host should do after an event was handled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Response {
    pub changed: bool,          // transform was mutated → re-render
    pub suppress_default: bool, // host must swallow its own zoom/pan/scroll
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureTuning {
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    /// Pixels of horizontal movement per degree of shift-drag rotation.
    pub rotate_sensitivity: f32,
}

impl Default for GestureTuning {
    fn default() -> Self {
        Self { zoom_in_factor: 1.05, zoom_out_factor: 0.95, rotate_sensitivity: 10.0 }
    }
}

/// Baseline captured when a single pointer grabs the overlay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSession {
    pub offset: Point, // pointer minus overlay top-left, fixed for the whole drag
}

/// Baseline captured when the second contact arrives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchSession {
    pub distance: f32,
    pub angle: f32,     // radians
    pub centroid: Point, // client space
    pub snapshot: OverlayTransform,
}

impl PinchSession {
    fn begin(a: Point, b: Point, snapshot: OverlayTransform) -> Self {
        let (distance, angle) = span(a, b);
        Self { distance, angle, centroid: a.midpoint(b), snapshot }
    }

    /// Transform for the current contact pair, computed from the snapshot.
    pub fn resolve(&self, a: Point, b: Point, origin: Point) -> OverlayTransform {
        let (distance, angle) = span(a, b);
        // Two contacts on the same spot at start: no usable baseline for
        // either scale or angle. The centroid pan still applies.
        let (scale, rotation_delta) = if self.distance > f32::EPSILON {
            (distance / self.distance, (angle - self.angle).to_degrees())
        } else {
            (1.0, 0.0)
        };

        // Both centroids are taken relative to the *current* canvas origin.
        let start = self.centroid.relative_to(origin);
        let now = a.midpoint(b).relative_to(origin);

        OverlayTransform {
            x: self.snapshot.x + (now.x - start.x),
            y: self.snapshot.y + (now.y - start.y),
            width: self.snapshot.width * scale,
            height: self.snapshot.height * scale,
            rotation: self.snapshot.rotation + rotation_delta,
        }
    }
}

fn span(a: Point, b: Point) -> (f32, f32) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    ((dx * dx + dy * dy).sqrt(), dy.atan2(dx))
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(DragSession),
    PinchRotateZoom(PinchSession),
}

#[derive(Debug, Default)]
pub struct GestureInterpreter {
    state: GestureState,
    tuning: GestureTuning,
}

impl GestureInterpreter {
    pub fn new(tuning: GestureTuning) -> Self {
        Self { state: GestureState::Idle, tuning }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    /// Feed one event. `origin` is the canvas top-left in client coordinates
    /// at the time of the event.
    pub fn handle(&mut self, event: &InputEvent, origin: Point, model: &mut TransformModel) -> Response {
        match event {
            InputEvent::PointerDown { pos } => {
                self.try_grab(pos.relative_to(origin), model);
                Response::default()
            }
            InputEvent::PointerMove { pos, movement_x, modifier } => {
                let GestureState::Dragging(drag) = self.state else {
                    return Response::default();
                };
                let changed = if *modifier {
                    let delta = movement_x / self.tuning.rotate_sensitivity;
                    model.apply_rotate_absolute(model.get().rotation + delta)
                } else {
                    let p = pos.relative_to(origin);
                    model.apply_translate(p.x - drag.offset.x, p.y - drag.offset.y)
                };
                Response { changed, suppress_default: false }
            }
            InputEvent::PointerUp | InputEvent::PointerLeave => {
                if matches!(self.state, GestureState::Dragging(_)) {
                    self.end("pointer released");
                }
                Response::default()
            }
            InputEvent::Wheel { pos, delta_y } => {
                let changed = self.wheel(pos.relative_to(origin), *delta_y, model);
                // Page scroll is always swallowed over the canvas.
                Response { changed, suppress_default: true }
            }
            InputEvent::TouchStart { touches } => {
                match touches.as_slice() {
                    [] => {}
                    [only] => {
                        if matches!(self.state, GestureState::Idle) {
                            self.try_grab(only.relative_to(origin), model);
                        }
                    }
                    [a, b, ..] => self.begin_pinch(*a, *b, model),
                }
                Response { changed: false, suppress_default: true }
            }
            InputEvent::TouchMove { touches } => {
                let changed = match (touches.as_slice(), self.state) {
                    ([only], GestureState::Dragging(drag)) => {
                        let p = only.relative_to(origin);
                        model.apply_translate(p.x - drag.offset.x, p.y - drag.offset.y)
                    }
                    ([a, b, ..], GestureState::PinchRotateZoom(pinch)) => {
                        let t = pinch.resolve(*a, *b, origin);
                        model.apply_scale_and_position(t.x, t.y, t.width, t.height, t.rotation)
                    }
                    ([a, b, ..], _) => {
                        // Second contact showed up without a start event.
                        self.begin_pinch(*a, *b, model);
                        false
                    }
                    _ => false,
                };
                Response { changed, suppress_default: true }
            }
            InputEvent::TouchEnd { touches } => {
                let remaining = touches.len();
                match self.state {
                    GestureState::PinchRotateZoom(_) if remaining < 2 => self.end("pinch contact lifted"),
                    GestureState::Dragging(_) if remaining == 0 => self.end("touch released"),
                    _ => {}
                }
                Response { changed: false, suppress_default: true }
            }
            InputEvent::PlatformGesture => Response { changed: false, suppress_default: true },
        }
    }

    /// Abandon whatever is in progress (all contacts lost, window lost focus).
    /// The transform keeps whatever the gesture already applied.
    pub fn cancel(&mut self) {
        if !matches!(self.state, GestureState::Idle) {
            self.end("cancelled");
        }
    }

    fn try_grab(&mut self, p: Point, model: &TransformModel) {
        let t = model.get();
        if t.contains(p) {
            let offset = Point::new(p.x - t.x, p.y - t.y);
            debug!(x = offset.x, y = offset.y, "drag start");
            self.state = GestureState::Dragging(DragSession { offset });
        }
    }

    fn begin_pinch(&mut self, a: Point, b: Point, model: &TransformModel) {
        let session = PinchSession::begin(a, b, model.get());
        debug!(distance = session.distance, angle = session.angle, "pinch start");
        self.state = GestureState::PinchRotateZoom(session);
    }

    fn wheel(&self, p: Point, delta_y: f32, model: &mut TransformModel) -> bool {
        if delta_y == 0.0 || !model.get().contains(p) {
            return false;
        }
        let factor = if delta_y < 0.0 { self.tuning.zoom_in_factor } else { self.tuning.zoom_out_factor };
        model.apply_scale_factor(factor)
    }

    fn end(&mut self, why: &str) {
        debug!(why, "gesture end");
        self.state = GestureState::Idle;
    }
}
