// Transform model: the only mutable state shared between input and rendering.
// Written by the gesture interpreter, read by the compositor and export.
//
// Nothing in here returns an error. Requests that would break an invariant
// (size not finite, not positive, or over the max) are dropped and the
// previous value is kept.

use crate::types::OverlayTransform;
use tracing::debug;

pub const MAX_OVERLAY_WIDTH: f32 = 1000.0;
pub const MAX_OVERLAY_HEIGHT: f32 = 1000.0;

#[derive(Clone, Debug)]
pub struct TransformModel {
    current: OverlayTransform,
    max_width: f32,
    max_height: f32,
}

impl Default for TransformModel {
    fn default() -> Self {
        Self::new(OverlayTransform::default(), MAX_OVERLAY_WIDTH, MAX_OVERLAY_HEIGHT)
    }
}

impl TransformModel {
    pub fn new(initial: OverlayTransform, max_width: f32, max_height: f32) -> Self {
        Self { current: initial, max_width, max_height }
    }

    pub fn get(&self) -> OverlayTransform {
        self.current
    }

    pub fn max_size(&self) -> (f32, f32) {
        (self.max_width, self.max_height)
    }

    /// Replace x,y with absolute positions. Position is unconstrained.
    pub fn apply_translate(&mut self, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        self.current.x = x;
        self.current.y = y;
        true
    }

    /// Set absolute rotation in degrees.
    pub fn apply_rotate_absolute(&mut self, degrees: f32) -> bool {
        if !degrees.is_finite() {
            return false;
        }
        self.current.rotation = degrees;
        true
    }

    /// Atomic replace used by pinch gestures. A size that breaks the bounds
    /// keeps the current size; position and rotation still apply.
    pub fn apply_scale_and_position(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        rotation: f32,
    ) -> bool {
        let mut changed = self.apply_translate(x, y);
        changed |= self.apply_rotate_absolute(rotation);
        if self.size_allowed(width, height) {
            self.current.width = width;
            self.current.height = height;
            changed = true;
        } else {
            debug!(width, height, "pinch size rejected");
        }
        changed
    }

    /// Multiply width/height by `factor`. If either result would exceed its
    /// max the call is a no-op (factor treated as 1, not clamped to the max).
    pub fn apply_scale_factor(&mut self, factor: f32) -> bool {
        let width = self.current.width * factor;
        let height = self.current.height * factor;
        if !self.size_allowed(width, height) {
            debug!(factor, width, height, "scale step skipped");
            return false;
        }
        self.current.width = width;
        self.current.height = height;
        true
    }

    fn size_allowed(&self, width: f32, height: f32) -> bool {
        width.is_finite()
            && height.is_finite()
            && width > 0.0
            && height > 0.0
            && width <= self.max_width
            && height <= self.max_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_zoom_in_once() {
        let mut m = TransformModel::default();
        assert!(m.apply_scale_factor(1.05));
        let t = m.get();
        assert!((t.width - 210.0).abs() < 1e-3);
        assert!((t.height - 210.0).abs() < 1e-3);
        assert_eq!((t.x, t.y), (100.0, 100.0));
    }

    #[test]
    fn scale_over_max_is_rejected_not_clamped() {
        let mut m = TransformModel::default();
        assert_eq!(m.max_size(), (MAX_OVERLAY_WIDTH, MAX_OVERLAY_HEIGHT));
        loop {
            let before = m.get();
            if before.width * 1.05 > MAX_OVERLAY_WIDTH {
                assert!(!m.apply_scale_factor(1.05));
                assert_eq!(m.get(), before);
                assert!(m.get().width < MAX_OVERLAY_WIDTH);
                break;
            }
            assert!(m.apply_scale_factor(1.05));
        }
    }

    #[test]
    fn any_scale_sequence_stays_in_bounds() {
        let mut m = TransformModel::default();
        let factors = [1.05, 3.0, 0.95, 0.0, -2.0, f32::NAN, f32::INFINITY, 4.9, 1e-30, 1.05];
        for round in 0..50 {
            m.apply_scale_factor(factors[round % factors.len()]);
            let t = m.get();
            assert!(t.width > 0.0 && t.width <= MAX_OVERLAY_WIDTH);
            assert!(t.height > 0.0 && t.height <= MAX_OVERLAY_HEIGHT);
        }
    }

    #[test]
    fn pinch_replace_keeps_size_when_out_of_bounds() {
        let mut m = TransformModel::default();
        assert!(m.apply_scale_and_position(5.0, 6.0, 2000.0, 2000.0, 30.0));
        let t = m.get();
        assert_eq!((t.x, t.y, t.rotation), (5.0, 6.0, 30.0));
        assert_eq!((t.width, t.height), (200.0, 200.0));

        m.apply_scale_and_position(0.0, 0.0, 400.0, 400.0, 0.0);
        assert_eq!((m.get().width, m.get().height), (400.0, 400.0));
    }

    #[test]
    fn position_and_rotation_are_unconstrained() {
        let mut m = TransformModel::default();
        assert!(m.apply_translate(-5000.0, 9000.0));
        assert!(m.apply_rotate_absolute(725.0));
        assert_eq!(m.get().rotation, 725.0);
        assert!(!m.apply_translate(f32::NAN, 0.0));
        assert_eq!(m.get().x, -5000.0);
    }
}
