// Compositor: background fit → rotated overlay → watermark, always a full
// redraw onto a freshly cleared surface. Pure function of its inputs, so the
// same background, asset, transform and canvas size give the same pixels.
//
// `RenderJob` runs the same three stages but waits for each image resource to
// report ready before touching the surface: nothing of the overlay is drawn
// before the background decoded, and no watermark before the overlay decoded.

use std::task::Poll;

use image::imageops::{self, FilterType};
use tracing::{debug, warn};

use crate::assets::ImageHandle;
use crate::draw::{blend_over, blend_pixel, draw_text_5x7, text_size};
use crate::error::Error;
use crate::types::{FrameBuffer, OverlayTransform, Raster};

#[derive(Clone, Debug, PartialEq)]
pub struct WatermarkStyle {
    pub text: String,
    pub rgb: [u8; 3],
    pub opacity: f32,
    pub margin: i32,
    pub scale: i32, // integer upscale of the 5x7 font
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self { text: "bolmaker".into(), rgb: [128, 128, 128], opacity: 0.75, margin: 10, scale: 2 }
    }
}

/// Where the background lands inside the canvas (aspect preserved, centered).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub fn fit_background(img_w: u32, img_h: u32, canvas_w: usize, canvas_h: usize) -> FitRect {
    let (cw, ch) = (canvas_w as f32, canvas_h as f32);
    let img_aspect = img_w as f32 / img_h as f32;
    let canvas_aspect = cw / ch;
    if img_aspect > canvas_aspect {
        // Wider than the canvas: full width, letterbox top and bottom.
        let height = cw / img_aspect;
        FitRect { x: 0.0, y: (ch - height) / 2.0, width: cw, height }
    } else {
        let width = ch * img_aspect;
        FitRect { x: (cw - width) / 2.0, y: 0.0, width, height: ch }
    }
}

#[derive(Clone, Debug)]
pub struct Compositor {
    pub width: usize,
    pub height: usize,
    pub watermark: WatermarkStyle,
}

impl Compositor {
    pub fn new(width: usize, height: usize, watermark: WatermarkStyle) -> Self {
        Self { width, height, watermark }
    }

    /// One full frame from already-decoded inputs.
    pub fn render(&self, background: &Raster, overlay: &Raster, transform: &OverlayTransform) -> FrameBuffer {
        let mut fb = FrameBuffer::new(self.width, self.height);
        self.draw_background(&mut fb, background);
        self.draw_overlay(&mut fb, overlay, transform);
        self.draw_watermark(&mut fb);
        fb
    }

    pub fn draw_background(&self, fb: &mut FrameBuffer, background: &Raster) {
        if background.width() == 0 || background.height() == 0 || fb.width == 0 || fb.height == 0 {
            return;
        }
        let rect = fit_background(background.width(), background.height(), fb.width, fb.height);
        let w = (rect.width.round() as u32).max(1);
        let h = (rect.height.round() as u32).max(1);
        let (ox, oy) = (rect.x.round() as i32, rect.y.round() as i32);

        let scaled = if (w, h) == background.image.dimensions() {
            background.image.clone()
        } else {
            imageops::resize(&background.image, w, h, FilterType::Triangle)
        };
        for (x, y, p) in scaled.enumerate_pixels() {
            blend_pixel(fb, ox + x as i32, oy + y as i32, p.0, 1.0);
        }
    }

    /// Overlay sized to `width × height`, rotated about its own center.
    /// Inverse mapping: every surface pixel in the rotated bounds is taken
    /// back into overlay-local space and sampled there.
    pub fn draw_overlay(&self, fb: &mut FrameBuffer, overlay: &Raster, t: &OverlayTransform) {
        if !(t.width > 0.0 && t.height > 0.0) || !t.rotation.is_finite() || overlay.width() == 0 || overlay.height() == 0 {
            return;
        }
        let center = t.center();
        let (sin, cos) = t.rotation.to_radians().sin_cos();
        let (hw, hh) = (t.width / 2.0, t.height / 2.0);
        let ext_x = (hw * cos).abs() + (hh * sin).abs();
        let ext_y = (hw * sin).abs() + (hh * cos).abs();

        let x0 = (center.x - ext_x).floor().max(0.0) as usize;
        let y0 = (center.y - ext_y).floor().max(0.0) as usize;
        let x1 = ((center.x + ext_x).ceil().max(0.0) as usize).min(fb.width);
        let y1 = ((center.y + ext_y).ceil().max(0.0) as usize).min(fb.height);

        let sx_scale = overlay.width() as f32 / t.width;
        let sy_scale = overlay.height() as f32 / t.height;

        for py in y0..y1 {
            for px in x0..x1 {
                let dx = px as f32 + 0.5 - center.x;
                let dy = py as f32 + 0.5 - center.y;
                let lx = dx * cos + dy * sin + hw;
                let ly = -dx * sin + dy * cos + hh;
                if lx < 0.0 || ly < 0.0 || lx >= t.width || ly >= t.height {
                    continue;
                }
                let src = bilinear_sample(overlay, lx * sx_scale - 0.5, ly * sy_scale - 0.5);
                let idx = py * fb.width + px;
                fb.pixels[idx] = blend_over(fb.pixels[idx], src, 1.0);
            }
        }
    }

    /// Top-left and size of the watermark text, bottom-right aligned.
    pub fn watermark_rect(&self) -> (i32, i32, i32, i32) {
        let style = &self.watermark;
        let (tw, th) = text_size(&style.text, style.scale);
        let x = (self.width as i32 - tw - style.margin).max(0);
        let y = (self.height as i32 - style.margin - th).max(0);
        (x, y, tw, th)
    }

    pub fn draw_watermark(&self, fb: &mut FrameBuffer) {
        let (x, y, _, _) = self.watermark_rect();
        let style = &self.watermark;
        draw_text_5x7(fb, x, y, &style.text, style.rgb, style.scale, style.opacity);
    }
}

/// Bilinear sample with edge clamping, interpolated premultiplied so that
/// transparent texels do not bleed dark fringes into the edges.
fn bilinear_sample(img: &Raster, x: f32, y: f32) -> [u8; 4] {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let x = x.clamp(0.0, (w - 1) as f32);
    let y = y.clamp(0.0, (h - 1) as f32);
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let premul = |sx: i32, sy: i32| -> [f32; 4] {
        let p = img.image.get_pixel(sx as u32, sy as u32).0;
        let a = p[3] as f32 / 255.0;
        [p[0] as f32 * a, p[1] as f32 * a, p[2] as f32 * a, p[3] as f32]
    };
    let (tl, tr, bl, br) = (premul(x0, y0), premul(x1, y0), premul(x0, y1), premul(x1, y1));

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    let mut acc = [0.0f32; 4];
    for c in 0..4 {
        acc[c] = lerp(lerp(tl[c], tr[c], fx), lerp(bl[c], br[c], fx), fy);
    }
    let a = acc[3];
    if a <= 0.0 {
        return [0, 0, 0, 0];
    }
    let un = |v: f32| (v * 255.0 / a).round().clamp(0.0, 255.0) as u8;
    [un(acc[0]), un(acc[1]), un(acc[2]), a.round().clamp(0.0, 255.0) as u8]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Background,
    Overlay,
    Watermark,
    Done,
}

/// A render in progress, resumed each time the shell ticks.
#[derive(Debug)]
pub struct RenderJob {
    transform: OverlayTransform,
    surface: FrameBuffer,
    stage: Stage,
}

impl RenderJob {
    pub fn new(compositor: &Compositor, transform: OverlayTransform) -> Self {
        Self { transform, surface: FrameBuffer::new(compositor.width, compositor.height), stage: Stage::Background }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn transform(&self) -> OverlayTransform {
        self.transform
    }

    /// Run as many stages as the resources allow. `Ready(Err)` means a
    /// resource failed; the partial surface is dropped by the caller.
    pub fn advance(
        &mut self,
        compositor: &Compositor,
        background: &mut ImageHandle,
        overlay: &mut ImageHandle,
    ) -> Poll<Result<(), Error>> {
        loop {
            match self.stage {
                Stage::Background => match background.poll() {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Err(e)) => {
                        warn!(error = %e, "render aborted at background");
                        return Poll::Ready(Err(e));
                    }
                    Poll::Ready(Ok(bg)) => {
                        self.surface.clear();
                        compositor.draw_background(&mut self.surface, bg);
                        self.stage = Stage::Overlay;
                    }
                },
                Stage::Overlay => match overlay.poll() {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(Err(e)) => {
                        warn!(error = %e, "render aborted at overlay");
                        return Poll::Ready(Err(e));
                    }
                    Poll::Ready(Ok(asset)) => {
                        compositor.draw_overlay(&mut self.surface, asset, &self.transform);
                        self.stage = Stage::Watermark;
                    }
                },
                Stage::Watermark => {
                    compositor.draw_watermark(&mut self.surface);
                    self.stage = Stage::Done;
                    debug!("render complete");
                }
                Stage::Done => return Poll::Ready(Ok(())),
            }
        }
    }

    pub fn into_frame(self) -> FrameBuffer {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{pack_argb, unpack_argb};
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> Raster {
        Raster::new(RgbaImage::from_pixel(w, h, Rgba(rgba)))
    }

    fn compositor() -> Compositor {
        Compositor::new(800, 600, WatermarkStyle::default())
    }

    #[test]
    fn wide_image_fills_width_and_centers_vertically() {
        let r = fit_background(1600, 600, 800, 600);
        assert_eq!(r, FitRect { x: 0.0, y: 150.0, width: 800.0, height: 300.0 });
    }

    #[test]
    fn tall_image_fills_height_and_centers_horizontally() {
        let r = fit_background(300, 600, 800, 600);
        assert_eq!(r, FitRect { x: 250.0, y: 0.0, width: 300.0, height: 600.0 });
    }

    #[test]
    fn letterbox_stays_transparent() {
        let c = compositor();
        let fb = c.render(&solid(1600, 600, [0, 0, 255, 255]), &solid(4, 4, [0, 0, 0, 0]), &OverlayTransform::default());
        assert_eq!(unpack_argb(fb.pixel(400, 10)), [0, 0, 0, 0]);
        assert_eq!(unpack_argb(fb.pixel(400, 300)), [0, 0, 255, 255]);
    }

    #[test]
    fn unrotated_overlay_covers_its_rect_only() {
        let c = compositor();
        let t = OverlayTransform::default();
        let fb = c.render(&solid(800, 600, [255, 255, 255, 255]), &solid(10, 10, [255, 0, 0, 255]), &t);
        assert_eq!(unpack_argb(fb.pixel(100, 100)), [255, 0, 0, 255]);
        assert_eq!(unpack_argb(fb.pixel(299, 299)), [255, 0, 0, 255]);
        assert_eq!(unpack_argb(fb.pixel(99, 150)), [255, 255, 255, 255]);
        assert_eq!(unpack_argb(fb.pixel(300, 150)), [255, 255, 255, 255]);
    }

    #[test]
    fn rotation_turns_overlay_about_its_center() {
        let c = compositor();
        let t = OverlayTransform { rotation: 45.0, ..Default::default() };
        let fb = c.render(&solid(800, 600, [255, 255, 255, 255]), &solid(10, 10, [255, 0, 0, 255]), &t);
        // Unrotated corner is now background; the diamond tip above center is red.
        assert_eq!(unpack_argb(fb.pixel(102, 102)), [255, 255, 255, 255]);
        assert_eq!(unpack_argb(fb.pixel(200, 70)), [255, 0, 0, 255]);
        assert_eq!(unpack_argb(fb.pixel(200, 200)), [255, 0, 0, 255]);
    }

    #[test]
    fn render_is_deterministic() {
        let c = compositor();
        let bg = solid(37, 91, [10, 200, 30, 255]);
        let ov = solid(13, 7, [200, 10, 90, 180]);
        let t = OverlayTransform { x: -40.0, y: 333.3, width: 250.5, height: 120.25, rotation: 1234.5 };
        assert_eq!(c.render(&bg, &ov, &t), c.render(&bg, &ov, &t));
    }

    #[test]
    fn watermark_sits_inside_bottom_right() {
        for (w, h) in [(800, 600), (200, 100), (120, 40), (1, 1)] {
            let c = Compositor::new(w, h, WatermarkStyle::default());
            let (x, y, tw, th) = c.watermark_rect();
            assert!(x >= 0 && y >= 0);
            let (min_w, min_h) = (tw + 10, th + 10);
            if w as i32 >= min_w && h as i32 >= min_h {
                assert_eq!(x + tw, w as i32 - 10);
                assert_eq!(y + th, h as i32 - 10);
            }
        }
    }

    #[test]
    fn watermark_is_drawn_over_the_overlay() {
        let c = compositor();
        // Overlay covers the whole canvas, watermark must still show.
        let t = OverlayTransform { x: 0.0, y: 0.0, width: 800.0, height: 600.0, rotation: 0.0 };
        let fb = c.render(&solid(800, 600, [0, 0, 0, 255]), &solid(2, 2, [0, 0, 0, 255]), &t);
        let (x, y, tw, th) = c.watermark_rect();
        let lit = (y..y + th)
            .flat_map(|py| (x..x + tw).map(move |px| (px as usize, py as usize)))
            .filter(|&(px, py)| fb.pixel(px, py) != pack_argb([0, 0, 0, 255]))
            .count();
        assert!(lit > 0);
        // 75% gray over black.
        let gray = unpack_argb(
            (y..y + th)
                .flat_map(|py| (x..x + tw).map(move |px| (px as usize, py as usize)))
                .map(|(px, py)| fb.pixel(px, py))
                .find(|&p| p != pack_argb([0, 0, 0, 255]))
                .unwrap(),
        );
        assert_eq!(gray, [96, 96, 96, 255]);
    }

    #[test]
    fn job_waits_for_background_then_overlay() {
        let c = compositor();
        let mut bg = ImageHandle::awaiting("bg.png");
        let mut ov = ImageHandle::awaiting("overlay.png");
        let mut job = RenderJob::new(&c, OverlayTransform::default());
        assert_eq!(job.transform(), OverlayTransform::default());

        assert!(job.advance(&c, &mut bg, &mut ov).is_pending());
        assert_eq!(job.stage(), Stage::Background);

        // Overlay ready first changes nothing: background still gates.
        ov.deliver(solid(10, 10, [255, 0, 0, 255]));
        assert!(job.advance(&c, &mut bg, &mut ov).is_pending());
        assert_eq!(job.stage(), Stage::Background);

        let mut ov = ImageHandle::awaiting("overlay.png");
        bg.deliver(solid(800, 600, [0, 255, 0, 255]));
        assert!(job.advance(&c, &mut bg, &mut ov).is_pending());
        assert_eq!(job.stage(), Stage::Overlay);

        ov.deliver(solid(10, 10, [255, 0, 0, 255]));
        assert!(matches!(job.advance(&c, &mut bg, &mut ov), Poll::Ready(Ok(()))));
        assert_eq!(job.stage(), Stage::Done);

        let frame = job.into_frame();
        let direct = c.render(
            &solid(800, 600, [0, 255, 0, 255]),
            &solid(10, 10, [255, 0, 0, 255]),
            &OverlayTransform::default(),
        );
        assert_eq!(frame, direct);
    }

    #[test]
    fn job_reports_failed_resource() {
        let c = compositor();
        let mut bg = ImageHandle::ready("bg.png", solid(4, 3, [1, 1, 1, 255]));
        let mut ov = ImageHandle::awaiting("overlay.png");
        ov.fail("404");
        let mut job = RenderJob::new(&c, OverlayTransform::default());
        assert!(matches!(job.advance(&c, &mut bg, &mut ov), Poll::Ready(Err(Error::ImageDecode(_)))));
    }
}
