// Editor settings. Every field has a default, so a config file only needs
// the keys it wants to change.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::assets::OVERLAY_ASSET_PATH;
use crate::compositor::WatermarkStyle;
use crate::error::Error;
use crate::gesture::GestureTuning;
use crate::transform::{TransformModel, MAX_OVERLAY_HEIGHT, MAX_OVERLAY_WIDTH};
use crate::types::OverlayTransform;

/// Largest accepted canvas side in pixels.
const MAX_CANVAS_SIDE: usize = 8192;
const MAX_WATERMARK_SCALE: i32 = 64;
const MAX_WATERMARK_CHARS: usize = 256;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Logical render surface, independent of display scaling.
    pub canvas_width: usize,
    pub canvas_height: usize,
    pub max_overlay_width: f32,
    pub max_overlay_height: f32,
    pub initial_overlay: OverlayTransform,
    pub zoom_in_factor: f32,
    pub zoom_out_factor: f32,
    pub rotate_sensitivity: f32,
    pub watermark_text: String,
    pub watermark_opacity: f32,
    pub watermark_margin: i32,
    pub watermark_scale: i32,
    /// Inserted before the extension of the background's filename on export.
    pub filename_suffix: String,
    /// Gap between requesting an export and reading the surface back.
    pub export_delay_ms: u64,
    pub overlay_asset: PathBuf,
    pub debug: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let tuning = GestureTuning::default();
        let watermark = WatermarkStyle::default();
        Self {
            canvas_width: 800,
            canvas_height: 600,
            max_overlay_width: MAX_OVERLAY_WIDTH,
            max_overlay_height: MAX_OVERLAY_HEIGHT,
            initial_overlay: OverlayTransform::default(),
            zoom_in_factor: tuning.zoom_in_factor,
            zoom_out_factor: tuning.zoom_out_factor,
            rotate_sensitivity: tuning.rotate_sensitivity,
            watermark_text: watermark.text,
            watermark_opacity: watermark.opacity,
            watermark_margin: watermark.margin,
            watermark_scale: watermark.scale,
            filename_suffix: "_bol".into(),
            export_delay_ms: 500,
            overlay_asset: PathBuf::from(OVERLAY_ASSET_PATH),
            debug: false,
        }
    }
}

impl EditorConfig {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        let cfg: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(Error::Config("canvas size must be non-zero".into()));
        }
        if self.canvas_width > MAX_CANVAS_SIDE || self.canvas_height > MAX_CANVAS_SIDE {
            return Err(Error::Config(format!("canvas side larger than {MAX_CANVAS_SIDE}")));
        }
        let o = &self.initial_overlay;
        if !(o.width > 0.0 && o.height > 0.0 && o.width <= self.max_overlay_width && o.height <= self.max_overlay_height) {
            return Err(Error::Config("initial overlay size out of bounds".into()));
        }
        if !(self.rotate_sensitivity > 0.0) {
            return Err(Error::Config("rotate_sensitivity must be positive".into()));
        }
        if !(1..=MAX_WATERMARK_SCALE).contains(&self.watermark_scale) {
            return Err(Error::Config(format!("watermark_scale must be in 1..={MAX_WATERMARK_SCALE}")));
        }
        if !(0..=MAX_CANVAS_SIDE as i32).contains(&self.watermark_margin) {
            return Err(Error::Config(format!("watermark_margin must be in 0..={MAX_CANVAS_SIDE}")));
        }
        if self.watermark_text.chars().count() > MAX_WATERMARK_CHARS {
            return Err(Error::Config(format!("watermark_text longer than {MAX_WATERMARK_CHARS} characters")));
        }
        Ok(())
    }

    pub fn transform_model(&self) -> TransformModel {
        TransformModel::new(self.initial_overlay, self.max_overlay_width, self.max_overlay_height)
    }

    pub fn gesture_tuning(&self) -> GestureTuning {
        GestureTuning {
            zoom_in_factor: self.zoom_in_factor,
            zoom_out_factor: self.zoom_out_factor,
            rotate_sensitivity: self.rotate_sensitivity,
        }
    }

    pub fn watermark_style(&self) -> WatermarkStyle {
        WatermarkStyle {
            text: self.watermark_text.clone(),
            opacity: self.watermark_opacity,
            margin: self.watermark_margin,
            scale: self.watermark_scale,
            ..WatermarkStyle::default()
        }
    }

    pub fn export_delay(&self) -> Duration {
        Duration::from_millis(self.export_delay_ms)
    }
}
