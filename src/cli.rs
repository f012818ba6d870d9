// Command line for the desktop shell.
//
//   bolmaker photo.jpg                          open the editor window
//   bolmaker photo.jpg --touch                  export goes through preview
//   bolmaker photo.jpg --headless --x 40 --rotation 15 --output out.png

use std::path::PathBuf;

use clap::Parser;

use crate::types::OverlayTransform;

/// Put the hat on a photo, move it around, save the result.
#[derive(Parser, Debug)]
#[command(name = "bolmaker", about = "Overlay editor: place, scale and rotate an overlay on a photo")]
pub struct CliArgs {
    /// Background photo to edit.
    pub background: PathBuf,

    /// Overlay image (defaults to the config's overlay_asset).
    #[arg(long, value_name = "FILE")]
    pub overlay: Option<PathBuf>,

    /// JSON config file; missing keys keep their defaults.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where saved images are written.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Treat the host as touch-primary: export opens a preview first.
    #[arg(long)]
    pub touch: bool,

    /// Render once with the transform below and write it, no window.
    #[arg(long)]
    pub headless: bool,

    /// Output file for --headless (defaults to the derived name in --out-dir).
    #[arg(short, long, value_name = "FILE", requires = "headless")]
    pub output: Option<PathBuf>,

    #[arg(long, allow_negative_numbers = true)]
    pub x: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    pub y: Option<f32>,
    #[arg(long)]
    pub width: Option<f32>,
    #[arg(long)]
    pub height: Option<f32>,
    #[arg(long, allow_negative_numbers = true)]
    pub rotation: Option<f32>,

    /// Verbose (debug) logging; RUST_LOG is honoured when set.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Start transform with any command-line overrides applied.
    pub fn transform_over(&self, base: OverlayTransform) -> OverlayTransform {
        OverlayTransform {
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            rotation: self.rotation.unwrap_or(base.rotation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headless_overrides() {
        let args = CliArgs::try_parse_from([
            "bolmaker", "beach.jpg", "--headless", "--x", "-20", "--rotation", "-15.5", "-o", "out.png",
        ])
        .unwrap();
        assert!(args.headless);
        assert_eq!(args.output, Some(PathBuf::from("out.png")));
        let t = args.transform_over(OverlayTransform::default());
        assert_eq!((t.x, t.y, t.rotation, t.width), (-20.0, 100.0, -15.5, 200.0));
    }

    #[test]
    fn output_requires_headless() {
        assert!(CliArgs::try_parse_from(["bolmaker", "a.jpg", "-o", "x.png"]).is_err());
        let args = CliArgs::try_parse_from(["bolmaker", "a.jpg"]).unwrap();
        assert_eq!(args.out_dir, PathBuf::from("."));
        assert!(!args.touch);
    }
}
