// Image resources (background photo, overlay asset) with explicit readiness.
// A handle is either waiting for the host to hand over the data, or holds a
// source that gets decoded the first time somebody polls it. Decoding runs on
// the polling thread; there is no background worker. The compositor waits on
// `poll` before each stage.

use std::path::{Path, PathBuf};
use std::task::Poll;

use crate::error::Error;
use crate::types::Raster;
use tracing::{info, warn};

/// Default location of the shared overlay asset.
pub const OVERLAY_ASSET_PATH: &str = "assets/bolhat.png";

#[derive(Clone, Debug)]
enum Source {
    File(PathBuf),
    Bytes(Vec<u8>),
}

#[derive(Clone, Debug)]
enum State {
    Awaiting,
    Loading(Source),
    Ready(Raster),
    Failed(String),
}

#[derive(Clone, Debug)]
pub struct ImageHandle {
    name: String, // original filename, used to derive the export name
    state: State,
}

impl ImageHandle {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, state: State::Loading(Source::File(path.to_path_buf())) }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), state: State::Loading(Source::Bytes(bytes)) }
    }

    /// Already decoded (tests, hosts that decode themselves).
    pub fn ready(name: impl Into<String>, raster: Raster) -> Self {
        Self { name: name.into(), state: State::Ready(raster) }
    }

    /// Data arrives later through `deliver_bytes` / `deliver` / `fail`.
    pub fn awaiting(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: State::Awaiting }
    }

    pub fn deliver_bytes(&mut self, bytes: Vec<u8>) {
        self.state = State::Loading(Source::Bytes(bytes));
    }

    pub fn deliver(&mut self, raster: Raster) {
        self.state = State::Ready(raster);
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.state = State::Failed(reason.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Drive the load forward. Returns the raster once decoded; a failure is
    /// sticky so the same broken file is not decoded again on every frame.
    pub fn poll(&mut self) -> Poll<Result<&Raster, Error>> {
        if let State::Loading(source) = &self.state {
            self.state = match decode(source) {
                Ok(raster) => {
                    info!(name = %self.name, w = raster.width(), h = raster.height(), "image ready");
                    State::Ready(raster)
                }
                Err(e) => {
                    warn!(name = %self.name, error = %e, "image failed to load");
                    State::Failed(e.to_string())
                }
            };
        }
        match &self.state {
            State::Awaiting | State::Loading(_) => Poll::Pending,
            State::Ready(raster) => Poll::Ready(Ok(raster)),
            State::Failed(msg) => Poll::Ready(Err(Error::ImageDecode(format!("{}: {msg}", self.name)))),
        }
    }
}

fn decode(source: &Source) -> Result<Raster, Error> {
    let img = match source {
        Source::File(path) => image::open(path)
            .map_err(|e| Error::ImageDecode(format!("Open {}: {e}", path.display())))?,
        Source::Bytes(bytes) => image::load_from_memory(bytes)
            .map_err(|e| Error::ImageDecode(format!("Decode bytes: {e}")))?,
    };
    let rgba = img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(Error::ImageDecode("image has zero size".into()));
    }
    Ok(Raster::new(rgba))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(w, h, Rgba([1, 2, 3, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn bytes_decode_on_first_poll() {
        let mut h = ImageHandle::from_bytes("cat.png", png_bytes(3, 2));
        assert!(!h.is_ready());
        match h.poll() {
            Poll::Ready(Ok(r)) => assert_eq!((r.width(), r.height()), (3, 2)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(h.is_ready());
        assert_eq!(h.name(), "cat.png");
    }

    #[test]
    fn awaiting_stays_pending_until_delivered() {
        let mut h = ImageHandle::awaiting("upload.jpg");
        assert!(h.poll().is_pending());
        assert!(h.poll().is_pending());
        h.deliver_bytes(png_bytes(1, 1));
        assert!(matches!(h.poll(), Poll::Ready(Ok(_))));

        let mut h = ImageHandle::awaiting("upload.jpg");
        h.fail("host gave up");
        assert!(matches!(h.poll(), Poll::Ready(Err(Error::ImageDecode(_)))));
    }

    #[test]
    fn garbage_fails_and_stays_failed() {
        let mut h = ImageHandle::from_bytes("x.png", vec![0, 1, 2, 3]);
        assert!(matches!(h.poll(), Poll::Ready(Err(Error::ImageDecode(_)))));
        assert!(matches!(h.poll(), Poll::Ready(Err(Error::ImageDecode(_)))));
    }

    #[test]
    fn bundled_overlay_asset_loads() {
        let mut h = ImageHandle::from_path(Path::new(env!("CARGO_MANIFEST_DIR")).join(OVERLAY_ASSET_PATH));
        match h.poll() {
            Poll::Ready(Ok(r)) => assert!(r.width() > 0 && r.height() > 0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let mut h = ImageHandle::from_path("/definitely/not/here.png");
        assert_eq!(h.name(), "here.png");
        assert!(matches!(h.poll(), Poll::Ready(Err(Error::ImageDecode(_)))));
    }
}
