// Export adapter: rendered frame → PNG artifact with a derived filename, then
// handed to the host. Which delivery path runs depends only on what the host
// says it can do, never on sniffing the platform.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::{info, warn};

use crate::error::Error;
use crate::types::FrameBuffer;

pub const PNG_MIME: &str = "image/png";

/// The byte payload plus what to call it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

/// `photo.jpg` → `photo_bol.jpg`, `photo` → `photo_bol`.
/// The extension is kept as uploaded even though the payload is PNG.
pub fn derive_filename(base: &str, suffix: &str) -> String {
    match base.rfind('.') {
        Some(dot) => format!("{}{}{}", &base[..dot], suffix, &base[dot..]),
        None => format!("{base}{suffix}"),
    }
}

/// Read the surface back as PNG.
pub fn export_frame(frame: &FrameBuffer, base: &str, suffix: &str) -> Result<Artifact, Error> {
    if frame.width == 0 || frame.height == 0 {
        return Err(Error::ImageEncode("empty surface".into()));
    }
    let mut out = Cursor::new(Vec::new());
    frame
        .to_rgba_image()
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| Error::ImageEncode(e.to_string()))?;
    Ok(Artifact { bytes: out.into_inner(), filename: derive_filename(base, suffix), mime_type: PNG_MIME.into() })
}

/// What the host environment declares about itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HostCapabilities {
    pub can_share_files: bool, // native share sheet accepts files
    pub touch_primary: bool,   // direct download is impractical
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportMode {
    /// Share sheet if available, otherwise download.
    Save,
    /// Show the finished image in-app so the user can keep it by hand.
    Preview,
}

impl ExportMode {
    pub fn for_host(caps: HostCapabilities) -> Self {
        if caps.touch_primary { ExportMode::Preview } else { ExportMode::Save }
    }
}

/// In-memory result shown by the host in preview mode.
#[derive(Clone, Debug, PartialEq)]
pub struct Preview {
    pub frame: FrameBuffer,
    pub artifact: Artifact,
}

/// The side-effecting end of export, supplied by whoever embeds the editor.
pub trait Host {
    fn capabilities(&self) -> HostCapabilities;
    fn share(&mut self, artifact: &Artifact) -> Result<(), Error>;
    fn download(&mut self, artifact: &Artifact) -> Result<(), Error>;
    fn show_preview(&mut self, preview: Preview) -> Result<(), Error>;
}

#[derive(Debug)]
pub enum Delivery {
    Shared,
    Downloaded,
    /// Share was attempted and failed; the artifact was downloaded instead.
    DownloadedAfterShareFailed(Error),
    Previewed,
}

/// Encode `frame` and hand it to `host` in the given mode. Errors are
/// reported to the caller; nothing here touches editor state.
pub fn deliver(
    frame: &FrameBuffer,
    base: &str,
    suffix: &str,
    mode: ExportMode,
    host: &mut dyn Host,
) -> Result<Delivery, Error> {
    let artifact = export_frame(frame, base, suffix)?;
    info!(filename = %artifact.filename, bytes = artifact.bytes.len(), ?mode, "export");

    match mode {
        ExportMode::Preview => {
            host.show_preview(Preview { frame: frame.clone(), artifact })?;
            Ok(Delivery::Previewed)
        }
        ExportMode::Save if host.capabilities().can_share_files => match host.share(&artifact) {
            Ok(()) => Ok(Delivery::Shared),
            Err(e) => {
                warn!(error = %e, "share failed, falling back to download");
                host.download(&artifact)?;
                Ok(Delivery::DownloadedAfterShareFailed(e))
            }
        },
        ExportMode::Save => {
            host.download(&artifact)?;
            Ok(Delivery::Downloaded)
        }
    }
}

/// Desktop host: downloads land in a directory, previews are kept for the
/// window to display, and there is no share sheet.
#[derive(Debug)]
pub struct DesktopHost {
    out_dir: PathBuf,
    touch_primary: bool,
    last_saved: Option<PathBuf>,
    preview: Option<Preview>,
}

impl DesktopHost {
    pub fn new(out_dir: impl Into<PathBuf>, touch_primary: bool) -> Self {
        Self { out_dir: out_dir.into(), touch_primary, last_saved: None, preview: None }
    }

    pub fn last_saved(&self) -> Option<&Path> {
        self.last_saved.as_deref()
    }

    pub fn take_preview(&mut self) -> Option<Preview> {
        self.preview.take()
    }
}

impl Host for DesktopHost {
    fn capabilities(&self) -> HostCapabilities {
        HostCapabilities { can_share_files: false, touch_primary: self.touch_primary }
    }

    fn share(&mut self, _artifact: &Artifact) -> Result<(), Error> {
        Err(Error::Share("no share sheet on this host".into()))
    }

    fn download(&mut self, artifact: &Artifact) -> Result<(), Error> {
        let path = self.out_dir.join(&artifact.filename);
        fs::create_dir_all(&self.out_dir)
            .and_then(|_| fs::write(&path, &artifact.bytes))
            .map_err(|e| Error::Download(format!("Write {}: {e}", path.display())))?;
        info!(path = %path.display(), "saved");
        self.last_saved = Some(path);
        Ok(())
    }

    fn show_preview(&mut self, preview: Preview) -> Result<(), Error> {
        self.preview = Some(preview);
        Ok(())
    }
}
