// Every variant states *where* things went wrong.
// Gesture and bounds problems never show up here: they are absorbed by the
// transform model. Only resource, export and shell failures are reported.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String),   // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("Image decode error: {0}")]
    ImageDecode(String),  // Background or overlay could not be loaded
    #[error("Image encode error: {0}")]
    ImageEncode(String),  // Reading the surface back as PNG failed
    #[error("Share error: {0}")]
    Share(String),        // Host declined or failed to share
    #[error("Download error: {0}")]
    Download(String),     // Host failed to store the artifact
    #[error("Config error: {0}")]
    Config(String),       // Config file unreadable or malformed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
