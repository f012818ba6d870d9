//! Overlay editor core: a transform model for one decorative overlay, a
//! gesture interpreter that maps mouse/wheel/touch input onto it, a software
//! compositor (background fit, rotated overlay, watermark) and an export
//! adapter that turns the rendered frame into a PNG for the host to deliver.
//!
//! Everything is single-threaded and driven by the caller: feed input through
//! [`session::EditSession::handle_input`], call [`session::EditSession::tick`]
//! once per frame, show [`session::EditSession::frame`].

pub mod assets;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod draw;
pub mod error;
pub mod export;
pub mod gesture;
pub mod logging;
pub mod session;
pub mod transform;
pub mod types;
pub mod window;

pub use error::Error;
