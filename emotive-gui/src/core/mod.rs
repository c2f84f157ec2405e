//! Core functionality modules for the Emotive GUI application.
//!
//! - `annotate`: overlay drawing on frames
//! - `capture`: the background capture loop and its session handle
//! - `error`: user-visible session errors
//! - `screenshot`: saving the latest annotated frame
//! - `speech`: rate-limited spoken announcements

pub mod annotate;
pub mod capture;
pub mod error;
pub mod screenshot;
pub mod speech;
