//! Device Mockup
//!
//! Puts app screenshots into device frames (PC, iPad, iPhone X, iPhone 6/7/8)
//! and lays them out on a single canvas. Usable as a library, a CLI and an
//! HTTP service.

pub mod api;
pub mod config;
pub mod domain;
pub mod engine;

pub use api::AppState;
pub use engine::{Mockup, MockupOutput, MockupRequest, OutputMode};
