//! natstop: a top-like live monitor for NATS servers built on the HTTP
//! monitoring endpoints (`/varz`, `/connz`).

pub mod app;
pub mod cli;
pub mod dns;
pub mod engine;
pub mod error;
pub mod http;
pub mod logging;
pub mod options;
pub mod profiles;
pub mod screen;
pub mod snapshot;
pub mod sort;
pub mod types;
pub mod ui;

pub use error::{Error, Result};
