//! factor-dash: reactive dashboard for fitted factorial analyses.
//!
//! A pre-computed PCA, CA, MCA, FAMD or MFA result is turned into a set of
//! widgets, derived outputs and rules wired through an explicit dependency
//! graph. Sessions recompute only the outputs an input change reaches; the
//! `server` module serves them to a browser.

pub mod api;
pub mod core;
pub mod error;
pub mod render;
pub mod server;
pub mod telemetry;

pub use api::{AppOptions, Dashboard, Session};
pub use error::{DashError, DashResult};
pub use server::{run, spawn, AppHandle};
