//! Fitts Engine - trial sequencing and performance analysis for pointing experiments
//!
//! The engine runs ISO 9241-9 multi-directional tapping tests and turns the
//! recorded trials into Fitts' Law metrics:
//! ring layout → alternating target presentation → hit/miss classification
//! → trial records per data set → effective width/distance → throughput,
//! regression and histogram.
//!
//! ## Modules
//!
//! - **Session**: Explicit owner of the engine, data sets and input state
//! - **Engine**: Trial state machine returning events for a renderer
//! - **Analysis**: Effective metrics, regression, histogram and trajectories
//! - **Export**: JSON document of raw trial records for offline analysis

pub mod analysis;
pub mod battery;
pub mod clock;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod export;
pub mod geometry;
pub mod layout;
pub mod session;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use analysis::{AnalysisResult, PerformanceAnalyzer};
pub use battery::{BatteryEntry, TrialBattery, CLICK};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::ExperimentConfig;
pub use dataset::{DataSet, DataSetStore};
pub use engine::{EngineEvent, EngineState, TrialEngine};
pub use error::FittsError;
pub use export::{ExportDocument, ExportEncoder};
pub use geometry::Point;
pub use layout::{generate_layout, Viewport};
pub use session::Session;
pub use types::{Target, TrialRecord};

/// Engine version embedded in all exports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for exports
pub const PRODUCER_NAME: &str = "fitts-engine";
