pub mod backend;
pub mod classes;
pub mod config;
pub mod detector;
pub mod processing;

// Re-export commonly used types for convenience
pub use backend::{DetectionBackend, RawPredictions};
pub use config::DetectorConfig;
pub use detector::Detector;
pub use processing::post::RawDetection;
