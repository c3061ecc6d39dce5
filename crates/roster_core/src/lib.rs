pub mod analytics;
pub mod cache;
pub mod compliance;
pub mod db;
pub mod demo;
pub mod domain;
pub mod error;
pub mod export;
pub mod ingest;
pub mod normalize;
pub mod query;
pub mod repo;
pub mod report;
pub mod settings;
pub mod validate;

pub use compliance::detect_violations;
pub use domain::{RosterSnapshot, Severity, Violation, ViolationType};
pub use error::AppError;
pub use settings::ComplianceSettings;
