pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod doctor;
pub mod environment;
pub mod error;
pub mod fix;
pub mod orchestrator;
pub mod report;
pub mod reporter;
pub mod runner;
pub mod target;

pub use classifier::{CheckOutcome, Status};
pub use config::CheckDefinition;
pub use error::AuditError;
pub use runner::{CommandCall, CommandResult, CommandRunner, RealCommandRunner};
