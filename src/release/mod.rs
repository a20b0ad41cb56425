pub mod capabilities;
pub mod dry_run;
pub mod orchestrator;
pub mod version;

pub use capabilities::Capabilities;
pub use dry_run::DryRun;
pub use orchestrator::{Outcome, ReleaseOrchestrator};
