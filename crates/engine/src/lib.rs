pub mod poller;
pub mod report;
pub mod scheduler;
pub mod sources;

pub use poller::{Poller, PollerExit, PollerHandle};
pub use scheduler::{Cadence, Scheduler, TokioScheduler};
pub use sources::Sources;
