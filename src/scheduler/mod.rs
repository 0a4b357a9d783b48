pub mod processor;
pub mod resources;

pub use processor::{JobScheduler, JobStatusView, Progress, SubmitResponse};
pub use resources::{recommended_workers, FixedMemory, MemoryProbe, ProcMeminfo};
