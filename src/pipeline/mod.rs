pub mod dispatch;
pub mod orchestrator;
pub mod surface;

pub use dispatch::{Dispatcher, Outcome, Status, StatusEvent, SurfaceCache};
pub use orchestrator::{Orchestrator, PipelineEvent};
pub use surface::{MemorySurface, SurfaceId, TextSurface};
