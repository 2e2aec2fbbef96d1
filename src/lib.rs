pub mod config;
pub mod detect;
pub mod engine;
pub mod events;
pub mod metrics;
pub mod models;
pub mod observation;
pub mod store;
mod utils;

pub use config::{CameraConfig, FleetConfig};
pub use engine::{run_cameras, CameraContext, PollConfig, PollingController};
pub use events::{EventSink, PipelineEvent};
pub use models::{Item, Session, SessionStatus};
pub use observation::{ObservationError, ObservationWindow, Sample};
