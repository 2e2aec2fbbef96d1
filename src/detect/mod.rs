pub mod config;
pub mod items;
pub mod sessions;

pub use config::DetectionConfig;
pub use items::discover_items;
pub use sessions::discover_sessions;
