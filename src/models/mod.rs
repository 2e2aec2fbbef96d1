pub mod item;
pub mod session;

pub use item::{Item, PLACEHOLDER_PRICE};
pub use session::{Session, SessionStatus};
