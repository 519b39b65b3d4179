//! Domain primitives shared across services and the API layer.

pub mod events;
pub mod role;

pub use events::{EventLogPayload, NotificationEvent};
pub use role::Role;
