pub mod prelude;

pub mod documents;
pub mod event_logs;
pub mod users;
