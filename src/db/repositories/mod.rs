pub mod document;
pub mod event_log;
pub mod user;
