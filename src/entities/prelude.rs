pub use super::documents::Entity as Documents;
pub use super::event_logs::Entity as EventLogs;
pub use super::users::Entity as Users;
