//! Domain services.
//!
//! Traits define the seams; `SeaOrm*` and `Gemini*` types are the concrete
//! implementations wired up in the application state.

pub mod analysis_service;
pub mod analysis_service_impl;
pub mod auth_service;
pub mod auth_service_impl;
pub mod csv_import;
pub mod document_service;
pub mod document_service_impl;
pub mod event_log;
pub mod password;
pub mod storage;
pub mod token;
pub mod user_service;
pub mod user_service_impl;

pub use analysis_service::{AnalysisError, AnalysisResult, AnalysisService};
pub use analysis_service_impl::GeminiAnalysisService;
pub use auth_service::{AuthError, AuthService, CurrentUser, TokenPair};
pub use auth_service_impl::SeaOrmAuthService;
pub use document_service::{DocumentError, DocumentService, UploadOutcome, UploadRequest};
pub use document_service_impl::SeaOrmDocumentService;
pub use event_log::EventLogService;
pub use storage::{FileStorage, LocalFileStorage};
pub use token::TokenIssuer;
pub use user_service::{UserError, UserService};
pub use user_service_impl::SeaOrmUserService;
