pub mod auth;
pub use auth::AuthService;
pub mod authz_service;
pub use authz_service::AccessPolicy;
pub mod crm_service;
pub use crm_service::CrmService;
