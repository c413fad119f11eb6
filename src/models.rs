pub mod auth;
pub mod authz;
pub mod crm;
pub mod members;
