pub mod auth;
pub mod sections;
pub mod tenancy;
