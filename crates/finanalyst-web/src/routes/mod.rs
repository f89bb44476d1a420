//! Route modules for the web server
//!
//! - entities: generic screens shared by every entity type
//! - expense, income, transaction: per-entity columns, details and forms
//!
//! The generic module follows the same split as the per-feature modules of
//! a larger app:
//! - api.rs: form submissions and HTMX fragments
//! - page.rs: full page rendering

pub mod entities;
pub mod expense;
pub mod income;
pub mod transaction;
