//! API endpoint handlers, one module per resource.

pub mod health;
pub mod knowledge;
pub mod patients;
pub mod reports;
