//! API endpoint handlers, one module per feature area.

pub mod crops;
pub mod health;
pub mod predict;
pub mod reports;
