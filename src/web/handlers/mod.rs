// JSON API handlers, one module per resource.

pub mod analyze;
pub mod auth;
pub mod history;
pub mod session;
