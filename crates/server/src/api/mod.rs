pub mod agent;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod records;
pub mod routes;
pub mod tracker;
pub mod triage;

pub use routes::create_router;
