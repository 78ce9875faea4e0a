pub mod engine;
pub mod error;
pub mod pull_requests;
pub mod random;
pub mod router;
pub mod state;
pub mod teams;
pub mod users;
