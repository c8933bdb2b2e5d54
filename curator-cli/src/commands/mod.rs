pub mod completion;
pub mod config;
pub mod routes;
pub mod session;
