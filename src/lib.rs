pub mod config;
pub mod drum;
pub mod environment;
pub mod errors;
pub mod mutation;
pub mod routes;
pub mod snapshot;
pub mod synthesis;
