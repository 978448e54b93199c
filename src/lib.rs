pub mod config;
pub mod decode;
pub mod github;
pub mod handlers;
pub mod ingest;
pub mod place;
pub mod routes;
pub mod state;
pub mod store;
