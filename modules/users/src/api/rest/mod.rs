pub mod dto;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;
