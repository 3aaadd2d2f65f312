// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::model;

// === MODULE WIRING ===
pub mod module;
pub use module::UsersModule;

// === INTERNAL MODULES ===
// Exposed for tests and for the server binary; other crates should stick to
// `contract` and `UsersModule`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
