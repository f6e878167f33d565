pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod normalize;
pub mod orchestrator;
pub mod reconcile;
pub mod sources;
pub mod store;
pub mod types;
