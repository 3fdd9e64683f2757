pub mod bench;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod decision;
pub mod errors;
pub mod feedback;
pub mod logger;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod session;
pub mod telemetry;

pub use crate::config::ServiceConfig;
pub use crate::crypto::{AlgorithmId, DualSigner, Signed};
pub use crate::decision::DecisionEngine;
pub use crate::errors::ServiceError;
pub use crate::server::Server;
