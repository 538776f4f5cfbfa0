// src/blockchain/mod.rs

pub mod models;
pub mod registry;
pub mod resolver;
pub mod services;
pub mod stats;
pub mod units;

// Re-export commonly used types
pub use registry::{NetworkEntry, NetworkRegistry};
pub use resolver::{NetworkError, NetworkResolver, ResolvedNetwork};
