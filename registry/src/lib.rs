//! Service registry: resolves a service category to the concrete backend
//! services that serve it.

pub mod client;
pub mod config;
pub mod metrics_defs;
pub mod static_registry;
pub mod types;

pub use client::{Registry, RegistryError};
pub use config::{RegistryConfig, RegistryType, ServiceConfig, ValidationError};
pub use static_registry::StaticRegistry;
pub use types::{ServiceCategory, ServiceEndpoint, UnknownCategory};
