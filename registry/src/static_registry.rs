//! Config-driven service registry
//!
//! Maps each service category to an ordered list of endpoints:
//!
//! ```text
//! Category "incident" → ["pagerduty", "opsgenie"]
//!   ├─ "pagerduty" → http://incidents.example.com/api/
//!   └─ "opsgenie"  → http://opsgenie.example.com/api/
//! ```
//!
//! The registry is built at startup and remains immutable afterwards. The
//! order of the configuration is the order in which results are reported.

use crate::config::ServiceConfig;
use crate::types::{ServiceCategory, ServiceEndpoint};
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct StaticRegistry {
    categories: Arc<IndexMap<ServiceCategory, Vec<ServiceEndpoint>>>,
}

impl StaticRegistry {
    pub fn new(services: IndexMap<ServiceCategory, Vec<ServiceConfig>>) -> Self {
        let categories = services
            .into_iter()
            .map(|(category, configs)| {
                let endpoints = configs
                    .into_iter()
                    .map(|config| ServiceEndpoint::new(config.id, config.url))
                    .collect();
                (category, endpoints)
            })
            .collect();

        Self {
            categories: Arc::new(categories),
        }
    }

    /// Endpoints registered for a category, empty if the category is unknown
    pub fn resolve(&self, category: ServiceCategory) -> Vec<ServiceEndpoint> {
        self.categories
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }
}
