use crate::types::ServiceCategory;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Empty service id in category {0}")]
    EmptyServiceId(ServiceCategory),

    #[error("Duplicate service id {id} in category {category}")]
    DuplicateServiceId {
        category: ServiceCategory,
        id: String,
    },
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
#[serde(tag = "type")]
pub enum RegistryType {
    /// Services listed in the config file, in priority order
    Static {
        #[serde(default)]
        services: IndexMap<ServiceCategory, Vec<ServiceConfig>>,
    },
    /// Remote registry queried on every resolution
    Url { url: Url },
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct ServiceConfig {
    pub id: String,
    pub url: Url,
}

#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct RegistryConfig {
    #[serde(flatten)]
    pub r#type: RegistryType,
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let RegistryType::Static { services } = &self.r#type else {
            return Ok(());
        };

        for (category, configs) in services {
            let mut seen = HashSet::new();
            for service in configs {
                if service.id.is_empty() {
                    return Err(ValidationError::EmptyServiceId(*category));
                }
                if !seen.insert(&service.id) {
                    return Err(ValidationError::DuplicateServiceId {
                        category: *category,
                        id: service.id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
