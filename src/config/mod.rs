//! Configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Connection settings for the document database
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string (e.g., "mongodb://localhost:27017")
    pub uri: String,

    /// Database name
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            name: "recur_db".to_string(),
        }
    }
}

/// Settings for the external address and travel-time service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AddressLookupConfig {
    /// Distance matrix JSON endpoint
    pub endpoint: String,

    /// API key appended to every request
    pub api_key: Option<String>,

    /// Minutes added to every travel estimate for loading and unloading
    pub travel_overhead_minutes: u32,
}

impl Default for AddressLookupConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://maps.googleapis.com/maps/api/distancematrix/json".to_string(),
            api_key: None,
            travel_overhead_minutes: 30,
        }
    }
}

/// Complete configuration for the entity store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub database: DatabaseConfig,

    pub address_lookup: AddressLookupConfig,
}

impl StoreConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }
}
