//! Document-level configuration

use serde::{Deserialize, Serialize};

/// License of the documented API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A server the API is reachable at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A tag used to group operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Configuration for a generated OpenAPI document
#[derive(Debug, Clone)]
pub struct OpenApiConfig {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    pub description: Option<String>,
    pub license: Option<License>,
    pub external_docs: Option<metaguard_core::ExternalDocs>,
    pub servers: Vec<Server>,
    pub tags: Vec<Tag>,
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            title: "MetaGuard API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            license: None,
            external_docs: None,
            servers: Vec::new(),
            tags: Vec::new(),
        }
    }
}

impl OpenApiConfig {
    /// Create a new OpenAPI configuration
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    /// Set API description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn license(mut self, name: impl Into<String>, url: Option<String>) -> Self {
        self.license = Some(License {
            name: name.into(),
            url,
        });
        self
    }

    /// Link to documentation outside the generated document
    pub fn external_docs(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.external_docs = Some(metaguard_core::ExternalDocs {
            url: url.into(),
            description,
        });
        self
    }

    pub fn server(mut self, url: impl Into<String>) -> Self {
        self.servers.push(Server {
            url: url.into(),
            description: None,
        });
        self
    }

    /// Declare a tag and its description
    pub fn tag(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.tags.push(Tag {
            name: name.into(),
            description: Some(description.into()),
        });
        self
    }
}
