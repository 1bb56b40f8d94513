//! Vector store connection settings.
//!
//! Resolved like [`crate::agent::AgentConfig`]: explicit value, then
//! environment, then default. Missing credentials are not rejected here;
//! they surface as connection failures when the store is first used.

/// Collection shared by ingestion and retrieval.
pub const DEFAULT_COLLECTION: &str = "contracts_business_latest_6";

/// Default number of passages returned per search.
pub const DEFAULT_SEARCH_LIMIT: usize = 3;

/// Settings for the Weaviate cluster.
#[derive(Debug, Clone)]
pub struct VectorStoreConfig {
    /// Cluster URL (e.g., `https://my-cluster.weaviate.network`).
    pub url: Option<String>,
    /// Cluster API key.
    pub api_key: Option<String>,
    /// OpenAI key forwarded to the cluster's vectorizer module.
    pub openai_api_key: Option<String>,
    /// Collection name as configured; see [`Self::class_name`].
    pub collection: String,
    /// Passages returned per search.
    pub search_limit: usize,
}

impl VectorStoreConfig {
    /// Creates a new builder for `VectorStoreConfig`.
    #[must_use]
    pub fn builder() -> VectorStoreConfigBuilder {
        VectorStoreConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::builder().from_env().build()
    }

    /// Collection name normalised to a Weaviate class name.
    ///
    /// Weaviate class names start with an uppercase letter, so
    /// `contracts_business_latest_6` and `Contracts_business_latest_6`
    /// address the same collection.
    #[must_use]
    pub fn class_name(&self) -> String {
        let mut chars = self.collection.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

/// Builder for [`VectorStoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct VectorStoreConfigBuilder {
    url: Option<String>,
    api_key: Option<String>,
    openai_api_key: Option<String>,
    collection: Option<String>,
    search_limit: Option<usize>,
}

impl VectorStoreConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.url.is_none() {
            self.url = std::env::var("WEAVIATE_URL").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("WEAVIATE_API_KEY").ok();
        }
        if self.openai_api_key.is_none() {
            self.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        self
    }

    /// Sets the cluster URL.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the cluster API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the OpenAI key forwarded to the vectorizer.
    #[must_use]
    pub fn openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Sets the collection name.
    #[must_use]
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Sets the search result limit.
    #[must_use]
    pub const fn search_limit(mut self, n: usize) -> Self {
        self.search_limit = Some(n);
        self
    }

    /// Builds the [`VectorStoreConfig`].
    #[must_use]
    pub fn build(self) -> VectorStoreConfig {
        VectorStoreConfig {
            url: self.url,
            api_key: self.api_key,
            openai_api_key: self.openai_api_key,
            collection: self
                .collection
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            search_limit: self.search_limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_builder_defaults() {
        let config = VectorStoreConfig::builder().build();
        assert!(config.url.is_none());
        assert_eq!(config.collection, DEFAULT_COLLECTION);
        assert_eq!(config.search_limit, 3);
    }

    #[test_case("contracts_business_latest_6", "Contracts_business_latest_6" ; "lowercase first")]
    #[test_case("Contracts_business_latest_6", "Contracts_business_latest_6" ; "already normalised")]
    #[test_case("", "" ; "empty")]
    fn test_class_name(collection: &str, expected: &str) {
        let config = VectorStoreConfig::builder().collection(collection).build();
        assert_eq!(config.class_name(), expected);
    }

    #[test]
    fn test_search_limit_never_zero() {
        let config = VectorStoreConfig::builder().search_limit(0).build();
        assert_eq!(config.search_limit, 1);
    }
}
