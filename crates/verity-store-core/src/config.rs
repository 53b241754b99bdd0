//! Configuration for the storage engine
//!
//! Provides presets for common deployments and builder-style overrides.

/// Default number of decoded values kept in memory
pub const DEFAULT_CACHE_CAPACITY: usize = 30;

/// Default number of named tables allowed per environment
pub const DEFAULT_MAX_TABLES: usize = 2;

/// Upper bound accepted for `max_tables`
pub const MAX_TABLES_LIMIT: usize = 64;

/// What `iterate` does with an index entry whose digest is missing from
/// the main table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Omit the entry and keep scanning
    #[default]
    Skip,
    /// Abort the scan with `StoreError::DanglingIndex`
    Fail,
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries resident in the bounded cache
    pub cache_capacity: usize,
    /// Maximum number of named tables in each environment
    pub max_tables: usize,
    /// Handling of index entries that point at missing values
    pub orphan_policy: OrphanPolicy,
}

impl Config {
    /// Two-entry cache; handy for tests and tightly constrained hosts.
    pub fn small() -> Self {
        Self {
            cache_capacity: 2,
            ..Self::default()
        }
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_max_tables(mut self, max_tables: usize) -> Self {
        self.max_tables = max_tables;
        self
    }

    pub fn with_orphan_policy(mut self, policy: OrphanPolicy) -> Self {
        self.orphan_policy = policy;
        self
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be > 0".into());
        }
        if self.max_tables < DEFAULT_MAX_TABLES || self.max_tables > MAX_TABLES_LIMIT {
            return Err(format!(
                "max_tables must be in [{}, {}]",
                DEFAULT_MAX_TABLES, MAX_TABLES_LIMIT
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_tables: DEFAULT_MAX_TABLES,
            orphan_policy: OrphanPolicy::Skip,
        }
    }
}
