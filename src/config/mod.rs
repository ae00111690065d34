use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub hierarchy: HierarchyConfig,
    pub layout: LayoutConfig,
    pub observer: ObserverConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string; the in-memory store is used when unset
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub enable_request_logging: bool,
    /// Serve full listings from an event-invalidated cache
    pub cache_full_listing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyConfig {
    /// Apply the child-deeper-than-parent level rule on updates too
    pub enforce_level_on_update: bool,
    /// Refuse reparenting a node under itself or one of its descendants
    pub reject_cycles: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub node_sep: f64,
    pub rank_sep: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 70.0,
            node_sep: 40.0,
            rank_sep: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    pub timeout_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // API overrides
        if let Ok(v) = env::var("API_PORT").or_else(|_| env::var("PORT")) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_CACHE_FULL_LISTING") {
            self.api.cache_full_listing = v.parse().unwrap_or(self.api.cache_full_listing);
        }

        // Hierarchy rule overrides
        if let Ok(v) = env::var("HIERARCHY_ENFORCE_LEVEL_ON_UPDATE") {
            self.hierarchy.enforce_level_on_update = v.parse().unwrap_or(self.hierarchy.enforce_level_on_update);
        }
        if let Ok(v) = env::var("HIERARCHY_REJECT_CYCLES") {
            self.hierarchy.reject_cycles = v.parse().unwrap_or(self.hierarchy.reject_cycles);
        }

        // Layout overrides
        if let Ok(v) = env::var("LAYOUT_NODE_WIDTH") {
            self.layout.node_width = v.parse().unwrap_or(self.layout.node_width);
        }
        if let Ok(v) = env::var("LAYOUT_NODE_HEIGHT") {
            self.layout.node_height = v.parse().unwrap_or(self.layout.node_height);
        }
        if let Ok(v) = env::var("LAYOUT_NODE_SEP") {
            self.layout.node_sep = v.parse().unwrap_or(self.layout.node_sep);
        }
        if let Ok(v) = env::var("LAYOUT_RANK_SEP") {
            self.layout.rank_sep = v.parse().unwrap_or(self.layout.rank_sep);
        }

        if let Ok(v) = env::var("OBSERVER_TIMEOUT_MS") {
            self.observer.timeout_ms = v.parse().unwrap_or(self.observer.timeout_ms);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 20,
                max_page_size: 1000,
                enable_request_logging: true,
                cache_full_listing: true,
            },
            hierarchy: HierarchyConfig {
                enforce_level_on_update: false,
                reject_cycles: true,
            },
            layout: LayoutConfig::default(),
            observer: ObserverConfig { timeout_ms: 5000 },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 20,
                max_page_size: 500,
                enable_request_logging: true,
                cache_full_listing: true,
            },
            hierarchy: HierarchyConfig {
                enforce_level_on_update: false,
                reject_cycles: true,
            },
            layout: LayoutConfig::default(),
            observer: ObserverConfig { timeout_ms: 5000 },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig {
                port: 3000,
                default_page_size: 20,
                max_page_size: 100,
                enable_request_logging: false,
                // Several instances may share one database
                cache_full_listing: false,
            },
            hierarchy: HierarchyConfig {
                enforce_level_on_update: false,
                reject_cycles: true,
            },
            layout: LayoutConfig::default(),
            observer: ObserverConfig { timeout_ms: 2000 },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
