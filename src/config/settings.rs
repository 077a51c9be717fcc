use std::env;

#[derive(Debug, Clone)]
pub struct RatingSettings {
    /// Number of mutexes entities are hashed onto for write serialisation
    pub lock_stripes: usize,
    /// Cached ratings further than this from the recomputed mean are rewritten
    pub drift_tolerance: f64,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            lock_stripes: 64,
            drift_tolerance: 1e-9,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub database_path: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
    pub default_page_size: usize,
    pub min_page_size: usize,
    pub max_page_size: usize,
    pub admin_token: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            database_path: "horizon_ratings.db".to_string(),
            pool_size: 8,
            busy_timeout_ms: 5_000,
            default_page_size: 10,
            min_page_size: 5,
            max_page_size: 100,
            admin_token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub rating: RatingSettings,
    pub server: ServerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            rating: RatingSettings::default(),
            server: ServerSettings::default(),
        }
    }

    /// Defaults overridden by `DATABASE_PATH`, `DATABASE_POOL_SIZE` and `ADMIN_TOKEN`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            config.server.database_path = path;
        }

        match lookup("DATABASE_POOL_SIZE").map(|s| s.parse::<u32>()) {
            Some(Ok(size)) if size > 0 => config.server.pool_size = size,
            Some(_) => log::warn!(
                "Ignoring invalid DATABASE_POOL_SIZE, using {}",
                config.server.pool_size
            ),
            None => {}
        }

        config.server.admin_token = lookup("ADMIN_TOKEN").filter(|t| !t.is_empty());
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]);
        assert_eq!(config.server.database_path, "horizon_ratings.db");
        assert_eq!(config.server.pool_size, 8);
        assert!(config.server.admin_token.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = config_from(&[
            ("DATABASE_PATH", "/tmp/ratings.db"),
            ("DATABASE_POOL_SIZE", "2"),
            ("ADMIN_TOKEN", "s3cret"),
        ]);
        assert_eq!(config.server.database_path, "/tmp/ratings.db");
        assert_eq!(config.server.pool_size, 2);
        assert_eq!(config.server.admin_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn test_invalid_pool_size_keeps_default() {
        let config = config_from(&[("DATABASE_POOL_SIZE", "zero"), ("ADMIN_TOKEN", "")]);
        assert_eq!(config.server.pool_size, 8);
        assert!(config.server.admin_token.is_none());
    }
}
