use std::env;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub templates_dir: String,
    pub categories_file: String,
    pub static_dir: String,
    pub max_upload_bytes: usize,
    pub catalyst: Option<CatalystConfig>,
}

/// Controller connection settings; present only when `DNAC_HOST` is set
#[derive(Debug, Clone)]
pub struct CatalystConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub verify_ssl: bool,
}

impl CatalystConfig {
    pub fn base_url(&self) -> String {
        format!("https://{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        let dnac_host = get_env("DNAC_HOST", "");
        let catalyst = (!dnac_host.is_empty()).then(|| CatalystConfig {
            host: dnac_host,
            port: get_env("DNAC_PORT", "443").parse().unwrap_or(443),
            username: get_env("DNAC_USERNAME", ""),
            password: get_env("DNAC_PASSWORD", ""),
            verify_ssl: parse_bool(&get_env("DNAC_VERIFY_SSL", "true")),
        });

        Self {
            listen_addr: get_env("LISTEN_ADDR", "0.0.0.0:5000"),
            templates_dir: get_env("TEMPLATES_DIR", "templates"),
            categories_file: get_env("CATEGORIES_FILE", "data/categories.json"),
            static_dir: get_env("STATIC_DIR", "static"),
            max_upload_bytes: get_env("MAX_UPLOAD_BYTES", "16777216")
                .parse()
                .unwrap_or(16 * 1024 * 1024),
            catalyst,
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}
