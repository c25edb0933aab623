//! Configuration system for protoeval
//!
//! Reads config from ~/.config/protoeval/config.toml

use std::path::PathBuf;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            bind: "127.0.0.1".to_string(),
        }
    }
}

/// Upload handling configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static/uploads"),
            max_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Evaluation model configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub model: String,
    pub base_url: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub ai: AiConfig,
}

impl Config {
    /// Load configuration from default path
    pub fn load() -> Self {
        let config_path = Self::default_config_path();
        Self::load_from_path(&config_path).unwrap_or_default()
    }

    /// Get default config path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("protoeval")
            .join("config.toml")
    }

    /// Load from specific path (simple key=value parsing)
    pub fn load_from_path(path: &PathBuf) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;

        let mut config = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('[') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');

                match key {
                    "http_port" => {
                        if let Ok(port) = value.parse() {
                            config.server.http_port = port;
                        }
                    }
                    "bind" => {
                        config.server.bind = value.to_string();
                    }
                    "upload_dir" => {
                        config.upload.dir = PathBuf::from(value);
                    }
                    "max_upload_mb" => {
                        if let Ok(mb) = value.parse::<usize>() {
                            config.upload.max_bytes = mb * 1024 * 1024;
                        }
                    }
                    "model" => {
                        config.ai.model = value.to_string();
                    }
                    "openai_base_url" => {
                        config.ai.base_url = value.trim_end_matches('/').to_string();
                    }
                    _ => {}
                }
            }
        }

        Some(config)
    }

    /// Create default config file if it doesn't exist
    pub fn create_default_if_missing() {
        let path = Self::default_config_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let default_config = r#"# protoeval Configuration

[server]
http_port = 8080
bind = "127.0.0.1"

[upload]
upload_dir = "static/uploads"
max_upload_mb = 25

[ai]
model = "gpt-4o"
openai_base_url = "https://api.openai.com/v1"
"#;
            let _ = std::fs::write(&path, default_config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.ai.model, "gpt-4o");
        assert_eq!(config.upload.max_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"[server]
http_port = 9090
bind = "0.0.0.0"

[upload]
max_upload_mb = 5

[ai]
model = "gpt-4o-mini"
openai_base_url = "http://localhost:8001/v1/"
"#
        )
        .unwrap();

        let config = Config::load_from_path(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.server.http_port, 9090);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.upload.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.ai.base_url, "http://localhost:8001/v1");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let path = PathBuf::from("/nonexistent/protoeval/config.toml");
        assert!(Config::load_from_path(&path).is_none());
    }
}
