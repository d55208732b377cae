use crate::domain::config::{ConfCtlConfig, EndpointConfig, GlobalConfig, ReadMode};
use crate::domain::error::{ConfCtlError, ConfCtlResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> ConfCtlResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_project_config_path(&dir));

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Manager with explicit paths, bypassing discovery.
    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Load configuration from files
    pub fn load_config(&self) -> ConfCtlResult<ConfCtlConfig> {
        // Start with default configuration
        let mut config = ConfCtlConfig::default();

        // Global file may carry both settings and shared endpoints
        if self.global_config_path.exists() {
            config = self.load_config_from_path(&self.global_config_path)?;
        }

        // Project endpoints replace global ones with the same name
        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let project_config = self.load_config_from_path(project_path)?;
                for endpoint in project_config.endpoints {
                    config.endpoints.retain(|existing| existing.name != endpoint.name);
                    config.endpoints.push(endpoint);
                }
            }
        }

        Ok(config)
    }

    /// Look up an endpoint by name.
    pub fn endpoint(&self, name: &str) -> ConfCtlResult<EndpointConfig> {
        let config = self.load_config()?;
        let endpoint = config
            .endpoints
            .into_iter()
            .find(|endpoint| endpoint.name == name)
            .ok_or_else(|| ConfCtlError::config(format!("Unknown endpoint '{}'", name)))?;
        endpoint.validate()?;
        Ok(endpoint)
    }

    /// Save configuration: global settings to the global file, endpoints to
    /// the project file when there is one.
    pub fn save_config(&self, config: &ConfCtlConfig) -> ConfCtlResult<()> {
        match &self.project_config_path {
            Some(project_path) => {
                let global_config = ConfCtlConfig {
                    global: config.global.clone(),
                    endpoints: Vec::new(),
                };
                self.save_config_to_path(&self.global_config_path, &global_config)?;

                let project_config = ConfCtlConfig {
                    global: GlobalConfig::default(),
                    endpoints: config.endpoints.clone(),
                };
                self.save_config_to_path(project_path, &project_config)
            }
            None => self.save_config_to_path(&self.global_config_path, config),
        }
    }

    /// Get global configuration path
    fn get_global_config_path() -> ConfCtlResult<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ConfCtlError::config("Could not determine home directory"))?;

        Ok(home.join(".config").join("confctl").join("config.toml"))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path(start: &Path) -> Option<PathBuf> {
        let mut path = start;

        loop {
            let config_path = path.join(".confctl").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> ConfCtlResult<ConfCtlConfig> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfCtlError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ConfCtlError::config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &ConfCtlConfig) -> ConfCtlResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfCtlError::config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| ConfCtlError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            ConfCtlError::config(format!("Failed to write config file {}: {}", path.display(), e))
        })
    }

    /// Create default project configuration
    pub fn init_project_config(&self, path: &Path) -> ConfCtlResult<PathBuf> {
        let config_file = path.join(".confctl").join("config.toml");

        if config_file.exists() {
            return Err(ConfCtlError::config("Project configuration already exists"));
        }

        let default_config = ConfCtlConfig {
            global: GlobalConfig::default(),
            endpoints: vec![
                EndpointConfig {
                    name: "boardroom".to_string(),
                    ..EndpointConfig::new("192.168.1.40")
                },
                EndpointConfig {
                    name: "legacy_hdx".to_string(),
                    ..EndpointConfig::new("192.168.1.41")
                        .with_read_mode(ReadMode::fixed_delay())
                },
            ],
        };

        self.save_config_to_path(&config_file, &default_config)?;

        Ok(config_file)
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> ConfigManager {
        ConfigManager::with_paths(
            dir.path().join("global").join("config.toml"),
            Some(dir.path().join(".confctl").join("config.toml")),
        )
    }

    #[test]
    fn test_load_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = manager_in(&temp_dir).load_config().unwrap();

        assert_eq!(config.global.log_level, "info");
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_init_project_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let config_file = manager.init_project_config(temp_dir.path()).unwrap();
        assert!(config_file.exists());

        let content = fs::read_to_string(&config_file).unwrap();
        let config: ConfCtlConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[1].read_mode, ReadMode::fixed_delay());

        // Refuses to overwrite
        assert!(manager.init_project_config(temp_dir.path()).is_err());
    }

    #[test]
    fn test_project_endpoints_override_global() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let global = ConfCtlConfig {
            global: GlobalConfig {
                log_level: "debug".to_string(),
            },
            endpoints: vec![
                EndpointConfig {
                    name: "lobby".to_string(),
                    ..EndpointConfig::new("10.0.0.1")
                },
                EndpointConfig {
                    name: "boardroom".to_string(),
                    ..EndpointConfig::new("10.0.0.2")
                },
            ],
        };
        manager
            .save_config_to_path(manager.get_global_config_path_ref(), &global)
            .unwrap();
        manager.init_project_config(temp_dir.path()).unwrap();

        let config = manager.load_config().unwrap();
        assert_eq!(config.global.log_level, "debug");
        assert_eq!(config.endpoints.len(), 3);

        let boardroom = manager.endpoint("boardroom").unwrap();
        assert_eq!(boardroom.address, "192.168.1.40");
        assert_eq!(manager.endpoint("lobby").unwrap().address, "10.0.0.1");
        assert!(matches!(
            manager.endpoint("cafeteria"),
            Err(ConfCtlError::Config { .. })
        ));
    }

    #[test]
    fn test_find_project_config_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);
        manager.init_project_config(temp_dir.path()).unwrap();

        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let found = ConfigManager::find_project_config_path(&nested).unwrap();
        assert_eq!(found, temp_dir.path().join(".confctl").join("config.toml"));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let manager = manager_in(&temp_dir);

        let config = ConfCtlConfig {
            global: GlobalConfig::default(),
            endpoints: vec![EndpointConfig::new("10.1.2.3").with_prompt("-> ")],
        };
        manager.save_config(&config).unwrap();

        let reloaded = manager.load_config().unwrap();
        assert_eq!(reloaded.endpoints, config.endpoints);
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        fs::write(&path, "[[endpoints]\naddress = ").unwrap();

        let result = manager_in(&temp_dir).load_config_from_path(&path);
        assert!(matches!(result, Err(ConfCtlError::Config { .. })));
    }
}
