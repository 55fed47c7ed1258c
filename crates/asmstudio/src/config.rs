use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs::try_exists;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub editor: EditorConfig,
    pub run: RunConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    pub tab_size: usize,
    pub line_numbers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Step cap for a single Run action, so a missing `halt` cannot
    /// wedge the event loop.
    pub max_steps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub size_bytes: usize,
    pub words_per_row: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: EditorConfig {
                tab_size: 4,
                line_numbers: true,
            },
            run: RunConfig { max_steps: 10_000 },
            memory: MemoryConfig {
                size_bytes: asmcore::cpu::DEFAULT_MEMORY_BYTES,
                words_per_row: 4,
            },
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        if let Some(config_path) = Self::config_path() {
            if try_exists(&config_path).await? {
                match tokio::fs::read_to_string(&config_path).await {
                    Ok(content) => {
                        if content.trim().is_empty() {
                            log::warn!("Config file is empty, creating new one");
                            let default_config = Self::default();
                            let _ = default_config.save().await;
                            return Ok(default_config);
                        }

                        match serde_json::from_str::<Self>(&content) {
                            Ok(mut config) => {
                                config.validate()?;
                                log::info!(
                                    "Successfully loaded config from: {}",
                                    config_path.display()
                                );
                                return Ok(config);
                            }
                            Err(json_err) => {
                                log::error!("Failed to parse config file: {}", json_err);

                                // Keep the broken file around for the user.
                                let backup_path = config_path.with_extension("bak");
                                if let Err(e) = tokio::fs::copy(&config_path, &backup_path).await {
                                    log::warn!("Failed to backup broken config: {}", e);
                                } else {
                                    log::info!(
                                        "Backed up broken config to: {}",
                                        backup_path.display()
                                    );
                                }

                                let default_config = Self::default();
                                let _ = default_config.save().await;
                                return Ok(default_config);
                            }
                        }
                    }
                    Err(io_err) => {
                        log::error!("Failed to read config file: {}", io_err);
                    }
                }
            } else {
                log::info!("Config file does not exist, creating default");
            }
        }

        let default_config = Self::default();
        let _ = default_config.save().await;
        Ok(default_config)
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_path() {
            let mut config_to_save = self.clone();
            config_to_save.validate()?;

            if let Some(parent) = config_path.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    return Err(anyhow::anyhow!(
                        "failed to create config directory {}: {}",
                        parent.display(),
                        e
                    ));
                }
            }

            let content = serde_json::to_string_pretty(&config_to_save)?;
            if let Err(e) = tokio::fs::write(&config_path, content).await {
                return Err(anyhow::anyhow!(
                    "failed to write config file {}: {}",
                    config_path.display(),
                    e
                ));
            }
            log::info!("Successfully saved config to: {}", config_path.display());
        }
        Ok(())
    }

    /// Validate configuration values and fix invalid ones
    pub fn validate(&mut self) -> Result<()> {
        let mut has_issues = false;

        if self.editor.tab_size == 0 || self.editor.tab_size > 16 {
            log::warn!("Invalid tab size: {}, using default", self.editor.tab_size);
            self.editor.tab_size = 4;
            has_issues = true;
        }

        if self.run.max_steps == 0 || self.run.max_steps > 1_000_000 {
            log::warn!("Invalid run step cap: {}, using default", self.run.max_steps);
            self.run.max_steps = 10_000;
            has_issues = true;
        }

        if self.memory.size_bytes < 256 || self.memory.size_bytes > 1 << 20 {
            log::warn!(
                "Invalid memory size: {}, using default",
                self.memory.size_bytes
            );
            self.memory.size_bytes = asmcore::cpu::DEFAULT_MEMORY_BYTES;
            has_issues = true;
        }
        // Memory is word-addressed in the inspector; keep it word-aligned.
        self.memory.size_bytes &= !3;

        if self.memory.words_per_row == 0 || self.memory.words_per_row > 16 {
            log::warn!(
                "Invalid words per row: {}, using default",
                self.memory.words_per_row
            );
            self.memory.words_per_row = 4;
            has_issues = true;
        }

        if has_issues {
            log::info!("Configuration validation completed with corrections");
        }

        Ok(())
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ASMSTUDIO_CONFIG_PATH") {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = std::env::var("ASMSTUDIO_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.json"));
        }

        ProjectDirs::from("com", "asmstudio", "asmstudio")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor.tab_size, 4);
        assert!(config.editor.line_numbers);
        assert_eq!(config.run.max_steps, 10_000);
        assert_eq!(config.memory.size_bytes, asmcore::cpu::DEFAULT_MEMORY_BYTES);
        assert_eq!(config.memory.words_per_row, 4);
    }

    #[test]
    fn test_config_serialization_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"editor\""));
        assert!(json.contains("\"run\""));
        assert!(json.contains("\"memory\""));

        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.editor.tab_size, config.editor.tab_size);
        assert_eq!(parsed.run.max_steps, config.run.max_steps);
    }

    #[test]
    fn test_validate_fixes_out_of_range_values() {
        let mut config = Config::default();
        config.editor.tab_size = 99;
        config.run.max_steps = 0;
        config.memory.size_bytes = 7;
        config.memory.words_per_row = 0;

        config.validate().unwrap();

        assert_eq!(config.editor.tab_size, 4);
        assert_eq!(config.run.max_steps, 10_000);
        assert_eq!(config.memory.size_bytes, asmcore::cpu::DEFAULT_MEMORY_BYTES);
        assert_eq!(config.memory.words_per_row, 4);
    }

    #[test]
    fn test_validate_word_aligns_memory_size() {
        let mut config = Config::default();
        config.memory.size_bytes = 1022;
        config.validate().unwrap();
        assert_eq!(config.memory.size_bytes, 1020);
    }
}
