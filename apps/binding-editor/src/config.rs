//! Configuration for the binding editor.

use reel_keybinds::ExtensionBinding;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "reel")
            .map(|d| d.config_dir().join("editor.toml"))
    }

    /// Where the user's input.conf lives: the configured override, or the
    /// reel config directory, or the working directory as a last resort.
    pub fn input_conf_path(&self) -> PathBuf {
        self.files.input_conf.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "reel")
                .map(|d| d.config_dir().join("input.conf"))
                .unwrap_or_else(|| "input.conf".into())
        })
    }

    pub fn extensions_path(&self) -> PathBuf {
        self.files.extensions.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("", "", "reel")
                .map(|d| d.config_dir().join("extensions.toml"))
                .unwrap_or_else(|| "extensions.toml".into())
        })
    }

    /// Extension-contributed bindings to merge at startup. A missing file
    /// is an empty list; a file that does not parse is reported.
    pub fn load_extensions(&self) -> Result<Vec<ExtensionBinding>, toml::de::Error> {
        let path = self.extensions_path();
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Ok(Vec::new());
        };
        let manifest: ExtensionsFile = toml::from_str(&text)?;
        Ok(manifest.binding)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesConfig {
    /// Override for the input.conf location.
    #[serde(default)]
    pub input_conf: Option<PathBuf>,
    /// Override for the extensions.toml location.
    #[serde(default)]
    pub extensions: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

fn default_time_format() -> String {
    "%H:%M:%S".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_format: default_time_format(),
        }
    }
}

/// Shape of extensions.toml: a list of `[[binding]]` tables.
#[derive(Debug, Deserialize)]
struct ExtensionsFile {
    #[serde(default)]
    binding: Vec<ExtensionBinding>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.files.input_conf, None);
        assert_eq!(config.display.time_format, "%H:%M:%S");
    }

    #[test]
    fn test_config_overrides() {
        let config: Config = toml::from_str(
            r#"
            [files]
            input_conf = "/tmp/input.conf"

            [display]
            time_format = "%H:%M"
            "#,
        )
        .unwrap();
        assert_eq!(config.input_conf_path(), PathBuf::from("/tmp/input.conf"));
        assert_eq!(config.display.time_format, "%H:%M");
    }

    #[test]
    fn test_extensions_file_shape() {
        let manifest: ExtensionsFile = toml::from_str(
            r#"
            [[binding]]
            extension_id = "subtitle-tools"
            key = "Ctrl+e"
            action = "sub-reload"
            "#,
        )
        .unwrap();
        assert_eq!(manifest.binding.len(), 1);
        assert_eq!(manifest.binding[0].extension_id, "subtitle-tools");
    }
}
