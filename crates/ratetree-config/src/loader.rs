//! File loading by extension.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{ConfigError, ConfigResult};

/// Input file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON.
    Json,
    /// TOML.
    Toml,
}

impl FileFormat {
    /// TOML for a `.toml` extension, JSON otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }
}

/// Reads and parses `path`.
pub fn load<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match FileFormat::from_path(path) {
        FileFormat::Json => Ok(serde_json::from_str(&text)?),
        FileFormat::Toml => Ok(toml::from_str(&text)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TreeSettings;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn temp(suffix: &str) -> NamedTempFile {
        Builder::new().suffix(suffix).tempfile().unwrap()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a.toml")), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new("a.TOML")), FileFormat::Toml);
        assert_eq!(FileFormat::from_path(Path::new("a.json")), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("a")), FileFormat::Json);
    }

    #[test]
    fn test_load_both_formats() {
        let mut json = temp(".json");
        write!(json, r#"{{"model": "black-karasinski", "step_size": 0.25}}"#).unwrap();
        let settings: TreeSettings = load(json.path()).unwrap();
        assert_eq!(settings.step_size, 0.25);

        let mut toml = temp(".toml");
        writeln!(toml, "model = \"hw\"\nhorizon = 12.0").unwrap();
        let settings: TreeSettings = load(toml.path()).unwrap();
        assert_eq!(settings.horizon, 12.0);
    }

    #[test]
    fn test_errors() {
        let missing: ConfigResult<TreeSettings> = load(Path::new("/nonexistent/market.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let mut bad = temp(".json");
        write!(bad, "{{ not json").unwrap();
        let parsed: ConfigResult<TreeSettings> = load(bad.path());
        assert!(matches!(parsed, Err(ConfigError::Deserialization(_))));
    }
}
