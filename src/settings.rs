use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

pub const KEY_PORT: &str = "idf.port";
pub const KEY_PORT_WINDOWS: &str = "idf.portWin";
pub const KEY_FLASH_BAUD: &str = "idf.flashBaudRate";

/// Which port key to read from the editor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsPlatform {
    Windows,
    Default,
}

impl SettingsPlatform {
    pub fn host() -> Self {
        if cfg!(windows) {
            SettingsPlatform::Windows
        } else {
            SettingsPlatform::Default
        }
    }

    pub fn port_key(self) -> &'static str {
        match self {
            SettingsPlatform::Windows => KEY_PORT_WINDOWS,
            SettingsPlatform::Default => KEY_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerialSettings {
    pub port: String,
    /// Kept as text; it is handed to the flashing tool verbatim.
    pub baud: String,
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("unable to read settings {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings JSON in {path:?}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings {path:?} must contain a JSON object")]
    NotAnObject { path: PathBuf },

    #[error("settings {path:?} has no '{key}' key")]
    MissingKey { path: PathBuf, key: &'static str },

    #[error("settings {path:?}: '{key}' must be a string or number")]
    InvalidValue { path: PathBuf, key: &'static str },
}

/// Read serial port and flash baud rate from an editor settings file.
pub fn load_serial_settings(
    path: &Path,
    platform: SettingsPlatform,
) -> Result<SerialSettings, SettingsError> {
    let text = fs::read_to_string(path).map_err(|e| SettingsError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| SettingsError::InvalidJson {
            path: path.to_path_buf(),
            source: e,
        })?;
    serial_settings_from_value(path, &value, platform)
}

pub fn serial_settings_from_value(
    path: &Path,
    value: &serde_json::Value,
    platform: SettingsPlatform,
) -> Result<SerialSettings, SettingsError> {
    let obj = value.as_object().ok_or_else(|| SettingsError::NotAnObject {
        path: path.to_path_buf(),
    })?;

    let text_value = |key: &'static str| -> Result<String, SettingsError> {
        match obj.get(key) {
            None | Some(serde_json::Value::Null) => Err(SettingsError::MissingKey {
                path: path.to_path_buf(),
                key,
            }),
            Some(serde_json::Value::String(s)) => Ok(s.clone()),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            Some(_) => Err(SettingsError::InvalidValue {
                path: path.to_path_buf(),
                key,
            }),
        }
    };

    let port = text_value(platform.port_key())?;
    let baud = text_value(KEY_FLASH_BAUD)?;
    tracing::debug!(key = platform.port_key(), %port, %baud, "serial settings read");

    Ok(SerialSettings { port, baud })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::NamedTempFile;

    fn write_settings(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut f, content.as_bytes()).unwrap();
        f
    }

    const SETTINGS: &str = r#"{
        "idf.port": "/dev/ttyUSB0",
        "idf.portWin": "COM6",
        "idf.flashBaudRate": "921600",
        "idf.adapterTargetName": "esp32"
    }"#;

    #[test]
    fn test_port_key_follows_platform() {
        let f = write_settings(SETTINGS);
        let linux = load_serial_settings(f.path(), SettingsPlatform::Default).unwrap();
        assert_eq!(linux.port, "/dev/ttyUSB0");
        assert_eq!(linux.baud, "921600");

        let win = load_serial_settings(f.path(), SettingsPlatform::Windows).unwrap();
        assert_eq!(win.port, "COM6");
    }

    #[test]
    fn test_numeric_baud_becomes_text() {
        let f = write_settings(r#"{"idf.port": "/dev/ttyACM0", "idf.flashBaudRate": 460800}"#);
        let s = load_serial_settings(f.path(), SettingsPlatform::Default).unwrap();
        assert_eq!(s.baud, "460800");
    }

    #[test]
    fn test_missing_windows_key() {
        let f = write_settings(r#"{"idf.port": "/dev/ttyACM0", "idf.flashBaudRate": "115200"}"#);
        match load_serial_settings(f.path(), SettingsPlatform::Windows) {
            Err(SettingsError::MissingKey { key, .. }) => assert_eq!(key, KEY_PORT_WINDOWS),
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_and_shapes() {
        let f = write_settings("{ not json");
        assert!(matches!(
            load_serial_settings(f.path(), SettingsPlatform::Default),
            Err(SettingsError::InvalidJson { .. })
        ));

        let f = write_settings("[1, 2]");
        assert!(matches!(
            load_serial_settings(f.path(), SettingsPlatform::Default),
            Err(SettingsError::NotAnObject { .. })
        ));

        let f = write_settings(r#"{"idf.port": ["COM1"], "idf.flashBaudRate": "115200"}"#);
        assert!(matches!(
            load_serial_settings(f.path(), SettingsPlatform::Default),
            Err(SettingsError::InvalidValue { .. })
        ));
    }
}
