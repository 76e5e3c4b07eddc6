use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {0}: {1}")]
    ReadFailed(path::PathBuf, #[source] std::io::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(path::PathBuf, #[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("neither XDG_CONFIG_HOME nor HOME is set")]
    ConfigPathUnavailable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub history: History,
    pub transport: Transport,
    #[serde(default)]
    pub dispatch: Dispatch,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct History {
    pub directory: path::PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Transport {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Dispatch {
    /// Answer failed requests with an error response instead of dropping them
    #[serde(default)]
    pub error_responses: bool,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/navremote/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("navremote/config.toml"))
}

/// $XDG_DATA_HOME/navremote/history or $HOME/.local/share/...
fn default_history_directory() -> path::PathBuf {
    let data_home = env::var("XDG_DATA_HOME")
        .map(path::PathBuf::from)
        .ok()
        .or_else(|| env::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| path::PathBuf::from("."));

    data_home.join("navremote/history")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history: History { directory: default_history_directory() },
            transport: Transport { bind: "0.0.0.0".into(), port: 7420 },
            dispatch: Dispatch::default(),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "History")?;
        write_1(f, "Directory", &self.history.directory.display())?;
        write_title_1(f, "Transport")?;
        write_1(f, "Bind Address", &self.transport.bind)?;
        write_1(f, "Port", &self.transport.port)?;
        write_title_1(f, "Dispatch")?;
        write_1(f, "Error Responses", &self.dispatch.error_responses)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/navremote/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|err| Error::ReadFailed(config_path.clone(), err))?;
            Ok(toml::from_str(raw_string.as_str())?)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::WriteFailed(parent.to_path_buf(), err))?;
        }

        fs::write(path, config_str).map_err(|err| Error::WriteFailed(path.to_path_buf(), err))
    }

    /// Socket address the transport listens on
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.transport.bind, self.transport.port)
    }
}
