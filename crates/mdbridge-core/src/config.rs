//! Settings lookup and the formatter options derived from it
//!
//! Settings come from a [`ConfigSource`]. The bundled [`YamlConfig`] reads a
//! flat YAML mapping (by default `.mdbridge.yaml`), with the interpreter path
//! overridable through `MDBRIDGE_PYTHON`.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Explicit interpreter path
pub const KEY_PYTHON_PATH: &str = "python_path";
/// Text wrap mode: "keep", "no", or a positive line width
pub const KEY_WRAP: &str = "wrap";
/// Line ending mode: "keep", "lf", or "crlf"
pub const KEY_END_OF_LINE: &str = "end_of_line";
/// Disable the formatter's output validation
pub const KEY_NO_VALIDATE: &str = "no_validate";
/// Extra arguments appended before the stdin marker
pub const KEY_EXTRA_ARGS: &str = "extra_args";

/// Environment variable overriding `python_path`
pub const PYTHON_ENV: &str = "MDBRIDGE_PYTHON";

/// Settings file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".mdbridge.yaml";

/// Key/value settings store
pub trait ConfigSource: Send + Sync {
    /// Raw value for a key, if set
    fn get(&self, key: &str) -> Option<Value>;

    /// String value for a key, or `default` when missing or not a string
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.get(key) {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => default.to_string(),
            Some(other) => {
                log::warn!("Setting '{}' should be a string, got {:?}", key, other);
                default.to_string()
            }
        }
    }

    /// Boolean value for a key, or `default` when missing or not a bool
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => b,
            Some(Value::Null) | None => default,
            Some(other) => {
                log::warn!("Setting '{}' should be a boolean, got {:?}", key, other);
                default
            }
        }
    }

    /// Sequence of strings for a key, empty when missing or malformed
    fn get_strings(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => serde_yaml::from_value(value).unwrap_or_else(|e| {
                log::warn!("Setting '{}' should be a list of strings: {}", key, e);
                Vec::new()
            }),
        }
    }
}

/// Settings backed by a flat YAML mapping
#[derive(Debug, Clone, Default)]
pub struct YamlConfig {
    values: Mapping,
}

impl YamlConfig {
    /// Create an empty config (every lookup falls back to its default)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content).context("Failed to parse settings")?;
        match value {
            Value::Mapping(values) => Ok(Self { values }),
            Value::Null => Ok(Self::default()),
            _ => anyhow::bail!("Settings must be a YAML mapping"),
        }
    }

    /// Read settings from a YAML file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    /// Load settings from `path`, or from `.mdbridge.yaml` in the current
    /// directory when it exists, then apply the environment override
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    log::debug!("Using settings from {}", default_path.display());
                    Self::from_path(default_path)?
                } else {
                    Self::new()
                }
            }
        };

        Ok(config.with_python_override(std::env::var(PYTHON_ENV).ok()))
    }

    /// Override `python_path` when a non-empty value is given
    pub fn with_python_override(mut self, path: Option<String>) -> Self {
        if let Some(path) = path.filter(|p| !p.trim().is_empty()) {
            self.set(KEY_PYTHON_PATH, path);
        }
        self
    }

    /// Set a single key
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(Value::String(key.to_string()), value.into());
    }
}

impl ConfigSource for YamlConfig {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }
}

/// How the formatter treats paragraph wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Keep,
    No,
    Width(u32),
}

impl WrapMode {
    /// Value passed after `--wrap`
    pub fn as_arg(&self) -> String {
        match self {
            WrapMode::Keep => "keep".to_string(),
            WrapMode::No => "no".to_string(),
            WrapMode::Width(width) => width.to_string(),
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n
                .as_u64()
                .and_then(|w| u32::try_from(w).ok())
                .filter(|w| *w > 0)
                .map(WrapMode::Width),
            _ => None,
        }
    }
}

impl FromStr for WrapMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(WrapMode::Keep),
            "no" => Ok(WrapMode::No),
            other => match other.parse::<u32>() {
                Ok(width) if width > 0 => Ok(WrapMode::Width(width)),
                _ => Err(format!(
                    "invalid wrap mode '{}' (expected keep, no, or a positive integer)",
                    s
                )),
            },
        }
    }
}

impl fmt::Display for WrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_arg())
    }
}

/// Line endings written by the formatter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndOfLine {
    Keep,
    #[default]
    Lf,
    Crlf,
}

impl EndOfLine {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndOfLine::Keep => "keep",
            EndOfLine::Lf => "lf",
            EndOfLine::Crlf => "crlf",
        }
    }
}

impl FromStr for EndOfLine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep" => Ok(EndOfLine::Keep),
            "lf" => Ok(EndOfLine::Lf),
            "crlf" => Ok(EndOfLine::Crlf),
            _ => Err(format!(
                "invalid end of line '{}' (expected keep, lf, or crlf)",
                s
            )),
        }
    }
}

impl fmt::Display for EndOfLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied options turned into formatter flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// `--wrap`, omitted when unset
    pub wrap: Option<WrapMode>,
    /// `--end-of-line`, always passed
    pub end_of_line: EndOfLine,
    /// `--no-validate` is passed when false
    pub validate: bool,
    /// Pass-through arguments, in order
    pub extra_args: Vec<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            wrap: None,
            end_of_line: EndOfLine::default(),
            validate: true,
            extra_args: Vec::new(),
        }
    }
}

impl FormatOptions {
    /// Read options from settings, falling back to defaults on bad values
    pub fn from_config(config: &dyn ConfigSource) -> Self {
        let wrap = config.get(KEY_WRAP).and_then(|value| {
            if value.is_null() {
                return None;
            }
            let parsed = WrapMode::from_value(&value);
            if parsed.is_none() {
                log::warn!("Ignoring invalid '{}' setting: {:?}", KEY_WRAP, value);
            }
            parsed
        });

        let end_of_line = match config.get(KEY_END_OF_LINE) {
            Some(Value::Null) | None => EndOfLine::default(),
            Some(value) => serde_yaml::from_value(value.clone()).unwrap_or_else(|_| {
                log::warn!("Ignoring invalid '{}' setting: {:?}", KEY_END_OF_LINE, value);
                EndOfLine::default()
            }),
        };

        Self {
            wrap,
            end_of_line,
            validate: !config.get_bool(KEY_NO_VALIDATE, false),
            extra_args: config.get_strings(KEY_EXTRA_ARGS),
        }
    }
}
