use crate::{
    errors::{FileFormat, FileOperation, IoError, ParseError},
    project::{PackageManager, Router},
};
use miette::Diagnostic;
use serde::Deserialize;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "stackseed.toml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

/// Defaults that stand in for unanswered questions.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub package_manager: Option<PackageManager>,
    pub router: Option<Router>,
    pub templates: Option<PathBuf>,
}
impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content =
            fs::read_to_string(path).map_err(IoError::at(FileOperation::Read, path))?;

        let parsed: Config =
            toml::from_str(&content).map_err(ParseError::at(FileFormat::Toml, path))?;

        Ok(parsed)
    }

    /// Loads `explicit` if given (it must exist), otherwise [`DEFAULT_CONFIG_FILE`] from `cwd`
    /// if present, otherwise empty defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let fallback = cwd.join(DEFAULT_CONFIG_FILE);
        match Self::from_file(&fallback) {
            Err(ConfigError::Io(IoError { source, .. }))
                if source.kind() == io::ErrorKind::NotFound =>
            {
                log::debug!("no {} in {}", DEFAULT_CONFIG_FILE, cwd.display());

                Ok(Self::default())
            }
            other => other,
        }
    }
}
