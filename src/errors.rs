use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The file-system operation that was in flight when an [`IoError`] occurred.
#[derive(Debug, Error, Diagnostic)]
pub enum FileOperation {
    #[error("reading a file")]
    Read,
    #[error("writing a file")]
    Write,
    #[error("copying a file")]
    Copy,
    #[error("creating a directory")]
    Mkdir,
    #[error("listing a directory")]
    List,
    #[error("removing a directory")]
    Remove,
}

#[derive(Debug, Error, Diagnostic)]
#[error("I/O error: {operation} on path '{path}'")]
#[diagnostic(
    code(stackseed::io),
    help("Check file permissions, disk space, or that the path is correct.")
)]
pub struct IoError {
    pub operation: FileOperation,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
impl IoError {
    pub fn new(operation: FileOperation, path: PathBuf, error: std::io::Error) -> Self {
        Self {
            operation,
            path,
            source: error,
        }
    }
    /// Returns a closure for `map_err` that tags an [`std::io::Error`] with `operation` and `path`.
    ///
    /// ```ignore
    /// fs::read_to_string(path).map_err(IoError::at(FileOperation::Read, path))?;
    /// ```
    pub fn at(operation: FileOperation, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();

        move |error| Self::new(operation, path, error)
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum FileFormat {
    #[error("toml")]
    Toml,
}
#[derive(Debug, Error, Diagnostic)]
#[error("Parsing error: {file_format} on '{path}'")]
#[diagnostic(code(stackseed::parse), help("Review the file for syntax errors or unknown values"))]
pub struct ParseError {
    pub file_format: FileFormat,
    pub path: PathBuf,
    #[source]
    pub source: toml::de::Error,
}
impl ParseError {
    pub fn new(file_format: FileFormat, path: PathBuf, error: toml::de::Error) -> Self {
        Self {
            file_format,
            path,
            source: error,
        }
    }
    /// The [`IoError::at`] counterpart for parse failures.
    pub fn at(file_format: FileFormat, path: &Path) -> impl FnOnce(toml::de::Error) -> Self {
        let path = path.to_path_buf();

        move |error| Self::new(file_format, path, error)
    }
}
