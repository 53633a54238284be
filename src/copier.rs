use crate::{
    errors::{FileOperation, IoError},
    naming,
    project::Router,
};
use colored::Colorize;
use indexmap::IndexMap;
use miette::Diagnostic;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tera::{Context, Tera};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error, Diagnostic)]
pub enum CopyError {
    #[error("template source is not a directory: '{path}'")]
    #[diagnostic(
        code(stackseed::copy::not_a_directory),
        help("Point --templates at the directory that holds the template tree")
    )]
    NotADirectory { path: PathBuf },

    #[error("I/O error within copy domain")]
    #[diagnostic(code(stackseed::copy::io))]
    Io(#[from] IoError),

    #[error("Error occurred attempting to render template '{path}'")]
    #[diagnostic(code(stackseed::copy::render))]
    Render {
        path: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("file name is not valid unicode: '{path}'")]
    #[diagnostic(code(stackseed::copy::invalid_file_name), help("Rename the file"))]
    InvalidFileName { path: PathBuf },
}

/// Directory whose `app`/`pages` children are alternatives keyed to the active [`Router`].
pub const HANDLERS_DIR: &str = "webhooks";
/// Helper inside [`HANDLERS_DIR`] that only the pages router uses.
pub const RAW_BODY_HELPER: &str = "raw-body.ts";

/// Placeholder name to value, rendered into every template file.
pub type TemplateContext = IndexMap<String, String>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// The directory being copied is the root of the [`HANDLERS_DIR`] subtree.
    pub handlers_root: bool,
    /// Keep only the middleware template tied to the active router. Applies to the directory
    /// passed to [`copy_tree`] only, never to its subdirectories.
    pub exclusive_middleware: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Template,
    Plain,
}
impl EntryKind {
    pub fn classify(file_name: &str, is_dir: bool) -> Self {
        if is_dir {
            Self::Directory
        } else if naming::is_template(file_name) {
            Self::Template
        } else {
            Self::Plain
        }
    }
}

/// What happens to one listed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Recurse(CopyOptions),
    Render { output_name: String },
    CopyIfAbsent,
    Skip,
}

/// Decides the fate of a single entry from its name alone.
pub fn decide(file_name: &str, kind: EntryKind, router: Router, options: CopyOptions) -> Action {
    match kind {
        EntryKind::Directory => {
            if options.handlers_root {
                if let Some(tied) = naming::router_of_dir(file_name) {
                    if tied != router {
                        return Action::Skip;
                    }
                }
            }

            Action::Recurse(CopyOptions {
                handlers_root: file_name == HANDLERS_DIR,
                exclusive_middleware: false,
            })
        }
        EntryKind::Template => {
            if options.exclusive_middleware {
                let tied = match file_name {
                    naming::MIDDLEWARE_APP => Some(Router::App),
                    naming::MIDDLEWARE_PAGES => Some(Router::Pages),
                    _ => None,
                };
                if tied.is_some_and(|tied| tied != router) {
                    return Action::Skip;
                }
            }

            Action::Render {
                output_name: naming::output_name(file_name, router),
            }
        }
        EntryKind::Plain => {
            if options.handlers_root && file_name == RAW_BODY_HELPER && router != Router::Pages {
                return Action::Skip;
            }

            Action::CopyIfAbsent
        }
    }
}

/// Copies the template tree at `source` into `destination`.
///
/// Template files (`*.tera`) are rendered against `context` and always rewritten. Every other
/// file is copied only when nothing exists at its destination yet, so hand edits survive a
/// second run.
///
/// # Errors
///
/// Returns a [`CopyError`] if:
///
/// - `source` is not a directory (checked before anything is written).
/// - A directory cannot be listed or created, or a file cannot be read, copied or written.
/// - Tera fails to render a template.
///
/// Files written before the failure are left in place.
pub fn copy_tree(
    source: &Path,
    destination: &Path,
    context: &TemplateContext,
    router: Router,
    options: CopyOptions,
) -> Result<(), CopyError> {
    let mut copier = Copier {
        tera: Tera::default(),
        context: make_tera_context(context),
        router,
    };

    copier.copy_dir(source, destination, options)
}

fn make_tera_context(context: &TemplateContext) -> Context {
    let mut tera_context = Context::new();
    for (key, value) in context {
        tera_context.insert(key, value);
    }

    tera_context
}

struct Copier {
    tera: Tera,
    context: Context,
    router: Router,
}
impl Copier {
    fn copy_dir(
        &mut self,
        source: &Path,
        destination: &Path,
        options: CopyOptions,
    ) -> Result<(), CopyError> {
        if !source.is_dir() {
            return Err(CopyError::NotADirectory {
                path: source.to_path_buf(),
            });
        }

        create_directory(destination)?;

        let listing = WalkDir::new(source)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in listing {
            let entry = match entry {
                Ok(e) => e,
                Err(error) => {
                    let path = error.path().unwrap_or(source).to_path_buf();

                    Err(IoError::new(FileOperation::List, path, error.into()))?
                }
            };

            let source_path = entry.path();
            let file_name = entry
                .file_name()
                .to_str()
                .ok_or_else(|| CopyError::InvalidFileName {
                    path: source_path.to_path_buf(),
                })?;

            let kind = EntryKind::classify(file_name, entry.file_type().is_dir());

            match decide(file_name, kind, self.router, options) {
                Action::Recurse(child_options) => {
                    log::debug!("entering directory: {}", source_path.display());

                    self.copy_dir(source_path, &destination.join(file_name), child_options)?;
                }
                Action::Render { output_name } => {
                    self.render_file(source_path, &destination.join(output_name))?;
                }
                Action::CopyIfAbsent => {
                    let target = destination.join(file_name);

                    if copy_if_absent(source_path, &target)? {
                        println!("{} {}", "create".green(), target.display());
                    } else {
                        log::debug!("exists, leaving untouched: {}", target.display());
                        println!("{} {}", "skip".yellow(), target.display());
                    }
                }
                Action::Skip => {
                    log::debug!(
                        "not used by the {} router, skipping: {}",
                        self.router,
                        source_path.display()
                    );
                }
            }
        }

        Ok(())
    }

    fn render_file(&mut self, source: &Path, destination: &Path) -> Result<(), CopyError> {
        let template = fs::read_to_string(source).map_err(IoError::at(FileOperation::Read, source))?;

        let rendered = self
            .tera
            .render_str(&template, &self.context)
            .map_err(|error| CopyError::Render {
                path: source.to_path_buf(),
                source: error,
            })?;

        if let Some(parent) = destination.parent() {
            create_directory(parent)?;
        }

        fs::write(destination, rendered).map_err(IoError::at(FileOperation::Write, destination))?;

        println!("{} {}", "render".cyan(), destination.display());

        Ok(())
    }
}

/// Creates all directories in the specified path if they do not exist.
fn create_directory(path: &Path) -> Result<(), CopyError> {
    fs::create_dir_all(path).map_err(IoError::at(FileOperation::Mkdir, path))?;

    Ok(())
}

/// Copies `source` to `destination` unless `destination` already exists.
///
/// Returns `Ok(false)` without touching anything when the destination is taken. The check and
/// the create happen in one `create_new` open, so an existing file is never truncated.
fn copy_if_absent(source: &Path, destination: &Path) -> Result<bool, CopyError> {
    let mut input = fs::File::open(source).map_err(IoError::at(FileOperation::Read, source))?;
    let permissions = input
        .metadata()
        .map_err(IoError::at(FileOperation::Read, source))?
        .permissions();

    if let Some(parent) = destination.parent() {
        create_directory(parent)?;
    }

    let mut output = match fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
    {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(error) => Err(IoError::new(
            FileOperation::Copy,
            destination.to_path_buf(),
            error,
        ))?,
    };

    io::copy(&mut input, &mut output).map_err(IoError::at(FileOperation::Copy, destination))?;

    fs::set_permissions(destination, permissions)
        .map_err(IoError::at(FileOperation::Copy, destination))?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HANDLERS: CopyOptions = CopyOptions {
        handlers_root: true,
        exclusive_middleware: false,
    };
    const EXCLUSIVE: CopyOptions = CopyOptions {
        handlers_root: false,
        exclusive_middleware: true,
    };

    #[test]
    fn classifies_by_suffix() {
        assert_eq!(EntryKind::classify("app", true), EntryKind::Directory);
        assert_eq!(EntryKind::classify("page.tsx.tera", false), EntryKind::Template);
        assert_eq!(EntryKind::classify("page.tsx", false), EntryKind::Plain);
        // directories are never templates, whatever their name
        assert_eq!(EntryKind::classify("odd.tera", true), EntryKind::Directory);
    }

    #[test]
    fn handlers_dir_marks_its_children() {
        let action = decide(HANDLERS_DIR, EntryKind::Directory, Router::App, EXCLUSIVE);

        assert_eq!(
            action,
            Action::Recurse(CopyOptions {
                handlers_root: true,
                exclusive_middleware: false,
            })
        );
    }

    #[test]
    fn exclusive_middleware_stops_at_the_root() {
        assert_eq!(
            decide("docs", EntryKind::Directory, Router::Pages, EXCLUSIVE),
            Action::Recurse(CopyOptions::default())
        );
    }

    #[test]
    fn handlers_root_keeps_only_the_active_router_directory() {
        assert_eq!(
            decide("app", EntryKind::Directory, Router::App, HANDLERS),
            Action::Recurse(CopyOptions::default())
        );
        assert_eq!(
            decide("pages", EntryKind::Directory, Router::App, HANDLERS),
            Action::Skip
        );
        assert_eq!(
            decide("shared", EntryKind::Directory, Router::App, HANDLERS),
            Action::Recurse(CopyOptions::default())
        );
    }

    #[test]
    fn router_directories_outside_handlers_root_are_kept() {
        assert_eq!(
            decide("pages", EntryKind::Directory, Router::App, CopyOptions::default()),
            Action::Recurse(CopyOptions::default())
        );
    }

    #[test]
    fn raw_body_helper_is_pages_only() {
        assert_eq!(
            decide(RAW_BODY_HELPER, EntryKind::Plain, Router::App, HANDLERS),
            Action::Skip
        );
        assert_eq!(
            decide(RAW_BODY_HELPER, EntryKind::Plain, Router::Pages, HANDLERS),
            Action::CopyIfAbsent
        );
        assert_eq!(
            decide(RAW_BODY_HELPER, EntryKind::Plain, Router::App, CopyOptions::default()),
            Action::CopyIfAbsent
        );
    }

    #[test]
    fn exclusive_middleware_filter() {
        assert_eq!(
            decide(naming::MIDDLEWARE_APP, EntryKind::Template, Router::Pages, EXCLUSIVE),
            Action::Skip
        );
        assert_eq!(
            decide(naming::MIDDLEWARE_PAGES, EntryKind::Template, Router::Pages, EXCLUSIVE),
            Action::Render {
                output_name: "middleware.ts".to_string()
            }
        );
        assert_eq!(
            decide(
                naming::MIDDLEWARE_APP,
                EntryKind::Template,
                Router::Pages,
                CopyOptions::default()
            ),
            Action::Render {
                output_name: "middleware.app.ts".to_string()
            }
        );
    }
}
