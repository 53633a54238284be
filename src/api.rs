use crate::{
    bundled,
    commands::{self, CommandError},
    config::ConfigError,
    copier::{self, CopyError, CopyOptions, TemplateContext},
    env_file::{EnvFile, ENV_FILE},
    errors::{FileOperation, IoError},
    patch::{self, PatchError, PatchOutcome},
    project::{self, ProjectError, ProjectOptions, Router},
    prompt::PromptError,
};
use colored::Colorize;
use miette::Diagnostic;
use std::{fs, io, path::Path};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum StackseedError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Copy(#[from] CopyError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Io(#[from] IoError),

    #[error("destination already exists and is not empty: '{path}'")]
    #[diagnostic(
        code(stackseed::destination_not_empty),
        help("Pick another project name, or pass --skip-commands to refresh the templates of an existing project")
    )]
    DestinationNotEmpty { path: std::path::PathBuf },
}

/// Copies the template tree at `source` into `destination` with an empty context.
///
/// # Errors
///
/// Returns a [`StackseedError`] if `source` is not a directory or any file cannot be read,
/// rendered or written.
pub fn render_template(
    source: &Path,
    destination: &Path,
    router: Router,
    exclusive_middleware: bool,
) -> Result<(), StackseedError> {
    log::debug!(
        "rendering {} into {} for the {} router",
        source.display(),
        destination.display(),
        router
    );

    copier::copy_tree(
        source,
        destination,
        &TemplateContext::new(),
        router,
        CopyOptions {
            handlers_root: false,
            exclusive_middleware,
        },
    )?;

    Ok(())
}

/// Bootstraps a new project in `options.directory` from the templates in `templates`.
///
/// # Errors
///
/// Returns a [`StackseedError`] if:
///
/// - The project name is invalid or the destination already holds files.
/// - An installer or the backend CLI fails or cannot be started.
/// - The template tree cannot be copied.
/// - The environment file or a patched file cannot be read or written.
pub fn create_project(options: &ProjectOptions, templates: &Path) -> Result<(), StackseedError> {
    project::validate_name(&options.name)?;

    let directory = options.directory.as_path();

    if !options.skip_commands {
        if !is_empty_dir(directory)? {
            return Err(StackseedError::DestinationNotEmpty {
                path: directory.to_path_buf(),
            });
        }

        let parent = match directory.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // `create-next-app` refuses to run into an existing directory, even an empty one
        if directory.exists() {
            fs::remove_dir(directory).map_err(IoError::at(FileOperation::Remove, directory))?;
        }

        log::info!("creating {} with create-next-app", options.name);
        commands::create_next_app(options.package_manager, options.router, &options.name, parent)
            .run()?;

        log::info!("initialising shadcn/ui");
        commands::shadcn_init(options.package_manager, directory).run()?;

        log::info!("adding dependencies");
        commands::add_dependencies(
            options.package_manager,
            directory,
            &project::dependencies(options.router),
        )
        .run()?;
    }

    log::info!("copying templates from {}", templates.display());
    copier::copy_tree(
        templates,
        directory,
        &template_context(options),
        options.router,
        CopyOptions {
            handlers_root: false,
            exclusive_middleware: true,
        },
    )?;

    write_env_file(options, directory)?;

    apply_patch(
        &directory.join(options.router.layout_file()),
        match options.router {
            Router::App => patch::patch_app_layout,
            Router::Pages => patch::patch_pages_app,
        },
    )?;
    apply_patch(&directory.join("tsconfig.json"), patch::patch_tsconfig)?;

    if !options.skip_commands {
        log::info!("provisioning the convex deployment");
        commands::convex_init(options.package_manager, directory).run()?;
    }

    print_next_steps(options);

    Ok(())
}

/// Same as [`create_project`], with the template tree compiled into the binary.
///
/// The tree is extracted to a temporary directory that is removed once the project is done.
///
/// # Errors
///
/// Returns a [`StackseedError`] if the bundled tree cannot be extracted, or for any reason
/// [`create_project`] fails.
pub fn create_project_from_bundle(options: &ProjectOptions) -> Result<(), StackseedError> {
    let scratch = tempfile::Builder::new()
        .prefix("stackseed-templates-")
        .tempdir()
        .map_err(IoError::at(FileOperation::Mkdir, &std::env::temp_dir()))?;

    bundled::extract(scratch.path())?;

    create_project(options, scratch.path())
}

fn template_context(options: &ProjectOptions) -> TemplateContext {
    let mut context = TemplateContext::new();
    context.insert("project_name".to_string(), options.name.clone());
    context.insert("router".to_string(), options.router.to_string());
    context.insert(
        "package_manager".to_string(),
        options.package_manager.to_string(),
    );

    context
}

fn is_empty_dir(path: &Path) -> Result<bool, StackseedError> {
    match fs::read_dir(path) {
        Ok(mut entries) => Ok(entries.next().is_none()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(error) => Err(IoError::new(FileOperation::List, path.to_path_buf(), error))?,
    }
}

/// Adds the API keys to `.env.local`, keeping whatever is already there.
fn write_env_file(options: &ProjectOptions, directory: &Path) -> Result<(), StackseedError> {
    let path = directory.join(ENV_FILE);

    let existing = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(error) if error.kind() == io::ErrorKind::NotFound => String::new(),
        Err(error) => Err(IoError::new(FileOperation::Read, path.clone(), error))?,
    };

    let mut env = EnvFile::parse(&existing);
    let mut changed = false;

    for (key, value) in options.keys.env_vars() {
        if value.is_none() {
            log::warn!("{key} not provided, add it to {ENV_FILE} before running the app");
        }
        changed |= env.set_if_absent(key, value.unwrap_or_default());
    }

    if changed {
        fs::write(&path, env.render()).map_err(IoError::at(FileOperation::Write, &path))?;
        println!("{} {}", "update".green(), path.display());
    }

    Ok(())
}

fn apply_patch(
    path: &Path,
    apply: fn(&str) -> Result<patch::Patched, patch::MissingAnchor>,
) -> Result<(), StackseedError> {
    match patch::patch_file(path, apply)? {
        PatchOutcome::Changed => println!("{} {}", "patch".magenta(), path.display()),
        PatchOutcome::Unchanged => log::debug!("already patched: {}", path.display()),
        PatchOutcome::Missing => log::warn!("{} not found, skipping patch", path.display()),
    }

    Ok(())
}

fn print_next_steps(options: &ProjectOptions) {
    let pm = options.package_manager;

    println!();
    println!("{} {}", "Done.".bold().green(), "Next steps:".bold());
    println!("  cd {}", options.directory.display());
    println!("  {} run dev", pm);
    println!(
        "  {}    # in a second terminal",
        commands::convex_dev(pm, &options.directory)
    );
}
