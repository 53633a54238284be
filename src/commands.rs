//! External CLIs run while bootstrapping a project.
//!
//! Every step is built as an [`Invocation`] first so the exact command line can be inspected (and
//! tested) without spawning anything.
use crate::project::{PackageManager, Router};
use colored::Colorize;
use miette::Diagnostic;
use std::{
    fmt,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CommandError {
    #[error("unable to start `{command}`")]
    #[diagnostic(
        code(stackseed::commands::spawn),
        help("Make sure the package manager is installed and on your PATH")
    )]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}")]
    #[diagnostic(
        code(stackseed::commands::failed),
        help("Scroll up for the tool's own output; re-run with --skip-commands once it is fixed")
    )]
    Failed { command: String, status: ExitStatus },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}
impl Invocation {
    fn new(program: &str, cwd: &Path) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }
    /// Starts from the package manager's one-off executor (`npx`, `pnpm dlx`, ...).
    fn exec(package_manager: PackageManager, cwd: &Path) -> Self {
        let (program, leading) = package_manager.executor();

        Self::new(program, cwd).args(leading.iter().copied())
    }
    fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the command with inherited stdio and waits for it.
    ///
    /// # Errors
    ///
    /// Returns a [`CommandError`] if the program cannot be started or exits unsuccessfully.
    pub fn run(&self) -> Result<(), CommandError> {
        println!("{} {}", "run".bright_blue(), self);
        log::debug!("in directory: {}", self.cwd.display());

        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .status()
            .map_err(|error| CommandError::Spawn {
                command: self.to_string(),
                source: error,
            })?;

        if !status.success() {
            return Err(CommandError::Failed {
                command: self.to_string(),
                status,
            });
        }

        Ok(())
    }
}
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }

        Ok(())
    }
}

/// `create-next-app` run from the parent directory of the new project.
pub fn create_next_app(
    package_manager: PackageManager,
    router: Router,
    name: &str,
    parent: &Path,
) -> Invocation {
    let router_flag = match router {
        Router::App => "--app",
        Router::Pages => "--no-app",
    };

    Invocation::exec(package_manager, parent)
        .arg("create-next-app@latest")
        .arg(name)
        .args([
            "--ts",
            "--tailwind",
            "--eslint",
            "--no-src-dir",
            "--import-alias",
            "@/*",
        ])
        .arg(router_flag)
        .arg(package_manager.create_next_app_flag())
}

/// `shadcn init` with default answers.
pub fn shadcn_init(package_manager: PackageManager, project: &Path) -> Invocation {
    Invocation::exec(package_manager, project).args(["shadcn@latest", "init", "-d"])
}

pub fn add_dependencies(
    package_manager: PackageManager,
    project: &Path,
    dependencies: &[&str],
) -> Invocation {
    Invocation::new(package_manager.as_str(), project)
        .arg(package_manager.install_verb())
        .args(dependencies.iter().copied())
}

/// Long-running backend dev server that syncs functions on change.
pub fn convex_dev(package_manager: PackageManager, project: &Path) -> Invocation {
    Invocation::exec(package_manager, project).args(["convex", "dev"])
}

/// Provisions a backend deployment and writes its URL into `.env.local`.
pub fn convex_init(package_manager: PackageManager, project: &Path) -> Invocation {
    convex_dev(package_manager, project).arg("--once")
}
