use miette::Diagnostic;
use serde::Deserialize;
use std::{fmt, path::PathBuf, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("unknown router: '{value}'")]
    #[diagnostic(code(stackseed::project::unknown_router), help("Valid routers are: ['app', 'pages']"))]
    UnknownRouter { value: String },

    #[error("unknown package manager: '{value}'")]
    #[diagnostic(
        code(stackseed::project::unknown_package_manager),
        help("Valid package managers are: ['npm', 'pnpm', 'yarn', 'bun']")
    )]
    UnknownPackageManager { value: String },

    #[error("invalid project name: '{name}' ({reason})")]
    #[diagnostic(
        code(stackseed::project::invalid_name),
        help("Use lowercase letters, digits, '-', '_' or '.', and do not start with '.' or '_'")
    )]
    InvalidName { name: String, reason: &'static str },
}

/// Which request-handling flavour the generated app uses.
///
/// Several template files come in an `app` and a `pages` variant; exactly one of them survives
/// the copy, selected by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Router {
    #[default]
    App,
    Pages,
}
impl Router {
    pub const ALL: [Router; 2] = [Router::App, Router::Pages];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Pages => "pages",
        }
    }
    /// Root layout file that receives the provider boilerplate.
    pub fn layout_file(&self) -> &'static str {
        match self {
            Self::App => "app/layout.tsx",
            Self::Pages => "pages/_app.tsx",
        }
    }
}
impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for Router {
    type Err = ProjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Router::ALL
            .into_iter()
            .find(|router| router.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ProjectError::UnknownRouter {
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
}
impl PackageManager {
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Npm,
        PackageManager::Pnpm,
        PackageManager::Yarn,
        PackageManager::Bun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
        }
    }
    /// Program and leading arguments used to run a package without installing it.
    pub fn executor(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Npm => ("npx", &[]),
            Self::Pnpm => ("pnpm", &["dlx"]),
            Self::Yarn => ("yarn", &["dlx"]),
            Self::Bun => ("bunx", &[]),
        }
    }
    /// Verb used to add dependencies to an existing project.
    pub fn install_verb(&self) -> &'static str {
        match self {
            Self::Npm => "install",
            Self::Pnpm | Self::Yarn | Self::Bun => "add",
        }
    }
    /// Flag understood by `create-next-app` to pick this package manager.
    pub fn create_next_app_flag(&self) -> String {
        format!("--use-{}", self.as_str())
    }
}
impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for PackageManager {
    type Err = ProjectError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PackageManager::ALL
            .into_iter()
            .find(|pm| pm.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ProjectError::UnknownPackageManager {
                value: value.to_string(),
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    pub clerk_publishable_key: Option<String>,
    pub clerk_secret_key: Option<String>,
}
impl ApiKeys {
    /// Environment variables written to `.env.local`, in file order.
    pub fn env_vars(&self) -> [(&'static str, Option<&str>); 2] {
        [
            (
                "NEXT_PUBLIC_CLERK_PUBLISHABLE_KEY",
                self.clerk_publishable_key.as_deref(),
            ),
            ("CLERK_SECRET_KEY", self.clerk_secret_key.as_deref()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct ProjectOptions {
    pub name: String,
    /// Directory the project is created in; its last component is `name`.
    pub directory: PathBuf,
    pub package_manager: PackageManager,
    pub router: Router,
    pub keys: ApiKeys,
    /// Only copy templates, write the env file and patch; do not run any external CLI.
    pub skip_commands: bool,
}

/// Runtime dependencies added after `create-next-app` has run.
pub fn dependencies(router: Router) -> Vec<&'static str> {
    let mut deps = vec!["convex", "@clerk/nextjs", "svix"];

    if router == Router::Pages {
        deps.push("raw-body");
    }

    deps
}

/// Validates a project name against npm package naming rules.
pub fn validate_name(name: &str) -> Result<(), ProjectError> {
    let invalid = |reason| ProjectError::InvalidName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > 214 {
        return Err(invalid("name is longer than 214 characters"));
    }
    if name.starts_with('.') || name.starts_with('_') {
        return Err(invalid("name starts with '.' or '_'"));
    }
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("name contains uppercase letters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
    {
        return Err(invalid("name contains characters that are not URL-safe"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_parses_case_insensitively() {
        assert_eq!("App".parse::<Router>().unwrap(), Router::App);
        assert_eq!(" pages ".parse::<Router>().unwrap(), Router::Pages);
        assert!(matches!(
            "edge".parse::<Router>(),
            Err(ProjectError::UnknownRouter { .. })
        ));
    }

    #[test]
    fn package_manager_executors() {
        assert_eq!(PackageManager::Npm.executor(), ("npx", &[][..]));
        assert_eq!(PackageManager::Pnpm.executor(), ("pnpm", &["dlx"][..]));
        assert_eq!(PackageManager::Bun.executor(), ("bunx", &[][..]));
        assert_eq!(PackageManager::Yarn.install_verb(), "add");
        assert_eq!(PackageManager::Npm.install_verb(), "install");
        assert_eq!(PackageManager::Bun.create_next_app_flag(), "--use-bun");
    }

    #[test]
    fn pages_router_needs_raw_body() {
        assert!(!dependencies(Router::App).contains(&"raw-body"));
        assert!(dependencies(Router::Pages).contains(&"raw-body"));
    }

    #[test]
    fn project_names() {
        assert!(validate_name("my-app").is_ok());
        assert!(validate_name("my.app_2").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("MyApp").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("my app").is_err());
    }
}
