use crate::project::{self, ApiKeys, PackageManager, Router};
use inquire::{
    validator::Validation, CustomUserError, InquireError, Password, PasswordDisplayMode, Select,
    Text,
};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("Error occurred trying to prompt user")]
    #[diagnostic(code(stackseed::prompt::inquire))]
    Inquire(#[from] InquireError),

    #[error("no value for '{question}' and no terminal to ask on")]
    #[diagnostic(
        code(stackseed::prompt::missing_answer),
        help("Pass it on the command line when running non-interactively")
    )]
    MissingAnswer { question: &'static str },
}

/// Values already known from flags or the config file.
#[derive(Debug, Default, Clone)]
pub struct Partial {
    pub name: Option<String>,
    pub package_manager: Option<PackageManager>,
    pub router: Option<Router>,
    pub clerk_publishable_key: Option<String>,
    pub clerk_secret_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Answers {
    pub name: String,
    pub package_manager: PackageManager,
    pub router: Router,
    pub keys: ApiKeys,
}

/// Asks for everything `partial` leaves open.
///
/// Without a terminal nothing is asked: the project name is then required, the package manager
/// and router fall back to their defaults and keys stay empty.
pub fn ask_missing(partial: Partial, interactive: bool) -> Result<Answers, PromptError> {
    let name = match partial.name {
        Some(name) => name,
        None if interactive => ask_project_name()?,
        None => {
            return Err(PromptError::MissingAnswer {
                question: "project name",
            })
        }
    };

    let package_manager = match partial.package_manager {
        Some(pm) => pm,
        None if interactive => Select::new("Package manager:", PackageManager::ALL.to_vec())
            .with_help_message("Used to run the installers and add dependencies")
            .prompt()?,
        None => PackageManager::default(),
    };

    let router = match partial.router {
        Some(router) => router,
        None if interactive => Select::new("Router:", Router::ALL.to_vec())
            .with_help_message("'app' for the App Router, 'pages' for the Pages Router")
            .prompt()?,
        None => Router::default(),
    };

    let clerk_publishable_key = match partial.clerk_publishable_key {
        Some(key) => Some(key),
        None if interactive => non_empty(
            Text::new("Clerk publishable key:")
                .with_help_message("pk_test_... from the Clerk dashboard, leave empty to fill in later")
                .prompt()?,
        ),
        None => None,
    };

    let clerk_secret_key = match partial.clerk_secret_key {
        Some(key) => Some(key),
        None if interactive => non_empty(
            Password::new("Clerk secret key:")
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .with_help_message("sk_test_..., leave empty to fill in later")
                .prompt()?,
        ),
        None => None,
    };

    Ok(Answers {
        name,
        package_manager,
        router,
        keys: ApiKeys {
            clerk_publishable_key,
            clerk_secret_key,
        },
    })
}

fn ask_project_name() -> Result<String, PromptError> {
    let name = Text::new("Project name:")
        .with_default("my-app")
        .with_validator(validate_project_name)
        .prompt()?;

    Ok(name)
}

fn validate_project_name(input: &str) -> Result<Validation, CustomUserError> {
    match project::validate_name(input) {
        Ok(()) => Ok(Validation::Valid),
        Err(error) => Ok(Validation::Invalid(error.to_string().into())),
    }
}

fn non_empty(answer: String) -> Option<String> {
    let trimmed = answer.trim();

    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_requires_a_name() {
        let result = ask_missing(Partial::default(), false);

        assert!(matches!(
            result,
            Err(PromptError::MissingAnswer {
                question: "project name"
            })
        ));
    }

    #[test]
    fn non_interactive_falls_back_to_defaults() {
        let partial = Partial {
            name: Some("my-app".to_string()),
            clerk_secret_key: Some("sk_test_123".to_string()),
            ..Partial::default()
        };

        let answers = ask_missing(partial, false).unwrap();

        assert_eq!(answers.name, "my-app");
        assert_eq!(answers.package_manager, PackageManager::Npm);
        assert_eq!(answers.router, Router::App);
        assert_eq!(answers.keys.clerk_publishable_key, None);
        assert_eq!(answers.keys.clerk_secret_key.as_deref(), Some("sk_test_123"));
    }

    #[test]
    fn blank_answers_become_none() {
        assert_eq!(non_empty("   ".to_string()), None);
        assert_eq!(non_empty(" pk_test ".to_string()), Some("pk_test".to_string()));
    }
}
