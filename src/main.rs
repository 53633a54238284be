use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};
use stackseed::{
    api,
    config::Config,
    project::{PackageManager, ProjectOptions, Router},
    prompt::{self, Partial},
};
use std::{io::IsTerminal, path::PathBuf};

fn cli() -> Command {
    Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("new")
                .about("Creates a new project, asking for anything not given as a flag")
                .arg(Arg::new("name").help("Project name, also used as the directory name"))
                .arg(
                    Arg::new("package-manager")
                        .long("package-manager")
                        .short('p')
                        .help("npm, pnpm, yarn or bun")
                        .value_parser(value_parser!(PackageManager)),
                )
                .arg(
                    Arg::new("router")
                        .long("router")
                        .short('r')
                        .help("app or pages")
                        .value_parser(value_parser!(Router)),
                )
                .arg(
                    Arg::new("clerk-publishable-key")
                        .long("clerk-publishable-key")
                        .env("NEXT_PUBLIC_CLERK_PUBLISHABLE_KEY")
                        .hide_env_values(true)
                        .help("Written to .env.local"),
                )
                .arg(
                    Arg::new("clerk-secret-key")
                        .long("clerk-secret-key")
                        .env("CLERK_SECRET_KEY")
                        .hide_env_values(true)
                        .help("Written to .env.local"),
                )
                .arg(
                    Arg::new("templates")
                        .long("templates")
                        .help("Template tree to copy into the project (the bundled one if omitted)")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Defaults file (stackseed.toml in the working directory if omitted)")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("skip-commands")
                        .long("skip-commands")
                        .help("Do not run installers; only copy templates, write .env.local and patch")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Copies a template tree into a destination directory")
                .arg(
                    Arg::new("source")
                        .help("Directory holding the template tree")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("destination")
                        .help("The destination directory, created if missing")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("router")
                        .long("router")
                        .short('r')
                        .help("app or pages")
                        .default_value("app")
                        .value_parser(value_parser!(Router)),
                )
                .arg(
                    Arg::new("exclusive-middleware")
                        .long("exclusive-middleware")
                        .help("Emit only the middleware tied to the router")
                        .action(ArgAction::SetTrue),
                ),
        )
}

// The CLI layer should only parse inputs and forward them to library code.
fn main() -> miette::Result<()> {
    let matches = cli().get_matches();

    init_logger(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("new", args)) => handle_new(args)?,
        Some(("render", args)) => handle_render(args)?,
        _ => unreachable!(),
    }

    Ok(())
}

fn init_logger(is_verbose: bool) {
    let default_level = if is_verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn handle_new(args: &ArgMatches) -> Result<(), stackseed::StackseedError> {
    let cwd = PathBuf::from(".");
    let config = Config::load(args.get_one::<PathBuf>("config").map(PathBuf::as_path), &cwd)?;

    let partial = Partial {
        name: args.get_one::<String>("name").cloned(),
        package_manager: args
            .get_one::<PackageManager>("package-manager")
            .copied()
            .or(config.package_manager),
        router: args.get_one::<Router>("router").copied().or(config.router),
        clerk_publishable_key: args.get_one::<String>("clerk-publishable-key").cloned(),
        clerk_secret_key: args.get_one::<String>("clerk-secret-key").cloned(),
    };

    let answers = prompt::ask_missing(partial, std::io::stdin().is_terminal())?;

    let templates = args.get_one::<PathBuf>("templates").cloned().or(config.templates);

    let options = ProjectOptions {
        directory: PathBuf::from(&answers.name),
        name: answers.name,
        package_manager: answers.package_manager,
        router: answers.router,
        keys: answers.keys,
        skip_commands: args.get_flag("skip-commands"),
    };

    match templates {
        Some(templates) => {
            log::debug!("using templates at {}", templates.display());
            api::create_project(&options, &templates)
        }
        None => api::create_project_from_bundle(&options),
    }
}

fn handle_render(args: &ArgMatches) -> Result<(), stackseed::StackseedError> {
    let source = args.get_one::<PathBuf>("source").expect("source required");
    let destination = args
        .get_one::<PathBuf>("destination")
        .expect("destination required");
    let router = args
        .get_one::<Router>("router")
        .copied()
        .unwrap_or_default();

    api::render_template(
        source,
        destination,
        router,
        args.get_flag("exclusive-middleware"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }
}
