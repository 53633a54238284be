//! Output file names for the template tree copier.
//!
//! Names are computed from an ordered rule table; the first rule that matches a file name wins.
//! Only the file name takes part, never its position in the tree.
use crate::project::Router;

/// Suffix that marks a file as a tera template.
pub const TEMPLATE_SUFFIX: &str = ".tera";
/// Qualifier that is dropped from output names (`README.template.md.tera` -> `README.md`).
pub const ELIDED_QUALIFIER: &str = "template";

pub const MIDDLEWARE_APP: &str = "middleware.app.ts.tera";
pub const MIDDLEWARE_PAGES: &str = "middleware.pages.ts.tera";
pub const MIDDLEWARE_OUTPUT: &str = "middleware.ts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Exact file name, only while `router` is active.
    Exact {
        file_name: &'static str,
        router: Router,
    },
    Any,
}
impl Matcher {
    fn matches(&self, file_name: &str, active: Router) -> bool {
        match self {
            Self::Exact { file_name: name, router } => *name == file_name && *router == active,
            Self::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rename {
    /// Replace the whole name.
    To(&'static str),
    /// Drop the template suffix and the elided qualifier.
    StripSuffix,
}
impl Rename {
    fn apply(&self, file_name: &str) -> String {
        match self {
            Self::To(name) => (*name).to_string(),
            Self::StripSuffix => strip_suffix(file_name),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NameRule {
    pub matcher: Matcher,
    pub rename: Rename,
}

pub const RULES: &[NameRule] = &[
    NameRule {
        matcher: Matcher::Exact {
            file_name: MIDDLEWARE_APP,
            router: Router::App,
        },
        rename: Rename::To(MIDDLEWARE_OUTPUT),
    },
    NameRule {
        matcher: Matcher::Exact {
            file_name: MIDDLEWARE_PAGES,
            router: Router::Pages,
        },
        rename: Rename::To(MIDDLEWARE_OUTPUT),
    },
    NameRule {
        matcher: Matcher::Any,
        rename: Rename::StripSuffix,
    },
];

pub fn is_template(file_name: &str) -> bool {
    file_name.len() > TEMPLATE_SUFFIX.len() && file_name.ends_with(TEMPLATE_SUFFIX)
}

/// Destination name for a template file under the active router.
pub fn output_name(file_name: &str, router: Router) -> String {
    RULES
        .iter()
        .find(|rule| rule.matcher.matches(file_name, router))
        .map(|rule| rule.rename.apply(file_name))
        .unwrap_or_else(|| file_name.to_string())
}

fn strip_suffix(file_name: &str) -> String {
    let stem = file_name.strip_suffix(TEMPLATE_SUFFIX).unwrap_or(file_name);

    let mut segments = stem.split('.');
    // leading segment is the base name, even when it equals the qualifier
    let mut kept: Vec<&str> = segments.next().into_iter().collect();
    kept.extend(segments.filter(|segment| *segment != ELIDED_QUALIFIER));

    kept.join(".")
}

/// Router a file or directory name is tied to, if any (`app`, `pages`).
pub fn router_of_dir(dir_name: &str) -> Option<Router> {
    Router::ALL
        .into_iter()
        .find(|router| router.as_str() == dir_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middleware_variants_share_an_output_name() {
        assert_eq!(output_name(MIDDLEWARE_APP, Router::App), "middleware.ts");
        assert_eq!(output_name(MIDDLEWARE_PAGES, Router::Pages), "middleware.ts");
    }

    #[test]
    fn inactive_middleware_variant_keeps_its_qualifier() {
        assert_eq!(output_name(MIDDLEWARE_PAGES, Router::App), "middleware.pages.ts");
        assert_eq!(output_name(MIDDLEWARE_APP, Router::Pages), "middleware.app.ts");
    }

    #[test]
    fn strips_suffix_and_elides_template_qualifier() {
        assert_eq!(output_name("README.template.md.tera", Router::App), "README.md");
        assert_eq!(output_name("next.config.mjs.tera", Router::App), "next.config.mjs");
        assert_eq!(output_name("route.ts.tera", Router::Pages), "route.ts");
        assert_eq!(output_name("template.tsx.tera", Router::App), "template.tsx");
    }

    #[test]
    fn is_template_requires_a_name_before_the_suffix() {
        assert!(is_template("layout.tsx.tera"));
        assert!(!is_template(".tera"));
        assert!(!is_template("layout.tsx"));
    }

    #[test]
    fn router_directories() {
        assert_eq!(router_of_dir("app"), Some(Router::App));
        assert_eq!(router_of_dir("pages"), Some(Router::Pages));
        assert_eq!(router_of_dir("lib"), None);
    }
}
