use crate::errors::{FileOperation, IoError};
use miette::Diagnostic;
use regex::Regex;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PatchError {
    #[error("I/O error within patch domain")]
    #[diagnostic(code(stackseed::patch::io))]
    Io(#[from] IoError),

    #[error("could not find {anchor} in '{path}'")]
    #[diagnostic(
        code(stackseed::patch::anchor_not_found),
        help("The file no longer looks like the one the installer generates; apply the change by hand")
    )]
    AnchorNotFound { path: PathBuf, anchor: &'static str },
}

/// A patch function could not locate the text it anchors on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingAnchor(pub &'static str);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patched {
    Changed(String),
    /// Already contains the boilerplate.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Changed,
    Unchanged,
    /// Target file does not exist.
    Missing,
}

pub const PROVIDER: &str = "ConvexClientProvider";
pub const PROVIDER_IMPORT: &str =
    r#"import { ConvexClientProvider } from "@/components/ConvexClientProvider";"#;
pub const CONVEX_ALIAS: &str = r#""@convex/*": ["./convex/*"]"#;

lazy_static::lazy_static! {
    static ref IMPORT_LINE: Regex =
        Regex::new(r#"(?m)^import\s[^;]*;[ \t]*$"#).expect("a valid regex pattern");
    static ref BODY_CHILDREN: Regex =
        Regex::new(r"(<body[^>]*>\s*)\{children\}").expect("a valid regex pattern");
    static ref PAGE_COMPONENT: Regex =
        Regex::new(r"<Component\s+\{\.\.\.pageProps\}\s*/>").expect("a valid regex pattern");
    static ref TSCONFIG_PATHS: Regex =
        Regex::new(r#"("paths"\s*:\s*\{)(\s*)"#).expect("a valid regex pattern");
}

/// Inserts the provider import after the last top-level import, or at the top of the file.
fn add_provider_import(source: &str) -> String {
    match IMPORT_LINE.find_iter(source).last() {
        Some(last) => format!(
            "{}\n{}{}",
            &source[..last.end()],
            PROVIDER_IMPORT,
            &source[last.end()..]
        ),
        None => format!("{PROVIDER_IMPORT}\n{source}"),
    }
}

/// Wraps `{children}` inside `<body>` of an App Router root layout.
pub fn patch_app_layout(source: &str) -> Result<Patched, MissingAnchor> {
    if source.contains(PROVIDER) {
        return Ok(Patched::Unchanged);
    }
    if !BODY_CHILDREN.is_match(source) {
        return Err(MissingAnchor("`{children}` inside <body>"));
    }

    let wrapped = BODY_CHILDREN.replace(
        source,
        format!("${{1}}<{PROVIDER}>{{children}}</{PROVIDER}>").as_str(),
    );

    Ok(Patched::Changed(add_provider_import(&wrapped)))
}

/// Wraps the page component of a Pages Router `_app`.
pub fn patch_pages_app(source: &str) -> Result<Patched, MissingAnchor> {
    if source.contains(PROVIDER) {
        return Ok(Patched::Unchanged);
    }
    let Some(component) = PAGE_COMPONENT.find(source) else {
        return Err(MissingAnchor("`<Component {...pageProps} />`"));
    };

    let wrapped = format!(
        "{}<{PROVIDER}>{}</{PROVIDER}>{}",
        &source[..component.start()],
        component.as_str(),
        &source[component.end()..]
    );

    Ok(Patched::Changed(add_provider_import(&wrapped)))
}

/// Adds the `@convex/*` path alias to `compilerOptions.paths`.
pub fn patch_tsconfig(source: &str) -> Result<Patched, MissingAnchor> {
    if source.contains(r#""@convex/*""#) {
        return Ok(Patched::Unchanged);
    }
    let Some(captures) = TSCONFIG_PATHS.captures(source) else {
        return Err(MissingAnchor("a \"paths\" object"));
    };

    // reuse the indentation of the first existing entry
    let separator = captures
        .get(2)
        .map(|m| m.as_str())
        .filter(|indent| !indent.is_empty())
        .unwrap_or(" ");
    let whole = captures.get(0).map(|m| m.end()).unwrap_or_default();
    let opening = captures.get(1).map(|m| m.end()).unwrap_or_default();

    let rest = &source[whole..];
    // no trailing comma when the alias is the only entry
    let comma = if rest.starts_with('}') { "" } else { "," };

    let patched = format!(
        "{}{separator}{CONVEX_ALIAS}{comma}{separator}{rest}",
        &source[..opening],
    );

    Ok(Patched::Changed(patched))
}

/// Applies `patch` to the file at `path` in place.
///
/// A missing file is reported as [`PatchOutcome::Missing`] rather than an error.
pub fn patch_file(
    path: &Path,
    patch: fn(&str) -> Result<Patched, MissingAnchor>,
) -> Result<PatchOutcome, PatchError> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(PatchOutcome::Missing),
        Err(error) => Err(IoError::new(FileOperation::Read, path.to_path_buf(), error))?,
    };

    match patch(&source) {
        Ok(Patched::Changed(patched)) => {
            fs::write(path, patched).map_err(IoError::at(FileOperation::Write, path))?;

            Ok(PatchOutcome::Changed)
        }
        Ok(Patched::Unchanged) => Ok(PatchOutcome::Unchanged),
        Err(MissingAnchor(anchor)) => Err(PatchError::AnchorNotFound {
            path: path.to_path_buf(),
            anchor,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_LAYOUT: &str = r#"import type { Metadata } from "next";
import { Geist } from "next/font/google";
import "./globals.css";

export default function RootLayout({
  children,
}: Readonly<{
  children: React.ReactNode;
}>) {
  return (
    <html lang="en">
      <body
        className={`${geistSans.variable} antialiased`}
      >
        {children}
      </body>
    </html>
  );
}
"#;

    const PAGES_APP: &str = r#"import "@/styles/globals.css";
import type { AppProps } from "next/app";

export default function App({ Component, pageProps }: AppProps) {
  return <Component {...pageProps} />;
}
"#;

    const TSCONFIG: &str = r#"{
  "compilerOptions": {
    "strict": true,
    "paths": {
      "@/*": ["./*"]
    }
  }
}
"#;

    fn changed(patched: Result<Patched, MissingAnchor>) -> String {
        match patched {
            Ok(Patched::Changed(text)) => text,
            other => panic!("expected a change, got {other:?}"),
        }
    }

    #[test]
    fn app_layout_wraps_children_and_imports_provider() {
        let patched = changed(patch_app_layout(APP_LAYOUT));

        assert!(patched.contains("<ConvexClientProvider>{children}</ConvexClientProvider>"));
        assert!(patched.contains(&format!("import \"./globals.css\";\n{PROVIDER_IMPORT}\n")));
        // the `children,` prop destructuring is not touched
        assert!(patched.contains("  children,\n"));
    }

    #[test]
    fn app_layout_patch_is_idempotent() {
        let patched = changed(patch_app_layout(APP_LAYOUT));

        assert_eq!(patch_app_layout(&patched), Ok(Patched::Unchanged));
    }

    #[test]
    fn app_layout_without_body_is_rejected() {
        assert!(patch_app_layout("export default function X() { return null; }").is_err());
    }

    #[test]
    fn pages_app_wraps_component() {
        let patched = changed(patch_pages_app(PAGES_APP));

        assert!(patched.contains(
            "return <ConvexClientProvider><Component {...pageProps} /></ConvexClientProvider>;"
        ));
        assert!(patched.contains(PROVIDER_IMPORT));
        assert_eq!(patch_pages_app(&patched), Ok(Patched::Unchanged));
    }

    #[test]
    fn tsconfig_gets_convex_alias() {
        let patched = changed(patch_tsconfig(TSCONFIG));

        assert!(patched.contains(
            "\"paths\": {\n      \"@convex/*\": [\"./convex/*\"],\n      \"@/*\": [\"./*\"]"
        ));
        assert_eq!(patch_tsconfig(&patched), Ok(Patched::Unchanged));
    }

    #[test]
    fn empty_paths_object_gets_no_trailing_comma() {
        let patched = changed(patch_tsconfig("{ \"compilerOptions\": { \"paths\": {} } }"));

        assert_eq!(
            patched,
            "{ \"compilerOptions\": { \"paths\": { \"@convex/*\": [\"./convex/*\"] } } }"
        );
    }

    #[test]
    fn tsconfig_without_paths_is_rejected() {
        assert_eq!(
            patch_tsconfig("{ \"compilerOptions\": {} }"),
            Err(MissingAnchor("a \"paths\" object"))
        );
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();

        let outcome = patch_file(&dir.path().join("tsconfig.json"), patch_tsconfig).unwrap();

        assert_eq!(outcome, PatchOutcome::Missing);
    }

    #[test]
    fn patch_file_writes_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsconfig.json");
        fs::write(&path, TSCONFIG).unwrap();

        assert_eq!(patch_file(&path, patch_tsconfig).unwrap(), PatchOutcome::Changed);
        assert_eq!(patch_file(&path, patch_tsconfig).unwrap(), PatchOutcome::Unchanged);
        assert!(fs::read_to_string(&path).unwrap().contains(CONVEX_ALIAS));
    }
}
