//! Bootstraps a Next.js + shadcn/ui + Convex application.
//!
//! The interesting part is [`copier`], which copies a bundled template tree into the new project:
//! `*.tera` files are rendered and always refreshed, everything else is copied once and never
//! overwritten. The remaining modules drive the external installers and patch the files they
//! generate.
pub mod api;
pub mod bundled;
pub mod commands;
pub mod config;
pub mod copier;
pub mod env_file;
pub mod errors;
pub mod naming;
pub mod patch;
pub mod project;
pub mod prompt;

pub use api::{create_project, create_project_from_bundle, render_template, StackseedError};
pub use copier::{copy_tree, CopyError, CopyOptions, TemplateContext};
pub use project::{PackageManager, Router};
