use crate::errors::{FileOperation, IoError};
use std::{fs, path::Path};

/// The template tree shipped inside the binary, as `(relative path, contents)` pairs.
pub const TEMPLATES: &[(&str, &str)] = &[
    (
        "README.template.md.tera",
        include_str!("../templates/README.template.md.tera"),
    ),
    (
        "middleware.app.ts.tera",
        include_str!("../templates/middleware.app.ts.tera"),
    ),
    (
        "middleware.pages.ts.tera",
        include_str!("../templates/middleware.pages.ts.tera"),
    ),
    (
        "components/ConvexClientProvider.tsx",
        include_str!("../templates/components/ConvexClientProvider.tsx"),
    ),
    (
        "convex/auth.config.ts",
        include_str!("../templates/convex/auth.config.ts"),
    ),
    ("convex/schema.ts", include_str!("../templates/convex/schema.ts")),
    ("convex/users.ts", include_str!("../templates/convex/users.ts")),
    ("webhooks/verify.ts", include_str!("../templates/webhooks/verify.ts")),
    (
        "webhooks/raw-body.ts",
        include_str!("../templates/webhooks/raw-body.ts"),
    ),
    (
        "webhooks/app/clerk.ts.tera",
        include_str!("../templates/webhooks/app/clerk.ts.tera"),
    ),
    (
        "webhooks/pages/clerk.ts.tera",
        include_str!("../templates/webhooks/pages/clerk.ts.tera"),
    ),
];

/// Writes [`TEMPLATES`] under `root` so the copier can walk them like any other tree.
///
/// # Errors
///
/// Returns an [`IoError`] if a directory cannot be created or a file cannot be written.
pub fn extract(root: &Path) -> Result<(), IoError> {
    for (relative, contents) in TEMPLATES {
        let path = root.join(relative);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(IoError::at(FileOperation::Mkdir, parent))?;
        }
        fs::write(&path, contents).map_err(IoError::at(FileOperation::Write, &path))?;
    }

    log::debug!("extracted {} bundled templates to {}", TEMPLATES.len(), root.display());

    Ok(())
}
