//! Merges generated HTML into the email layout.

use std::path::PathBuf;

const INDENT: &str = "                            ";
const START_MARKER: &str = "<!-- AI Code goes here Start -->";
const END_MARKER: &str = "<!-- AI Code goes here End-->";

#[derive(Debug, Clone)]
pub struct EmailWrapper {
    path: PathBuf,
}

impl EmailWrapper {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Insert `content` between the layout markers. The layout is read on
    /// every call. Without a readable layout the content comes back bare.
    pub async fn wrap(&self, content: &str) -> String {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(layout) => merge(&layout, content),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Template wrapper not found, returning AI content without wrapper"
                );
                content.to_string()
            }
        }
    }
}

/// Replace every empty marker pair in `layout` with one holding `content`.
/// Line endings are normalized to `\n` first.
pub fn merge(layout: &str, content: &str) -> String {
    let mut normalized = String::with_capacity(layout.len());
    for line in layout.lines() {
        normalized.push_str(line);
        normalized.push('\n');
    }

    let placeholder = format!("{INDENT}{START_MARKER}\n{INDENT}{END_MARKER}");
    if !normalized.contains(&placeholder) {
        tracing::warn!("Wrapper placeholder not found; returning layout unchanged");
        return normalized;
    }

    let replacement = format!("{INDENT}{START_MARKER}\n{INDENT}{content}\n{INDENT}{END_MARKER}");
    normalized.replace(&placeholder, &replacement)
}
