//! Markdown documentation artifact with one managed section.
//!
//! The section starts at the configured header line and ends at
//! [`SECTION_END_MARKER`]. Everything outside it is preserved byte for byte.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::domain::errors::DocumentationError;
use crate::domain::ports::DocumentationSink;

pub const SECTION_END_MARKER: &str = "<!-- lintloop:end -->";

pub struct MarkdownSectionWriter {
    path: PathBuf,
    header: String,
}

impl MarkdownSectionWriter {
    pub fn new(path: impl Into<PathBuf>, header: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            header: header.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render_section(&self, body: &str) -> String {
        format!(
            "{}\n\n{}\n\n{SECTION_END_MARKER}\n",
            self.header,
            body.trim_end()
        )
    }

    /// Replace the managed section in `document`, or append it.
    pub fn splice(&self, document: &str, body: &str) -> String {
        let section = self.render_section(body);
        let Some(start) = find_header(document, &self.header) else {
            let mut out = document.trim_end().to_string();
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&section);
            return out;
        };

        let after_header = start + self.header.len();
        let end = document[after_header..]
            .find(SECTION_END_MARKER)
            .map(|offset| {
                let marker_end = after_header + offset + SECTION_END_MARKER.len();
                // Swallow the newline after the marker; the section brings its own.
                if document[marker_end..].starts_with('\n') {
                    marker_end + 1
                } else {
                    marker_end
                }
            })
            .unwrap_or(document.len());

        let mut out = String::with_capacity(document.len() + section.len());
        out.push_str(&document[..start]);
        out.push_str(&section);
        out.push_str(&document[end..]);
        out
    }
}

/// Byte offset of `header` when it occupies a whole line.
fn find_header(document: &str, header: &str) -> Option<usize> {
    let mut offset = 0;
    for line in document.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == header {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

#[async_trait]
impl DocumentationSink for MarkdownSectionWriter {
    async fn write_section(&self, body: &str) -> Result<(), DocumentationError> {
        let current = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let updated = self.splice(&current, body);
        if updated == current {
            debug!(path = %self.path.display(), "documentation section unchanged");
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path.with_extension("md.tmp");
        fs::write(&tmp_path, updated.as_bytes()).await?;
        fs::rename(&tmp_path, &self.path).await?;
        debug!(path = %self.path.display(), "documentation section written");
        Ok(())
    }
}
