use async_trait::async_trait;

use crate::domain::errors::DocumentationError;

/// A named section inside a larger document.
///
/// Writing replaces the section body in place, or appends the section when
/// it does not exist yet. Writing the same body twice leaves the document
/// byte-identical.
#[async_trait]
pub trait DocumentationSink: Send + Sync {
    async fn write_section(&self, body: &str) -> Result<(), DocumentationError>;
}
