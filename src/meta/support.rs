//! Metadata-parser capability detection and injection.

use std::fmt;
use std::sync::Arc;

use crate::error::FormatError;
use crate::io::ByteSource;

use super::{MetadataRetrieve, OmeXmlMetadata};

/// Parser that turns a raw document into a metadata accessor.
///
/// The reader asks its [`OmeSupport`] handle for a parser at open time;
/// implementations that wrap a full XML object model can be injected in
/// place of the built-in scraper.
pub trait MetadataParser: Send + Sync {
    /// Build a metadata accessor for the document behind `source`.
    fn parse_source(&self, source: &dyn ByteSource) -> Result<Box<dyn MetadataRetrieve>, FormatError>;
}

/// The built-in parser: the `<Pixels>` attribute scraper.
#[derive(Debug, Clone, Copy, Default)]
pub struct OmeXmlParser;

impl MetadataParser for OmeXmlParser {
    fn parse_source(&self, source: &dyn ByteSource) -> Result<Box<dyn MetadataRetrieve>, FormatError> {
        Ok(Box::new(OmeXmlMetadata::scan(source)?))
    }
}

/// Handle describing whether OME-XML metadata support is available, and if
/// so, which parser provides it.
///
/// Opening a file requires a parser; a handle built with
/// [`OmeSupport::unavailable`] makes every open fail with
/// [`FormatError::MissingOmeSupport`]. This models deployments where the
/// metadata machinery is an optional component, and keeps that failure path
/// testable instead of depending on process-wide state.
#[derive(Clone)]
pub struct OmeSupport {
    parser: Option<Arc<dyn MetadataParser>>,
}

impl OmeSupport {
    /// Detect support. The built-in scraper is always compiled in, so this
    /// returns an available handle wrapping it.
    pub fn detect() -> Self {
        Self {
            parser: Some(Arc::new(OmeXmlParser)),
        }
    }

    /// Use a caller-supplied parser.
    pub fn with_parser(parser: Arc<dyn MetadataParser>) -> Self {
        Self {
            parser: Some(parser),
        }
    }

    /// A handle with no parser; opens will fail with `MissingOmeSupport`.
    pub fn unavailable() -> Self {
        Self { parser: None }
    }

    /// Whether a parser is present.
    pub fn is_available(&self) -> bool {
        self.parser.is_some()
    }

    /// Get the parser, or the error an open should surface.
    pub fn parser(&self) -> Result<&dyn MetadataParser, FormatError> {
        self.parser
            .as_deref()
            .ok_or(FormatError::MissingOmeSupport)
    }
}

impl Default for OmeSupport {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Debug for OmeSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmeSupport")
            .field("available", &self.is_available())
            .finish()
    }
}
