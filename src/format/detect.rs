//! Container format detection.
//!
//! An OME-XML pixel container is plain text at the front: an XML declaration
//! followed (somewhere in the header) by the `<OME` root element. Detection
//! probes only the first few hundred bytes; everything past that is the
//! index builder's business.

use crate::error::FormatError;
use crate::io::ByteSource;

// =============================================================================
// Constants
// =============================================================================

/// Bytes probed from the start of the file for detection.
pub const HEADER_PROBE_LEN: usize = 512;

/// Required prefix of the document.
const XML_DECLARATION: &[u8] = b"<?xml";

/// Root-element marker that must appear within the probed header.
const OME_ROOT_MARKER: &[u8] = b"<OME";

// =============================================================================
// Format Detection
// =============================================================================

/// Check whether a header block looks like an OME-XML container.
///
/// This is the whole detection rule: the block starts with `<?xml` and
/// contains `<OME` somewhere within it.
pub fn is_ome_xml(block: &[u8]) -> bool {
    block.starts_with(XML_DECLARATION) && contains_ome_root(block)
}

/// Probe the start of `source` and verify it is an OME-XML container.
///
/// # Returns
/// * `Ok(())` - The header matches
/// * `Err(FormatError::NotOmeXml)` - The header does not match
pub fn detect_format<S: ByteSource + ?Sized>(source: &S) -> Result<(), FormatError> {
    let probe_len = HEADER_PROBE_LEN.min(source.size() as usize);
    if probe_len == 0 {
        return Err(FormatError::NotOmeXml {
            reason: "file is empty".to_string(),
        });
    }

    let header = source.read_exact_at(0, probe_len)?;

    if !header.starts_with(XML_DECLARATION) {
        return Err(FormatError::NotOmeXml {
            reason: "missing <?xml declaration".to_string(),
        });
    }

    if !contains_ome_root(&header) {
        return Err(FormatError::NotOmeXml {
            reason: format!("no <OME root element in the first {probe_len} bytes"),
        });
    }

    Ok(())
}

/// Check if bytes contain the `<OME` root marker.
fn contains_ome_root(data: &[u8]) -> bool {
    // Simple substring search
    data.windows(OME_ROOT_MARKER.len())
        .any(|window| window == OME_ROOT_MARKER)
}

// =============================================================================
// Tests
// =============================================================================
