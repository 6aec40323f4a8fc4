use thiserror::Error;

/// I/O errors that can occur when reading from the underlying byte source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from the local filesystem
    #[error("File error: {0}")]
    File(String),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),
}

/// Errors related to container detection and index construction
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// File does not look like an OME-XML container
    #[error("Not an OME-XML file: {reason}")]
    NotOmeXml { reason: String },

    /// No metadata parser was supplied for the OME-XML document
    #[error("OME-XML metadata support is not available: no metadata parser was supplied")]
    MissingOmeSupport,

    /// Scan finished without locating the marker it needs
    #[error("Pixel data not found: no {marker} marker before end of file")]
    PixelDataNotFound { marker: &'static str },

    /// Metadata accessor has no value for a field the index needs
    #[error("Missing metadata: no {field} for series {series}")]
    MissingMetadata {
        field: &'static str,
        series: usize,
    },
}

/// Errors that can occur when decoding planes or extracting regions
#[derive(Debug, Clone, Error)]
pub enum ReadError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Series index out of range
    #[error("Series index {series} out of range: file has {count} series")]
    InvalidSeries { series: usize, count: usize },

    /// Plane index out of range for the series
    #[error("Plane index {plane} out of range: series {series} has {count} planes")]
    InvalidPlane {
        series: usize,
        plane: usize,
        count: usize,
    },

    /// Caller-supplied buffer cannot hold the requested region
    #[error("Buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    /// Requested region extends past the plane bounds
    #[error("Region {width}x{height}+{x}+{y} exceeds plane bounds {plane_width}x{plane_height}")]
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        plane_width: u32,
        plane_height: u32,
    },

    /// Pixel block has no recognizable inline payload
    #[error("Malformed pixel block at offset {offset}: no inline payload delimiter")]
    MalformedBlock { offset: u64 },

    /// Payload is not valid base64
    #[error("Invalid base64 payload at offset {offset}: {message}")]
    Base64 { offset: u64, message: String },

    /// Compressed payload could not be inflated
    #[error("Error uncompressing pixel data: {message}")]
    Decompression { message: String },

    /// Decoded payload does not match the declared plane size
    #[error("Decoded plane size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Errors that can occur when rendering a decoded region to an image
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    /// Input buffer does not match the stated geometry
    #[error("Invalid region data: {message}")]
    InvalidInput { message: String },

    /// PNG encoder failure
    #[error("PNG encode error: {message}")]
    Encode { message: String },
}
