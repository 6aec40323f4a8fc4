mod model;
mod omexml;
mod pixel;
mod support;

pub use model::{MetadataRetrieve, MetadataStore, SeriesGeometry, SeriesTable};
pub use omexml::OmeXmlMetadata;
pub use pixel::{ByteOrder, Compression, PixelType};
pub use support::{MetadataParser, OmeSupport, OmeXmlParser};
