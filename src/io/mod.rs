mod file;
mod memory;
mod source;

pub use file::FileSource;
pub use memory::MemorySource;
pub use source::{
    read_f32_be, read_f32_le, read_u16_be, read_u16_le, read_u32_be, read_u32_le, ByteSource,
};
