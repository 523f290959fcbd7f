pub mod error;
pub mod palette;
pub mod paletted_storage;
pub mod sub_chunk;
pub mod chunk;
pub mod encoding;
pub mod encode;
pub mod decode;
pub mod pool;

pub use error::*;
pub use palette::*;
pub use paletted_storage::*;
pub use sub_chunk::*;
pub use chunk::*;
pub use encoding::*;
pub use encode::*;
pub use decode::*;
pub use pool::*;
