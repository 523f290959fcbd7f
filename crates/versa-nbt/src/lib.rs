pub mod nbt;
pub mod encoding;

pub use nbt::*;
pub use encoding::*;
