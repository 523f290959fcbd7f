pub mod types;
pub mod block;
pub mod item;

pub use types::*;
pub use block::*;
pub use item::*;
