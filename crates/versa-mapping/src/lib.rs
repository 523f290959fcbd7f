pub mod error;
pub mod state_hash;
pub mod block_state;
pub mod upgrade;
pub mod block;
pub mod custom_blocks;
pub mod item;
pub mod item_schema;
pub mod crosswalk;

pub use error::*;
pub use state_hash::*;
pub use block_state::*;
pub use upgrade::*;
pub use block::*;
pub use custom_blocks::*;
pub use item::*;
pub use item_schema::*;
pub use crosswalk::*;

use std::sync::Arc;

/// The block and item registries of one protocol version.
#[derive(Clone)]
pub struct Mappings {
    pub blocks: Arc<BlockRegistry>,
    pub items: Arc<ItemRegistry>,
}

impl Mappings {
    pub fn new(blocks: Arc<BlockRegistry>, items: Arc<ItemRegistry>) -> Self {
        Self { blocks, items }
    }
}
