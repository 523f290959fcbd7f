use versa_nbt::NbtValue;

/// An item's numeric identity on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ItemType {
    pub network_id: i32,
    pub metadata_value: u32,
}

impl ItemType {
    pub fn new(network_id: i32, metadata_value: u32) -> Self {
        Self {
            network_id,
            metadata_value,
        }
    }
}

/// An item stack in an inventory slot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemStack {
    pub item_type: ItemType,
    /// Runtime ID of the block this item places, 0 if it places none.
    pub block_runtime_id: i32,
    pub count: u16,
    pub nbt_data: Option<NbtValue>,
    pub can_be_placed_on: Vec<String>,
    pub can_break: Vec<String>,
    pub has_network_id: bool,
}

impl ItemStack {
    pub fn new(network_id: i32, metadata_value: u32, count: u16) -> Self {
        Self {
            item_type: ItemType::new(network_id, metadata_value),
            count,
            ..Default::default()
        }
    }
}

/// An item stack paired with the server-assigned stack network ID.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemInstance {
    pub stack_network_id: i32,
    pub stack: ItemStack,
}

/// How a recipe ingredient names the items it accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDescriptor {
    Invalid,
    Default { network_id: i16, metadata_value: i16 },
    MoLang { expression: String, version: u8 },
    ItemTag { tag: String },
    Deferred { name: String, metadata_value: i16 },
    ComplexAlias { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDescriptorCount {
    pub descriptor: ItemDescriptor,
    pub count: i32,
}

/// An item table entry from the start-game packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemEntry {
    pub name: String,
    pub runtime_id: i16,
    pub component_based: bool,
}

/// Component data for a data-driven item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemComponentEntry {
    pub name: String,
    pub data: NbtValue,
}
