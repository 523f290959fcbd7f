use std::collections::BTreeMap;
use versa_nbt::NbtValue;
use versa_types::{
    BlockEntry, BlockPos, ChunkPos, ItemComponentEntry, ItemDescriptorCount, ItemEntry, ItemInstance,
    ItemStack, ItemType, Vec3,
};

/// `LevelChunk::sub_chunk_count` values telling the client to request sub-chunks itself.
pub const SUB_CHUNK_REQUEST_MODE_LIMITLESS: u32 = u32::MAX;
pub const SUB_CHUNK_REQUEST_MODE_LIMITED: u32 = u32::MAX - 1;

pub const SUB_CHUNK_RESULT_SUCCESS: u8 = 1;

pub const LEVEL_EVENT_PARTICLE_LEGACY_EVENT: i32 = 0x4000;
pub const LEVEL_EVENT_PARTICLES_DESTROY_BLOCK: i32 = 2001;
pub const LEVEL_EVENT_PARTICLES_CRACK_BLOCK: i32 = 2014;
pub const LEVEL_EVENT_PARTICLES_DESTROY_BLOCK_NO_SOUND: i32 = 2021;
/// Legacy particle carrying a block runtime ID.
pub const LEVEL_EVENT_TERRAIN_PARTICLE: i32 = LEVEL_EVENT_PARTICLE_LEGACY_EVENT | 20;
/// Legacy particle carrying an item ID in the high half and metadata in the low nibble.
pub const LEVEL_EVENT_EGG_CRACK_PARTICLE: i32 = LEVEL_EVENT_PARTICLE_LEGACY_EVENT | 14;

pub const SOUND_EVENT_ITEM_USE_ON: u32 = 0;
pub const SOUND_EVENT_HIT: u32 = 1;
pub const SOUND_EVENT_BREAK: u32 = 5;
pub const SOUND_EVENT_PLACE: u32 = 6;
pub const SOUND_EVENT_LAND: u32 = 35;

/// Entity metadata key holding a falling block's runtime ID.
pub const ENTITY_DATA_KEY_VARIANT: u32 = 2;

pub const FALLING_BLOCK_ENTITY: &str = "minecraft:falling_block";

/// Packets carrying block or item identifiers. Everything else travels as `Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    LevelChunk {
        position: ChunkPos,
        dimension: i32,
        /// Number of sub-chunks in `raw_payload`, or one of the request modes.
        sub_chunk_count: u32,
        highest_sub_chunk: u16,
        cache_enabled: bool,
        blob_hashes: Vec<u64>,
        raw_payload: Vec<u8>,
    },
    SubChunk {
        cache_enabled: bool,
        dimension: i32,
        position: BlockPos,
        entries: Vec<SubChunkEntry>,
    },
    ClientCacheMissResponse {
        blobs: Vec<CacheBlob>,
    },
    UpdateSubChunkBlocks {
        position: BlockPos,
        blocks: Vec<BlockChangeEntry>,
        extra: Vec<BlockChangeEntry>,
    },
    UpdateBlock {
        position: BlockPos,
        new_block_runtime_id: u32,
        flags: u32,
        layer: u32,
    },
    UpdateBlockSynced {
        position: BlockPos,
        new_block_runtime_id: u32,
        flags: u32,
        layer: u32,
        entity_unique_id: i64,
        transition_type: u64,
    },
    InventoryTransaction {
        legacy_request_id: i32,
        actions: Vec<InventoryAction>,
        transaction_data: TransactionData,
    },
    LevelEvent {
        event_type: i32,
        position: Vec3,
        event_data: i32,
    },
    LevelSoundEvent {
        sound_type: u32,
        position: Vec3,
        extra_data: i32,
        entity_type: String,
        baby_mob: bool,
        disable_relative_volume: bool,
    },
    AddActor {
        entity_unique_id: i64,
        entity_runtime_id: u64,
        entity_type: String,
        position: Vec3,
        entity_metadata: EntityMetadata,
    },
    SetActorData {
        entity_runtime_id: u64,
        entity_metadata: EntityMetadata,
        tick: u64,
    },
    MobEquipment {
        entity_runtime_id: u64,
        new_item: ItemInstance,
        inventory_slot: u8,
        hotbar_slot: u8,
        window_id: u8,
    },
    MobArmourEquipment {
        entity_runtime_id: u64,
        helmet: ItemInstance,
        chestplate: ItemInstance,
        leggings: ItemInstance,
        boots: ItemInstance,
        body: ItemInstance,
    },
    AddItemActor {
        entity_unique_id: i64,
        entity_runtime_id: u64,
        item: ItemInstance,
        position: Vec3,
    },
    AddPlayer {
        username: String,
        entity_runtime_id: u64,
        position: Vec3,
        held_item: ItemInstance,
    },
    InventorySlot {
        window_id: u32,
        slot: u32,
        new_item: ItemInstance,
    },
    InventoryContent {
        window_id: u32,
        content: Vec<ItemInstance>,
    },
    ItemStackRequest {
        requests: Vec<ItemStackRequestEntry>,
    },
    CraftingData {
        recipes: Vec<Recipe>,
        potion_recipes: Vec<PotionRecipe>,
        potion_container_change_recipes: Vec<PotionContainerChangeRecipe>,
        material_reducers: Vec<MaterialReducer>,
        clear_recipes: bool,
    },
    CraftingEvent {
        window_id: u8,
        crafting_type: i32,
        recipe_uuid: u128,
        input: Vec<ItemInstance>,
        output: Vec<ItemInstance>,
    },
    PlayerAuthInput {
        tick: u64,
        position: Vec3,
        item_interaction_data: Option<UseItemTransactionData>,
        item_stack_request: Option<ItemStackRequestEntry>,
    },
    CreativeContent {
        items: Vec<CreativeItem>,
    },
    StartGame {
        entity_unique_id: i64,
        entity_runtime_id: u64,
        world_name: String,
        base_game_version: String,
        blocks: Vec<BlockEntry>,
        items: Vec<ItemEntry>,
    },
    ItemComponent {
        items: Vec<ItemComponentEntry>,
    },
    Unknown {
        id: u32,
        data: Vec<u8>,
    },
}

impl Packet {
    /// The Bedrock packet ID for this packet.
    pub fn id(&self) -> u32 {
        match self {
            Packet::StartGame { .. } => 11,
            Packet::AddPlayer { .. } => 12,
            Packet::AddActor { .. } => 13,
            Packet::AddItemActor { .. } => 15,
            Packet::UpdateBlock { .. } => 21,
            Packet::LevelEvent { .. } => 25,
            Packet::InventoryTransaction { .. } => 30,
            Packet::MobEquipment { .. } => 31,
            Packet::MobArmourEquipment { .. } => 32,
            Packet::SetActorData { .. } => 39,
            Packet::InventoryContent { .. } => 49,
            Packet::InventorySlot { .. } => 50,
            Packet::CraftingData { .. } => 52,
            Packet::CraftingEvent { .. } => 53,
            Packet::LevelChunk { .. } => 58,
            Packet::UpdateBlockSynced { .. } => 110,
            Packet::LevelSoundEvent { .. } => 123,
            Packet::ClientCacheMissResponse { .. } => 136,
            Packet::PlayerAuthInput { .. } => 144,
            Packet::CreativeContent { .. } => 145,
            Packet::ItemStackRequest { .. } => 147,
            Packet::ItemComponent { .. } => 162,
            Packet::UpdateSubChunkBlocks { .. } => 172,
            Packet::SubChunk { .. } => 174,
            Packet::Unknown { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubChunkEntry {
    pub offset: [i8; 3],
    pub result: u8,
    pub raw_payload: Vec<u8>,
    pub heightmap_type: u8,
    pub heightmap_data: Vec<i8>,
    pub blob_hash: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheBlob {
    pub hash: u64,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BlockChangeEntry {
    pub block_pos: BlockPos,
    pub block_runtime_id: u32,
    pub flags: u32,
    pub synced_update_entity_unique_id: u64,
    pub synced_update_type: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventoryAction {
    pub source_type: u32,
    pub window_id: i32,
    pub source_flags: u32,
    pub inventory_slot: u32,
    pub old_item: ItemInstance,
    pub new_item: ItemInstance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransactionData {
    Normal,
    Mismatch,
    UseItem(UseItemTransactionData),
    UseItemOnEntity(UseItemOnEntityTransactionData),
    ReleaseItem(ReleaseItemTransactionData),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UseItemTransactionData {
    pub legacy_request_id: i32,
    pub actions: Vec<InventoryAction>,
    pub action_type: u32,
    pub block_position: BlockPos,
    pub block_face: i32,
    pub hot_bar_slot: i32,
    pub held_item: ItemInstance,
    pub position: Vec3,
    pub clicked_position: Vec3,
    pub block_runtime_id: u32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UseItemOnEntityTransactionData {
    pub target_entity_runtime_id: u64,
    pub action_type: u32,
    pub hot_bar_slot: i32,
    pub held_item: ItemInstance,
    pub position: Vec3,
    pub clicked_position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReleaseItemTransactionData {
    pub action_type: u32,
    pub hot_bar_slot: i32,
    pub held_item: ItemInstance,
    pub head_position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemStackRequestEntry {
    pub request_id: i32,
    pub actions: Vec<StackRequestAction>,
    pub filter_strings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StackRequestAction {
    CraftResultsDeprecated {
        result_items: Vec<ItemStack>,
        times_crafted: u8,
    },
    /// Any action without item stacks, kept as the adapter decoded it.
    Other { action_type: u8, payload: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recipe {
    Shapeless(ShapelessRecipe),
    Shaped(ShapedRecipe),
    Furnace(FurnaceRecipe),
    FurnaceData(FurnaceRecipe),
    Multi { uuid: u128, recipe_network_id: u32 },
    ShulkerBox(ShapelessRecipe),
    ShapelessChemistry(ShapelessRecipe),
    ShapedChemistry(ShapedRecipe),
    SmithingTransform(SmithingTransformRecipe),
    SmithingTrim(SmithingTrimRecipe),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapelessRecipe {
    pub recipe_id: String,
    pub input: Vec<ItemDescriptorCount>,
    pub output: Vec<ItemStack>,
    pub uuid: u128,
    pub block: String,
    pub priority: i32,
    pub recipe_network_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedRecipe {
    pub recipe_id: String,
    pub width: i32,
    pub height: i32,
    pub input: Vec<ItemDescriptorCount>,
    pub output: Vec<ItemStack>,
    pub uuid: u128,
    pub block: String,
    pub priority: i32,
    pub recipe_network_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FurnaceRecipe {
    pub input_type: ItemType,
    pub output: ItemStack,
    pub block: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmithingTransformRecipe {
    pub recipe_network_id: u32,
    pub recipe_id: String,
    pub template: ItemDescriptorCount,
    pub base: ItemDescriptorCount,
    pub addition: ItemDescriptorCount,
    pub result: ItemStack,
    pub block: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SmithingTrimRecipe {
    pub recipe_network_id: u32,
    pub recipe_id: String,
    pub template: ItemDescriptorCount,
    pub base: ItemDescriptorCount,
    pub addition: ItemDescriptorCount,
    pub block: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PotionRecipe {
    pub input_potion_id: i32,
    pub input_potion_metadata: i32,
    pub reagent_item_id: i32,
    pub reagent_item_metadata: i32,
    pub output_potion_id: i32,
    pub output_potion_metadata: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PotionContainerChangeRecipe {
    pub input_item_id: i32,
    pub reagent_item_id: i32,
    pub output_item_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaterialReducer {
    pub input_item: ItemType,
    pub outputs: Vec<MaterialReducerOutput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialReducerOutput {
    pub network_id: i32,
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreativeItem {
    pub creative_item_network_id: u32,
    pub item: ItemStack,
}

/// Entity metadata keyed by data key.
pub type EntityMetadata = BTreeMap<u32, MetadataValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Float(f32),
    String(String),
    Nbt(NbtValue),
    BlockPos(BlockPos),
    Long(i64),
    Vec3(Vec3),
}
