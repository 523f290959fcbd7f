use crate::{components, BlockTranslator, CustomItem, Direction, TranslateError, TranslateResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, trace};
use versa_mapping::{Item, ItemBlockCrosswalk, ItemSchemas, Mappings};
use versa_protocol::{
    ConnectionState, InventoryAction, ItemStackRequestEntry, Packet, Recipe, StackRequestAction,
    TransactionData, LEVEL_EVENT_EGG_CRACK_PARTICLE,
};
use versa_types::{
    ItemComponentEntry, ItemDescriptor, ItemDescriptorCount, ItemEntry, ItemInstance, ItemStack, ItemType,
};

/// Sent in place of items the destination does not know.
pub const PLACEHOLDER_ITEM: &str = "minecraft:info_update";

const AIR_NAME: &str = "minecraft:air";

#[derive(Default)]
struct CustomTables {
    by_runtime_id: BTreeMap<i32, Arc<dyn CustomItem>>,
    /// Latest runtime ID of the replacement to the custom item's legacy runtime ID.
    original_to_custom: HashMap<i32, i32>,
    custom_to_original: HashMap<i32, i32>,
}

impl CustomTables {
    fn redirect(&self, direction: Direction, network_id: i32) -> Option<i32> {
        match direction {
            Direction::Downgrade => self.original_to_custom.get(&network_id).copied(),
            Direction::Upgrade => self.custom_to_original.get(&network_id).copied(),
        }
    }
}

/// Rewrites item identifiers between one version and the latest.
///
/// Names go through the item schemas, so renamed and flattened items keep their identity.
/// Unknown names become [`PLACEHOLDER_ITEM`].
pub struct ItemTranslator {
    mapping: Mappings,
    latest: Mappings,
    schemas: Arc<ItemSchemas>,
    crosswalk: Arc<ItemBlockCrosswalk>,
    blocks: BlockTranslator,
    custom: RwLock<CustomTables>,
}

impl ItemTranslator {
    pub fn new(
        mapping: Mappings,
        latest: Mappings,
        schemas: Arc<ItemSchemas>,
        crosswalk: Arc<ItemBlockCrosswalk>,
    ) -> Self {
        let blocks = BlockTranslator::new(mapping.blocks.clone(), latest.blocks.clone());
        Self {
            mapping,
            latest,
            schemas,
            crosswalk,
            blocks,
            custom: RwLock::new(CustomTables::default()),
        }
    }

    fn sides(&self, direction: Direction) -> (&Mappings, &Mappings) {
        match direction {
            Direction::Downgrade => (&self.latest, &self.mapping),
            Direction::Upgrade => (&self.mapping, &self.latest),
        }
    }

    fn placeholder(destination: &Mappings) -> i32 {
        destination
            .items
            .item_name_to_runtime_id(PLACEHOLDER_ITEM)
            .unwrap_or_else(|| destination.items.air())
    }

    pub fn translate_item_type(&self, direction: Direction, input: ItemType) -> ItemType {
        let (source, destination) = self.sides(direction);
        if input.network_id == source.items.air() || input.network_id == 0 {
            return ItemType::new(destination.items.air(), 0);
        }
        if let Some(network_id) = self.custom.read().redirect(direction, input.network_id) {
            return ItemType::new(network_id, input.metadata_value);
        }

        let Some(name) = source.items.item_runtime_id_to_name(input.network_id) else {
            trace!("No item for network ID {}", input.network_id);
            return ItemType::new(Self::placeholder(destination), input.metadata_value);
        };
        let item = Item::new(name, input.metadata_value, source.items.item_version());
        let target = destination.items.item_version();
        let item = match direction {
            Direction::Downgrade => self.schemas.downgrade(item, target),
            Direction::Upgrade => self.schemas.upgrade(item, target),
        };
        let network_id = destination.items.item_name_to_runtime_id(&item.name).unwrap_or_else(|| {
            trace!("Item {} has no network ID after {:?}", item.name, direction);
            Self::placeholder(destination)
        });
        ItemType::new(network_id, item.metadata)
    }

    pub fn downgrade_item_type(&self, input: ItemType) -> ItemType {
        self.translate_item_type(Direction::Downgrade, input)
    }

    pub fn upgrade_item_type(&self, input: ItemType) -> ItemType {
        self.translate_item_type(Direction::Upgrade, input)
    }

    /// Translate a stack, including the runtime ID of the block it places.
    pub fn translate_item_stack(&self, direction: Direction, input: ItemStack) -> ItemStack {
        let (_, destination) = self.sides(direction);
        let item_type = self.translate_item_type(direction, input.item_type);
        let air = item_type.network_id == destination.items.air();

        let mut block_runtime_id = 0;
        if !air {
            let state = destination
                .items
                .item_runtime_id_to_name(item_type.network_id)
                .and_then(|name| self.crosswalk.block_state_for_item(&name, item_type.metadata_value).cloned());
            block_runtime_id = match state {
                Some(state) => match (destination.blocks.state_to_runtime_id(&state), direction) {
                    (Some(rid), _) => rid as i32,
                    (None, Direction::Downgrade) => destination.blocks.air() as i32,
                    (None, Direction::Upgrade) => 0,
                },
                None if input.block_runtime_id != 0 => {
                    self.blocks.translate_runtime_id(direction, input.block_runtime_id as u32) as i32
                }
                None => 0,
            };
        }

        ItemStack {
            item_type,
            block_runtime_id,
            has_network_id: input.has_network_id && !air,
            ..input
        }
    }

    pub fn downgrade_item_stack(&self, input: ItemStack) -> ItemStack {
        self.translate_item_stack(Direction::Downgrade, input)
    }

    pub fn upgrade_item_stack(&self, input: ItemStack) -> ItemStack {
        self.translate_item_stack(Direction::Upgrade, input)
    }

    pub fn translate_item_instance(&self, direction: Direction, input: ItemInstance) -> ItemInstance {
        ItemInstance {
            stack: self.translate_item_stack(direction, input.stack),
            ..input
        }
    }

    pub fn translate_item_descriptor(&self, direction: Direction, input: ItemDescriptor) -> ItemDescriptor {
        let (source, destination) = self.sides(direction);
        match input {
            ItemDescriptor::Default {
                network_id,
                metadata_value,
            } => {
                let item_type =
                    self.translate_item_type(direction, ItemType::new(network_id as i32, metadata_value as u32));
                ItemDescriptor::Default {
                    network_id: item_type.network_id as i16,
                    metadata_value: item_type.metadata_value as i16,
                }
            }
            ItemDescriptor::Deferred { name, metadata_value } => {
                let Some(rid) = source.items.item_name_to_runtime_id(&name) else {
                    return ItemDescriptor::Deferred {
                        name: AIR_NAME.into(),
                        metadata_value: 0,
                    };
                };
                let item_type = self.translate_item_type(direction, ItemType::new(rid, metadata_value as u32));
                ItemDescriptor::Deferred {
                    name: destination
                        .items
                        .item_runtime_id_to_name(item_type.network_id)
                        .unwrap_or_else(|| AIR_NAME.into()),
                    metadata_value: item_type.metadata_value as i16,
                }
            }
            ItemDescriptor::ComplexAlias { name } => {
                let name = source
                    .items
                    .item_name_to_runtime_id(&name)
                    .map(|rid| self.translate_item_type(direction, ItemType::new(rid, 0)))
                    .and_then(|item_type| destination.items.item_runtime_id_to_name(item_type.network_id))
                    .unwrap_or_else(|| AIR_NAME.into());
                ItemDescriptor::ComplexAlias { name }
            }
            other @ (ItemDescriptor::Invalid | ItemDescriptor::MoLang { .. } | ItemDescriptor::ItemTag { .. }) => {
                other
            }
        }
    }

    pub fn translate_item_descriptor_count(
        &self,
        direction: Direction,
        input: ItemDescriptorCount,
    ) -> ItemDescriptorCount {
        ItemDescriptorCount {
            descriptor: self.translate_item_descriptor(direction, input.descriptor),
            count: input.count,
        }
    }

    /// Stand `item` in for `replacement` on this version. The item gets a new legacy runtime ID,
    /// which is returned. Fails when the replacement is not a latest item or already stands in
    /// for another custom item.
    pub fn register(&self, item: Arc<dyn CustomItem>, replacement: &str) -> TranslateResult<i32> {
        let (name, _) = item.encode_item();
        let original = self
            .latest
            .items
            .item_name_to_runtime_id(replacement)
            .ok_or_else(|| TranslateError::UnknownReplacement(replacement.to_string()))?;

        let mut custom = self.custom.write();
        if custom.original_to_custom.contains_key(&original) {
            return Err(TranslateError::AlreadyMapped(replacement.to_string()));
        }
        let runtime_id = self.mapping.items.register_entry(&name);
        custom.by_runtime_id.insert(runtime_id, item);
        custom.original_to_custom.insert(original, runtime_id);
        custom.custom_to_original.insert(runtime_id, original);

        info!("Registered custom item {} in place of {} (runtime ID {})", name, replacement, runtime_id);
        Ok(runtime_id)
    }

    /// Registered custom items by legacy runtime ID.
    pub fn custom_items(&self) -> Vec<(i32, Arc<dyn CustomItem>)> {
        self.custom
            .read()
            .by_runtime_id
            .iter()
            .map(|(rid, item)| (*rid, item.clone()))
            .collect()
    }

    pub fn downgrade_packets(&self, packets: Vec<Packet>, conn: &ConnectionState) -> Vec<Packet> {
        self.translate_packets(Direction::Downgrade, packets, conn)
    }

    pub fn upgrade_packets(&self, packets: Vec<Packet>, conn: &ConnectionState) -> Vec<Packet> {
        self.translate_packets(Direction::Upgrade, packets, conn)
    }

    fn translate_packets(&self, direction: Direction, packets: Vec<Packet>, _conn: &ConnectionState) -> Vec<Packet> {
        packets
            .into_iter()
            .map(|mut packet| {
                self.translate_packet(direction, &mut packet);
                packet
            })
            .collect()
    }

    fn instance(&self, direction: Direction, item: &mut ItemInstance) {
        *item = self.translate_item_instance(direction, std::mem::take(item));
    }

    fn stack(&self, direction: Direction, stack: &mut ItemStack) {
        *stack = self.translate_item_stack(direction, std::mem::take(stack));
    }

    fn descriptor(&self, direction: Direction, descriptor: &mut ItemDescriptorCount) {
        let descriptor_type = std::mem::replace(&mut descriptor.descriptor, ItemDescriptor::Invalid);
        descriptor.descriptor = self.translate_item_descriptor(direction, descriptor_type);
    }

    fn actions(&self, direction: Direction, actions: &mut [InventoryAction]) {
        for action in actions {
            self.instance(direction, &mut action.old_item);
            self.instance(direction, &mut action.new_item);
        }
    }

    fn stack_request(&self, direction: Direction, request: &mut ItemStackRequestEntry) {
        for action in &mut request.actions {
            if let StackRequestAction::CraftResultsDeprecated { result_items, .. } = action {
                for stack in result_items {
                    self.stack(direction, stack);
                }
            }
        }
    }

    fn translate_packet(&self, direction: Direction, packet: &mut Packet) {
        match packet {
            Packet::MobEquipment { new_item, .. } => self.instance(direction, new_item),
            Packet::MobArmourEquipment {
                helmet,
                chestplate,
                leggings,
                boots,
                body,
                ..
            } => {
                for item in [helmet, chestplate, leggings, boots, body] {
                    self.instance(direction, item);
                }
            }
            Packet::AddItemActor { item, .. } => self.instance(direction, item),
            Packet::AddPlayer { held_item, .. } => self.instance(direction, held_item),
            Packet::InventorySlot { new_item, .. } => self.instance(direction, new_item),
            Packet::InventoryContent { content, .. } => {
                for item in content {
                    self.instance(direction, item);
                }
            }
            Packet::ItemStackRequest { requests } => {
                for request in requests {
                    self.stack_request(direction, request);
                }
            }
            Packet::CraftingData {
                recipes,
                potion_recipes,
                potion_container_change_recipes,
                material_reducers,
                ..
            } => {
                for recipe in recipes {
                    self.recipe(direction, recipe);
                }
                for recipe in potion_recipes {
                    let potion = |id: &mut i32, meta: &mut i32| {
                        let item_type = self.translate_item_type(direction, ItemType::new(*id, *meta as u32));
                        *id = item_type.network_id;
                        *meta = item_type.metadata_value as i32;
                    };
                    potion(&mut recipe.input_potion_id, &mut recipe.input_potion_metadata);
                    potion(&mut recipe.reagent_item_id, &mut recipe.reagent_item_metadata);
                    potion(&mut recipe.output_potion_id, &mut recipe.output_potion_metadata);
                }
                for recipe in potion_container_change_recipes {
                    for id in [
                        &mut recipe.input_item_id,
                        &mut recipe.reagent_item_id,
                        &mut recipe.output_item_id,
                    ] {
                        *id = self.translate_item_type(direction, ItemType::new(*id, 0)).network_id;
                    }
                }
                for reducer in material_reducers {
                    reducer.input_item = self.translate_item_type(direction, reducer.input_item);
                    for output in &mut reducer.outputs {
                        output.network_id = self
                            .translate_item_type(direction, ItemType::new(output.network_id, 0))
                            .network_id;
                    }
                }
            }
            Packet::CraftingEvent { input, output, .. } => {
                for item in input.iter_mut().chain(output.iter_mut()) {
                    self.instance(direction, item);
                }
            }
            Packet::PlayerAuthInput {
                item_interaction_data,
                item_stack_request,
                ..
            } => {
                if let Some(request) = item_stack_request {
                    self.stack_request(direction, request);
                }
                if let Some(data) = item_interaction_data {
                    self.actions(direction, &mut data.actions);
                    self.instance(direction, &mut data.held_item);
                }
            }
            Packet::CreativeContent { items } => {
                for item in items {
                    self.stack(direction, &mut item.item);
                }
            }
            Packet::InventoryTransaction {
                actions,
                transaction_data,
                ..
            } => {
                self.actions(direction, actions);
                match transaction_data {
                    TransactionData::UseItem(data) => {
                        self.instance(direction, &mut data.held_item);
                        self.actions(direction, &mut data.actions);
                    }
                    TransactionData::UseItemOnEntity(data) => self.instance(direction, &mut data.held_item),
                    TransactionData::ReleaseItem(data) => self.instance(direction, &mut data.held_item),
                    TransactionData::Normal | TransactionData::Mismatch => {}
                }
            }
            Packet::LevelEvent {
                event_type,
                event_data,
                ..
            } if *event_type == LEVEL_EVENT_EGG_CRACK_PARTICLE => {
                // Item ID in the high half, metadata in the low nibble.
                let item_type =
                    self.translate_item_type(direction, ItemType::new(*event_data >> 16, (*event_data & 0xf) as u32));
                *event_data = (item_type.network_id << 16) | item_type.metadata_value as i32;
            }
            Packet::StartGame { items, .. } => self.start_game_items(direction, items),
            Packet::ItemComponent { items } => {
                if direction == Direction::Downgrade {
                    for (_, item) in self.custom_items() {
                        let (name, _) = item.encode_item();
                        items.push(ItemComponentEntry {
                            name,
                            data: components(item.as_ref()),
                        });
                    }
                }
            }
            _ => {}
        }
    }

    fn recipe(&self, direction: Direction, recipe: &mut Recipe) {
        match recipe {
            Recipe::Shapeless(recipe)
            | Recipe::ShulkerBox(recipe)
            | Recipe::ShapelessChemistry(recipe) => {
                for input in &mut recipe.input {
                    self.descriptor(direction, input);
                }
                for output in &mut recipe.output {
                    self.stack(direction, output);
                }
            }
            Recipe::Shaped(recipe) | Recipe::ShapedChemistry(recipe) => {
                for input in &mut recipe.input {
                    self.descriptor(direction, input);
                }
                for output in &mut recipe.output {
                    self.stack(direction, output);
                }
            }
            Recipe::Furnace(recipe) | Recipe::FurnaceData(recipe) => {
                recipe.input_type = self.translate_item_type(direction, recipe.input_type);
                self.stack(direction, &mut recipe.output);
            }
            Recipe::SmithingTransform(recipe) => {
                self.descriptor(direction, &mut recipe.template);
                self.descriptor(direction, &mut recipe.base);
                self.descriptor(direction, &mut recipe.addition);
                self.stack(direction, &mut recipe.result);
            }
            Recipe::SmithingTrim(recipe) => {
                self.descriptor(direction, &mut recipe.template);
                self.descriptor(direction, &mut recipe.base);
                self.descriptor(direction, &mut recipe.addition);
            }
            Recipe::Multi { .. } => {}
        }
    }

    /// Translate the item table of a start game packet. Vanilla entries that have no
    /// counterpart are dropped; component-based entries are registered on both sides.
    fn start_game_items(&self, direction: Direction, items: &mut Vec<ItemEntry>) {
        let (_, destination) = self.sides(direction);
        let entries = std::mem::take(items);
        for mut entry in entries {
            if entry.component_based {
                let latest = self.latest.items.register_entry(&entry.name);
                let legacy = self.mapping.items.register_entry(&entry.name);
                entry.runtime_id = match direction {
                    Direction::Downgrade => legacy,
                    Direction::Upgrade => latest,
                } as i16;
                items.push(entry);
                continue;
            }

            let item_type = self.translate_item_type(direction, ItemType::new(entry.runtime_id as i32, 0));
            if item_type.network_id == destination.items.air() {
                trace!("Dropping start game item {}", entry.name);
                continue;
            }
            let Some(name) = destination.items.item_runtime_id_to_name(item_type.network_id) else {
                continue;
            };
            entry.name = name;
            entry.runtime_id = item_type.network_id as i16;
            items.push(entry);
        }

        // Custom items only exist on the legacy side.
        if direction == Direction::Downgrade {
            for (runtime_id, item) in self.custom_items() {
                let (name, _) = item.encode_item();
                items.push(ItemEntry {
                    name,
                    runtime_id: runtime_id as i16,
                    component_based: true,
                });
            }
        }
    }
}
