use crate::{BlockTranslator, ItemTranslator};
use std::sync::Arc;
use versa_protocol::{ConnectionState, Packet, ProtocolAdapter};

/// An older protocol version, reached by rewriting item and block identifiers.
///
/// Items are rewritten before blocks on the way out and after them on the way in, so item
/// stacks always meet the block translator in the ID space it expects.
pub struct TranslatedProtocol {
    id: i32,
    version: String,
    blocks: BlockTranslator,
    items: Arc<ItemTranslator>,
}

impl TranslatedProtocol {
    pub fn new(id: i32, version: impl Into<String>, blocks: BlockTranslator, items: Arc<ItemTranslator>) -> Self {
        Self {
            id,
            version: version.into(),
            blocks,
            items,
        }
    }

    pub fn blocks(&self) -> &BlockTranslator {
        &self.blocks
    }

    pub fn items(&self) -> &Arc<ItemTranslator> {
        &self.items
    }
}

impl ProtocolAdapter for TranslatedProtocol {
    fn id(&self) -> i32 {
        self.id
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn convert_to_latest(&self, packet: Packet, conn: &ConnectionState) -> Vec<Packet> {
        let packets = self.blocks.upgrade_packets(vec![packet], conn);
        self.items.upgrade_packets(packets, conn)
    }

    fn convert_from_latest(&self, packet: Packet, conn: &ConnectionState) -> Vec<Packet> {
        let packets = self.items.downgrade_packets(vec![packet], conn);
        self.blocks.downgrade_packets(packets, conn)
    }
}

/// The server's own protocol. Packets pass through untouched.
pub struct LatestProtocol {
    id: i32,
    version: String,
}

impl LatestProtocol {
    pub fn new(id: i32, version: impl Into<String>) -> Self {
        Self {
            id,
            version: version.into(),
        }
    }
}

impl ProtocolAdapter for LatestProtocol {
    fn id(&self) -> i32 {
        self.id
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn convert_to_latest(&self, packet: Packet, _conn: &ConnectionState) -> Vec<Packet> {
        vec![packet]
    }

    fn convert_from_latest(&self, packet: Packet, _conn: &ConnectionState) -> Vec<Packet> {
        vec![packet]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versa_mapping::{BlockRegistry, BlockUpgrader, ItemBlockCrosswalk, ItemRegistry, ItemSchemas, Mappings};
    use versa_types::{BlockPos, BlockState, ItemInstance, ItemStack};

    fn mappings(blocks: &[&str], items: &[(&str, i32)]) -> Mappings {
        let states = blocks.iter().map(|name| BlockState::new(*name)).collect();
        Mappings::new(
            Arc::new(BlockRegistry::from_states(states, Arc::new(BlockUpgrader::empty())).unwrap()),
            Arc::new(
                ItemRegistry::from_entries(items.iter().map(|(name, id)| (name.to_string(), *id)), 100).unwrap(),
            ),
        )
    }

    fn protocol() -> TranslatedProtocol {
        let legacy = mappings(
            &["minecraft:stone", "minecraft:air"],
            &[("minecraft:air", 0), ("minecraft:stone", 1)],
        );
        let latest = mappings(
            &["minecraft:air", "minecraft:dirt", "minecraft:stone"],
            &[("minecraft:air", 0), ("minecraft:dirt", 1), ("minecraft:stone", 2)],
        );
        let mut crosswalk = ItemBlockCrosswalk::new();
        crosswalk.insert_item("minecraft:stone", "minecraft:stone");
        crosswalk.insert_state("minecraft:stone", 0, BlockState::new("minecraft:stone"));
        let items = ItemTranslator::new(
            legacy.clone(),
            latest.clone(),
            Arc::new(ItemSchemas::new()),
            Arc::new(crosswalk),
        );
        let blocks = BlockTranslator::new(legacy.blocks, latest.blocks);
        TranslatedProtocol::new(486, "1.18.12", blocks, Arc::new(items))
    }

    fn stone_slot(id: i32, block_runtime_id: i32) -> Packet {
        Packet::InventorySlot {
            window_id: 0,
            slot: 3,
            new_item: ItemInstance {
                stack_network_id: 1,
                stack: ItemStack {
                    block_runtime_id,
                    ..ItemStack::new(id, 0, 16)
                },
            },
        }
    }

    #[test]
    fn test_translated_protocol() {
        let protocol = protocol();
        let conn = ConnectionState::default();
        assert_eq!(protocol.id(), 486);
        assert_eq!(protocol.version(), "1.18.12");

        let update = Packet::UpdateBlock {
            position: BlockPos::new(1, 2, 3),
            new_block_runtime_id: 2,
            flags: 0,
            layer: 0,
        };
        let out = protocol.convert_from_latest(update, &conn);
        assert!(matches!(out[0], Packet::UpdateBlock { new_block_runtime_id: 0, .. }));
        let back = protocol.convert_to_latest(out[0].clone(), &conn);
        assert!(matches!(back[0], Packet::UpdateBlock { new_block_runtime_id: 2, .. }));

        let out = protocol.convert_from_latest(stone_slot(2, 2), &conn);
        assert_eq!(out, vec![stone_slot(1, 0)]);
        let back = protocol.convert_to_latest(stone_slot(1, 0), &conn);
        assert_eq!(back, vec![stone_slot(2, 2)]);
    }

    #[test]
    fn test_latest_protocol_passthrough() {
        let protocol = LatestProtocol::new(712, "1.21.20");
        let packet = Packet::Unknown {
            id: 9,
            data: vec![1, 2, 3],
        };
        let conn = ConnectionState::default();
        assert_eq!(protocol.convert_from_latest(packet.clone(), &conn), vec![packet.clone()]);
        assert_eq!(protocol.convert_to_latest(packet.clone(), &conn), vec![packet]);
    }
}
