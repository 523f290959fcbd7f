use crate::{read_file, state_from_nbt, BlockUpgrader, MappingResult};
use bytes::BytesMut;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;
use versa_nbt::{read_compound, NbtEncoding};
use versa_protocol::{read_string, read_varuint32};
use versa_types::BlockState;

/// Maps legacy item names and metadata to the block state the item places.
#[derive(Debug, Default)]
pub struct ItemBlockCrosswalk {
    item_to_block: HashMap<String, String>,
    states: HashMap<(String, u32), BlockState>,
}

impl ItemBlockCrosswalk {
    pub fn new() -> Self {
        Self::default()
    }

    /// `item_map` is a JSON object of legacy item name to legacy block id. `state_map` is the
    /// binary table of legacy block id and metadata pairs to block states, which are upgraded
    /// as they are read.
    pub fn from_parts(item_map: &[u8], state_map: &[u8], upgrader: &BlockUpgrader) -> MappingResult<Self> {
        let item_to_block: HashMap<String, String> = serde_json::from_slice(item_map)?;
        let mut states = HashMap::new();

        let mut buf = BytesMut::from(state_map);
        let count = read_varuint32(&mut buf)?;
        for _ in 0..count {
            let block_id = read_string(&mut buf)?;
            let pairs = read_varuint32(&mut buf)?;
            for _ in 0..pairs {
                let meta = read_varuint32(&mut buf)?;
                let nbt = read_compound(&mut buf, NbtEncoding::LittleEndian)?;
                let state = upgrader.upgrade(&state_from_nbt(&nbt)?).into_owned();
                states.insert((block_id.clone(), meta), state);
            }
        }

        info!(
            "Loaded item to block crosswalk: {} items, {} legacy states",
            item_to_block.len(),
            states.len()
        );
        Ok(Self { item_to_block, states })
    }

    pub fn load(item_map: &Path, state_map: &Path, upgrader: &BlockUpgrader) -> MappingResult<Self> {
        Self::from_parts(&read_file(item_map)?, &read_file(state_map)?, upgrader)
    }

    pub fn insert_item(&mut self, item: impl Into<String>, block: impl Into<String>) {
        self.item_to_block.insert(item.into(), block.into());
    }

    pub fn insert_state(&mut self, block: impl Into<String>, meta: u32, state: BlockState) {
        self.states.insert((block.into(), meta), state);
    }

    /// The block state placed by an item, preferring an exact metadata match over metadata 0.
    pub fn block_state_for_item(&self, name: &str, metadata: u32) -> Option<&BlockState> {
        let block = self.item_to_block.get(name)?;
        self.states
            .get(&(block.clone(), metadata))
            .or_else(|| self.states.get(&(block.clone(), 0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_to_nbt;
    use versa_nbt::write_compound;
    use versa_protocol::{write_string, write_varuint32};
    use versa_types::PropertyValue;

    fn state_map() -> BytesMut {
        let mut buf = BytesMut::new();
        write_varuint32(&mut buf, 1);
        write_string(&mut buf, "minecraft:standing_sign");
        write_varuint32(&mut buf, 2);
        for (meta, direction) in [(0u32, 0i32), (4, 4)] {
            write_varuint32(&mut buf, meta);
            let state = BlockState::new("minecraft:standing_sign").with_property("ground_sign_direction", direction);
            write_compound(&state_to_nbt(&state), NbtEncoding::LittleEndian, &mut buf);
        }
        buf
    }

    #[test]
    fn test_from_parts() {
        let item_map = br#"{"minecraft:sign": "minecraft:standing_sign"}"#;
        let crosswalk = ItemBlockCrosswalk::from_parts(item_map, &state_map(), &BlockUpgrader::empty()).unwrap();

        let exact = crosswalk.block_state_for_item("minecraft:sign", 4).unwrap();
        assert_eq!(exact.properties["ground_sign_direction"], PropertyValue::Int(4));

        let fallback = crosswalk.block_state_for_item("minecraft:sign", 9).unwrap();
        assert_eq!(fallback.properties["ground_sign_direction"], PropertyValue::Int(0));

        assert!(crosswalk.block_state_for_item("minecraft:stick", 0).is_none());
    }

    #[test]
    fn test_truncated_state_map() {
        let item_map = b"{}";
        let mut data = state_map();
        data.truncate(data.len() - 3);
        assert!(ItemBlockCrosswalk::from_parts(item_map, &data, &BlockUpgrader::empty()).is_err());
    }
}
