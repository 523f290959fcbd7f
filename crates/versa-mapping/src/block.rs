use crate::{
    fnv1_64, hash_state, state_from_nbt, BlockUpgrader, CustomBlockDefinition, MappingError,
    MappingResult, StateHash,
};
use bytes::BytesMut;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use versa_nbt::{read_compound, NbtEncoding, NbtValue};
use versa_types::{BlockEntry, BlockState};

pub const AIR_BLOCK: &str = "minecraft:air";

/// Rewrites block actor NBT as it crosses between a version and latest.
pub type BlockActorRemap = Box<dyn Fn(&mut NbtValue) + Send + Sync>;

/// Block states of one protocol version, indexed by runtime ID.
///
/// Lookups by state go through the upgrader first, so a state from any older version
/// resolves to the runtime ID of its current form. `adjust` may re-sort the whole table:
/// runtime IDs handed out before it runs are no longer valid afterwards.
pub struct BlockRegistry {
    upgrader: Arc<BlockUpgrader>,
    table: RwLock<BlockTable>,
    downgrade_actor: Option<BlockActorRemap>,
    upgrade_actor: Option<BlockActorRemap>,
}

struct BlockTable {
    states: Vec<BlockState>,
    ids: HashMap<StateHash, u32>,
    air: u32,
}

impl BlockTable {
    fn build(states: Vec<BlockState>, upgrader: &BlockUpgrader) -> MappingResult<Self> {
        let mut ids = HashMap::with_capacity(states.len());
        for (rid, state) in states.iter().enumerate() {
            let key = hash_state(&upgrader.upgrade(state));
            if ids.contains_key(&key) {
                debug!("Block state {} at runtime ID {} duplicates an earlier entry", state.name, rid);
                continue;
            }
            ids.insert(key, rid as u32);
        }
        let air = *ids
            .get(&hash_state(&BlockState::new(AIR_BLOCK)))
            .ok_or(MappingError::MissingAir(AIR_BLOCK))?;
        Ok(Self { states, ids, air })
    }
}

impl BlockRegistry {
    /// Build a registry whose runtime IDs are the positions in `states`.
    pub fn from_states(states: Vec<BlockState>, upgrader: Arc<BlockUpgrader>) -> MappingResult<Self> {
        let table = BlockTable::build(states, &upgrader)?;
        Ok(Self {
            upgrader,
            table: RwLock::new(table),
            downgrade_actor: None,
            upgrade_actor: None,
        })
    }

    /// Build a registry from a catalogue: back-to-back network NBT compounds
    /// `{name, states, version}`, one per runtime ID.
    pub fn from_catalogue(data: &[u8], upgrader: Arc<BlockUpgrader>) -> MappingResult<Self> {
        let mut buf = BytesMut::from(data);
        let mut states = Vec::new();
        while !buf.is_empty() {
            let nbt = read_compound(&mut buf, NbtEncoding::NetworkLittleEndian)?;
            states.push(state_from_nbt(&nbt)?);
        }
        let registry = Self::from_states(states, upgrader)?;
        info!("Loaded block catalogue with {} states", registry.len());
        Ok(registry)
    }

    /// Attach functions that adapt block actor data between this version and latest.
    pub fn with_block_actor_remapper(
        mut self,
        downgrade: impl Fn(&mut NbtValue) + Send + Sync + 'static,
        upgrade: impl Fn(&mut NbtValue) + Send + Sync + 'static,
    ) -> Self {
        self.downgrade_actor = Some(Box::new(downgrade));
        self.upgrade_actor = Some(Box::new(upgrade));
        self
    }

    pub fn state_to_runtime_id(&self, state: &BlockState) -> Option<u32> {
        let key = hash_state(&self.upgrader.upgrade(state));
        self.table.read().ids.get(&key).copied()
    }

    pub fn runtime_id_to_state(&self, runtime_id: u32) -> Option<BlockState> {
        self.table.read().states.get(runtime_id as usize).cloned()
    }

    pub fn air(&self) -> u32 {
        self.table.read().air
    }

    pub fn len(&self) -> usize {
        self.table.read().states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of every state in runtime ID order.
    pub fn states(&self) -> Vec<BlockState> {
        self.table.read().states.clone()
    }

    pub fn upgrader(&self) -> &Arc<BlockUpgrader> {
        &self.upgrader
    }

    /// Add every combination of the custom definitions that is not already present.
    ///
    /// When anything is added the whole table is re-sorted by the FNV-1 hash of each
    /// state's name (stable, so equal names keep their order) and every runtime ID is
    /// reassigned. Returns the number of states added.
    pub fn adjust(&self, definitions: &[CustomBlockDefinition]) -> MappingResult<usize> {
        let mut table = self.table.write();

        let mut seen = std::collections::HashSet::new();
        let mut added = Vec::new();
        for state in definitions.iter().flat_map(CustomBlockDefinition::states) {
            let key = hash_state(&self.upgrader.upgrade(&state));
            if table.ids.contains_key(&key) || !seen.insert(key) {
                continue;
            }
            added.push(state);
        }
        if added.is_empty() {
            return Ok(0);
        }

        let count = added.len();
        let mut states = table.states.clone();
        states.extend(added);
        states.sort_by_cached_key(|s| fnv1_64(s.name.as_bytes()));
        *table = BlockTable::build(states, &self.upgrader)?;

        info!("Added {} custom block states, {} states total", count, table.states.len());
        Ok(count)
    }

    /// `adjust` with definitions taken from start-game block entries.
    pub fn adjust_entries(&self, entries: &[BlockEntry]) -> MappingResult<usize> {
        let definitions = entries
            .iter()
            .map(CustomBlockDefinition::from_entry)
            .collect::<MappingResult<Vec<_>>>()?;
        self.adjust(&definitions)
    }

    pub fn downgrade_block_actor_data(&self, data: &mut NbtValue) {
        if let Some(remap) = &self.downgrade_actor {
            remap(data);
        }
    }

    pub fn upgrade_block_actor_data(&self, data: &mut NbtValue) {
        if let Some(remap) = &self.upgrade_actor {
            remap(data);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{state_to_nbt, CustomProperty};
    use versa_nbt::write_compound;
    use versa_types::PropertyValue;

    fn sample_states() -> Vec<BlockState> {
        vec![
            BlockState::new("minecraft:stone"),
            BlockState::new(AIR_BLOCK),
            BlockState::new("minecraft:oak_log").with_property("pillar_axis", "x"),
            BlockState::new("minecraft:oak_log").with_property("pillar_axis", "y"),
            BlockState::new("minecraft:lever").with_property("open_bit", 0u8),
            BlockState::new("minecraft:lever").with_property("open_bit", 1u8),
        ]
    }

    fn registry() -> BlockRegistry {
        BlockRegistry::from_states(sample_states(), Arc::new(BlockUpgrader::empty())).unwrap()
    }

    fn assert_bijection(registry: &BlockRegistry) {
        for rid in 0..registry.len() as u32 {
            let state = registry.runtime_id_to_state(rid).unwrap();
            let normalized = registry.upgrader().upgrade(&state).into_owned();
            assert_eq!(registry.state_to_runtime_id(&normalized), Some(rid), "{:?}", state);
        }
        assert!(registry.runtime_id_to_state(registry.len() as u32).is_none());
    }

    #[test]
    fn test_bijection() {
        assert_bijection(&registry());
    }

    #[test]
    fn test_air() {
        let registry = registry();
        assert_eq!(registry.air(), 1);
        assert_eq!(registry.state_to_runtime_id(&BlockState::new(AIR_BLOCK)), Some(registry.air()));
    }

    #[test]
    fn test_missing_air() {
        let result = BlockRegistry::from_states(
            vec![BlockState::new("minecraft:stone")],
            Arc::new(BlockUpgrader::empty()),
        );
        assert!(matches!(result, Err(MappingError::MissingAir(_))));
    }

    #[test]
    fn test_from_catalogue() {
        let mut buf = BytesMut::new();
        for state in sample_states() {
            write_compound(&state_to_nbt(&state), NbtEncoding::NetworkLittleEndian, &mut buf);
        }
        let registry = BlockRegistry::from_catalogue(&buf, Arc::new(BlockUpgrader::empty())).unwrap();
        assert_eq!(registry.len(), 6);
        let log = BlockState::new("minecraft:oak_log").with_property("pillar_axis", "y");
        assert_eq!(registry.state_to_runtime_id(&log), Some(3));
    }

    #[test]
    fn test_unknown_state() {
        assert_eq!(registry().state_to_runtime_id(&BlockState::new("minecraft:bedrock")), None);
    }

    #[test]
    fn test_adjust() {
        let registry = registry();
        let definition = CustomBlockDefinition {
            name: "custom:gem_block".into(),
            properties: vec![CustomProperty {
                name: "lit".into(),
                values: vec![PropertyValue::Byte(0), PropertyValue::Byte(1)],
            }],
        };
        assert_eq!(registry.adjust(&[definition.clone()]).unwrap(), 2);
        assert_eq!(registry.len(), 8);
        assert_bijection(&registry);
        assert_eq!(
            registry.runtime_id_to_state(registry.air()).map(|s| s.name),
            Some(AIR_BLOCK.to_string())
        );

        // Sorted by name hash, equal names in their previous order.
        let states = registry.states();
        for pair in states.windows(2) {
            assert!(fnv1_64(pair[0].name.as_bytes()) <= fnv1_64(pair[1].name.as_bytes()));
        }
        let logs: Vec<_> = states.iter().filter(|s| s.name == "minecraft:oak_log").collect();
        assert_eq!(logs[0].properties["pillar_axis"], PropertyValue::from("x"));

        // Nothing new the second time.
        assert_eq!(registry.adjust(&[definition]).unwrap(), 0);
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_block_actor_remapper() {
        let registry = registry().with_block_actor_remapper(
            |nbt| nbt.insert("Text", NbtValue::String("downgraded".into())),
            |nbt| nbt.insert("Text", NbtValue::String("upgraded".into())),
        );
        let mut data = NbtValue::compound();
        registry.downgrade_block_actor_data(&mut data);
        assert_eq!(data.get("Text").and_then(NbtValue::as_str), Some("downgraded"));
        registry.upgrade_block_actor_data(&mut data);
        assert_eq!(data.get("Text").and_then(NbtValue::as_str), Some("upgraded"));

        let mut untouched = NbtValue::compound();
        BlockRegistry::from_states(sample_states(), Arc::new(BlockUpgrader::empty()))
            .unwrap()
            .downgrade_block_actor_data(&mut untouched);
        assert_eq!(untouched, NbtValue::compound());
    }
}
