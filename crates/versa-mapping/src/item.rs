use crate::{MappingError, MappingResult};
use bytes::BytesMut;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};
use versa_nbt::{read_compound, NbtEncoding, NbtValue};

pub const AIR_ITEM: &str = "minecraft:air";

/// Item names and runtime IDs of one protocol version.
///
/// Custom items may be appended at runtime; entries are never removed.
pub struct ItemRegistry {
    table: RwLock<ItemTable>,
    air: i32,
    version: u16,
}

struct ItemTable {
    name_to_id: HashMap<String, i32>,
    id_to_name: HashMap<i32, String>,
    next_id: i32,
    custom: Vec<String>,
}

impl ItemRegistry {
    /// `version` is the item schema version this catalogue belongs to.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, i32)>,
        version: u16,
    ) -> MappingResult<Self> {
        let mut name_to_id = HashMap::new();
        let mut id_to_name = HashMap::new();
        for (name, id) in entries {
            id_to_name.insert(id, name.clone());
            name_to_id.insert(name, id);
        }
        let air = *name_to_id.get(AIR_ITEM).ok_or(MappingError::MissingAir(AIR_ITEM))?;
        let next_id = id_to_name.keys().copied().max().map_or(0, |max| max + 1);
        Ok(Self {
            table: RwLock::new(ItemTable {
                name_to_id,
                id_to_name,
                next_id,
                custom: Vec::new(),
            }),
            air,
            version,
        })
    }

    /// Build a registry from a network NBT compound of `name -> runtime ID`.
    pub fn from_catalogue(data: &[u8], version: u16) -> MappingResult<Self> {
        let mut buf = BytesMut::from(data);
        let root = read_compound(&mut buf, NbtEncoding::NetworkLittleEndian)?;
        let entries = root
            .as_compound()
            .ok_or_else(|| MappingError::MalformedEntry("item catalogue is not a compound".into()))?;
        let entries = entries
            .iter()
            .map(|(name, id)| {
                id.as_int()
                    .map(|id| (name.clone(), id))
                    .ok_or_else(|| MappingError::MalformedEntry(format!("item {} has no numeric ID", name)))
            })
            .collect::<MappingResult<Vec<_>>>()?;
        let registry = Self::from_entries(entries, version)?;
        info!("Loaded item catalogue with {} items (schema version {})", registry.len(), version);
        Ok(registry)
    }

    pub fn item_name_to_runtime_id(&self, name: &str) -> Option<i32> {
        self.table.read().name_to_id.get(name).copied()
    }

    pub fn item_runtime_id_to_name(&self, runtime_id: i32) -> Option<String> {
        self.table.read().id_to_name.get(&runtime_id).cloned()
    }

    pub fn air(&self) -> i32 {
        self.air
    }

    pub fn item_version(&self) -> u16 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.table.read().name_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a component-based item under the next free runtime ID.
    /// Registering a name that is already known returns its existing ID.
    pub fn register_entry(&self, name: &str) -> i32 {
        let mut table = self.table.write();
        if let Some(id) = table.name_to_id.get(name) {
            return *id;
        }
        let id = table.next_id;
        table.next_id += 1;
        table.name_to_id.insert(name.to_string(), id);
        table.id_to_name.insert(id, name.to_string());
        table.custom.push(name.to_string());
        debug!("Registered item {} as runtime ID {}", name, id);
        id
    }

    /// Names added through `register_entry`, in registration order.
    pub fn custom_entries(&self) -> Vec<String> {
        self.table.read().custom.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use versa_nbt::{nbt_compound, write_compound};

    fn registry() -> ItemRegistry {
        ItemRegistry::from_entries(
            [
                ("minecraft:air".to_string(), -158),
                ("minecraft:stone".to_string(), 1),
                ("minecraft:record_13".to_string(), 500),
            ],
            181,
        )
        .unwrap()
    }

    #[test]
    fn test_lookups() {
        let registry = registry();
        assert_eq!(registry.air(), -158);
        assert_eq!(registry.item_version(), 181);
        assert_eq!(registry.item_name_to_runtime_id("minecraft:stone"), Some(1));
        assert_eq!(registry.item_runtime_id_to_name(500).as_deref(), Some("minecraft:record_13"));
        assert_eq!(registry.item_name_to_runtime_id("minecraft:unknown"), None);
    }

    #[test]
    fn test_missing_air() {
        let result = ItemRegistry::from_entries([("minecraft:stone".to_string(), 1)], 0);
        assert!(matches!(result, Err(MappingError::MissingAir(_))));
    }

    #[test]
    fn test_register_entry() {
        let registry = registry();
        let id = registry.register_entry("custom:ruby");
        assert_eq!(id, 501);
        assert_eq!(registry.item_runtime_id_to_name(id).as_deref(), Some("custom:ruby"));
        assert_eq!(registry.register_entry("custom:ruby"), id);
        assert_eq!(registry.register_entry("custom:sapphire"), 502);
        assert_eq!(registry.custom_entries(), vec!["custom:ruby", "custom:sapphire"]);
    }

    #[test]
    fn test_from_catalogue() {
        let mut buf = BytesMut::new();
        write_compound(
            &nbt_compound! {
                "minecraft:air" => NbtValue::Short(0),
                "minecraft:stick" => NbtValue::Int(320),
            },
            NbtEncoding::NetworkLittleEndian,
            &mut buf,
        );
        let registry = ItemRegistry::from_catalogue(&buf, 111).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.item_name_to_runtime_id("minecraft:stick"), Some(320));
    }
}
