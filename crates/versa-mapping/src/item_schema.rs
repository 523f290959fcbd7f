use crate::{read_file, upgrade::json_files, MappingError, MappingResult};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::path::Path;
use tracing::{debug, trace};

/// An item identity at a given item schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub metadata: u32,
    pub version: u16,
}

impl Item {
    pub fn new(name: impl Into<String>, metadata: u32, version: u16) -> Self {
        Self {
            name: name.into(),
            metadata,
            version,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaDocument {
    #[serde(default)]
    renamed_ids: BTreeMap<String, String>,
    #[serde(default)]
    remapped_metas: BTreeMap<String, BTreeMap<u32, String>>,
}

/// Rewrite tables introduced by one item schema version, with their inverses.
#[derive(Debug, Default)]
struct ItemSchema {
    renamed: HashMap<String, String>,
    remapped: HashMap<String, HashMap<u32, String>>,
    unrenamed: HashMap<String, String>,
    unremapped: HashMap<String, (String, u32)>,
}

impl ItemSchema {
    fn from_document(doc: SchemaDocument) -> Self {
        let mut schema = Self::default();
        // BTreeMap order makes the lowest old name and lowest metadata win the inverse tables.
        for (old, new) in &doc.renamed_ids {
            schema.unrenamed.entry(new.clone()).or_insert_with(|| old.clone());
        }
        for (old, metas) in &doc.remapped_metas {
            for (meta, new) in metas {
                schema
                    .unremapped
                    .entry(new.clone())
                    .or_insert_with(|| (old.clone(), *meta));
            }
        }
        schema.renamed = doc.renamed_ids.into_iter().collect();
        schema.remapped = doc
            .remapped_metas
            .into_iter()
            .map(|(name, metas)| (name, metas.into_iter().collect()))
            .collect();
        schema
    }

    fn upgrade(&self, item: &mut Item) -> bool {
        if let Some(name) = self.remapped.get(&item.name).and_then(|m| m.get(&item.metadata)) {
            item.name = name.clone();
            item.metadata = 0;
            return true;
        }
        if let Some(name) = self.renamed.get(&item.name) {
            item.name = name.clone();
            return true;
        }
        false
    }

    fn downgrade(&self, item: &mut Item) -> bool {
        if let Some((name, meta)) = self.unremapped.get(&item.name) {
            item.name = name.clone();
            item.metadata = *meta;
            return true;
        }
        if let Some(name) = self.unrenamed.get(&item.name) {
            item.name = name.clone();
            return true;
        }
        false
    }
}

/// Every item schema, keyed by ascending schema version.
#[derive(Debug, Default)]
pub struct ItemSchemas {
    schemas: BTreeMap<u16, ItemSchema>,
}

impl ItemSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_json(&mut self, version: u16, json: &str) -> MappingResult<()> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        self.schemas.insert(version, ItemSchema::from_document(doc));
        Ok(())
    }

    /// Load every `NNNN_<name>.json` file of a directory; the four digits are the schema version.
    /// JSON files without a version prefix are skipped.
    pub fn load_dir(dir: &Path) -> MappingResult<Self> {
        let mut schemas = Self::new();
        for path in json_files(dir)? {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| MappingError::SchemaFileName(path.display().to_string()))?;
            let Some(version) = schema_version(file_name) else {
                debug!("Skipping {}, not an item schema", file_name);
                continue;
            };
            let raw = read_file(&path)?;
            schemas.insert_json(version, &String::from_utf8_lossy(&raw))?;
        }
        debug!("Loaded {} item schemas from {}", schemas.len(), dir.display());
        Ok(schemas)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn latest_version(&self) -> Option<u16> {
        self.schemas.keys().next_back().copied()
    }

    /// Apply every schema in `(item.version, target]`, in ascending order.
    /// The result carries the version of the last schema that changed it.
    pub fn upgrade(&self, mut item: Item, target: u16) -> Item {
        if item.version >= target {
            return item;
        }
        let range = (Bound::Excluded(item.version), Bound::Included(target));
        for (version, schema) in self.schemas.range(range) {
            if schema.upgrade(&mut item) {
                item.version = *version;
            }
        }
        item
    }

    /// Undo every schema in `(target, item.version]`, in descending order.
    ///
    /// Metadata remaps are one-way when several legacy metadata values collapse onto one
    /// name: the lowest legacy name and metadata is recovered.
    pub fn downgrade(&self, mut item: Item, target: u16) -> Item {
        if target >= item.version {
            return item;
        }
        let range = (Bound::Excluded(target), Bound::Included(item.version));
        for (version, schema) in self.schemas.range(range).rev() {
            if schema.downgrade(&mut item) {
                trace!("Item schema {} downgraded to {}", version, item.name);
            }
        }
        item.version = target;
        item
    }
}

fn schema_version(file_name: &str) -> Option<u16> {
    let (prefix, _) = file_name.split_once('_')?;
    if prefix.len() != 4 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schemas() -> ItemSchemas {
        let mut schemas = ItemSchemas::new();
        schemas
            .insert_json(
                101,
                &json!({"renamedIds": {"minecraft:record_old": "minecraft:record_mid"}}).to_string(),
            )
            .unwrap();
        schemas
            .insert_json(
                121,
                &json!({
                    "renamedIds": {"minecraft:record_mid": "minecraft:record_13"},
                    "remappedMetas": {
                        "minecraft:wool": {"0": "minecraft:white_wool", "14": "minecraft:red_wool"},
                        "minecraft:old_wool": {"3": "minecraft:red_wool"}
                    }
                })
                .to_string(),
            )
            .unwrap();
        schemas
    }

    #[test]
    fn test_rename_round_trip() {
        let schemas = schemas();
        let old = Item::new("minecraft:record_old", 2, 91);
        let upgraded = schemas.upgrade(old.clone(), 121);
        assert_eq!(upgraded, Item::new("minecraft:record_13", 2, 121));
        assert_eq!(schemas.downgrade(upgraded, 91), old);
    }

    #[test]
    fn test_remap_resets_metadata() {
        let upgraded = schemas().upgrade(Item::new("minecraft:wool", 14, 111), 121);
        assert_eq!(upgraded, Item::new("minecraft:red_wool", 0, 121));
    }

    #[test]
    fn test_remap_is_lossy() {
        let schemas = schemas();
        // Both wool:14 and old_wool:3 become red_wool; the downgrade recovers only one of them.
        let from_old = schemas.upgrade(Item::new("minecraft:old_wool", 3, 111), 121);
        assert_eq!(from_old.name, "minecraft:red_wool");
        let back = schemas.downgrade(from_old, 111);
        assert_eq!(back, Item::new("minecraft:old_wool", 3, 111));

        let back = schemas.downgrade(Item::new("minecraft:white_wool", 0, 121), 111);
        assert_eq!(back, Item::new("minecraft:wool", 0, 111));
    }

    #[test]
    fn test_unknown_item_untouched() {
        let schemas = schemas();
        let item = Item::new("minecraft:stone", 0, 91);
        assert_eq!(schemas.upgrade(item.clone(), 121), item);
        assert_eq!(schemas.upgrade(Item::new("minecraft:stone", 0, 130), 121).version, 130);
    }

    #[test]
    fn test_schema_version() {
        assert_eq!(schema_version("0121_1.20.30.json"), Some(121));
        assert_eq!(schema_version("121_1.20.30.json"), None);
        assert_eq!(schema_version("blocks.json"), None);
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("0101_1.16.0.json"),
            json!({"renamedIds": {"minecraft:a": "minecraft:b"}}).to_string(),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();
        let schemas = ItemSchemas::load_dir(dir.path()).unwrap();
        assert_eq!(schemas.len(), 1);
        assert_eq!(schemas.latest_version(), Some(101));
        assert_eq!(schemas.upgrade(Item::new("minecraft:a", 0, 0), 101).name, "minecraft:b");
    }
}
