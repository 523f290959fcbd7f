use crate::{read_file, MappingError, MappingResult};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;
use versa_types::{BlockState, PropertyValue};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaDocument {
    max_version_major: u8,
    max_version_minor: u8,
    max_version_patch: u8,
    max_version_revision: u8,
    #[serde(default)]
    renamed_ids: BTreeMap<String, String>,
    #[serde(default)]
    added_properties: BTreeMap<String, BTreeMap<String, TypedValue>>,
    #[serde(default)]
    removed_properties: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    renamed_properties: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    remapped_property_values: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    remapped_property_values_index: BTreeMap<String, Vec<ValueRemap>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TypedValue {
    Byte(u8),
    Int(i32),
    String(String),
}

impl From<TypedValue> for PropertyValue {
    fn from(v: TypedValue) -> Self {
        match v {
            TypedValue::Byte(v) => PropertyValue::Byte(v),
            TypedValue::Int(v) => PropertyValue::Int(v),
            TypedValue::String(v) => PropertyValue::String(v),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ValueRemap {
    old: TypedValue,
    new: TypedValue,
}

/// One block-state upgrade schema: renames, property changes and value remaps
/// introduced by a single game version.
#[derive(Debug, Clone, Default)]
pub struct BlockStateSchema {
    id: i32,
    renamed_ids: HashMap<String, String>,
    added_properties: HashMap<String, Vec<(String, PropertyValue)>>,
    removed_properties: HashMap<String, Vec<String>>,
    renamed_properties: HashMap<String, Vec<(String, String)>>,
    remapped_values: HashMap<String, Vec<(String, Vec<(PropertyValue, PropertyValue)>)>>,
}

impl BlockStateSchema {
    pub fn from_json(json: &str) -> MappingResult<Self> {
        let doc: SchemaDocument = serde_json::from_str(json)?;
        let id = i32::from_be_bytes([
            doc.max_version_major,
            doc.max_version_minor,
            doc.max_version_patch,
            doc.max_version_revision,
        ]);

        let mut remapped_values = HashMap::new();
        for (block, properties) in doc.remapped_property_values {
            let mut remaps = Vec::with_capacity(properties.len());
            for (property, key) in properties {
                let pairs = doc.remapped_property_values_index.get(&key).ok_or_else(|| {
                    MappingError::MalformedEntry(format!("unknown value remap index {}", key))
                })?;
                let pairs = pairs
                    .iter()
                    .map(|r| (r.old.clone().into(), r.new.clone().into()))
                    .collect();
                remaps.push((property, pairs));
            }
            remapped_values.insert(block, remaps);
        }

        Ok(Self {
            id,
            renamed_ids: doc.renamed_ids.into_iter().collect(),
            added_properties: doc
                .added_properties
                .into_iter()
                .map(|(block, props)| (block, props.into_iter().map(|(k, v)| (k, v.into())).collect()))
                .collect(),
            removed_properties: doc.removed_properties.into_iter().collect(),
            renamed_properties: doc
                .renamed_properties
                .into_iter()
                .map(|(block, props)| (block, props.into_iter().collect()))
                .collect(),
            remapped_values,
        })
    }

    /// Packed game version this schema upgrades to, comparable with `BlockState::version`.
    pub fn id(&self) -> i32 {
        self.id
    }

    fn affects(&self, name: &str) -> bool {
        self.renamed_ids.contains_key(name)
            || self.added_properties.contains_key(name)
            || self.removed_properties.contains_key(name)
            || self.renamed_properties.contains_key(name)
            || self.remapped_values.contains_key(name)
    }

    /// All property changes are keyed by the block and property names from before this schema.
    fn apply(&self, state: &mut BlockState) {
        if let Some(added) = self.added_properties.get(&state.name) {
            for (key, value) in added {
                state.properties.insert(key.clone(), value.clone());
            }
        }
        if let Some(removed) = self.removed_properties.get(&state.name) {
            for key in removed {
                state.properties.remove(key);
            }
        }
        if let Some(remaps) = self.remapped_values.get(&state.name) {
            for (property, pairs) in remaps {
                if let Some(value) = state.properties.get_mut(property) {
                    if let Some((_, new)) = pairs.iter().find(|(old, _)| old == value) {
                        *value = new.clone();
                    }
                }
            }
        }
        if let Some(renamed) = self.renamed_properties.get(&state.name) {
            for (old, new) in renamed {
                if let Some(value) = state.properties.remove(old) {
                    state.properties.insert(new.clone(), value);
                }
            }
        }
        if let Some(new_name) = self.renamed_ids.get(&state.name) {
            state.name = new_name.clone();
        }
        state.version = self.id;
    }
}

/// Brings block states from any older version up to the newest schema.
#[derive(Debug, Default)]
pub struct BlockUpgrader {
    schemas: Vec<BlockStateSchema>,
}

impl BlockUpgrader {
    /// An upgrader that leaves every state untouched.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(mut schemas: Vec<BlockStateSchema>) -> Self {
        schemas.sort_by_key(BlockStateSchema::id);
        Self { schemas }
    }

    /// Load every `*.json` schema in a directory. Files are read in name order.
    pub fn load_dir(dir: &Path) -> MappingResult<Self> {
        let mut paths = json_files(dir)?;
        paths.sort();
        let mut schemas = Vec::with_capacity(paths.len());
        for path in paths {
            let raw = read_file(&path)?;
            let json = String::from_utf8_lossy(&raw);
            schemas.push(BlockStateSchema::from_json(&json)?);
        }
        debug!("Loaded {} block state schemas from {}", schemas.len(), dir.display());
        Ok(Self::new(schemas))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Upgrade a state. Borrows when no schema applies.
    pub fn upgrade<'a>(&self, state: &'a BlockState) -> Cow<'a, BlockState> {
        let mut upgraded: Option<BlockState> = None;
        for schema in &self.schemas {
            let current = upgraded.as_ref().unwrap_or(state);
            if current.version > schema.id || !schema.affects(&current.name) {
                continue;
            }
            let mut next = upgraded.take().unwrap_or_else(|| state.clone());
            schema.apply(&mut next);
            upgraded = Some(next);
        }
        match upgraded {
            Some(state) => Cow::Owned(state),
            None => Cow::Borrowed(state),
        }
    }
}

pub(crate) fn json_files(dir: &Path) -> MappingResult<Vec<std::path::PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| MappingError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| MappingError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    Ok(paths)
}
