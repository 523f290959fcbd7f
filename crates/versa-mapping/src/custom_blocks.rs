use crate::{read_file, MappingError, MappingResult};
use serde::Deserialize;
use std::path::Path;
use versa_nbt::NbtValue;
use versa_types::{BlockEntry, BlockState, PropertyValue};

/// A server-defined block and the values each of its properties may take.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomBlockDefinition {
    pub name: String,
    #[serde(default)]
    pub properties: Vec<CustomProperty>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomProperty {
    pub name: String,
    #[serde(rename = "enum")]
    pub values: Vec<PropertyValue>,
}

impl CustomBlockDefinition {
    /// Read the permutable properties out of a start-game block entry.
    pub fn from_entry(entry: &BlockEntry) -> MappingResult<Self> {
        let mut properties = Vec::new();
        if let Some(list) = entry.properties.get("properties") {
            let list = list.as_list().ok_or_else(|| {
                MappingError::MalformedEntry(format!("properties of {} is not a list", entry.name))
            })?;
            for property in list {
                let name = property.get("name").and_then(NbtValue::as_str).ok_or_else(|| {
                    MappingError::MalformedEntry(format!("unnamed property on {}", entry.name))
                })?;
                let options = property.get("enum").and_then(NbtValue::as_list).unwrap_or_default();
                let values = options
                    .iter()
                    .map(|v| {
                        PropertyValue::from_nbt(v).ok_or_else(|| MappingError::UnsupportedProperty {
                            block: entry.name.clone(),
                            property: name.to_string(),
                            tag: v.tag_id(),
                        })
                    })
                    .collect::<MappingResult<Vec<_>>>()?;
                properties.push(CustomProperty {
                    name: name.to_string(),
                    values,
                });
            }
        }
        Ok(Self {
            name: entry.name.clone(),
            properties,
        })
    }

    /// Every combination of property values, in declaration order.
    /// A definition without properties yields a single state.
    pub fn states(&self) -> Vec<BlockState> {
        let mut out = Vec::new();
        let mut current = BlockState::new(self.name.clone());
        expand(&self.properties, &mut current, &mut out);
        out
    }
}

fn expand(properties: &[CustomProperty], current: &mut BlockState, out: &mut Vec<BlockState>) {
    let Some((first, rest)) = properties.split_first() else {
        out.push(current.clone());
        return;
    };
    for value in &first.values {
        current.properties.insert(first.name.clone(), value.clone());
        expand(rest, current, out);
    }
    current.properties.remove(&first.name);
}

/// Load a JSON array of custom block definitions.
pub fn load_custom_blocks(path: &Path) -> MappingResult<Vec<CustomBlockDefinition>> {
    let raw = read_file(path)?;
    Ok(serde_json::from_slice(&raw)?)
}
