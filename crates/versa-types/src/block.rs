use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use versa_nbt::NbtValue;

/// A single block property value.
///
/// Bedrock catalogues only ever carry these four shapes. Booleans arrive from NBT as bytes, so
/// `Bool` is mostly seen in hand-written definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i32),
    Byte(u8),
    String(String),
}

impl PropertyValue {
    /// Convert an NBT tag. Returns None for tag types a block property cannot hold.
    pub fn from_nbt(value: &NbtValue) -> Option<Self> {
        match value {
            NbtValue::Byte(v) => Some(PropertyValue::Byte(*v as u8)),
            NbtValue::Int(v) => Some(PropertyValue::Int(*v)),
            NbtValue::String(v) => Some(PropertyValue::String(v.clone())),
            _ => None,
        }
    }

    pub fn to_nbt(&self) -> NbtValue {
        match self {
            PropertyValue::Bool(v) => NbtValue::Byte(*v as i8),
            PropertyValue::Byte(v) => NbtValue::Byte(*v as i8),
            PropertyValue::Int(v) => NbtValue::Int(*v),
            PropertyValue::String(v) => NbtValue::String(v.clone()),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<u8> for PropertyValue {
    fn from(v: u8) -> Self {
        PropertyValue::Byte(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::String(v.to_string())
    }
}

/// A block name plus its property values.
///
/// Equality and hashing ignore `version`: two states describe the same block when their name
/// and properties match. Properties are kept sorted by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockState {
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub version: i32,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
            version: 0,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }
}

impl PartialEq for BlockState {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.properties == other.properties
    }
}

impl Eq for BlockState {}

impl Hash for BlockState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.properties.hash(state);
    }
}

/// A custom block shape as announced in the start-game packet.
/// `properties` holds the raw component compound, with the block's permutable
/// properties under `properties: [{name, enum: [...]}]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntry {
    pub name: String,
    pub properties: NbtValue,
}
