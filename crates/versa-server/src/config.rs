use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct VersaConfig {
    #[serde(default)]
    pub latest: LatestConfig,
    #[serde(default)]
    pub schemas: SchemaConfig,
    /// JSON file of custom block definitions applied to every registry.
    #[serde(default)]
    pub custom_blocks: Option<PathBuf>,
    #[serde(default)]
    pub protocols: Vec<ProtocolConfig>,
    #[serde(default)]
    pub custom_items: Vec<CustomItemConfig>,
}

/// The server's own protocol and catalogues.
#[derive(Debug, Deserialize)]
pub struct LatestConfig {
    #[serde(default = "default_latest_id")]
    pub id: i32,
    #[serde(default = "default_latest_version")]
    pub version: String,
    #[serde(default = "default_latest_blocks")]
    pub blocks: PathBuf,
    #[serde(default = "default_latest_items")]
    pub items: PathBuf,
    #[serde(default = "default_latest_item_version")]
    pub item_version: u16,
}

#[derive(Debug, Deserialize)]
pub struct SchemaConfig {
    #[serde(default = "default_block_state_schemas")]
    pub block_states: PathBuf,
    #[serde(default = "default_item_schemas")]
    pub items: PathBuf,
    /// Legacy item name to legacy block id.
    #[serde(default = "default_item_block_map")]
    pub item_block_map: PathBuf,
    /// Legacy block id and metadata to block state.
    #[serde(default = "default_legacy_block_states")]
    pub legacy_block_states: PathBuf,
}

/// An older protocol served through translation.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtocolConfig {
    pub id: i32,
    pub version: String,
    pub blocks: PathBuf,
    pub items: PathBuf,
    pub item_version: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomItemConfig {
    pub identifier: String,
    pub name: String,
    /// Latest item the custom item stands in for.
    pub replacement: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub group: Option<String>,
    pub texture: String,
}

fn default_latest_id() -> i32 {
    671
}

fn default_latest_version() -> String {
    "1.20.80".into()
}

fn default_latest_blocks() -> PathBuf {
    "data/latest/block_states.nbt".into()
}

fn default_latest_items() -> PathBuf {
    "data/latest/item_runtime_ids.nbt".into()
}

fn default_latest_item_version() -> u16 {
    121
}

fn default_block_state_schemas() -> PathBuf {
    "data/schemas/block_states".into()
}

fn default_item_schemas() -> PathBuf {
    "data/schemas/items".into()
}

fn default_item_block_map() -> PathBuf {
    "data/schemas/item_block_map.json".into()
}

fn default_legacy_block_states() -> PathBuf {
    "data/schemas/legacy_block_states.bin".into()
}

fn default_category() -> String {
    "items".into()
}

impl Default for LatestConfig {
    fn default() -> Self {
        Self {
            id: default_latest_id(),
            version: default_latest_version(),
            blocks: default_latest_blocks(),
            items: default_latest_items(),
            item_version: default_latest_item_version(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            block_states: default_block_state_schemas(),
            items: default_item_schemas(),
            item_block_map: default_item_block_map(),
            legacy_block_states: default_legacy_block_states(),
        }
    }
}

impl Default for VersaConfig {
    fn default() -> Self {
        Self {
            latest: LatestConfig::default(),
            schemas: SchemaConfig::default(),
            custom_blocks: None,
            protocols: Vec::new(),
            custom_items: Vec::new(),
        }
    }
}

impl VersaConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: VersaConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = VersaConfig::load(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.latest.id, 671);
        assert_eq!(config.latest.item_version, 121);
        assert_eq!(config.schemas.items, PathBuf::from("data/schemas/items"));
        assert!(config.custom_blocks.is_none());
        assert!(config.protocols.is_empty());
        assert!(config.custom_items.is_empty());
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
custom_blocks = "data/custom_blocks.json"

[latest]
version = "1.20.81"

[[protocols]]
id = 486
version = "1.18.12"
blocks = "data/v486/block_states.nbt"
items = "data/v486/item_runtime_ids.nbt"
item_version = 81

[[custom_items]]
identifier = "versa:disc_relic"
name = "Music Disc"
replacement = "minecraft:music_disc_relic"
texture = "disc_relic"
"#
        )
        .unwrap();

        let config = VersaConfig::load(file.path()).unwrap();
        assert_eq!(config.latest.version, "1.20.81");
        assert_eq!(config.latest.id, 671);
        assert_eq!(config.custom_blocks, Some(PathBuf::from("data/custom_blocks.json")));
        assert_eq!(config.protocols.len(), 1);
        assert_eq!(config.protocols[0].item_version, 81);
        assert_eq!(config.custom_items[0].category, "items");
        assert!(config.custom_items[0].group.is_none());
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[[protocols]]\nid = \"not a number\"\n").unwrap();
        assert!(VersaConfig::load(file.path()).is_err());
    }
}
