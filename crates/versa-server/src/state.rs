use crate::config::{CustomItemConfig, ProtocolConfig, VersaConfig};
use anyhow::{ensure, Context};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use versa_mapping::{
    load_custom_blocks, BlockRegistry, BlockUpgrader, CustomBlockDefinition, ItemBlockCrosswalk, ItemRegistry,
    ItemSchemas, Mappings,
};
use versa_protocol::ProtocolAdapter;
use versa_translator::{
    BlockTranslator, Category, CreativeCategory, CustomItem, ItemTranslator, LatestProtocol, TranslatedProtocol,
};
use versa_types::ItemType;

/// Schema data shared by every protocol.
pub struct Schemas {
    pub items: Arc<ItemSchemas>,
    pub crosswalk: Arc<ItemBlockCrosswalk>,
}

/// A custom item declared in the config file.
pub struct ConfiguredItem {
    identifier: String,
    name: String,
    texture: String,
    category: Category,
}

impl ConfiguredItem {
    pub fn from_config(config: &CustomItemConfig) -> anyhow::Result<Self> {
        let category: CreativeCategory = config
            .category
            .parse()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("custom item {}", config.identifier))?;
        let mut category = Category::new(category);
        if let Some(group) = &config.group {
            category = category.with_group(group.clone());
        }
        Ok(Self {
            identifier: config.identifier.clone(),
            name: config.name.clone(),
            texture: config.texture.clone(),
            category,
        })
    }
}

impl CustomItem for ConfiguredItem {
    fn encode_item(&self) -> (String, i16) {
        (self.identifier.clone(), 0)
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn texture(&self) -> String {
        self.texture.clone()
    }

    fn category(&self) -> Category {
        self.category.clone()
    }
}

/// Every loaded registry and the translators built on them.
pub struct ServerState {
    latest: Mappings,
    latest_protocol: Arc<LatestProtocol>,
    protocols: Vec<Arc<TranslatedProtocol>>,
}

impl ServerState {
    /// Load every catalogue named by the config. Protocol catalogues load concurrently.
    pub async fn load(config: &VersaConfig) -> anyhow::Result<Self> {
        let dir = config.schemas.block_states.clone();
        let upgrader = Arc::new(
            blocking(move || BlockUpgrader::load_dir(&dir).with_context(|| format!("loading {}", dir.display())))
                .await?,
        );

        let dir = config.schemas.items.clone();
        let items = blocking(move || ItemSchemas::load_dir(&dir).with_context(|| format!("loading {}", dir.display())));
        let (item_map, state_map) = (
            config.schemas.item_block_map.clone(),
            config.schemas.legacy_block_states.clone(),
        );
        let crosswalk_upgrader = upgrader.clone();
        let crosswalk = blocking(move || {
            ItemBlockCrosswalk::load(&item_map, &state_map, &crosswalk_upgrader)
                .with_context(|| format!("loading {} and {}", item_map.display(), state_map.display()))
        });

        let latest_config = &config.latest;
        let latest = load_mappings(
            latest_config.blocks.clone(),
            latest_config.items.clone(),
            latest_config.item_version,
            upgrader.clone(),
        );

        let mut pending = Vec::with_capacity(config.protocols.len());
        for protocol in &config.protocols {
            let mappings = load_mappings(
                protocol.blocks.clone(),
                protocol.items.clone(),
                protocol.item_version,
                upgrader.clone(),
            );
            pending.push((protocol.clone(), tokio::spawn(mappings)));
        }

        let (items, crosswalk, latest) = tokio::try_join!(items, crosswalk, latest)?;
        let schemas = Schemas {
            items: Arc::new(items),
            crosswalk: Arc::new(crosswalk),
        };
        let mut protocols = Vec::with_capacity(pending.len());
        for (protocol, mappings) in pending {
            let mappings = mappings
                .await?
                .with_context(|| format!("catalogues of protocol {}", protocol.id))?;
            protocols.push((protocol, mappings));
        }

        let custom_blocks = match &config.custom_blocks {
            Some(path) => load_custom_blocks(path).with_context(|| format!("loading {}", path.display()))?,
            None => Vec::new(),
        };
        let custom_items = config
            .custom_items
            .iter()
            .map(|item| Ok((ConfiguredItem::from_config(item)?, item.replacement.clone())))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Self::build(config, latest, protocols, schemas, &custom_blocks, custom_items)
    }

    /// Wire the translators and apply custom content.
    pub fn build(
        config: &VersaConfig,
        latest: Mappings,
        protocols: Vec<(ProtocolConfig, Mappings)>,
        schemas: Schemas,
        custom_blocks: &[CustomBlockDefinition],
        custom_items: Vec<(ConfiguredItem, String)>,
    ) -> anyhow::Result<Self> {
        let custom_items: Vec<(Arc<dyn CustomItem>, String)> = custom_items
            .into_iter()
            .map(|(item, replacement)| (Arc::new(item) as Arc<dyn CustomItem>, replacement))
            .collect();

        let mut translated = Vec::with_capacity(protocols.len());
        for (protocol, mapping) in protocols {
            let blocks = BlockTranslator::new(mapping.blocks.clone(), latest.blocks.clone());
            if !custom_blocks.is_empty() {
                blocks
                    .adjust(custom_blocks)
                    .with_context(|| format!("custom blocks for protocol {}", protocol.id))?;
            }

            let items = ItemTranslator::new(
                mapping,
                latest.clone(),
                schemas.items.clone(),
                schemas.crosswalk.clone(),
            );
            for (item, replacement) in &custom_items {
                items
                    .register(item.clone(), replacement)
                    .with_context(|| format!("custom items for protocol {}", protocol.id))?;
            }

            debug!("Wired translators for protocol {} ({})", protocol.id, protocol.version);
            translated.push(Arc::new(TranslatedProtocol::new(
                protocol.id,
                protocol.version,
                blocks,
                Arc::new(items),
            )));
        }

        Ok(Self {
            latest,
            latest_protocol: Arc::new(LatestProtocol::new(config.latest.id, config.latest.version.clone())),
            protocols: translated,
        })
    }

    pub fn latest(&self) -> &Mappings {
        &self.latest
    }

    /// Every accepted protocol, the server's own first.
    pub fn adapters(&self) -> Vec<Arc<dyn ProtocolAdapter>> {
        let mut adapters: Vec<Arc<dyn ProtocolAdapter>> = vec![self.latest_protocol.clone()];
        adapters.extend(
            self.protocols
                .iter()
                .map(|protocol| protocol.clone() as Arc<dyn ProtocolAdapter>),
        );
        adapters
    }

    /// Check that air and every custom item survive a round trip through each protocol.
    pub fn self_check(&self) -> anyhow::Result<()> {
        for protocol in &self.protocols {
            let blocks = protocol.blocks();
            let legacy_air = blocks.downgrade_runtime_id(self.latest.blocks.air());
            ensure!(
                legacy_air == blocks.mapping().air(),
                "protocol {}: latest air downgrades to {}, not {}",
                protocol.id(),
                legacy_air,
                blocks.mapping().air()
            );
            ensure!(
                blocks.upgrade_runtime_id(legacy_air) == self.latest.blocks.air(),
                "protocol {}: air does not upgrade back",
                protocol.id()
            );

            let items = protocol.items();
            for (runtime_id, item) in items.custom_items() {
                let original = items.upgrade_item_type(ItemType::new(runtime_id, 0));
                let back = items.downgrade_item_type(original);
                ensure!(
                    back.network_id == runtime_id,
                    "protocol {}: custom item {} does not round trip ({} -> {} -> {})",
                    protocol.id(),
                    item.encode_item().0,
                    runtime_id,
                    original.network_id,
                    back.network_id
                );
            }
        }
        info!("Self-check passed for {} translated protocols", self.protocols.len());
        Ok(())
    }
}

async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

async fn load_mappings(
    blocks: PathBuf,
    items: PathBuf,
    item_version: u16,
    upgrader: Arc<BlockUpgrader>,
) -> anyhow::Result<Mappings> {
    blocking(move || {
        let block_registry = BlockRegistry::from_catalogue(&read(&blocks)?, upgrader)
            .with_context(|| format!("block catalogue {}", blocks.display()))?;
        let item_registry = ItemRegistry::from_catalogue(&read(&items)?, item_version)
            .with_context(|| format!("item catalogue {}", items.display()))?;
        Ok(Mappings::new(Arc::new(block_registry), Arc::new(item_registry)))
    })
    .await
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use versa_mapping::state_to_nbt;
    use versa_nbt::{write_compound, NbtEncoding, NbtValue};
    use versa_types::BlockState;

    fn mappings(blocks: &[&str], items: &[(&str, i32)]) -> Mappings {
        let states = blocks.iter().map(|name| BlockState::new(*name)).collect();
        Mappings::new(
            Arc::new(BlockRegistry::from_states(states, Arc::new(BlockUpgrader::empty())).unwrap()),
            Arc::new(
                ItemRegistry::from_entries(items.iter().map(|(name, id)| (name.to_string(), *id)), 100).unwrap(),
            ),
        )
    }

    fn schemas() -> Schemas {
        Schemas {
            items: Arc::new(ItemSchemas::new()),
            crosswalk: Arc::new(ItemBlockCrosswalk::new()),
        }
    }

    fn protocol_config(id: i32) -> ProtocolConfig {
        ProtocolConfig {
            id,
            version: "1.19.80".into(),
            blocks: "blocks.nbt".into(),
            items: "items.nbt".into(),
            item_version: 100,
        }
    }

    fn relic() -> ConfiguredItem {
        ConfiguredItem::from_config(&CustomItemConfig {
            identifier: "versa:disc_relic".into(),
            name: "Relic".into(),
            replacement: "minecraft:music_disc_relic".into(),
            category: "items".into(),
            group: Some("record".into()),
            texture: "disc_relic".into(),
        })
        .unwrap()
    }

    fn state(custom_items: Vec<(ConfiguredItem, String)>) -> anyhow::Result<ServerState> {
        let latest = mappings(
            &["minecraft:stone", "minecraft:air"],
            &[("minecraft:air", 0), ("minecraft:music_disc_relic", 5)],
        );
        let legacy = mappings(&["minecraft:air", "minecraft:stone"], &[("minecraft:air", 0)]);
        ServerState::build(
            &VersaConfig::default(),
            latest,
            vec![(protocol_config(582), legacy)],
            schemas(),
            &[],
            custom_items,
        )
    }

    #[test]
    fn test_build_and_self_check() {
        let state = state(vec![(relic(), "minecraft:music_disc_relic".into())]).unwrap();
        state.self_check().unwrap();

        let ids: Vec<i32> = state.adapters().iter().map(|adapter| adapter.id()).collect();
        assert_eq!(ids, vec![671, 582]);
        assert_eq!(state.adapters()[1].version(), "1.19.80");
        assert_eq!(state.latest().items.item_name_to_runtime_id("minecraft:music_disc_relic"), Some(5));
    }

    #[test]
    fn test_unknown_replacement_fails() {
        let result = state(vec![(relic(), "minecraft:nothing".into())]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_category() {
        let config = CustomItemConfig {
            identifier: "versa:thing".into(),
            name: "Thing".into(),
            replacement: "minecraft:stick".into(),
            category: "snacks".into(),
            group: None,
            texture: "thing".into(),
        };
        assert!(ConfiguredItem::from_config(&config).is_err());
    }

    fn write_blocks(path: &Path, names: &[&str]) {
        let mut buf = bytes::BytesMut::new();
        for name in names {
            write_compound(&state_to_nbt(&BlockState::new(*name)), NbtEncoding::NetworkLittleEndian, &mut buf);
        }
        std::fs::write(path, &buf[..]).unwrap();
    }

    fn write_items(path: &Path, items: &[(&str, i32)]) {
        let root = NbtValue::Compound(
            items
                .iter()
                .map(|(name, id)| (name.to_string(), NbtValue::Int(*id)))
                .collect(),
        );
        let mut buf = bytes::BytesMut::new();
        write_compound(&root, NbtEncoding::NetworkLittleEndian, &mut buf);
        std::fs::write(path, &buf[..]).unwrap();
    }

    #[tokio::test]
    async fn test_load_with_custom_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = |name: &str| dir.path().join(name);
        std::fs::create_dir(path("block_states")).unwrap();
        std::fs::create_dir(path("items")).unwrap();
        std::fs::write(path("item_block_map.json"), "{}").unwrap();
        std::fs::write(path("legacy_block_states.bin"), [0u8]).unwrap();
        std::fs::write(
            path("custom_blocks.json"),
            r#"[{"name":"versa:ore","properties":[{"name":"depleted","enum":[false,true]}]}]"#,
        )
        .unwrap();

        write_blocks(&path("latest_blocks.nbt"), &["minecraft:air", "minecraft:stone"]);
        write_items(
            &path("latest_items.nbt"),
            &[("minecraft:air", 0), ("minecraft:music_disc_relic", 5), ("minecraft:stick", 6)],
        );
        write_blocks(&path("582_blocks.nbt"), &["minecraft:stone", "minecraft:air"]);
        write_items(&path("582_items.nbt"), &[("minecraft:air", 0), ("minecraft:stick", 1)]);
        write_blocks(&path("486_blocks.nbt"), &["minecraft:air"]);
        write_items(&path("486_items.nbt"), &[("minecraft:air", 0)]);

        let toml = format!(
            r#"
custom_blocks = '{dir}/custom_blocks.json'

[latest]
id = 671
version = "1.20.80"
blocks = '{dir}/latest_blocks.nbt'
items = '{dir}/latest_items.nbt'
item_version = 121

[schemas]
block_states = '{dir}/block_states'
items = '{dir}/items'
item_block_map = '{dir}/item_block_map.json'
legacy_block_states = '{dir}/legacy_block_states.bin'

[[protocols]]
id = 582
version = "1.19.80"
blocks = '{dir}/582_blocks.nbt'
items = '{dir}/582_items.nbt'
item_version = 111

[[protocols]]
id = 486
version = "1.18.12"
blocks = '{dir}/486_blocks.nbt'
items = '{dir}/486_items.nbt'
item_version = 81

[[custom_items]]
identifier = "versa:disc_relic"
name = "Relic"
replacement = "minecraft:music_disc_relic"
group = "record"
texture = "disc_relic"

[[custom_items]]
identifier = "versa:wand"
name = "Wand"
replacement = "minecraft:stick"
category = "equipment"
texture = "wand"
"#,
            dir = dir.path().display()
        );
        std::fs::write(path("versa.toml"), toml).unwrap();

        let config = VersaConfig::load(&path("versa.toml")).unwrap();
        let state = ServerState::load(&config).await.unwrap();
        state.self_check().unwrap();

        let ids: Vec<i32> = state.adapters().iter().map(|adapter| adapter.id()).collect();
        assert_eq!(ids, vec![671, 582, 486]);
        assert_eq!(state.latest().blocks.len(), 4);

        let ore = BlockState::new("versa:ore").with_property("depleted", true);
        let latest_ore = state.latest().blocks.state_to_runtime_id(&ore).unwrap();
        for (protocol, len, relic, wand) in [(&state.protocols[0], 4, 2, 3), (&state.protocols[1], 3, 1, 2)] {
            let blocks = protocol.blocks();
            assert_eq!(blocks.mapping().len(), len);
            let legacy_ore = blocks.downgrade_runtime_id(latest_ore);
            assert_eq!(blocks.mapping().runtime_id_to_state(legacy_ore), Some(ore.clone()));
            assert_eq!(blocks.upgrade_runtime_id(legacy_ore), latest_ore);

            let items = protocol.items();
            let registered: Vec<i32> = items.custom_items().iter().map(|(rid, _)| *rid).collect();
            assert_eq!(registered, vec![relic, wand]);
            assert_eq!(items.downgrade_item_type(ItemType::new(5, 0)).network_id, relic);
            assert_eq!(items.downgrade_item_type(ItemType::new(6, 0)).network_id, wand);
        }
    }
}
