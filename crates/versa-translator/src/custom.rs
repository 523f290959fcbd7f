use versa_nbt::{nbt_compound, NbtValue};

/// Creative inventory tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreativeCategory {
    Construction = 1,
    Nature = 2,
    Equipment = 3,
    Items = 4,
}

impl CreativeCategory {
    pub fn name(&self) -> &'static str {
        match self {
            CreativeCategory::Construction => "construction",
            CreativeCategory::Nature => "nature",
            CreativeCategory::Equipment => "equipment",
            CreativeCategory::Items => "items",
        }
    }
}

impl std::str::FromStr for CreativeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "construction" => Ok(CreativeCategory::Construction),
            "nature" => Ok(CreativeCategory::Nature),
            "equipment" => Ok(CreativeCategory::Equipment),
            "items" => Ok(CreativeCategory::Items),
            other => Err(format!("unknown creative category {}", other)),
        }
    }
}

/// Where a custom item shows up in the creative inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub category: CreativeCategory,
    /// Collapsible group inside the tab.
    pub group: Option<String>,
}

impl Category {
    pub fn new(category: CreativeCategory) -> Self {
        Self { category, group: None }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// The group as the client names it, empty without one.
    pub fn group_name(&self) -> String {
        self.group
            .as_ref()
            .map(|group| format!("itemGroup.name.{}", group))
            .unwrap_or_default()
    }
}

/// A server-defined item that older clients see in place of a vanilla one.
pub trait CustomItem: Send + Sync {
    /// Identifier and metadata the item is sent with.
    fn encode_item(&self) -> (String, i16);

    /// Display name.
    fn name(&self) -> String;

    /// Texture shortname in the resource pack's item atlas.
    fn texture(&self) -> String;

    fn category(&self) -> Category;
}

/// Component data announcing a custom item to the client.
pub fn components(item: &dyn CustomItem) -> NbtValue {
    let category = item.category();
    nbt_compound! {
        "components" => nbt_compound! {
            "item_properties" => nbt_compound! {
                "minecraft:icon" => nbt_compound! {
                    "texture" => NbtValue::String(item.texture()),
                },
                "creative_group" => NbtValue::String(category.group_name()),
                "creative_category" => NbtValue::Int(category.category as i32),
                "max_stack_size" => NbtValue::Int(64),
            },
            "minecraft:display_name" => nbt_compound! {
                "value" => NbtValue::String(item.name()),
            },
        },
    }
}
