/// NBT tag type IDs.
pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// An NBT value. Compounds keep their entries in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn tag_id(&self) -> u8 {
        match self {
            NbtValue::Byte(_) => TAG_BYTE,
            NbtValue::Short(_) => TAG_SHORT,
            NbtValue::Int(_) => TAG_INT,
            NbtValue::Long(_) => TAG_LONG,
            NbtValue::Float(_) => TAG_FLOAT,
            NbtValue::Double(_) => TAG_DOUBLE,
            NbtValue::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtValue::String(_) => TAG_STRING,
            NbtValue::List(_) => TAG_LIST,
            NbtValue::Compound(_) => TAG_COMPOUND,
            NbtValue::IntArray(_) => TAG_INT_ARRAY,
            NbtValue::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// An empty compound.
    pub fn compound() -> Self {
        NbtValue::Compound(Vec::new())
    }

    /// Look up a key in a compound. Returns None for non-compounds.
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        match self {
            NbtValue::Compound(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut NbtValue> {
        match self {
            NbtValue::Compound(entries) => entries
                .iter_mut()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Insert or replace a key in a compound. Does nothing for non-compounds.
    pub fn insert(&mut self, key: impl Into<String>, value: NbtValue) {
        if let NbtValue::Compound(entries) = self {
            let key = key.into();
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => *existing = value,
                None => entries.push((key, value)),
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NbtValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            NbtValue::Byte(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of any integral tag no wider than 32 bits.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            NbtValue::Byte(v) => Some(*v as i32),
            NbtValue::Short(v) => Some(*v as i32),
            NbtValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[NbtValue]> {
        match self {
            NbtValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&[(String, NbtValue)]> {
        match self {
            NbtValue::Compound(v) => Some(v),
            _ => None,
        }
    }
}

/// Helper macro for building compound tags.
#[macro_export]
macro_rules! nbt_compound {
    ($($key:expr => $val:expr),* $(,)?) => {
        $crate::NbtValue::Compound(vec![
            $(($key.into(), $val)),*
        ])
    };
}

/// Helper macro for building list tags.
#[macro_export]
macro_rules! nbt_list {
    ($($val:expr),* $(,)?) => {
        $crate::NbtValue::List(vec![$($val),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compound_accessors() {
        let nbt = nbt_compound! {
            "name" => NbtValue::String("minecraft:stone".into()),
            "version" => NbtValue::Int(18_090_528),
            "flag" => NbtValue::Byte(1),
        };
        assert_eq!(nbt.get("name").and_then(NbtValue::as_str), Some("minecraft:stone"));
        assert_eq!(nbt.get("version").and_then(NbtValue::as_int), Some(18_090_528));
        assert_eq!(nbt.get("flag").and_then(NbtValue::as_int), Some(1));
        assert!(nbt.get("missing").is_none());
        assert!(NbtValue::Int(3).get("name").is_none());
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut nbt = NbtValue::compound();
        nbt.insert("a", NbtValue::Int(1));
        nbt.insert("b", NbtValue::Int(2));
        nbt.insert("a", NbtValue::Int(3));
        let entries = nbt.as_compound().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("a".to_string(), NbtValue::Int(3)));
    }

    #[test]
    fn test_list_macro() {
        let list = nbt_list![NbtValue::Int(1), NbtValue::Int(2)];
        assert_eq!(list.tag_id(), TAG_LIST);
        assert_eq!(list.as_list().map(|l| l.len()), Some(2));
    }
}
