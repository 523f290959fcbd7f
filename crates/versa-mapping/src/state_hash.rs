use versa_types::{BlockState, PropertyValue};

/// A map key for block states: the name plus the property values packed in key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateHash {
    pub name: String,
    pub properties: Vec<u8>,
}

/// Produce the lookup key for a block state.
///
/// Values are appended in ascending property-name order: booleans as one 0/1 byte, bytes raw,
/// ints as four little-endian bytes, strings as raw UTF-8 with no delimiter.
pub fn hash_state(state: &BlockState) -> StateHash {
    let mut properties = Vec::new();
    for value in state.properties.values() {
        match value {
            PropertyValue::Bool(v) => properties.push(*v as u8),
            PropertyValue::Byte(v) => properties.push(*v),
            PropertyValue::Int(v) => properties.extend_from_slice(&v.to_le_bytes()),
            PropertyValue::String(v) => properties.extend_from_slice(v.as_bytes()),
        }
    }
    StateHash {
        name: state.name.clone(),
        properties,
    }
}

const FNV64_OFFSET: u64 = 0xcbf29ce484222325;
const FNV64_PRIME: u64 = 0x100000001b3;

/// 64-bit FNV-1 (multiply, then xor).
pub fn fnv1_64(data: &[u8]) -> u64 {
    let mut hash = FNV64_OFFSET;
    for &byte in data {
        hash = hash.wrapping_mul(FNV64_PRIME);
        hash ^= byte as u64;
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_properties_is_name_only() {
        let hash = hash_state(&BlockState::new("minecraft:air"));
        assert_eq!(hash.name, "minecraft:air");
        assert!(hash.properties.is_empty());
    }

    #[test]
    fn test_hash_order_independent() {
        let a = BlockState::new("minecraft:wool")
            .with_property("color", "red")
            .with_property("age", 3i32)
            .with_property("open_bit", true)
            .with_property("stage", 1u8);
        let b = BlockState::new("minecraft:wool")
            .with_property("stage", 1u8)
            .with_property("open_bit", true)
            .with_property("color", "red")
            .with_property("age", 3i32);
        assert_eq!(hash_state(&a), hash_state(&b));
        // age, color, open_bit, stage
        assert_eq!(hash_state(&a).properties, vec![3, 0, 0, 0, b'r', b'e', b'd', 1, 1]);
    }

    #[test]
    fn test_hash_distinguishes_values() {
        let a = BlockState::new("minecraft:lever").with_property("open_bit", false);
        let b = BlockState::new("minecraft:lever").with_property("open_bit", true);
        assert_ne!(hash_state(&a), hash_state(&b));
    }

    #[test]
    fn test_fnv1_64() {
        assert_eq!(fnv1_64(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1_64(b"a"), 0xaf63bd4c8601b7be);
    }
}
