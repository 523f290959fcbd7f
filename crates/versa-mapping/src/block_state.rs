use crate::{MappingError, MappingResult};
use versa_nbt::NbtValue;
use versa_types::{BlockState, PropertyValue};

/// Read a `{name, states, version}` compound.
pub fn state_from_nbt(nbt: &NbtValue) -> MappingResult<BlockState> {
    let name = nbt
        .get("name")
        .and_then(NbtValue::as_str)
        .ok_or_else(|| MappingError::MalformedEntry("block state without a name".into()))?;
    let mut state = BlockState::new(name);
    if let Some(states) = nbt.get("states") {
        let entries = states.as_compound().ok_or_else(|| {
            MappingError::MalformedEntry(format!("states of {} is not a compound", name))
        })?;
        for (key, value) in entries {
            let value = PropertyValue::from_nbt(value).ok_or_else(|| MappingError::UnsupportedProperty {
                block: name.to_string(),
                property: key.clone(),
                tag: value.tag_id(),
            })?;
            state.properties.insert(key.clone(), value);
        }
    }
    state.version = nbt.get("version").and_then(NbtValue::as_int).unwrap_or(0);
    Ok(state)
}

/// Write a state as a `{name, states, version}` compound.
pub fn state_to_nbt(state: &BlockState) -> NbtValue {
    state_to_nbt_named(state, &state.name)
}

/// Like `state_to_nbt` but with an explicit name, for encodings that shorten it.
pub fn state_to_nbt_named(state: &BlockState, name: &str) -> NbtValue {
    let states = state
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), v.to_nbt()))
        .collect();
    NbtValue::Compound(vec![
        ("name".into(), NbtValue::String(name.to_string())),
        ("states".into(), NbtValue::Compound(states)),
        ("version".into(), NbtValue::Int(state.version)),
    ])
}
