/// Base game version of worlds that still use the pre-1.18 chunk framing.
pub const LEGACY_CHUNK_GAME_VERSION: &str = "1.17.40";

/// Per-connection facts the translators need when rewriting packets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionState {
    /// Base game version announced in the start-game packet.
    pub base_game_version: String,
    /// Whether the client negotiated the blob cache.
    pub client_cache_enabled: bool,
}

impl ConnectionState {
    pub fn new(base_game_version: impl Into<String>, client_cache_enabled: bool) -> Self {
        Self {
            base_game_version: base_game_version.into(),
            client_cache_enabled,
        }
    }

    /// Chunks for this connection use the 2-D biome framing and the 0..255 height range.
    pub fn legacy_chunk_format(&self) -> bool {
        self.base_game_version == LEGACY_CHUNK_GAME_VERSION
    }
}
