use crate::{ConnectionState, Packet};

/// A protocol version the server can speak.
///
/// Adapters rewrite packets between the version's own ID spaces and the latest ones.
/// A single packet may expand to several, or to none.
pub trait ProtocolAdapter: Send + Sync {
    /// The protocol number this adapter handles.
    fn id(&self) -> i32;

    /// The game version string, e.g. "1.20.73".
    fn version(&self) -> &str;

    /// Rewrite a packet received from a client of this version.
    fn convert_to_latest(&self, packet: Packet, conn: &ConnectionState) -> Vec<Packet>;

    /// Rewrite a packet the server wants to send to a client of this version.
    fn convert_from_latest(&self, packet: Packet, conn: &ConnectionState) -> Vec<Packet>;
}
