pub mod error;
pub mod block;
pub mod custom;
pub mod item;
pub mod protocol;

pub use error::*;
pub use block::*;
pub use custom::*;
pub use item::*;
pub use protocol::*;

/// Which way a translator rewrites identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the latest ID space to a version's own.
    Downgrade,
    /// From a version's own ID space to the latest.
    Upgrade,
}
