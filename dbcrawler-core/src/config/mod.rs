//! Configuration for connections and layered properties.

pub mod connection;
pub mod properties;

pub use connection::ConnectionConfig;
pub use properties::{PropertyBag, PropertyLayer};
