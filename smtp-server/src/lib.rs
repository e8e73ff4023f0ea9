mod config;
mod crlflines;
mod decision;
mod interact;
mod metadata;
pub mod reply;
mod sendreply;

pub use config::{Config, Session};
pub use decision::Decision;
pub use interact::interact;
pub use metadata::{ConnectionMetadata, HelloInfo};
