//! Error messages
//!
//! - [`catalog`] - user messages and attribute labels keyed by `key$locale`
//! - [`tables`] - per-locale rule templates (`en` and `de` built in)
//! - [`resolver`] - picks and renders the message for a failure

pub mod catalog;
pub mod resolver;
pub mod tables;

pub use catalog::MessageCatalog;
pub use resolver::{MessageRequest, MessageResolver};
pub use tables::{LocaleTables, TableEntry};
