//! Command implementations.

pub mod ask;
pub mod config;
pub mod corpus;

pub use self::ask::execute_ask;
pub use self::config::execute_config;
pub use self::corpus::execute_corpus;
