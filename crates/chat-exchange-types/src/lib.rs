// chat-exchange-types: Layer 1. Content model, conversation entities, data-URI codec, errors.
#![allow(clippy::result_large_err)]

pub mod config;
pub mod content;
pub mod data_uri;
pub mod embedding;
pub mod error;
pub mod message;
pub mod options;
pub mod property_bag;
pub mod provider;
pub mod response;
pub mod update;
pub mod usage;

pub use config::*;
pub use content::*;
pub use embedding::*;
pub use error::*;
pub use message::*;
pub use options::*;
pub use property_bag::*;
pub use provider::*;
pub use response::*;
pub use update::*;
pub use usage::*;
