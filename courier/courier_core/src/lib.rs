//! # Courier Core
//!
//! `courier_core` provides the building blocks shared by the Courier actor
//! runtime and its tools: the error hierarchy, the message payload type, a
//! path-addressable structured store, and logging helpers.
//!
//! ## Crate Structure
//!
//! - **error**: Error types for all Courier components
//! - **value**: The [`Value`] payload type and the [`Message`] alias
//! - **store**: Path-addressable structured data handed to actors
//! - **utils**: Log level handling
//! - **macros**: `log_event!` and `message!`

pub mod error;
pub mod macros;
pub mod store;
pub mod utils;
pub mod value;

pub use error::{ActorError, Error, RegistryError, Result, RouteError, StoreError};
pub use store::{FromValue, Store};
pub use utils::LogLevel;
pub use value::{Message, Value};

#[doc(hidden)]
pub use log as __log;
