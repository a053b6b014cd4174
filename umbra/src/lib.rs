//! umbra is a structured logging core: records flow from application
//! threads through a filter, scoped-attribute collection and a set of
//! handlers, each of which renders once and fans out to its sinks.

pub mod attribute;
pub mod config;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod handler;
pub mod logger;
pub mod record;
pub mod registry;
pub mod scope;
pub mod sink;
pub mod utils;

pub use crate::error::{EmitError, Error};
pub use crate::logger::{Logger, Wrapper};
pub use crate::record::{OwnedRecord, Record, Severity};
pub use crate::registry::{Builder, Registry};
