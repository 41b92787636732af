//! Symbol regions and address resolution for the adasm backend.
//!
//! The symbol table itself is built by the front end; this crate only models
//! it and answers the one question code generation keeps asking: where does a
//! dotted access path live relative to the current frame?

pub mod access;
pub mod error;
pub mod layout;
pub mod symbols;

pub use access::{Access, Anchor, Shape};
pub use error::ResolveError;
pub use layout::{FieldLayout, RecordLayout};
pub use symbols::{Callable, CallableKind, Field, RecordType, Region, RegionId, Slot, Symbol, SymbolTable, WORD};
