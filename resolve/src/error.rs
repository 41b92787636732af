use crate::symbols::RegionId;

/// Failures raised while looking up symbols or laying out types.
///
/// All of them are fatal for code generation: the front end promised a
/// consistent symbol table, so a miss here means the input is broken.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The walk reached the outermost region without finding the name.
    #[error("unresolved identifier `{0}`")]
    UnresolvedIdentifier(String),
    /// A region id that the table does not contain.
    #[error("unknown region {0}")]
    UnknownRegion(RegionId),
    /// A type name with no size entry and no visible record declaration.
    #[error("unknown type `{0}`")]
    UnknownType(String),
    /// A field name the record does not declare.
    #[error("record `{record}` has no field `{field}`")]
    UnknownField { record: String, field: String },
    /// Field access (or a multi-word value) on a type that is not a record.
    #[error("type `{ty}` is not a record")]
    NotARecord { ty: String },
    /// The base of an access path is a callable or a type, not storage.
    #[error("`{0}` does not name a variable or parameter")]
    NotAddressable(String),
    /// The name resolves, but not to a function or procedure.
    #[error("`{0}` is not a function or procedure")]
    NotCallable(String),
    /// A record type that (transitively) contains itself.
    #[error("record type `{0}` contains itself")]
    RecursiveRecord(String),
    /// The declaring region is nested deeper than the region looking at it.
    #[error("region {from} (level {from_level}) cannot reach region {to} (level {to_level})")]
    InvalidNesting {
        from: RegionId,
        from_level: u32,
        to: RegionId,
        to_level: u32,
    },
    #[error("empty access path")]
    EmptyPath,
}
