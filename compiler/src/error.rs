use std::path::PathBuf;

use resolve::{RegionId, ResolveError};

use crate::ast::NodeId;

/// Every way a generation run can fail. None of them is recoverable: the
/// run aborts and no assembly is written.
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("node #{0} does not exist")]
    UnknownNode(NodeId),

    #[error("unsupported expression `{label}` at node #{node}")]
    UnsupportedExpression { node: NodeId, label: String },

    #[error("malformed `{label}` node #{node}: {detail}")]
    MalformedNode {
        node: NodeId,
        label: String,
        detail: String,
    },

    #[error("node #{0} yields a record where a single word is required")]
    NotScalar(NodeId),

    #[error("cannot assign between a record and a single word at node #{0}")]
    ShapeMismatch(NodeId),

    #[error("no scope is open")]
    NoOpenScope,

    #[error("closing `{found}` but `{expected}` is the innermost open scope")]
    ScopeMismatch { expected: String, found: String },

    #[error("`{scope}` is nested in region {father}, which has no open scope")]
    FatherNotOpen { scope: String, father: RegionId },

    #[error("{0} scope(s) still open")]
    UnclosedScopes(usize),

    #[error("variables of `{0}` were already declared")]
    VariablesAlreadyDeclared(String),

    #[error("`{0}` is not a variable of the current scope")]
    NotALocal(String),

    #[error("`{0}` has no generated body to branch to")]
    UnknownCallable(String),

    #[error("function `{0}` must return a single word")]
    RecordReturn(String),

    #[error("call result requested at node #{0} with no finished call")]
    NoPendingCall(NodeId),

    #[error("call sequence for `{0}` is out of order")]
    CallMismatch(String),

    #[error("{0} call(s) never retrieved their result")]
    DanglingCalls(usize),

    #[error("`return` outside of a function")]
    ReturnOutsideFunction,

    #[error("{0} block closed out of order")]
    ControlMismatch(&'static str),

    #[error("event stream is unbalanced: {0}")]
    UnbalancedEvent(&'static str),

    #[error("failed to read asset {path}: {source}")]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CompilerError {
    pub(crate) fn malformed(node: NodeId, label: &str, detail: impl Into<String>) -> Self {
        CompilerError::MalformedNode {
            node,
            label: label.to_string(),
            detail: detail.into(),
        }
    }
}
