//! ARM code generation for an Ada subset.
//!
//! The [`Compiler`] is driven scope by scope: `enter_scope`, variable
//! declarations, statements, calls, `close_scope`. Each concern lives in its
//! own trait implemented on the engine, so bring the traits into scope with
//! `use compiler::prelude::*`.

pub mod ast;
pub mod codegen;
pub mod control_flow;
pub mod error;
pub mod expressions;
pub mod frame;
pub mod functions;
pub mod output;
pub mod records;
pub mod registers;
pub mod replay;
pub mod runtime;
pub mod scopes;
pub mod statements;
pub mod types;

pub use ast::{Ast, Node, NodeId};
pub use codegen::Compiler;
pub use error::CompilerError;
pub use output::{AssetPaths, Assets};
pub use replay::{replay, CompilationUnit, Event};
pub use types::{CallSite, ForTicket, IfTicket, Initializer, Scratch, ScopeTicket, Value, WhileTicket};

pub mod prelude {
    pub use crate::control_flow::ControlFlowCompiler;
    pub use crate::expressions::{AtomCompiler, BinaryCompiler, ExpressionCompiler};
    pub use crate::functions::CallCompiler;
    pub use crate::records::RecordCompiler;
    pub use crate::scopes::ScopeCompiler;
    pub use crate::statements::{DeclarationCompiler, StatementCompiler};
}
