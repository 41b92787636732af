use resolve::{CallableKind, RecordLayout, RegionId};

use crate::ast::NodeId;
use crate::registers::Reg;

/// A borrowed register. `Spilled` registers had their previous contents
/// pushed on the data stack and get them back on release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scratch {
    Pooled(Reg),
    Spilled(Reg),
}

impl Scratch {
    pub fn reg(&self) -> Reg {
        match *self {
            Scratch::Pooled(r) | Scratch::Spilled(r) => r,
        }
    }
}

/// What an evaluated expression left in its destination register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar,
    /// Address of a multi-word record.
    Aggregate(RecordLayout),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initializer {
    Zero,
    Expr(NodeId),
}

/// Proof of an open scope, handed back to `close_scope`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a scope ticket must be passed to close_scope"]
pub struct ScopeTicket {
    pub name: String,
    pub instance: u32,
    pub region: RegionId,
    pub(crate) depth: usize,
}

impl ScopeTicket {
    pub fn label(&self) -> String {
        format!("{}{}", self.name, self.instance)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    Label(String),
    Builtin(&'static str),
}

/// One outgoing call being staged.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a call site must be passed to finish_call"]
pub struct CallSite {
    pub callee: String,
    pub kind: CallableKind,
    pub(crate) target: Target,
    pub(crate) slot: usize,
}

/// Parameter-byte counter of a live call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PendingCall {
    pub bytes: u32,
    /// Spill depth of the frame when the callee returned.
    pub finished_at: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct IfTicket {
    pub(crate) id: NodeId,
    pub(crate) arm: u32,
    pub(crate) has_else: bool,
    pub(crate) depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct WhileTicket {
    pub(crate) id: NodeId,
    pub(crate) depth: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct ForTicket {
    pub(crate) id: NodeId,
    pub(crate) counter: NodeId,
    pub(crate) reverse: bool,
    pub(crate) depth: usize,
}
