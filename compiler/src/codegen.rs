use std::collections::HashMap;

use resolve::{RegionId, SymbolTable};
use tracing::debug;

use crate::ast::{Ast, Node, NodeId};
use crate::error::CompilerError;
use crate::frame::{Fragment, ScopeFrame};
use crate::registers::Reg;
use crate::types::{Initializer, PendingCall, Scratch};

/// `emit!(compiler, "add\t{}, {}, {}", rd, rd, rs)` appends one instruction
/// line to the open scope's active section.
macro_rules! emit {
    ($c:expr, $($arg:tt)*) => {
        $c.emit(format!($($arg)*))
    };
}
pub(crate) use emit;

/// The code generation engine.
///
/// Driven from outside by an AST walk (or [`crate::replay`]): every entry
/// point emits into the innermost open scope.
pub struct Compiler<'a> {
    pub(crate) ast: &'a Ast,
    pub(crate) symbols: &'a SymbolTable,

    /// Open scopes, outermost first.
    pub(crate) frames: Vec<ScopeFrame>,
    /// Pending initializers, parallel to `frames`; `None` once consumed.
    pub(crate) initializers: Vec<Option<Vec<(String, Initializer)>>>,
    /// Parameter-byte counters of live calls.
    pub(crate) calls: Vec<PendingCall>,
    /// Composed scopes in completion order.
    pub(crate) completed: Vec<String>,

    /// Code label of every body generated so far, by the region it opens.
    pub(crate) labels: HashMap<RegionId, String>,
    /// Next instance id per declared name.
    pub(crate) instances: HashMap<String, u32>,
}

impl<'a> Compiler<'a> {
    pub fn new(ast: &'a Ast, symbols: &'a SymbolTable) -> Self {
        Self {
            ast,
            symbols,
            frames: Vec::new(),
            initializers: Vec::new(),
            calls: Vec::new(),
            completed: Vec::new(),
            labels: HashMap::new(),
            instances: HashMap::new(),
        }
    }

    pub(crate) fn current(&mut self) -> Result<&mut ScopeFrame, CompilerError> {
        self.frames.last_mut().ok_or(CompilerError::NoOpenScope)
    }

    pub(crate) fn current_ref(&self) -> Result<&ScopeFrame, CompilerError> {
        self.frames.last().ok_or(CompilerError::NoOpenScope)
    }

    /// Region of the innermost open scope.
    pub fn region(&self) -> Result<RegionId, CompilerError> {
        Ok(self.current_ref()?.region)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Registers borrowed in the innermost scope right now.
    pub fn live_registers(&self) -> usize {
        self.frames.last().map_or(0, |f| f.registers.in_use())
    }

    /// Spill words of the innermost scope still on the data stack.
    pub fn live_spills(&self) -> u32 {
        self.frames.last().map_or(0, |f| f.spilled)
    }

    /// Composed text of every closed scope, in completion order.
    pub fn completed_blocks(&self) -> &[String] {
        &self.completed
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&'a Node, CompilerError> {
        self.ast.get(id)
    }

    /// Children of `id`, which must be exactly `N`.
    pub(crate) fn operands<const N: usize>(&self, id: NodeId) -> Result<[NodeId; N], CompilerError> {
        let node = self.node(id)?;
        <[NodeId; N]>::try_from(node.children.as_slice()).map_err(|_| {
            CompilerError::malformed(
                id,
                &node.label,
                format!("expected {N} operand(s), found {}", node.children.len()),
            )
        })
    }

    pub(crate) fn emit(&mut self, line: String) -> Result<(), CompilerError> {
        self.current()?.push(Fragment::Text(format!("\t{line}\n")));
        Ok(())
    }

    pub(crate) fn emit_label(&mut self, label: &str) -> Result<(), CompilerError> {
        self.current()?.push(Fragment::Text(format!("{label}\n")));
        Ok(())
    }

    /// Instruction whose immediate is `save_bytes + extra`.
    pub(crate) fn emit_deferred(&mut self, prefix: String, extra: i32, suffix: &str) -> Result<(), CompilerError> {
        self.current()?.push(Fragment::Deferred {
            prefix: format!("\t{prefix}"),
            extra,
            suffix: format!("{suffix}\n"),
        });
        Ok(())
    }

    /// Borrows a register, spilling one to the data stack when the pool is
    /// exhausted. The victim is never `avoid`.
    pub(crate) fn acquire_scratch(&mut self, avoid: Option<Reg>) -> Result<Scratch, CompilerError> {
        match self.current()?.registers.acquire() {
            Some(reg) => Ok(Scratch::Pooled(reg)),
            None => self.spill(avoid),
        }
    }

    pub(crate) fn spill(&mut self, avoid: Option<Reg>) -> Result<Scratch, CompilerError> {
        let victim = if avoid == Some(Reg(0)) { Reg(1) } else { Reg(0) };
        debug!(%victim, "register pool exhausted, spilling");
        emit!(self, "stmfd\tr13!, {{{victim}}} ; spill")?;
        self.current()?.spilled += 1;
        Ok(Scratch::Spilled(victim))
    }

    pub(crate) fn release_scratch(&mut self, scratch: Scratch) -> Result<(), CompilerError> {
        match scratch {
            Scratch::Pooled(reg) => self.current()?.registers.release(reg),
            Scratch::Spilled(reg) => {
                emit!(self, "ldmfd\tr13!, {{{reg}}} ; restore")?;
                let frame = self.current()?;
                frame.spilled = frame.spilled.saturating_sub(1);
            }
        }
        Ok(())
    }
}
