use resolve::Shape;

use crate::ast::NodeId;
use crate::codegen::{emit, Compiler};
use crate::error::CompilerError;
use crate::expressions::ExpressionCompiler;
use crate::registers::Reg;
use crate::scopes::ScopeCompiler;
use crate::types::{ForTicket, IfTicket, WhileTicket};

/// Structured statements. The driver emits the bodies between the calls.
///
/// Labels derive from the id of the `IF`/`WHILE`/`FOR` node, so every
/// construct gets its own.
pub trait ControlFlowCompiler {
    /// `IF` node whose first child is the condition.
    fn begin_if(&mut self, node: NodeId) -> Result<IfTicket, CompilerError>;
    fn elsif(&mut self, ticket: &mut IfTicket, condition: NodeId) -> Result<(), CompilerError>;
    fn otherwise(&mut self, ticket: &mut IfTicket) -> Result<(), CompilerError>;
    fn end_if(&mut self, ticket: IfTicket) -> Result<(), CompilerError>;

    /// `WHILE` node whose first child is the condition.
    fn begin_while(&mut self, node: NodeId) -> Result<WhileTicket, CompilerError>;
    fn end_while(&mut self, ticket: WhileTicket) -> Result<(), CompilerError>;

    /// `FOR` node with children `[counter, low, high]` or
    /// `[counter, REVERSE, low, high]`.
    fn begin_for(&mut self, node: NodeId) -> Result<ForTicket, CompilerError>;
    fn end_for(&mut self, ticket: ForTicket) -> Result<(), CompilerError>;
}

impl ControlFlowCompiler for Compiler<'_> {
    fn begin_if(&mut self, node: NodeId) -> Result<IfTicket, CompilerError> {
        let condition = self.first_child(node)?;
        let ticket = IfTicket {
            id: node,
            arm: 1,
            has_else: false,
            depth: self.depth(),
        };
        self.branch_unless(condition, &format!("if{node}_{}", ticket.arm))?;
        Ok(ticket)
    }

    fn elsif(&mut self, ticket: &mut IfTicket, condition: NodeId) -> Result<(), CompilerError> {
        self.check_depth(ticket.depth, "if")?;
        if ticket.has_else {
            return Err(CompilerError::ControlMismatch("elsif"));
        }
        let id = ticket.id;
        emit!(self, "b\tif{id}_end")?;
        self.emit_label(&format!("if{id}_{}", ticket.arm))?;
        ticket.arm += 1;
        self.branch_unless(condition, &format!("if{id}_{}", ticket.arm))
    }

    fn otherwise(&mut self, ticket: &mut IfTicket) -> Result<(), CompilerError> {
        self.check_depth(ticket.depth, "if")?;
        if ticket.has_else {
            return Err(CompilerError::ControlMismatch("else"));
        }
        let id = ticket.id;
        emit!(self, "b\tif{id}_end")?;
        self.emit_label(&format!("if{id}_{}", ticket.arm))?;
        ticket.has_else = true;
        Ok(())
    }

    fn end_if(&mut self, ticket: IfTicket) -> Result<(), CompilerError> {
        self.check_depth(ticket.depth, "if")?;
        let id = ticket.id;
        if !ticket.has_else {
            self.emit_label(&format!("if{id}_{}", ticket.arm))?;
        }
        self.emit_label(&format!("if{id}_end"))
    }

    fn begin_while(&mut self, node: NodeId) -> Result<WhileTicket, CompilerError> {
        let condition = self.first_child(node)?;
        self.emit_label(&format!("while{node}_start"))?;
        self.branch_unless(condition, &format!("while{node}_end"))?;
        Ok(WhileTicket {
            id: node,
            depth: self.depth(),
        })
    }

    fn end_while(&mut self, ticket: WhileTicket) -> Result<(), CompilerError> {
        self.check_depth(ticket.depth, "while")?;
        let id = ticket.id;
        emit!(self, "b\twhile{id}_start")?;
        self.emit_label(&format!("while{id}_end"))
    }

    fn begin_for(&mut self, node: NodeId) -> Result<ForTicket, CompilerError> {
        let children = &self.node(node)?.children;
        let (counter, reverse, low, high) = match children.as_slice() {
            [counter, low, high] => (*counter, false, *low, *high),
            [counter, flag, low, high] if self.node(*flag)?.label == "REVERSE" => {
                (*counter, true, *low, *high)
            }
            _ => {
                return Err(CompilerError::malformed(
                    node,
                    "FOR",
                    "expected [counter, low, high] or [counter, REVERSE, low, high]",
                ))
            }
        };
        let (from, to) = if reverse { (high, low) } else { (low, high) };

        // counter := from
        let value = self.acquire_scratch(None)?;
        self.compile_scalar(from, value.reg())?;
        let addr = self.acquire_scratch(Some(value.reg()))?;
        self.counter_address(counter, addr.reg())?;
        emit!(self, "str\t{}, [{}]", value.reg(), addr.reg())?;
        self.release_scratch(addr)?;
        self.release_scratch(value)?;

        self.emit_label(&format!("for{node}_start"))?;
        let current = self.acquire_scratch(None)?;
        self.counter_address(counter, current.reg())?;
        emit!(self, "ldr\t{0}, [{0}]", current.reg())?;
        let bound = self.acquire_scratch(Some(current.reg()))?;
        self.compile_scalar(to, bound.reg())?;
        emit!(self, "cmp\t{}, {}", current.reg(), bound.reg())?;
        self.release_scratch(bound)?;
        self.release_scratch(current)?;
        let exit = if reverse { "blt" } else { "bgt" };
        emit!(self, "{exit}\tfor{node}_end")?;

        Ok(ForTicket {
            id: node,
            counter,
            reverse,
            depth: self.depth(),
        })
    }

    fn end_for(&mut self, ticket: ForTicket) -> Result<(), CompilerError> {
        self.check_depth(ticket.depth, "for")?;
        let id = ticket.id;
        let addr = self.acquire_scratch(None)?;
        let value = self.acquire_scratch(Some(addr.reg()))?;
        let (a, v) = (addr.reg(), value.reg());
        self.counter_address(ticket.counter, a)?;
        emit!(self, "ldr\t{v}, [{a}]")?;
        let step = if ticket.reverse { "sub" } else { "add" };
        emit!(self, "{step}\t{v}, {v}, #1")?;
        emit!(self, "str\t{v}, [{a}]")?;
        self.release_scratch(value)?;
        self.release_scratch(addr)?;
        emit!(self, "b\tfor{id}_start")?;
        self.emit_label(&format!("for{id}_end"))
    }
}

impl Compiler<'_> {
    fn first_child(&self, node: NodeId) -> Result<NodeId, CompilerError> {
        let n = self.node(node)?;
        n.children
            .first()
            .copied()
            .ok_or_else(|| CompilerError::malformed(node, &n.label, "missing condition"))
    }

    /// Evaluates `condition` and jumps to `target` when it is false.
    fn branch_unless(&mut self, condition: NodeId, target: &str) -> Result<(), CompilerError> {
        let scratch = self.acquire_scratch(None)?;
        let reg = scratch.reg();
        self.compile_scalar(condition, reg)?;
        emit!(self, "cmp\t{reg}, #0")?;
        self.release_scratch(scratch)?;
        emit!(self, "beq\t{target}")
    }

    fn counter_address(&mut self, counter: NodeId, rd: Reg) -> Result<(), CompilerError> {
        let path = self.access_path(counter)?;
        match self.emit_address(&path, rd)? {
            Shape::Word => Ok(()),
            Shape::Record(_) => Err(CompilerError::NotScalar(counter)),
        }
    }

    fn check_depth(&self, depth: usize, construct: &'static str) -> Result<(), CompilerError> {
        if depth == self.depth() {
            Ok(())
        } else {
            Err(CompilerError::ControlMismatch(construct))
        }
    }
}
