use crate::ast::NodeId;
use crate::codegen::{emit, Compiler};
use crate::error::CompilerError;
use crate::expressions::ExpressionCompiler;
use crate::registers::Reg;
use crate::types::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Condition {
    pub fn suffix(self) -> &'static str {
        match self {
            Condition::Eq => "eq",
            Condition::Ne => "ne",
            Condition::Gt => "gt",
            Condition::Ge => "ge",
            Condition::Lt => "lt",
            Condition::Le => "le",
        }
    }

    pub fn negated(self) -> Self {
        match self {
            Condition::Eq => Condition::Ne,
            Condition::Ne => Condition::Eq,
            Condition::Gt => Condition::Le,
            Condition::Ge => Condition::Lt,
            Condition::Lt => Condition::Ge,
            Condition::Le => Condition::Gt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Compare(Condition),
    And,
    Or,
}

impl BinaryOp {
    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "=" => BinaryOp::Compare(Condition::Eq),
            "/=" => BinaryOp::Compare(Condition::Ne),
            ">" => BinaryOp::Compare(Condition::Gt),
            ">=" => BinaryOp::Compare(Condition::Ge),
            "<" => BinaryOp::Compare(Condition::Lt),
            "<=" => BinaryOp::Compare(Condition::Le),
            "AND" => BinaryOp::And,
            "OR" => BinaryOp::Or,
            _ => return None,
        })
    }

    /// `+` evaluates its left operand first, every other operator its right.
    fn left_first(self) -> bool {
        self == BinaryOp::Add
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortCircuit {
    AndThen,
    OrElse,
}

pub trait BinaryCompiler {
    fn compile_binary(&mut self, node: NodeId, op: BinaryOp, rd: Reg) -> Result<Value, CompilerError>;
    fn compile_short_circuit(
        &mut self,
        node: NodeId,
        kind: ShortCircuit,
        rd: Reg,
    ) -> Result<Value, CompilerError>;
    fn compile_not(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError>;
    fn compile_negation(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError>;
}

impl BinaryCompiler for Compiler<'_> {
    fn compile_binary(&mut self, node: NodeId, op: BinaryOp, rd: Reg) -> Result<Value, CompilerError> {
        let [lhs, rhs] = self.operands::<2>(node)?;
        let (first, second) = if op.left_first() { (lhs, rhs) } else { (rhs, lhs) };

        self.compile_scalar(first, rd)?;
        let other = self.acquire_scratch(Some(rd))?;
        let rs = other.reg();
        self.compile_scalar(second, rs)?;

        // From here on `rd` holds the left operand for `+` and the right
        // operand for everything else.
        match op {
            BinaryOp::Add => emit!(self, "add\t{rd}, {rd}, {rs}")?,
            BinaryOp::Sub => emit!(self, "sub\t{rd}, {rs}, {rd}")?,
            BinaryOp::Mul => self.call_runtime("mul", rd, rs)?,
            BinaryOp::Div => self.call_runtime("div", rd, rs)?,
            BinaryOp::Compare(cond) => {
                emit!(self, "cmp\t{rs}, {rd}")?;
                emit!(self, "mov{}\t{rd}, #1", cond.suffix())?;
                emit!(self, "mov{}\t{rd}, #0", cond.negated().suffix())?;
            }
            BinaryOp::And => emit!(self, "and\t{rd}, {rd}, {rs}")?,
            BinaryOp::Or => emit!(self, "orr\t{rd}, {rd}, {rs}")?,
        }

        self.release_scratch(other)?;
        Ok(Value::Scalar)
    }

    fn compile_short_circuit(
        &mut self,
        node: NodeId,
        kind: ShortCircuit,
        rd: Reg,
    ) -> Result<Value, CompilerError> {
        let [lhs, rhs] = self.operands::<2>(node)?;
        let (decided, join, combine) = match kind {
            ShortCircuit::AndThen => (0, format!("andthen{node}_end"), "and"),
            ShortCircuit::OrElse => (1, format!("orelse{node}_end"), "orr"),
        };

        self.compile_scalar(lhs, rd)?;
        // Acquired before the branch so a spill push happens on both paths.
        let other = self.acquire_scratch(Some(rd))?;
        let rs = other.reg();
        // Call blocks for the right operand are already on the data stack.
        // The short path has to drop them too.
        let skipped = self.calls_consumed_by(rhs)?;
        emit!(self, "cmp\t{rd}, #{decided}")?;
        if skipped.is_empty() {
            emit!(self, "beq\t{join}")?;
            self.compile_scalar(rhs, rs)?;
            emit!(self, "{combine}\t{rd}, {rd}, {rs}")?;
        } else {
            let skip = format!("{join}_skip");
            emit!(self, "beq\t{skip}")?;
            self.compile_scalar(rhs, rs)?;
            emit!(self, "{combine}\t{rd}, {rd}, {rs}")?;
            emit!(self, "b\t{join}")?;
            self.emit_label(&skip)?;
            for (bytes, finished_at) in skipped {
                self.reclaim_call_block(bytes, finished_at)?;
            }
        }
        self.emit_label(&join)?;
        self.release_scratch(other)?;
        Ok(Value::Scalar)
    }

    fn compile_not(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError> {
        let [operand] = self.operands::<1>(node)?;
        self.compile_scalar(operand, rd)?;
        emit!(self, "rsb\t{rd}, {rd}, #1")?;
        Ok(Value::Scalar)
    }

    fn compile_negation(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError> {
        let [operand] = self.operands::<1>(node)?;
        self.compile_scalar(operand, rd)?;
        emit!(self, "rsb\t{rd}, {rd}, #0")?;
        Ok(Value::Scalar)
    }
}

impl Compiler<'_> {
    /// Calls `mul`/`div` with `rs` (left) and `rd` (right) as its two
    /// parameter words and leaves the result in `rd`.
    fn call_runtime(&mut self, routine: &str, rd: Reg, rs: Reg) -> Result<(), CompilerError> {
        emit!(self, "stmfd\tr13!, {{{rd}}}")?;
        emit!(self, "stmfd\tr13!, {{{rs}}}")?;
        emit!(self, "sub\tr13, r13, #4")?;
        emit!(self, "bl\t{routine}")?;
        emit!(self, "ldr\t{rd}, [r13]")?;
        emit!(self, "add\tr13, r13, #12 ; two parameters and the result")?;
        Ok(())
    }
}
