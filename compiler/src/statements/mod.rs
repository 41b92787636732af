use resolve::{CallableKind, Shape};
use tracing::trace;

use crate::ast::NodeId;
use crate::codegen::{emit, Compiler};
use crate::error::CompilerError;
use crate::expressions::ExpressionCompiler;
use crate::records::RecordCompiler;
use crate::registers::Reg;
use crate::scopes::ScopeCompiler;
use crate::types::Value;

pub mod declarations;

pub use declarations::DeclarationCompiler;

pub trait StatementCompiler {
    /// `:=` or `RETURN`, by label.
    fn compile_statement(&mut self, node: NodeId) -> Result<(), CompilerError>;
    /// `:=` with children `[target, value]`.
    fn compile_assignment(&mut self, node: NodeId) -> Result<(), CompilerError>;
    /// `RETURN` with one child. Only legal in a function body.
    fn compile_return(&mut self, node: NodeId) -> Result<(), CompilerError>;
}

impl StatementCompiler for Compiler<'_> {
    fn compile_statement(&mut self, node: NodeId) -> Result<(), CompilerError> {
        let label = self.node(node)?.label.as_str();
        trace!(%node, label, "statement");
        match label {
            ":=" => self.compile_assignment(node),
            "RETURN" => self.compile_return(node),
            _ => Err(CompilerError::UnsupportedExpression {
                node,
                label: label.to_string(),
            }),
        }
    }

    fn compile_assignment(&mut self, node: NodeId) -> Result<(), CompilerError> {
        let [target, value] = self.operands::<2>(node)?;

        let val = self.acquire_scratch(None)?;
        let kind = self.compile_expr(value, val.reg())?;

        let addr = self.acquire_scratch(Some(val.reg()))?;
        let path = self.access_path(target)?;
        let shape = self.emit_address(&path, addr.reg())?;
        self.store(node, shape, kind, addr.reg(), val.reg())?;

        self.release_scratch(addr)?;
        self.release_scratch(val)
    }

    fn compile_return(&mut self, node: NodeId) -> Result<(), CompilerError> {
        if self.current_ref()?.kind != CallableKind::Function {
            return Err(CompilerError::ReturnOutsideFunction);
        }
        let [value] = self.operands::<1>(node)?;

        let scratch = self.acquire_scratch(None)?;
        let reg = scratch.reg();
        self.compile_scalar(value, reg)?;
        // r11 sits 16 bytes plus the save area below the result slot.
        self.emit_deferred(format!("str\t{reg}, [r11, #"), 16, "] ; result")?;
        self.release_scratch(scratch)?;

        let end = self.current_ref()?.end_label();
        emit!(self, "b\t{end}")
    }
}

impl Compiler<'_> {
    /// Writes `value` (held in `val`) to the location at `addr`.
    pub(crate) fn store(
        &mut self,
        node: NodeId,
        shape: Shape,
        value: Value,
        addr: Reg,
        val: Reg,
    ) -> Result<(), CompilerError> {
        match (shape, value) {
            (Shape::Word, Value::Scalar) => emit!(self, "str\t{val}, [{addr}]"),
            (Shape::Record(target), Value::Aggregate(source)) if target.size == source.size => {
                self.copy_record(&target, addr, val, 0).map(|_| ())
            }
            _ => Err(CompilerError::ShapeMismatch(node)),
        }
    }
}
