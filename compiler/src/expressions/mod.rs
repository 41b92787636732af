use crate::ast::NodeId;
use crate::codegen::Compiler;
use crate::error::CompilerError;
use crate::functions::CallCompiler;
use crate::registers::Reg;
use crate::types::Value;

pub mod atoms;
pub mod binary;

pub use atoms::AtomCompiler;
pub use binary::{BinaryCompiler, BinaryOp, Condition, ShortCircuit};

pub trait ExpressionCompiler {
    /// Evaluates `node` into `rd`.
    ///
    /// Every register borrowed on the way is released (or spill-restored)
    /// before this returns.
    fn compile_expr(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError>;

    /// Like `compile_expr`, but the result must fit in one word.
    fn compile_scalar(&mut self, node: NodeId, rd: Reg) -> Result<(), CompilerError>;
}

impl ExpressionCompiler for Compiler<'_> {
    fn compile_expr(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError> {
        let n = self.node(node)?;
        let label = n.label.as_str();

        if let Some(op) = BinaryOp::from_label(label) {
            if op == BinaryOp::Sub && n.children.len() == 1 {
                return self.compile_negation(node, rd);
            }
            return self.compile_binary(node, op, rd);
        }
        match label {
            "AND THEN" => self.compile_short_circuit(node, ShortCircuit::AndThen, rd),
            "OR ELSE" => self.compile_short_circuit(node, ShortCircuit::OrElse, rd),
            "NOT" => self.compile_not(node, rd),
            "CALL" => self.compile_call_result(node, rd),
            _ => self.compile_atom(node, rd),
        }
    }

    fn compile_scalar(&mut self, node: NodeId, rd: Reg) -> Result<(), CompilerError> {
        match self.compile_expr(node, rd)? {
            Value::Scalar => Ok(()),
            Value::Aggregate(_) => Err(CompilerError::NotScalar(node)),
        }
    }
}
