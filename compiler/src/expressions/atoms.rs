use resolve::Shape;
use tracing::trace;

use crate::ast::NodeId;
use crate::codegen::{emit, Compiler};
use crate::error::CompilerError;
use crate::registers::Reg;
use crate::scopes::ScopeCompiler;
use crate::types::Value;

/// Largest magnitude loaded with a plain `mov`.
const MAX_IMMEDIATE: u32 = 256;

const RESERVED: &[&str] = &[
    "ACCESS", "AND", "BEGIN", "ELSE", "ELSIF", "END", "FOR", "FUNCTION", "IF", "IN", "IS",
    "LOOP", "NEW", "NOT", "NULL", "OR", "OUT", "PROCEDURE", "RECORD", "REM", "RETURN",
    "REVERSE", "THEN", "TYPE", "USE", "WHILE", "WITH",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Integer(i32),
    Character(char),
    Boolean(bool),
}

impl Literal {
    pub fn parse(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case("true") {
            return Some(Literal::Boolean(true));
        }
        if label.eq_ignore_ascii_case("false") {
            return Some(Literal::Boolean(false));
        }

        let mut chars = label.chars();
        if let (Some('\''), Some(c), Some('\''), None) =
            (chars.next(), chars.next(), chars.next(), chars.next())
        {
            return Some(Literal::Character(c));
        }

        if Self::is_numeric(label) {
            return label.replace('_', "").parse().ok().map(Literal::Integer);
        }
        None
    }

    /// Whether `label` is spelled as an integer, whether or not it fits a word.
    pub fn is_numeric(label: &str) -> bool {
        let digits = label.strip_prefix('-').unwrap_or(label);
        digits.starts_with(|c: char| c.is_ascii_digit())
    }
}

pub fn is_identifier(label: &str) -> bool {
    let mut chars = label.chars();
    let leads = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    leads
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED.iter().any(|k| k.eq_ignore_ascii_case(label))
}

pub trait AtomCompiler {
    /// Literals and identifier chains.
    fn compile_atom(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError>;
    fn load_immediate(&mut self, value: i32, rd: Reg) -> Result<(), CompilerError>;
}

impl AtomCompiler for Compiler<'_> {
    fn compile_atom(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError> {
        let label = self.node(node)?.label.as_str();

        if let Some(literal) = Literal::parse(label) {
            match literal {
                Literal::Integer(n) => self.load_immediate(n, rd)?,
                Literal::Character(c) => emit!(self, "mov\t{rd}, #{} ; {label}", c as u32)?,
                Literal::Boolean(b) => emit!(self, "mov\t{rd}, #{}", u8::from(b))?,
            }
            return Ok(Value::Scalar);
        }
        if Literal::is_numeric(label) {
            return Err(CompilerError::malformed(
                node,
                label,
                "integer literal does not fit in 32 bits",
            ));
        }

        if !is_identifier(label) {
            return Err(CompilerError::UnsupportedExpression {
                node,
                label: label.to_string(),
            });
        }

        let path = self.access_path(node)?;
        trace!(path = %path.join("."), "loading");
        match self.emit_address(&path, rd)? {
            Shape::Word => {
                emit!(self, "ldr\t{rd}, [{rd}]")?;
                Ok(Value::Scalar)
            }
            Shape::Record(layout) => Ok(Value::Aggregate(layout)),
        }
    }

    fn load_immediate(&mut self, value: i32, rd: Reg) -> Result<(), CompilerError> {
        if value.unsigned_abs() > MAX_IMMEDIATE {
            emit!(self, "ldr\t{rd}, ={value}")
        } else {
            emit!(self, "mov\t{rd}, #{value}")
        }
    }
}

impl<'a> Compiler<'a> {
    /// Dotted path of an identifier chain: each identifier has at most one
    /// child, an access node whose first child is the next field.
    pub(crate) fn access_path(&self, node: NodeId) -> Result<Vec<&'a str>, CompilerError> {
        let mut path = Vec::new();
        let mut current = self.node(node)?;
        let mut id = node;
        loop {
            if !is_identifier(&current.label) {
                return Err(CompilerError::UnsupportedExpression {
                    node: id,
                    label: current.label.clone(),
                });
            }
            path.push(current.label.as_str());

            let Some(&access) = current.children.first() else {
                return Ok(path);
            };
            let access_node = self.node(access)?;
            id = *access_node.children.first().ok_or_else(|| {
                CompilerError::malformed(access, &access_node.label, "field access without a field")
            })?;
            current = self.node(id)?;
        }
    }
}
