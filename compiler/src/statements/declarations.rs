use resolve::{Shape, Symbol, WORD};
use tracing::debug;

use crate::codegen::{emit, Compiler};
use crate::error::CompilerError;
use crate::expressions::ExpressionCompiler;
use crate::frame::Section;
use crate::scopes::ScopeCompiler;
use crate::types::{Initializer, Value};

pub trait DeclarationCompiler {
    /// Records how variable `name` of the current scope starts out.
    fn initialize(&mut self, name: &str, init: Initializer) -> Result<(), CompilerError>;
    /// Reserves the current scope's variables and runs the recorded
    /// initializers. Once per scope.
    fn declare_variables(&mut self) -> Result<(), CompilerError>;
}

impl DeclarationCompiler for Compiler<'_> {
    fn initialize(&mut self, name: &str, init: Initializer) -> Result<(), CompilerError> {
        let region = self.region()?;
        match self.symbols.region(region)?.get(name) {
            Some(Symbol::Variable(_)) => {}
            _ => return Err(CompilerError::NotALocal(name.to_string())),
        }

        let label = self.current_ref()?.label.clone();
        let pending = self
            .initializers
            .last_mut()
            .ok_or(CompilerError::NoOpenScope)?
            .as_mut()
            .ok_or(CompilerError::VariablesAlreadyDeclared(label))?;
        match pending.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = init,
            None => pending.push((name.to_string(), init)),
        }
        Ok(())
    }

    fn declare_variables(&mut self) -> Result<(), CompilerError> {
        let region_id = self.region()?;
        let label = self.current_ref()?.label.clone();
        let pending = self
            .initializers
            .last_mut()
            .ok_or(CompilerError::NoOpenScope)?
            .take()
            .ok_or_else(|| CompilerError::VariablesAlreadyDeclared(label.clone()))?;
        let symbols = self.symbols;
        let region = symbols.region(region_id)?;
        debug!(%label, pending = pending.len(), "declaring variables");

        let frame = self.current()?;
        frame.var_mark = Some(frame.body.len());
        frame.section = Section::Variables;

        for slot in region.variables() {
            emit!(self, "; {} : {}", slot.name, slot.ty)?;
        }
        if let Some(size) = region.frame_size().filter(|s| *s > 0) {
            emit!(self, "sub\tr13, r13, #{size}")?;
        }

        for (name, init) in pending {
            let access = symbols.resolve_access(region_id, &[name.as_str()])?;
            match init {
                Initializer::Zero => {
                    let words = match &access.shape {
                        Shape::Word => 1,
                        Shape::Record(layout) => layout.words(),
                    };
                    emit!(self, "mov\tr10, #0")?;
                    for k in 0..words {
                        let at = access.displacement + (k * WORD) as i32;
                        emit!(self, "str\tr10, [r12, #{at}] ; {name}")?;
                    }
                }
                Initializer::Expr(node) => {
                    let val = self.acquire_scratch(None)?;
                    let value = self.compile_expr(node, val.reg())?;
                    if matches!((&access.shape, &value), (Shape::Word, Value::Scalar)) {
                        emit!(self, "str\t{}, [r12, #{}] ; {name}", val.reg(), access.displacement)?;
                    } else {
                        let addr = self.acquire_scratch(Some(val.reg()))?;
                        let shape = self.emit_address(&[name.as_str()], addr.reg())?;
                        self.store(node, shape, value, addr.reg(), val.reg())?;
                        self.release_scratch(addr)?;
                    }
                    self.release_scratch(val)?;
                }
            }
        }

        self.current()?.section = Section::Body;
        Ok(())
    }
}
