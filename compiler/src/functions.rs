use resolve::{CallableKind, Shape, WORD};
use tracing::debug;

use crate::ast::NodeId;
use crate::codegen::{emit, Compiler};
use crate::error::CompilerError;
use crate::expressions::atoms::is_identifier;
use crate::expressions::ExpressionCompiler;
use crate::registers::Reg;
use crate::types::{CallSite, PendingCall, Scratch, Target, Value};

/// Name of the output procedure provided by the prologue asset.
const PUT: &str = "put";

pub trait CallCompiler {
    fn begin_call(&mut self, callee: &str) -> Result<CallSite, CompilerError>;
    /// Pushes one actual argument. Call once per argument, in order.
    fn stage_argument(&mut self, site: &CallSite, node: NodeId) -> Result<(), CompilerError>;
    fn finish_call(&mut self, site: CallSite) -> Result<(), CompilerError>;
    /// Pops the result of the most recent finished function call.
    fn compile_call_result(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError>;
}

impl CallCompiler for Compiler<'_> {
    fn begin_call(&mut self, callee: &str) -> Result<CallSite, CompilerError> {
        let region = self.region()?;
        let (declared_in, kind, callable) = self.symbols.lookup_callable(region, callee)?;

        let builtin = callee == PUT
            && kind == CallableKind::Procedure
            && self.symbols.region(declared_in)?.father.is_none();
        let target = if builtin {
            match callable.params.first().map(String::as_str) {
                Some("character") => Target::Builtin("println_char"),
                _ => Target::Builtin("println_int"),
            }
        } else {
            let label = self
                .labels
                .get(&callable.region)
                .ok_or_else(|| CompilerError::UnknownCallable(callee.to_string()))?;
            Target::Label(label.clone())
        };

        if let Some(returns) = &callable.returns {
            if self.symbols.type_size(declared_in, returns)? != WORD {
                return Err(CompilerError::RecordReturn(callee.to_string()));
            }
        }

        self.calls.push(PendingCall::default());
        Ok(CallSite {
            callee: callee.to_string(),
            kind,
            target,
            slot: self.calls.len() - 1,
        })
    }

    fn stage_argument(&mut self, site: &CallSite, node: NodeId) -> Result<(), CompilerError> {
        let offsets = self.argument_offsets(node)?;
        let words = offsets.len() as u32;
        let bytes = words * WORD;

        match self.current()?.registers.acquire() {
            Some(reg) => {
                let value = self.compile_expr(node, reg)?;
                if let Value::Aggregate(_) = value {
                    emit!(self, "sub\tr13, r13, #{bytes}")?;
                    self.store_words(reg, &offsets, 0)?;
                } else {
                    emit!(self, "stmfd\tr13!, {{{reg}}}")?;
                }
                self.release_scratch(Scratch::Pooled(reg))?;
            }
            None => {
                // The argument slot goes below the victim's saved value.
                emit!(self, "sub\tr13, r13, #{bytes}")?;
                self.current()?.spilled += words;
                let victim = self.spill(None)?;
                let reg = victim.reg();
                let value = self.compile_expr(node, reg)?;
                if let Value::Aggregate(_) = value {
                    self.store_words(reg, &offsets, WORD)?;
                } else {
                    emit!(self, "str\t{reg}, [r13, #{WORD}]")?;
                }
                self.release_scratch(victim)?;
                let frame = self.current()?;
                frame.spilled = frame.spilled.saturating_sub(words);
            }
        }

        if site.slot + 1 != self.calls.len() {
            return Err(CompilerError::CallMismatch(site.callee.clone()));
        }
        if let Some(call) = self.calls.last_mut() {
            call.bytes += bytes;
        }
        Ok(())
    }

    fn finish_call(&mut self, site: CallSite) -> Result<(), CompilerError> {
        if site.slot + 1 != self.calls.len() {
            return Err(CompilerError::CallMismatch(site.callee));
        }
        if site.kind == CallableKind::Function {
            emit!(self, "sub\tr13, r13, #{WORD} ; result of {}", site.callee)?;
        }
        match &site.target {
            Target::Label(label) => emit!(self, "bl\t{label}")?,
            Target::Builtin(routine) => emit!(self, "bl\t{routine} ; {PUT}")?,
        }

        match site.kind {
            CallableKind::Function => {
                let spilled = self.current_ref()?.spilled;
                if let Some(call) = self.calls.last_mut() {
                    call.finished_at = Some(spilled);
                }
            }
            CallableKind::Procedure => {
                let call = self
                    .calls
                    .pop()
                    .ok_or_else(|| CompilerError::CallMismatch(site.callee.clone()))?;
                if call.bytes > 0 {
                    emit!(self, "add\tr13, r13, #{} ; parameters", call.bytes)?;
                }
            }
        }
        debug!(callee = %site.callee, kind = ?site.kind, "call finished");
        Ok(())
    }

    fn compile_call_result(&mut self, node: NodeId, rd: Reg) -> Result<Value, CompilerError> {
        let (bytes, finished_at) = match self.calls.last() {
            Some(&PendingCall {
                bytes,
                finished_at: Some(at),
            }) => (bytes, at),
            _ => return Err(CompilerError::NoPendingCall(node)),
        };
        self.calls.pop();

        let above = self.current_ref()?.spilled.saturating_sub(finished_at);
        if above == 0 {
            emit!(self, "ldmfd\tr13!, {{{rd}}} ; call result")?;
            if bytes > 0 {
                emit!(self, "add\tr13, r13, #{bytes} ; parameters")?;
            }
            return Ok(Value::Scalar);
        }

        // Spilled words were pushed on top of the call block: pick the result
        // from under them and slide them up over the reclaimed block.
        emit!(self, "ldr\t{rd}, [r13, #{}] ; call result", above * WORD)?;
        self.reclaim_call_block(bytes, finished_at)?;
        Ok(Value::Scalar)
    }
}

impl Compiler<'_> {
    /// Byte offsets of the words an argument occupies on the data stack.
    fn argument_offsets(&mut self, node: NodeId) -> Result<Vec<u32>, CompilerError> {
        let label = self.node(node)?.label.as_str();
        // Function results are a single word; record returns are refused
        // when the call begins.
        if label == "CALL" || !is_identifier(label) {
            return Ok(vec![0]);
        }
        let path = self.access_path(node)?;
        let access = self.symbols.resolve_access(self.region()?, &path)?;
        Ok(match access.shape {
            Shape::Word => vec![0],
            Shape::Record(layout) => layout.word_offsets(),
        })
    }

    /// Drops a finished call's block (parameters and result word), sliding
    /// any words spilled since it returned down over it.
    pub(crate) fn reclaim_call_block(&mut self, bytes: u32, finished_at: u32) -> Result<(), CompilerError> {
        let above = self.current_ref()?.spilled.saturating_sub(finished_at);
        let block = bytes + WORD;
        for i in (0..above).rev() {
            emit!(self, "ldr\tr10, [r13, #{}]", i * WORD)?;
            emit!(self, "str\tr10, [r13, #{}]", i * WORD + block)?;
        }
        emit!(self, "add\tr13, r13, #{block}")
    }

    /// Finished calls whose results `node` consumes, innermost (top of the
    /// data stack) first, as `(parameter bytes, spill depth at return)`.
    pub(crate) fn calls_consumed_by(&self, node: NodeId) -> Result<Vec<(u32, u32)>, CompilerError> {
        let count = self.count_calls(node)?;
        let mut consumed = Vec::with_capacity(count);
        for call in self.calls.iter().rev().take(count) {
            match call.finished_at {
                Some(at) => consumed.push((call.bytes, at)),
                None => return Err(CompilerError::NoPendingCall(node)),
            }
        }
        if consumed.len() != count {
            return Err(CompilerError::NoPendingCall(node));
        }
        Ok(consumed)
    }

    fn count_calls(&self, node: NodeId) -> Result<usize, CompilerError> {
        let n = self.node(node)?;
        if n.label == "CALL" {
            return Ok(1);
        }
        n.children
            .iter()
            .try_fold(0, |total, &child| Ok(total + self.count_calls(child)?))
    }

    /// Copies the words at `offsets` of the record at `src` to
    /// `[r13, #base + offset]`.
    fn store_words(&mut self, src: Reg, offsets: &[u32], base: u32) -> Result<(), CompilerError> {
        for &offset in offsets {
            emit!(self, "ldr\tr10, [{src}, #{offset}]")?;
            emit!(self, "str\tr10, [r13, #{}]", base + offset)?;
        }
        Ok(())
    }

    /// Emits a call to the `put` output routine for one scalar argument.
    pub fn put(&mut self, argument: NodeId) -> Result<(), CompilerError> {
        let site = self.begin_call(PUT)?;
        self.stage_argument(&site, argument)?;
        self.finish_call(site)
    }
}
