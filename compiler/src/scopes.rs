use resolve::{Anchor, CallableKind, RegionId, Shape};
use tracing::debug;

use crate::codegen::{emit, Compiler};
use crate::error::CompilerError;
use crate::frame::{Fragment, ScopeFrame};
use crate::registers::{Reg, LINK, SCRATCH};
use crate::types::ScopeTicket;

/// Initial value of a nested scope's instance word.
const UNSET_INSTANCE: &str = "0xFFFFFFFF";
/// Initial value of the outermost scope's instance word: no caller.
const NO_CALLER: &str = "0xFF000004";

pub trait ScopeCompiler {
    fn enter_scope(
        &mut self,
        kind: CallableKind,
        name: &str,
        region: RegionId,
    ) -> Result<ScopeTicket, CompilerError>;
    fn close_scope(&mut self, ticket: ScopeTicket) -> Result<(), CompilerError>;
    /// Leaves the address of `path` in `rd` and reports what lives there.
    fn emit_address(&mut self, path: &[&str], rd: Reg) -> Result<Shape, CompilerError>;
}

impl ScopeCompiler for Compiler<'_> {
    fn enter_scope(
        &mut self,
        kind: CallableKind,
        name: &str,
        region: RegionId,
    ) -> Result<ScopeTicket, CompilerError> {
        // A nested scope's static link is its father's live instance.
        let parent = match self.symbols.region(region)?.father {
            Some(father) => Some(
                self.frames
                    .iter()
                    .rev()
                    .find(|f| f.region == father)
                    .map(|f| f.label.clone())
                    .ok_or_else(|| CompilerError::FatherNotOpen {
                        scope: name.to_string(),
                        father,
                    })?,
            ),
            None => None,
        };
        let nested = parent.is_some();

        let counter = self.instances.entry(name.to_string()).or_insert(0);
        let instance = *counter;
        *counter += 1;

        let ticket = ScopeTicket {
            name: name.to_string(),
            instance,
            region,
            depth: self.frames.len() + 1,
        };
        let label = ticket.label();
        debug!(%label, region, nested, "entering scope");

        self.labels.insert(region, label.clone());
        self.frames
            .push(ScopeFrame::new(name, label.clone(), region, kind, nested));
        self.initializers.push(Some(Vec::new()));

        let word = format!("{label}_instance");
        let initial = if nested { UNSET_INSTANCE } else { NO_CALLER };
        self.frames[0]
            .start
            .push_str(&format!("{word}\tDCD\t{initial}\n"));

        if let Some(parent) = &parent {
            let return_slot = match kind {
                CallableKind::Function => 4,
                CallableKind::Procedure => 0,
            };
            self.emit_deferred("add\tr10, r13, #".into(), return_slot, " ; parameter area")?;
            emit!(self, "stmfd\tr13!, {{r10}}")?;
            emit!(self, "ldr\tr10, ={word}")?;
            emit!(self, "ldr\tr10, [r10]")?;
            emit!(self, "stmfd\tr13!, {{r10}} ; previous instance")?;
            emit!(self, "ldr\tr10, ={parent}_instance")?;
            emit!(self, "ldr\tr10, [r10]")?;
            emit!(self, "stmfd\tr13!, {{r10}} ; static link")?;
        }
        emit!(self, "mov\tr12, r13")?;
        emit!(self, "ldr\tr10, ={word}")?;
        emit!(self, "str\tr12, [r10]")?;
        emit!(self, "stmfd\tr13!, {{r11}}")?;
        emit!(self, "mov\tr11, r13")?;

        let mut teardown = vec![
            Fragment::Text("\tmov\tr13, r11\n".into()),
            Fragment::Text("\tldmfd\tr13!, {r11}\n".into()),
        ];
        if nested {
            teardown.extend(
                [
                    "\tadd\tr13, r13, #4 ; static link\n".to_string(),
                    "\tldmfd\tr13!, {r10}\n".to_string(),
                    format!("\tldr\tr12, ={word}\n"),
                    "\tstr\tr10, [r12]\n".to_string(),
                    "\tadd\tr13, r13, #4 ; parameter area\n".to_string(),
                ]
                .into_iter()
                .map(Fragment::Text),
            );
        }
        self.current()?.teardown = teardown;

        Ok(ticket)
    }

    fn close_scope(&mut self, ticket: ScopeTicket) -> Result<(), CompilerError> {
        let top = self.current_ref()?;
        if ticket.depth != self.frames.len() || top.label != ticket.label() {
            return Err(CompilerError::ScopeMismatch {
                expected: top.label.clone(),
                found: ticket.label(),
            });
        }
        let frame = self.frames.pop().ok_or(CompilerError::NoOpenScope)?;
        self.initializers.pop();
        debug!(
            label = %frame.label,
            high_water = ?frame.registers.high_water(),
            "closing scope"
        );

        let text = frame.compose();
        self.completed.push(text);
        Ok(())
    }

    fn emit_address(&mut self, path: &[&str], rd: Reg) -> Result<Shape, CompilerError> {
        let access = self.symbols.resolve_access(self.region()?, path)?;

        let mut base = LINK;
        if access.hops > 0 {
            emit!(self, "mov\tr10, r12")?;
            for _ in 0..access.hops {
                emit!(self, "ldr\tr10, [r10] ; static link")?;
            }
            base = SCRATCH;
        }
        if access.anchor == Anchor::Parameter {
            emit!(self, "ldr\tr10, [{base}, #8] ; parameter area")?;
            base = SCRATCH;
        }

        let displacement = access.displacement;
        if displacement < 0 {
            emit!(self, "sub\t{rd}, {base}, #{} ; {}", -displacement, path.join("."))?;
        } else {
            emit!(self, "add\t{rd}, {base}, #{displacement} ; {}", path.join("."))?;
        }
        Ok(access.shape)
    }
}
