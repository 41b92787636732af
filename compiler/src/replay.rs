//! Drives the engine from a recorded event stream.
//!
//! The front end walks its AST once and records every engine entry point it
//! would have called; replaying the stream regenerates the program without
//! the front end being linked in.

use resolve::{CallableKind, RegionId, SymbolTable};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::ast::{Ast, NodeId};
use crate::codegen::Compiler;
use crate::control_flow::ControlFlowCompiler;
use crate::error::CompilerError;
use crate::functions::CallCompiler;
use crate::scopes::ScopeCompiler;
use crate::statements::{DeclarationCompiler, StatementCompiler};
use crate::types::{CallSite, ForTicket, IfTicket, Initializer, ScopeTicket, WhileTicket};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    EnterScope {
        kind: CallableKind,
        name: String,
        region: RegionId,
    },
    CloseScope,
    /// Zero-initialized unless `value` names an expression node.
    Initialize {
        name: String,
        #[serde(default)]
        value: Option<NodeId>,
    },
    DeclareVariables,
    /// `:=` or `RETURN` node.
    Statement { node: NodeId },
    BeginCall { callee: String },
    Argument { node: NodeId },
    FinishCall,
    BeginIf { node: NodeId },
    Elsif { node: NodeId },
    Else,
    EndIf,
    BeginWhile { node: NodeId },
    EndWhile,
    BeginFor { node: NodeId },
    EndFor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub ast: Ast,
    pub symbols: SymbolTable,
    pub events: Vec<Event>,
}

impl CompilationUnit {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

enum Loop {
    While(WhileTicket),
    For(ForTicket),
}

/// Tickets of everything currently open.
#[derive(Default)]
struct Open {
    scopes: Vec<ScopeTicket>,
    calls: Vec<CallSite>,
    ifs: Vec<IfTicket>,
    loops: Vec<Loop>,
}

/// Runs every event of `unit` and hands back the engine, ready for
/// [`Compiler::finish`].
pub fn replay(unit: &CompilationUnit) -> Result<Compiler<'_>, CompilerError> {
    let mut compiler = Compiler::new(&unit.ast, &unit.symbols);
    let mut open = Open::default();

    for (index, event) in unit.events.iter().enumerate() {
        trace!(index, ?event, "replaying");
        apply(&mut compiler, &mut open, event)?;
    }

    if !open.scopes.is_empty() {
        return Err(CompilerError::UnclosedScopes(open.scopes.len()));
    }
    Ok(compiler)
}

fn apply(compiler: &mut Compiler<'_>, open: &mut Open, event: &Event) -> Result<(), CompilerError> {
    match event {
        Event::EnterScope { kind, name, region } => {
            let ticket = compiler.enter_scope(*kind, name, *region)?;
            open.scopes.push(ticket);
        }
        Event::CloseScope => {
            let ticket = open
                .scopes
                .pop()
                .ok_or(CompilerError::UnbalancedEvent("close_scope without enter_scope"))?;
            compiler.close_scope(ticket)?;
        }
        Event::Initialize { name, value } => {
            let init = value.map_or(Initializer::Zero, Initializer::Expr);
            compiler.initialize(name, init)?;
        }
        Event::DeclareVariables => compiler.declare_variables()?,
        Event::Statement { node } => compiler.compile_statement(*node)?,
        Event::BeginCall { callee } => {
            let site = compiler.begin_call(callee)?;
            open.calls.push(site);
        }
        Event::Argument { node } => {
            let site = open
                .calls
                .last()
                .ok_or(CompilerError::UnbalancedEvent("argument outside a call"))?;
            compiler.stage_argument(site, *node)?;
        }
        Event::FinishCall => {
            let site = open
                .calls
                .pop()
                .ok_or(CompilerError::UnbalancedEvent("finish_call without begin_call"))?;
            compiler.finish_call(site)?;
        }
        Event::BeginIf { node } => {
            let ticket = compiler.begin_if(*node)?;
            open.ifs.push(ticket);
        }
        Event::Elsif { node } => {
            let ticket = open
                .ifs
                .last_mut()
                .ok_or(CompilerError::UnbalancedEvent("elsif outside an if"))?;
            compiler.elsif(ticket, *node)?;
        }
        Event::Else => {
            let ticket = open
                .ifs
                .last_mut()
                .ok_or(CompilerError::UnbalancedEvent("else outside an if"))?;
            compiler.otherwise(ticket)?;
        }
        Event::EndIf => {
            let ticket = open
                .ifs
                .pop()
                .ok_or(CompilerError::UnbalancedEvent("end_if without begin_if"))?;
            compiler.end_if(ticket)?;
        }
        Event::BeginWhile { node } => {
            let ticket = compiler.begin_while(*node)?;
            open.loops.push(Loop::While(ticket));
        }
        Event::EndWhile => match open.loops.pop() {
            Some(Loop::While(ticket)) => compiler.end_while(ticket)?,
            _ => return Err(CompilerError::UnbalancedEvent("end_while without begin_while")),
        },
        Event::BeginFor { node } => {
            let ticket = compiler.begin_for(*node)?;
            open.loops.push(Loop::For(ticket));
        }
        Event::EndFor => match open.loops.pop() {
            Some(Loop::For(ticket)) => compiler.end_for(ticket)?,
            _ => return Err(CompilerError::UnbalancedEvent("end_for without begin_for")),
        },
    }
    Ok(())
}
