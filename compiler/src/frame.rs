use resolve::{CallableKind, RegionId};

use crate::registers::RegisterPool;

/// Piece of emitted text. Addresses above the saved registers depend on the
/// final high-water mark, so they stay symbolic until the frame is composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    /// Rendered as `{prefix}{save_bytes + extra}{suffix}`.
    Deferred {
        prefix: String,
        extra: i32,
        suffix: String,
    },
}

impl Fragment {
    fn render(&self, save_bytes: u32, out: &mut String) {
        match self {
            Fragment::Text(text) => out.push_str(text),
            Fragment::Deferred {
                prefix,
                extra,
                suffix,
            } => {
                out.push_str(prefix);
                out.push_str(&(save_bytes as i32 + extra).to_string());
                out.push_str(suffix);
            }
        }
    }
}

/// Which buffer `emit` currently appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Body,
    Variables,
}

/// State of ONE open scope (procedure or function body).
pub struct ScopeFrame {
    pub name: String,
    pub label: String,
    pub region: RegionId,
    pub kind: CallableKind,
    pub nested: bool,

    /// Data words; only the bottom frame's buffer is ever written.
    pub start: String,
    pub body: Vec<Fragment>,
    pub var_init: Vec<Fragment>,
    /// Body position where `var_init` is spliced.
    pub var_mark: Option<usize>,
    pub teardown: Vec<Fragment>,
    pub section: Section,

    pub registers: RegisterPool,
    /// Words pushed on the data stack by spills (and reserved argument slots)
    /// that are still live.
    pub spilled: u32,
}

impl ScopeFrame {
    pub fn new(name: &str, label: String, region: RegionId, kind: CallableKind, nested: bool) -> Self {
        Self {
            name: name.to_string(),
            label,
            region,
            kind,
            nested,
            start: String::new(),
            body: Vec::new(),
            var_init: Vec::new(),
            var_mark: None,
            teardown: Vec::new(),
            section: Section::Body,
            registers: RegisterPool::new(),
            spilled: 0,
        }
    }

    pub fn push(&mut self, fragment: Fragment) {
        match self.section {
            Section::Body => self.body.push(fragment),
            Section::Variables => self.var_init.push(fragment),
        }
    }

    pub fn end_label(&self) -> String {
        format!("end{}", self.label)
    }

    /// Final text of the scope. Consumes the frame.
    pub fn compose(self) -> String {
        let save = self.registers.save_bytes();
        let mut out = String::new();

        out.push_str(&self.label);
        out.push('\n');
        out.push_str(&format!("\tstmfd\tr13!, {{{}}}\n", self.registers.save_list("lr")));

        let mark = self.var_mark.unwrap_or(0).min(self.body.len());
        let (head, tail) = self.body.split_at(mark);
        for fragment in head.iter().chain(&self.var_init).chain(tail) {
            fragment.render(save, &mut out);
        }

        out.push_str(&self.end_label());
        out.push('\n');
        for fragment in &self.teardown {
            fragment.render(save, &mut out);
        }
        out.push_str(&format!("\tldmfd\tr13!, {{{}}}\n", self.registers.save_list("pc")));

        if !self.start.is_empty() {
            out.push('\n');
            out.push_str(&self.start);
        }
        out
    }
}
