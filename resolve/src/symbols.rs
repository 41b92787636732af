use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ResolveError;

pub type RegionId = u32;

/// Size of a machine word in bytes. Every scalar occupies exactly one.
pub const WORD: u32 = 4;

const BUILTIN_SCALARS: [&str; 3] = ["integer", "boolean", "character"];

pub(crate) fn is_builtin_scalar(ty: &str) -> bool {
    BUILTIN_SCALARS.contains(&ty)
}

/// Storage symbol: a local variable or a formal parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    /// Cumulative frame offset in bytes, including the symbol's own size.
    pub offset: u32,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callable {
    pub name: String,
    /// Region opened by the callable's body.
    pub region: RegionId,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub returns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallableKind {
    Function,
    Procedure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Symbol {
    Variable(Slot),
    Parameter(Slot),
    Function(Callable),
    Procedure(Callable),
    RecordType(RecordType),
}

impl Symbol {
    pub fn variable(name: &str, offset: u32, ty: &str) -> Self {
        Symbol::Variable(Slot {
            name: name.to_string(),
            offset,
            ty: ty.to_string(),
        })
    }

    pub fn parameter(name: &str, offset: u32, ty: &str) -> Self {
        Symbol::Parameter(Slot {
            name: name.to_string(),
            offset,
            ty: ty.to_string(),
        })
    }

    pub fn procedure(name: &str, region: RegionId, params: &[&str]) -> Self {
        Symbol::Procedure(Callable {
            name: name.to_string(),
            region,
            params: params.iter().map(|p| p.to_string()).collect(),
            returns: None,
        })
    }

    pub fn function(name: &str, region: RegionId, params: &[&str], returns: &str) -> Self {
        Symbol::Function(Callable {
            name: name.to_string(),
            region,
            params: params.iter().map(|p| p.to_string()).collect(),
            returns: Some(returns.to_string()),
        })
    }

    pub fn record(name: &str, fields: &[(&str, &str)]) -> Self {
        Symbol::RecordType(RecordType {
            name: name.to_string(),
            fields: fields
                .iter()
                .map(|(f, ty)| Field {
                    name: f.to_string(),
                    ty: ty.to_string(),
                })
                .collect(),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable(s) | Symbol::Parameter(s) => &s.name,
            Symbol::Function(c) | Symbol::Procedure(c) => &c.name,
            Symbol::RecordType(r) => &r.name,
        }
    }
}

/// One symbol-table scope. Symbols keep their declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub father: Option<RegionId>,
    pub nesting_level: u32,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
}

impl Region {
    pub fn new(father: Option<RegionId>, nesting_level: u32) -> Self {
        Self {
            father,
            nesting_level,
            symbols: Vec::new(),
        }
    }

    pub fn push(&mut self, symbol: Symbol) -> &mut Self {
        self.symbols.push(symbol);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name() == name)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Slot> {
        self.symbols.iter().filter_map(|s| match s {
            Symbol::Variable(slot) => Some(slot),
            _ => None,
        })
    }

    /// Offset of the last declared variable, i.e. the bytes its frame reserves.
    pub fn frame_size(&self) -> Option<u32> {
        self.variables().last().map(|v| v.offset)
    }

    /// Bytes of arguments the caller pushes: the last parameter's offset.
    pub fn param_size(&self) -> Option<u32> {
        self.symbols
            .iter()
            .filter_map(|s| match s {
                Symbol::Parameter(slot) => Some(slot.offset),
                _ => None,
            })
            .last()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    pub regions: BTreeMap<RegionId, Region>,
    /// Global type name to size in bytes. Builtin scalars need no entry.
    #[serde(default)]
    pub type_sizes: BTreeMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(
        &mut self,
        id: RegionId,
        father: Option<RegionId>,
        nesting_level: u32,
    ) -> &mut Region {
        self.regions.insert(id, Region::new(father, nesting_level));
        self.regions.entry(id).or_default()
    }

    pub fn set_type_size(&mut self, ty: &str, bytes: u32) {
        self.type_sizes.insert(ty.to_string(), bytes);
    }

    pub fn region(&self, id: RegionId) -> Result<&Region, ResolveError> {
        self.regions.get(&id).ok_or(ResolveError::UnknownRegion(id))
    }

    /// Finds `name` starting in `from` and walking up through father links.
    /// Returns the declaring region alongside the symbol.
    pub fn lookup(&self, from: RegionId, name: &str) -> Result<(RegionId, &Symbol), ResolveError> {
        let mut current = from;
        loop {
            let region = self.region(current)?;
            if let Some(symbol) = region.get(name) {
                return Ok((current, symbol));
            }
            match region.father {
                Some(father) => current = father,
                None => return Err(ResolveError::UnresolvedIdentifier(name.to_string())),
            }
        }
    }

    pub fn lookup_callable(
        &self,
        from: RegionId,
        name: &str,
    ) -> Result<(RegionId, CallableKind, &Callable), ResolveError> {
        match self.lookup(from, name)? {
            (declared_in, Symbol::Function(c)) => Ok((declared_in, CallableKind::Function, c)),
            (declared_in, Symbol::Procedure(c)) => Ok((declared_in, CallableKind::Procedure, c)),
            _ => Err(ResolveError::NotCallable(name.to_string())),
        }
    }

    pub fn lookup_record(&self, from: RegionId, ty: &str) -> Result<&RecordType, ResolveError> {
        match self.lookup(from, ty) {
            Ok((_, Symbol::RecordType(record))) => Ok(record),
            Ok(_) => Err(ResolveError::NotARecord { ty: ty.to_string() }),
            Err(ResolveError::UnresolvedIdentifier(_)) => {
                Err(ResolveError::UnknownType(ty.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Size in bytes of `ty` as seen from `from`.
    pub fn type_size(&self, from: RegionId, ty: &str) -> Result<u32, ResolveError> {
        if let Some(&bytes) = self.type_sizes.get(ty) {
            return Ok(bytes);
        }
        if is_builtin_scalar(ty) {
            return Ok(WORD);
        }
        Ok(self.record_layout(from, ty)?.size)
    }

    /// The region a variable of the root scope lives in, i.e. the one with no father.
    pub fn root(&self) -> Option<RegionId> {
        self.regions
            .iter()
            .find(|(_, r)| r.father.is_none())
            .map(|(id, _)| *id)
    }
}
