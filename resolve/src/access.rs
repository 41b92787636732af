use crate::error::ResolveError;
use crate::layout::RecordLayout;
use crate::symbols::{RegionId, Slot, Symbol, SymbolTable, WORD};

/// Which part of the activation record the base symbol lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Locals sit below the instance pointer.
    Local,
    /// Parameters sit in the caller-pushed area above the saved registers;
    /// its address is kept in the frame linkage.
    Parameter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Exactly one word: the address can be loaded from or stored to directly.
    Word,
    /// Still multi-word; callers continue field by field.
    Record(RecordLayout),
}

/// Resolved location of a dotted access path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Access {
    pub declared_in: RegionId,
    /// Static links to follow from the current instance pointer.
    pub hops: u32,
    pub anchor: Anchor,
    /// Byte displacement from the anchor. For `Local` it is relative to the
    /// instance pointer; for `Parameter` to the lowest word of the parameter
    /// area (arguments are pushed in declaration order, so the first one sits
    /// highest).
    pub displacement: i32,
    pub shape: Shape,
}

impl SymbolTable {
    /// Resolves `path` (`base.field1.field2…`) as seen from region `from`.
    pub fn resolve_access(&self, from: RegionId, path: &[&str]) -> Result<Access, ResolveError> {
        let (base, fields) = path.split_first().ok_or(ResolveError::EmptyPath)?;
        let (declared_in, symbol) = self.lookup(from, base)?;

        let (slot, anchor) = match symbol {
            Symbol::Variable(slot) => (slot, Anchor::Local),
            Symbol::Parameter(slot) => (slot, Anchor::Parameter),
            _ => return Err(ResolveError::NotAddressable(base.to_string())),
        };
        let hops = self.static_hops(from, declared_in)?;

        let (field_offset, ty) = self.walk_fields(declared_in, slot, fields)?;
        let shape = match self.type_size(declared_in, &ty)? {
            WORD => Shape::Word,
            _ => Shape::Record(self.record_layout(declared_in, &ty)?),
        };

        let displacement = match anchor {
            Anchor::Local => field_offset as i32 - (WORD + slot.offset) as i32,
            Anchor::Parameter => {
                let area = self.region(declared_in)?.param_size().unwrap_or(0);
                (area + field_offset) as i32 - slot.offset as i32
            }
        };

        Ok(Access {
            declared_in,
            hops,
            anchor,
            displacement,
            shape,
        })
    }

    /// Number of static links separating `from` and the region declaring a symbol.
    pub fn static_hops(&self, from: RegionId, declared_in: RegionId) -> Result<u32, ResolveError> {
        let from_level = self.region(from)?.nesting_level;
        let to_level = self.region(declared_in)?.nesting_level;
        from_level
            .checked_sub(to_level)
            .ok_or(ResolveError::InvalidNesting {
                from,
                from_level,
                to: declared_in,
                to_level,
            })
    }

    fn walk_fields(
        &self,
        declared_in: RegionId,
        slot: &Slot,
        fields: &[&str],
    ) -> Result<(u32, String), ResolveError> {
        let mut offset = 0;
        let mut ty = slot.ty.clone();
        for field in fields {
            let layout = self.record_layout(declared_in, &ty)?;
            let found = layout.field(field).ok_or_else(|| ResolveError::UnknownField {
                record: layout.name.clone(),
                field: field.to_string(),
            })?;
            offset += found.offset;
            ty = found.ty.clone();
        }
        Ok((offset, ty))
    }
}
