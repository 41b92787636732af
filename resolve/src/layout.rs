use crate::error::ResolveError;
use crate::symbols::{is_builtin_scalar, RegionId, SymbolTable, WORD};

/// Flattened view of a record type: every field with its byte offset from the
/// start of the record, nested records expanded in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    pub name: String,
    /// Total size in bytes; always the sum of the field sizes.
    pub size: u32,
    pub fields: Vec<FieldLayout>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: String,
    pub ty: String,
    pub offset: u32,
    pub size: u32,
    /// Present when the field is itself a multi-word record.
    pub nested: Option<RecordLayout>,
}

impl RecordLayout {
    pub fn words(&self) -> u32 {
        self.size / WORD
    }

    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Byte offsets of every word, in field declaration order.
    pub fn word_offsets(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.words() as usize);
        self.collect_words(0, &mut out);
        out
    }

    fn collect_words(&self, base: u32, out: &mut Vec<u32>) {
        for field in &self.fields {
            match &field.nested {
                Some(inner) => inner.collect_words(base + field.offset, out),
                None => out.push(base + field.offset),
            }
        }
    }
}

impl SymbolTable {
    /// Lays out record type `ty`, looking the declaration up from `from`.
    pub fn record_layout(&self, from: RegionId, ty: &str) -> Result<RecordLayout, ResolveError> {
        let mut visiting = Vec::new();
        self.layout_of(from, ty, &mut visiting)
    }

    fn layout_of(
        &self,
        from: RegionId,
        ty: &str,
        visiting: &mut Vec<String>,
    ) -> Result<RecordLayout, ResolveError> {
        if visiting.iter().any(|v| v == ty) {
            return Err(ResolveError::RecursiveRecord(ty.to_string()));
        }
        let record = self.lookup_record(from, ty)?;
        visiting.push(ty.to_string());

        let mut fields = Vec::with_capacity(record.fields.len());
        let mut offset = 0;
        for field in &record.fields {
            let (size, nested) = self.field_size(from, &field.ty, visiting)?;
            fields.push(FieldLayout {
                name: field.name.clone(),
                ty: field.ty.clone(),
                offset,
                size,
                nested,
            });
            offset += size;
        }

        visiting.pop();
        Ok(RecordLayout {
            name: record.name.clone(),
            size: offset,
            fields,
        })
    }

    fn field_size(
        &self,
        from: RegionId,
        ty: &str,
        visiting: &mut Vec<String>,
    ) -> Result<(u32, Option<RecordLayout>), ResolveError> {
        if self.type_sizes.get(ty) == Some(&WORD) || is_builtin_scalar(ty) {
            return Ok((WORD, None));
        }
        let nested = self.layout_of(from, ty, visiting)?;
        if nested.size == WORD {
            Ok((WORD, None))
        } else {
            Ok((nested.size, Some(nested)))
        }
    }
}
