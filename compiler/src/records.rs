use resolve::{RecordLayout, WORD};

use crate::codegen::{emit, Compiler};
use crate::error::CompilerError;
use crate::registers::Reg;

pub trait RecordCompiler {
    /// Copies the record at `src` to `dst` word by word, starting at word
    /// `word_offset`. Returns the offset just past the copied words.
    fn copy_record(
        &mut self,
        layout: &RecordLayout,
        dst: Reg,
        src: Reg,
        word_offset: u32,
    ) -> Result<u32, CompilerError>;
}

impl RecordCompiler for Compiler<'_> {
    fn copy_record(
        &mut self,
        layout: &RecordLayout,
        dst: Reg,
        src: Reg,
        word_offset: u32,
    ) -> Result<u32, CompilerError> {
        let mut offset = word_offset;
        for field in &layout.fields {
            match &field.nested {
                Some(inner) => offset = self.copy_record(inner, dst, src, offset)?,
                None => {
                    let bytes = offset * WORD;
                    emit!(self, "ldr\tr10, [{src}, #{bytes}] ; {}.{}", layout.name, field.name)?;
                    emit!(self, "str\tr10, [{dst}, #{bytes}]")?;
                    offset += 1;
                }
            }
        }
        Ok(offset)
    }
}
