//! Interactive form support according to ISO 32000-1 Chapter 12.7
//!
//! Fields are resolved from the document's `/AcroForm` tree into a
//! [`FieldMap`] and filled with text values through [`apply`] or, for a whole
//! set of values at once, [`fill_document`].

mod field;
mod field_type;
mod filler;
mod resolver;
pub mod text;

pub use field::{FieldHandle, FieldMap, FieldNode};
pub use field_type::FieldType;
pub use filler::{
    apply, apply_named, fill_document, set_need_appearances, FieldOutcome, FieldValues,
    FieldWarning, FillReport,
};
pub use resolver::{acro_form, resolve_fields};
