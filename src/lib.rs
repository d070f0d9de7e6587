//! A writer for the [binary encoding] of Amazon Ion 1.0.
//!
//! Field names, annotations, and symbol values are supplied as text; by default the
//! writer interns them into a local symbol table as it goes and emits that table ahead
//! of the values that reference it when [BinaryWriter::finish] is called.
//!
//! ```
//! use ion_binary::{BinaryWriterBuilder, IonResult};
//!
//! # fn main() -> IonResult<()> {
//! let mut writer = BinaryWriterBuilder::new().build(Vec::new())?;
//! writer.write_string("hello")?;
//! writer.finish()?;
//! assert_eq!(
//!     writer.output().as_slice(),
//!     &[0xE0, 0x01, 0x00, 0xEA, 0x85, 0x68, 0x65, 0x6C, 0x6C, 0x6F]
//! );
//! # Ok(())
//! # }
//! ```
//!
//! [binary encoding]: https://amazon-ion.github.io/ion-docs/docs/binary.html

#![deny(rustdoc::broken_intra_doc_links)]

pub mod result;

pub mod binary;
pub mod types;

pub mod constants;
mod shared_symbol_table;
mod symbol_table;

pub use shared_symbol_table::SharedSymbolTable;
pub use symbol_table::{LocalSymbolTable, SymbolTableBuilder};

pub use types::decimal::Decimal;
pub use types::IonType;
pub use types::SymbolId;

pub use binary::binary_writer::{BinaryWriter, BinaryWriterBuilder};

pub use result::IonError;
pub use result::IonResult;
