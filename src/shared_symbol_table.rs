use std::sync::{Arc, OnceLock};

use rustc_hash::FxHashMap;

use crate::constants::v1_0;
use crate::result::{illegal_operation, IonResult};
use crate::types::SymbolId;

/// An immutable, versioned collection of symbols distributed out-of-band and referenced
/// from a [LocalSymbolTable](crate::LocalSymbolTable) to save space.
/// For more information, see:
/// <https://amazon-ion.github.io/ion-docs/docs/symbols.html#shared-symbol-tables>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedSymbolTable {
    name: String,
    version: usize,
    symbols: Vec<String>,
    ids_by_text: FxHashMap<String, SymbolId>,
}

impl SharedSymbolTable {
    /// Constructs a new shared symbol table. Symbol IDs are assigned in the order the
    /// symbols appear; a symbol that appears more than once keeps the ID of its first
    /// occurrence.
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(
        name: S,
        version: usize,
        symbols: I,
    ) -> IonResult<SharedSymbolTable> {
        let name = name.into();
        // As per the Ion specification, the name field must be a string with length at
        // least one and the version must be at least one.
        if name.is_empty() {
            return illegal_operation("shared symbol table with empty name is not allowed");
        }
        if version < 1 {
            return illegal_operation("shared symbol table version must be at least one");
        }

        let (symbols, ids_by_text) = build_index(symbols);
        Ok(SharedSymbolTable {
            name,
            version,
            symbols,
            ids_by_text,
        })
    }

    /// Returns the name of this table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the version of this table.
    pub fn version(&self) -> usize {
        self.version
    }

    /// Returns the largest symbol ID this table defines. IDs are 1-based, so this is
    /// also the number of symbols in the table.
    pub fn max_id(&self) -> usize {
        self.symbols.len()
    }

    /// Returns the symbols defined in this table in ID order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Finds the ID of a symbol by its text. IDs are local to this table.
    pub fn find_by_name(&self, text: &str) -> Option<SymbolId> {
        self.ids_by_text.get(text).copied()
    }

    /// Finds the text of a symbol given its ID.
    pub fn find_by_id(&self, id: SymbolId) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.symbols.get(id - 1).map(String::as_str)
    }

    /// Returns the `$ion` v1 system symbol table that is implicitly imported by every
    /// local symbol table.
    pub fn system() -> &'static Arc<SharedSymbolTable> {
        static SYSTEM_TABLE: OnceLock<Arc<SharedSymbolTable>> = OnceLock::new();
        SYSTEM_TABLE.get_or_init(|| {
            let table = SharedSymbolTable::new("$ion", 1, v1_0::SYSTEM_SYMBOLS.iter().copied())
                .expect("the system symbol table is well-formed");
            Arc::new(table)
        })
    }
}

// Assigns an ID to each distinct symbol, collapsing duplicates to their first occurrence.
fn build_index<S: Into<String>, I: IntoIterator<Item = S>>(
    symbols: I,
) -> (Vec<String>, FxHashMap<String, SymbolId>) {
    let mut distinct_symbols = Vec::new();
    let mut ids_by_text = FxHashMap::default();

    for symbol in symbols {
        let symbol = symbol.into();
        if !ids_by_text.contains_key(&symbol) {
            distinct_symbols.push(symbol.clone());
            ids_by_text.insert(symbol, distinct_symbols.len());
        }
    }

    (distinct_symbols, ids_by_text)
}

#[cfg(test)]
mod shared_symbol_table_tests {
    use super::*;
    use crate::constants::v1_0::system_symbol_ids;

    #[test]
    fn test_empty_name_is_rejected() {
        assert!(SharedSymbolTable::new("", 1, ["foo"]).is_err());
    }

    #[test]
    fn test_zero_version_is_rejected() {
        assert!(SharedSymbolTable::new("test.symbols", 0, ["foo"]).is_err());
    }

    #[test]
    fn test_lookup_by_name_and_id() -> IonResult<()> {
        let table = SharedSymbolTable::new("test.symbols", 1, ["fee", "fie", "foe"])?;
        assert_eq!(table.max_id(), 3);
        assert_eq!(table.find_by_name("fie"), Some(2));
        assert_eq!(table.find_by_name("fum"), None);
        assert_eq!(table.find_by_id(3), Some("foe"));
        assert_eq!(table.find_by_id(0), None);
        assert_eq!(table.find_by_id(4), None);
        Ok(())
    }

    #[test]
    fn test_duplicates_collapse_to_first_occurrence() -> IonResult<()> {
        let table = SharedSymbolTable::new("test.symbols", 1, ["fee", "fie", "fee"])?;
        assert_eq!(table.max_id(), 2);
        assert_eq!(table.find_by_name("fee"), Some(1));
        assert_eq!(table.find_by_id(2), Some("fie"));
        Ok(())
    }

    #[test]
    fn test_system_table() {
        let system = SharedSymbolTable::system();
        assert_eq!(system.name(), "$ion");
        assert_eq!(system.version(), 1);
        assert_eq!(system.max_id(), 9);
        assert_eq!(
            system.find_by_name("$ion_symbol_table"),
            Some(system_symbol_ids::ION_SYMBOL_TABLE)
        );
        assert_eq!(
            system.find_by_id(system_symbol_ids::ION_SHARED_SYMBOL_TABLE),
            Some("$ion_shared_symbol_table")
        );
    }
}
