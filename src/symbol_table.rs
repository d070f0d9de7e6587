use std::sync::Arc;

use delegate::delegate;
use rustc_hash::FxHashMap;

use crate::shared_symbol_table::SharedSymbolTable;
use crate::types::SymbolId;

/// A local symbol table: the in-band mapping from symbol IDs to text that travels with
/// the binary data it describes. It may incorporate [SharedSymbolTable]s by reference;
/// the `$ion` system table is always its first import.
///
/// Import `i` owns the ID range `(offset[i], offset[i] + max_id]`. IDs for symbols local
/// to this table begin immediately after the last import's range.
#[derive(Debug, Clone)]
pub struct LocalSymbolTable {
    imports: Vec<Arc<SharedSymbolTable>>,
    offsets: Vec<usize>,
    max_import_id: usize,

    symbols: Vec<String>,
    ids_by_text: FxHashMap<String, SymbolId>,
}

impl LocalSymbolTable {
    /// Creates a new local symbol table from the provided imports and local symbols.
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(
        imports: Vec<Arc<SharedSymbolTable>>,
        symbols: I,
    ) -> LocalSymbolTable {
        let (imports, offsets, max_import_id) = process_imports(imports);

        let mut table = LocalSymbolTable {
            imports,
            offsets,
            max_import_id,
            symbols: Vec::new(),
            ids_by_text: FxHashMap::default(),
        };
        for symbol in symbols {
            let symbol = symbol.into();
            // A symbol that repeats within the local list keeps its first ID.
            if !table.ids_by_text.contains_key(&symbol) {
                table.intern(symbol);
            }
        }
        table
    }

    /// Returns the maximum ID this symbol table defines.
    pub fn max_id(&self) -> usize {
        self.max_import_id + self.symbols.len()
    }

    /// Finds the ID of a symbol by its text. Imports are searched in declaration order
    /// before the local symbols; the first match wins.
    pub fn find_by_name(&self, text: &str) -> Option<SymbolId> {
        for (import, offset) in self.imports.iter().zip(&self.offsets) {
            if let Some(id) = import.find_by_name(text) {
                return Some(offset + id);
            }
        }
        self.ids_by_text.get(text).copied()
    }

    /// Finds the text of a symbol given its ID.
    pub fn find_by_id(&self, id: SymbolId) -> Option<&str> {
        if id == 0 {
            return None;
        }
        if id <= self.max_import_id {
            return self.find_by_id_in_imports(id);
        }

        // Local to this symbol table.
        self.symbols
            .get(id - self.max_import_id - 1)
            .map(String::as_str)
    }

    fn find_by_id_in_imports(&self, id: SymbolId) -> Option<&str> {
        // Offsets are ascending; locate the last import whose range begins below `id`.
        // An import with no symbols owns an empty range and can never match.
        let import_index = self.offsets.partition_point(|&offset| offset < id) - 1;
        self.imports[import_index].find_by_id(id - self.offsets[import_index])
    }

    /// The symbols local to this table, in ID order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The imports this table references, including the implicit system table at
    /// position zero.
    pub fn imports(&self) -> &[Arc<SharedSymbolTable>] {
        &self.imports
    }

    // The imports that need to appear in the table's serialized form. The system table
    // is implied by the Ion version and is never written out.
    pub(crate) fn serialized_imports(&self) -> &[Arc<SharedSymbolTable>] {
        &self.imports[1..]
    }

    // Appends `symbol` to the local symbol list, returning its new ID. The caller must
    // confirm the symbol is not already defined.
    fn intern(&mut self, symbol: String) -> SymbolId {
        self.symbols.push(symbol.clone());
        let id = self.max_import_id + self.symbols.len();
        self.ids_by_text.insert(symbol, id);
        id
    }
}

impl Default for LocalSymbolTable {
    fn default() -> Self {
        LocalSymbolTable::new::<String, _>(vec![], [])
    }
}

// Prepends the `$ion` system table to the import list unless the caller has already
// supplied a table by that name in the leading position, then computes each import's ID
// offset. Offsets are cumulative: import `i` owns IDs `(offset[i], offset[i] + max_id]`.
fn process_imports(
    imports: Vec<Arc<SharedSymbolTable>>,
) -> (Vec<Arc<SharedSymbolTable>>, Vec<usize>, usize) {
    let mut processed: Vec<Arc<SharedSymbolTable>> =
        Vec::with_capacity(imports.len() + 1);
    if imports.first().map(|table| table.name()) != Some("$ion") {
        processed.push(Arc::clone(SharedSymbolTable::system()));
    }
    processed.extend(imports);

    let mut offsets = Vec::with_capacity(processed.len());
    let mut max_id = 0;
    for import in &processed {
        offsets.push(max_id);
        max_id += import.max_id();
    }

    (processed, offsets, max_id)
}

/// Iteratively builds the [LocalSymbolTable] for a stream as the writer encounters field
/// names, annotations, and symbol values.
#[derive(Debug, Clone)]
pub struct SymbolTableBuilder {
    table: LocalSymbolTable,
}

impl SymbolTableBuilder {
    /// Creates a builder whose table imports only the system symbols.
    pub fn new() -> SymbolTableBuilder {
        SymbolTableBuilder::with_imports(vec![])
    }

    /// Creates a builder whose table imports the provided shared tables (in addition to
    /// the implicit system table).
    pub fn with_imports(imports: Vec<Arc<SharedSymbolTable>>) -> SymbolTableBuilder {
        SymbolTableBuilder {
            table: LocalSymbolTable::new::<String, _>(imports, []),
        }
    }

    /// Adds a symbol to the table under construction. Returns the symbol's ID and a flag
    /// indicating whether the symbol was newly added (`true`) or already present
    /// (`false`), whether in an import or in the local symbol list.
    pub fn add(&mut self, symbol: &str) -> (SymbolId, bool) {
        if let Some(id) = self.table.find_by_name(symbol) {
            return (id, false);
        }
        (self.table.intern(symbol.to_owned()), true)
    }

    /// Creates a snapshot of the table built so far. The snapshot is unaffected by
    /// symbols added to this builder afterwards.
    pub fn build(&self) -> LocalSymbolTable {
        self.table.clone()
    }

    delegate! {
        to self.table {
            pub fn find_by_name(&self, text: &str) -> Option<SymbolId>;
            pub fn find_by_id(&self, id: SymbolId) -> Option<&str>;
            pub fn max_id(&self) -> usize;
        }
    }
}

impl Default for SymbolTableBuilder {
    fn default() -> Self {
        SymbolTableBuilder::new()
    }
}

#[cfg(test)]
mod symbol_table_tests {
    use super::*;
    use crate::result::IonResult;

    fn animals() -> Arc<SharedSymbolTable> {
        Arc::new(SharedSymbolTable::new("animals", 1, ["cat", "dog", "emu"]).unwrap())
    }

    #[test]
    fn test_system_table_is_always_imported() {
        let table = LocalSymbolTable::default();
        assert_eq!(table.max_id(), 9);
        assert_eq!(table.find_by_name("$ion_symbol_table"), Some(3));
        assert_eq!(table.find_by_id(7), Some("symbols"));
    }

    #[test]
    fn test_imported_symbols_are_offset() {
        let table = LocalSymbolTable::new(vec![animals()], ["foo", "bar"]);
        // 9 system symbols, then the animals import, then the locals.
        assert_eq!(table.max_id(), 14);
        assert_eq!(table.find_by_name("dog"), Some(11));
        assert_eq!(table.find_by_id(10), Some("cat"));
        assert_eq!(table.find_by_name("foo"), Some(13));
        assert_eq!(table.find_by_id(14), Some("bar"));
        assert_eq!(table.find_by_id(15), None);
    }

    #[test]
    fn test_duplicate_local_symbols_collapse_to_first_occurrence() {
        let table = LocalSymbolTable::new(vec![], ["a", "b", "a"]);
        assert_eq!(table.symbols(), &["a".to_owned(), "b".to_owned()]);
        assert_eq!(table.max_id(), 11);
        assert_eq!(table.find_by_name("a"), Some(10));
        assert_eq!(table.find_by_id(11), Some("b"));
        assert_eq!(table.find_by_id(12), None);
    }

    #[test]
    fn test_imports_shadow_local_symbols() {
        // "dog" resolves through the import even though it also appears locally.
        let table = LocalSymbolTable::new(vec![animals()], ["dog"]);
        assert_eq!(table.find_by_name("dog"), Some(11));
        // The local slot still owns its ID.
        assert_eq!(table.find_by_id(13), Some("dog"));
    }

    #[test]
    fn test_builder_reuses_existing_ids() {
        let mut builder = SymbolTableBuilder::with_imports(vec![animals()]);
        assert_eq!(builder.add("name"), (4, false)); // System symbol
        assert_eq!(builder.add("emu"), (12, false)); // Imported symbol
        assert_eq!(builder.add("quokka"), (13, true));
        assert_eq!(builder.add("quokka"), (13, false));
        assert_eq!(builder.max_id(), 13);
    }

    #[test]
    fn test_builder_snapshots_are_independent() {
        let mut builder = SymbolTableBuilder::new();
        builder.add("foo");
        let snapshot = builder.build();
        builder.add("bar");

        assert_eq!(snapshot.max_id(), 10);
        assert_eq!(snapshot.find_by_name("bar"), None);
        assert_eq!(builder.find_by_name("bar"), Some(11));
    }

    #[test]
    fn test_explicit_system_import_is_not_duplicated() -> IonResult<()> {
        let system = Arc::clone(SharedSymbolTable::system());
        let table = LocalSymbolTable::new(vec![system], ["foo"]);
        assert_eq!(table.max_id(), 10);
        assert_eq!(table.find_by_name("foo"), Some(10));
        Ok(())
    }
}
