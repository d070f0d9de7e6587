/// Constants for Ion v1.0
pub(crate) mod v1_0 {
    // The indexes in this slice are off by one relative to the corresponding Ion symbol ID.
    // This is because it does not contain symbol ID `0`-the symbol with unknown text.
    pub static SYSTEM_SYMBOLS: &[&str] = &[
        // <unknown text>              $0
        "$ion",                     // $1
        "$ion_1_0",                 // $2
        "$ion_symbol_table",        // $3
        "name",                     // $4
        "version",                  // $5
        "imports",                  // $6
        "symbols",                  // $7
        "max_id",                   // $8
        "$ion_shared_symbol_table", // $9
    ];

    #[allow(dead_code)]
    pub(crate) mod system_symbol_ids {
        pub const ION: usize = 1;
        pub const ION_SYMBOL_TABLE: usize = 3;
        pub const ION_SHARED_SYMBOL_TABLE: usize = 9;
    }
}
