use std::io::Write;
use std::mem;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use num_bigint::{BigInt, Sign};
use num_traits::Zero;

use crate::binary::constants::v1_0::IVM;
use crate::binary::decimal::DecimalBinaryEncoder;
use crate::binary::encoding_buffer::{BufferNode, BufferSeq, BufferStack, ContainerBuffer};
use crate::binary::timestamp::TimestampBinaryEncoder;
use crate::binary::type_descriptor::write_type_descriptor;
use crate::binary::uint;
use crate::binary::var_uint::VarUInt;
use crate::result::{
    encoding_error_raw, illegal_operation, illegal_operation_raw, IonError, IonResult,
};
use crate::shared_symbol_table::SharedSymbolTable;
use crate::symbol_table::{LocalSymbolTable, SymbolTableBuilder};
use crate::types::decimal::Decimal;
use crate::types::{ContainerType, IonType, SymbolId};

// Payloads at least this large are emitted as their own atom instead of being copied
// into a combined type-descriptor-and-payload buffer.
const ATOM_FUSE_THRESHOLD: usize = 64;

/// Configures and constructs instances of [BinaryWriter].
pub struct BinaryWriterBuilder {
    imports: Vec<Arc<SharedSymbolTable>>,
    symbol_table: Option<LocalSymbolTable>,
}

impl BinaryWriterBuilder {
    pub fn new() -> Self {
        BinaryWriterBuilder {
            imports: Vec::new(),
            symbol_table: None,
        }
    }

    /// Adds a shared symbol table to the writer's imports. Text that resolves through an
    /// import is written using the import's ID range rather than being added to the
    /// stream's local symbol list. Ignored if a pre-built table is supplied via
    /// [BinaryWriterBuilder::with_symbol_table].
    pub fn with_import(mut self, table: Arc<SharedSymbolTable>) -> Self {
        self.imports.push(table);
        self
    }

    /// Supplies a complete, read-only local symbol table. The writer will emit the table
    /// ahead of the first value and stream subsequent values directly to the sink, but
    /// any field name, annotation, or symbol value that the table cannot resolve is an
    /// error.
    pub fn with_symbol_table(mut self, table: LocalSymbolTable) -> Self {
        self.symbol_table = Some(table);
        self
    }

    /// Creates a new BinaryWriter that will write its encoded output to the provided
    /// io::Write sink.
    pub fn build<W: Write>(self, sink: W) -> IonResult<BinaryWriter<W>> {
        let mut bufs = BufferStack::new();
        let symbols = match self.symbol_table {
            Some(table) => SymbolSource::Table(table),
            None => {
                // With no symbol table up front, every user value has to be held in
                // memory so the accumulated table can be written ahead of it at finish().
                bufs.push(BufferSeq::Datagram(Vec::new()));
                SymbolSource::Builder(SymbolTableBuilder::with_imports(self.imports))
            }
        };

        Ok(BinaryWriter {
            out: sink,
            bufs,
            ctx: vec![ContainerType::TopLevel],
            field_name: None,
            annotations: Vec::new(),
            symbols,
            wrote_local_symbol_table: false,
            error: None,
        })
    }
}

impl Default for BinaryWriterBuilder {
    fn default() -> Self {
        BinaryWriterBuilder::new()
    }
}

// The writer either validates symbol text against a table the user supplied up front or
// interns new text into a table of its own as it goes.
enum SymbolSource {
    Table(LocalSymbolTable),
    Builder(SymbolTableBuilder),
}

/// An application-level binary Ion writer. Field names, annotations, and symbol values
/// are accepted as text and resolved to symbol IDs through the writer's symbol table;
/// in the default configuration the table itself is assembled incrementally and written
/// ahead of the accumulated values when [BinaryWriter::finish] is called.
///
/// The first error the writer encounters is retained: every subsequent operation becomes
/// a no-op that returns the same error, so a sequence of writes can be performed without
/// intermediate checks and the failure observed once at `finish()`.
pub struct BinaryWriter<W: Write> {
    // An io::Write implementation to be used as a sink for encoded data.
    out: W,
    // Encoded-but-unfinished output: one sequence for each open container.
    bufs: BufferStack,
    // Stack tracking which kind of container the writer is currently positioned in.
    ctx: Vec<ContainerType>,
    // The field name of the next value, if one has been set.
    field_name: Option<String>,
    // The annotations to apply to the next value.
    annotations: Vec<String>,
    symbols: SymbolSource,
    wrote_local_symbol_table: bool,
    // The first error encountered, retained to poison subsequent operations.
    error: Option<IonError>,
}

impl<W: Write> BinaryWriter<W> {
    // Runs `op` unless a previous operation failed, in which case the original error is
    // returned again. An error produced by `op` is retained.
    fn guarded(&mut self, op: impl FnOnce(&mut Self) -> IonResult<()>) -> IonResult<()> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        let result = op(self);
        if let Err(error) = &result {
            self.error = Some(error.clone());
        }
        result
    }

    /// Sets the field name for the next value written. Required before each value when
    /// the writer is positioned in a struct; ignored and discarded otherwise.
    pub fn set_field_name<A: AsRef<str>>(&mut self, name: A) {
        self.field_name = Some(name.as_ref().to_owned());
    }

    /// Appends an annotation for the next value written.
    pub fn add_annotation<A: AsRef<str>>(&mut self, annotation: A) {
        self.annotations.push(annotation.as_ref().to_owned());
    }

    /// Replaces the pending annotations with the provided sequence.
    pub fn set_annotations<I, A>(&mut self, annotations: I)
    where
        A: AsRef<str>,
        I: IntoIterator<Item = A>,
    {
        self.annotations.clear();
        for annotation in annotations {
            self.add_annotation(annotation);
        }
    }

    /// If the writer is positioned at the top level, returns `None`. Otherwise, returns
    /// `Some(_)` with the parent container's [IonType].
    pub fn parent_type(&self) -> Option<IonType> {
        // `self.ctx` always has at least one value: the top level.
        self.ctx.last().unwrap().ion_type()
    }

    /// Returns the number of containers that the writer has stepped into without
    /// subsequently stepping out.
    pub fn depth(&self) -> usize {
        self.ctx.len() - 1
    }

    /// Returns a reference to the underlying io::Write implementation.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Returns a mutable reference to the underlying io::Write implementation. Modifying
    /// the underlying sink is an inherently risky operation and can result in unexpected
    /// behavior. It is not recommended for most use cases.
    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    #[inline]
    fn is_in_struct(&self) -> bool {
        self.ctx.last() == Some(&ContainerType::Struct)
    }

    // Hands the node to the current innermost container, or writes it straight through
    // to the sink when no container is open.
    fn emit(&mut self, node: BufferNode) -> IonResult<()> {
        match self.bufs.peek_mut() {
            Some(seq) => {
                seq.append(node);
                Ok(())
            }
            None => node.emit_to(&mut self.out),
        }
    }

    fn emit_seq(&mut self, seq: BufferSeq) -> IonResult<()> {
        match seq {
            BufferSeq::Container(container) => self.emit(BufferNode::Container(container)),
            BufferSeq::Datagram(_) => {
                unreachable!("the top-level datagram is only emitted by finish()")
            }
        }
    }

    // Resolves symbol text to an ID: against the user-supplied table when one was
    // provided, interning otherwise.
    fn resolve(&mut self, text: &str) -> IonResult<SymbolId> {
        match &mut self.symbols {
            SymbolSource::Table(table) => table.find_by_name(text).ok_or_else(|| {
                encoding_error_raw(format!(
                    "symbol '{text}' is not defined in the writer's symbol table"
                ))
            }),
            SymbolSource::Builder(builder) => Ok(builder.add(text).0),
        }
    }

    // Performs the bookkeeping that precedes every value: symbol table interposition,
    // field name encoding, and opening an annotation wrapper when annotations are
    // pending.
    fn begin_value(&mut self) -> IonResult<()> {
        // Snapshot and clear the pending state up front. Writing the symbol table below
        // re-enters the writer, and that recursion must not inherit this value's field
        // name or annotations.
        let field_name = self.field_name.take();
        let annotations = mem::take(&mut self.annotations);

        if !self.wrote_local_symbol_table {
            // A pre-built table can be written as soon as the first value arrives; all
            // values that follow will stream through without buffering.
            let prebuilt_table = match &self.symbols {
                SymbolSource::Table(table) => Some(table.clone()),
                SymbolSource::Builder(_) => None,
            };
            if let Some(table) = prebuilt_table {
                self.wrote_local_symbol_table = true;
                self.write_local_symbol_table(&table)?;
            }
        }

        if self.is_in_struct() {
            let field_name = field_name.ok_or_else(|| {
                illegal_operation_raw("`set_field_name()` must be called before each field in a struct")
            })?;
            let id = self.resolve(&field_name)?;
            let mut encoded = Vec::with_capacity(2);
            VarUInt::write_u64(&mut encoded, id as u64)?;
            self.emit(BufferNode::Atom(encoded))?;
        }

        if !annotations.is_empty() {
            let mut ids: Vec<u64> = Vec::with_capacity(annotations.len());
            for annotation in &annotations {
                ids.push(self.resolve(annotation)? as u64);
            }
            let id_sequence_size: u64 = ids
                .iter()
                .map(|&id| VarUInt::encoded_size_of(id) as u64)
                .sum();

            let mut encoded = Vec::with_capacity(id_sequence_size as usize + 2);
            VarUInt::write_u64(&mut encoded, id_sequence_size)?;
            for id in ids {
                VarUInt::write_u64(&mut encoded, id)?;
            }

            // The wrapped value is appended to this container; end_value() closes it.
            self.bufs
                .push(BufferSeq::Container(ContainerBuffer::new(0xE0)));
            self.emit(BufferNode::Atom(encoded))?;
        }

        Ok(())
    }

    // If the value just written was annotated, closes its annotation wrapper and hands
    // the whole wrapper up a level.
    fn end_value(&mut self) -> IonResult<()> {
        if self.bufs.peek().is_some_and(BufferSeq::is_annotation_wrapper) {
            let wrapper = self
                .bufs
                .pop()
                .expect("the annotation wrapper was just observed");
            self.emit_seq(wrapper)?;
        }
        Ok(())
    }

    // Handles before-and-after tasks common to writing all non-container values.
    // `encode_fn` appends the value's type descriptor and payload to the provided
    // buffer.
    fn write_scalar(
        &mut self,
        encode_fn: impl FnOnce(&mut Vec<u8>) -> IonResult<()>,
    ) -> IonResult<()> {
        self.begin_value()?;
        let mut encoded = Vec::new();
        encode_fn(&mut encoded)?;
        self.emit(BufferNode::Atom(encoded))?;
        self.end_value()
    }

    /// Writes an Ion null of the specified type.
    pub fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.guarded(|writer| {
            writer.write_scalar(|enc_buffer| {
                let byte: u8 = match ion_type {
                    IonType::Null => 0x0F,
                    IonType::Bool => 0x1F,
                    IonType::Int => 0x2F,
                    IonType::Float => 0x4F,
                    IonType::Decimal => 0x5F,
                    IonType::Timestamp => 0x6F,
                    IonType::Symbol => 0x7F,
                    IonType::String => 0x8F,
                    IonType::Clob => 0x9F,
                    IonType::Blob => 0xAF,
                    IonType::List => 0xBF,
                    IonType::SExp => 0xCF,
                    IonType::Struct => 0xDF,
                };
                enc_buffer.push(byte);
                Ok(())
            })
        })
    }

    /// Writes an Ion boolean with the specified value.
    pub fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.guarded(|writer| {
            writer.write_scalar(|enc_buffer| {
                let byte: u8 = if value { 0x11 } else { 0x10 };
                enc_buffer.push(byte);
                Ok(())
            })
        })
    }

    /// Writes an Ion integer with the specified value.
    pub fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.guarded(|writer| {
            writer.write_scalar(|enc_buffer| {
                let magnitude: u64 = value.unsigned_abs();
                let encoded = uint::encode(magnitude);
                let bytes_to_write = encoded.as_bytes();

                let type_code: u8 = if value >= 0 { 0x20 } else { 0x30 };
                write_type_descriptor(enc_buffer, type_code, bytes_to_write.len())?;
                enc_buffer.extend_from_slice(bytes_to_write);
                Ok(())
            })
        })
    }

    /// Writes an Ion integer of arbitrary magnitude.
    pub fn write_big_int(&mut self, value: &BigInt) -> IonResult<()> {
        self.guarded(|writer| {
            writer.begin_value()?;
            writer.encode_big_int(value)?;
            writer.end_value()
        })
    }

    fn encode_big_int(&mut self, value: &BigInt) -> IonResult<()> {
        if value.is_zero() {
            return self.emit(BufferNode::Atom(vec![0x20]));
        }

        let (sign, magnitude_be_bytes) = value.to_bytes_be();
        let type_code: u8 = match sign {
            Sign::Plus | Sign::NoSign => 0x20,
            Sign::Minus => 0x30,
        };

        if magnitude_be_bytes.len() < ATOM_FUSE_THRESHOLD {
            let mut encoded = Vec::with_capacity(magnitude_be_bytes.len() + 2);
            write_type_descriptor(&mut encoded, type_code, magnitude_be_bytes.len())?;
            encoded.extend_from_slice(&magnitude_be_bytes);
            return self.emit(BufferNode::Atom(encoded));
        }

        // No sense in copying a large magnitude; the descriptor gets its own atom.
        let mut descriptor = Vec::with_capacity(4);
        write_type_descriptor(&mut descriptor, type_code, magnitude_be_bytes.len())?;
        self.emit(BufferNode::Atom(descriptor))?;
        self.emit(BufferNode::Atom(magnitude_be_bytes))
    }

    /// Writes an Ion float with the specified value.
    pub fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.guarded(|writer| {
            writer.write_scalar(|enc_buffer| {
                // An IEEE-754 comparison: negative zero also takes the compact encoding.
                if value == 0f64 {
                    enc_buffer.push(0x40);
                    return Ok(());
                }

                enc_buffer.push(0x48);
                enc_buffer.extend_from_slice(&value.to_be_bytes());
                Ok(())
            })
        })
    }

    /// Writes an Ion decimal with the specified value.
    pub fn write_decimal(&mut self, value: &Decimal) -> IonResult<()> {
        self.guarded(|writer| {
            writer.write_scalar(|enc_buffer| {
                enc_buffer.encode_decimal_value(value)?;
                Ok(())
            })
        })
    }

    /// Writes an Ion timestamp with the specified value. The encoded fields are the
    /// instant in UTC; the value's own offset is recorded alongside them in minutes.
    pub fn write_timestamp(&mut self, value: &DateTime<FixedOffset>) -> IonResult<()> {
        self.guarded(|writer| {
            writer.write_scalar(|enc_buffer| {
                enc_buffer.encode_timestamp_value(value)?;
                Ok(())
            })
        })
    }

    /// Writes an Ion symbol with the specified text. In the default configuration the
    /// text is added to the stream's symbol table if it is not already present; a writer
    /// constructed with a read-only symbol table returns an error instead.
    pub fn write_symbol<A: AsRef<str>>(&mut self, value: A) -> IonResult<()> {
        self.guarded(|writer| {
            let id = writer.resolve(value.as_ref())? as u64;
            writer.write_scalar(|enc_buffer| {
                let encoded = uint::encode(id);
                let bytes_to_write = encoded.as_bytes();
                write_type_descriptor(enc_buffer, 0x70, bytes_to_write.len())?;
                enc_buffer.extend_from_slice(bytes_to_write);
                Ok(())
            })
        })
    }

    /// Writes an Ion string with the specified text.
    pub fn write_string<A: AsRef<str>>(&mut self, value: A) -> IonResult<()> {
        self.guarded(|writer| {
            writer.write_scalar(|enc_buffer| {
                let text: &str = value.as_ref();
                write_type_descriptor(enc_buffer, 0x80, text.len())?;
                enc_buffer.extend_from_slice(text.as_bytes());
                Ok(())
            })
        })
    }

    /// Writes an Ion clob with the specified bytes.
    pub fn write_clob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()> {
        self.guarded(|writer| writer.write_lob(0x90, value.as_ref()))
    }

    /// Writes an Ion blob with the specified bytes.
    pub fn write_blob<A: AsRef<[u8]>>(&mut self, value: A) -> IonResult<()> {
        self.guarded(|writer| writer.write_lob(0xA0, value.as_ref()))
    }

    fn write_lob(&mut self, type_code: u8, value: &[u8]) -> IonResult<()> {
        self.begin_value()?;
        if value.len() < ATOM_FUSE_THRESHOLD {
            let mut encoded = Vec::with_capacity(value.len() + 2);
            write_type_descriptor(&mut encoded, type_code, value.len())?;
            encoded.extend_from_slice(value);
            self.emit(BufferNode::Atom(encoded))?;
        } else {
            let mut descriptor = Vec::with_capacity(4);
            write_type_descriptor(&mut descriptor, type_code, value.len())?;
            self.emit(BufferNode::Atom(descriptor))?;
            self.emit(BufferNode::Atom(value.to_vec()))?;
        }
        self.end_value()
    }

    /// Begins writing an Ion list.
    pub fn begin_list(&mut self) -> IonResult<()> {
        self.guarded(|writer| writer.begin_container(ContainerType::List, 0xB0))
    }

    /// Ends the list currently being written.
    pub fn end_list(&mut self) -> IonResult<()> {
        self.guarded(|writer| writer.end_container(ContainerType::List))
    }

    /// Begins writing an Ion s-expression.
    pub fn begin_sexp(&mut self) -> IonResult<()> {
        self.guarded(|writer| writer.begin_container(ContainerType::SExpression, 0xC0))
    }

    /// Ends the s-expression currently being written.
    pub fn end_sexp(&mut self) -> IonResult<()> {
        self.guarded(|writer| writer.end_container(ContainerType::SExpression))
    }

    /// Begins writing an Ion struct. Each value written inside requires a preceding
    /// call to [BinaryWriter::set_field_name].
    pub fn begin_struct(&mut self) -> IonResult<()> {
        self.guarded(|writer| writer.begin_container(ContainerType::Struct, 0xD0))
    }

    /// Ends the struct currently being written.
    pub fn end_struct(&mut self) -> IonResult<()> {
        self.guarded(|writer| writer.end_container(ContainerType::Struct))
    }

    fn begin_container(&mut self, container_type: ContainerType, type_code: u8) -> IonResult<()> {
        self.begin_value()?;
        self.ctx.push(container_type);
        self.bufs
            .push(BufferSeq::Container(ContainerBuffer::new(type_code)));
        Ok(())
    }

    fn end_container(&mut self, container_type: ContainerType) -> IonResult<()> {
        if self.ctx.last().copied() != Some(container_type) {
            let requested = container_type
                .ion_type()
                .expect("end_container is never called with the top level");
            return illegal_operation(format!(
                "cannot end a {requested}: the writer is not positioned in one"
            ));
        }

        let seq = self
            .bufs
            .pop()
            .expect("a matching container context implies a buffered container");
        self.emit_seq(seq)?;

        self.field_name = None;
        self.annotations.clear();
        self.ctx.pop();

        self.end_value()
    }

    // Writes the Ion version marker followed by the serialized form of `table`. A table
    // with no local symbols and no imports beyond the system table serializes to nothing
    // beyond the version marker.
    fn write_local_symbol_table(&mut self, table: &LocalSymbolTable) -> IonResult<()> {
        self.emit(BufferNode::Atom(IVM.to_vec()))?;

        let imports = table.serialized_imports();
        if imports.is_empty() && table.symbols().is_empty() {
            return Ok(());
        }

        self.add_annotation("$ion_symbol_table");
        self.begin_struct()?;

        if !imports.is_empty() {
            self.set_field_name("imports");
            self.begin_list()?;
            for import in imports {
                self.begin_struct()?;
                self.set_field_name("name");
                self.write_string(import.name())?;
                self.set_field_name("version");
                self.write_i64(import.version() as i64)?;
                self.set_field_name("max_id");
                self.write_i64(import.max_id() as i64)?;
                self.end_struct()?;
            }
            self.end_list()?;
        }

        if !table.symbols().is_empty() {
            self.set_field_name("symbols");
            self.begin_list()?;
            for symbol in table.symbols() {
                self.write_string(symbol)?;
            }
            self.end_list()?;
        }

        self.end_struct()
    }

    /// Serializes `table` as a `$ion_shared_symbol_table` struct so that it can be
    /// distributed out-of-band and imported by other streams.
    pub fn write_shared_symbol_table(&mut self, table: &SharedSymbolTable) -> IonResult<()> {
        self.guarded(|writer| {
            writer.add_annotation("$ion_shared_symbol_table");
            writer.begin_struct()?;

            writer.set_field_name("name");
            writer.write_string(table.name())?;

            writer.set_field_name("version");
            writer.write_i64(table.version() as i64)?;

            writer.set_field_name("symbols");
            writer.begin_list()?;
            for symbol in table.symbols() {
                writer.write_string(symbol)?;
            }
            writer.end_list()?;

            writer.end_struct()
        })
    }

    /// Flushes any buffered values to the sink, preceded by the symbol table that was
    /// accumulated while writing them. Returns the first error the writer encountered,
    /// if any. Calling `finish` again afterwards reports the same outcome without
    /// emitting additional bytes.
    pub fn finish(&mut self) -> IonResult<()> {
        self.guarded(|writer| {
            if writer.ctx.last().copied() != Some(ContainerType::TopLevel) {
                return illegal_operation(
                    "cannot call finish() while the writer is positioned within a container",
                );
            }

            writer.field_name = None;
            writer.annotations.clear();
            writer.wrote_local_symbol_table = false;

            if let Some(seq) = writer.bufs.pop() {
                assert!(
                    writer.bufs.is_empty(),
                    "multiple buffer sequences remained at the top level"
                );
                let children = match seq {
                    BufferSeq::Datagram(children) => children,
                    BufferSeq::Container(_) => {
                        unreachable!("a container buffer survived to the top level")
                    }
                };
                let table = match &writer.symbols {
                    SymbolSource::Builder(builder) => builder.build(),
                    SymbolSource::Table(_) => {
                        unreachable!("a read-only symbol table is written eagerly, not buffered")
                    }
                };

                // The buffer stack is now empty, so the marker and table flush straight
                // through to the sink ahead of the values that reference them.
                writer.write_local_symbol_table(&table)?;
                for child in &children {
                    child.emit_to(&mut writer.out)?;
                }
            }

            Ok(())
        })
    }
}
