use std::io::Write;

use crate::binary::type_descriptor::{type_descriptor_size_of, write_type_descriptor};
use crate::result::IonResult;

// Ion's length prefixing means that a container's header cannot be written until all of
// its children have been encoded. The writer therefore assembles its output as a tree of
// buffer nodes: scalar values are encoded eagerly into `Atom`s, while each open container
// collects its children in order. When a container closes, its node is appended to the
// parent whole; the type descriptor (with the now-known length) is only produced when the
// finished tree is emitted to the output sink.

/// A node in the encoding buffer: either a fully encoded byte sequence or a container
/// whose length prefix is still pending.
#[derive(Debug)]
pub(crate) enum BufferNode {
    Atom(Vec<u8>),
    Container(ContainerBuffer),
}

impl BufferNode {
    /// The number of bytes this node will contribute to the output stream. Computed on
    /// demand; nothing is cached.
    fn serialized_size(&self) -> usize {
        match self {
            BufferNode::Atom(bytes) => bytes.len(),
            BufferNode::Container(container) => container.serialized_size(),
        }
    }

    pub fn emit_to<W: Write>(&self, sink: &mut W) -> IonResult<()> {
        match self {
            BufferNode::Atom(bytes) => {
                sink.write_all(bytes)?;
                Ok(())
            }
            BufferNode::Container(container) => container.emit_to(sink),
        }
    }
}

/// An in-progress container value: a type code whose length nibble is unresolved, and the
/// encoded children accumulated so far.
#[derive(Debug)]
pub(crate) struct ContainerBuffer {
    type_code: u8,
    children: Vec<BufferNode>,
}

impl ContainerBuffer {
    pub fn new(type_code: u8) -> ContainerBuffer {
        ContainerBuffer {
            type_code,
            children: Vec::new(),
        }
    }

    pub fn type_code(&self) -> u8 {
        self.type_code
    }

    fn children_size(&self) -> usize {
        self.children
            .iter()
            .map(BufferNode::serialized_size)
            .sum()
    }

    fn serialized_size(&self) -> usize {
        let children_size = self.children_size();
        type_descriptor_size_of(children_size) + children_size
    }

    fn emit_to<W: Write>(&self, sink: &mut W) -> IonResult<()> {
        write_type_descriptor(sink, self.type_code, self.children_size())?;
        for child in &self.children {
            child.emit_to(sink)?;
        }
        Ok(())
    }
}

/// An ordered sequence of buffer nodes that can sit on the buffer stack: either a
/// pending [ContainerBuffer] or the tagless top-level `Datagram` that holds a whole
/// stream's worth of values while the writer waits to learn its symbol table.
#[derive(Debug)]
pub(crate) enum BufferSeq {
    Datagram(Vec<BufferNode>),
    Container(ContainerBuffer),
}

impl BufferSeq {
    pub fn append(&mut self, node: BufferNode) {
        match self {
            BufferSeq::Datagram(children) => children.push(node),
            BufferSeq::Container(container) => container.children.push(node),
        }
    }

    /// True if this sequence is the pending annotation wrapper for the value currently
    /// being written.
    pub fn is_annotation_wrapper(&self) -> bool {
        matches!(self, BufferSeq::Container(c) if c.type_code() == 0xE0)
    }
}

/// A stack of buffer sequences, one for each unfinished container the writer has begun.
/// While the stack is non-empty, encoded nodes accumulate in its top sequence; when it is
/// empty, they can be written straight through to the output sink.
#[derive(Debug, Default)]
pub(crate) struct BufferStack {
    stack: Vec<BufferSeq>,
}

impl BufferStack {
    pub fn new() -> BufferStack {
        BufferStack::default()
    }

    pub fn push(&mut self, seq: BufferSeq) {
        self.stack.push(seq);
    }

    pub fn pop(&mut self) -> Option<BufferSeq> {
        self.stack.pop()
    }

    pub fn peek_mut(&mut self) -> Option<&mut BufferSeq> {
        self.stack.last_mut()
    }

    pub fn peek(&self) -> Option<&BufferSeq> {
        self.stack.last()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emit(node: &BufferNode) -> Vec<u8> {
        let mut sink: Vec<u8> = vec![];
        node.emit_to(&mut sink).expect("emit failed");
        sink
    }

    #[test]
    fn test_atom_emits_verbatim() {
        let atom = BufferNode::Atom(vec![0x21, 0x01]);
        assert_eq!(emit(&atom), vec![0x21, 0x01]);
    }

    #[test]
    fn test_container_prefixes_children_with_length() {
        let mut list = ContainerBuffer::new(0xB0);
        list.children.push(BufferNode::Atom(vec![0x21, 0x01]));
        list.children.push(BufferNode::Atom(vec![0x21, 0x02]));
        let node = BufferNode::Container(list);
        assert_eq!(node.serialized_size(), 5);
        assert_eq!(emit(&node), vec![0xB4, 0x21, 0x01, 0x21, 0x02]);
    }

    #[test]
    fn test_empty_container() {
        let node = BufferNode::Container(ContainerBuffer::new(0xD0));
        assert_eq!(emit(&node), vec![0xD0]);
    }

    #[test]
    fn test_nested_container_sizes_computed_inside_out() {
        let mut inner = ContainerBuffer::new(0xB0);
        inner.children.push(BufferNode::Atom(vec![0x83, 0x66, 0x6F, 0x6F]));
        let mut outer = ContainerBuffer::new(0xC0);
        outer.children.push(BufferNode::Container(inner));
        outer.children.push(BufferNode::Atom(vec![0x11]));
        let node = BufferNode::Container(outer);
        // The sexp's declared length covers the list's header as well as its payload.
        assert_eq!(
            emit(&node),
            vec![0xC6, 0xB4, 0x83, 0x66, 0x6F, 0x6F, 0x11]
        );
    }

    #[test]
    fn test_long_container_uses_var_uint_length() {
        let mut list = ContainerBuffer::new(0xB0);
        for _ in 0..7 {
            list.children.push(BufferNode::Atom(vec![0x21, 0x0A]));
        }
        let node = BufferNode::Container(list);
        let bytes = emit(&node);
        // 14 bytes of children forces the length out of the descriptor's low nibble.
        assert_eq!(&bytes[0..2], &[0xBE, 0x8E]);
        assert_eq!(bytes.len(), 16);
    }
}
