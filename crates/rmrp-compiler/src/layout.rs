//! Constant-buffer layout allocation.
//!
//! Parameters are packed in declaration order into 4-word (16-byte) groups.
//! A parameter never straddles a group boundary: when it does not fit in the
//! remainder of the current group, the remainder is padded and the parameter
//! starts the next group. Vectors are never split.

use std::collections::HashMap;

use crate::error::CompileError;
use crate::params::{validate_declarations, ParamKind, ParameterDeclaration};

/// Words per constant-buffer register (16 bytes).
pub const WORDS_PER_GROUP: u32 = 4;

/// Value written into padding words.
pub const FILLER: f32 = 0.0;

/// Placement of one parameter in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSlot {
    pub name: String,
    pub kind: ParamKind,
    /// First word of the parameter.
    pub word_offset: u32,
    /// Number of words, 1..=4.
    pub word_count: u32,
}

impl BufferSlot {
    #[inline]
    pub fn byte_offset(&self) -> u32 {
        self.word_offset * 4
    }

    /// Range of words covered by this slot, usable to index the value array.
    #[inline]
    pub fn words(&self) -> std::ops::Range<usize> {
        let start = self.word_offset as usize;
        start..start + self.word_count as usize
    }

    /// `packoffset` target, e.g. `c1.y` for word 5.
    pub fn register(&self) -> String {
        const COMPONENTS: [char; 4] = ['x', 'y', 'z', 'w'];
        let reg = self.word_offset / WORDS_PER_GROUP;
        let comp = COMPONENTS[(self.word_offset % WORDS_PER_GROUP) as usize];
        format!("c{reg}.{comp}")
    }

    /// `true` when all words sit in one 4-word group.
    #[inline]
    pub fn is_within_group(&self) -> bool {
        self.word_offset / WORDS_PER_GROUP
            == (self.word_offset + self.word_count - 1) / WORDS_PER_GROUP
    }
}

/// Ordered slots plus the padded total size.
///
/// A layout belongs to the artifact that produced it and is rebuilt wholesale
/// on every compile; offsets are never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BufferLayout {
    slots: Vec<BufferSlot>,
    by_name: HashMap<String, usize>,
    total_words: u32,
}

impl BufferLayout {
    /// Slots in declaration order.
    pub fn slots(&self) -> &[BufferSlot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&BufferSlot> {
        self.by_name.get(name).map(|&i| &self.slots[i])
    }

    /// Padded size in words; always a multiple of [`WORDS_PER_GROUP`].
    #[inline]
    pub fn total_words(&self) -> u32 {
        self.total_words
    }

    #[inline]
    pub fn byte_size(&self) -> u64 {
        self.total_words as u64 * 4
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Name to word-offset table in declaration order.
    pub fn offsets(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.slots.iter().map(|s| (s.name.as_str(), s.word_offset))
    }
}

/// A freshly allocated layout together with its default buffer image.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub layout: BufferLayout,
    /// `layout.total_words()` words: declared defaults plus filler.
    pub defaults: Vec<f32>,
}

// ── Allocator ─────────────────────────────────────────────────────────────

struct Allocator {
    layout: BufferLayout,
    values: Vec<f32>,
    word_in_group: u32,
}

impl Allocator {
    fn new(capacity: usize) -> Self {
        Self {
            layout: BufferLayout::default(),
            values: Vec::with_capacity(capacity * WORDS_PER_GROUP as usize),
            word_in_group: 0,
        }
    }

    fn pad_group(&mut self) {
        while self.word_in_group != 0 {
            self.values.push(FILLER);
            self.word_in_group = (self.word_in_group + 1) % WORDS_PER_GROUP;
        }
    }

    fn push(&mut self, decl: &ParameterDeclaration) {
        let words = decl.value.words();
        let word_count = words.len() as u32;

        if self.word_in_group + word_count > WORDS_PER_GROUP {
            self.pad_group();
        }

        let slot = BufferSlot {
            name: decl.name.clone(),
            kind: decl.kind(),
            word_offset: self.values.len() as u32,
            word_count,
        };
        self.layout.by_name.insert(slot.name.clone(), self.layout.slots.len());
        self.layout.slots.push(slot);

        self.values.extend_from_slice(words);
        self.word_in_group = (self.word_in_group + word_count) % WORDS_PER_GROUP;
    }

    fn finish(mut self) -> Allocation {
        self.pad_group();
        self.layout.total_words = self.values.len() as u32;
        Allocation { layout: self.layout, defaults: self.values }
    }
}

/// Packs `decls` into a straddle-free layout.
///
/// Names are validated first; a rejected list never produces a layout.
pub fn allocate(decls: &[ParameterDeclaration]) -> Result<Allocation, CompileError> {
    validate_declarations(decls)?;

    let mut allocator = Allocator::new(decls.len());
    for decl in decls {
        allocator.push(decl);
    }
    let allocation = allocator.finish();

    log::debug!(
        "allocated {} parameter(s) into {} word(s)",
        allocation.layout.slots.len(),
        allocation.layout.total_words
    );
    Ok(allocation)
}
