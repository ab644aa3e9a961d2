//! # Chunker - bounded-size string parts
//!
//! Splits a serialized document into an ordered sequence of parts, each no
//! larger than a fixed maximum, and stitches them back together on read.
//!
//! ```text
//! "aaaabbbbcc"  --split(4)-->  ["aaaa", "bbbb", "cc"]  (chunked, 3 parts)
//! "aaaa"        --split(4)-->  ["aaaa"]                (not chunked)
//! ```
//!
//! Sizes are measured in bytes, the unit stores enforce. A part never ends in
//! the middle of a UTF-8 sequence, so for non-ASCII input a part may be a few
//! bytes shorter than the maximum.
//!
//! Reconstruction is best-effort: a missing part contributes nothing and is
//! reported in [`Reconstructed::missing`] instead of failing the read.

/// Returns the byte length of a serialized document.
///
/// This is the single measure every threshold decision is made against.
#[inline]
#[must_use]
pub fn size_of(serialized: &str) -> usize {
    serialized.len()
}

/// Number of parts [`split`] produces for `len` bytes of ASCII input.
#[must_use]
pub fn part_count_for(len: usize, max_part_size: usize) -> usize {
    if len <= max_part_size {
        1
    } else {
        len.div_ceil(max_part_size)
    }
}

/// The ordered parts of one serialized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSet {
    parts: Vec<String>,
    chunked: bool,
}

impl ChunkSet {
    /// A document that fits in one property.
    pub fn single(data: String) -> Self {
        Self {
            parts: vec![data],
            chunked: false,
        }
    }

    /// `true` when the document needed more than one part.
    #[must_use]
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<String> {
        self.parts
    }

    /// Total byte length across all parts.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.parts.iter().map(String::len).sum()
    }

    /// Every part wrapped as present, ready for [`reconstruct`].
    pub fn slots(&self) -> Vec<Option<&str>> {
        self.parts.iter().map(|p| Some(p.as_str())).collect()
    }
}

/// Splits `data` left-to-right into parts of at most `max_part_size` bytes.
///
/// Input that already fits yields a single, non-chunked part (the empty
/// string included). Every part except the last is exactly `max_part_size`
/// bytes for ASCII input.
///
/// # Panics
///
/// Panics if `max_part_size` is zero.
pub fn split(data: &str, max_part_size: usize) -> ChunkSet {
    assert!(max_part_size > 0, "max_part_size must be > 0");

    if data.len() <= max_part_size {
        return ChunkSet::single(data.to_string());
    }

    let mut parts = Vec::with_capacity(part_count_for(data.len(), max_part_size));
    let mut rest = data;
    while !rest.is_empty() {
        let cut = cut_point(rest, max_part_size);
        let (head, tail) = rest.split_at(cut);
        parts.push(head.to_string());
        rest = tail;
    }

    ChunkSet {
        parts,
        chunked: true,
    }
}

/// Largest char boundary `<= max`. If the first character alone is wider
/// than `max`, the part holds that one character.
fn cut_point(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut cut = max;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    if cut == 0 {
        cut = max + 1;
        while !s.is_char_boundary(cut) {
            cut += 1;
        }
    }
    cut
}

/// Missing indices listed individually; beyond this they are only counted.
pub const MAX_LISTED_MISSING: usize = 32;

/// Result of stitching parts back together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconstructed {
    /// Concatenation of every part that was present, in index order.
    pub data: String,
    /// How many indices in `0..expected_count` had no part.
    pub missing_count: usize,
    /// The first missing indices, at most [`MAX_LISTED_MISSING`].
    pub missing: Vec<usize>,
}

impl Reconstructed {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_count == 0
    }

    pub fn into_string(self) -> String {
        self.data
    }

    fn note_gap(&mut self, from: usize, to: usize) {
        if to <= from {
            return;
        }
        self.missing_count += to - from;
        let room = MAX_LISTED_MISSING.saturating_sub(self.missing.len());
        self.missing.extend((from..to).take(room));
    }
}

/// Concatenates `parts[0..expected_count]` in index order.
///
/// Absent slots (and slots past the end of `parts`) are treated as empty and
/// counted as missing. Slots at or beyond `expected_count` are ignored: the
/// recorded count is authoritative.
pub fn reconstruct<S: AsRef<str>>(parts: &[Option<S>], expected_count: usize) -> Reconstructed {
    let present = parts
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.as_ref().map(|p| (i, p.as_ref())));
    reconstruct_indexed(present, expected_count)
}

/// Sparse form of [`reconstruct`]: `parts` yields `(index, part)` in
/// ascending index order, and only the parts that exist.
///
/// Work is proportional to the parts given, not to `expected_count`, so an
/// untrusted count cannot make reconstruction expensive.
pub fn reconstruct_indexed<'a, I>(parts: I, expected_count: usize) -> Reconstructed
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut out = Reconstructed {
        data: String::new(),
        missing_count: 0,
        missing: Vec::new(),
    };
    let mut next = 0;
    for (i, part) in parts {
        if i >= expected_count {
            break;
        }
        if i < next {
            continue;
        }
        out.note_gap(next, i);
        out.data.push_str(part);
        next = i + 1;
    }
    out.note_gap(next, expected_count);
    out
}
