//! Small helpers shared by the buffer-offset codec types.
//!
//! See the [message module] documentation since this is a private module anyways.
//!
//! [message module]: ../index.html

use std::ops::Range;

/// Builds a byte range of `len` bytes, starting at `start`.
///
/// All the `XxxBuffer` field accessors throughout [`crate::message`] use this to keep their
/// range constants self-documenting: `range(PREVIOUS_FIELD.end, FIELD_LEN)` reads as "this field
/// immediately follows the previous one and is `FIELD_LEN` bytes long".
pub const fn range(start: usize, len: usize) -> Range<usize> {
    start..start + len
}
