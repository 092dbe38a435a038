//! Serialization traits shared by every wire type in [`crate::message`] and [`crate::mask`].
//!
//! See the [message module] documentation since this is a private module anyways.
//!
//! [message module]: ../index.html

use super::DecodeError;

/// A type that can be serialized into a flat byte buffer.
pub trait ToBytes {
    /// The number of bytes this value occupies once serialized.
    fn buffer_length(&self) -> usize;

    /// Serializes this value into `buffer`.
    ///
    /// # Panics
    /// May panic if `buffer` is smaller than [`ToBytes::buffer_length`].
    fn to_bytes<T: AsMut<[u8]> + AsRef<[u8]>>(&self, buffer: &mut T);

    /// Serializes this value into a freshly allocated buffer.
    fn into_bytes(self) -> Vec<u8>
    where
        Self: Sized,
    {
        let mut buffer = vec![0_u8; self.buffer_length()];
        self.to_bytes(&mut buffer);
        buffer
    }
}

/// A type that can be deserialized from a flat byte buffer.
pub trait FromBytes: Sized {
    /// Deserializes a value from `buffer`.
    ///
    /// # Errors
    /// Fails if `buffer` is malformed: too short, or containing an invalid enumerant.
    fn from_bytes<T: AsRef<[u8]>>(buffer: &T) -> Result<Self, DecodeError>;
}
