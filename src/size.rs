//! Byte-size estimation for the values that flow through a `ProgressIO`.

use std::borrow::Cow;
use std::collections::VecDeque;

/// Number of bytes a value occupies once it reaches the wrapped stream.
///
/// Raw bytes count their length, text counts its UTF-8 length and sequences
/// count the sum of their elements. Other primitives fall back to the
/// length of their native byte representation.
pub trait ByteSize {
    fn byte_size(&self) -> u64;
}

pub fn size_of<T: ByteSize + ?Sized>(value: &T) -> u64 {
    value.byte_size()
}

impl ByteSize for str {
    fn byte_size(&self) -> u64 {
        self.len() as u64
    }
}

impl ByteSize for String {
    fn byte_size(&self) -> u64 {
        self.len() as u64
    }
}

impl ByteSize for char {
    fn byte_size(&self) -> u64 {
        self.len_utf8() as u64
    }
}

// u8 goes through the fallback, so a byte slice is the sum of its one-byte
// elements, i.e. its length.
impl<T: ByteSize> ByteSize for [T] {
    fn byte_size(&self) -> u64 {
        self.iter().map(ByteSize::byte_size).sum()
    }
}

impl<T: ByteSize, const N: usize> ByteSize for [T; N] {
    fn byte_size(&self) -> u64 {
        self.as_slice().byte_size()
    }
}

impl<T: ByteSize> ByteSize for Vec<T> {
    fn byte_size(&self) -> u64 {
        self.as_slice().byte_size()
    }
}

impl<T: ByteSize> ByteSize for VecDeque<T> {
    fn byte_size(&self) -> u64 {
        self.iter().map(ByteSize::byte_size).sum()
    }
}

impl<T: ByteSize> ByteSize for Option<T> {
    fn byte_size(&self) -> u64 {
        self.as_ref().map_or(0, ByteSize::byte_size)
    }
}

impl<T: ByteSize + ?Sized> ByteSize for &T {
    fn byte_size(&self) -> u64 {
        (**self).byte_size()
    }
}

impl<T: ByteSize + ?Sized> ByteSize for &mut T {
    fn byte_size(&self) -> u64 {
        (**self).byte_size()
    }
}

impl<T: ByteSize + ?Sized> ByteSize for Box<T> {
    fn byte_size(&self) -> u64 {
        (**self).byte_size()
    }
}

impl<B> ByteSize for Cow<'_, B>
where
    B: ByteSize + ToOwned + ?Sized,
{
    fn byte_size(&self) -> u64 {
        (**self).byte_size()
    }
}

macro_rules! raw_byte_size {
    ($($t:ty),*) => {
        $(
            impl ByteSize for $t {
                fn byte_size(&self) -> u64 {
                    self.to_ne_bytes().len() as u64
                }
            }
        )*
    };
}

raw_byte_size!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

impl ByteSize for bool {
    fn byte_size(&self) -> u64 {
        1
    }
}
