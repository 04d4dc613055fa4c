//! Aligned IO buffers
//!
//! Every worker owns exactly one block-sized buffer. It is always aligned for
//! O_DIRECT, even when the file ended up opened in buffered mode, because the
//! achieved mode is only known after the open fallback has run.

use crate::Result;
use anyhow::Context;
use std::alloc::{alloc_zeroed, dealloc, Layout};

/// Alignment used for all worker buffers (typical O_DIRECT requirement)
pub const DIRECT_IO_ALIGNMENT: usize = 4096;

/// Multiplier of the write fill pattern (Knuth's multiplicative hash constant)
const PATTERN_MULTIPLIER: u32 = 2_654_435_761;

/// Memory-aligned buffer suitable for O_DIRECT operations
pub struct AlignedBuffer {
    ptr: *mut u8,
    size: usize,
    alignment: usize,
    layout: Layout,
}

impl AlignedBuffer {
    /// Create a new zeroed buffer with the specified size and alignment
    ///
    /// # Errors
    /// Fails if alignment is not a power of 2, if size is 0, if the rounded-up
    /// size overflows `isize`, or if the allocator is out of memory.
    pub fn new(size: usize, alignment: usize) -> Result<Self> {
        if size == 0 {
            anyhow::bail!("Buffer size must be greater than 0");
        }

        let layout = Layout::from_size_align(size, alignment)
            .with_context(|| format!("Invalid buffer layout (size {}, alignment {})", size, alignment))?;

        // SAFETY: layout has a non-zero size (checked above).
        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            anyhow::bail!("Failed to allocate {} byte buffer", size);
        }

        Ok(AlignedBuffer {
            ptr,
            size,
            alignment,
            layout,
        })
    }

    /// Create a block buffer aligned to [`DIRECT_IO_ALIGNMENT`]
    pub fn for_block(block_size: usize) -> Result<Self> {
        Self::new(block_size, DIRECT_IO_ALIGNMENT)
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr is valid for `size` initialized bytes for our lifetime.
        unsafe { std::slice::from_raw_parts(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr is valid for `size` bytes and we hold the only reference.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size) }
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline(always)]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        (self.ptr as usize) % self.alignment == 0
    }

    /// Fill the buffer with the deterministic, non-zero write pattern
    ///
    /// Each 32-bit word at byte index `i` holds `i * 2654435761` (wrapping).
    /// Filesystems that special-case all-zero pages therefore see real data.
    /// A trailing partial word receives the leading bytes of its value.
    pub fn fill_write_pattern(&mut self) {
        let slice = self.as_mut_slice();
        for (word_idx, chunk) in slice.chunks_mut(4).enumerate() {
            let value = ((word_idx * 4) as u32).wrapping_mul(PATTERN_MULTIPLIER);
            let bytes = value.to_ne_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        // SAFETY: ptr was allocated with exactly this layout.
        unsafe {
            dealloc(self.ptr, self.layout);
        }
    }
}

// AlignedBuffer is Send because it owns its memory
unsafe impl Send for AlignedBuffer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_buffer_creation() {
        let buffer = AlignedBuffer::new(4096, 512).unwrap();
        assert_eq!(buffer.size(), 4096);
        assert_eq!(buffer.alignment(), 512);
        assert!(buffer.is_aligned());
    }

    #[test]
    fn test_block_buffer_is_direct_aligned() {
        // Block size that is not itself a multiple of 4096
        let buffer = AlignedBuffer::for_block(1000).unwrap();
        assert_eq!(buffer.size(), 1000);
        assert_eq!(buffer.alignment(), DIRECT_IO_ALIGNMENT);
        assert!(buffer.is_aligned());
    }

    #[test]
    fn test_invalid_alignment() {
        let err = AlignedBuffer::new(4096, 513).err().unwrap();
        assert!(err.to_string().contains("Invalid buffer layout"));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(AlignedBuffer::for_block(0).is_err());
    }

    #[test]
    fn test_oversized_layout_rejected() {
        assert!(AlignedBuffer::for_block(usize::MAX - 100).is_err());
    }

    #[test]
    fn test_new_buffer_is_zeroed() {
        let buffer = AlignedBuffer::for_block(8192).unwrap();
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_pattern_words() {
        let mut buffer = AlignedBuffer::for_block(4096).unwrap();
        buffer.fill_write_pattern();

        let slice = buffer.as_slice();
        for word in [0usize, 1, 2, 100, 1023] {
            let i = word * 4;
            let expected = (i as u32).wrapping_mul(2_654_435_761);
            let actual = u32::from_ne_bytes([slice[i], slice[i + 1], slice[i + 2], slice[i + 3]]);
            assert_eq!(actual, expected, "word {}", word);
        }
    }

    #[test]
    fn test_write_pattern_not_all_zero() {
        let mut buffer = AlignedBuffer::for_block(4096).unwrap();
        buffer.fill_write_pattern();

        // Only the first word is entirely zero
        let nonzero = buffer.as_slice().iter().filter(|&&b| b != 0).count();
        assert!(nonzero > 3900);
    }

    #[test]
    fn test_write_pattern_deterministic_and_odd_sizes() {
        let mut a = AlignedBuffer::for_block(4098).unwrap();
        let mut b = AlignedBuffer::for_block(4098).unwrap();
        a.fill_write_pattern();
        b.fill_write_pattern();
        assert_eq!(a.as_slice(), b.as_slice());
    }
}
