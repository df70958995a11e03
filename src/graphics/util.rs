//! Utilities for communicating with the GPU.

use zerocopy::AsBytes;

use super::Renderer;

const INITIAL_CAPACITY: wgpu::BufferAddress = 1024;

/// A GPU buffer rewritten every frame that reallocates itself
/// when the data no longer fits.
pub struct DynamicBuffer {
    buf: wgpu::Buffer,
    label: Option<&'static str>,
    usage: wgpu::BufferUsages,
    capacity: wgpu::BufferAddress,
    byte_len: wgpu::BufferAddress,
    len: usize,
}

impl DynamicBuffer {
    pub fn new(label: Option<&'static str>, usage: wgpu::BufferUsages) -> Self {
        let usage = usage | wgpu::BufferUsages::COPY_DST;
        Self {
            buf: create_buffer(label, usage, INITIAL_CAPACITY),
            label,
            usage,
            capacity: INITIAL_CAPACITY,
            byte_len: 0,
            len: 0,
        }
    }

    /// Replace the contents of the buffer.
    pub fn write<T: AsBytes>(&mut self, data: &[T]) {
        let bytes = data.as_bytes();
        let needed = bytes.len() as wgpu::BufferAddress;
        if needed > self.capacity {
            self.capacity = grown_capacity(self.capacity, needed);
            self.buf = create_buffer(self.label, self.usage, self.capacity);
        }
        if !bytes.is_empty() {
            Renderer::queue().write_buffer(&self.buf, 0, bytes);
        }
        self.byte_len = needed;
        self.len = data.len();
    }

    /// The part of the buffer holding the last written data.
    /// Must not be called when the buffer is empty.
    #[inline]
    pub fn slice(&self) -> wgpu::BufferSlice<'_> {
        self.buf.slice(..self.byte_len)
    }

    /// Number of elements in the last write.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn create_buffer(
    label: Option<&'static str>,
    usage: wgpu::BufferUsages,
    size: wgpu::BufferAddress,
) -> wgpu::Buffer {
    Renderer::device().create_buffer(&wgpu::BufferDescriptor {
        label,
        size,
        usage,
        mapped_at_creation: false,
    })
}

/// Smallest power-of-two multiple of the current capacity that fits `needed` bytes.
fn grown_capacity(current: wgpu::BufferAddress, needed: wgpu::BufferAddress) -> wgpu::BufferAddress {
    let mut cap = current.max(1);
    while cap < needed {
        cap *= 2;
    }
    cap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_doubles_until_it_fits() {
        assert_eq!(grown_capacity(1024, 1025), 2048);
        assert_eq!(grown_capacity(1024, 5000), 8192);
        assert_eq!(grown_capacity(1024, 1024), 1024);
        assert_eq!(grown_capacity(0, 3), 4);
    }
}
