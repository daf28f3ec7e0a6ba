//! GPU skinning buffers
//!
//! Bone matrices and the bone parent table reach the vertex stage through
//! storage buffers addressed by binding slot. The evaluation side only sees
//! [`BoneBufferSink`], a write-only upload interface; [`SkinningBuffers`]
//! is the wgpu implementation.
//!
//! Buffers grow on demand: an upload larger than the current allocation
//! destroys the buffer, allocates a bigger one and re-issues the write. The
//! buffer id changes on every reallocation so cached bind groups can be
//! rebuilt.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;
use rustc_hash::FxHashMap;

use crate::settings::SkinningBufferSettings;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(0);

fn generate_buffer_id() -> u64 {
    NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Alignment of every storage buffer allocation, in bytes.
pub const STORAGE_ALIGNMENT: u64 = 16;

/// Write-only destination for per-frame bone data.
pub trait BoneBufferSink {
    /// Uploads one matrix per bone slot and binds it at `slot`.
    fn upload_bone_matrices(&mut self, matrices: &[Mat4], slot: u32);

    /// Uploads the parent bone of every slot (`-1` for roots) and binds it
    /// at `slot`.
    fn upload_bone_parent_indices(&mut self, parents: &[i32], slot: u32);
}

/// Capacity to allocate when `required` bytes no longer fit in `current`.
///
/// At least doubles so a model that keeps growing does not reallocate
/// every frame.
#[must_use]
pub fn grown_capacity(current: u64, required: u64) -> u64 {
    required
        .max(current.saturating_mul(2))
        .max(STORAGE_ALIGNMENT)
        .next_multiple_of(STORAGE_ALIGNMENT)
}

// ============================================================================
// GpuStorageBuffer
// ============================================================================

/// A resizable `STORAGE | COPY_DST` buffer.
pub struct GpuStorageBuffer {
    pub id: u64,
    pub buffer: wgpu::Buffer,
    /// Allocated size in bytes.
    pub capacity: u64,
    /// Bytes written by the last upload.
    pub len: u64,
    pub label: String,
}

impl GpuStorageBuffer {
    pub const USAGE: wgpu::BufferUsages =
        wgpu::BufferUsages::STORAGE.union(wgpu::BufferUsages::COPY_DST);

    #[must_use]
    pub fn new(device: &wgpu::Device, capacity: u64, label: &str) -> Self {
        let capacity = capacity.max(STORAGE_ALIGNMENT).next_multiple_of(STORAGE_ALIGNMENT);
        Self {
            id: generate_buffer_id(),
            buffer: Self::allocate(device, capacity, label),
            capacity,
            len: 0,
            label: label.to_string(),
        }
    }

    fn allocate(device: &wgpu::Device, size: u64, label: &str) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: Self::USAGE,
            mapped_at_creation: false,
        })
    }

    /// Writes `data` at offset 0, growing the buffer first if needed.
    ///
    /// Returns `true` when the buffer was reallocated.
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[u8]) -> bool {
        let size = data.len() as u64;
        let resized = size > self.capacity;
        if resized {
            self.resize(device, grown_capacity(self.capacity, size));
        }

        queue.write_buffer(&self.buffer, 0, data);
        self.len = size;
        resized
    }

    fn resize(&mut self, device: &wgpu::Device, new_capacity: u64) {
        log::info!(
            "Resizing storage buffer '{}' from {} to {} bytes",
            self.label,
            self.capacity,
            new_capacity
        );
        self.buffer.destroy();
        self.buffer = Self::allocate(device, new_capacity, &self.label);
        self.capacity = new_capacity;
        self.id = generate_buffer_id();
    }
}

// ============================================================================
// SkinningBuffers
// ============================================================================

/// Storage buffers keyed by binding slot.
pub struct SkinningBuffers {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    settings: SkinningBufferSettings,
    buffers: FxHashMap<u32, GpuStorageBuffer>,
}

impl SkinningBuffers {
    #[must_use]
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        settings: SkinningBufferSettings,
    ) -> Self {
        Self {
            device,
            queue,
            settings,
            buffers: FxHashMap::default(),
        }
    }

    /// Writes `data` to the buffer bound at `slot`, creating it on first use.
    fn upload(&mut self, data: &[u8], slot: u32) {
        if data.is_empty() {
            return;
        }

        let buffer = self.buffers.entry(slot).or_insert_with(|| {
            GpuStorageBuffer::new(
                &self.device,
                self.settings.initial_capacity_bytes,
                &format!("{}_{slot}", self.settings.label),
            )
        });

        buffer.write(&self.device, &self.queue, data);
    }

    #[inline]
    #[must_use]
    pub fn buffer(&self, slot: u32) -> Option<&GpuStorageBuffer> {
        self.buffers.get(&slot)
    }

    /// Bind group entries for every slot uploaded so far, ordered by slot.
    ///
    /// Rebuild bind groups whenever a buffer's `id` changes.
    #[must_use]
    pub fn bind_group_entries(&self) -> Vec<wgpu::BindGroupEntry<'_>> {
        let mut slots: Vec<_> = self.buffers.iter().collect();
        slots.sort_unstable_by_key(|(slot, _)| **slot);
        slots
            .into_iter()
            .map(|(&slot, buffer)| wgpu::BindGroupEntry {
                binding: slot,
                resource: buffer.buffer.as_entire_binding(),
            })
            .collect()
    }
}

impl BoneBufferSink for SkinningBuffers {
    fn upload_bone_matrices(&mut self, matrices: &[Mat4], slot: u32) {
        self.upload(bytemuck::cast_slice(matrices), slot);
    }

    fn upload_bone_parent_indices(&mut self, parents: &[i32], slot: u32) {
        self.upload(bytemuck::cast_slice(parents), slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_at_least_doubles() {
        assert_eq!(grown_capacity(1024, 1040), 2048);
    }

    #[test]
    fn capacity_covers_large_requests() {
        assert_eq!(grown_capacity(64, 1000), 1008);
    }

    #[test]
    fn capacity_is_aligned_and_non_zero() {
        assert_eq!(grown_capacity(0, 4), STORAGE_ALIGNMENT);
        assert_eq!(grown_capacity(0, 0) % STORAGE_ALIGNMENT, 0);
    }
}
