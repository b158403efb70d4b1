//! Device-local vertex/index buffers filled through staging copies.

use crate::model::geometry::Vertex;
use std::mem::size_of;

/// Records staging-to-device copies into one command encoder. Buffers made
/// by a batch must not be drawn before [`UploadBatch::submit`]; the types
/// that hold them are only constructed afterwards.
pub struct UploadBatch<'a> {
    device: &'a wgpu::Device,
    encoder: wgpu::CommandEncoder,
    staging: Vec<wgpu::Buffer>,
    bytes: u64,
}

impl<'a> UploadBatch<'a> {
    pub fn new(device: &'a wgpu::Device, label: &str) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some(label),
        });
        Self {
            device,
            encoder,
            staging: Vec::new(),
            bytes: 0,
        }
    }

    /// Creates a device-local buffer and records the copy of `contents` into it.
    pub fn upload(&mut self, label: &str, contents: &[u8], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        // copies must be 4-byte aligned and non-empty
        let size = (contents.len() as u64)
            .max(wgpu::COPY_BUFFER_ALIGNMENT)
            .next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT);

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} (staging)")),
            size,
            usage: wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });
        staging.slice(..).get_mapped_range_mut()[..contents.len()].copy_from_slice(contents);
        staging.unmap();

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: usage | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.encoder.copy_buffer_to_buffer(&staging, 0, &buffer, 0, size);
        self.staging.push(staging);
        self.bytes += size;
        buffer
    }

    pub fn vertices(&mut self, label: &str, vertices: &[Vertex]) -> VertexBuffer {
        VertexBuffer {
            buffer: self.upload(label, bytemuck::cast_slice(vertices), wgpu::BufferUsages::VERTEX),
            count: vertices.len() as u32,
        }
    }

    pub fn indices(&mut self, label: &str, indices: &[u32]) -> IndexBuffer {
        IndexBuffer {
            buffer: self.upload(label, bytemuck::cast_slice(indices), wgpu::BufferUsages::INDEX),
            count: indices.len() as u32,
        }
    }

    /// Submits the copies. The staging buffers are released here; wgpu keeps
    /// them alive until the submitted copies have executed.
    pub fn submit(self, queue: &wgpu::Queue) -> wgpu::SubmissionIndex {
        log::debug!(
            "Uploading {} KiB in {} buffers",
            self.bytes / 1024,
            self.staging.len()
        );
        queue.submit(std::iter::once(self.encoder.finish()))
    }
}

pub struct VertexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl VertexBuffer {
    pub const STRIDE: u64 = size_of::<Vertex>() as u64;

    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: Self::STRIDE,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn bind<'p>(&'p self, pass: &mut wgpu::RenderPass<'p>, slot: u32) {
        pass.set_vertex_buffer(slot, self.buffer.slice(..));
    }
}

pub struct IndexBuffer {
    buffer: wgpu::Buffer,
    count: u32,
}

impl IndexBuffer {
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn bind<'p>(&'p self, pass: &mut wgpu::RenderPass<'p>) {
        pass.set_index_buffer(self.buffer.slice(..), wgpu::IndexFormat::Uint32);
    }
}
