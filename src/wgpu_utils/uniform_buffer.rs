use std::marker::PhantomData;

/// Rounds `size` up to the next multiple of `alignment`.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

/// A uniform buffer holding many copies of `Content`, one per slot, each
/// bound with a dynamic offset.
///
/// Every draw of a frame gets its own slot, so uniform writes made between
/// draws are all visible when the frame is submitted at once.
pub struct DynamicUniformBuffer<Content> {
    buffer: wgpu::Buffer,
    stride: u64,
    capacity: usize,
    content_type: PhantomData<Content>,
}

impl<Content: bytemuck::Pod> DynamicUniformBuffer<Content> {
    fn name() -> &'static str {
        let type_name = std::any::type_name::<Content>();
        match type_name.rfind(':') {
            Some(pos) => &type_name[(pos + 1)..],
            None => type_name,
        }
    }

    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let stride = aligned_stride(
            std::mem::size_of::<Content>() as u64,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let capacity = capacity.max(1);

        Self {
            buffer: Self::allocate(device, stride, capacity),
            stride,
            capacity,
            content_type: PhantomData,
        }
    }

    fn allocate(device: &wgpu::Device, stride: u64, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("DynamicUniformBuffer: {}", Self::name())),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Writes `contents` into consecutive slots, growing the buffer first
    /// if needed.
    ///
    /// Returns `true` when the buffer was reallocated; bind groups that
    /// reference it must then be rebuilt.
    pub fn update_content(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        contents: &[Content],
    ) -> bool {
        let grown = contents.len() > self.capacity;
        if grown {
            self.capacity = contents.len().next_power_of_two();
            self.buffer = Self::allocate(device, self.stride, self.capacity);
            log::debug!(
                "uniform buffer {} grown to {} slots",
                Self::name(),
                self.capacity
            );
        }

        if contents.is_empty() {
            return grown;
        }

        let size = std::mem::size_of::<Content>();
        let mut staging = vec![0u8; self.stride as usize * contents.len()];
        for (slot, content) in staging.chunks_exact_mut(self.stride as usize).zip(contents) {
            slot[..size].copy_from_slice(bytemuck::bytes_of(content));
        }
        queue.write_buffer(&self.buffer, 0, &staging);
        grown
    }

    /// Dynamic offset of slot `index`.
    pub fn offset(&self, index: usize) -> wgpu::DynamicOffset {
        (self.stride * index as u64) as wgpu::DynamicOffset
    }

    /// Binding covering a single slot, moved around by the dynamic offset.
    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        wgpu::BindingResource::Buffer(wgpu::BufferBinding {
            buffer: &self.buffer,
            offset: 0,
            size: wgpu::BufferSize::new(std::mem::size_of::<Content>() as u64),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
