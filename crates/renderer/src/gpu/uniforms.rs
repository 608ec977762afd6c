use bytemuck::{Pod, Zeroable};

use crate::scheduler::ScaleOffset;

/// Size of the uniform block shared (in layout, not in value) by both stages.
pub const SCALE_OFFSET_BYTES: u64 = 16;

/// CPU mirror of the WGSL `Params` struct: `scale: vec2<f32>, offset: vec2<f32>`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ScaleOffsetUniform {
    pub scale: [f32; 2],
    pub offset: [f32; 2],
}

impl From<ScaleOffset> for ScaleOffsetUniform {
    fn from(value: ScaleOffset) -> Self {
        Self {
            scale: [value.scale.x as f32, value.scale.y as f32],
            offset: [value.offset.x as f32, value.offset.y as f32],
        }
    }
}

pub(crate) fn create_uniform_buffer(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: SCALE_OFFSET_BYTES,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub(crate) fn write_uniform(queue: &wgpu::Queue, buffer: &wgpu::Buffer, value: ScaleOffsetUniform) {
    queue.write_buffer(buffer, 0, bytemuck::bytes_of(&value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Vec2;
    use std::mem::size_of;

    #[test]
    fn uniform_block_is_sixteen_bytes_in_field_order() {
        assert_eq!(size_of::<ScaleOffsetUniform>() as u64, SCALE_OFFSET_BYTES);

        let uniform = ScaleOffsetUniform::from(ScaleOffset {
            scale: Vec2::new(1.5, 2.5),
            offset: Vec2::new(-3.0, 4.25),
        });
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&uniform));
        assert_eq!(floats, &[1.5, 2.5, -3.0, 4.25]);
    }
}
