use renderer::{
    ContourStage, FrameParams, FramePipeline, NoiseStage, ScaleOffset, StageShader, SurfaceSize,
    Vec2, NOISE_TARGET_FORMAT,
};

const SIZE: u32 = 64;
const BYTES_PER_ROW: u32 = SIZE * 4;

// Writes its uniform block straight out so the readback also proves the
// uniform write landed before submission.
const UNIFORM_NOISE: &str = r#"
struct Params { scale: vec2<f32>, offset: vec2<f32> };
@group(0) @binding(0) var<uniform> params: Params;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32((index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(index & 2u) * 2.0 - 1.0;
    return vec4<f32>(x, y, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(params.offset.x, params.offset.y, params.scale.x, 1.0);
}
"#;

const PASSTHROUGH_CONTOUR: &str = r#"
struct Params { scale: vec2<f32>, offset: vec2<f32> };
@group(0) @binding(0) var noise_texture: texture_2d<f32>;
@group(0) @binding(1) var noise_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32((index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(index & 2u) * 2.0 - 1.0;
    return vec4<f32>(x, y, 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    let uv = position.xy / vec2<f32>(textureDimensions(noise_texture));
    let sampled = textureSample(noise_texture, noise_sampler, uv);
    return sampled + vec4<f32>(params.scale.x * 0.0, 0.0, 0.0, 0.0);
}
"#;

fn headless_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::default();
    let adapter = match pollster::block_on(instance.request_adapter(
        &wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        },
    )) {
        Ok(adapter) => adapter,
        Err(err) => {
            eprintln!("skipping GPU test: no adapter ({err})");
            return None;
        }
    };
    match pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())) {
        Ok(pair) => Some(pair),
        Err(err) => {
            eprintln!("skipping GPU test: no device ({err})");
            None
        }
    }
}

fn destination(device: &wgpu::Device) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test destination"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn read_pixels(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Vec<u8> {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback"),
        size: (BYTES_PER_ROW * SIZE) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(BYTES_PER_ROW),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::PollType::Wait).expect("poll device");
    receiver
        .recv()
        .expect("map callback")
        .expect("buffer mapped");
    let pixels = slice.get_mapped_range().to_vec();
    buffer.unmap();
    pixels
}

fn assert_close(actual: &[u8], expected: [u8; 4]) {
    for (channel, (&got, want)) in actual.iter().zip(expected).enumerate() {
        assert!(
            got.abs_diff(want) <= 2,
            "channel {channel}: got {got}, want {want} (pixel {actual:?})"
        );
    }
}

fn frame_params(noise: ScaleOffset) -> FrameParams {
    FrameParams {
        noise,
        contour: ScaleOffset::default(),
        delta: 0.0,
        zoom: 0.0,
    }
}

#[test]
fn noise_output_reaches_destination_through_contour_pass() {
    let Some((device, queue)) = headless_device() else {
        return;
    };
    let mut pipeline = FramePipeline::new(
        &device,
        &StageShader::inline("uniform noise", UNIFORM_NOISE),
        &StageShader::inline("passthrough contour", PASSTHROUGH_CONTOUR),
        wgpu::TextureFormat::Rgba8Unorm,
    );
    let target = destination(&device);

    let params = frame_params(ScaleOffset {
        scale: Vec2::new(0.5, 0.0),
        offset: Vec2::new(0.25, 0.75),
    });
    let commands =
        pipeline.encode_frame(&device, &queue, &target, SurfaceSize::new(SIZE, SIZE), &params);
    queue.submit(std::iter::once(commands));

    let pixels = read_pixels(&device, &queue, &target);
    let centre = ((SIZE / 2) * BYTES_PER_ROW + (SIZE / 2) * 4) as usize;
    assert_close(&pixels[centre..centre + 4], [64, 191, 128, 255]);
    assert_close(&pixels[0..4], [64, 191, 128, 255]);

    let handle = pipeline.noise().current_target().expect("target allocated");
    assert_eq!(handle.size(), SurfaceSize::new(SIZE, SIZE));
}

#[test]
fn resized_frame_samples_the_new_target() {
    let Some((device, queue)) = headless_device() else {
        return;
    };
    let mut pipeline = FramePipeline::new(
        &device,
        &StageShader::inline("uniform noise", UNIFORM_NOISE),
        &StageShader::inline("passthrough contour", PASSTHROUGH_CONTOUR),
        wgpu::TextureFormat::Rgba8Unorm,
    );
    let target = destination(&device);

    let first = frame_params(ScaleOffset {
        scale: Vec2::new(1.0, 0.0),
        offset: Vec2::new(1.0, 0.0),
    });
    let commands =
        pipeline.encode_frame(&device, &queue, &target, SurfaceSize::new(32, 32), &first);
    queue.submit(std::iter::once(commands));
    let small = pipeline.noise().current_target().expect("target allocated");

    let second = frame_params(ScaleOffset {
        scale: Vec2::new(0.0, 0.0),
        offset: Vec2::new(0.0, 1.0),
    });
    let commands =
        pipeline.encode_frame(&device, &queue, &target, SurfaceSize::new(SIZE, SIZE), &second);
    queue.submit(std::iter::once(commands));
    let large = pipeline.noise().current_target().expect("target allocated");
    assert!(large.generation > small.generation);
    assert!(pipeline.noise().target_view(small).is_none());

    let pixels = read_pixels(&device, &queue, &target);
    let centre = ((SIZE / 2) * BYTES_PER_ROW + (SIZE / 2) * 4) as usize;
    assert_close(&pixels[centre..centre + 4], [0, 255, 0, 255]);
}

#[test]
fn bundled_stages_render_without_errors() {
    let Some((device, queue)) = headless_device() else {
        return;
    };
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let mut pipeline = FramePipeline::new(
        &device,
        &StageShader::noise(),
        &StageShader::contour(),
        wgpu::TextureFormat::Rgba8Unorm,
    );
    let target = destination(&device);
    let params = frame_params(ScaleOffset {
        scale: Vec2::new(3.0, 3.0),
        offset: Vec2::new(100.0, 100.0),
    });
    let commands =
        pipeline.encode_frame(&device, &queue, &target, SurfaceSize::new(SIZE, SIZE), &params);
    queue.submit(std::iter::once(commands));

    let error = pollster::block_on(device.pop_error_scope());
    assert!(error.is_none(), "validation error: {error:?}");
}

#[test]
fn render_target_is_reused_until_size_changes() {
    let Some((device, _queue)) = headless_device() else {
        return;
    };
    let mut noise = NoiseStage::new(&device, &StageShader::noise());
    assert_eq!(noise.current_target(), None);

    let first = noise.update_render_target(&device, SurfaceSize::new(32, 32));
    let again = noise.update_render_target(&device, SurfaceSize::new(32, 32));
    assert_eq!(first, again);

    let resized = noise.update_render_target(&device, SurfaceSize::new(48, 32));
    assert!(resized.generation > first.generation);
    assert_eq!(resized.size(), SurfaceSize::new(48, 32));
    assert!(noise.target_view(first).is_none());
    assert!(noise.target_view(resized).is_some());
    assert_eq!(noise.current_target(), Some(resized));
}

#[test]
fn contour_pass_without_input_is_skipped() {
    let Some((device, queue)) = headless_device() else {
        return;
    };
    let contour = ContourStage::new(&device, &StageShader::contour(), NOISE_TARGET_FORMAT);
    assert!(!contour.has_input());

    let target = destination(&device);
    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor::default());
    contour.render_pass(&mut encoder, &target);
    queue.submit(std::iter::once(encoder.finish()));
}
