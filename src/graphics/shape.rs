use crate::{
    color::Rgb,
    graphics::{util::DynamicBuffer, Frame, Renderer},
    math as m,
    physics::Outline,
};

use itertools::Itertools;
use std::borrow::Cow;
use zerocopy::{AsBytes, FromBytes};

/// Number of triangles a circle is drawn with.
pub const CIRCLE_SEGMENTS: usize = 32;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, AsBytes, FromBytes)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

/// Triangle list covering an outline in a flat color.
pub fn outline_verts(outline: &Outline, color: Rgb) -> Vec<Vertex> {
    let color = color.to_linear();
    let vert = |p: m::Vec2| Vertex {
        position: [p.x, p.y],
        color,
    };

    match outline {
        Outline::Circle { center, r } => {
            let angle_incr = 2.0 * std::f32::consts::PI / CIRCLE_SEGMENTS as f32;
            let rim = |i: usize| {
                let angle = angle_incr * i as f32;
                *center + m::Vec2::new(r * angle.cos(), r * angle.sin())
            };
            (0..CIRCLE_SEGMENTS)
                .flat_map(|i| [vert(*center), vert(rim(i)), vert(rim(i + 1))])
                .collect()
        }
        Outline::Polygon(pts) => {
            // fan around the first point, fine for convex shapes
            let Some((&first, rest)) = pts.split_first() else {
                return Vec::new();
            };
            rest.iter()
                .tuple_windows()
                .flat_map(|(&curr, &next)| [vert(first), vert(curr), vert(next)])
                .collect()
        }
    }
}

//
// Rendering
//

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, AsBytes, FromBytes)]
struct GlobalUniforms {
    scale: [f32; 2],
    offset: [f32; 2],
}

impl GlobalUniforms {
    /// Maps window pixels with y pointing down to clip space.
    fn for_target(target_size: (u32, u32)) -> Self {
        let (w, h) = target_size;
        Self {
            scale: [2.0 / w.max(1) as f32, -2.0 / h.max(1) as f32],
            offset: [-1.0, 1.0],
        }
    }
}

/// Draws flat-colored shapes in window pixel coordinates.
pub struct ShapeRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    uniform_buf: wgpu::Buffer,
    vert_buf: DynamicBuffer,
}

impl ShapeRenderer {
    pub fn new(renderer: &Renderer) -> Self {
        let device = Renderer::device();

        // shaders

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shape"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/shape.wgsl"))),
        });

        // bind group & buffers

        let uniform_buf_size = std::mem::size_of::<GlobalUniforms>() as wgpu::BufferAddress;
        let uniform_buf = device.create_buffer(&wgpu::BufferDescriptor {
            size: uniform_buf_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            label: Some("shape uniforms"),
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0, // pixel to clip space mapping
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(uniform_buf_size),
                },
                count: None,
            }],
            label: Some("shape"),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            }],
            label: Some("shape"),
        });

        let vertex_buffers = [wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x2,
                    offset: 0,
                    shader_location: 0,
                },
                // color
                wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x4,
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                },
            ],
        }];

        // pipeline

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shape"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shape"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &vertex_buffers,
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(renderer.swapchain_format().into())],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        ShapeRenderer {
            pipeline,
            bind_group,
            uniform_buf,
            vert_buf: DynamicBuffer::new(Some("shape"), wgpu::BufferUsages::VERTEX),
        }
    }

    /// Clear the frame to black and draw the given shapes on it.
    pub fn draw(&mut self, shapes: impl Iterator<Item = (Outline, Rgb)>, frame: &mut Frame) {
        let uniforms = GlobalUniforms::for_target(frame.target_size);
        Renderer::queue().write_buffer(&self.uniform_buf, 0, uniforms.as_bytes());

        let verts: Vec<Vertex> = shapes
            .flat_map(|(outline, color)| outline_verts(&outline, color))
            .collect();
        self.vert_buf.write(&verts);

        let mut pass = frame.pass("shape", wgpu::LoadOp::Clear(wgpu::Color::BLACK));
        if self.vert_buf.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vert_buf.slice());
        pass.draw(0..self.vert_buf.len() as u32, 0..1);
    }
}

//
// tests
//
