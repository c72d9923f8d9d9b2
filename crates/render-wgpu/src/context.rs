use crate::pipeline::{
    DEPTH_FORMAT, POINT_QUAD_VERTICES, PipelineKey, UniformBlock, UniformError, align_up,
    vertex_attributes, vertex_layouts,
};
use debugviz_render::{
    AttributeBinding, BlendMode, BufferId, Capability, DrawState, ProgramId, RenderContext,
    RenderError, RenderResult, Shader, Topology, UniformValue, VertexArrayId,
};
use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;
use wgpu::util::DeviceExt;

/// Failures specific to the wgpu backend. Surfaced as
/// [`RenderError::Context`].
#[derive(Debug, thiserror::Error)]
pub enum WgpuContextError {
    #[error(transparent)]
    Uniform(#[from] UniformError),
    #[error("attribute {0} has no buffer bound")]
    MissingAttribute(&'static str),
    #[error("draw_elements with no index buffer bound")]
    NoIndexBuffer,
    #[error("buffer {0} is not a {1}")]
    WrongBufferKind(u32, &'static str),
    #[error("points cannot be drawn from an index buffer")]
    IndexedPoints,
}

impl From<WgpuContextError> for RenderError {
    fn from(e: WgpuContextError) -> Self {
        RenderError::Context(e.to_string())
    }
}

struct Program {
    shader: Shader,
    uniforms: UniformBlock,
}

enum BufferKind {
    Vertex,
    Index,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    kind: BufferKind,
}

#[derive(Debug, Clone, Copy)]
enum DrawRange {
    Arrays { first: u32, count: u32 },
    Elements { count: u32 },
}

/// One recorded draw, replayed by [`WgpuContext::flush`].
struct DrawCommand {
    key: PipelineKey,
    uniform_offset: u32,
    vertex_buffers: Vec<BufferId>,
    index_buffer: Option<BufferId>,
    range: DrawRange,
}

/// [`RenderContext`] on top of wgpu.
///
/// wgpu has no global bind state, so calls between draws only update a
/// CPU-side mirror. Each draw snapshots the bound program's uniform block
/// into a staging area and records which buffers and pipeline state it
/// needs; [`flush`](Self::flush) uploads the uniforms and replays the draws
/// in one render pass. Pipelines are created on first use and cached per
/// shader, topology and draw state.
///
/// Vertex-array objects are emulated by storing the bindings, so the
/// capability is always reported. Points are drawn as instanced quads sized
/// against the viewport set with [`set_viewport`](Self::set_viewport).
pub struct WgpuContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    color_format: wgpu::TextureFormat,
    viewport: (u32, u32),
    next_id: u32,

    modules: HashMap<Shader, wgpu::ShaderModule>,
    programs: HashMap<ProgramId, Program>,
    buffers: HashMap<BufferId, GpuBuffer>,
    vertex_arrays: HashMap<VertexArrayId, Vec<AttributeBinding>>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,

    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_capacity: u64,
    uniform_stride: u64,

    current_program: Option<ProgramId>,
    current_attributes: HashMap<&'static str, BufferId>,
    current_index: Option<BufferId>,
    state: DrawState,

    staged_uniforms: Vec<u8>,
    draws: Vec<DrawCommand>,
}

impl WgpuContext {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(UniformBlock::SIZE),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = align_up(UniformBlock::SIZE, alignment);
        let uniform_capacity = uniform_stride * 64;
        let (uniform_buffer, uniform_bind_group) =
            Self::create_uniform_buffer(&device, &bind_group_layout, uniform_capacity);

        tracing::debug!(?color_format, uniform_stride, "created wgpu overlay context");

        Self {
            device,
            queue,
            color_format,
            viewport: (1, 1),
            next_id: 1,
            modules: HashMap::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            pipelines: HashMap::new(),
            bind_group_layout,
            pipeline_layout,
            uniform_buffer,
            uniform_bind_group,
            uniform_capacity,
            uniform_stride,
            current_program: None,
            current_attributes: HashMap::new(),
            current_index: None,
            state: DrawState::default(),
            staged_uniforms: Vec::new(),
            draws: Vec::new(),
        }
    }

    pub fn color_format(&self) -> wgpu::TextureFormat {
        self.color_format
    }

    /// Size in pixels of the target the next flush draws into.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Draws recorded since the last flush.
    pub fn pending_draws(&self) -> usize {
        self.draws.len()
    }

    pub fn cached_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    /// Depth attachment matching the pipelines this context creates.
    pub fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("overlay_depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    /// Upload staged uniforms and replay every recorded draw into one
    /// render pass on `color` / `depth`. With `clear` set both attachments
    /// are cleared first; otherwise their contents are kept.
    pub fn flush(
        &mut self,
        encoder: &mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &wgpu::TextureView,
        clear: Option<wgpu::Color>,
    ) {
        let draws = std::mem::take(&mut self.draws);
        let staged = std::mem::take(&mut self.staged_uniforms);

        if staged.len() as u64 > self.uniform_capacity {
            let capacity = (staged.len() as u64).next_power_of_two();
            let (buffer, bind_group) =
                Self::create_uniform_buffer(&self.device, &self.bind_group_layout, capacity);
            self.uniform_buffer = buffer;
            self.uniform_bind_group = bind_group;
            self.uniform_capacity = capacity;
            tracing::debug!(capacity, "grew overlay uniform buffer");
        }
        if !staged.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &staged);
        }

        for draw in &draws {
            if !self.pipelines.contains_key(&draw.key) {
                let pipeline = self.create_pipeline(&draw.key);
                self.pipelines.insert(draw.key, pipeline);
            }
        }

        let (color_load, depth_load) = match clear {
            Some(c) => (wgpu::LoadOp::Clear(c), wgpu::LoadOp::Clear(1.0)),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("overlay_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        for draw in &draws {
            let Some(pipeline) = self.pipelines.get(&draw.key) else {
                continue;
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[draw.uniform_offset]);
            for (slot, id) in draw.vertex_buffers.iter().enumerate() {
                if let Some(gpu) = self.buffers.get(id) {
                    pass.set_vertex_buffer(slot as u32, gpu.buffer.slice(..));
                }
            }
            match draw.range {
                DrawRange::Arrays { first, count } if draw.key.topology == Topology::Points => {
                    pass.draw(0..POINT_QUAD_VERTICES, first..first + count)
                }
                DrawRange::Arrays { first, count } => pass.draw(first..first + count, 0..1),
                DrawRange::Elements { count } => {
                    let Some(gpu) = draw.index_buffer.and_then(|id| self.buffers.get(&id)) else {
                        continue;
                    };
                    pass.set_index_buffer(gpu.buffer.slice(..), wgpu::IndexFormat::Uint16);
                    pass.draw_indexed(0..count, 0, 0..1);
                }
            }
        }

        tracing::trace!(draws = draws.len(), "flushed overlay draws");
    }

    fn create_uniform_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("overlay_uniforms"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay_uniform_bind_group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: NonZeroU64::new(UniformBlock::SIZE),
                }),
            }],
        });
        (buffer, bind_group)
    }

    fn create_pipeline(&self, key: &PipelineKey) -> wgpu::RenderPipeline {
        let label = key.label();
        let module = &self.modules[&key.shader];
        let attributes = vertex_attributes(key.shader);
        let buffers = vertex_layouts(key.shader, key.topology, &attributes);
        tracing::debug!(pipeline = %label, "creating overlay pipeline");

        self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label.as_str()),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: key.blend_state(),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: key.primitive_state(),
            depth_stencil: Some(key.depth_stencil()),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn program(&self, id: ProgramId) -> RenderResult<&Program> {
        self.programs.get(&id).ok_or(RenderError::UnknownHandle {
            kind: "program",
            id: id.0,
        })
    }

    fn current(&self) -> RenderResult<(ProgramId, &Program)> {
        let id = self.current_program.ok_or(RenderError::NoProgramBound)?;
        Ok((id, self.program(id)?))
    }

    fn buffer_kind(&self, id: BufferId) -> RenderResult<&BufferKind> {
        self.buffers
            .get(&id)
            .map(|b| &b.kind)
            .ok_or(RenderError::UnknownHandle {
                kind: "buffer",
                id: id.0,
            })
    }

    fn record(
        &mut self,
        topology: Topology,
        range: DrawRange,
        index_buffer: Option<BufferId>,
    ) -> RenderResult<()> {
        let (_, program) = self.current()?;
        let shader = program.shader;
        let mut block = program.uniforms;
        block.set_viewport(self.viewport.0, self.viewport.1);

        let vertex_buffers = shader
            .attributes()
            .iter()
            .map(|a| {
                self.current_attributes
                    .get(a.name)
                    .copied()
                    .ok_or(WgpuContextError::MissingAttribute(a.name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let uniform_offset = self.staged_uniforms.len() as u64;
        self.staged_uniforms.extend_from_slice(bytemuck::bytes_of(&block));
        self.staged_uniforms
            .resize(align_up(self.staged_uniforms.len() as u64, self.uniform_stride) as usize, 0);

        self.draws.push(DrawCommand {
            key: PipelineKey {
                shader,
                topology,
                state: self.state,
            },
            uniform_offset: uniform_offset as u32,
            vertex_buffers,
            index_buffer,
            range,
        });
        Ok(())
    }
}

impl RenderContext for WgpuContext {
    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::VertexArrayObject => true,
        }
    }

    fn create_program(&mut self, shader: Shader) -> RenderResult<ProgramId> {
        if !self.modules.contains_key(&shader) {
            let module = self
                .device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(shader.label()),
                    source: wgpu::ShaderSource::Wgsl(shader.wgsl().into()),
                });
            self.modules.insert(shader, module);
        }
        let id = ProgramId(self.next());
        self.programs.insert(
            id,
            Program {
                shader,
                uniforms: UniformBlock::default(),
            },
        );
        Ok(id)
    }

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        data: &[f32],
        _components: u32,
    ) -> RenderResult<BufferId> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let id = BufferId(self.next());
        self.buffers.insert(
            id,
            GpuBuffer {
                buffer,
                kind: BufferKind::Vertex,
            },
        );
        Ok(id)
    }

    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> RenderResult<BufferId> {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::INDEX,
            });
        let id = BufferId(self.next());
        self.buffers.insert(
            id,
            GpuBuffer {
                buffer,
                kind: BufferKind::Index,
            },
        );
        Ok(id)
    }

    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        bindings: &[AttributeBinding],
    ) -> RenderResult<VertexArrayId> {
        let shader = self.program(program)?.shader;
        for binding in bindings {
            if shader.attribute(binding.attribute).is_none() {
                return Err(RenderError::UnknownAttribute {
                    shader: shader.label(),
                    attribute: binding.attribute.to_string(),
                });
            }
        }
        let id = VertexArrayId(self.next());
        self.vertex_arrays.insert(id, bindings.to_vec());
        Ok(id)
    }

    fn use_program(&mut self, program: ProgramId) -> RenderResult<()> {
        self.program(program)?;
        self.current_program = Some(program);
        Ok(())
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) -> RenderResult<()> {
        let bindings = self
            .vertex_arrays
            .get(&vertex_array)
            .ok_or(RenderError::UnknownHandle {
                kind: "vertex array",
                id: vertex_array.0,
            })?;
        self.current_attributes = bindings.iter().map(|b| (b.attribute, b.buffer)).collect();
        Ok(())
    }

    fn bind_attribute(&mut self, binding: AttributeBinding) -> RenderResult<()> {
        let (_, program) = self.current()?;
        let shader = program.shader;
        if shader.attribute(binding.attribute).is_none() {
            return Err(RenderError::UnknownAttribute {
                shader: shader.label(),
                attribute: binding.attribute.to_string(),
            });
        }
        if !matches!(self.buffer_kind(binding.buffer)?, BufferKind::Vertex) {
            return Err(WgpuContextError::WrongBufferKind(binding.buffer.0, "vertex buffer").into());
        }
        self.current_attributes.insert(binding.attribute, binding.buffer);
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) -> RenderResult<()> {
        if !matches!(self.buffer_kind(buffer)?, BufferKind::Index) {
            return Err(WgpuContextError::WrongBufferKind(buffer.0, "index buffer").into());
        }
        self.current_index = Some(buffer);
        Ok(())
    }

    fn set_uniform(&mut self, name: &'static str, value: UniformValue) -> RenderResult<()> {
        let id = self.current_program.ok_or(RenderError::NoProgramBound)?;
        let program = self.programs.get_mut(&id).ok_or(RenderError::UnknownHandle {
            kind: "program",
            id: id.0,
        })?;
        if !program.shader.has_uniform(name) {
            return Err(RenderError::UnknownUniform {
                shader: program.shader.label(),
                uniform: name.to_string(),
            });
        }
        program
            .uniforms
            .set(name, value)
            .map_err(WgpuContextError::from)?;
        Ok(())
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.state.blend = mode;
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.state.depth_test = enabled;
    }

    fn set_cull_face(&mut self, enabled: bool) {
        self.state.cull_face = enabled;
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) -> RenderResult<()> {
        if count == 0 {
            return Ok(());
        }
        self.record(topology, DrawRange::Arrays { first, count }, None)
    }

    fn draw_elements(&mut self, topology: Topology, count: u32) -> RenderResult<()> {
        if count == 0 {
            return Ok(());
        }
        if topology == Topology::Points {
            return Err(WgpuContextError::IndexedPoints.into());
        }
        let index = self.current_index.ok_or(WgpuContextError::NoIndexBuffer)?;
        self.record(topology, DrawRange::Elements { count }, Some(index))
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(gpu) = self.buffers.remove(&buffer) {
            gpu.buffer.destroy();
        }
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.remove(&vertex_array);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_surface_as_context_errors() {
        let err: RenderError = WgpuContextError::MissingAttribute("side").into();
        assert!(matches!(err, RenderError::Context(ref m) if m.contains("side")));

        let err: RenderError = WgpuContextError::from(UniformError::Unknown("bogus")).into();
        assert_eq!(err.to_string(), "rendering context: no uniform named bogus");
    }
}
