//! A [`RenderContext`] that records instead of drawing.
//!
//! Used by the tests and by the CLI's `trace` command. It validates what a
//! real driver would reject (unknown handles, attributes the bound program
//! does not declare, indices past the bound vertex data) so protocol bugs
//! surface as errors rather than silent corruption.

use crate::context::{
    AttributeBinding, BlendMode, BufferId, Capability, ProgramId, RenderContext, Topology,
    UniformValue, VertexArrayId,
};
use crate::error::{RenderError, RenderResult};
use crate::shaders::Shader;
use std::collections::{BTreeMap, HashMap};

/// One recorded context call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateProgram { id: ProgramId, shader: Shader },
    CreateVertexBuffer { id: BufferId, label: String, len: usize, components: u32 },
    CreateIndexBuffer { id: BufferId, label: String, len: usize },
    CreateVertexArray { id: VertexArrayId, program: ProgramId },
    UseProgram(ProgramId),
    BindVertexArray(VertexArrayId),
    BindAttribute(AttributeBinding),
    BindIndexBuffer(BufferId),
    SetUniform { name: &'static str, value: UniformValue },
    SetBlend(BlendMode),
    SetDepthTest(bool),
    SetCullFace(bool),
    DrawArrays { topology: Topology, first: u32, count: u32 },
    DrawElements { topology: Topology, count: u32 },
    DeleteProgram(ProgramId),
    DeleteBuffer(BufferId),
    DeleteVertexArray(VertexArrayId),
}

/// Snapshot of the context state at the moment of a draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: ProgramId,
    pub shader: Shader,
    pub topology: Topology,
    pub count: u32,
    pub indexed: bool,
    pub blend: BlendMode,
    pub depth_test: bool,
    pub cull_face: bool,
    pub uniforms: BTreeMap<&'static str, UniformValue>,
}

impl DrawRecord {
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).copied()
    }
}

#[derive(Debug, Clone)]
enum BufferData {
    Vertex { data: Vec<f32>, components: u32 },
    Index(Vec<u16>),
}

impl BufferData {
    fn kind(&self) -> &'static str {
        match self {
            Self::Vertex { .. } => "vertex buffer",
            Self::Index(_) => "index buffer",
        }
    }
}

#[derive(Debug)]
pub struct RecordingContext {
    vertex_arrays_supported: bool,
    allocations_left: Option<usize>,
    next_id: u32,
    programs: BTreeMap<ProgramId, Shader>,
    buffers: BTreeMap<BufferId, BufferData>,
    vertex_arrays: BTreeMap<VertexArrayId, Vec<AttributeBinding>>,
    uniforms: HashMap<ProgramId, BTreeMap<&'static str, UniformValue>>,
    current_program: Option<ProgramId>,
    current_attributes: BTreeMap<&'static str, AttributeBinding>,
    current_index: Option<BufferId>,
    blend: BlendMode,
    depth_test: bool,
    cull_face: bool,
    calls: Vec<Call>,
    draws: Vec<DrawRecord>,
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            vertex_arrays_supported: true,
            allocations_left: None,
            next_id: 1,
            programs: BTreeMap::new(),
            buffers: BTreeMap::new(),
            vertex_arrays: BTreeMap::new(),
            uniforms: HashMap::new(),
            current_program: None,
            current_attributes: BTreeMap::new(),
            current_index: None,
            blend: BlendMode::Replace,
            depth_test: false,
            cull_face: false,
            calls: Vec::new(),
            draws: Vec::new(),
        }
    }

    /// A context that reports no vertex-array-object support.
    pub fn without_vertex_arrays() -> Self {
        Self {
            vertex_arrays_supported: false,
            ..Self::new()
        }
    }

    /// Let the next `n` resource creations succeed and refuse the one after.
    /// The refusal fires once; later creations succeed again.
    pub fn fail_after_allocations(&mut self, n: usize) {
        self.allocations_left = Some(n);
    }

    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub fn draws(&self) -> &[DrawRecord] {
        &self.draws
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    /// Forget recorded calls and draws, keeping resources alive.
    pub fn clear_log(&mut self) {
        self.calls.clear();
        self.draws.clear();
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.vertex_arrays.len()
    }

    pub fn vertex_data(&self, id: BufferId) -> Option<&[f32]> {
        match self.buffers.get(&id)? {
            BufferData::Vertex { data, .. } => Some(data),
            BufferData::Index(_) => None,
        }
    }

    pub fn index_data(&self, id: BufferId) -> Option<&[u16]> {
        match self.buffers.get(&id)? {
            BufferData::Index(data) => Some(data),
            BufferData::Vertex { .. } => None,
        }
    }

    /// Buffers created with `label`, in creation order.
    pub fn buffers_labeled(&self, label: &str) -> Vec<BufferId> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::CreateVertexBuffer { id, label: l, .. }
                | Call::CreateIndexBuffer { id, label: l, .. }
                    if l == label =>
                {
                    Some(*id)
                }
                _ => None,
            })
            .collect()
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn allocate(&mut self, what: &str) -> RenderResult<()> {
        match self.allocations_left {
            Some(0) => {
                self.allocations_left = None;
                Err(RenderError::Context(format!("out of memory creating {what}")))
            }
            Some(n) => {
                self.allocations_left = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn shader_of(&self, program: ProgramId) -> RenderResult<Shader> {
        self.programs
            .get(&program)
            .copied()
            .ok_or(RenderError::UnknownHandle {
                kind: "program",
                id: program.0,
            })
    }

    fn current_shader(&self) -> RenderResult<(ProgramId, Shader)> {
        let program = self.current_program.ok_or(RenderError::NoProgramBound)?;
        Ok((program, self.shader_of(program)?))
    }

    fn check_binding(&self, shader: Shader, binding: &AttributeBinding) -> RenderResult<()> {
        let declared = shader
            .attribute(binding.attribute)
            .ok_or_else(|| RenderError::UnknownAttribute {
                shader: shader.label(),
                attribute: binding.attribute.to_string(),
            })?;
        match self.buffers.get(&binding.buffer) {
            Some(BufferData::Vertex { components, .. }) if *components == declared.components => {
                Ok(())
            }
            Some(BufferData::Vertex { components, .. }) => Err(RenderError::Context(format!(
                "attribute {} expects {} components, buffer {} has {components}",
                binding.attribute, declared.components, binding.buffer.0
            ))),
            Some(other) => Err(RenderError::Context(format!(
                "attribute {} bound to an {}",
                binding.attribute,
                other.kind()
            ))),
            None => Err(RenderError::UnknownHandle {
                kind: "buffer",
                id: binding.buffer.0,
            }),
        }
    }

    /// Smallest vertex count among the buffers feeding the current program.
    fn available_vertices(&self, shader: Shader) -> RenderResult<usize> {
        let mut available = usize::MAX;
        for attribute in shader.attributes() {
            let binding = self.current_attributes.get(attribute.name).ok_or_else(|| {
                RenderError::Context(format!("attribute {} has no buffer bound", attribute.name))
            })?;
            if let Some(BufferData::Vertex { data, components }) = self.buffers.get(&binding.buffer)
            {
                available = available.min(data.len() / *components as usize);
            }
        }
        Ok(available)
    }

    fn record_draw(&mut self, program: ProgramId, shader: Shader, topology: Topology, count: u32, indexed: bool) {
        self.draws.push(DrawRecord {
            program,
            shader,
            topology,
            count,
            indexed,
            blend: self.blend,
            depth_test: self.depth_test,
            cull_face: self.cull_face,
            uniforms: self.uniforms.get(&program).cloned().unwrap_or_default(),
        });
    }
}

impl RenderContext for RecordingContext {
    fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::VertexArrayObject => self.vertex_arrays_supported,
        }
    }

    fn create_program(&mut self, shader: Shader) -> RenderResult<ProgramId> {
        self.allocate("program")?;
        let id = ProgramId(self.next());
        self.programs.insert(id, shader);
        self.calls.push(Call::CreateProgram { id, shader });
        Ok(id)
    }

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        data: &[f32],
        components: u32,
    ) -> RenderResult<BufferId> {
        if components == 0 || data.len() % components as usize != 0 {
            return Err(RenderError::Context(format!(
                "{label}: {} floats do not divide into {components}-component vertices",
                data.len()
            )));
        }
        self.allocate(label)?;
        let id = BufferId(self.next());
        self.buffers.insert(
            id,
            BufferData::Vertex {
                data: data.to_vec(),
                components,
            },
        );
        self.calls.push(Call::CreateVertexBuffer {
            id,
            label: label.to_string(),
            len: data.len(),
            components,
        });
        Ok(id)
    }

    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> RenderResult<BufferId> {
        self.allocate(label)?;
        let id = BufferId(self.next());
        self.buffers.insert(id, BufferData::Index(data.to_vec()));
        self.calls.push(Call::CreateIndexBuffer {
            id,
            label: label.to_string(),
            len: data.len(),
        });
        Ok(id)
    }

    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        bindings: &[AttributeBinding],
    ) -> RenderResult<VertexArrayId> {
        if !self.vertex_arrays_supported {
            return Err(RenderError::Context(
                "vertex array objects are not supported".into(),
            ));
        }
        let shader = self.shader_of(program)?;
        for binding in bindings {
            self.check_binding(shader, binding)?;
        }
        self.allocate("vertex array")?;
        let id = VertexArrayId(self.next());
        self.vertex_arrays.insert(id, bindings.to_vec());
        self.calls.push(Call::CreateVertexArray { id, program });
        Ok(id)
    }

    fn use_program(&mut self, program: ProgramId) -> RenderResult<()> {
        self.shader_of(program)?;
        self.current_program = Some(program);
        self.calls.push(Call::UseProgram(program));
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
        self.current_attributes = bindings.iter().map(|b| (b.attribute, *b)).collect();
        self.calls.push(Call::BindVertexArray(vertex_array));
        Ok(())
    }

    fn bind_attribute(&mut self, binding: AttributeBinding) -> RenderResult<()> {
        let (_, shader) = self.current_shader()?;
        self.check_binding(shader, &binding)?;
        self.current_attributes.insert(binding.attribute, binding);
        self.calls.push(Call::BindAttribute(binding));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: BufferId) -> RenderResult<()> {
        match self.buffers.get(&buffer) {
            Some(BufferData::Index(_)) => {}
            Some(other) => {
                return Err(RenderError::Context(format!(
                    "buffer {} is a {}, not an index buffer",
                    buffer.0,
                    other.kind()
                )));
            }
            None => {
                return Err(RenderError::UnknownHandle {
                    kind: "buffer",
                    id: buffer.0,
                });
            }
        }
        self.current_index = Some(buffer);
        self.calls.push(Call::BindIndexBuffer(buffer));
        Ok(())
    }

    fn set_uniform(&mut self, name: &'static str, value: UniformValue) -> RenderResult<()> {
        let (program, shader) = self.current_shader()?;
        if !shader.has_uniform(name) {
            return Err(RenderError::UnknownUniform {
                shader: shader.label(),
                uniform: name.to_string(),
            });
        }
        self.uniforms.entry(program).or_default().insert(name, value);
        self.calls.push(Call::SetUniform { name, value });
        Ok(())
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.calls.push(Call::SetBlend(mode));
    }

    fn set_depth_test(&mut self, enabled: bool) {
        self.depth_test = enabled;
        self.calls.push(Call::SetDepthTest(enabled));
    }

    fn set_cull_face(&mut self, enabled: bool) {
        self.cull_face = enabled;
        self.calls.push(Call::SetCullFace(enabled));
    }

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) -> RenderResult<()> {
        let (program, shader) = self.current_shader()?;
        let available = self.available_vertices(shader)?;
        if (first + count) as usize > available {
            return Err(RenderError::Context(format!(
                "draw_arrays {first}..{} past {available} vertices",
                first + count
            )));
        }
        self.calls.push(Call::DrawArrays {
            topology,
            first,
            count,
        });
        self.record_draw(program, shader, topology, count, false);
        Ok(())
    }

    fn draw_elements(&mut self, topology: Topology, count: u32) -> RenderResult<()> {
        let (program, shader) = self.current_shader()?;
        let index = self
            .current_index
            .ok_or_else(|| RenderError::Context("draw_elements with no index buffer".into()))?;
        let indices = self.index_data(index).unwrap_or_default();
        if count as usize > indices.len() {
            return Err(RenderError::Context(format!(
                "draw_elements of {count} indices from a buffer of {}",
                indices.len()
            )));
        }
        let available = self.available_vertices(shader)?;
        if let Some(&max) = indices[..count as usize].iter().max() {
            if max as usize >= available {
                return Err(RenderError::Context(format!(
                    "index {max} past {available} vertices"
                )));
            }
        }
        self.calls.push(Call::DrawElements { topology, count });
        self.record_draw(program, shader, topology, count, true);
        Ok(())
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
        self.uniforms.remove(&program);
        if self.current_program == Some(program) {
            self.current_program = None;
        }
        self.calls.push(Call::DeleteProgram(program));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.calls.push(Call::DeleteBuffer(buffer));
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.vertex_arrays.remove(&vertex_array);
        self.calls.push(Call::DeleteVertexArray(vertex_array));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_setup(ctx: &mut RecordingContext) -> (ProgramId, BufferId) {
        let program = ctx.create_program(Shader::Axis).unwrap();
        let buffer = ctx.create_vertex_buffer("rate", &[0.0, 1.0], 1).unwrap();
        (program, buffer)
    }

    fn rate(buffer: BufferId) -> AttributeBinding {
        AttributeBinding {
            attribute: "rate",
            buffer,
            components: 1,
        }
    }

    #[test]
    fn records_draw_with_state_snapshot() {
        let mut ctx = RecordingContext::new();
        let (program, buffer) = axis_setup(&mut ctx);
        ctx.use_program(program).unwrap();
        ctx.bind_attribute(rate(buffer)).unwrap();
        ctx.set_uniform("length", UniformValue::Float(150.0)).unwrap();
        ctx.set_blend(BlendMode::Alpha);
        ctx.draw_arrays(Topology::Lines, 0, 2).unwrap();

        let draw = &ctx.draws()[0];
        assert_eq!(draw.shader, Shader::Axis);
        assert_eq!(draw.blend, BlendMode::Alpha);
        assert_eq!(draw.uniform("length"), Some(UniformValue::Float(150.0)));
    }

    #[test]
    fn rejects_undeclared_attribute_and_uniform() {
        let mut ctx = RecordingContext::new();
        let (program, buffer) = axis_setup(&mut ctx);
        ctx.use_program(program).unwrap();
        let bad = AttributeBinding {
            attribute: "side",
            ..rate(buffer)
        };
        assert!(matches!(
            ctx.bind_attribute(bad),
            Err(RenderError::UnknownAttribute { .. })
        ));
        assert!(matches!(
            ctx.set_uniform("line_length", UniformValue::Float(1.0)),
            Err(RenderError::UnknownUniform { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_draws() {
        let mut ctx = RecordingContext::new();
        let (program, buffer) = axis_setup(&mut ctx);
        ctx.use_program(program).unwrap();
        ctx.bind_attribute(rate(buffer)).unwrap();
        assert!(ctx.draw_arrays(Topology::Lines, 0, 3).is_err());

        let index = ctx.create_index_buffer("idx", &[0, 2]).unwrap();
        ctx.bind_index_buffer(index).unwrap();
        assert!(ctx.draw_elements(Topology::Lines, 2).is_err());
        assert!(ctx.draw_elements(Topology::Lines, 3).is_err());
        assert_eq!(ctx.draw_count(), 0);
    }

    #[test]
    fn vertex_arrays_can_be_disabled() {
        let mut ctx = RecordingContext::without_vertex_arrays();
        let (program, buffer) = axis_setup(&mut ctx);
        assert!(!ctx.supports(Capability::VertexArrayObject));
        assert!(ctx.create_vertex_array(program, &[rate(buffer)]).is_err());
    }

    #[test]
    fn vertex_array_restores_bindings() {
        let mut ctx = RecordingContext::new();
        let (program, buffer) = axis_setup(&mut ctx);
        let vao = ctx.create_vertex_array(program, &[rate(buffer)]).unwrap();
        ctx.use_program(program).unwrap();
        ctx.bind_vertex_array(vao).unwrap();
        ctx.draw_arrays(Topology::Lines, 0, 2).unwrap();
        assert_eq!(ctx.draw_count(), 1);
    }

    #[test]
    fn deletes_release_resources() {
        let mut ctx = RecordingContext::new();
        let (program, buffer) = axis_setup(&mut ctx);
        ctx.delete_buffer(buffer);
        ctx.delete_program(program);
        assert_eq!(ctx.live_buffers(), 0);
        assert_eq!(ctx.live_programs(), 0);
        assert!(ctx.use_program(program).is_err());
    }

    #[test]
    fn refuses_one_allocation_on_request() {
        let mut ctx = RecordingContext::new();
        ctx.fail_after_allocations(1);
        ctx.create_program(Shader::Axis).unwrap();
        let err = ctx.create_vertex_buffer("rate", &[0.0, 1.0], 1).unwrap_err();
        assert_eq!(err.to_string(), "rendering context: out of memory creating rate");
        assert_eq!(ctx.live_buffers(), 0);
        ctx.create_vertex_buffer("rate", &[0.0, 1.0], 1).unwrap();
    }

    #[test]
    fn finds_buffers_by_label() {
        let mut ctx = RecordingContext::new();
        let (_, buffer) = axis_setup(&mut ctx);
        assert_eq!(ctx.buffers_labeled("rate"), vec![buffer]);
        assert_eq!(ctx.vertex_data(buffer), Some(&[0.0, 1.0][..]));
        assert!(ctx.index_data(buffer).is_none());
    }
}
