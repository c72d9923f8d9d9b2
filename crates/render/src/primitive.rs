use crate::context::{
    AttributeBinding, BufferId, Capability, DrawState, ProgramId, RenderContext, Topology,
    UniformValue, VertexArrayId,
};
use crate::error::{RenderError, RenderResult};
use crate::frame::Frame;
use crate::shaders::{Shader, uniforms};
use debugviz_common::{Camera, Color};
use glam::Mat4;

/// Flat vertex data for one named shader attribute.
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute<'d> {
    pub name: &'static str,
    pub data: &'d [f32],
    pub components: u32,
}

impl<'d> VertexAttribute<'d> {
    pub fn vec3(name: &'static str, data: &'d [f32]) -> Self {
        Self {
            name,
            data,
            components: 3,
        }
    }

    pub fn scalar(name: &'static str, data: &'d [f32]) -> Self {
        Self {
            name,
            data,
            components: 1,
        }
    }
}

/// Everything needed to upload one primitive.
#[derive(Debug, Clone)]
pub struct PrimitiveDesc<'d> {
    pub label: &'d str,
    pub shader: Shader,
    pub topology: Topology,
    pub state: DrawState,
    pub attributes: Vec<VertexAttribute<'d>>,
    pub indices: Option<&'d [u16]>,
}

#[derive(Debug, Clone, Copy)]
struct IndexBuffer {
    buffer: BufferId,
    count: u32,
}

/// One program plus the buffers it draws, with a fixed topology and
/// blend/depth/cull state.
///
/// Resources are created in the context at construction. When the context
/// has vertex-array objects the attribute bindings are captured once;
/// otherwise each [`bind`](Self::bind) re-binds every attribute.
#[derive(Debug)]
pub struct OverlayPrimitive {
    label: String,
    shader: Shader,
    program: ProgramId,
    attributes: Vec<AttributeBinding>,
    index: Option<IndexBuffer>,
    vertex_array: Option<VertexArrayId>,
    topology: Topology,
    state: DrawState,
    vertex_count: u32,
}

impl OverlayPrimitive {
    pub fn new(ctx: &mut dyn RenderContext, desc: PrimitiveDesc<'_>) -> RenderResult<Self> {
        let shader = desc.shader;
        for declared in shader.attributes() {
            if !desc.attributes.iter().any(|a| a.name == declared.name) {
                return Err(RenderError::Context(format!(
                    "{}: no data for {shader} attribute {}",
                    desc.label, declared.name
                )));
            }
        }

        let mut vertex_count = u32::MAX;
        for attribute in &desc.attributes {
            let declared = shader.attribute(attribute.name).ok_or_else(|| {
                RenderError::UnknownAttribute {
                    shader: shader.label(),
                    attribute: attribute.name.to_string(),
                }
            })?;
            if declared.components != attribute.components {
                return Err(RenderError::Context(format!(
                    "{}: attribute {} has {} components, {shader} expects {}",
                    desc.label, attribute.name, attribute.components, declared.components
                )));
            }
            vertex_count = vertex_count.min((attribute.data.len() / attribute.components as usize) as u32);
        }

        let program = ctx.create_program(shader)?;
        let mut primitive = Self {
            label: desc.label.to_string(),
            shader,
            program,
            attributes: Vec::with_capacity(desc.attributes.len()),
            index: None,
            vertex_array: None,
            topology: desc.topology,
            state: desc.state,
            vertex_count,
        };
        if let Err(err) = primitive.upload(ctx, &desc) {
            primitive.release(ctx);
            return Err(err);
        }

        tracing::debug!(
            primitive = desc.label,
            %shader,
            topology = ?desc.topology,
            vertices = vertex_count,
            indices = primitive.index.map_or(0, |i| i.count),
            "created overlay primitive"
        );
        Ok(primitive)
    }

    /// Create buffers and the vertex array for an already created program.
    /// Every handle is stored as soon as it exists so `release` can free a
    /// partial upload.
    fn upload(&mut self, ctx: &mut dyn RenderContext, desc: &PrimitiveDesc<'_>) -> RenderResult<()> {
        for attribute in &desc.attributes {
            let buffer = ctx.create_vertex_buffer(
                &format!("{}.{}", desc.label, attribute.name),
                attribute.data,
                attribute.components,
            )?;
            self.attributes.push(AttributeBinding {
                attribute: attribute.name,
                buffer,
                components: attribute.components,
            });
        }

        if let Some(indices) = desc.indices {
            self.index = Some(IndexBuffer {
                buffer: ctx.create_index_buffer(&format!("{}.indices", desc.label), indices)?,
                count: indices.len() as u32,
            });
        }

        if ctx.supports(Capability::VertexArrayObject) {
            self.vertex_array = Some(ctx.create_vertex_array(self.program, &self.attributes)?);
        } else {
            tracing::warn!(
                primitive = desc.label,
                "vertex array objects unavailable, binding attributes per draw"
            );
        }
        Ok(())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn shader(&self) -> Shader {
        self.shader
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_count(&self) -> Option<u32> {
        self.index.map(|i| i.count)
    }

    pub fn uses_vertex_array(&self) -> bool {
        self.vertex_array.is_some()
    }

    /// Make this primitive's program and buffers current.
    pub fn bind(&self, frame: &mut Frame<'_>) -> RenderResult<()> {
        frame.use_program(self.program)?;
        match self.vertex_array {
            Some(vao) => frame.bind_vertex_array(vao)?,
            None => {
                for binding in &self.attributes {
                    frame.bind_attribute(*binding)?;
                }
            }
        }
        if let Some(index) = self.index {
            frame.bind_index_buffer(index.buffer)?;
        }
        Ok(())
    }

    pub fn set_uniform(
        &self,
        frame: &mut Frame<'_>,
        name: &'static str,
        value: UniformValue,
    ) -> RenderResult<()> {
        frame.set_uniform(name, value)
    }

    pub fn set_color(&self, frame: &mut Frame<'_>, color: Color) -> RenderResult<()> {
        frame.set_uniform(uniforms::COLOR, UniformValue::Vec3(color.to_vec3()))
    }

    /// Upload `model` and the camera's view and projection matrices.
    pub fn set_camera(
        &self,
        frame: &mut Frame<'_>,
        model: Mat4,
        camera: &dyn Camera,
    ) -> RenderResult<()> {
        frame.set_uniform(uniforms::MODEL_MATRIX, UniformValue::Mat4(model))?;
        frame.set_uniform(uniforms::VIEW_MATRIX, UniformValue::Mat4(camera.view_matrix()))?;
        frame.set_uniform(
            uniforms::PROJECTION_MATRIX,
            UniformValue::Mat4(camera.projection_matrix()),
        )
    }

    /// Apply the draw state and issue one draw of the whole primitive.
    ///
    /// Assumes [`bind`](Self::bind) was called for this frame; uniforms set
    /// since then apply.
    pub fn draw(&self, frame: &mut Frame<'_>) -> RenderResult<()> {
        frame.set_draw_state(self.state);
        match self.index {
            Some(index) => frame.draw_elements(self.topology, index.count),
            None => frame.draw_arrays(self.topology, 0, self.vertex_count),
        }
    }

    /// Free the program and buffers.
    pub fn release(self, ctx: &mut dyn RenderContext) {
        if let Some(vao) = self.vertex_array {
            ctx.delete_vertex_array(vao);
        }
        for binding in &self.attributes {
            ctx.delete_buffer(binding.buffer);
        }
        if let Some(index) = self.index {
            ctx.delete_buffer(index.buffer);
        }
        ctx.delete_program(self.program);
        tracing::debug!(primitive = %self.label, "released overlay primitive");
    }
}
