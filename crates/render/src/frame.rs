use crate::context::{
    AttributeBinding, BufferId, DrawState, ProgramId, RenderContext, Topology, UniformValue,
    VertexArrayId,
};
use crate::error::{RenderError, RenderResult};

/// What the context currently has bound, as last set through a [`Frame`].
///
/// Starts empty each frame, so a primitive that forgets to bind its program
/// fails loudly instead of drawing with whatever the previous overlay left.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindState {
    pub program: Option<ProgramId>,
    pub vertex_array: Option<VertexArrayId>,
    pub attributes: Vec<AttributeBinding>,
    pub index_buffer: Option<BufferId>,
    pub draw_state: Option<DrawState>,
}

/// One frame's worth of draws against a rendering context.
///
/// Overlays take `&mut Frame` in their render calls; the order in which
/// the host hands the frame to overlays is the order their draws reach the
/// context.
pub struct Frame<'a> {
    ctx: &'a mut dyn RenderContext,
    bind: BindState,
    draw_calls: u32,
}

impl<'a> Frame<'a> {
    pub fn new(ctx: &'a mut dyn RenderContext) -> Self {
        Self {
            ctx,
            bind: BindState::default(),
            draw_calls: 0,
        }
    }

    pub fn context(&mut self) -> &mut dyn RenderContext {
        &mut *self.ctx
    }

    pub fn bind_state(&self) -> &BindState {
        &self.bind
    }

    /// Draw calls issued through this frame so far.
    pub fn draw_calls(&self) -> u32 {
        self.draw_calls
    }

    pub fn use_program(&mut self, program: ProgramId) -> RenderResult<()> {
        self.ctx.use_program(program)?;
        self.bind.program = Some(program);
        self.bind.vertex_array = None;
        self.bind.attributes.clear();
        self.bind.index_buffer = None;
        Ok(())
    }

    pub fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) -> RenderResult<()> {
        self.ctx.bind_vertex_array(vertex_array)?;
        self.bind.vertex_array = Some(vertex_array);
        Ok(())
    }

    pub fn bind_attribute(&mut self, binding: AttributeBinding) -> RenderResult<()> {
        self.ctx.bind_attribute(binding)?;
        self.bind.attributes.retain(|b| b.attribute != binding.attribute);
        self.bind.attributes.push(binding);
        Ok(())
    }

    pub fn bind_index_buffer(&mut self, buffer: BufferId) -> RenderResult<()> {
        self.ctx.bind_index_buffer(buffer)?;
        self.bind.index_buffer = Some(buffer);
        Ok(())
    }

    pub fn set_uniform(&mut self, name: &'static str, value: UniformValue) -> RenderResult<()> {
        self.require_program()?;
        self.ctx.set_uniform(name, value)
    }

    pub fn set_draw_state(&mut self, state: DrawState) {
        self.ctx.set_cull_face(state.cull_face);
        self.ctx.set_depth_test(state.depth_test);
        self.ctx.set_blend(state.blend);
        self.bind.draw_state = Some(state);
    }

    pub fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) -> RenderResult<()> {
        let program = self.require_program()?;
        tracing::trace!(?program, ?topology, first, count, "draw_arrays");
        self.ctx.draw_arrays(topology, first, count)?;
        self.draw_calls += 1;
        Ok(())
    }

    pub fn draw_elements(&mut self, topology: Topology, count: u32) -> RenderResult<()> {
        let program = self.require_program()?;
        tracing::trace!(?program, ?topology, count, "draw_elements");
        self.ctx.draw_elements(topology, count)?;
        self.draw_calls += 1;
        Ok(())
    }

    fn require_program(&self) -> RenderResult<ProgramId> {
        self.bind.program.ok_or(RenderError::NoProgramBound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{Call, RecordingContext};
    use crate::shaders::Shader;

    #[test]
    fn draw_without_program_fails() {
        let mut ctx = RecordingContext::new();
        let mut frame = Frame::new(&mut ctx);
        let err = frame.draw_arrays(Topology::Lines, 0, 2).unwrap_err();
        assert!(matches!(err, RenderError::NoProgramBound));
        assert_eq!(frame.draw_calls(), 0);
    }

    #[test]
    fn bind_state_resets_on_program_switch() {
        let mut ctx = RecordingContext::new();
        let a = ctx.create_program(Shader::Axis).unwrap();
        let b = ctx.create_program(Shader::FlatColor).unwrap();
        let buffer = ctx.create_vertex_buffer("rate", &[0.0, 1.0], 1).unwrap();

        let mut frame = Frame::new(&mut ctx);
        frame.use_program(a).unwrap();
        frame
            .bind_attribute(AttributeBinding {
                attribute: "rate",
                buffer,
                components: 1,
            })
            .unwrap();
        assert_eq!(frame.bind_state().attributes.len(), 1);

        frame.use_program(b).unwrap();
        assert_eq!(frame.bind_state().program, Some(b));
        assert!(frame.bind_state().attributes.is_empty());
    }

    #[test]
    fn draw_state_reaches_context() {
        let mut ctx = RecordingContext::new();
        {
            let mut frame = Frame::new(&mut ctx);
            frame.set_draw_state(DrawState::new(crate::BlendMode::Additive, true, false));
        }
        assert!(ctx.calls().contains(&Call::SetBlend(crate::BlendMode::Additive)));
        assert!(ctx.calls().contains(&Call::SetDepthTest(true)));
        assert!(ctx.calls().contains(&Call::SetCullFace(false)));
    }
}
