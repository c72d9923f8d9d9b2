use crate::error::RenderResult;
use crate::shaders::Shader;
use glam::{Mat4, Vec3};

/// Handle to a linked program owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Handle to a vertex or index buffer owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Handle to a vertex-array object owned by a [`RenderContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub u32);

/// Optional context features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Attribute bindings can be captured once and re-bound with one call.
    VertexArrayObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    Triangles,
}

/// Blend equation applied to a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Blending disabled: `(SRC_ALPHA, ZERO)` with the blend stage off.
    #[default]
    Replace,
    /// `(SRC_ALPHA, ONE_MINUS_SRC_ALPHA)`.
    Alpha,
    /// `(SRC_ALPHA, ONE)`: overlapping fragments accumulate brightness.
    Additive,
}

impl BlendMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Replace)
    }
}

/// Fixed-function state a primitive sets before each draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawState {
    pub blend: BlendMode,
    pub depth_test: bool,
    pub cull_face: bool,
}

impl DrawState {
    pub const fn new(blend: BlendMode, depth_test: bool, cull_face: bool) -> Self {
        Self {
            blend,
            depth_test,
            cull_face,
        }
    }
}

/// Binds one vertex buffer to a named shader attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeBinding {
    pub attribute: &'static str,
    pub buffer: BufferId,
    /// Floats per vertex: 3 for positions and normals, 1 for scalars.
    pub components: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec3(Vec3),
    Float(f32),
}

/// The rendering context overlays draw into.
///
/// Mirrors an immediate-mode graphics API: one program, one set of
/// attribute bindings and one fixed-function state are current at any
/// time, and every draw uses whatever is current. The context is owned by
/// the host application; overlays only create resources in it at
/// construction and issue draws during a frame.
pub trait RenderContext {
    fn supports(&self, capability: Capability) -> bool;

    fn create_program(&mut self, shader: Shader) -> RenderResult<ProgramId>;
    fn create_vertex_buffer(&mut self, label: &str, data: &[f32], components: u32)
    -> RenderResult<BufferId>;
    fn create_index_buffer(&mut self, label: &str, data: &[u16]) -> RenderResult<BufferId>;
    /// Capture `bindings` for `program`. Only valid when
    /// [`Capability::VertexArrayObject`] is supported.
    fn create_vertex_array(
        &mut self,
        program: ProgramId,
        bindings: &[AttributeBinding],
    ) -> RenderResult<VertexArrayId>;

    fn use_program(&mut self, program: ProgramId) -> RenderResult<()>;
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) -> RenderResult<()>;
    fn bind_attribute(&mut self, binding: AttributeBinding) -> RenderResult<()>;
    fn bind_index_buffer(&mut self, buffer: BufferId) -> RenderResult<()>;
    fn set_uniform(&mut self, name: &'static str, value: UniformValue) -> RenderResult<()>;

    fn set_blend(&mut self, mode: BlendMode);
    fn set_depth_test(&mut self, enabled: bool);
    fn set_cull_face(&mut self, enabled: bool);

    fn draw_arrays(&mut self, topology: Topology, first: u32, count: u32) -> RenderResult<()>;
    /// Draw `count` indices from the bound 16-bit index buffer.
    fn draw_elements(&mut self, topology: Topology, count: u32) -> RenderResult<()>;

    fn delete_program(&mut self, program: ProgramId);
    fn delete_buffer(&mut self, buffer: BufferId);
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_disables_blending() {
        assert!(!BlendMode::Replace.is_enabled());
        assert!(BlendMode::Alpha.is_enabled());
        assert!(BlendMode::Additive.is_enabled());
    }

    #[test]
    fn default_state_is_opaque_without_tests() {
        let state = DrawState::default();
        assert_eq!(state.blend, BlendMode::Replace);
        assert!(!state.depth_test);
        assert!(!state.cull_face);
    }
}
