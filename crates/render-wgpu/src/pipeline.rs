use bytemuck::{Pod, Zeroable};
use debugviz_render::shaders::uniforms;
use debugviz_render::{BlendMode, DrawState, Shader, Topology, UniformValue};
use glam::{Mat4, Vec3};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// CPU copy of the uniform block shared by every built-in program.
///
/// Layout matches `Uniforms` in the WGSL sources: three matrices, then five
/// `vec4`s. `params` holds (axis length, line length, dot offset, dot size).
/// `viewport` is not an overlay uniform; the context stamps the target size
/// into every block it stages.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct UniformBlock {
    pub model_matrix: [[f32; 4]; 4],
    pub view_matrix: [[f32; 4]; 4],
    pub projection_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub start_position: [f32; 4],
    pub direction: [f32; 4],
    pub params: [f32; 4],
    pub viewport: [f32; 4],
}

impl Default for UniformBlock {
    fn default() -> Self {
        Self {
            model_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            view_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            projection_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            color: [1.0; 4],
            start_position: [0.0; 4],
            direction: [0.0; 4],
            params: [0.0; 4],
            viewport: [1.0, 1.0, 0.0, 0.0],
        }
    }
}

impl UniformBlock {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Store `value` in the field named `name`.
    pub fn set(&mut self, name: &'static str, value: UniformValue) -> Result<(), UniformError> {
        match (name, value) {
            (uniforms::MODEL_MATRIX, UniformValue::Mat4(m)) => {
                self.model_matrix = m.to_cols_array_2d()
            }
            (uniforms::VIEW_MATRIX, UniformValue::Mat4(m)) => self.view_matrix = m.to_cols_array_2d(),
            (uniforms::PROJECTION_MATRIX, UniformValue::Mat4(m)) => {
                self.projection_matrix = m.to_cols_array_2d()
            }
            (uniforms::COLOR, UniformValue::Vec3(v)) => self.color = v.extend(1.0).to_array(),
            (uniforms::START_POSITION, UniformValue::Vec3(v)) => {
                self.start_position = point(v)
            }
            (uniforms::DIRECTION, UniformValue::Vec3(v)) => self.direction = point(v),
            (uniforms::LENGTH, UniformValue::Float(f)) => self.params[0] = f,
            (uniforms::LINE_LENGTH, UniformValue::Float(f)) => self.params[1] = f,
            (uniforms::DOT_OFFSET, UniformValue::Float(f)) => self.params[2] = f,
            (uniforms::DOT_SIZE, UniformValue::Float(f)) => self.params[3] = f,
            (
                uniforms::MODEL_MATRIX | uniforms::VIEW_MATRIX | uniforms::PROJECTION_MATRIX,
                _,
            ) => return Err(UniformError::WrongType { name, expected: "mat4" }),
            (uniforms::COLOR | uniforms::START_POSITION | uniforms::DIRECTION, _) => {
                return Err(UniformError::WrongType { name, expected: "vec3" });
            }
            (
                uniforms::LENGTH | uniforms::LINE_LENGTH | uniforms::DOT_OFFSET | uniforms::DOT_SIZE,
                _,
            ) => {
                return Err(UniformError::WrongType { name, expected: "float" });
            }
            _ => return Err(UniformError::Unknown(name)),
        }
        Ok(())
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = [width.max(1) as f32, height.max(1) as f32, 0.0, 0.0];
    }
}

fn point(v: Vec3) -> [f32; 4] {
    v.extend(0.0).to_array()
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniformError {
    #[error("uniform {name} expects a {expected}")]
    WrongType {
        name: &'static str,
        expected: &'static str,
    },
    #[error("no uniform named {0}")]
    Unknown(&'static str),
}

/// Round `size` up to the next multiple of `alignment`.
pub fn align_up(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Everything that selects a distinct `wgpu::RenderPipeline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub shader: Shader,
    pub topology: Topology,
    pub state: DrawState,
}

impl PipelineKey {
    pub fn label(&self) -> String {
        format!(
            "{}/{:?}/{:?}{}{}",
            self.shader,
            self.topology,
            self.state.blend,
            if self.state.depth_test { "/depth" } else { "" },
            if self.state.cull_face { "/cull" } else { "" },
        )
    }

    pub fn primitive_state(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: primitive_topology(self.topology),
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: self.state.cull_face.then_some(wgpu::Face::Back),
            ..Default::default()
        }
    }

    pub fn depth_stencil(&self) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: self.state.depth_test,
            depth_compare: if self.state.depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: Default::default(),
            bias: Default::default(),
        }
    }

    pub fn blend_state(&self) -> Option<wgpu::BlendState> {
        blend_state(self.state.blend)
    }
}

/// Vertices per point. WGSL points are one pixel, so each point is drawn as
/// an instance of a four-vertex strip that the program expands.
pub const POINT_QUAD_VERTICES: u32 = 4;

pub fn primitive_topology(topology: Topology) -> wgpu::PrimitiveTopology {
    match topology {
        Topology::Points => wgpu::PrimitiveTopology::TriangleStrip,
        Topology::Lines => wgpu::PrimitiveTopology::LineList,
        Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
    }
}

pub fn blend_state(mode: BlendMode) -> Option<wgpu::BlendState> {
    match mode {
        BlendMode::Replace => None,
        BlendMode::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
        BlendMode::Additive => {
            let component = wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            };
            Some(wgpu::BlendState {
                color: component,
                alpha: component,
            })
        }
    }
}

pub fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        4 => wgpu::VertexFormat::Float32x4,
        _ => wgpu::VertexFormat::Float32x3,
    }
}

/// One `wgpu::VertexAttribute` per shader attribute, each fed by its own
/// buffer slot in declaration order.
pub fn vertex_attributes(shader: Shader) -> Vec<[wgpu::VertexAttribute; 1]> {
    shader
        .attributes()
        .iter()
        .map(|a| {
            [wgpu::VertexAttribute {
                format: vertex_format(a.components),
                offset: 0,
                shader_location: a.location,
            }]
        })
        .collect()
}

/// Buffer layouts for `shader`. Point data advances per instance.
pub fn vertex_layouts<'a>(
    shader: Shader,
    topology: Topology,
    attributes: &'a [[wgpu::VertexAttribute; 1]],
) -> Vec<wgpu::VertexBufferLayout<'a>> {
    let step_mode = match topology {
        Topology::Points => wgpu::VertexStepMode::Instance,
        Topology::Lines | Topology::Triangles => wgpu::VertexStepMode::Vertex,
    };
    shader
        .attributes()
        .iter()
        .zip(attributes)
        .map(|(a, attrs)| wgpu::VertexBufferLayout {
            array_stride: a.components as u64 * std::mem::size_of::<f32>() as u64,
            step_mode,
            attributes: attrs,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_fills_one_aligned_slot() {
        assert_eq!(UniformBlock::SIZE, 272);
        assert_eq!(align_up(UniformBlock::SIZE, 256), 512);
        assert_eq!(align_up(256, 256), 256);
    }

    #[test]
    fn scalars_pack_into_params() {
        let mut block = UniformBlock::default();
        block.set(uniforms::LENGTH, UniformValue::Float(150.0)).unwrap();
        block.set(uniforms::LINE_LENGTH, UniformValue::Float(20.0)).unwrap();
        block.set(uniforms::DOT_OFFSET, UniformValue::Float(3.0)).unwrap();
        block.set(uniforms::DOT_SIZE, UniformValue::Float(6.0)).unwrap();
        assert_eq!(block.params, [150.0, 20.0, 3.0, 6.0]);
    }

    #[test]
    fn vectors_pack_with_w() {
        let mut block = UniformBlock::default();
        block
            .set(uniforms::COLOR, UniformValue::Vec3(Vec3::new(1.0, 1.0, 0.0)))
            .unwrap();
        block
            .set(uniforms::START_POSITION, UniformValue::Vec3(Vec3::new(-50.0, 2.0, -50.0)))
            .unwrap();
        assert_eq!(block.color, [1.0, 1.0, 0.0, 1.0]);
        assert_eq!(block.start_position, [-50.0, 2.0, -50.0, 0.0]);
    }

    #[test]
    fn matrices_are_column_major() {
        let mut block = UniformBlock::default();
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        block.set(uniforms::MODEL_MATRIX, UniformValue::Mat4(m)).unwrap();
        assert_eq!(block.model_matrix[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn rejects_wrong_types() {
        let mut block = UniformBlock::default();
        assert_eq!(
            block.set(uniforms::COLOR, UniformValue::Float(1.0)),
            Err(UniformError::WrongType {
                name: "color",
                expected: "vec3"
            })
        );
        assert_eq!(
            block.set("bogus", UniformValue::Float(1.0)),
            Err(UniformError::Unknown("bogus"))
        );
    }

    #[test]
    fn blend_modes_map_to_wgpu() {
        assert_eq!(blend_state(BlendMode::Replace), None);
        assert_eq!(
            blend_state(BlendMode::Alpha),
            Some(wgpu::BlendState::ALPHA_BLENDING)
        );
        let additive = blend_state(BlendMode::Additive).unwrap();
        assert_eq!(additive.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(additive.color.src_factor, wgpu::BlendFactor::SrcAlpha);
    }

    #[test]
    fn depth_state_follows_draw_state() {
        let key = PipelineKey {
            shader: Shader::NormalDot,
            topology: Topology::Points,
            state: DrawState::new(BlendMode::Additive, false, false),
        };
        assert_eq!(key.depth_stencil().depth_compare, wgpu::CompareFunction::Always);
        assert!(key.primitive_state().cull_mode.is_none());
        assert_eq!(key.label(), "normal_dot/Points/Additive");
    }

    #[test]
    fn one_buffer_slot_per_attribute() {
        let attributes = vertex_attributes(Shader::NormalLine);
        let layouts = vertex_layouts(Shader::NormalLine, Topology::Lines, &attributes);
        assert_eq!(layouts.len(), 3);
        assert!(layouts.iter().all(|l| l.step_mode == wgpu::VertexStepMode::Vertex));
        assert_eq!(layouts[0].array_stride, 12);
        assert_eq!(layouts[2].array_stride, 4);
        assert_eq!(layouts[2].attributes[0].format, wgpu::VertexFormat::Float32);
        assert_eq!(layouts[2].attributes[0].shader_location, 2);
    }

    #[test]
    fn points_draw_as_instanced_quads() {
        assert_eq!(
            primitive_topology(Topology::Points),
            wgpu::PrimitiveTopology::TriangleStrip
        );
        let attributes = vertex_attributes(Shader::NormalDot);
        let layouts = vertex_layouts(Shader::NormalDot, Topology::Points, &attributes);
        assert_eq!(layouts.len(), 2);
        assert!(layouts.iter().all(|l| l.step_mode == wgpu::VertexStepMode::Instance));
    }

    #[test]
    fn viewport_never_drops_to_zero() {
        let mut block = UniformBlock::default();
        block.set_viewport(1280, 0);
        assert_eq!(block.viewport, [1280.0, 1.0, 0.0, 0.0]);
    }
}
