//! Built-in overlay programs.
//!
//! All four programs share one uniform block so a backend needs a single
//! bind-group layout. Uniform names passed to
//! [`RenderContext::set_uniform`](crate::RenderContext::set_uniform) are the
//! field names below; `length`, `line_length`, `dot_offset` and `dot_size`
//! are packed into `params`. `viewport` is written by the backend.

/// Uniform names understood by every built-in program.
pub mod uniforms {
    pub const MODEL_MATRIX: &str = "model_matrix";
    pub const VIEW_MATRIX: &str = "view_matrix";
    pub const PROJECTION_MATRIX: &str = "projection_matrix";
    pub const COLOR: &str = "color";
    pub const START_POSITION: &str = "start_position";
    pub const DIRECTION: &str = "direction";
    /// Axis length (`params.x`).
    pub const LENGTH: &str = "length";
    /// Normal line length (`params.y`).
    pub const LINE_LENGTH: &str = "line_length";
    /// Distance the normal dots sit above the surface (`params.z`).
    pub const DOT_OFFSET: &str = "dot_offset";
    /// Normal dot diameter in pixels (`params.w`).
    pub const DOT_SIZE: &str = "dot_size";
}

/// A shader attribute and the vertex location it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub location: u32,
    pub components: u32,
}

const fn attr(name: &'static str, location: u32, components: u32) -> Attribute {
    Attribute {
        name,
        location,
        components,
    }
}

const POSITION: Attribute = attr("position", 0, 3);
const NORMAL: Attribute = attr("normal", 1, 3);
const SIDE: Attribute = attr("side", 2, 1);
const RATE: Attribute = attr("rate", 0, 1);

/// The programs overlays are built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Shader {
    /// Position through model/view/projection, flat `color`.
    FlatColor,
    /// Unit `rate` segment placed at `start_position + direction * rate * length`.
    Axis,
    /// Points lifted `dot_offset` along the normal, drawn as soft white
    /// discs `dot_size` pixels across. The vertex stage expands each point
    /// into a quad from `vertex_index` 0..4, so point data is per instance.
    NormalDot,
    /// Base/tip pairs: `position + normal * line_length * side`.
    NormalLine,
}

impl Shader {
    pub const ALL: [Shader; 4] = [
        Shader::FlatColor,
        Shader::Axis,
        Shader::NormalDot,
        Shader::NormalLine,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::FlatColor => "flat_color",
            Self::Axis => "axis",
            Self::NormalDot => "normal_dot",
            Self::NormalLine => "normal_line",
        }
    }

    pub fn attributes(self) -> &'static [Attribute] {
        match self {
            Self::FlatColor => &[POSITION],
            Self::Axis => &[RATE],
            Self::NormalDot => &[POSITION, NORMAL],
            Self::NormalLine => &[POSITION, NORMAL, SIDE],
        }
    }

    pub fn attribute(self, name: &str) -> Option<&'static Attribute> {
        self.attributes().iter().find(|a| a.name == name)
    }

    pub fn uniforms(self) -> &'static [&'static str] {
        use uniforms::*;
        match self {
            Self::FlatColor => &[MODEL_MATRIX, VIEW_MATRIX, PROJECTION_MATRIX, COLOR],
            Self::Axis => &[
                MODEL_MATRIX,
                VIEW_MATRIX,
                PROJECTION_MATRIX,
                COLOR,
                START_POSITION,
                DIRECTION,
                LENGTH,
            ],
            Self::NormalDot => &[
                MODEL_MATRIX,
                VIEW_MATRIX,
                PROJECTION_MATRIX,
                DOT_OFFSET,
                DOT_SIZE,
            ],
            Self::NormalLine => &[
                MODEL_MATRIX,
                VIEW_MATRIX,
                PROJECTION_MATRIX,
                COLOR,
                LINE_LENGTH,
            ],
        }
    }

    pub fn has_uniform(self, name: &str) -> bool {
        self.uniforms().iter().any(|u| *u == name)
    }

    /// Complete WGSL module (`vs_main` / `fs_main`).
    pub fn wgsl(self) -> String {
        let body = match self {
            Self::FlatColor => FLAT_COLOR_WGSL,
            Self::Axis => AXIS_WGSL,
            Self::NormalDot => NORMAL_DOT_WGSL,
            Self::NormalLine => NORMAL_LINE_WGSL,
        };
        format!("{UNIFORMS_WGSL}{body}")
    }
}

impl std::fmt::Display for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared uniform block. `params` = (axis length, line length, dot offset,
/// dot size); `viewport` = (width, height) of the target in pixels.
pub const UNIFORMS_WGSL: &str = r#"
struct Uniforms {
    model_matrix: mat4x4<f32>,
    view_matrix: mat4x4<f32>,
    projection_matrix: mat4x4<f32>,
    color: vec4<f32>,
    start_position: vec4<f32>,
    direction: vec4<f32>,
    params: vec4<f32>,
    viewport: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> u: Uniforms;

fn to_clip(p: vec3<f32>) -> vec4<f32> {
    return u.projection_matrix * u.view_matrix * u.model_matrix * vec4<f32>(p, 1.0);
}
"#;

const FLAT_COLOR_WGSL: &str = r#"
@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return to_clip(position);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.color.rgb, 1.0);
}
"#;

const AXIS_WGSL: &str = r#"
@vertex
fn vs_main(@location(0) rate: f32) -> @builtin(position) vec4<f32> {
    let axis_pos = u.start_position.xyz + u.direction.xyz * rate * u.params.x;
    return to_clip(axis_pos);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.color.rgb, 1.0);
}
"#;

const NORMAL_DOT_WGSL: &str = r#"
struct DotOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) corner: vec2<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
) -> DotOut {
    let corner = vec2<f32>(f32(vertex_index & 1u), f32(vertex_index >> 1u)) - vec2<f32>(0.5, 0.5);
    let center = to_clip(position + normal * u.params.z);
    let pixels = max(u.viewport.xy, vec2<f32>(1.0, 1.0));
    let offset = corner * 2.0 * u.params.w / pixels * center.w;

    var out: DotOut;
    out.clip = vec4<f32>(center.xy + offset, center.zw);
    out.corner = corner;
    return out;
}

@fragment
fn fs_main(in: DotOut) -> @location(0) vec4<f32> {
    let dist = length(in.corner);
    if dist > 0.5 {
        discard;
    }
    let alpha = clamp(4.0 * (1.0 - dist / 0.5), 0.0, 1.0);
    return vec4<f32>(1.0, 1.0, 1.0, alpha);
}
"#;

const NORMAL_LINE_WGSL: &str = r#"
@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) side: f32,
) -> @builtin(position) vec4<f32> {
    return to_clip(position + normal * u.params.y * side);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.color.rgb, 1.0);
}
"#;
