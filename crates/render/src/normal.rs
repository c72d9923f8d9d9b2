use crate::config::NormalConfig;
use crate::context::{BlendMode, DrawState, RenderContext, Topology, UniformValue};
use crate::error::RenderResult;
use crate::frame::Frame;
use crate::overlay::{Overlay, expect_bool};
use crate::primitive::{OverlayPrimitive, PrimitiveDesc, VertexAttribute};
use crate::shaders::{Shader, uniforms};
use debugviz_common::{Camera, Color, NormalSource};
use debugviz_geometry::build_normal_segments;
use debugviz_tools::{InspectError, Inspectable, InspectorPanel, Property, PropertyValue};
use glam::Mat4;

const NORMAL_FOLDER: &str = "normal helper";

const DOT_STATE: DrawState = DrawState::new(BlendMode::Additive, true, false);
const LINE_STATE: DrawState = DrawState::new(BlendMode::Replace, true, false);

/// Per-vertex normal indicators for a mesh.
///
/// The target's vertices and normals are copied at construction; later
/// changes to the target's geometry are not picked up. Only its model
/// matrix is read every frame, through [`NormalSource`]. The overlay never
/// owns the target.
#[derive(Debug)]
pub struct NormalOverlay {
    visible: bool,
    line_color: Color,
    line_length: f32,
    dot_offset: f32,
    dot_size: f32,
    point_count: u32,
    model: Mat4,
    dots: OverlayPrimitive,
    lines: OverlayPrimitive,
}

impl NormalOverlay {
    pub fn new(
        ctx: &mut dyn RenderContext,
        target: &dyn NormalSource,
        config: &NormalConfig,
    ) -> RenderResult<Self> {
        config.validate()?;
        let segments = build_normal_segments(target.vertices(), target.normals(), config.line_length)?;

        let dots = OverlayPrimitive::new(
            ctx,
            PrimitiveDesc {
                label: "normals.dots",
                shader: Shader::NormalDot,
                topology: Topology::Points,
                state: DOT_STATE,
                attributes: vec![
                    VertexAttribute::vec3("position", target.vertices()),
                    VertexAttribute::vec3("normal", target.normals()),
                ],
                indices: None,
            },
        )?;

        let lines = match OverlayPrimitive::new(
            ctx,
            PrimitiveDesc {
                label: "normals.lines",
                shader: Shader::NormalLine,
                topology: Topology::Lines,
                state: LINE_STATE,
                attributes: vec![
                    VertexAttribute::vec3("position", &segments.line_vertices),
                    VertexAttribute::vec3("normal", &segments.line_normals),
                    VertexAttribute::scalar("side", &segments.sides),
                ],
                indices: Some(&segments.line_indices),
            },
        ) {
            Ok(lines) => lines,
            Err(err) => {
                dots.release(ctx);
                return Err(err);
            }
        };

        tracing::debug!(
            points = segments.point_count,
            line_vertices = segments.line_vertex_count(),
            line_indices = segments.line_indices.len(),
            "created normal overlay"
        );

        Ok(Self {
            visible: config.visible,
            line_color: config.line_color,
            line_length: config.line_length,
            dot_offset: config.dot_offset,
            dot_size: config.dot_size,
            point_count: segments.point_count as u32,
            model: target.model_matrix(),
            dots,
            lines,
        })
    }

    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    pub fn line_index_count(&self) -> u32 {
        self.lines.index_count().unwrap_or(0)
    }

    pub fn line_vertex_count(&self) -> u32 {
        self.lines.vertex_count()
    }

    pub fn line_length(&self) -> f32 {
        self.line_length
    }

    /// Dot diameter in pixels.
    pub fn dot_size(&self) -> f32 {
        self.dot_size
    }

    pub fn line_color(&self) -> Color {
        self.line_color
    }

    pub fn set_line_color(&mut self, color: Color) {
        self.line_color = color;
    }

    /// Model matrix copied from the target by the most recent render.
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Sync the model matrix from `target`, then draw dots and lines.
    pub fn render(
        &mut self,
        frame: &mut Frame<'_>,
        camera: &dyn Camera,
        target: &dyn NormalSource,
    ) -> RenderResult<()> {
        if !self.visible {
            return Ok(());
        }
        self.model = target.model_matrix();
        if self.point_count == 0 {
            return Ok(());
        }

        self.dots.bind(frame)?;
        self.dots.set_camera(frame, self.model, camera)?;
        self.dots
            .set_uniform(frame, uniforms::DOT_OFFSET, UniformValue::Float(self.dot_offset))?;
        self.dots
            .set_uniform(frame, uniforms::DOT_SIZE, UniformValue::Float(self.dot_size))?;
        self.dots.draw(frame)?;

        self.lines.bind(frame)?;
        self.lines.set_camera(frame, self.model, camera)?;
        self.lines
            .set_uniform(frame, uniforms::LINE_LENGTH, UniformValue::Float(self.line_length))?;
        self.lines.set_color(frame, self.line_color)?;
        self.lines.draw(frame)
    }

    pub fn add_gui(&self, panel: &mut dyn InspectorPanel) {
        panel.add_folder(NORMAL_FOLDER).add(Property::toggle("visible"));
    }

    /// Pair the overlay with its target so it can be driven as an [`Overlay`].
    pub fn with_target<'t>(&'t mut self, target: &'t dyn NormalSource) -> TargetedNormals<'t> {
        TargetedNormals {
            overlay: self,
            target,
        }
    }

    pub fn release(self, ctx: &mut dyn RenderContext) {
        self.dots.release(ctx);
        self.lines.release(ctx);
    }
}

impl Inspectable for NormalOverlay {
    fn property(&self, path: &str) -> Option<PropertyValue> {
        (path == "visible").then_some(PropertyValue::Bool(self.visible))
    }

    fn set_property(&mut self, path: &str, value: PropertyValue) -> Result<(), InspectError> {
        match path {
            "visible" => {
                self.visible = expect_bool(path, value)?;
                Ok(())
            }
            _ => Err(InspectError::UnknownProperty(path.to_string())),
        }
    }
}

/// A [`NormalOverlay`] borrowed together with the mesh it annotates.
pub struct TargetedNormals<'t> {
    overlay: &'t mut NormalOverlay,
    target: &'t dyn NormalSource,
}

impl Inspectable for TargetedNormals<'_> {
    fn property(&self, path: &str) -> Option<PropertyValue> {
        self.overlay.property(path)
    }

    fn set_property(&mut self, path: &str, value: PropertyValue) -> Result<(), InspectError> {
        self.overlay.set_property(path, value)
    }
}

impl Overlay for TargetedNormals<'_> {
    fn name(&self) -> &str {
        NORMAL_FOLDER
    }

    fn visible(&self) -> bool {
        self.overlay.visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.overlay.set_visible(visible);
    }

    fn render(&mut self, frame: &mut Frame<'_>, camera: &dyn Camera) -> RenderResult<()> {
        self.overlay.render(frame, camera, self.target)
    }

    fn add_gui(&self, panel: &mut dyn InspectorPanel) {
        self.overlay.add_gui(panel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::render_all;
    use crate::recording::RecordingContext;
    use debugviz_common::{CameraMatrices, ConfigError, Transform};
    use debugviz_geometry::Mesh;
    use debugviz_tools::PanelLayout;
    use glam::Vec3;

    fn cube() -> Mesh {
        Mesh::cube(100.0).unwrap()
    }

    fn render(ctx: &mut RecordingContext, overlay: &mut NormalOverlay, target: &Mesh) -> u32 {
        let mut frame = Frame::new(ctx);
        overlay
            .render(&mut frame, &CameraMatrices::default(), target)
            .unwrap();
        frame.draw_calls()
    }

    #[test]
    fn cube_segment_counts() {
        let mut ctx = RecordingContext::new();
        let overlay = NormalOverlay::new(&mut ctx, &cube(), &NormalConfig::default()).unwrap();
        assert_eq!(overlay.point_count(), 24);
        assert_eq!(overlay.line_vertex_count(), 48);
        assert_eq!(overlay.line_index_count(), 48);
    }

    #[test]
    fn dots_then_lines_with_their_states() {
        let mut ctx = RecordingContext::new();
        let target = cube();
        let mut overlay = NormalOverlay::new(&mut ctx, &target, &NormalConfig::default()).unwrap();
        assert_eq!(render(&mut ctx, &mut overlay, &target), 2);

        let [dots, lines] = ctx.draws() else {
            panic!("expected two draws");
        };
        assert_eq!(dots.shader, Shader::NormalDot);
        assert_eq!(dots.topology, Topology::Points);
        assert_eq!(dots.count, 24);
        assert_eq!(dots.blend, BlendMode::Additive);
        assert!(dots.depth_test && !dots.cull_face);
        assert_eq!(dots.uniform(uniforms::DOT_OFFSET), Some(UniformValue::Float(3.0)));
        assert_eq!(dots.uniform(uniforms::DOT_SIZE), Some(UniformValue::Float(6.0)));

        assert_eq!(lines.shader, Shader::NormalLine);
        assert_eq!(lines.topology, Topology::Lines);
        assert!(lines.indexed);
        assert_eq!(lines.count, 48);
        assert_eq!(lines.blend, BlendMode::Replace);
        assert!(lines.depth_test && !lines.cull_face);
        assert_eq!(
            lines.uniform(uniforms::COLOR),
            Some(UniformValue::Vec3(Vec3::new(1.0, 1.0, 0.0)))
        );
        assert_eq!(
            lines.uniform(uniforms::LINE_LENGTH),
            Some(UniformValue::Float(20.0))
        );
    }

    #[test]
    fn model_matrix_tracks_target_each_frame() {
        let mut ctx = RecordingContext::new();
        let mut target = cube();
        let mut overlay = NormalOverlay::new(&mut ctx, &target, &NormalConfig::default()).unwrap();

        target.transform = Transform::default().with_position(Vec3::new(0.0, 50.0, 0.0));
        render(&mut ctx, &mut overlay, &target);
        let expected = Mat4::from_translation(Vec3::new(0.0, 50.0, 0.0));
        assert_eq!(overlay.model_matrix(), expected);
        assert_eq!(
            ctx.draws()[1].uniform(uniforms::MODEL_MATRIX),
            Some(UniformValue::Mat4(expected))
        );
    }

    #[test]
    fn geometry_is_a_construction_snapshot() {
        let mut ctx = RecordingContext::new();
        let mut target = cube();
        let mut overlay = NormalOverlay::new(&mut ctx, &target, &NormalConfig::default()).unwrap();
        let buffer = ctx.buffers_labeled("normals.lines.position")[0];
        let before = ctx.vertex_data(buffer).unwrap().to_vec();

        target.positions.iter_mut().for_each(|p| *p *= 2.0);
        render(&mut ctx, &mut overlay, &target);
        assert_eq!(ctx.vertex_data(buffer).unwrap(), &before[..]);
        assert_eq!(ctx.draws()[0].count, 24);
    }

    #[test]
    fn configured_dot_size_reaches_the_dot_draw() {
        let mut ctx = RecordingContext::new();
        let target = cube();
        let config = NormalConfig {
            dot_size: 10.0,
            ..Default::default()
        };
        let mut overlay = NormalOverlay::new(&mut ctx, &target, &config).unwrap();
        assert_eq!(overlay.dot_size(), 10.0);
        render(&mut ctx, &mut overlay, &target);
        assert_eq!(
            ctx.draws()[0].uniform(uniforms::DOT_SIZE),
            Some(UniformValue::Float(10.0))
        );
        assert_eq!(ctx.draws()[1].uniform(uniforms::DOT_SIZE), None);
    }

    #[test]
    fn failed_construction_leaks_nothing() {
        // four allocations for the dots, six for the lines
        for allowed in 0..10 {
            let mut ctx = RecordingContext::new();
            ctx.fail_after_allocations(allowed);
            assert!(NormalOverlay::new(&mut ctx, &cube(), &NormalConfig::default()).is_err());
            assert_eq!(ctx.live_programs(), 0, "after {allowed} allocations");
            assert_eq!(ctx.live_buffers(), 0, "after {allowed} allocations");
            assert_eq!(ctx.live_vertex_arrays(), 0, "after {allowed} allocations");
        }
    }

    #[test]
    fn hidden_overlay_draws_nothing() {
        let mut ctx = RecordingContext::new();
        let target = cube();
        let mut overlay = NormalOverlay::new(&mut ctx, &target, &NormalConfig::default()).unwrap();
        overlay.set_visible(false);
        ctx.clear_log();
        assert_eq!(render(&mut ctx, &mut overlay, &target), 0);
        assert!(ctx.calls().is_empty());
    }

    #[test]
    fn mismatched_target_is_rejected() {
        struct Broken;
        impl NormalSource for Broken {
            fn model_matrix(&self) -> Mat4 {
                Mat4::IDENTITY
            }
            fn vertices(&self) -> &[f32] {
                &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]
            }
            fn normals(&self) -> &[f32] {
                &[0.0, 1.0, 0.0]
            }
        }

        let mut ctx = RecordingContext::new();
        let err = NormalOverlay::new(&mut ctx, &Broken, &NormalConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::RenderError::Config(ConfigError::LengthMismatch { .. })
        ));
        assert_eq!(ctx.live_programs(), 0);
    }

    #[test]
    fn vertex_array_fallback_still_draws() {
        let mut ctx = RecordingContext::without_vertex_arrays();
        let target = cube();
        let mut overlay = NormalOverlay::new(&mut ctx, &target, &NormalConfig::default()).unwrap();
        assert_eq!(render(&mut ctx, &mut overlay, &target), 2);
    }

    #[test]
    fn targeted_overlay_renders_after_grid() {
        let mut ctx = RecordingContext::new();
        let target = cube();
        let mut grid =
            crate::WireGridOverlay::new(&mut ctx, &crate::WireGridConfig::default()).unwrap();
        let mut normals = NormalOverlay::new(&mut ctx, &target, &NormalConfig::default()).unwrap();

        let mut frame = Frame::new(&mut ctx);
        let mut targeted = normals.with_target(&target);
        let mut overlays: [&mut dyn Overlay; 2] = [&mut grid, &mut targeted];
        let draws = render_all(&mut frame, &CameraMatrices::default(), &mut overlays).unwrap();
        assert_eq!(draws, 9);

        let shaders: Vec<_> = ctx.draws().iter().map(|d| d.shader).collect();
        assert_eq!(shaders.first(), Some(&Shader::FlatColor));
        assert_eq!(&shaders[7..], [Shader::NormalDot, Shader::NormalLine]);
    }

    #[test]
    fn registers_visible_toggle() {
        let mut ctx = RecordingContext::new();
        let target = cube();
        let mut overlay = NormalOverlay::new(&mut ctx, &target, &NormalConfig::default()).unwrap();
        let mut layout = PanelLayout::new();
        overlay.add_gui(&mut layout);
        assert_eq!(
            layout.folder("normal helper").unwrap().properties,
            vec![Property::toggle("visible")]
        );

        layout
            .apply(&mut overlay, "visible", PropertyValue::Bool(false))
            .unwrap();
        assert!(!overlay.visible());
        assert!(overlay.set_property("position.x", PropertyValue::Float(1.0)).is_err());
    }
}
