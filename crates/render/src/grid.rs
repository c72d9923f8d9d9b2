//! Ground-plane grid overlays.
//!
//! Two independent variants built from the same geometry:
//! [`WireGridOverlay`] draws a wireframe plane and orientation axes,
//! [`FilledGridOverlay`] draws a translucent fill with thick major/minor
//! lines on top.

use crate::config::{FilledGridConfig, WireGridConfig};
use crate::context::{BlendMode, DrawState, RenderContext, Topology, UniformValue};
use crate::error::RenderResult;
use crate::frame::Frame;
use crate::overlay::{Overlay, add_position_gui, read_positioned, write_positioned};
use crate::primitive::{OverlayPrimitive, PrimitiveDesc, VertexAttribute};
use crate::shaders::{Shader, uniforms};
use debugviz_common::{Camera, Color, Transform};
use debugviz_geometry::{
    AXIS_DIRECTIONS, ThickLineGrid, build_axis_unit, build_plane, build_thick_line_grid,
    corner_anchors,
};
use debugviz_tools::{InspectError, Inspectable, InspectorPanel, PropertyValue};
use glam::{Mat4, Vec2, Vec3};

const GRID_FOLDER: &str = "gridHelper";

const WIRE_STATE: DrawState = DrawState::new(BlendMode::Replace, true, false);
const AXIS_STATE: DrawState = DrawState::new(BlendMode::Replace, true, false);
const FILL_STATE: DrawState = DrawState::new(BlendMode::Alpha, true, false);

/// Wireframe plane with XYZ axes at two opposite corners.
#[derive(Debug)]
pub struct WireGridOverlay {
    transform: Transform,
    visible: bool,
    color: Color,
    axis_length: f32,
    axis_lift: f32,
    anchors: [Vec2; 2],
    model: Mat4,
    wire: OverlayPrimitive,
    axis: OverlayPrimitive,
}

impl WireGridOverlay {
    pub fn new(ctx: &mut dyn RenderContext, config: &WireGridConfig) -> RenderResult<Self> {
        config.validate()?;
        let plane = build_plane(
            config.width,
            config.height,
            config.width_segments,
            config.height_segments,
        )?;

        let wire = OverlayPrimitive::new(
            ctx,
            PrimitiveDesc {
                label: "grid.wire",
                shader: Shader::FlatColor,
                topology: Topology::Lines,
                state: WIRE_STATE,
                attributes: vec![VertexAttribute::vec3("position", &plane.vertices)],
                indices: Some(&plane.wire_indices),
            },
        )?;

        let rate = build_axis_unit();
        let axis = match OverlayPrimitive::new(
            ctx,
            PrimitiveDesc {
                label: "grid.axis",
                shader: Shader::Axis,
                topology: Topology::Lines,
                state: AXIS_STATE,
                attributes: vec![VertexAttribute::scalar("rate", &rate)],
                indices: None,
            },
        ) {
            Ok(axis) => axis,
            Err(err) => {
                wire.release(ctx);
                return Err(err);
            }
        };

        tracing::debug!(
            width = config.width,
            height = config.height,
            vertices = plane.vertex_count(),
            wire_indices = plane.wire_indices.len(),
            "created wire grid overlay"
        );

        Ok(Self {
            transform: config.transform,
            visible: config.visible,
            color: config.color,
            axis_length: config.axis_length,
            axis_lift: config.axis_lift,
            anchors: corner_anchors(config.width, config.height),
            model: config.transform.model_matrix(),
            wire,
            axis,
        })
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Change the wire color. Takes effect on the next render.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn axis_length(&self) -> f32 {
        self.axis_length
    }

    /// Model matrix used by the most recent render.
    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    /// World-space origins of the two axis triads for the current position.
    pub fn axis_origins(&self) -> [Vec3; 2] {
        let p = self.transform.position;
        self.anchors
            .map(|a| Vec3::new(a.x + p.x, self.axis_lift + p.y, a.y + p.z))
    }

    pub fn release(self, ctx: &mut dyn RenderContext) {
        self.wire.release(ctx);
        self.axis.release(ctx);
    }

    fn draw_wire(&self, frame: &mut Frame<'_>, camera: &dyn Camera) -> RenderResult<()> {
        self.wire.bind(frame)?;
        self.wire.set_camera(frame, self.model, camera)?;
        self.wire.set_color(frame, self.color)?;
        self.wire.draw(frame)
    }

    fn draw_axes(&self, frame: &mut Frame<'_>, camera: &dyn Camera) -> RenderResult<()> {
        self.axis.bind(frame)?;
        self.axis.set_camera(frame, Mat4::IDENTITY, camera)?;
        self.axis
            .set_uniform(frame, uniforms::LENGTH, UniformValue::Float(self.axis_length))?;
        for origin in self.axis_origins() {
            self.axis
                .set_uniform(frame, uniforms::START_POSITION, UniformValue::Vec3(origin))?;
            for direction in AXIS_DIRECTIONS {
                self.axis
                    .set_uniform(frame, uniforms::DIRECTION, UniformValue::Vec3(direction))?;
                // x red, y green, z blue
                self.axis.set_color(frame, Color::from(direction))?;
                self.axis.draw(frame)?;
            }
        }
        Ok(())
    }
}

impl Overlay for WireGridOverlay {
    fn name(&self) -> &str {
        "wire grid"
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn render(&mut self, frame: &mut Frame<'_>, camera: &dyn Camera) -> RenderResult<()> {
        if !self.visible {
            return Ok(());
        }
        self.model = self.transform.model_matrix();
        self.draw_wire(frame, camera)?;
        self.draw_axes(frame, camera)
    }

    fn add_gui(&self, panel: &mut dyn InspectorPanel) {
        add_position_gui(panel, GRID_FOLDER);
    }
}

impl Inspectable for WireGridOverlay {
    fn property(&self, path: &str) -> Option<PropertyValue> {
        read_positioned(self.visible, self.transform.position, path)
    }

    fn set_property(&mut self, path: &str, value: PropertyValue) -> Result<(), InspectError> {
        write_positioned(&mut self.visible, &mut self.transform.position, path, value)
    }
}

/// Translucent fill plane with a thick-line grid drawn in the fill's space.
#[derive(Debug)]
pub struct FilledGridOverlay {
    transform: Transform,
    visible: bool,
    fill_color: Color,
    line_color: Color,
    model: Mat4,
    fill: OverlayPrimitive,
    lines: OverlayPrimitive,
}

impl FilledGridOverlay {
    pub fn new(ctx: &mut dyn RenderContext, config: &FilledGridConfig) -> RenderResult<Self> {
        config.validate()?;
        let plane = build_plane(config.width, config.height, 1, 1)?;
        let line_grid = Self::line_grid(config)?;

        let fill = OverlayPrimitive::new(
            ctx,
            PrimitiveDesc {
                label: "grid.fill",
                shader: Shader::FlatColor,
                topology: Topology::Triangles,
                state: FILL_STATE,
                attributes: vec![VertexAttribute::vec3("position", &plane.vertices)],
                indices: Some(&plane.indices),
            },
        )?;

        let lines = match OverlayPrimitive::new(
            ctx,
            PrimitiveDesc {
                label: "grid.lines",
                shader: Shader::FlatColor,
                topology: Topology::Triangles,
                state: FILL_STATE,
                attributes: vec![VertexAttribute::vec3("position", &line_grid.vertices)],
                indices: Some(&line_grid.indices),
            },
        ) {
            Ok(lines) => lines,
            Err(err) => {
                fill.release(ctx);
                return Err(err);
            }
        };

        tracing::debug!(
            width = config.width,
            height = config.height,
            line_vertices = line_grid.vertex_count(),
            line_indices = line_grid.index_count(),
            "created filled grid overlay"
        );

        Ok(Self {
            transform: config.transform,
            visible: config.visible,
            fill_color: config.fill_color,
            line_color: config.line_color,
            model: config.transform.model_matrix(),
            fill,
            lines,
        })
    }

    /// The line mesh a config produces, without touching a context.
    pub fn line_grid(config: &FilledGridConfig) -> RenderResult<ThickLineGrid> {
        let (width_segments, height_segments) = config.line_segments();
        Ok(build_thick_line_grid(
            config.width,
            config.height,
            width_segments,
            height_segments,
            config.stroke_width,
        )?)
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn line_color(&self) -> Color {
        self.line_color
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    pub fn set_line_color(&mut self, color: Color) {
        self.line_color = color;
    }

    pub fn line_index_count(&self) -> u32 {
        self.lines.index_count().unwrap_or(0)
    }

    pub fn line_vertex_count(&self) -> u32 {
        self.lines.vertex_count()
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.model
    }

    pub fn release(self, ctx: &mut dyn RenderContext) {
        self.fill.release(ctx);
        self.lines.release(ctx);
    }
}

impl Overlay for FilledGridOverlay {
    fn name(&self) -> &str {
        "filled grid"
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn render(&mut self, frame: &mut Frame<'_>, camera: &dyn Camera) -> RenderResult<()> {
        if !self.visible {
            return Ok(());
        }
        self.model = self.transform.model_matrix();

        self.fill.bind(frame)?;
        self.fill.set_camera(frame, self.model, camera)?;
        self.fill.set_color(frame, self.fill_color)?;
        self.fill.draw(frame)?;

        self.lines.bind(frame)?;
        self.lines.set_camera(frame, self.model, camera)?;
        self.lines.set_color(frame, self.line_color)?;
        self.lines.draw(frame)
    }

    fn add_gui(&self, panel: &mut dyn InspectorPanel) {
        add_position_gui(panel, GRID_FOLDER);
    }
}

impl Inspectable for FilledGridOverlay {
    fn property(&self, path: &str) -> Option<PropertyValue> {
        read_positioned(self.visible, self.transform.position, path)
    }

    fn set_property(&mut self, path: &str, value: PropertyValue) -> Result<(), InspectError> {
        write_positioned(&mut self.visible, &mut self.transform.position, path, value)
    }
}
