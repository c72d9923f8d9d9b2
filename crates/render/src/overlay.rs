use crate::error::RenderResult;
use crate::frame::Frame;
use debugviz_common::Camera;
use debugviz_tools::{InspectError, Inspectable, InspectorPanel, Property, PropertyValue};
use glam::Vec3;

/// Bounds of the position sliders registered by overlays.
pub const POSITION_RANGE: (f32, f32) = (-100.0, 100.0);

/// A debug overlay the host draws once per frame.
///
/// Overlays are independent structs sharing this interface; nothing is
/// inherited. Toggling visibility never touches GPU resources, it only gates
/// [`render`](Overlay::render).
pub trait Overlay: Inspectable {
    fn name(&self) -> &str;
    fn visible(&self) -> bool;
    fn set_visible(&mut self, visible: bool);

    /// Issue this overlay's draws. Does nothing when hidden.
    fn render(&mut self, frame: &mut Frame<'_>, camera: &dyn Camera) -> RenderResult<()>;

    /// Register editable properties.
    fn add_gui(&self, panel: &mut dyn InspectorPanel);
}

/// Render overlays in slice order, returning the number of draw calls issued.
pub fn render_all(
    frame: &mut Frame<'_>,
    camera: &dyn Camera,
    overlays: &mut [&mut dyn Overlay],
) -> RenderResult<u32> {
    let before = frame.draw_calls();
    for overlay in overlays.iter_mut() {
        overlay.render(frame, camera)?;
    }
    Ok(frame.draw_calls() - before)
}

/// Folder layout shared by the grid variants: `visible` plus an `x/y/z`
/// position sub-folder.
pub(crate) fn add_position_gui(panel: &mut dyn InspectorPanel, folder: &str) {
    let (min, max) = POSITION_RANGE;
    let folder = panel.add_folder(folder);
    folder.add(Property::toggle("visible"));
    let position = folder.add_folder("position");
    position.add(Property::range("position.x", min, max));
    position.add(Property::range("position.y", min, max));
    position.add(Property::range("position.z", min, max));
}

pub(crate) fn read_positioned(visible: bool, position: Vec3, path: &str) -> Option<PropertyValue> {
    match path {
        "visible" => Some(PropertyValue::Bool(visible)),
        "position.x" => Some(PropertyValue::Float(position.x)),
        "position.y" => Some(PropertyValue::Float(position.y)),
        "position.z" => Some(PropertyValue::Float(position.z)),
        _ => None,
    }
}

pub(crate) fn write_positioned(
    visible: &mut bool,
    position: &mut Vec3,
    path: &str,
    value: PropertyValue,
) -> Result<(), InspectError> {
    let slot = match path {
        "visible" => {
            *visible = expect_bool(path, value)?;
            return Ok(());
        }
        "position.x" => &mut position.x,
        "position.y" => &mut position.y,
        "position.z" => &mut position.z,
        _ => return Err(InspectError::UnknownProperty(path.to_string())),
    };
    *slot = value.as_float().ok_or_else(|| InspectError::TypeMismatch {
        path: path.to_string(),
        expected: "float",
    })?;
    Ok(())
}

pub(crate) fn expect_bool(path: &str, value: PropertyValue) -> Result<bool, InspectError> {
    value.as_bool().ok_or_else(|| InspectError::TypeMismatch {
        path: path.to_string(),
        expected: "bool",
    })
}
