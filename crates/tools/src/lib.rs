//! Developer tooling: inspector panel bindings.
//!
//! Overlays register their editable properties on an [`InspectorPanel`];
//! a GUI backend later reads and writes them through [`Inspectable`].
//!
//! # Invariants
//! - Registration never reads GUI state.
//! - Writes go through the registered binding, so ranges are enforced.

mod inspector;

pub use inspector::{
    Folder, InspectError, Inspectable, InspectorPanel, PanelLayout, Property, PropertyValue,
};

pub fn crate_info() -> &'static str {
    "debugviz-tools v0.1.0"
}
