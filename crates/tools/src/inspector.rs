/// A value exchanged between an inspector widget and the object it edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Float(f32),
}

impl PropertyValue {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(b),
            Self::Float(_) => None,
        }
    }

    pub fn as_float(self) -> Option<f32> {
        match self {
            Self::Float(f) => Some(f),
            Self::Bool(_) => None,
        }
    }
}

/// One registered binding. `path` is dot-separated (`"position.x"`) and is
/// resolved by the bound object's [`Inspectable`] impl, not by the panel.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Toggle { path: String },
    Range { path: String, min: f32, max: f32 },
}

impl Property {
    pub fn toggle(path: impl Into<String>) -> Self {
        Self::Toggle { path: path.into() }
    }

    pub fn range(path: impl Into<String>, min: f32, max: f32) -> Self {
        Self::Range {
            path: path.into(),
            min,
            max,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Toggle { path } | Self::Range { path, .. } => path,
        }
    }

    /// Widget label: the last path segment.
    pub fn label(&self) -> &str {
        let path = self.path();
        path.rsplit('.').next().unwrap_or(path)
    }

    /// Coerce `value` into what this binding accepts, clamping ranges.
    pub fn constrain(&self, value: PropertyValue) -> Result<PropertyValue, InspectError> {
        match (self, value) {
            (Self::Toggle { .. }, PropertyValue::Bool(_)) => Ok(value),
            (Self::Range { min, max, .. }, PropertyValue::Float(f)) => {
                Ok(PropertyValue::Float(f.clamp(*min, *max)))
            }
            (Self::Toggle { path }, _) => Err(InspectError::TypeMismatch {
                path: path.clone(),
                expected: "bool",
            }),
            (Self::Range { path, .. }, _) => Err(InspectError::TypeMismatch {
                path: path.clone(),
                expected: "float",
            }),
        }
    }
}

/// Errors from reading or writing a bound property.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InspectError {
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    #[error("property {path} expects a {expected}")]
    TypeMismatch { path: String, expected: &'static str },
}

/// The registration side of an inspector GUI.
///
/// Objects describe which of their properties are editable; they never read
/// the panel's internal state back.
pub trait InspectorPanel {
    /// Open (or create) a nested folder and return it for further registration.
    fn add_folder(&mut self, name: &str) -> &mut dyn InspectorPanel;

    /// Register a binding in this folder.
    fn add(&mut self, property: Property);
}

/// Value access for objects exposed through an [`InspectorPanel`].
pub trait Inspectable {
    fn property(&self, path: &str) -> Option<PropertyValue>;
    fn set_property(&mut self, path: &str, value: PropertyValue) -> Result<(), InspectError>;
}

/// A named group of bindings, possibly nested.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Folder {
    pub name: String,
    pub properties: Vec<Property>,
    pub folders: Vec<Folder>,
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// Find a binding by path anywhere below this folder.
    pub fn find(&self, path: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.path() == path)
            .or_else(|| self.folders.iter().find_map(|f| f.find(path)))
    }

    /// Total number of bindings below this folder.
    pub fn property_count(&self) -> usize {
        self.properties.len() + self.folders.iter().map(Folder::property_count).sum::<usize>()
    }

    fn write_tree(&self, f: &mut std::fmt::Formatter<'_>, depth: usize) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        writeln!(f, "{indent}[{}]", self.name)?;
        for p in &self.properties {
            match p {
                Property::Toggle { path } => writeln!(f, "{indent}  {path}: toggle")?,
                Property::Range { path, min, max } => {
                    writeln!(f, "{indent}  {path}: [{min}, {max}]")?
                }
            }
        }
        for folder in &self.folders {
            folder.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl InspectorPanel for Folder {
    fn add_folder(&mut self, name: &str) -> &mut dyn InspectorPanel {
        let idx = match self.folders.iter().position(|f| f.name == name) {
            Some(idx) => idx,
            None => {
                self.folders.push(Folder::new(name));
                self.folders.len() - 1
            }
        };
        &mut self.folders[idx]
    }

    fn add(&mut self, property: Property) {
        tracing::trace!(folder = %self.name, path = property.path(), "registered inspector binding");
        self.properties.push(property);
    }
}

/// Recording inspector: keeps the registered folder tree so a GUI backend
/// (or a test) can walk it later.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelLayout {
    root: Folder,
}

impl Default for PanelLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelLayout {
    pub fn new() -> Self {
        Self {
            root: Folder::new("root"),
        }
    }

    pub fn root(&self) -> &Folder {
        &self.root
    }

    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.root.folder(name)
    }

    /// Write `value` into `target` through the binding registered at `path`,
    /// clamping to its range.
    pub fn apply(
        &self,
        target: &mut dyn Inspectable,
        path: &str,
        value: PropertyValue,
    ) -> Result<(), InspectError> {
        let binding = self
            .root
            .find(path)
            .ok_or_else(|| InspectError::UnknownProperty(path.to_string()))?;
        target.set_property(path, binding.constrain(value)?)
    }
}

impl InspectorPanel for PanelLayout {
    fn add_folder(&mut self, name: &str) -> &mut dyn InspectorPanel {
        self.root.add_folder(name)
    }

    fn add(&mut self, property: Property) {
        self.root.add(property);
    }
}

impl std::fmt::Display for PanelLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for folder in &self.root.folders {
            folder.write_tree(f, 0)?;
        }
        for p in &self.root.properties {
            writeln!(f, "{}", p.path())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Knob {
        on: bool,
        level: f32,
    }

    impl Inspectable for Knob {
        fn property(&self, path: &str) -> Option<PropertyValue> {
            match path {
                "on" => Some(PropertyValue::Bool(self.on)),
                "knob.level" => Some(PropertyValue::Float(self.level)),
                _ => None,
            }
        }

        fn set_property(&mut self, path: &str, value: PropertyValue) -> Result<(), InspectError> {
            match (path, value) {
                ("on", PropertyValue::Bool(b)) => self.on = b,
                ("knob.level", PropertyValue::Float(f)) => self.level = f,
                _ => return Err(InspectError::UnknownProperty(path.into())),
            }
            Ok(())
        }
    }

    fn layout() -> PanelLayout {
        let mut layout = PanelLayout::new();
        let folder = layout.add_folder("knob");
        folder.add(Property::toggle("on"));
        folder.add_folder("detail").add(Property::range("knob.level", 0.0, 10.0));
        layout
    }

    #[test]
    fn records_nested_folders() {
        let layout = layout();
        let knob = layout.folder("knob").unwrap();
        assert_eq!(knob.properties, vec![Property::toggle("on")]);
        assert_eq!(knob.folder("detail").unwrap().properties.len(), 1);
        assert_eq!(layout.root().property_count(), 2);
    }

    #[test]
    fn reopening_a_folder_reuses_it() {
        let mut layout = PanelLayout::new();
        layout.add_folder("a").add(Property::toggle("x"));
        layout.add_folder("a").add(Property::toggle("y"));
        assert_eq!(layout.root().folders.len(), 1);
        assert_eq!(layout.folder("a").unwrap().properties.len(), 2);
    }

    #[test]
    fn apply_clamps_to_range() {
        let layout = layout();
        let mut knob = Knob::default();
        layout
            .apply(&mut knob, "knob.level", PropertyValue::Float(42.0))
            .unwrap();
        assert_eq!(knob.level, 10.0);
        layout.apply(&mut knob, "on", PropertyValue::Bool(true)).unwrap();
        assert_eq!(knob.property("on"), Some(PropertyValue::Bool(true)));
    }

    #[test]
    fn apply_rejects_unknown_or_mistyped() {
        let layout = layout();
        let mut knob = Knob::default();
        assert_eq!(
            layout.apply(&mut knob, "missing", PropertyValue::Bool(true)),
            Err(InspectError::UnknownProperty("missing".into()))
        );
        assert!(matches!(
            layout.apply(&mut knob, "on", PropertyValue::Float(1.0)),
            Err(InspectError::TypeMismatch { expected: "bool", .. })
        ));
    }

    #[test]
    fn labels_use_last_segment() {
        assert_eq!(Property::range("position.x", -1.0, 1.0).label(), "x");
        assert_eq!(Property::toggle("visible").label(), "visible");
    }

    #[test]
    fn display_lists_tree() {
        let s = format!("{}", layout());
        assert!(s.contains("[knob]"));
        assert!(s.contains("on: toggle"));
        assert!(s.contains("knob.level: [0, 10]"));
    }
}
