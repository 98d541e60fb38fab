use std::{
    collections::BTreeMap,
    fmt,
    fs,
    path::Path,
};

use tracing::debug;

use crate::{usda, Error, Result};

/// How a prim is introduced in its layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specifier {
    /// `def`: a concrete prim.
    Def,
    /// `over`: an override of a prim defined elsewhere.
    Over,
    /// `class`: an abstract prim other prims inherit from.
    Class,
}

impl Specifier {
    pub(crate) fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "def" => Some(Self::Def),
            "over" => Some(Self::Over),
            "class" => Some(Self::Class),
            _ => None,
        }
    }
}

/// Value held by a property.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `string` data.
    String(String),
    /// `token` data.
    Token(String),
    /// `asset` path, written `@path@`.
    Asset(String),
    /// Integer data.
    Int(i64),
    /// Floating point data.
    Float(f64),
    /// Boolean data.
    Bool(bool),
    /// Prim or property path, written `</Root/Child>`.
    Path(String),
    /// Composite data (arrays, tuples, dictionaries) kept as source text.
    Raw(String),
}

impl Value {
    /// Name of the scene type matching this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Token(_) => "token",
            Self::Asset(_) => "asset",
            Self::Int(_) => "int",
            Self::Float(_) => "double",
            Self::Bool(_) => "bool",
            Self::Path(_) | Self::Raw(_) => "",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) | Self::Token(value) => write!(f, "{:?}", value),
            Self::Asset(value) => write!(f, "@{}@", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Path(value) => write!(f, "<{}>", value),
            Self::Raw(value) => f.write_str(value),
        }
    }
}

/// A named attribute or relationship of a prim.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Declared type, i.e. `string`, `float3[]`, or `rel` for relationships.
    pub type_name: String,
    /// Authored value. `None` for declarations without a default.
    pub value: Option<Value>,
    /// Declared with the `custom` qualifier.
    pub custom: bool,
}

/// A node of the scene graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Prim {
    path: String,
    specifier: Specifier,
    type_name: Option<String>,
    properties: BTreeMap<String, Property>,
    children: Vec<String>,
}

impl Prim {
    pub(crate) fn new(path: String, specifier: Specifier, type_name: Option<String>) -> Self {
        Self {
            path,
            specifier,
            type_name,
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Absolute path of the prim.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Name of the prim, the last element of its path.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Specifier the prim was introduced with.
    pub fn specifier(&self) -> Specifier {
        self.specifier
    }

    /// Schema type of the prim, i.e. `Xform`.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Paths of the direct children, in authoring order.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Looks up a property by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Iterates over all properties, sorted by name.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(name, prop)| (name.as_str(), prop))
    }

    /// Returns the value of `name` if it holds `string` data.
    ///
    /// A missing property, a property without a value, or a property holding
    /// another type all yield `None`.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.property(name)?.value.as_ref()? {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Authors `value` on the property `name`, declaring it if needed.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        let name = name.into();
        match self.properties.get_mut(&name) {
            Some(property) => property.value = Some(value),
            None => {
                self.properties.insert(
                    name,
                    Property {
                        type_name: value.type_name().to_owned(),
                        value: Some(value),
                        custom: false,
                    },
                );
            }
        }
        self
    }

    pub(crate) fn insert_property(&mut self, name: String, property: Property) {
        self.properties.insert(name, property);
    }
}

/// A scene-description document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stage {
    prims: BTreeMap<String, Prim>,
    root_prims: Vec<String>,
}

impl Stage {
    /// Creates an empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a `.usda` document.
    ///
    /// Binary crate files are recognized and rejected with
    /// [`Error::UnsupportedFormat`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| Error::Io(path.to_owned(), e))?;
        if bytes.starts_with(b"PXR-USDC") || bytes.starts_with(b"PK\x03\x04") {
            return Err(Error::UnsupportedFormat(path.to_owned()));
        }
        let text = String::from_utf8(bytes).map_err(|_e| Error::Parse {
            line: 1,
            message: "document is not valid utf-8".to_owned(),
        })?;
        let stage = Self::parse(&text)?;
        debug!(
            "opened stage '{}' with {} prims",
            path.display(),
            stage.prims.len()
        );
        Ok(stage)
    }

    /// Parses `.usda` text.
    pub fn parse(text: &str) -> Result<Self> {
        usda::parse(text)
    }

    /// Returns the prim at an absolute path, i.e. `/Root`.
    pub fn prim_at_path(&self, path: &str) -> Option<&Prim> {
        self.prims.get(path)
    }

    /// Mutable access to the prim at an absolute path.
    pub fn prim_at_path_mut(&mut self, path: &str) -> Option<&mut Prim> {
        self.prims.get_mut(path)
    }

    /// Paths of the top-level prims, in authoring order.
    pub fn root_prims(&self) -> &[String] {
        &self.root_prims
    }

    /// Iterates over all prims, sorted by path.
    pub fn prims(&self) -> impl Iterator<Item = &Prim> {
        self.prims.values()
    }

    /// Defines a prim at `path`, or returns the existing one.
    ///
    /// The parent of `path` must already exist unless `path` is top-level.
    pub fn define_prim(&mut self, path: &str, type_name: &str) -> Result<&mut Prim> {
        let (parent, name) = split_path(path).ok_or_else(|| Error::InvalidPath(path.to_owned()))?;
        if !self.prims.contains_key(path) {
            let type_name = (!type_name.is_empty()).then(|| type_name.to_owned());
            let prim = Prim::new(path.to_owned(), Specifier::Def, type_name);
            self.insert_prim(parent, prim)
                .map_err(|_e| Error::InvalidPath(format!("{}/{}", parent, name)))?;
        }
        self.prims
            .get_mut(path)
            .ok_or_else(|| Error::InvalidPath(path.to_owned()))
    }

    pub(crate) fn insert_prim(&mut self, parent: &str, prim: Prim) -> Result<()> {
        if parent == "/" {
            self.root_prims.push(prim.path.clone());
        } else {
            let parent_prim = self
                .prims
                .get_mut(parent)
                .ok_or_else(|| Error::InvalidPath(prim.path.clone()))?;
            parent_prim.children.push(prim.path.clone());
        }
        self.prims.insert(prim.path.clone(), prim);
        Ok(())
    }
}

/// Splits an absolute prim path into its parent path and its name.
fn split_path(path: &str) -> Option<(&str, &str)> {
    if !path.starts_with('/') || path.len() < 2 || path.ends_with('/') {
        return None;
    }
    let index = path.rfind('/')?;
    let name = &path[index + 1..];
    if name.is_empty() || path.contains("//") {
        return None;
    }
    let parent = if index == 0 { "/" } else { &path[..index] };
    Some((parent, name))
}

pub(crate) fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let mut stage = Stage::new();
        stage
            .define_prim("/Root", "Xform")
            .unwrap()
            .set("uid", Value::String("abc".to_owned()))
            .set("density", Value::Float(2.5));
        stage.define_prim("/Root/Collider", "Cube").unwrap();

        let root = stage.prim_at_path("/Root").unwrap();
        assert_eq!(root.name(), "Root");
        assert_eq!(root.type_name(), Some("Xform"));
        assert_eq!(root.get_string("uid"), Some("abc"));
        assert_eq!(root.get_string("density"), None);
        assert_eq!(root.get_string("missing"), None);
        assert_eq!(root.children(), ["/Root/Collider".to_owned()]);
        assert_eq!(stage.root_prims(), ["/Root".to_owned()]);
    }

    #[test]
    fn define_requires_parent() {
        let mut stage = Stage::new();
        assert!(matches!(
            stage.define_prim("/Root/Child", "Xform"),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            stage.define_prim("Root", "Xform"),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            stage.define_prim("/", "Xform"),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn define_existing_prim() {
        let mut stage = Stage::new();
        stage
            .define_prim("/Root", "Xform")
            .unwrap()
            .set("uid", Value::String("abc".to_owned()));
        let root = stage.define_prim("/Root", "Scope").unwrap();
        assert_eq!(root.get_string("uid"), Some("abc"));
        assert_eq!(stage.root_prims().len(), 1);
    }

    #[test]
    fn token_is_not_string() {
        let mut stage = Stage::new();
        stage
            .define_prim("/Root", "")
            .unwrap()
            .set("uid", Value::Token("abc".to_owned()));
        let root = stage.prim_at_path("/Root").unwrap();
        assert_eq!(root.type_name(), None);
        assert_eq!(root.get_string("uid"), None);
    }

    #[test]
    fn open_rejects_binary_crate_files() {
        let work_dir = tempfile::tempdir().unwrap();
        let path = work_dir.path().join("scene.usdc");
        fs::write(&path, b"PXR-USDC\x00\x00\x00\x00").unwrap();
        assert!(matches!(
            Stage::open(&path),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn open_missing_file() {
        let work_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Stage::open(work_dir.path().join("missing.usda")),
            Err(Error::Io(_, _))
        ));
    }
}
