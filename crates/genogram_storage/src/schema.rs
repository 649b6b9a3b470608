//! Static property schemas and the event extension registry.
//!
//! Every entity kind declares its properties up front. Events additionally
//! accept the per-diagram extension properties registered in an
//! [`ExtensionRegistry`].

use genogram_foundation::{EntityKind, Error, Result, Value, ValueType};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Declaration of one built-in property.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySpec {
    /// Property name.
    pub name: &'static str,
    /// Declared value type.
    pub ty: ValueType,
    /// Whether layers may override it.
    pub layered: bool,
    /// Geometry properties are only overridden by layers that store geometry.
    pub geometry: bool,
    /// Value returned when nothing is set.
    pub default: Value,
}

impl PropertySpec {
    const fn new(name: &'static str, ty: ValueType, default: Value) -> Self {
        Self {
            name,
            ty,
            layered: false,
            geometry: false,
            default,
        }
    }

    const fn plain(name: &'static str, ty: ValueType) -> Self {
        Self::new(name, ty, Value::Nil)
    }

    const fn layered(mut self) -> Self {
        self.layered = true;
        self
    }

    const fn geometry(mut self) -> Self {
        self.layered = true;
        self.geometry = true;
        self
    }
}

/// Name of the tag list property shared by every taggable kind.
pub const TAGS: &str = "tags";

/// Name of the canvas position property.
pub const ITEM_POS: &str = "item_pos";

/// Name of the size property.
pub const SIZE: &str = "size";

const PERSON: &[PropertySpec] = &[
    PropertySpec::plain("name", ValueType::String),
    PropertySpec::plain("middle_name", ValueType::String),
    PropertySpec::plain("last_name", ValueType::String),
    PropertySpec::plain("nick_name", ValueType::String),
    PropertySpec::plain("birth_name", ValueType::String),
    PropertySpec::plain("alias", ValueType::String),
    PropertySpec::plain("gender", ValueType::String),
    PropertySpec::new("primary", ValueType::Bool, Value::Bool(false)),
    PropertySpec::new("deceased", ValueType::Bool, Value::Bool(false)),
    PropertySpec::plain("deceased_reason", ValueType::String),
    PropertySpec::new("adopted", ValueType::Bool, Value::Bool(false)),
    PropertySpec::plain("diagram_notes", ValueType::String),
    PropertySpec::plain("notes", ValueType::String),
    PropertySpec::new("show_last_name", ValueType::Bool, Value::Bool(true)),
    PropertySpec::new("show_middle_name", ValueType::Bool, Value::Bool(true)),
    PropertySpec::new("show_nick_name", ValueType::Bool, Value::Bool(true)),
    PropertySpec::new("hide_details", ValueType::Bool, Value::Bool(false))
        .layered(),
    PropertySpec::plain("color", ValueType::String).layered(),
    PropertySpec::plain("item_opacity", ValueType::Float).layered(),
    PropertySpec::new("big_font", ValueType::Bool, Value::Bool(false))
        .layered(),
    PropertySpec::new(SIZE, ValueType::Int, Value::Int(5))
        .geometry(),
    PropertySpec::new(ITEM_POS, ValueType::Point, Value::point(0.0, 0.0))
        .geometry(),
    PropertySpec::plain(TAGS, ValueType::List),
];

const PAIR_BOND: &[PropertySpec] = &[
    PropertySpec::new("married", ValueType::Bool, Value::Bool(true)),
    PropertySpec::new("separated", ValueType::Bool, Value::Bool(false)),
    PropertySpec::new("divorced", ValueType::Bool, Value::Bool(false)),
    PropertySpec::new("custody", ValueType::Int, Value::Int(-1)),
    PropertySpec::plain("diagram_notes", ValueType::String),
    PropertySpec::plain("notes", ValueType::String),
    PropertySpec::new("hide_details", ValueType::Bool, Value::Bool(false))
        .layered(),
    PropertySpec::new("big_font", ValueType::Bool, Value::Bool(false))
        .layered(),
    PropertySpec::plain(TAGS, ValueType::List),
];

const CHILD_OF: &[PropertySpec] = &[];

const MULTIPLE_BIRTH: &[PropertySpec] = &[PropertySpec::plain(TAGS, ValueType::List)];

const EMOTION: &[PropertySpec] = &[
    PropertySpec::new("intensity", ValueType::Int, Value::Int(1)),
    PropertySpec::new("is_date_range", ValueType::Bool, Value::Bool(false)),
    PropertySpec::plain("start_date_time", ValueType::DateTime),
    PropertySpec::plain("end_date_time", ValueType::DateTime),
    PropertySpec::plain("notes", ValueType::String),
    PropertySpec::plain("color", ValueType::String).layered(),
    PropertySpec::new(ITEM_POS, ValueType::Point, Value::point(0.0, 0.0))
        .geometry(),
    PropertySpec::plain(TAGS, ValueType::List),
];

const EVENT: &[PropertySpec] = &[
    PropertySpec::plain("date_time", ValueType::DateTime),
    PropertySpec::new("unsure", ValueType::Bool, Value::Bool(true)),
    PropertySpec::plain("description", ValueType::String),
    PropertySpec::new("nodal", ValueType::Bool, Value::Bool(false)),
    PropertySpec::plain("notes", ValueType::String),
    PropertySpec::plain("location", ValueType::String),
    PropertySpec::new("include_on_diagram", ValueType::Bool, Value::Bool(false)),
    PropertySpec::plain(TAGS, ValueType::List),
];

const LAYER: &[PropertySpec] = &[
    PropertySpec::plain("description", ValueType::String),
    PropertySpec::plain("notes", ValueType::String),
];

/// Returns the built-in property declarations of a kind.
#[must_use]
pub fn properties(kind: EntityKind) -> &'static [PropertySpec] {
    match kind {
        EntityKind::Person => PERSON,
        EntityKind::PairBond => PAIR_BOND,
        EntityKind::ChildOf => CHILD_OF,
        EntityKind::MultipleBirth => MULTIPLE_BIRTH,
        EntityKind::Emotion => EMOTION,
        EntityKind::Event => EVENT,
        EntityKind::Layer => LAYER,
    }
}

/// Finds a built-in property declaration.
#[must_use]
pub fn find(kind: EntityKind, name: &str) -> Option<&'static PropertySpec> {
    properties(kind).iter().find(|spec| spec.name == name)
}

/// Resolved declaration of a property on a concrete kind.
///
/// Covers both built-in properties and event extension properties.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyInfo {
    /// Declared value type.
    pub ty: ValueType,
    /// Whether layers may override it.
    pub layered: bool,
    /// Whether only geometry-storing layers may override it.
    pub geometry: bool,
    /// Value returned when nothing is set.
    pub default: Value,
}

impl From<&PropertySpec> for PropertyInfo {
    fn from(spec: &PropertySpec) -> Self {
        Self {
            ty: spec.ty,
            layered: spec.layered,
            geometry: spec.geometry,
            default: spec.default.clone(),
        }
    }
}

/// A per-diagram event property.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtensionSpec {
    /// Display name.
    pub name: String,
    /// Property key derived from the name.
    pub attr: String,
    /// Declared value type.
    pub ty: ValueType,
}

impl ExtensionSpec {
    /// Creates a spec, deriving the attribute key from the display name.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        let name = name.into();
        let attr = attr_for(&name);
        Self { name, attr, ty }
    }
}

/// Derives the property key for an extension display name.
///
/// `"Anxiety Level"` becomes `"x_anxiety_level"`; the prefix keeps extension
/// keys from colliding with built-in event properties.
#[must_use]
pub fn attr_for(name: &str) -> String {
    let mut attr = String::from("x_");
    for word in name.split_whitespace() {
        if attr.len() > 2 {
            attr.push('_');
        }
        attr.extend(word.chars().flat_map(char::to_lowercase));
    }
    attr
}

/// Ordered registry of extension properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct ExtensionRegistry {
    specs: Vec<ExtensionSpec>,
}

impl ExtensionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a spec by attribute key.
    #[must_use]
    pub fn get(&self, attr: &str) -> Option<&ExtensionSpec> {
        self.specs.iter().find(|spec| spec.attr == attr)
    }

    /// Returns the position of a spec.
    #[must_use]
    pub fn position(&self, attr: &str) -> Option<usize> {
        self.specs.iter().position(|spec| spec.attr == attr)
    }

    /// Inserts a spec at `index` (clamped to the end).
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute key is taken or collides with a
    /// built-in event property.
    pub fn insert(&mut self, index: usize, spec: ExtensionSpec) -> Result<()> {
        if spec.attr.len() <= 2 {
            return Err(Error::invariant("extension property name is empty"));
        }
        if self.get(&spec.attr).is_some() || find(EntityKind::Event, &spec.attr).is_some() {
            return Err(Error::invariant(format!(
                "event property already exists: {}",
                spec.attr
            )));
        }
        let index = index.min(self.specs.len());
        self.specs.insert(index, spec);
        Ok(())
    }

    /// Appends a spec.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn push(&mut self, spec: ExtensionSpec) -> Result<()> {
        self.insert(self.specs.len(), spec)
    }

    /// Removes a spec, returning it with its former position.
    pub fn remove(&mut self, attr: &str) -> Option<(usize, ExtensionSpec)> {
        let index = self.position(attr)?;
        Some((index, self.specs.remove(index)))
    }

    /// Iterates specs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtensionSpec> + '_ {
        self.specs.iter()
    }

    /// Returns the number of specs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Returns true if no extension is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl FromIterator<ExtensionSpec> for ExtensionRegistry {
    fn from_iter<I: IntoIterator<Item = ExtensionSpec>>(iter: I) -> Self {
        Self {
            specs: iter.into_iter().collect(),
        }
    }
}
