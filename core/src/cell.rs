//! Cells: the entities of a diagram graph.
//!
//! A [`Cell`] is either an **element** (a node that may be nested inside
//! another element) or a **link** (an edge between two endpoints). All of a
//! cell's state, including its identifier and its structural fields, lives in
//! a single JSON attribute map so that change tracking can treat every field
//! uniformly:
//!
//! - [`ID`]: the identifier, a non-empty string unique within a graph
//! - [`PARENT`]: identifier of the containing element (elements only)
//! - [`EMBEDS`]: ordered identifiers of the embedded children; the order is
//!   the sibling (z) order
//! - [`SOURCE`] / [`TARGET`]: link endpoints, see [`Endpoint`]
//! - [`ATTRS`]: rendering-only presentation attributes, never recorded
//!
//! Setting an attribute to JSON `null` unsets it, and reading an absent
//! attribute yields `null`. This keeps "previous value" bookkeeping
//! symmetric: restoring `null` removes an attribute that did not exist.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier attribute.
pub const ID: &str = "id";
/// Parent element identifier.
pub const PARENT: &str = "parent";
/// Ordered child identifiers.
pub const EMBEDS: &str = "embeds";
/// Link source endpoint.
pub const SOURCE: &str = "source";
/// Link target endpoint.
pub const TARGET: &str = "target";
/// Rendering-only attribute, excluded from history.
pub const ATTRS: &str = "attrs";

/// Attribute map of a cell.
pub type Attributes = Map<String, Value>;

static NULL: Value = Value::Null;

/// Opaque, stable handle of a cell inside a graph.
///
/// Unlike the [`ID`] attribute, a key never changes: it survives renames and
/// removal followed by re-insertion, so recorded history keeps addressing the
/// same entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey(u64);

impl CellKey {
    /// Wraps a raw key value.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw key value.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether a cell is an element or a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    Element,
    Link,
}

/// One end of a link.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint {
    /// A free point on the canvas; the link is dangling at this end.
    Point { x: f64, y: f64 },
    /// Bound to the element with the given identifier.
    Cell { id: String },
}

impl Endpoint {
    /// Convenience constructor for a bound endpoint.
    pub fn cell(id: impl Into<String>) -> Self {
        Self::Cell { id: id.into() }
    }

    /// Convenience constructor for a free endpoint.
    pub fn point(x: f64, y: f64) -> Self {
        Self::Point { x, y }
    }

    /// Decodes an endpoint from its attribute value.
    ///
    /// `{"id": "..."}` is a bound endpoint, anything else with numeric `x`/`y`
    /// is a free point. Returns `None` for values that are neither.
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(id) = bound_id(value) {
            return Some(Self::cell(id));
        }
        let x = value.get("x")?.as_f64()?;
        let y = value.get("y")?.as_f64()?;
        Some(Self::Point { x, y })
    }

    /// Encodes the endpoint as an attribute value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Point { x, y } => serde_json::json!({ "x": x, "y": y }),
            Self::Cell { id } => serde_json::json!({ "id": id }),
        }
    }

    /// Identifier of the bound element, if any.
    pub fn cell_id(&self) -> Option<&str> {
        match self {
            Self::Cell { id } => Some(id),
            Self::Point { .. } => None,
        }
    }
}

/// Returns the element identifier an endpoint value is bound to.
///
/// An endpoint counts as bound only when it carries a non-empty `id`.
pub fn bound_id(value: &Value) -> Option<&str> {
    value
        .get(ID)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// A graph entity: an element or a link with a set of named attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(skip)]
    key: Option<CellKey>,
    #[serde(rename = "type")]
    kind: CellKind,
    #[serde(flatten)]
    attributes: Attributes,
}

impl Cell {
    /// Creates a detached element with the given identifier.
    pub fn element(id: impl Into<String>) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(ID.into(), Value::String(id.into()));
        Self {
            key: None,
            kind: CellKind::Element,
            attributes,
        }
    }

    /// Creates a detached link between two endpoints.
    pub fn link(id: impl Into<String>, source: Endpoint, target: Endpoint) -> Self {
        let mut attributes = Attributes::new();
        attributes.insert(ID.into(), Value::String(id.into()));
        attributes.insert(SOURCE.into(), source.to_value());
        attributes.insert(TARGET.into(), target.to_value());
        Self {
            key: None,
            kind: CellKind::Link,
            attributes,
        }
    }

    /// Builder-style attribute assignment.
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Graph key, once the cell has been inserted into a graph.
    pub fn key(&self) -> Option<CellKey> {
        self.key
    }

    pub(crate) fn assign_key(&mut self, key: CellKey) {
        self.key = Some(key);
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_link(&self) -> bool {
        self.kind == CellKind::Link
    }

    /// The identifier, or `""` for a cell without one.
    pub fn id(&self) -> &str {
        self.attributes.get(ID).and_then(Value::as_str).unwrap_or("")
    }

    /// Reads an attribute; absent attributes read as `null`.
    pub fn get(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Assigns an attribute and returns its previous value.
    ///
    /// Assigning `null` removes the attribute.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Value {
        let name = name.into();
        let previous = if value.is_null() {
            self.attributes.remove(&name)
        } else {
            self.attributes.insert(name, value)
        };
        previous.unwrap_or(Value::Null)
    }

    /// Identifier of the containing element.
    pub fn parent(&self) -> Option<&str> {
        self.get(PARENT).as_str().filter(|id| !id.is_empty())
    }

    /// Identifiers of the embedded children, in sibling order.
    pub fn embeds(&self) -> Vec<&str> {
        self.get(EMBEDS)
            .as_array()
            .map(|ids| ids.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn source(&self) -> Option<Endpoint> {
        Endpoint::from_value(self.get(SOURCE))
    }

    pub fn target(&self) -> Option<Endpoint> {
        Endpoint::from_value(self.get(TARGET))
    }

    /// A link is dangling while either endpoint is not bound to an element.
    pub fn is_dangling(&self) -> bool {
        self.is_link()
            && (bound_id(self.get(SOURCE)).is_none() || bound_id(self.get(TARGET)).is_none())
    }
}
