//! The state shared by every graph element and its update protocol.
//!
//! Nodes, edges, subgraphs and the graph itself all carry a [`GraphElement`]:
//! attributes, z-order, selection, and the render operations of the last
//! layout pass. When a fresh layout arrives, [`GraphElement::update_with_element`]
//! merges it into the live element and reports whether anything changed, so
//! the graph can queue exactly one `Modified` event per changed element.

use std::{collections::BTreeSet, fmt};

use log::trace;

use crate::{
    attributes::{AttributeStore, defaults},
    render_op::RenderOp,
};

/// Attribute names whose values are xdot drawing instructions.
///
/// These are produced by layout engines and never written back to DOT.
pub const DRAW_ATTRIBUTES: [&str; 6] = [
    "_draw_", "_ldraw_", "_hdraw_", "_tdraw_", "_hldraw_", "_tldraw_",
];

/// Returns true if `key` names an xdot drawing attribute.
pub fn is_draw_attribute(key: &str) -> bool {
    DRAW_ATTRIBUTES.contains(&key)
}

/// The kind of a graph element, used in errors and change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Graph,
    Node,
    Edge,
    Subgraph,
    /// Any of node, edge or subgraph; reported by lookups that dispatch on id.
    Element,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Graph => "graph",
            Self::Node => "node",
            Self::Edge => "edge",
            Self::Subgraph => "subgraph",
            Self::Element => "element",
        };
        write!(f, "{s}")
    }
}

/// Attributes, z-order, selection and render operations of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphElement {
    attributes: AttributeStore,
    original_keys: Option<BTreeSet<String>>,
    selected: bool,
    z: f64,
    render_ops: Vec<RenderOp>,
}

impl Default for GraphElement {
    fn default() -> Self {
        Self {
            attributes: AttributeStore::new(),
            original_keys: None,
            selected: false,
            z: defaults::Z,
            render_ops: Vec::new(),
        }
    }
}

impl GraphElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an element carrying `attributes`.
    ///
    /// A parseable `z` attribute also sets the z-order.
    pub fn with_attributes(attributes: AttributeStore) -> Self {
        let z = attributes.value("z").and_then(parse_z).unwrap_or(defaults::Z);
        Self {
            attributes,
            z,
            ..Self::default()
        }
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Sets one attribute. Returns true iff the value changed.
    ///
    /// Setting `z` to a finite number also updates the z-order.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> bool {
        let changed = self.attributes.set(key, value);
        if changed && key == "z" {
            if let Some(z) = parse_z(value) {
                self.z = z;
            }
        }
        changed
    }

    /// Removes one attribute. Returns true iff it was present.
    pub fn remove_attribute(&mut self, key: &str) -> bool {
        self.attributes.remove(key)
    }

    /// Records the current attribute names as the ones the source document
    /// declared, so export writes only those back.
    pub fn store_original_attributes(&mut self) {
        self.original_keys = Some(self.attributes.keys().map(str::to_string).collect());
    }

    /// Attribute names recorded by [`store_original_attributes`](Self::store_original_attributes).
    ///
    /// `None` means no set was stored and every attribute is exported. A
    /// stored empty set exports nothing.
    pub fn original_attribute_keys(&self) -> Option<&BTreeSet<String>> {
        self.original_keys.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Returns true iff the selection state changed.
    pub fn set_selected(&mut self, selected: bool) -> bool {
        let changed = self.selected != selected;
        self.selected = selected;
        changed
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    /// Non-finite values are ignored.
    pub fn set_z(&mut self, z: f64) {
        if z.is_finite() {
            self.z = z;
        }
    }

    pub fn render_ops(&self) -> &[RenderOp] {
        &self.render_ops
    }

    pub fn set_render_ops(&mut self, ops: Vec<RenderOp>) {
        self.render_ops = ops;
    }

    /// Merges `other` into this element.
    ///
    /// Every attribute of `other` that is absent here or differs is copied
    /// over; a copied `z` attribute also updates the z-order when it parses.
    /// A differing z-order alone counts as a change. When anything changed,
    /// the render operations are replaced wholesale with `other`'s.
    ///
    /// Attributes present here but absent from `other` are kept, and the
    /// selection state is never touched.
    ///
    /// Returns true iff this element was modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotlens_core::element::GraphElement;
    ///
    /// let mut live = GraphElement::new();
    /// live.set_attribute("label", "A");
    ///
    /// let mut fresh = GraphElement::new();
    /// fresh.set_attribute("label", "A");
    /// assert!(!live.update_with_element(&fresh));
    ///
    /// fresh.set_attribute("color", "red");
    /// assert!(live.update_with_element(&fresh));
    /// assert_eq!(live.attributes().get("color"), "red");
    /// ```
    pub fn update_with_element(&mut self, other: &GraphElement) -> bool {
        let mut modified = false;
        if other.z != self.z {
            self.z = other.z;
            modified = true;
        }

        for (key, value) in other.attributes.iter() {
            if self.attributes.set(key, value) {
                if key == "z" {
                    if let Some(z) = parse_z(value) {
                        self.z = z;
                    }
                }
                modified = true;
            }
        }

        if modified {
            trace!(
                id = self.id(),
                ops = other.render_ops.len();
                "Element modified, replacing render operations"
            );
            self.render_ops = other.render_ops.clone();
        }
        modified
    }

    /// The `id` attribute.
    pub fn id(&self) -> &str {
        self.attributes.get("id")
    }

    pub fn label(&self) -> &str {
        self.attributes.get("label")
    }

    pub fn style(&self) -> &str {
        self.attributes.get("style")
    }

    pub fn shape(&self) -> &str {
        self.attributes.value("shape").unwrap_or(defaults::SHAPE)
    }

    /// The line color.
    pub fn color(&self) -> &str {
        self.attributes.value("color").unwrap_or(defaults::LINE_COLOR)
    }

    /// Font size in points; malformed values fall back to the default.
    pub fn font_size(&self) -> u32 {
        self.attributes
            .value("fontsize")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|size| size.is_finite() && *size > 0.0)
            .map(|size| size.round() as u32)
            .unwrap_or(defaults::FONT_SIZE)
    }

    pub fn font_name(&self) -> &str {
        self.attributes
            .value("fontname")
            .unwrap_or(defaults::FONT_NAME)
    }

    pub fn font_color(&self) -> &str {
        self.attributes
            .value("fontcolor")
            .unwrap_or(defaults::FONT_COLOR)
    }

    pub fn url(&self) -> &str {
        self.attributes.get("URL")
    }

    pub fn shape_file(&self) -> &str {
        self.attributes.get("shapefile")
    }

    /// The fill color: `fillcolor`, else `color` when the style is `filled`,
    /// else the default node back color.
    pub fn back_color(&self) -> &str {
        if let Some(fill) = self.attributes.value("fillcolor") {
            return fill;
        }
        match self.attributes.value("color") {
            Some(color) if self.style() == "filled" => color,
            _ => defaults::NODE_BACK_COLOR,
        }
    }
}

/// A `z` attribute value; only finite numbers count.
fn parse_z(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|z| z.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_op::RenderOpKind;

    fn element(pairs: &[(&str, &str)]) -> GraphElement {
        GraphElement::with_attributes(pairs.iter().copied().collect())
    }

    #[test]
    fn test_non_finite_z_is_ignored() {
        let mut live = element(&[("z", "nan")]);
        assert_eq!(live.z(), defaults::Z);
        let fresh = element(&[("z", "nan")]);
        assert!(!live.update_with_element(&fresh));

        assert!(live.set_attribute("z", "inf"));
        assert_eq!(live.z(), defaults::Z);
        live.set_z(f64::NAN);
        assert_eq!(live.z(), defaults::Z);
        assert!(live.set_attribute("z", " 3 "));
        assert_eq!(live.z(), 3.0);
    }

    #[test]
    fn test_update_copies_new_and_changed_keys() {
        let mut live = element(&[("label", "A"), ("color", "red")]);
        let mut fresh = element(&[("label", "B"), ("shape", "box")]);
        fresh.set_render_ops(vec![RenderOp::new(
            RenderOpKind::FilledEllipse,
            vec![1, 2, 3, 4],
        )]);

        assert!(live.update_with_element(&fresh));
        assert_eq!(live.attributes().get("label"), "B");
        assert_eq!(live.attributes().get("shape"), "box");
        assert_eq!(live.attributes().get("color"), "red");
        assert_eq!(live.render_ops().len(), 1);
    }

    #[test]
    fn test_update_noop_keeps_render_ops() {
        let mut live = element(&[("label", "A")]);
        live.set_render_ops(vec![RenderOp::new(RenderOpKind::Polyline, vec![0])]);
        let fresh = element(&[("label", "A")]);

        assert!(!live.update_with_element(&fresh));
        assert_eq!(live.render_ops().len(), 1);
    }

    #[test]
    fn test_update_z_attribute() {
        let mut live = GraphElement::new();
        let fresh = element(&[("z", "3.5")]);
        assert!(live.update_with_element(&fresh));
        assert_eq!(live.z(), 3.5);
    }

    #[test]
    fn test_update_unparseable_z_attribute_keeps_z() {
        let mut live = GraphElement::new();
        let mut fresh = GraphElement::new();
        fresh.attributes.set("z", "high");

        assert!(live.update_with_element(&fresh));
        assert_eq!(live.z(), defaults::Z);
        assert_eq!(live.attributes().get("z"), "high");
    }

    #[test]
    fn test_update_z_difference_alone_is_a_change() {
        let mut live = GraphElement::new();
        let mut fresh = GraphElement::new();
        fresh.set_z(2.0);
        assert!(live.update_with_element(&fresh));
        assert_eq!(live.z(), 2.0);
    }

    #[test]
    fn test_update_preserves_selection() {
        let mut live = GraphElement::new();
        live.set_selected(true);
        let fresh = element(&[("label", "x")]);
        live.update_with_element(&fresh);
        assert!(live.is_selected());
    }

    #[test]
    fn test_back_color() {
        assert_eq!(element(&[]).back_color(), defaults::NODE_BACK_COLOR);
        assert_eq!(element(&[("color", "red")]).back_color(), "white");
        assert_eq!(
            element(&[("color", "red"), ("style", "filled")]).back_color(),
            "red"
        );
        assert_eq!(
            element(&[("color", "red"), ("fillcolor", "blue")]).back_color(),
            "blue"
        );
    }

    #[test]
    fn test_font_size_degrades_to_default() {
        assert_eq!(element(&[]).font_size(), 14);
        assert_eq!(element(&[("fontsize", "big")]).font_size(), 14);
        assert_eq!(element(&[("fontsize", "-3")]).font_size(), 14);
        assert_eq!(element(&[("fontsize", "10.4")]).font_size(), 10);
    }

    #[test]
    fn test_store_original_attributes() {
        let mut e = element(&[("label", "A"), ("shape", "box")]);
        e.store_original_attributes();
        e.set_attribute("pos", "1,2");
        let keys: Vec<_> = e.original_attribute_keys().unwrap().iter().cloned().collect();
        assert_eq!(keys, vec!["label".to_string(), "shape".to_string()]);
    }

    #[test]
    fn test_empty_original_set_is_kept() {
        let mut e = element(&[]);
        assert!(e.original_attribute_keys().is_none());
        e.store_original_attributes();
        e.set_attribute("bb", "0,0,10,10");
        assert!(e.original_attribute_keys().unwrap().is_empty());
    }

    #[test]
    fn test_draw_attributes() {
        assert!(is_draw_attribute("_ldraw_"));
        assert!(!is_draw_attribute("label"));
    }
}
