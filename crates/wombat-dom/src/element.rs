//! Element data: names, attributes, and the derived id/class state.

use bitflags::bitflags;

use crate::NodeId;

/// [Infra § 8 Namespaces](https://infra.spec.whatwg.org/#namespaces)
pub mod namespace {
    /// "The HTML namespace is `http://www.w3.org/1999/xhtml`."
    pub const HTML: &str = "http://www.w3.org/1999/xhtml";
    /// "The SVG namespace is `http://www.w3.org/2000/svg`."
    pub const SVG: &str = "http://www.w3.org/2000/svg";
    /// "The MathML namespace is `http://www.w3.org/1998/Math/MathML`."
    pub const MATHML: &str = "http://www.w3.org/1998/Math/MathML";
}

/// [§ 4.9.2 Interface Attr](https://dom.spec.whatwg.org/#interface-attr)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// "local name"
    pub name: String,
    /// "value"
    pub value: String,
}

bitflags! {
    /// Dynamic element state consulted by user-action and input pseudo-classes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementState: u8 {
        /// `:hover`
        const HOVER = 1 << 0;
        /// `:focus`
        const FOCUS = 1 << 1;
        /// `:active`
        const ACTIVE = 1 << 2;
        /// `:checked`
        const CHECKED = 1 << 3;
        /// `:disabled`
        const DISABLED = 1 << 4;
    }
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element):
/// "Elements have an associated namespace, namespace prefix, local name, ..."
///
/// The attribute list keeps insertion order. `id` and the class list are
/// derived from their attributes and kept in sync by [`ElementData::set_attribute`].
#[derive(Debug, Clone)]
pub struct ElementData {
    local_name: String,
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    id: Option<String>,
    classes: Vec<String>,
    /// The shadow root attached to this element, if it is a shadow host.
    pub shadow_root: Option<NodeId>,
    /// Dynamic state flags.
    pub state: ElementState,
}

impl ElementData {
    /// Create an element in `namespace` with no attributes.
    #[must_use]
    pub fn new(local_name: &str, namespace: Option<&str>) -> Self {
        let local_name = if namespace == Some(namespace::HTML) {
            local_name.to_ascii_lowercase()
        } else {
            local_name.to_string()
        };
        Self {
            local_name,
            namespace: namespace.map(str::to_string),
            attributes: Vec::new(),
            id: None,
            classes: Vec::new(),
            shadow_root: None,
            state: ElementState::empty(),
        }
    }

    /// Create an element in the HTML namespace.
    #[must_use]
    pub fn html(local_name: &str) -> Self {
        Self::new(local_name, Some(namespace::HTML))
    }

    /// The element's local name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The element's namespace URI.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether the element is in the HTML namespace.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.namespace.as_deref() == Some(namespace::HTML)
    }

    /// Attributes in insertion order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Look up an attribute's value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        let name = self.normalize_attribute_name(name);
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Whether the attribute is present.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// [§ 4.9 set an attribute value](https://dom.spec.whatwg.org/#concept-element-attributes-set-value)
    ///
    /// Returns the previous value, if any.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Option<String> {
        let name = self.normalize_attribute_name(name);
        let old = match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.value, value.to_string())),
            None => {
                self.attributes.push(Attribute {
                    name: name.clone(),
                    value: value.to_string(),
                });
                None
            }
        };
        self.attribute_changed(&name);
        old
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let name = self.normalize_attribute_name(name);
        let index = self.attributes.iter().position(|attr| attr.name == name)?;
        let removed = self.attributes.remove(index);
        self.attribute_changed(&name);
        Some(removed.value)
    }

    /// Returns the element's ID.
    ///
    /// [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#global-attributes)
    /// "The id attribute specifies its element's unique identifier (ID)."
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The element's classes, in attribute order, deduplicated.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Whether the element carries `class_name` (case-sensitive).
    #[must_use]
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes.iter().any(|c| c == class_name)
    }

    /// The unparsed `style` attribute, if any.
    #[must_use]
    pub fn inline_style(&self) -> Option<&str> {
        self.attribute("style")
    }

    fn normalize_attribute_name(&self, name: &str) -> String {
        if self.is_html() {
            name.to_ascii_lowercase()
        } else {
            name.to_string()
        }
    }

    fn attribute_changed(&mut self, name: &str) {
        match name {
            "id" => {
                self.id = self
                    .attribute("id")
                    .filter(|id| !id.is_empty())
                    .map(str::to_string);
            }
            "class" => {
                let mut classes: Vec<String> = Vec::new();
                for class in self.attribute("class").unwrap_or_default().split_ascii_whitespace() {
                    if !classes.iter().any(|c| c == class) {
                        classes.push(class.to_string());
                    }
                }
                self.classes = classes;
            }
            _ => {}
        }
    }
}
