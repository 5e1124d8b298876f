/// Host element an editor widget is attached to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountedElement {
    /// Plain multi-line text input holding its own value
    TextArea(String),
    /// Empty container a widget renders into
    Container,
    /// Text area hidden behind a widget that wraps it
    WrappedTextArea,
}

/// The single place in the panel where the editor lives.
///
/// Backends replace the element in place; the mount point itself never moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountPoint {
    id: String,
    element: MountedElement,
}

impl MountPoint {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element: MountedElement::TextArea(content.into()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn element(&self) -> &MountedElement {
        &self.element
    }

    pub fn replace(&mut self, element: MountedElement) -> MountedElement {
        std::mem::replace(&mut self.element, element)
    }

    /// Value of the plain text area, if that is what is mounted
    pub fn text_area_value(&self) -> Option<&str> {
        match &self.element {
            MountedElement::TextArea(value) => Some(value),
            _ => None,
        }
    }

    pub fn set_text_area_value(&mut self, value: &str) -> bool {
        match &mut self.element {
            MountedElement::TextArea(current) => {
                *current = value.to_string();
                true
            }
            _ => false,
        }
    }
}
