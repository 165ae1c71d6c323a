//! Read-only description of a block for editors and other tooling.
//!
//! A descriptor exposes what a block looks like from the outside (its id,
//! title, properties and message ports) without giving access to the
//! pipeline behind it.

use super::output_port::OutputPort;
use crate::value::TypedValue;

/// One property of a block as shown to a user.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub key: String,
    /// Display name
    pub name: String,
    pub value: TypedValue,
    /// Type of the value as text, e.g. `f64`
    pub type_desc: String,
    /// Set when the current value failed validation
    pub error: Option<String>,
}

impl PropertyDescriptor {
    pub fn new(key: impl Into<String>, name: impl Into<String>, value: TypedValue) -> Self {
        let type_desc = value.type_string();
        Self {
            key: key.into(),
            name: name.into(),
            value,
            type_desc,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Read interface over a block.
pub trait BlockDescriptor {
    fn id(&self) -> &str;

    fn title(&self) -> &str;

    fn properties(&self) -> &[PropertyDescriptor];

    /// Names of the block's outgoing message ports, in order
    fn signal_ports(&self) -> &[String];

    /// Names of the block's incoming message ports, in order
    fn slot_ports(&self) -> &[String];

    fn property(&self, key: &str) -> Option<&PropertyDescriptor> {
        self.properties().iter().find(|p| p.key == key)
    }
}

/// Owned [`BlockDescriptor`] assembled with a builder.
#[derive(Debug, Clone, Default)]
pub struct BlockInfo {
    id: String,
    title: String,
    properties: Vec<PropertyDescriptor>,
    signal_ports: Vec<String>,
    slot_ports: Vec<String>,
}

impl BlockInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_signal_port(mut self, name: impl Into<String>) -> Self {
        self.signal_ports.push(name.into());
        self
    }

    pub fn with_slot_port(mut self, name: impl Into<String>) -> Self {
        self.slot_ports.push(name.into());
        self
    }

    /// Add the signal ports among `ports`, in the order given.
    pub fn with_signal_ports_from<'a>(
        mut self,
        ports: impl IntoIterator<Item = &'a OutputPort>,
    ) -> Self {
        self.signal_ports.extend(
            ports
                .into_iter()
                .filter(|port| port.is_signal())
                .map(|port| port.name().to_string()),
        );
        self
    }
}

impl BlockDescriptor for BlockInfo {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    fn signal_ports(&self) -> &[String] {
        &self.signal_ports
    }

    fn slot_ports(&self) -> &[String] {
        &self.slot_ports
    }
}
