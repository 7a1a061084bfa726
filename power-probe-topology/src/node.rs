use serde::{Deserialize, Serialize};

/// One node of the hardware tree.
///
/// Children are declared in operational order; consumers rely on declaration
/// order for deterministic iteration and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescription {
    /// Human-readable label. Not guaranteed unique.
    pub name: String,
    /// Class tag identifying the node's kind, e.g. `pib`, `chiplet` or
    /// `thread`. The vocabulary is open-ended and backend-defined.
    pub class: String,
    /// Unit index within its class. `-1` means the node has no index of its
    /// own and inherits the nearest ancestor's.
    #[serde(default = "no_index")]
    pub index: i32,
    /// Named properties attached to this node.
    #[serde(default)]
    pub properties: Vec<PropertyDescription>,
    /// Child nodes, in declaration order.
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

fn no_index() -> i32 {
    -1
}

/// A single named property of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDescription {
    /// Property name, unique within the node.
    pub name: String,
    /// The property value.
    pub value: PropertyValue,
}

/// A typed property value as authored in a topology file.
///
/// At load time every variant is lowered to its raw byte representation; the
/// typing here only exists so topology files stay readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyValue {
    /// A text value, stored as its UTF-8 bytes.
    String(String),
    /// A 64-bit number, stored as two big-endian 32-bit cells.
    U64(u64),
    /// Raw bytes, stored as-is.
    Bytes(Vec<u8>),
}

impl PropertyValue {
    /// The raw byte representation a loaded node stores for this value.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PropertyValue::String(s) => s.as_bytes().to_vec(),
            PropertyValue::U64(v) => v.to_be_bytes().to_vec(),
            PropertyValue::Bytes(b) => b.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u64_values_lower_to_big_endian_cells() {
        let bytes = PropertyValue::U64(0x0001_0002_000a_000b).to_bytes();
        assert_eq!(bytes, vec![0x00, 0x01, 0x00, 0x02, 0x00, 0x0a, 0x00, 0x0b]);
    }

    #[test]
    fn string_values_lower_without_terminator() {
        assert_eq!(
            PropertyValue::String("disabled".into()).to_bytes(),
            b"disabled".to_vec()
        );
    }
}
