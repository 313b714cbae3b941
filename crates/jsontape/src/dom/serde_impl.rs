//! Serde support: serialize parsed documents by walking the tape.
//!
//! Deserialization is out of scope (the tape is already the parsed form);
//! `Serialize` is enough to hand documents to any serde consumer.

use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use super::{Document, Element, ElementType};

impl Serialize for Element<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.element_type() {
            ElementType::Null => serializer.serialize_unit(),
            ElementType::Bool => serializer.serialize_bool(self.get_bool().map_err(S::Error::custom)?),
            ElementType::I64 => serializer.serialize_i64(self.get_i64().map_err(S::Error::custom)?),
            ElementType::U64 => serializer.serialize_u64(self.get_u64().map_err(S::Error::custom)?),
            ElementType::F64 => serializer.serialize_f64(self.get_f64().map_err(S::Error::custom)?),
            ElementType::String => serializer.serialize_str(self.get_str().map_err(S::Error::custom)?),
            ElementType::Array => {
                let array = self.get_array().map_err(S::Error::custom)?;
                let mut seq = serializer.serialize_seq(None)?;
                for element in &array {
                    seq.serialize_element(&element)?;
                }
                seq.end()
            }
            ElementType::Object => {
                let object = self.get_object().map_err(S::Error::custom)?;
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in &object {
                    map.serialize_entry(key, &value)?;
                }
                map.end()
            }
        }
    }
}

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root().serialize(serializer)
    }
}
