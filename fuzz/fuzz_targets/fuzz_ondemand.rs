#![no_main]
//! Differential target: serialize an arbitrary tree, then require the tape
//! front-end, the on-demand front-end and serde_json to reconstruct the
//! same value.

use arbitrary::Arbitrary;
use jsontape::{ElementType, PaddedString, Parser};
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let node_type = u.choose_index(21)?;
        let value = match node_type {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            3 => Value::from(u.arbitrary::<i64>()?),
            4 => Value::from(u.arbitrary::<u64>()?),
            5..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            16..=20 => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
            _ => Err(arbitrary::Error::IncorrectFormat)?,
        };
        Ok(ArbitraryValue(value))
    }
}

fn tape_to_value(element: jsontape::Element<'_>) -> Value {
    match element.element_type() {
        ElementType::Null => Value::Null,
        ElementType::Bool => Value::Bool(element.get_bool().unwrap()),
        ElementType::I64 => Value::from(element.get_i64().unwrap()),
        ElementType::U64 => Value::from(element.get_u64().unwrap()),
        ElementType::F64 => serde_json::Number::from_f64(element.get_f64().unwrap())
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ElementType::String => Value::String(element.get_str().unwrap().to_owned()),
        ElementType::Array => Value::Array(
            element
                .get_array()
                .unwrap()
                .iter()
                .map(tape_to_value)
                .collect(),
        ),
        ElementType::Object => Value::Object(
            element
                .get_object()
                .unwrap()
                .iter()
                .map(|(k, v)| (k.to_owned(), tape_to_value(v)))
                .collect(),
        ),
    }
}

fn ondemand_to_value(value: jsontape::Value<'_, '_>) -> jsontape::Result<Value> {
    use jsontape::{Number, ValueKind};
    Ok(match value.kind()? {
        ValueKind::Null => {
            let mut value = value;
            assert!(value.is_null()?);
            Value::Null
        }
        ValueKind::Bool => Value::Bool(value.get_bool()?),
        ValueKind::Number => match value.get_number()? {
            Number::I64(v) => Value::from(v),
            Number::U64(v) => Value::from(v),
            Number::F64(v) => serde_json::Number::from_f64(v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        },
        ValueKind::String => Value::String(value.get_str()?.to_owned()),
        ValueKind::Array => {
            let mut array = value.get_array()?;
            let mut items = Vec::new();
            while let Some(item) = array.next()? {
                items.push(ondemand_to_value(item)?);
            }
            Value::Array(items)
        }
        ValueKind::Object => {
            let mut object = value.get_object()?;
            let mut map = Map::new();
            while let Some(field) = object.next_field()? {
                let key = field.unescaped_key()?;
                map.insert(key, ondemand_to_value(field.value())?);
            }
            Value::Object(map)
        }
    })
}

fuzz_target!(|value: ArbitraryValue| {
    let text = serde_json::to_string(&value.0).expect("serializable");
    let json = PaddedString::from(text.as_str());
    let mut parser = Parser::new();

    let doc = parser.parse(&json).expect("serde output parses");
    assert_eq!(tape_to_value(doc.root()), value.0, "tape reconstruction");

    let mut doc = parser.iterate(&json).expect("stage 1 accepts");
    let reconstructed = match doc.get_value() {
        Ok(root) => ondemand_to_value(root).expect("ondemand walk"),
        Err(jsontape::Error::ScalarDocumentAsValue) => {
            // Scalar root: reparse through the tape for the comparison.
            tape_to_value(parser.parse(&json).expect("reparse").root())
        }
        Err(err) => panic!("{err}"),
    };
    assert_eq!(reconstructed, value.0, "ondemand reconstruction");
});
