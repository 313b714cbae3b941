//! Tape navigation: typed access, keyed and indexed lookup, JSON pointers
//! and paths, plus differential checks against serde_json.

mod common;

use common::{element_to_json, padded};
use jsontape::{ElementType, Error, PaddedString, Parser};
use quickcheck::{Arbitrary, Gen};
use serde_json::{json, Value as Json};

#[test]
fn typed_accessors() {
    let json = padded(r#"{"s":"hi","i":-3,"u":18446744073709551615,"d":2.5,"b":true,"n":null}"#);
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();
    let root = doc.root();

    assert_eq!(root.element_type(), ElementType::Object);
    assert_eq!(root.at_key("s").unwrap().get_str().unwrap(), "hi");
    assert_eq!(root.at_key("i").unwrap().get_i64().unwrap(), -3);
    assert_eq!(root.at_key("u").unwrap().get_u64().unwrap(), u64::MAX);
    assert_eq!(root.at_key("d").unwrap().get_f64().unwrap(), 2.5);
    assert!(root.at_key("b").unwrap().get_bool().unwrap());
    assert!(root.at_key("n").unwrap().is_null());

    // Cross-type range checks.
    assert_eq!(
        root.at_key("u").unwrap().get_i64().unwrap_err(),
        Error::NumberOutOfRange
    );
    assert_eq!(
        root.at_key("i").unwrap().get_u64().unwrap_err(),
        Error::NumberOutOfRange
    );
    assert_eq!(
        root.at_key("s").unwrap().get_i64().unwrap_err(),
        Error::IncorrectType
    );
    // Integers widen to doubles on request.
    assert_eq!(root.at_key("i").unwrap().get_f64().unwrap(), -3.0);
}

#[test]
fn empty_containers_have_empty_iterators() {
    let json = padded(r#"{"o":{},"a":[]}"#);
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();

    let o = doc.at_pointer("/o").unwrap().get_object().unwrap();
    assert_eq!(o.len(), 0);
    assert!(o.is_empty());
    assert_eq!(o.iter().count(), 0);

    let a = doc.at_pointer("/a").unwrap().get_array().unwrap();
    assert_eq!(a.len(), 0);
    assert!(a.is_empty());
    assert_eq!(a.iter().count(), 0);
    assert_eq!(a.at(0).unwrap_err(), Error::IndexOutOfBounds);
}

#[test]
fn sizes_match_iteration_counts() {
    let json = padded(&serde_json::to_string(&json!({
        "small": [1, 2, 3],
        "pairs": {"a": 1, "b": 2, "c": 3, "d": 4},
        "nested": [[1], [2, 3], {"k": [4, 5, 6]}]
    })).unwrap());
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();

    for (_, value) in &doc.root().get_object().unwrap() {
        match value.element_type() {
            ElementType::Array => {
                let array = value.get_array().unwrap();
                assert_eq!(array.len(), array.iter().count());
            }
            ElementType::Object => {
                let object = value.get_object().unwrap();
                assert_eq!(object.len(), object.iter().count());
            }
            _ => {}
        }
    }
}

#[test]
fn array_indexing_is_positional() {
    let json = padded("[10,[20,21],{\"k\":1},40]");
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();
    let array = doc.root().get_array().unwrap();

    assert_eq!(array.at(0).unwrap().get_i64().unwrap(), 10);
    // Sibling jumps skip over whole subtrees.
    assert_eq!(array.at(3).unwrap().get_i64().unwrap(), 40);
    assert_eq!(array.at(1).unwrap().at(1).unwrap().get_i64().unwrap(), 21);
    assert_eq!(array.at(4).unwrap_err(), Error::IndexOutOfBounds);
}

#[test]
fn json_pointer_resolution() {
    let json = padded(r#"{"foo":{"a":[10,20,30]}}"#);
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();

    assert_eq!(doc.at_pointer("/foo/a/1").unwrap().get_i64().unwrap(), 20);
    assert_eq!(doc.at_pointer("/foo/b").unwrap_err(), Error::NoSuchField);
    assert_eq!(doc.at_pointer("foo").unwrap_err(), Error::InvalidJsonPointer);
    assert_eq!(
        doc.at_pointer("").unwrap().element_type(),
        ElementType::Object
    );

    // Array token rules.
    assert_eq!(
        doc.at_pointer("/foo/a/-").unwrap_err(),
        Error::IndexOutOfBounds
    );
    assert_eq!(
        doc.at_pointer("/foo/a/01").unwrap_err(),
        Error::InvalidJsonPointer
    );
    assert_eq!(
        doc.at_pointer("/foo/a/x").unwrap_err(),
        Error::IncorrectType
    );
    assert_eq!(
        doc.at_pointer("/foo/a/3").unwrap_err(),
        Error::IndexOutOfBounds
    );

    // Resolving in two hops equals one combined pointer.
    let foo = doc.at_pointer("/foo").unwrap();
    assert_eq!(
        foo.at_pointer("/a/1").unwrap().get_i64().unwrap(),
        doc.at_pointer("/foo/a/1").unwrap().get_i64().unwrap()
    );

    // Scalars only accept the empty pointer.
    let leaf = doc.at_pointer("/foo/a/0").unwrap();
    assert_eq!(leaf.at_pointer("").unwrap().get_i64().unwrap(), 10);
    assert_eq!(leaf.at_pointer("/x").unwrap_err(), Error::InvalidJsonPointer);
}

#[test]
fn json_pointer_escapes() {
    let json = padded(r#"{"a/b":1,"m~n":2,"~1":3}"#);
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();

    assert_eq!(doc.at_pointer("/a~1b").unwrap().get_i64().unwrap(), 1);
    assert_eq!(doc.at_pointer("/m~0n").unwrap().get_i64().unwrap(), 2);
    assert_eq!(doc.at_pointer("/~01").unwrap().get_i64().unwrap(), 3);
    assert_eq!(doc.at_pointer("/m~2n").unwrap_err(), Error::InvalidJsonPointer);
}

#[test]
fn json_path_subset() {
    let json = padded(r#"{"foo":{"a":[10,20,30]}}"#);
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();

    assert_eq!(doc.at_path("$.foo.a[1]").unwrap().get_i64().unwrap(), 20);
    assert_eq!(doc.at_path(".foo.a[2]").unwrap().get_i64().unwrap(), 30);
    assert_eq!(doc.at_path("$").unwrap_err(), Error::InvalidJsonPointer);
    assert_eq!(doc.at_path("foo").unwrap_err(), Error::InvalidJsonPointer);
}

#[test]
fn case_insensitive_lookup_folds_ascii_only() {
    let json = padded(r#"{"Content-Type":"json","UPPER":1}"#);
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();
    let root = doc.root();

    assert_eq!(
        root.at_key_case_insensitive("content-type")
            .unwrap()
            .get_str()
            .unwrap(),
        "json"
    );
    assert_eq!(
        root.at_key_case_insensitive("upper").unwrap().get_i64().unwrap(),
        1
    );
    assert_eq!(root.at_key("content-type").unwrap_err(), Error::NoSuchField);
}

#[test]
fn duplicate_keys_first_match_wins_but_both_iterate() {
    let json = padded(r#"{"k":1,"k":2}"#);
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();
    let object = doc.root().get_object().unwrap();

    assert_eq!(object.at_key("k").unwrap().get_i64().unwrap(), 1);
    let seen: Vec<i64> = object.iter().map(|(_, v)| v.get_i64().unwrap()).collect();
    assert_eq!(seen, vec![1, 2]);
}

#[test]
fn minify_then_reparse_is_equivalent() {
    let text = r#"
        { "a" : [ 1 , 2.5 , "x y" ] ,
          "b" : { "nested" : [ true, null ] } }
    "#;
    let minified = jsontape::minify(text.as_bytes()).unwrap();

    let mut parser = Parser::new();
    let original = element_to_json(parser.parse(&padded(text)).unwrap().root());
    let reparsed =
        element_to_json(parser.parse(&PaddedString::from(minified)).unwrap().root());
    assert_eq!(original, reparsed);
}

#[test]
fn raw_tape_dump_is_stable_for_a_small_document() {
    let json = padded(r#"{"a":[1,true],"b":"x"}"#);
    let mut parser = Parser::new();
    let doc = parser.parse(&json).unwrap();
    insta::assert_snapshot!(doc.dump_raw_tape(), @r#"
0 : r // pointing to 12
1 : { // pointing to 10 (matching close), 2 children
2 : string "a"
3 : [ // pointing to 7 (matching close), 2 children
4 : integer 1
6 : true
7 : ] // pointing to 3
8 : string "b"
9 : string "x"
10 : } // pointing to 1
11 : r // pointing to 0
"#);
}

#[test]
fn truncated_inputs_never_panic() {
    let full = r#"{"key":"valé","list":[1,2.5,true,null],"o":{"x":"𝄞"}}"#.as_bytes();
    let mut parser = Parser::new();
    for cut in 0..full.len() {
        // Cuts land mid-token and mid-code-point; every prefix of an object
        // document is invalid, so any Err is fine as long as nothing panics.
        let json = PaddedString::from_bytes(&full[..cut]);
        assert!(parser.parse(&json).is_err(), "prefix of {cut} bytes");
    }
    assert!(parser.parse(&PaddedString::from_bytes(full)).is_ok());
}

#[derive(Clone, Debug)]
struct ArbitraryJson(Json);

impl Arbitrary for ArbitraryJson {
    fn arbitrary(g: &mut Gen) -> Self {
        ArbitraryJson(arbitrary_value(g, 3))
    }
}

fn arbitrary_value(g: &mut Gen, depth: usize) -> Json {
    let scalar_only = depth == 0;
    match u8::arbitrary(g) % if scalar_only { 5 } else { 7 } {
        0 => Json::Null,
        1 => Json::Bool(bool::arbitrary(g)),
        2 => Json::from(i64::arbitrary(g)),
        3 => {
            let f = f64::arbitrary(g);
            if f.is_finite() {
                serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number)
            } else {
                Json::Null
            }
        }
        4 => Json::String(String::arbitrary(g)),
        5 => Json::Array(
            (0..usize::arbitrary(g) % 4)
                .map(|_| arbitrary_value(g, depth - 1))
                .collect(),
        ),
        _ => Json::Object(
            (0..usize::arbitrary(g) % 4)
                .map(|_| (String::arbitrary(g), arbitrary_value(g, depth - 1)))
                .collect(),
        ),
    }
}

#[quickcheck_macros::quickcheck]
fn differential_against_serde_json(value: ArbitraryJson) -> bool {
    let text = serde_json::to_string(&value.0).unwrap();
    let json = padded(&text);
    let mut parser = Parser::new();
    let tape_view = element_to_json(parser.parse(&json).unwrap().root());
    if tape_view != value.0 {
        return false;
    }
    let mut od = parser.iterate(&json).unwrap();
    common::ondemand_to_json(&mut od).unwrap() == value.0
}
