#![no_main]
//! Raw-bytes target: the whole pipeline must reject or accept without
//! panicking, and accepted documents must navigate coherently.

use jsontape::{ElementType, PaddedString, Parser};
use libfuzzer_sys::fuzz_target;

fn walk(element: jsontape::Element<'_>) -> usize {
    match element.element_type() {
        ElementType::Array => {
            let array = element.get_array().unwrap();
            let count = array.iter().map(walk).sum::<usize>();
            assert!(array.len() == array.iter().count() || array.len() == 0xFF_FFFF);
            count + 1
        }
        ElementType::Object => {
            let object = element.get_object().unwrap();
            let count = object.iter().map(|(_, v)| walk(v)).sum::<usize>();
            assert!(object.len() == object.iter().count() || object.len() == 0xFF_FFFF);
            count + 1
        }
        ElementType::String => {
            let _ = element.get_str().unwrap();
            1
        }
        _ => 1,
    }
}

fuzz_target!(|data: &[u8]| {
    let json = PaddedString::from_bytes(data);
    let mut parser = Parser::new();
    if let Ok(doc) = parser.parse(&json) {
        // The tape parser accepted it: navigation must hold together.
        let _ = walk(doc.root());
        let _ = doc.at_pointer("");
        let _ = doc.dump_raw_tape();
        // A document the parser accepts must minify cleanly.
        let minified = jsontape::minify(data).expect("accepted document minifies");
        let mut reparser = Parser::new();
        reparser
            .parse(&PaddedString::from(minified))
            .expect("minified form reparses");
    }
});
