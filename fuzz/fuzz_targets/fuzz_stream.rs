#![no_main]
//! Streaming target: a concatenation of generated documents must come back
//! out of `parse_many` in order, whatever the window size.

use arbitrary::Arbitrary;
use jsontape::{PaddedString, Parser};
use libfuzzer_sys::fuzz_target;
use serde_json::json;

#[derive(Debug, Arbitrary)]
struct StreamPlan {
    batch_size: u16,
    documents: Vec<(u32, String)>,
}

fuzz_target!(|plan: StreamPlan| {
    if plan.documents.is_empty() || plan.documents.len() > 64 {
        return;
    }
    let mut text = String::new();
    for (number, tag) in &plan.documents {
        // Container roots only: scalar documents at window boundaries are
        // ambiguous by design.
        let doc = json!({"n": number, "tag": tag});
        text.push_str(&serde_json::to_string(&doc).expect("serializable"));
        text.push('\n');
    }
    let json = PaddedString::from(text.as_str());
    let mut parser = Parser::new();
    let Ok(mut stream) = parser.parse_many(&json, usize::from(plan.batch_size)) else {
        return;
    };

    let mut seen = Vec::new();
    loop {
        match stream.next() {
            None => break,
            Some(Ok(doc)) => {
                seen.push(doc.at_pointer("/n").unwrap().get_u64().unwrap() as u32);
            }
            Some(Err(jsontape::Error::Capacity)) => {
                // A document longer than the window: legitimate refusal.
                return;
            }
            Some(Err(err)) => panic!("stream failed: {err}"),
        }
    }
    let expected: Vec<u32> = plan.documents.iter().map(|(n, _)| *n).collect();
    assert_eq!(seen, expected);
});
