//! A two-stage JSON parser: SIMD structural indexing, then either a packed
//! tape with typed navigation or lazy on-demand cursors.
//!
//! Stage 1 scans the raw bytes 64 at a time, validating UTF-8 and recording
//! where every structural character and scalar starts. From there, two
//! front-ends share the work:
//!
//! - [`Parser::parse`] builds the whole document into a tape and returns a
//!   [`Document`] for random-access navigation (keyed lookup, JSON pointers,
//!   O(1) sibling skips).
//! - [`Parser::iterate`] decodes nothing up front; the returned
//!   [`OndemandDocument`] walks the structural index forward and decodes
//!   exactly what the caller touches.
//!
//! [`Parser::parse_many`] streams a concatenation of documents through
//! fixed-size windows, optionally pipelining stage 1 on a worker thread.
//!
//! Inputs must carry [`PADDING`] readable bytes past their logical end;
//! [`PaddedString`] allocates that for you.
//!
//! ```
//! use jsontape::{PaddedString, Parser};
//!
//! let json = PaddedString::from(r#"{"kind":"point","x":1.5,"y":[1,2,3]}"#);
//! let mut parser = Parser::new();
//! let doc = parser.parse(&json)?;
//! assert_eq!(doc.at_pointer("/kind")?.get_str()?, "point");
//! assert_eq!(doc.at_pointer("/y/2")?.get_i64()?, 3);
//! # Ok::<(), jsontape::Error>(())
//! ```

mod dom;
mod error;
mod minify;
mod number;
mod ondemand;
mod padded;
mod parser;
mod stage1;
mod stage2;
mod stream;
mod strings;
mod tables;
mod tape;

pub use dom::{Array, ArrayIter, Document, Element, ElementType, Object, ObjectIter};
pub use error::{Error, Result, NUM_ERROR_CODES};
pub use minify::minify;
pub use number::Number;
pub use ondemand::{ArrayRef, Field, ObjectRef, OndemandDocument, Value, ValueKind};
pub use padded::{PaddedString, PaddedStringView, PADDING};
pub use parser::{Parser, DEFAULT_MAX_CAPACITY, DEFAULT_MAX_DEPTH};
pub use stream::{DocumentStream, DEFAULT_BATCH_SIZE, MINIMAL_BATCH_SIZE};
