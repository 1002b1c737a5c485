//! # ShadowSync Codec
//!
//! CBOR wire primitives for ShadowSync.
//!
//! This crate provides the binary layer the property-sync core builds
//! on: a push-style writer with typed map/array/scalar emitters, and a
//! bounds-checked cursor reader with typed extraction.
//!
//! Unlike a canonical-hashing codec this is a *wire* codec for talking
//! to a remote peer:
//! - Floats are first-class (sensor values are floats)
//! - Non-shortest integer encodings are accepted on read
//! - Map keys are emitted in the order given, never sorted
//!
//! Indefinite-length items are rejected on both paths, and the reader
//! enforces allocation ceilings so a malformed length prefix from an
//! untrusted payload cannot drive memory use.
//!
//! ## Usage
//!
//! ```
//! use shadowsync_codec::{CborReader, CborWriter, Value};
//!
//! let mut writer = CborWriter::new();
//! writer.array(1);
//! writer.map(2);
//! writer.text("n");
//! writer.text("temperature");
//! writer.text("v");
//! writer.float(21.5);
//!
//! let bytes = writer.into_bytes();
//! let mut reader = CborReader::new(&bytes);
//! assert_eq!(reader.array_header().unwrap(), 1);
//! assert_eq!(reader.map_header().unwrap(), 2);
//! assert_eq!(reader.text().unwrap(), "n");
//! assert_eq!(reader.text().unwrap(), "temperature");
//! assert_eq!(reader.text().unwrap(), "v");
//! assert_eq!(reader.value().unwrap(), Value::Float(21.5));
//! ```

mod error;
mod reader;
mod value;
mod writer;

pub use error::{CodecError, CodecResult};
pub use reader::CborReader;
pub use value::{Kind, Value};
pub use writer::CborWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let values = vec![
            Value::Int(0),
            Value::Int(-1),
            Value::Int(1_000_000),
            Value::Bool(true),
            Value::Float(-0.25),
            Value::Text("hello".to_string()),
        ];

        let mut writer = CborWriter::new();
        writer.array(values.len() as u64);
        for v in &values {
            writer.value(v);
        }

        let bytes = writer.into_bytes();
        let mut reader = CborReader::new(&bytes);
        assert_eq!(reader.array_header().unwrap(), values.len() as u64);
        for v in &values {
            assert_eq!(&reader.value().unwrap(), v);
        }
        assert!(reader.is_empty());
    }

    #[test]
    fn empty_input_is_eof() {
        let mut reader = CborReader::new(&[]);
        assert_eq!(reader.value(), Err(CodecError::UnexpectedEof));
    }
}
