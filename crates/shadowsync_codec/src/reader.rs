//! CBOR cursor reader.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Maximum element count accepted for arrays and maps.
///
/// The wire carries at most one entry per registered property, so a
/// declared count beyond this is malformed input, not a real payload.
const MAX_CONTAINER_ELEMENTS: u64 = 4096;

/// Maximum text length in bytes.
const MAX_TEXT_BYTES: u64 = 64 * 1024;

/// A bounds-checked cursor over CBOR bytes.
///
/// Every read validates against the end of the input; malformed or
/// truncated payloads produce a [`CodecError`], never a panic or an
/// out-of-bounds access. Length prefixes are checked against wire
/// ceilings before any allocation.
#[derive(Debug)]
pub struct CborReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CborReader<'a> {
    /// Create a new reader over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// True if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Read an array header and return the element count.
    pub fn array_header(&mut self) -> CodecResult<u64> {
        self.container_header(4, "array")
    }

    /// Read a map header and return the pair count.
    pub fn map_header(&mut self) -> CodecResult<u64> {
        self.container_header(5, "map")
    }

    /// Read a signed integer.
    pub fn int(&mut self) -> CodecResult<i64> {
        match self.value()? {
            Value::Int(n) => Ok(n),
            other => Err(CodecError::unexpected_type("int", major_of(&other))),
        }
    }

    /// Read a boolean.
    pub fn bool(&mut self) -> CodecResult<bool> {
        match self.value()? {
            Value::Bool(b) => Ok(b),
            other => Err(CodecError::unexpected_type("bool", major_of(&other))),
        }
    }

    /// Read a float (accepts both 32-bit and 64-bit encodings).
    pub fn float(&mut self) -> CodecResult<f64> {
        match self.value()? {
            Value::Float(x) => Ok(x),
            other => Err(CodecError::unexpected_type("float", major_of(&other))),
        }
    }

    /// Read a UTF-8 text string.
    pub fn text(&mut self) -> CodecResult<String> {
        match self.value()? {
            Value::Text(s) => Ok(s),
            other => Err(CodecError::unexpected_type("text", major_of(&other))),
        }
    }

    /// Read the next scalar value.
    ///
    /// Containers are not values: an array or map in value position is
    /// an error, as are byte strings, nulls, and tagged items, none of
    /// which a synchronized property can carry.
    pub fn value(&mut self) -> CodecResult<Value> {
        let initial = self.read_byte()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        match major {
            0 => {
                let n = self.read_argument(info)?;
                i64::try_from(n)
                    .map(Value::Int)
                    .map_err(|_| CodecError::invalid_structure("integer exceeds i64 range"))
            }
            1 => {
                let n = self.read_argument(info)?;
                // Negative integer: value is -(n+1)
                i64::try_from(n)
                    .map(|n| Value::Int(-n - 1))
                    .map_err(|_| CodecError::invalid_structure("integer exceeds i64 range"))
            }
            3 => {
                let len = self.read_argument(info)?;
                if len > MAX_TEXT_BYTES {
                    return Err(CodecError::LengthLimitExceeded {
                        declared: len,
                        limit: MAX_TEXT_BYTES,
                    });
                }
                let bytes = self.read_bytes(len as usize)?;
                let s = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(Value::Text(s.to_string()))
            }
            7 => self.read_simple(info),
            _ => Err(CodecError::unexpected_type("scalar", major)),
        }
    }

    fn container_header(&mut self, expected_major: u8, name: &'static str) -> CodecResult<u64> {
        let initial = self.read_byte()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        if major != expected_major {
            return Err(CodecError::unexpected_type(name, major));
        }
        let len = self.read_argument(info)?;
        if len > MAX_CONTAINER_ELEMENTS {
            return Err(CodecError::LengthLimitExceeded {
                declared: len,
                limit: MAX_CONTAINER_ELEMENTS,
            });
        }
        Ok(len)
    }

    fn read_simple(&mut self, info: u8) -> CodecResult<Value> {
        match info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            26 => {
                let bytes = self.read_bytes(4)?;
                let x = f32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                Ok(Value::Float(f64::from(x)))
            }
            27 => {
                let bytes = self.read_bytes(8)?;
                let x = f64::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ]);
                Ok(Value::Float(x))
            }
            31 => Err(CodecError::IndefiniteLength),
            _ => Err(CodecError::invalid_structure(format!(
                "unsupported simple value {info}"
            ))),
        }
    }

    /// Read the argument encoded by the additional-info bits.
    ///
    /// Non-shortest encodings are accepted: the remote peer's encoder
    /// is not under our control.
    fn read_argument(&mut self, info: u8) -> CodecResult<u64> {
        match info {
            0..=23 => Ok(u64::from(info)),
            24 => self.read_byte().map(u64::from),
            25 => {
                let bytes = self.read_bytes(2)?;
                Ok(u64::from(u16::from_be_bytes([bytes[0], bytes[1]])))
            }
            26 => {
                let bytes = self.read_bytes(4)?;
                Ok(u64::from(u32::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3],
                ])))
            }
            27 => {
                let bytes = self.read_bytes(8)?;
                Ok(u64::from_be_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ]))
            }
            28..=30 => Err(CodecError::invalid_structure("reserved additional info")),
            31 => Err(CodecError::IndefiniteLength),
            _ => unreachable!(),
        }
    }

    #[inline]
    fn read_byte(&mut self) -> CodecResult<u8> {
        if self.pos >= self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .ok_or(CodecError::UnexpectedEof)?;
        if end > self.data.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}

fn major_of(value: &Value) -> u8 {
    match value {
        Value::Int(n) if *n >= 0 => 0,
        Value::Int(_) => 1,
        Value::Text(_) => 3,
        Value::Bool(_) | Value::Float(_) => 7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::CborWriter;
    use proptest::prelude::*;

    #[test]
    fn ints_roundtrip() {
        for n in [0i64, 1, 23, 24, 255, 256, 65536, i64::MAX, -1, -24, -25, i64::MIN] {
            let mut w = CborWriter::new();
            w.int(n);
            let bytes = w.into_bytes();
            assert_eq!(CborReader::new(&bytes).int().unwrap(), n);
        }
    }

    #[test]
    fn non_shortest_int_accepted() {
        // 5 encoded with a two-byte header
        let bytes = [0x18, 0x05];
        assert_eq!(CborReader::new(&bytes).int().unwrap(), 5);
    }

    #[test]
    fn f32_widens_to_f64() {
        let bytes = {
            let mut b = vec![0xfa];
            b.extend_from_slice(&2.5f32.to_be_bytes());
            b
        };
        assert_eq!(CborReader::new(&bytes).float().unwrap(), 2.5);
    }

    #[test]
    fn truncated_text_is_eof() {
        // Declares 5 bytes, provides 2
        let bytes = [0x65, b'a', b'b'];
        assert_eq!(
            CborReader::new(&bytes).text(),
            Err(CodecError::UnexpectedEof)
        );
    }

    #[test]
    fn indefinite_array_rejected() {
        let bytes = [0x9f];
        assert_eq!(
            CborReader::new(&bytes).array_header(),
            Err(CodecError::IndefiniteLength)
        );
    }

    #[test]
    fn oversized_container_rejected() {
        // Array claiming 2^32 elements
        let bytes = [0x9a, 0xff, 0xff, 0xff, 0xff];
        assert!(matches!(
            CborReader::new(&bytes).array_header(),
            Err(CodecError::LengthLimitExceeded { .. })
        ));
    }

    #[test]
    fn container_in_value_position_rejected() {
        let bytes = [0x80];
        assert!(matches!(
            CborReader::new(&bytes).value(),
            Err(CodecError::UnexpectedType { .. })
        ));
    }

    #[test]
    fn invalid_utf8_rejected() {
        let bytes = [0x62, 0xff, 0xfe];
        assert_eq!(
            CborReader::new(&bytes).text(),
            Err(CodecError::InvalidUtf8)
        );
    }

    proptest! {
        #[test]
        fn arbitrary_int_roundtrip(n in any::<i64>()) {
            let mut w = CborWriter::new();
            w.int(n);
            let bytes = w.into_bytes();
            prop_assert_eq!(CborReader::new(&bytes).int().unwrap(), n);
        }

        #[test]
        fn arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut reader = CborReader::new(&data);
            let _ = reader.value();
            let mut reader = CborReader::new(&data);
            let _ = reader.array_header();
        }

        #[test]
        fn arbitrary_text_roundtrip(s in "\\PC{0,64}") {
            let mut w = CborWriter::new();
            w.text(&s);
            let bytes = w.into_bytes();
            prop_assert_eq!(CborReader::new(&bytes).text().unwrap(), s);
        }
    }
}
