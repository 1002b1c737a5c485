//! CBOR writer.

use crate::value::Value;

/// A push-style CBOR writer.
///
/// Items are appended to an internal growable buffer. Container
/// headers are definite-length only; the caller declares the element
/// count up front and is responsible for emitting exactly that many
/// items, which suits a wire format whose container sizes are known
/// before encoding starts.
#[derive(Debug, Default)]
pub struct CborWriter {
    buffer: Vec<u8>,
}

impl CborWriter {
    /// Create a new writer.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new writer with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Consume this writer and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Write an array header for `len` elements.
    pub fn array(&mut self, len: u64) {
        self.write_header(4, len);
    }

    /// Write a map header for `len` key-value pairs.
    pub fn map(&mut self, len: u64) {
        self.write_header(5, len);
    }

    /// Write a signed integer using the shortest encoding.
    #[allow(clippy::cast_sign_loss)]
    pub fn int(&mut self, n: i64) {
        if n >= 0 {
            self.write_header(0, n as u64);
        } else {
            // CBOR negative integers carry -(n+1)
            self.write_header(1, (-(n + 1)) as u64);
        }
    }

    /// Write a boolean.
    pub fn bool(&mut self, b: bool) {
        self.buffer.push(if b { 0xf5 } else { 0xf4 });
    }

    /// Write a 64-bit float.
    pub fn float(&mut self, x: f64) {
        self.buffer.push(0xfb);
        self.buffer.extend_from_slice(&x.to_be_bytes());
    }

    /// Write a UTF-8 text string.
    pub fn text(&mut self, s: &str) {
        self.write_header(3, s.len() as u64);
        self.buffer.extend_from_slice(s.as_bytes());
    }

    /// Write any scalar value.
    pub fn value(&mut self, value: &Value) {
        match value {
            Value::Int(n) => self.int(*n),
            Value::Bool(b) => self.bool(*b),
            Value::Float(x) => self.float(*x),
            Value::Text(s) => self.text(s),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_header(&mut self, major_type: u8, argument: u64) {
        let mt = major_type << 5;

        if argument < 24 {
            self.buffer.push(mt | (argument as u8));
        } else if u8::try_from(argument).is_ok() {
            self.buffer.push(mt | 24);
            self.buffer.push(argument as u8);
        } else if u16::try_from(argument).is_ok() {
            self.buffer.push(mt | 25);
            self.buffer
                .extend_from_slice(&(argument as u16).to_be_bytes());
        } else if u32::try_from(argument).is_ok() {
            self.buffer.push(mt | 26);
            self.buffer
                .extend_from_slice(&(argument as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&argument.to_be_bytes());
        }
    }
}
