//! Inbound wire payload construction.

use shadowsync_codec::{CborWriter, Value};

/// Builds the wire sequence a remote peer would send: an array of
/// 2-entry maps `{"t"|"n": identifier, "v": value}`.
///
/// ```
/// use shadowsync_testkit::UpdateBuilder;
///
/// let payload = UpdateBuilder::new()
///     .set_by_name("led", true)
///     .set_by_tag(2, 21.5)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct UpdateBuilder {
    entries: Vec<(Ident, Value)>,
}

#[derive(Debug)]
enum Ident {
    Tag(i64),
    Name(String),
}

impl UpdateBuilder {
    /// Start an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name-keyed entry.
    #[must_use]
    pub fn set_by_name(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.entries
            .push((Ident::Name(name.to_string()), value.into()));
        self
    }

    /// Add a tag-keyed entry.
    #[must_use]
    pub fn set_by_tag(mut self, tag: i64, value: impl Into<Value>) -> Self {
        self.entries.push((Ident::Tag(tag), value.into()));
        self
    }

    /// Encode the payload bytes.
    pub fn build(self) -> Vec<u8> {
        let mut writer = CborWriter::new();
        writer.array(self.entries.len() as u64);
        for (ident, value) in &self.entries {
            writer.map(2);
            match ident {
                Ident::Tag(tag) => {
                    writer.text("t");
                    writer.int(*tag);
                }
                Ident::Name(name) => {
                    writer.text("n");
                    writer.text(name);
                }
            }
            writer.text("v");
            writer.value(value);
        }
        writer.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadowsync_codec::CborReader;

    #[test]
    fn builds_the_expected_structure() {
        let payload = UpdateBuilder::new().set_by_name("led", true).build();

        let mut reader = CborReader::new(&payload);
        assert_eq!(reader.array_header().unwrap(), 1);
        assert_eq!(reader.map_header().unwrap(), 2);
        assert_eq!(reader.text().unwrap(), "n");
        assert_eq!(reader.text().unwrap(), "led");
        assert_eq!(reader.text().unwrap(), "v");
        assert_eq!(reader.value().unwrap(), Value::Bool(true));
        assert!(reader.is_empty());
    }

    #[test]
    fn empty_update_is_an_empty_array() {
        assert_eq!(UpdateBuilder::new().build(), vec![0x80]);
    }
}
