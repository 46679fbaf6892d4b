//! Options-file decoding.
//!
//! An options file is a stream of values matching the node schema, in one
//! of two encodings: `"json"` (concatenated or whitespace-separated JSON
//! values) or `"binary"` (Avro binary: zig-zag varints, length-prefixed
//! bytes and strings, block-encoded arrays and maps, index-prefixed
//! unions). Both readers consume the stream to exhaustion and release the
//! file handle before returning on every path.

use crate::error::{GeneratorError, Result};
use datagen_core::{SchemaKind, SchemaNode, Value};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};

/// Read a stream of JSON values from an options file.
pub(crate) fn read_json_options(path: &str) -> Result<Vec<JsonValue>> {
    let file = File::open(path).map_err(|error| resource(path, error))?;
    let stream = serde_json::Deserializer::from_reader(BufReader::new(file)).into_iter();
    let mut options = Vec::new();
    for entry in stream {
        options.push(entry.map_err(|error| resource(path, error))?);
    }
    Ok(options)
}

/// Read a stream of Avro-binary-encoded values from an options file,
/// decoding each against the node schema.
pub(crate) fn read_binary_options(path: &str, schema: &SchemaNode) -> Result<Vec<Value>> {
    let file = File::open(path).map_err(|error| resource(path, error))?;
    let mut reader = Decoder {
        reader: BufReader::new(file),
        path,
    };
    let mut options = Vec::new();
    while !reader.at_end()? {
        options.push(reader.decode(schema)?);
    }
    Ok(options)
}

fn resource(path: &str, reason: impl std::fmt::Display) -> GeneratorError {
    GeneratorError::Resource {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

struct Decoder<'a> {
    reader: BufReader<File>,
    path: &'a str,
}

impl Decoder<'_> {
    fn at_end(&mut self) -> Result<bool> {
        let buffer = self
            .reader
            .fill_buf()
            .map_err(|error| resource(self.path, error))?;
        Ok(buffer.is_empty())
    }

    fn decode(&mut self, schema: &SchemaNode) -> Result<Value> {
        match schema.kind() {
            SchemaKind::Null => Ok(Value::Null),
            SchemaKind::Boolean => Ok(Value::Boolean(self.byte()? != 0)),
            SchemaKind::Int => {
                let value = self.varint()?;
                i32::try_from(value)
                    .map(Value::Int)
                    .map_err(|_| self.corrupt("int value out of range"))
            }
            SchemaKind::Long => Ok(Value::Long(self.varint()?)),
            SchemaKind::Float => {
                let mut buffer = [0u8; 4];
                self.exact(&mut buffer)?;
                Ok(Value::Float(f32::from_le_bytes(buffer)))
            }
            SchemaKind::Double => {
                let mut buffer = [0u8; 8];
                self.exact(&mut buffer)?;
                Ok(Value::Double(f64::from_le_bytes(buffer)))
            }
            SchemaKind::Bytes { .. } => Ok(Value::Bytes(self.length_prefixed()?)),
            SchemaKind::String => {
                let bytes = self.length_prefixed()?;
                String::from_utf8(bytes)
                    .map(Value::String)
                    .map_err(|_| self.corrupt("string value is not valid UTF-8"))
            }
            SchemaKind::Fixed { size, .. } => {
                let mut buffer = vec![0u8; *size];
                self.exact(&mut buffer)?;
                Ok(Value::Fixed(buffer))
            }
            SchemaKind::Enum { symbols, .. } => {
                let ordinal = self.varint()?;
                usize::try_from(ordinal)
                    .ok()
                    .and_then(|ordinal| {
                        symbols.get(ordinal).map(|symbol| Value::Enum {
                            ordinal,
                            symbol: symbol.clone(),
                        })
                    })
                    .ok_or_else(|| self.corrupt("enum ordinal out of range"))
            }
            SchemaKind::Array { items } => {
                let mut elements = Vec::new();
                self.blocks(|decoder| {
                    elements.push(decoder.decode(items)?);
                    Ok(())
                })?;
                Ok(Value::Array(elements))
            }
            SchemaKind::Map { values } => {
                let mut entries = BTreeMap::new();
                self.blocks(|decoder| {
                    let key = String::from_utf8(decoder.length_prefixed()?)
                        .map_err(|_| decoder.corrupt("map key is not valid UTF-8"))?;
                    entries.insert(key, decoder.decode(values)?);
                    Ok(())
                })?;
                Ok(Value::Map(entries))
            }
            SchemaKind::Record { name, fields } => {
                let fields = fields
                    .iter()
                    .map(|field| Ok((field.name.clone(), self.decode(&field.schema)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Record {
                    name: name.clone(),
                    fields,
                })
            }
            SchemaKind::Union { branches } => {
                let index = self.varint()?;
                let branch = usize::try_from(index)
                    .ok()
                    .and_then(|index| branches.get(index))
                    .ok_or_else(|| self.corrupt("union index out of range"))?;
                self.decode(branch)
            }
        }
    }

    /// Count-prefixed blocks, as used by arrays and maps. A negative count
    /// is followed by the block's size in bytes, which we have no need for.
    fn blocks(&mut self, mut entry: impl FnMut(&mut Self) -> Result<()>) -> Result<()> {
        loop {
            let mut count = self.varint()?;
            if count == 0 {
                return Ok(());
            }
            if count < 0 {
                self.varint()?;
                count = -count;
            }
            for _ in 0..count {
                entry(self)?;
            }
        }
    }

    fn length_prefixed(&mut self) -> Result<Vec<u8>> {
        let length = self.varint()?;
        let length =
            usize::try_from(length).map_err(|_| self.corrupt("negative length prefix"))?;
        let mut buffer = vec![0u8; length];
        self.exact(&mut buffer)?;
        Ok(buffer)
    }

    /// Zig-zag variable-length long.
    fn varint(&mut self) -> Result<i64> {
        let mut accumulator = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.byte()?;
            accumulator |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift > 63 {
                return Err(self.corrupt("varint is longer than 10 bytes"));
            }
        }
        Ok((accumulator >> 1) as i64 ^ -((accumulator & 1) as i64))
    }

    fn byte(&mut self) -> Result<u8> {
        let mut buffer = [0u8; 1];
        self.exact(&mut buffer)?;
        Ok(buffer[0])
    }

    fn exact(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.reader
            .read_exact(buffer)
            .map_err(|error| resource(self.path, error))
    }

    fn corrupt(&self, reason: &str) -> GeneratorError {
        resource(self.path, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn zigzag(value: i64) -> Vec<u8> {
        let mut encoded = ((value << 1) ^ (value >> 63)) as u64;
        let mut bytes = Vec::new();
        loop {
            let mut byte = (encoded & 0x7f) as u8;
            encoded >>= 7;
            if encoded != 0 {
                byte |= 0x80;
            }
            bytes.push(byte);
            if encoded == 0 {
                return bytes;
            }
        }
    }

    #[test]
    fn reads_json_value_stream() {
        let file = write_file(b"1 2\n{\"x\": 3}");
        let values = read_json_options(file.path().to_str().unwrap()).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], serde_json::json!(1));
        assert_eq!(values[2]["x"], serde_json::json!(3));
    }

    #[test]
    fn missing_file_is_a_resource_error() {
        let result = read_json_options("/no/such/options/file.json");
        assert!(matches!(result, Err(GeneratorError::Resource { .. })));
    }

    #[test]
    fn decodes_binary_longs() {
        let mut bytes = Vec::new();
        for value in [0i64, -1, 1, -50, 1234567] {
            bytes.extend(zigzag(value));
        }
        let file = write_file(&bytes);
        let schema = SchemaNode::parse_str(r#""long""#).unwrap();
        let values = read_binary_options(file.path().to_str().unwrap(), &schema).unwrap();
        assert_eq!(
            values,
            vec![
                Value::Long(0),
                Value::Long(-1),
                Value::Long(1),
                Value::Long(-50),
                Value::Long(1234567),
            ]
        );
    }

    #[test]
    fn decodes_binary_records() {
        let schema = SchemaNode::parse_str(
            r#"{"type": "record", "name": "User",
                "fields": [{"name": "id", "type": "long"}, {"name": "name", "type": "string"}]}"#,
        )
        .unwrap();
        let mut bytes = Vec::new();
        bytes.extend(zigzag(7));
        bytes.extend(zigzag(3));
        bytes.extend(b"ada");
        let file = write_file(&bytes);
        let values = read_binary_options(file.path().to_str().unwrap(), &schema).unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].field("id"), Some(&Value::Long(7)));
        assert_eq!(
            values[0].field("name"),
            Some(&Value::String("ada".to_string()))
        );
    }

    #[test]
    fn decodes_binary_arrays_and_unions() {
        let schema = SchemaNode::parse_str(r#"{"type": "array", "items": ["null", "int"]}"#)
            .unwrap();
        let mut bytes = Vec::new();
        bytes.extend(zigzag(2)); // block of two items
        bytes.extend(zigzag(1)); // union branch 1: int
        bytes.extend(zigzag(42));
        bytes.extend(zigzag(0)); // union branch 0: null
        bytes.extend(zigzag(0)); // end of blocks
        let file = write_file(&bytes);
        let values = read_binary_options(file.path().to_str().unwrap(), &schema).unwrap();
        assert_eq!(
            values,
            vec![Value::Array(vec![Value::Int(42), Value::Null])]
        );
    }

    #[test]
    fn truncated_binary_stream_is_an_error() {
        let schema = SchemaNode::parse_str(r#""string""#).unwrap();
        let mut bytes = zigzag(10);
        bytes.extend(b"abc");
        let file = write_file(&bytes);
        let result = read_binary_options(file.path().to_str().unwrap(), &schema);
        assert!(matches!(result, Err(GeneratorError::Resource { .. })));
    }
}
