//! Pluggable document encoding.
//!
//! The executor never commits to a concrete document wire format: requests
//! are encoded through [`Encoder`] and reply bodies decoded through
//! [`Decoder`]. [`DocumentCodec`] is the fixed generic pair used for command
//! documents and for extracting server error documents, independent of
//! whatever typed decoder a caller supplies.

use bytes::{Buf, BufMut, BytesMut};

use crate::document::{Document, Value};
use crate::error::{QuillError, Result};

/// Encodes values of type `T` into a wire buffer.
pub trait Encoder<T>: Send + Sync {
    /// Appends the encoded form of `value` to `dst`.
    fn encode(&self, value: &T, dst: &mut BytesMut) -> Result<()>;
}

/// Decodes values of type `T` from a wire buffer.
///
/// Implementations consume exactly one value from the front of `src`.
pub trait Decoder<T>: Send + Sync {
    /// Decodes one value, advancing `src` past the consumed bytes.
    fn decode(&self, src: &mut BytesMut) -> Result<T>;
}

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT32: u8 = 2;
const TAG_INT64: u8 = 3;
const TAG_DOUBLE: u8 = 4;
const TAG_STRING: u8 = 5;
const TAG_ARRAY: u8 = 6;
const TAG_DOCUMENT: u8 = 7;

/// The default self-describing binary codec for generic [`Document`]s.
///
/// A document is a little-endian `u32` field count followed by each field as
/// a length-prefixed UTF-8 key, a one-byte type tag, and the value payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCodec;

impl Encoder<Document> for DocumentCodec {
    fn encode(&self, value: &Document, dst: &mut BytesMut) -> Result<()> {
        write_document(value, dst);
        Ok(())
    }
}

impl Decoder<Document> for DocumentCodec {
    fn decode(&self, src: &mut BytesMut) -> Result<Document> {
        read_document(src)
    }
}

fn write_document(document: &Document, dst: &mut BytesMut) {
    dst.put_u32_le(document.len() as u32);
    for (key, value) in document.iter() {
        write_string(key, dst);
        write_value(value, dst);
    }
}

fn write_value(value: &Value, dst: &mut BytesMut) {
    match value {
        Value::Null => dst.put_u8(TAG_NULL),
        Value::Bool(b) => {
            dst.put_u8(TAG_BOOL);
            dst.put_u8(u8::from(*b));
        }
        Value::Int32(n) => {
            dst.put_u8(TAG_INT32);
            dst.put_i32_le(*n);
        }
        Value::Int64(n) => {
            dst.put_u8(TAG_INT64);
            dst.put_i64_le(*n);
        }
        Value::Double(d) => {
            dst.put_u8(TAG_DOUBLE);
            dst.put_f64_le(*d);
        }
        Value::String(s) => {
            dst.put_u8(TAG_STRING);
            write_string(s, dst);
        }
        Value::Array(values) => {
            dst.put_u8(TAG_ARRAY);
            dst.put_u32_le(values.len() as u32);
            for value in values {
                write_value(value, dst);
            }
        }
        Value::Document(doc) => {
            dst.put_u8(TAG_DOCUMENT);
            write_document(doc, dst);
        }
    }
}

fn write_string(s: &str, dst: &mut BytesMut) {
    dst.put_u32_le(s.len() as u32);
    dst.put_slice(s.as_bytes());
}

fn read_document(src: &mut BytesMut) -> Result<Document> {
    let count = read_u32(src)?;
    let mut document = Document::new();
    for _ in 0..count {
        let key = read_string(src)?;
        let value = read_value(src)?;
        document.insert(key, value);
    }
    Ok(document)
}

fn read_value(src: &mut BytesMut) -> Result<Value> {
    ensure(src, 1)?;
    let tag = src.get_u8();
    match tag {
        TAG_NULL => Ok(Value::Null),
        TAG_BOOL => {
            ensure(src, 1)?;
            Ok(Value::Bool(src.get_u8() != 0))
        }
        TAG_INT32 => {
            ensure(src, 4)?;
            Ok(Value::Int32(src.get_i32_le()))
        }
        TAG_INT64 => {
            ensure(src, 8)?;
            Ok(Value::Int64(src.get_i64_le()))
        }
        TAG_DOUBLE => {
            ensure(src, 8)?;
            Ok(Value::Double(src.get_f64_le()))
        }
        TAG_STRING => Ok(Value::String(read_string(src)?)),
        TAG_ARRAY => {
            let count = read_u32(src)?;
            let mut values = Vec::with_capacity(count.min(64) as usize);
            for _ in 0..count {
                values.push(read_value(src)?);
            }
            Ok(Value::Array(values))
        }
        TAG_DOCUMENT => Ok(Value::Document(read_document(src)?)),
        other => Err(QuillError::Decode(format!(
            "unknown value tag 0x{:02x}",
            other
        ))),
    }
}

fn read_string(src: &mut BytesMut) -> Result<String> {
    let len = read_u32(src)? as usize;
    ensure(src, len)?;
    let bytes = src.split_to(len);
    String::from_utf8(bytes.to_vec())
        .map_err(|e| QuillError::Decode(format!("invalid UTF-8 in string: {}", e)))
}

fn read_u32(src: &mut BytesMut) -> Result<u32> {
    ensure(src, 4)?;
    Ok(src.get_u32_le())
}

fn ensure(src: &BytesMut, needed: usize) -> Result<()> {
    if src.len() < needed {
        return Err(QuillError::Decode(format!(
            "unexpected end of buffer: needed {} more bytes, had {}",
            needed,
            src.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(document: Document) -> Document {
        let mut buf = BytesMut::new();
        DocumentCodec.encode(&document, &mut buf).unwrap();
        let decoded = DocumentCodec.decode(&mut buf).unwrap();
        assert!(buf.is_empty(), "decode left {} trailing bytes", buf.len());
        decoded
    }

    #[test]
    fn test_roundtrip_mixed_fields() {
        let document = Document::new()
            .with("user", "alice")
            .with("readOnly", false)
            .with("n", 3)
            .with("cursor", 99i64)
            .with("ok", 1.0)
            .with("nothing", Value::Null)
            .with(
                "roles",
                vec![Value::from("read"), Value::from("readWrite")],
            )
            .with("detail", Document::new().with("code", 11000));

        assert_eq!(roundtrip(document.clone()), document);
    }

    #[test]
    fn test_roundtrip_empty_document() {
        assert_eq!(roundtrip(Document::new()), Document::new());
    }

    #[test]
    fn test_decode_consumes_one_document() {
        let first = Document::new().with("a", 1);
        let second = Document::new().with("b", 2);

        let mut buf = BytesMut::new();
        DocumentCodec.encode(&first, &mut buf).unwrap();
        DocumentCodec.encode(&second, &mut buf).unwrap();

        assert_eq!(DocumentCodec.decode(&mut buf).unwrap(), first);
        assert_eq!(DocumentCodec.decode(&mut buf).unwrap(), second);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_truncated_buffer_fails() {
        let document = Document::new().with("user", "alice");
        let mut buf = BytesMut::new();
        DocumentCodec.encode(&document, &mut buf).unwrap();
        buf.truncate(buf.len() - 3);

        let err = DocumentCodec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, QuillError::Decode(_)));
    }

    #[test]
    fn test_decode_unknown_tag_fails() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(1);
        buf.put_u32_le(1);
        buf.put_u8(b'x');
        buf.put_u8(0xff); // no such tag

        let err = DocumentCodec.decode(&mut buf).unwrap_err();
        assert!(err.to_string().contains("unknown value tag"));
    }

    #[test]
    fn test_decode_invalid_utf8_fails() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(1);
        buf.put_u32_le(2);
        buf.put_slice(&[0xc3, 0x28]); // invalid UTF-8 sequence
        buf.put_u8(TAG_NULL);

        let err = DocumentCodec.decode(&mut buf).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }
}
