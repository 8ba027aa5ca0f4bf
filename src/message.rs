//! # AppMessage Dictionary
//!
//! Key/value payload exchanged between the watch and the phone.
//!
//! ## Wire Format
//!
//! All integers little endian:
//!
//! ```text
//! u8   tuple count
//! per tuple:
//!   u32  key
//!   u8   type      0 = byte array, 1 = C string, 2 = uint, 3 = int
//!   u16  length    value length in bytes
//!   [u8] value     C strings include their NUL terminator
//! ```
//!
//! Integers are 1, 2 or 4 bytes wide. A dictionary of `n` tuples needs
//! `1 + 7n + Σ lengths` bytes.

use thiserror::Error;

/// Phone asks for fresh weather. Value is a uint8, ignored.
pub const KEY_REQUEST_WEATHER: u32 = 0;
/// Current temperature, int32, already in the configured unit.
pub const KEY_TEMPERATURE: u32 = 1;
/// Condition word, C string.
pub const KEY_CONDITIONS: u32 = 2;

const HEADER_LEN: usize = 1;
const TUPLE_HEADER_LEN: usize = 7;

const TYPE_BYTE_ARRAY: u8 = 0;
const TYPE_CSTRING: u8 = 1;
const TYPE_UINT: u8 = 2;
const TYPE_INT: u8 = 3;

/// Errors decoding or building a dictionary.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MessageError {
    /// Input ended inside a header or value
    #[error("message truncated at byte {0}")]
    Truncated(usize),

    #[error("unknown tuple type {0}")]
    UnknownType(u8),

    /// Integers must be 1, 2 or 4 bytes wide
    #[error("invalid integer width {0}")]
    InvalidWidth(u16),

    /// C string without terminator or not UTF-8
    #[error("invalid string in tuple {0}")]
    InvalidString(u32),

    #[error("{0} trailing bytes after last tuple")]
    TrailingBytes(usize),

    /// More than 255 tuples, or a value longer than u16::MAX
    #[error("dictionary too large")]
    TooLarge,
}

/// Transport-level failures reported to the face's inbox/outbox callbacks.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMessageResult {
    /// Outbox still busy with an earlier message
    #[error("outbox busy")]
    Busy,

    /// Message does not fit the inbox or outbox buffer
    #[error("buffer overflow: {needed} bytes, buffer holds {capacity}")]
    BufferOverflow { needed: usize, capacity: usize },

    #[error("phone not connected")]
    NotConnected,

    /// Connection shut down for good
    #[error("message channel closed")]
    Closed,

    /// Receiver could not parse the message
    #[error("message rejected")]
    SendRejected,
}

/// Value of one tuple.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TupleValue {
    Bytes(Vec<u8>),
    CString(String),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Int8(i8),
    Int16(i16),
    Int32(i32),
}

impl TupleValue {
    fn type_byte(&self) -> u8 {
        match self {
            TupleValue::Bytes(_) => TYPE_BYTE_ARRAY,
            TupleValue::CString(_) => TYPE_CSTRING,
            TupleValue::Uint8(_) | TupleValue::Uint16(_) | TupleValue::Uint32(_) => TYPE_UINT,
            TupleValue::Int8(_) | TupleValue::Int16(_) | TupleValue::Int32(_) => TYPE_INT,
        }
    }

    /// Encoded value length in bytes
    pub fn len(&self) -> usize {
        match self {
            TupleValue::Bytes(b) => b.len(),
            TupleValue::CString(s) => s.len() + 1,
            TupleValue::Uint8(_) | TupleValue::Int8(_) => 1,
            TupleValue::Uint16(_) | TupleValue::Int16(_) => 2,
            TupleValue::Uint32(_) | TupleValue::Int32(_) => 4,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer value widened to i32; `None` for strings, byte arrays and
    /// uint32 values above i32::MAX.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            TupleValue::Uint8(v) => Some(v as i32),
            TupleValue::Uint16(v) => Some(v as i32),
            TupleValue::Uint32(v) => i32::try_from(v).ok(),
            TupleValue::Int8(v) => Some(v as i32),
            TupleValue::Int16(v) => Some(v as i32),
            TupleValue::Int32(v) => Some(v),
            TupleValue::Bytes(_) | TupleValue::CString(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TupleValue::CString(s) => Some(s),
            _ => None,
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            TupleValue::Bytes(b) => out.extend_from_slice(b),
            TupleValue::CString(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
            TupleValue::Uint8(v) => out.push(*v),
            TupleValue::Uint16(v) => out.extend_from_slice(&v.to_le_bytes()),
            TupleValue::Uint32(v) => out.extend_from_slice(&v.to_le_bytes()),
            TupleValue::Int8(v) => out.extend_from_slice(&v.to_le_bytes()),
            TupleValue::Int16(v) => out.extend_from_slice(&v.to_le_bytes()),
            TupleValue::Int32(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    fn read_from(key: u32, ty: u8, raw: &[u8]) -> Result<Self, MessageError> {
        let width = raw.len() as u16;
        match ty {
            TYPE_BYTE_ARRAY => Ok(TupleValue::Bytes(raw.to_vec())),
            TYPE_CSTRING => {
                let (last, body) = raw
                    .split_last()
                    .ok_or(MessageError::InvalidString(key))?;
                if *last != 0 || body.contains(&0) {
                    return Err(MessageError::InvalidString(key));
                }
                let s = std::str::from_utf8(body).map_err(|_| MessageError::InvalidString(key))?;
                Ok(TupleValue::CString(s.to_string()))
            }
            TYPE_UINT => match *raw {
                [a] => Ok(TupleValue::Uint8(a)),
                [a, b] => Ok(TupleValue::Uint16(u16::from_le_bytes([a, b]))),
                [a, b, c, d] => Ok(TupleValue::Uint32(u32::from_le_bytes([a, b, c, d]))),
                _ => Err(MessageError::InvalidWidth(width)),
            },
            TYPE_INT => match *raw {
                [a] => Ok(TupleValue::Int8(a as i8)),
                [a, b] => Ok(TupleValue::Int16(i16::from_le_bytes([a, b]))),
                [a, b, c, d] => Ok(TupleValue::Int32(i32::from_le_bytes([a, b, c, d]))),
                _ => Err(MessageError::InvalidWidth(width)),
            },
            other => Err(MessageError::UnknownType(other)),
        }
    }
}

/// One key/value pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tuple {
    pub key: u32,
    pub value: TupleValue,
}

/// Ordered key/value message.
///
/// Writing a key that is already present replaces its value in place.
///
/// # Example
/// ```
/// use watchface_lib::message::{Dictionary, KEY_TEMPERATURE, KEY_CONDITIONS};
///
/// let mut dict = Dictionary::new();
/// dict.write_int32(KEY_TEMPERATURE, 72);
/// dict.write_cstring(KEY_CONDITIONS, "Clear");
///
/// let bytes = dict.encode().unwrap();
/// assert_eq!(bytes.len(), dict.encoded_len());
/// assert_eq!(Dictionary::decode(&bytes).unwrap(), dict);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dictionary {
    tuples: Vec<Tuple>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, key: u32, value: TupleValue) {
        match self.tuples.iter_mut().find(|t| t.key == key) {
            Some(tuple) => tuple.value = value,
            None => self.tuples.push(Tuple { key, value }),
        }
    }

    pub fn write_uint8(&mut self, key: u32, value: u8) {
        self.write(key, TupleValue::Uint8(value));
    }

    pub fn write_int32(&mut self, key: u32, value: i32) {
        self.write(key, TupleValue::Int32(value));
    }

    pub fn write_cstring(&mut self, key: u32, value: &str) {
        self.write(key, TupleValue::CString(value.to_string()));
    }

    pub fn find(&self, key: u32) -> Option<&TupleValue> {
        self.tuples.iter().find(|t| t.key == key).map(|t| &t.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tuple> {
        self.tuples.iter()
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Buffer size needed to hold the encoded dictionary
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN
            + self
                .tuples
                .iter()
                .map(|t| TUPLE_HEADER_LEN + t.value.len())
                .sum::<usize>()
    }

    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        let count = u8::try_from(self.tuples.len()).map_err(|_| MessageError::TooLarge)?;

        let mut out = Vec::with_capacity(self.encoded_len());
        out.push(count);
        for tuple in &self.tuples {
            let len = u16::try_from(tuple.value.len()).map_err(|_| MessageError::TooLarge)?;
            out.extend_from_slice(&tuple.key.to_le_bytes());
            out.push(tuple.value.type_byte());
            out.extend_from_slice(&len.to_le_bytes());
            tuple.value.write_to(&mut out);
        }
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let (&count, mut rest) = bytes.split_first().ok_or(MessageError::Truncated(0))?;
        let mut tuples = Vec::with_capacity(count as usize);

        for _ in 0..count {
            let offset = bytes.len() - rest.len();
            if rest.len() < TUPLE_HEADER_LEN {
                return Err(MessageError::Truncated(bytes.len()));
            }
            let key = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
            let ty = rest[4];
            let len = u16::from_le_bytes([rest[5], rest[6]]) as usize;
            rest = &rest[TUPLE_HEADER_LEN..];

            if rest.len() < len {
                return Err(MessageError::Truncated(offset + TUPLE_HEADER_LEN + rest.len()));
            }
            let (raw, tail) = rest.split_at(len);
            tuples.push(Tuple {
                key,
                value: TupleValue::read_from(key, ty, raw)?,
            });
            rest = tail;
        }

        if !rest.is_empty() {
            return Err(MessageError::TrailingBytes(rest.len()));
        }
        Ok(Self { tuples })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weather_request_bytes() {
        let mut dict = Dictionary::new();
        dict.write_uint8(KEY_REQUEST_WEATHER, 0);

        let bytes = dict.encode().unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 0, TYPE_UINT, 1, 0, 0]);
        assert_eq!(dict.encoded_len(), 9);
    }

    #[test]
    fn test_weather_reply_layout() {
        let mut dict = Dictionary::new();
        dict.write_int32(KEY_TEMPERATURE, -5);
        dict.write_cstring(KEY_CONDITIONS, "Snow");

        let bytes = dict.encode().unwrap();
        // 1 + (7 + 4) + (7 + 5)
        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[1..5], &KEY_TEMPERATURE.to_le_bytes());
        assert_eq!(bytes[5], TYPE_INT);
        assert_eq!(&bytes[6..8], &[4, 0]);
        assert_eq!(&bytes[8..12], &(-5i32).to_le_bytes());
        assert_eq!(&bytes[12..16], &KEY_CONDITIONS.to_le_bytes());
        assert_eq!(bytes[16], TYPE_CSTRING);
        assert_eq!(&bytes[17..19], &[5, 0]);
        assert_eq!(&bytes[19..], b"Snow\0");
    }

    #[test]
    fn test_decode_reads_all_widths() {
        let mut dict = Dictionary::new();
        dict.write(10, TupleValue::Uint16(65_000));
        dict.write(11, TupleValue::Int8(-3));
        dict.write(12, TupleValue::Int16(-300));
        dict.write(13, TupleValue::Uint32(7));
        dict.write(14, TupleValue::Bytes(vec![1, 2, 3]));

        let decoded = Dictionary::decode(&dict.encode().unwrap()).unwrap();
        assert_eq!(decoded.find(10).and_then(TupleValue::as_i32), Some(65_000));
        assert_eq!(decoded.find(11).and_then(TupleValue::as_i32), Some(-3));
        assert_eq!(decoded.find(12).and_then(TupleValue::as_i32), Some(-300));
        assert_eq!(decoded.find(13).and_then(TupleValue::as_i32), Some(7));
        assert_eq!(decoded.find(14), Some(&TupleValue::Bytes(vec![1, 2, 3])));
        assert_eq!(decoded.find(99), None);
    }

    #[test]
    fn test_write_replaces_existing_key() {
        let mut dict = Dictionary::new();
        dict.write_int32(KEY_TEMPERATURE, 1);
        dict.write_int32(KEY_TEMPERATURE, 2);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.find(KEY_TEMPERATURE), Some(&TupleValue::Int32(2)));
    }

    #[test]
    fn test_typed_readers() {
        assert_eq!(TupleValue::Uint32(u32::MAX).as_i32(), None);
        assert_eq!(TupleValue::CString("x".into()).as_i32(), None);
        assert_eq!(TupleValue::CString("x".into()).as_str(), Some("x"));
        assert_eq!(TupleValue::Int32(4).as_str(), None);
    }

    #[test]
    fn test_decode_empty_input() {
        assert_eq!(Dictionary::decode(&[]), Err(MessageError::Truncated(0)));
        assert_eq!(Dictionary::decode(&[0]), Ok(Dictionary::new()));
    }

    #[test]
    fn test_decode_truncated_header_and_value() {
        assert!(matches!(
            Dictionary::decode(&[1, 0, 0, 0]),
            Err(MessageError::Truncated(_))
        ));
        // Declares 4 value bytes, carries 2
        assert!(matches!(
            Dictionary::decode(&[1, 1, 0, 0, 0, TYPE_INT, 4, 0, 9, 9]),
            Err(MessageError::Truncated(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_tuples() {
        assert_eq!(
            Dictionary::decode(&[1, 0, 0, 0, 0, 9, 1, 0, 0]),
            Err(MessageError::UnknownType(9))
        );
        assert_eq!(
            Dictionary::decode(&[1, 0, 0, 0, 0, TYPE_INT, 3, 0, 1, 2, 3]),
            Err(MessageError::InvalidWidth(3))
        );
        // Missing NUL terminator
        assert_eq!(
            Dictionary::decode(&[1, 2, 0, 0, 0, TYPE_CSTRING, 2, 0, b'h', b'i']),
            Err(MessageError::InvalidString(2))
        );
        // Not UTF-8
        assert_eq!(
            Dictionary::decode(&[1, 2, 0, 0, 0, TYPE_CSTRING, 2, 0, 0xFF, 0]),
            Err(MessageError::InvalidString(2))
        );
        assert_eq!(
            Dictionary::decode(&[0, 1, 2]),
            Err(MessageError::TrailingBytes(2))
        );
    }

    #[test]
    fn test_encode_rejects_oversized_value() {
        let mut dict = Dictionary::new();
        dict.write(1, TupleValue::Bytes(vec![0; u16::MAX as usize + 1]));
        assert_eq!(dict.encode(), Err(MessageError::TooLarge));
    }
}
