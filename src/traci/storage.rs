//! Byte-level encoding of TraCI messages
//!
//! All integers and doubles are big-endian. Strings are a 4-byte length
//! followed by UTF-8 bytes.
//!
//! ```text
//! message := u32 total_length (incl. itself) , command*
//! command := u8 length , u8 id , content            (length <= 255)
//!          | 0x00 , u32 length , u8 id , content    (otherwise)
//! ```

use crate::engine::{EngineError, TraciValue};

use super::constants::{
    POSITION_2D, TYPE_BYTE, TYPE_COMPOUND, TYPE_DOUBLE, TYPE_INTEGER, TYPE_STRING,
    TYPE_STRINGLIST, TYPE_UBYTE,
};

/// Growable output buffer
#[derive(Debug, Default, Clone)]
pub struct Storage {
    buf: Vec<u8>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_len(value.len());
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_string_list(&mut self, values: &[String]) {
        self.write_len(values.len());
        for value in values {
            self.write_string(value);
        }
    }

    /// Write a type tag followed by the value
    pub fn write_value(&mut self, value: &TraciValue) {
        match value {
            TraciValue::UByte(v) => {
                self.write_u8(TYPE_UBYTE);
                self.write_u8(*v);
            }
            TraciValue::Byte(v) => {
                self.write_u8(TYPE_BYTE);
                self.write_i8(*v);
            }
            TraciValue::Int(v) => {
                self.write_u8(TYPE_INTEGER);
                self.write_i32(*v);
            }
            TraciValue::Double(v) => {
                self.write_u8(TYPE_DOUBLE);
                self.write_f64(*v);
            }
            TraciValue::String(s) => {
                self.write_u8(TYPE_STRING);
                self.write_string(s);
            }
            TraciValue::StringList(list) => {
                self.write_u8(TYPE_STRINGLIST);
                self.write_string_list(list);
            }
            TraciValue::Position2D { x, y } => {
                self.write_u8(POSITION_2D);
                self.write_f64(*x);
                self.write_f64(*y);
            }
            TraciValue::Compound(items) => {
                self.write_u8(TYPE_COMPOUND);
                self.write_len(items.len());
                for item in items {
                    self.write_value(item);
                }
            }
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn write_len(&mut self, len: usize) {
        // The protocol caps lengths at i32; nothing this crate sends comes close.
        self.write_i32(len as i32);
    }
}

/// Frame a single command: length prefix, command id, content
pub fn encode_command(command_id: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Storage::new();
    let short_len = content.len() + 2;
    if short_len <= u8::MAX as usize {
        out.write_u8(short_len as u8);
    } else {
        out.write_u8(0);
        out.write_i32((content.len() + 6) as i32);
    }
    out.write_u8(command_id);
    out.write_bytes(content);
    out.into_bytes()
}

/// Wrap framed commands into a message with its total length prefix
pub fn encode_message(commands: &[Vec<u8>]) -> Vec<u8> {
    let body_len: usize = commands.iter().map(Vec::len).sum();
    let mut out = Storage::new();
    out.write_i32((body_len + 4) as i32);
    for command in commands {
        out.write_bytes(command);
    }
    out.into_bytes()
}

/// Cursor over a received message body
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], EngineError> {
        if self.remaining() < n {
            return Err(EngineError::Protocol(format!(
                "truncated message: needed {} bytes at offset {}, {} left",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], EngineError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, EngineError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, EngineError> {
        Ok(i8::from_be_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, EngineError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, EngineError> {
        Ok(f64::from_be_bytes(self.take_array()?))
    }

    fn read_len(&mut self) -> Result<usize, EngineError> {
        let len = self.read_i32()?;
        usize::try_from(len)
            .map_err(|_| EngineError::Protocol(format!("negative length {}", len)))
    }

    pub fn read_string(&mut self) -> Result<String, EngineError> {
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| EngineError::Protocol(format!("invalid UTF-8 in string: {}", e)))
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>, EngineError> {
        let count = self.read_len()?;
        (0..count).map(|_| self.read_string()).collect()
    }

    /// Read a type tag and the value it announces
    pub fn read_value(&mut self) -> Result<TraciValue, EngineError> {
        let type_id = self.read_u8()?;
        self.read_value_of_type(type_id)
    }

    pub fn read_value_of_type(&mut self, type_id: u8) -> Result<TraciValue, EngineError> {
        let value = match type_id {
            TYPE_UBYTE => TraciValue::UByte(self.read_u8()?),
            TYPE_BYTE => TraciValue::Byte(self.read_i8()?),
            TYPE_INTEGER => TraciValue::Int(self.read_i32()?),
            TYPE_DOUBLE => TraciValue::Double(self.read_f64()?),
            TYPE_STRING => TraciValue::String(self.read_string()?),
            TYPE_STRINGLIST => TraciValue::StringList(self.read_string_list()?),
            POSITION_2D => TraciValue::Position2D {
                x: self.read_f64()?,
                y: self.read_f64()?,
            },
            TYPE_COMPOUND => {
                let count = self.read_len()?;
                let items = (0..count)
                    .map(|_| self.read_value())
                    .collect::<Result<Vec<_>, _>>()?;
                TraciValue::Compound(items)
            }
            other => {
                return Err(EngineError::Protocol(format!(
                    "unsupported value type 0x{:02x}",
                    other
                )))
            }
        };
        Ok(value)
    }

    /// Read a command header and return `(command_id, content)`, leaving the
    /// reader positioned after the whole command
    pub fn read_command(&mut self) -> Result<(u8, Reader<'a>), EngineError> {
        let start = self.pos;
        let short_len = self.read_u8()?;
        let total_len = if short_len == 0 {
            self.read_len()?
        } else {
            short_len as usize
        };
        let header_len = self.pos - start + 1;
        if total_len < header_len {
            return Err(EngineError::Protocol(format!(
                "command length {} shorter than its header",
                total_len
            )));
        }
        let command_id = self.read_u8()?;
        let content = self.take(total_len - header_len)?;
        Ok((command_id, Reader::new(content)))
    }
}
