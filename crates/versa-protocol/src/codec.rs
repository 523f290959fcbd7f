use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("VarInt too big")]
    VarIntTooBig,
    #[error("Not enough data")]
    NotEnoughData,
    #[error("String too long: {0} > {1}")]
    StringTooLong(usize, usize),
    #[error("String is not valid UTF-8")]
    InvalidString,
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Longest string accepted by `read_string`.
pub const MAX_STRING_LEN: usize = 1 << 20;

/// Read an unsigned 32-bit VarInt.
pub fn read_varuint32(buf: &mut BytesMut) -> CodecResult<u32> {
    let mut result: u32 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 35 {
            return Err(CodecError::VarIntTooBig);
        }
    }
}

/// Write an unsigned 32-bit VarInt.
pub fn write_varuint32(buf: &mut BytesMut, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.put_u8(byte);
            return;
        }
        buf.put_u8(byte | 0x80);
    }
}

/// Read a zigzag-encoded signed 32-bit VarInt.
pub fn read_varint32(buf: &mut BytesMut) -> CodecResult<i32> {
    let raw = read_varuint32(buf)?;
    Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
}

/// Write a zigzag-encoded signed 32-bit VarInt.
pub fn write_varint32(buf: &mut BytesMut, value: i32) {
    write_varuint32(buf, ((value << 1) ^ (value >> 31)) as u32);
}

pub fn read_u8(buf: &mut BytesMut) -> CodecResult<u8> {
    if !buf.has_remaining() {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_u8())
}

pub fn read_i32_le(buf: &mut BytesMut) -> CodecResult<i32> {
    if buf.remaining() < 4 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_i32_le())
}

pub fn read_u32_le(buf: &mut BytesMut) -> CodecResult<u32> {
    if buf.remaining() < 4 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_u32_le())
}

/// Split off exactly `len` bytes.
pub fn read_bytes(buf: &mut BytesMut, len: usize) -> CodecResult<BytesMut> {
    if buf.remaining() < len {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.split_to(len))
}

/// Read a protocol string (unsigned VarInt length, UTF-8).
pub fn read_string(buf: &mut BytesMut) -> CodecResult<String> {
    let len = read_varuint32(buf)? as usize;
    if len > MAX_STRING_LEN {
        return Err(CodecError::StringTooLong(len, MAX_STRING_LEN));
    }
    let bytes = read_bytes(buf, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidString)
}

/// Write a protocol string.
pub fn write_string(buf: &mut BytesMut, s: &str) {
    write_varuint32(buf, s.len() as u32);
    buf.put_slice(s.as_bytes());
}
