use crate::nbt::*;
use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;

/// Maximum nesting of lists and compounds accepted by the reader.
pub const MAX_DEPTH: usize = 512;

/// Byte layout used when reading or writing NBT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NbtEncoding {
    /// Java-style big-endian layout.
    BigEndian,
    /// Little-endian layout used by world storage.
    LittleEndian,
    /// Little-endian layout used on the network: ints and lengths are zigzag varints,
    /// strings are prefixed with an unsigned varint.
    NetworkLittleEndian,
}

#[derive(Debug, Error)]
pub enum NbtError {
    #[error("Not enough data")]
    NotEnoughData,
    #[error("Unknown tag type {0}")]
    UnknownTag(u8),
    #[error("VarInt too big")]
    VarIntTooBig,
    #[error("Negative length {0}")]
    NegativeLength(i32),
    #[error("Nesting deeper than {MAX_DEPTH}")]
    DepthExceeded,
    #[error("String is not valid UTF-8")]
    InvalidString,
}

pub type NbtResult<T> = Result<T, NbtError>;

impl NbtValue {
    /// Write this value as a named root tag.
    pub fn write_root(&self, name: &str, encoding: NbtEncoding, buf: &mut BytesMut) {
        buf.put_u8(self.tag_id());
        let mut w = Writer { buf, encoding };
        w.string(name);
        w.payload(self);
    }

    /// Write just the payload (no tag type or name).
    pub fn write_payload(&self, encoding: NbtEncoding, buf: &mut BytesMut) {
        Writer { buf, encoding }.payload(self);
    }

    /// Read a named root tag. Returns the root name and its value.
    pub fn read_root(buf: &mut BytesMut, encoding: NbtEncoding) -> NbtResult<(String, NbtValue)> {
        let mut r = Reader { buf, encoding, depth: 0 };
        let tag = r.u8()?;
        if tag == TAG_END {
            return Err(NbtError::UnknownTag(tag));
        }
        let name = r.string()?;
        let value = r.payload(tag)?;
        Ok((name, value))
    }
}

/// Read a root tag and discard its name.
pub fn read_compound(buf: &mut BytesMut, encoding: NbtEncoding) -> NbtResult<NbtValue> {
    NbtValue::read_root(buf, encoding).map(|(_, value)| value)
}

/// Write a value as a root tag with an empty name.
pub fn write_compound(value: &NbtValue, encoding: NbtEncoding, buf: &mut BytesMut) {
    value.write_root("", encoding, buf);
}

struct Writer<'a> {
    buf: &'a mut BytesMut,
    encoding: NbtEncoding,
}

impl Writer<'_> {
    fn i16(&mut self, v: i16) {
        match self.encoding {
            NbtEncoding::BigEndian => self.buf.put_i16(v),
            _ => self.buf.put_i16_le(v),
        }
    }

    fn i32(&mut self, v: i32) {
        match self.encoding {
            NbtEncoding::BigEndian => self.buf.put_i32(v),
            NbtEncoding::LittleEndian => self.buf.put_i32_le(v),
            NbtEncoding::NetworkLittleEndian => put_varuint(self.buf, zigzag32(v) as u64),
        }
    }

    fn i64(&mut self, v: i64) {
        match self.encoding {
            NbtEncoding::BigEndian => self.buf.put_i64(v),
            NbtEncoding::LittleEndian => self.buf.put_i64_le(v),
            NbtEncoding::NetworkLittleEndian => put_varuint(self.buf, zigzag64(v)),
        }
    }

    fn f32(&mut self, v: f32) {
        match self.encoding {
            NbtEncoding::BigEndian => self.buf.put_f32(v),
            _ => self.buf.put_f32_le(v),
        }
    }

    fn f64(&mut self, v: f64) {
        match self.encoding {
            NbtEncoding::BigEndian => self.buf.put_f64(v),
            _ => self.buf.put_f64_le(v),
        }
    }

    fn string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        match self.encoding {
            NbtEncoding::BigEndian => self.buf.put_u16(bytes.len() as u16),
            NbtEncoding::LittleEndian => self.buf.put_u16_le(bytes.len() as u16),
            NbtEncoding::NetworkLittleEndian => put_varuint(self.buf, bytes.len() as u64),
        }
        self.buf.put_slice(bytes);
    }

    fn payload(&mut self, value: &NbtValue) {
        match value {
            NbtValue::Byte(v) => self.buf.put_i8(*v),
            NbtValue::Short(v) => self.i16(*v),
            NbtValue::Int(v) => self.i32(*v),
            NbtValue::Long(v) => self.i64(*v),
            NbtValue::Float(v) => self.f32(*v),
            NbtValue::Double(v) => self.f64(*v),
            NbtValue::ByteArray(v) => {
                self.i32(v.len() as i32);
                for b in v {
                    self.buf.put_i8(*b);
                }
            }
            NbtValue::String(v) => self.string(v),
            NbtValue::List(v) => {
                let tag = v.first().map(NbtValue::tag_id).unwrap_or(TAG_END);
                self.buf.put_u8(tag);
                self.i32(v.len() as i32);
                for item in v {
                    self.payload(item);
                }
            }
            NbtValue::Compound(entries) => {
                for (name, value) in entries {
                    self.buf.put_u8(value.tag_id());
                    self.string(name);
                    self.payload(value);
                }
                self.buf.put_u8(TAG_END);
            }
            NbtValue::IntArray(v) => {
                self.i32(v.len() as i32);
                for i in v {
                    self.i32(*i);
                }
            }
            NbtValue::LongArray(v) => {
                self.i32(v.len() as i32);
                for l in v {
                    self.i64(*l);
                }
            }
        }
    }
}

struct Reader<'a> {
    buf: &'a mut BytesMut,
    encoding: NbtEncoding,
    depth: usize,
}

impl Reader<'_> {
    fn need(&self, n: usize) -> NbtResult<()> {
        if self.buf.remaining() < n {
            return Err(NbtError::NotEnoughData);
        }
        Ok(())
    }

    fn u8(&mut self) -> NbtResult<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    fn i16(&mut self) -> NbtResult<i16> {
        self.need(2)?;
        Ok(match self.encoding {
            NbtEncoding::BigEndian => self.buf.get_i16(),
            _ => self.buf.get_i16_le(),
        })
    }

    fn i32(&mut self) -> NbtResult<i32> {
        match self.encoding {
            NbtEncoding::BigEndian => {
                self.need(4)?;
                Ok(self.buf.get_i32())
            }
            NbtEncoding::LittleEndian => {
                self.need(4)?;
                Ok(self.buf.get_i32_le())
            }
            NbtEncoding::NetworkLittleEndian => {
                let raw = get_varuint(self.buf, 35)? as u32;
                Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
            }
        }
    }

    fn i64(&mut self) -> NbtResult<i64> {
        match self.encoding {
            NbtEncoding::BigEndian => {
                self.need(8)?;
                Ok(self.buf.get_i64())
            }
            NbtEncoding::LittleEndian => {
                self.need(8)?;
                Ok(self.buf.get_i64_le())
            }
            NbtEncoding::NetworkLittleEndian => {
                let raw = get_varuint(self.buf, 70)?;
                Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
            }
        }
    }

    fn f32(&mut self) -> NbtResult<f32> {
        self.need(4)?;
        Ok(match self.encoding {
            NbtEncoding::BigEndian => self.buf.get_f32(),
            _ => self.buf.get_f32_le(),
        })
    }

    fn f64(&mut self) -> NbtResult<f64> {
        self.need(8)?;
        Ok(match self.encoding {
            NbtEncoding::BigEndian => self.buf.get_f64(),
            _ => self.buf.get_f64_le(),
        })
    }

    fn len(&mut self) -> NbtResult<usize> {
        let len = self.i32()?;
        if len < 0 {
            return Err(NbtError::NegativeLength(len));
        }
        Ok(len as usize)
    }

    fn string(&mut self) -> NbtResult<String> {
        let len = match self.encoding {
            NbtEncoding::BigEndian => self.i16()? as u16 as usize,
            NbtEncoding::LittleEndian => self.i16()? as u16 as usize,
            NbtEncoding::NetworkLittleEndian => get_varuint(self.buf, 35)? as usize,
        };
        self.need(len)?;
        let bytes = self.buf.split_to(len);
        String::from_utf8(bytes.to_vec()).map_err(|_| NbtError::InvalidString)
    }

    fn payload(&mut self, tag: u8) -> NbtResult<NbtValue> {
        Ok(match tag {
            TAG_BYTE => NbtValue::Byte(self.u8()? as i8),
            TAG_SHORT => NbtValue::Short(self.i16()?),
            TAG_INT => NbtValue::Int(self.i32()?),
            TAG_LONG => NbtValue::Long(self.i64()?),
            TAG_FLOAT => NbtValue::Float(self.f32()?),
            TAG_DOUBLE => NbtValue::Double(self.f64()?),
            TAG_BYTE_ARRAY => {
                let len = self.len()?;
                self.need(len)?;
                let bytes = self.buf.split_to(len);
                NbtValue::ByteArray(bytes.iter().map(|b| *b as i8).collect())
            }
            TAG_STRING => NbtValue::String(self.string()?),
            TAG_LIST => {
                self.enter()?;
                let inner = self.u8()?;
                let len = self.len()?;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.payload(inner)?);
                }
                self.depth -= 1;
                NbtValue::List(items)
            }
            TAG_COMPOUND => {
                self.enter()?;
                let mut entries = Vec::new();
                loop {
                    let inner = self.u8()?;
                    if inner == TAG_END {
                        break;
                    }
                    let name = self.string()?;
                    entries.push((name, self.payload(inner)?));
                }
                self.depth -= 1;
                NbtValue::Compound(entries)
            }
            TAG_INT_ARRAY => {
                let len = self.len()?;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.i32()?);
                }
                NbtValue::IntArray(items)
            }
            TAG_LONG_ARRAY => {
                let len = self.len()?;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.i64()?);
                }
                NbtValue::LongArray(items)
            }
            other => return Err(NbtError::UnknownTag(other)),
        })
    }

    fn enter(&mut self) -> NbtResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(NbtError::DepthExceeded);
        }
        Ok(())
    }
}

fn zigzag32(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

fn zigzag64(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn put_varuint(buf: &mut BytesMut, mut value: u64) {
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

fn get_varuint(buf: &mut BytesMut, max_shift: u32) -> NbtResult<u64> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(NbtError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= max_shift {
            return Err(NbtError::VarIntTooBig);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{nbt_compound, nbt_list};

    fn sample() -> NbtValue {
        nbt_compound! {
            "name" => NbtValue::String("minecraft:oak_sign".into()),
            "states" => nbt_compound! {
                "ground_sign_direction" => NbtValue::Int(-7),
            },
            "version" => NbtValue::Int(18_100_737),
            "time" => NbtValue::Long(-1),
            "scale" => NbtValue::Float(0.5),
            "list" => nbt_list![NbtValue::Short(3), NbtValue::Short(-4)],
            "ints" => NbtValue::IntArray(vec![1, -2, 300]),
            "bytes" => NbtValue::ByteArray(vec![1, -1]),
        }
    }

    #[test]
    fn test_roundtrip_all_encodings() {
        for encoding in [
            NbtEncoding::BigEndian,
            NbtEncoding::LittleEndian,
            NbtEncoding::NetworkLittleEndian,
        ] {
            let mut buf = BytesMut::new();
            sample().write_root("root", encoding, &mut buf);
            let (name, value) = NbtValue::read_root(&mut buf, encoding).unwrap();
            assert_eq!(name, "root");
            assert_eq!(value, sample(), "{:?}", encoding);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_network_int_is_zigzag_varint() {
        let mut buf = BytesMut::new();
        NbtValue::Int(-1).write_payload(NbtEncoding::NetworkLittleEndian, &mut buf);
        assert_eq!(&buf[..], &[0x01]);

        let mut buf = BytesMut::new();
        NbtValue::Int(64).write_payload(NbtEncoding::NetworkLittleEndian, &mut buf);
        assert_eq!(&buf[..], &[0x80, 0x01]);
    }

    #[test]
    fn test_little_endian_string_prefix() {
        let mut buf = BytesMut::new();
        NbtValue::String("ab".into()).write_payload(NbtEncoding::LittleEndian, &mut buf);
        assert_eq!(&buf[..], &[2, 0, b'a', b'b']);
    }

    #[test]
    fn test_truncated_input() {
        let mut buf = BytesMut::new();
        sample().write_root("", NbtEncoding::LittleEndian, &mut buf);
        buf.truncate(buf.len() - 3);
        assert!(matches!(
            read_compound(&mut buf, NbtEncoding::LittleEndian),
            Err(NbtError::NotEnoughData)
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut buf = BytesMut::new();
        buf.put_u8(TAG_LIST);
        buf.put_u16_le(0);
        for _ in 0..=MAX_DEPTH {
            buf.put_u8(TAG_LIST);
            buf.put_i32_le(1);
        }
        assert!(matches!(
            read_compound(&mut buf, NbtEncoding::LittleEndian),
            Err(NbtError::DepthExceeded)
        ));
    }

    #[test]
    fn test_consecutive_roots() {
        let mut buf = BytesMut::new();
        write_compound(&nbt_compound! { "a" => NbtValue::Byte(1) }, NbtEncoding::NetworkLittleEndian, &mut buf);
        write_compound(&nbt_compound! { "b" => NbtValue::Byte(2) }, NbtEncoding::NetworkLittleEndian, &mut buf);
        let first = read_compound(&mut buf, NbtEncoding::NetworkLittleEndian).unwrap();
        let second = read_compound(&mut buf, NbtEncoding::NetworkLittleEndian).unwrap();
        assert_eq!(first.get("a"), Some(&NbtValue::Byte(1)));
        assert_eq!(second.get("b"), Some(&NbtValue::Byte(2)));
    }
}
