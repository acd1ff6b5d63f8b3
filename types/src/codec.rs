//! Canonical encoding helpers shared by messages and transactions.
//!
//! Strings are written as a `u32` big-endian byte length followed by UTF-8
//! bytes. Transport frames are a varint byte length followed by the body.

use bytes::{Buf, BufMut};
use commonware_codec::{varint::UInt, EncodeSize, Error, ReadExt, Write};

/// Write a string as length-prefixed UTF-8 bytes.
pub fn write_string(s: &str, writer: &mut impl BufMut) {
    let bytes = s.as_bytes();
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

/// Read a length-prefixed UTF-8 string of at most `max_len` bytes.
pub fn read_string(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("String", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::Invalid("String", "invalid UTF-8"))
}

/// Encoded size of a string written with [write_string].
pub fn string_encode_size(s: &str) -> usize {
    4 + s.len()
}

/// Frame `body` with a varint length prefix.
pub fn length_prefix(body: &[u8]) -> Vec<u8> {
    let prefix = UInt(body.len() as u64);
    let mut framed = Vec::with_capacity(prefix.encode_size() + body.len());
    prefix.write(&mut framed);
    framed.put_slice(body);
    framed
}

/// Strip a varint length prefix, requiring the frame to cover the rest of
/// `framed` exactly.
pub fn strip_length_prefix(framed: &[u8]) -> Result<&[u8], Error> {
    let mut reader = framed;
    let len: u64 = UInt::<u64>::read(&mut reader)?.into();
    let len = usize::try_from(len).map_err(|_| Error::Invalid("Frame", "length overflow"))?;
    match reader.len() {
        remaining if remaining < len => Err(Error::EndOfBuffer),
        remaining if remaining > len => Err(Error::ExtraData(remaining - len)),
        _ => Ok(reader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msg::MAX_SYMBOL_LENGTH;
    use bytes::BytesMut;

    #[test]
    fn string_round_trips() {
        let mut buf = BytesMut::new();
        write_string("BNB_NNB", &mut buf);
        assert_eq!(buf.len(), string_encode_size("BNB_NNB"));

        let mut reader = buf.as_ref();
        assert_eq!(read_string(&mut reader, 16).unwrap(), "BNB_NNB");
        assert!(reader.is_empty());
    }

    #[test]
    fn symbol_longer_than_cap_is_rejected() {
        let symbol = "N".repeat(MAX_SYMBOL_LENGTH + 1);
        let mut buf = BytesMut::new();
        write_string(&symbol, &mut buf);

        let mut reader = buf.as_ref();
        assert!(matches!(
            read_string(&mut reader, MAX_SYMBOL_LENGTH),
            Err(Error::Invalid("String", "too long"))
        ));

        let mut reader = buf.as_ref();
        assert_eq!(read_string(&mut reader, symbol.len()).unwrap(), symbol);
    }

    #[test]
    fn symbol_cut_short_is_rejected() {
        let mut buf = BytesMut::new();
        write_string("BNB_NNB", &mut buf);
        buf.truncate(buf.len() - 3);

        let mut reader = buf.as_ref();
        assert!(matches!(
            read_string(&mut reader, MAX_SYMBOL_LENGTH),
            Err(Error::EndOfBuffer)
        ));
    }

    #[test]
    fn symbol_with_invalid_utf8_is_rejected() {
        let mut buf = BytesMut::new();
        write_string("NNB", &mut buf);
        let last = buf.len() - 1;
        buf[last] = 0xc3;

        let mut reader = buf.as_ref();
        assert!(matches!(
            read_string(&mut reader, MAX_SYMBOL_LENGTH),
            Err(Error::Invalid("String", "invalid UTF-8"))
        ));
    }

    #[test]
    fn length_prefix_frames_body() {
        let framed = length_prefix(b"abc");
        assert_eq!(framed, vec![3, b'a', b'b', b'c']);
        assert_eq!(strip_length_prefix(&framed).unwrap(), b"abc");
    }

    #[test]
    fn strip_length_prefix_rejects_bad_frames() {
        assert!(matches!(
            strip_length_prefix(&[4, 1, 2, 3]),
            Err(Error::EndOfBuffer)
        ));
        assert!(matches!(
            strip_length_prefix(&[2, 1, 2, 3]),
            Err(Error::ExtraData(1))
        ));
    }
}
