use crate::error::{Error, Result};
use crate::util::TakeBytes;
use crc::{CRC_32_ISO_HDLC, Crc};
use std::fmt::{self, Display};
use std::str::from_utf8;

pub const STANDARD_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

static CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkType([u8; 4]);

impl TryFrom<[u8; 4]> for ChunkType {
    type Error = Error;

    fn try_from(value: [u8; 4]) -> Result<Self> {
        if value.iter().all(u8::is_ascii_alphabetic) {
            Ok(ChunkType(value))
        } else {
            Err(Error::verify(format!("invalid chunk type {value:?}")))
        }
    }
}

impl Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Alphabetic by construction, so always valid UTF-8.
        f.write_str(from_utf8(&self.0).map_err(|_| fmt::Error)?)
    }
}

impl ChunkType {
    pub fn bytes(&self) -> [u8; 4] {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    chunk_type: ChunkType,
    data: Vec<u8>,
    crc: u32,
}

impl Chunk {
    pub fn new(chunk_type: ChunkType, data: Vec<u8>) -> Chunk {
        let mut digest = CRC.digest();
        digest.update(&chunk_type.bytes());
        digest.update(&data);
        Chunk {
            chunk_type,
            data,
            crc: digest.finalize(),
        }
    }

    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }
}

impl Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-byte {} chunk, crc {:08x}",
            self.data.len(),
            self.chunk_type,
            self.crc
        )
    }
}

/// Fields of the IHDR chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlace: u8,
}

impl ImageHeader {
    pub const COLOR_TYPE_RGBA: u8 = 6;

    fn from_chunk(chunk: &Chunk) -> Result<Self> {
        let data = chunk.data();
        if chunk.chunk_type().bytes() != *b"IHDR" || data.len() != 13 {
            return Err(Error::verify(format!("malformed header chunk: {chunk}")));
        }
        Ok(ImageHeader {
            width: u32::from_be_bytes([data[0], data[1], data[2], data[3]]),
            height: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            bit_depth: data[8],
            color_type: data[9],
            interlace: data[12],
        })
    }
}

/// Splits a byte stream into chunks, checking length and CRC of each.
pub struct Parser<I>
where
    I: Iterator<Item = u8>,
{
    byte_stream: I,
}

pub trait Parse {
    fn parse_chunks(self) -> Parser<Self>
    where
        Self: Sized,
        Self: Iterator<Item = u8>;
}

impl<I> Parse for I
where
    I: Iterator<Item = u8>,
{
    fn parse_chunks(self) -> Parser<I> {
        Parser { byte_stream: self }
    }
}

impl<I: Iterator<Item = u8>> Iterator for Parser<I> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        let length = u32::from_be_bytes(self.byte_stream.take_array()?) as usize;
        Some(self.read_body(length))
    }
}

impl<I: Iterator<Item = u8>> Parser<I> {
    fn read_body(&mut self, length: usize) -> Result<Chunk> {
        let truncated = || Error::verify("truncated chunk");
        let type_bytes = self.byte_stream.take_array::<4>().ok_or_else(truncated)?;
        let chunk_type = ChunkType::try_from(type_bytes)?;
        let data = self.byte_stream.take_vec(length).ok_or_else(truncated)?;
        let crc_bytes = self.byte_stream.take_array::<4>().ok_or_else(truncated)?;
        let stored_crc = u32::from_be_bytes(crc_bytes);

        let chunk = Chunk::new(chunk_type, data);
        if chunk.crc() != stored_crc {
            return Err(Error::verify(format!(
                "{chunk_type} chunk crc {stored_crc:08x} does not match computed {:08x}",
                chunk.crc()
            )));
        }
        Ok(chunk)
    }
}

pub fn read_chunks(bytes: &[u8]) -> Result<Vec<Chunk>> {
    if bytes.len() < STANDARD_HEADER.len() || bytes[..STANDARD_HEADER.len()] != STANDARD_HEADER {
        return Err(Error::verify("missing PNG signature"));
    }
    bytes[STANDARD_HEADER.len()..]
        .iter()
        .copied()
        .parse_chunks()
        .collect()
}

/// Checks chunk integrity and layout of an encoded 8-bit RGBA PNG.
pub fn verify_rgba8(bytes: &[u8], width: u32, height: u32) -> Result<ImageHeader> {
    let chunks = read_chunks(bytes)?;
    for chunk in &chunks {
        tracing::trace!("{chunk}");
    }

    let first = chunks.first().ok_or_else(|| Error::verify("no chunks"))?;
    let header = ImageHeader::from_chunk(first)?;
    if !chunks.iter().any(|c| c.chunk_type().bytes() == *b"IDAT") {
        return Err(Error::verify("no IDAT chunk"));
    }
    if chunks.last().map(|c| c.chunk_type().bytes()) != Some(*b"IEND") {
        return Err(Error::verify("last chunk is not IEND"));
    }

    let expected = ImageHeader {
        width,
        height,
        bit_depth: 8,
        color_type: ImageHeader::COLOR_TYPE_RGBA,
        interlace: header.interlace,
    };
    if header != expected {
        return Err(Error::verify(format!(
            "header {header:?} does not match expected {expected:?}"
        )));
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(kind: &[u8; 4], data: &[u8]) -> Chunk {
        Chunk::new(ChunkType::try_from(*kind).unwrap(), data.to_vec())
    }

    fn ihdr(width: u32, height: u32, color_type: u8) -> Chunk {
        let mut data = width.to_be_bytes().to_vec();
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[8, color_type, 0, 0, 0]);
        chunk(b"IHDR", &data)
    }

    fn file(chunks: &[Chunk]) -> Vec<u8> {
        let mut bytes = STANDARD_HEADER.to_vec();
        for c in chunks {
            bytes.extend_from_slice(&(c.data().len() as u32).to_be_bytes());
            bytes.extend_from_slice(&c.chunk_type().bytes());
            bytes.extend_from_slice(c.data());
            bytes.extend_from_slice(&c.crc().to_be_bytes());
        }
        bytes
    }

    #[test]
    fn iend_crc() {
        // Well-known constant from every PNG file.
        assert_eq!(chunk(b"IEND", &[]).crc(), 0xae42_6082);
    }

    #[test]
    fn chunk_type_rules() {
        assert!(ChunkType::try_from(*b"Ru1t").is_err());
        let t = ChunkType::try_from(*b"IDAT").unwrap();
        assert_eq!(t.to_string(), "IDAT");
    }

    #[test]
    fn accepts_well_formed_layout() {
        let bytes = file(&[ihdr(2, 1, 6), chunk(b"IDAT", &[1, 2, 3]), chunk(b"IEND", &[])]);
        let header = verify_rgba8(&bytes, 2, 1).unwrap();
        assert_eq!((header.width, header.height), (2, 1));
    }

    #[test]
    fn rejects_bad_crc() {
        let mut bytes = file(&[ihdr(2, 1, 6), chunk(b"IDAT", &[1, 2, 3]), chunk(b"IEND", &[])]);
        let idat_data = STANDARD_HEADER.len() + 25 + 8;
        bytes[idat_data] ^= 0xff;
        assert!(matches!(
            verify_rgba8(&bytes, 2, 1),
            Err(Error::Verify { .. })
        ));
    }

    #[test]
    fn rejects_wrong_layout() {
        let no_idat = file(&[ihdr(2, 1, 6), chunk(b"IEND", &[])]);
        assert!(verify_rgba8(&no_idat, 2, 1).is_err());

        let rgb = file(&[ihdr(2, 1, 2), chunk(b"IDAT", &[0]), chunk(b"IEND", &[])]);
        assert!(verify_rgba8(&rgb, 2, 1).is_err());

        let ok = file(&[ihdr(2, 1, 6), chunk(b"IDAT", &[0]), chunk(b"IEND", &[])]);
        assert!(verify_rgba8(&ok, 1, 2).is_err());

        let mut truncated = ok.clone();
        truncated.truncate(truncated.len() - 2);
        assert!(verify_rgba8(&truncated, 2, 1).is_err());

        assert!(verify_rgba8(b"not a png", 2, 1).is_err());
    }
}
