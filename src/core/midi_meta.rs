//! Embedded text fields of Standard MIDI Files
//!
//! Only the first track chunk is read: it carries the sequence name and the
//! copyright notice in every format-0 and format-1 file seen in practice.

use anyhow::{anyhow, bail, Result};
use std::path::Path;

use super::metadata::EmbeddedFields;

const META_COPYRIGHT: u8 = 0x02;
const META_TRACK_NAME: u8 = 0x03;
const META_END_OF_TRACK: u8 = 0x2F;

/// Read title and copyright from a MIDI file on disk
pub fn read_midi_fields(path: &Path) -> Result<EmbeddedFields> {
    let bytes = std::fs::read(path)?;
    parse_midi_fields(&bytes)
}

/// Parse title and copyright from the bytes of a MIDI file
pub fn parse_midi_fields(bytes: &[u8]) -> Result<EmbeddedFields> {
    let mut reader = ByteReader::new(bytes);

    if reader.take(4)? != b"MThd" {
        bail!("missing MThd header");
    }
    let header_len = reader.u32()? as usize;
    reader.take(header_len)?;

    // skip chunks until the first track
    loop {
        let id = reader.take(4)?;
        let len = reader.u32()? as usize;
        let body = reader.take(len)?;
        if id == b"MTrk" {
            return parse_track(body);
        }
    }
}

fn parse_track(track: &[u8]) -> Result<EmbeddedFields> {
    let mut reader = ByteReader::new(track);
    let mut fields = EmbeddedFields::default();
    let mut running_status: Option<u8> = None;

    while !reader.is_empty() {
        reader.vlq()?; // delta time

        let mut status = reader.u8()?;
        if status < 0x80 {
            // running status: the byte just read is the first data byte
            status = running_status.ok_or_else(|| anyhow!("data byte without status"))?;
            reader.rewind(1);
        }

        match status {
            0xFF => {
                let kind = reader.u8()?;
                let len = reader.vlq()? as usize;
                let data = reader.take(len)?;

                match kind {
                    META_TRACK_NAME if fields.title.is_none() => {
                        fields.title = decode_text(data);
                    }
                    META_COPYRIGHT if fields.copyright.is_none() => {
                        fields.copyright = decode_text(data);
                    }
                    META_END_OF_TRACK => break,
                    _ => {}
                }
            }
            0xF0 | 0xF7 => {
                let len = reader.vlq()? as usize;
                reader.take(len)?;
            }
            0x80..=0xEF => {
                running_status = Some(status);
                let data_len = if (0xC0..=0xDF).contains(&status) { 1 } else { 2 };
                reader.take(data_len)?;
            }
            other => bail!("unexpected status byte {:#04x}", other),
        }

        if fields.title.is_some() && fields.copyright.is_some() {
            break;
        }
    }

    Ok(fields)
}

fn decode_text(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| anyhow!("unexpected end of data"))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn rewind(&mut self, n: usize) {
        self.pos = self.pos.saturating_sub(n);
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Variable-length quantity, at most four bytes
    fn vlq(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        for _ in 0..4 {
            let byte = self.u8()?;
            value = (value << 7) | u32::from(byte & 0x7F);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        bail!("variable-length quantity too long")
    }
}
