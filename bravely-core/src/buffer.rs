use std::fs;
use std::path::Path;

use crate::{RandomizerError, Result};

/// Width of a little-endian integer field or string code unit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Width {
    Byte = 1,
    Half = 2,
    Word = 4,
}

impl Width {
    pub fn bytes(self) -> usize {
        self as usize
    }

    fn max_value(self) -> u32 {
        match self {
            Width::Byte => u8::MAX as u32,
            Width::Half => u16::MAX as u32,
            Width::Word => u32::MAX,
        }
    }
}

/// A fixed-size byte region loaded from disk with a read cursor.
///
/// The buffer is never resized. Reads past the end are reported as
/// [`RandomizerError::CorruptData`]; writes past the end are contract
/// violations because the caller computed a bad address.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    cursor: usize,
}

impl ByteBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, cursor: 0 }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(fs::read(path)?))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn seek(&mut self, address: usize) {
        self.cursor = address;
    }

    fn span(&self, address: usize, len: usize) -> Result<&[u8]> {
        address
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .map(|end| &self.data[address..end])
            .ok_or(RandomizerError::CorruptData {
                offset: address,
                len,
                size: self.data.len(),
            })
    }

    fn span_mut(&mut self, address: usize, len: usize) -> Result<&mut [u8]> {
        let size = self.data.len();
        match address.checked_add(len) {
            Some(end) if end <= size => Ok(&mut self.data[address..end]),
            _ => Err(RandomizerError::Contract(format!(
                "write of {len} bytes at 0x{address:X} exceeds buffer of {size} bytes"
            ))),
        }
    }

    pub fn read_int(&self, address: usize, width: Width) -> Result<u32> {
        let bytes = self.span(address, width.bytes())?;
        Ok(match width {
            Width::Byte => bytes[0] as u32,
            Width::Half => u16::from_le_bytes([bytes[0], bytes[1]]) as u32,
            Width::Word => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        })
    }

    pub fn read_cursor(&mut self, width: Width) -> Result<u32> {
        let value = self.read_int(self.cursor, width)?;
        self.cursor += width.bytes();
        Ok(value)
    }

    pub fn read_array(
        &self,
        address: usize,
        count: usize,
        stride: usize,
        width: Width,
    ) -> Result<Vec<u32>> {
        (0..count)
            .map(|i| self.read_int(address + i * stride, width))
            .collect()
    }

    /// Decodes the zero-terminated string at `address` without touching the
    /// cursor. Returns the text and the address after the terminator and any
    /// zero units that pad the slot (never past the end of the buffer).
    pub fn string_at(&self, address: usize, unit: Width) -> Result<(String, usize)> {
        let step = unit.bytes();
        let mut text = String::new();
        let mut at = address;
        loop {
            let code = self.read_int(at, unit)?;
            at += step;
            if code == 0 {
                break;
            }
            text.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
        }

        while at + step <= self.data.len() && self.read_int(at, unit)? == 0 {
            at += step;
        }

        Ok((text, at))
    }

    // Starts at the cursor when `address` is `None`.
    pub fn read_string(&mut self, address: Option<usize>, unit: Width) -> Result<String> {
        let (text, next) = self.string_at(address.unwrap_or(self.cursor), unit)?;
        self.cursor = next;
        Ok(text)
    }

    pub fn patch_int(&mut self, value: u32, address: usize, width: Width) -> Result<()> {
        if value > width.max_value() {
            return Err(RandomizerError::Contract(format!(
                "value {value} does not fit in a {}-byte field",
                width.bytes()
            )));
        }
        let bytes = value.to_le_bytes();
        self.span_mut(address, width.bytes())?
            .copy_from_slice(&bytes[..width.bytes()]);
        Ok(())
    }

    pub fn patch_array(
        &mut self,
        values: &[u32],
        address: usize,
        stride: usize,
        width: Width,
    ) -> Result<()> {
        // Validate the whole run first so a failure leaves the buffer untouched.
        if let Some(last) = values.len().checked_sub(1) {
            self.span_mut(address + last * stride, width.bytes())?;
        }
        for (i, &value) in values.iter().enumerate() {
            self.patch_int(value, address + i * stride, width)?;
        }
        Ok(())
    }

    /// Overwrites the string at `address` in place. The existing string's
    /// unit count is its allocation; a longer replacement is a
    /// [`RandomizerError::Format`] error and leaves the buffer unchanged.
    pub fn patch_string(&mut self, text: &str, address: usize, unit: Width) -> Result<()> {
        let capacity = self.string_at(address, unit)?.0.chars().count();

        let units: Vec<u32> = text.chars().map(|c| c as u32).collect();
        if units.len() > capacity {
            return Err(RandomizerError::Format(format!(
                "\"{}\" needs {} units but the slot at 0x{address:X} holds {capacity}",
                text.escape_debug(),
                units.len()
            )));
        }
        if let Some(&code) = units.iter().find(|&&code| code > unit.max_value()) {
            return Err(RandomizerError::Format(format!(
                "code point U+{code:04X} cannot be stored in {}-byte units",
                unit.bytes()
            )));
        }

        let step = unit.bytes();
        self.span_mut(address, capacity * step)?.fill(0);
        self.patch_array(&units, address, step, unit)
    }
}
