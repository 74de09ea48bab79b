use std::collections::{HashMap, HashSet};

use crate::buffer::{ByteBuffer, Width};
use crate::{RandomizerError, Result};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexEntry {
    pub name: String,
    pub base: u32,
    pub size: u32,
    pub checksum: u32,
}

/// Subfile directory of one region, resolved once at load time.
#[derive(Clone, Debug, Default)]
pub struct RecordIndex {
    entries: Vec<IndexEntry>,
    by_name: HashMap<String, usize>,
}

impl RecordIndex {
    // Records are `{next, base, size, checksum, name}`. The record whose
    // `next` is zero is still read, then ends the chain.
    pub fn parse(buffer: &mut ByteBuffer) -> Result<Self> {
        let mut index = RecordIndex::default();
        let mut visited = HashSet::new();

        buffer.seek(0);
        let mut next = buffer.read_cursor(Width::Word)?;
        loop {
            let base = buffer.read_cursor(Width::Word)?;
            let size = buffer.read_cursor(Width::Word)?;
            let checksum = buffer.read_cursor(Width::Word)?;
            let name = buffer.read_string(None, Width::Byte)?;
            index.push(IndexEntry {
                name,
                base,
                size,
                checksum,
            })?;

            if next == 0 {
                break;
            }
            let address = next as usize;
            if !visited.insert(address) {
                return Err(RandomizerError::CorruptHeader(format!(
                    "index chain revisits record at 0x{address:X}"
                )));
            }
            buffer.seek(address);
            next = buffer.read_cursor(Width::Word)?;
        }

        Ok(index)
    }

    fn push(&mut self, entry: IndexEntry) -> Result<()> {
        if self.by_name.contains_key(&entry.name) {
            return Err(RandomizerError::CorruptHeader(format!(
                "subfile {} appears twice in one index",
                entry.name
            )));
        }
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    pub fn base_of(&self, name: &str) -> Option<u32> {
        self.get(name).map(|e| e.base)
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_map(&self) -> HashMap<String, u32> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.base))
            .collect()
    }
}
