use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::buffer::ByteBuffer;
use crate::index::RecordIndex;
use crate::layout::{Layout, RegionKind, TableRef};
use crate::table::{Table, TableView, TableViewMut};
use crate::{RandomizerError, Result};

pub const INDEX_FILE: &str = "index.fs";
pub const PAYLOAD_FILE: &str = "crowd.fs";

/// One loaded payload file and the tables that live inside it.
#[derive(Clone, Debug)]
pub struct Region {
    name: String,
    path: PathBuf,
    kind: RegionKind,
    index: Option<RecordIndex>,
    payload: ByteBuffer,
    tables: Vec<Table>,
    by_name: HashMap<String, usize>,
}

impl Region {
    pub fn from_crowd(name: &str, path: impl Into<PathBuf>, index: Vec<u8>, payload: Vec<u8>) -> Result<Self> {
        let index = RecordIndex::parse(&mut ByteBuffer::new(index))?;
        let payload = ByteBuffer::new(payload);
        let tables = index
            .entries()
            .iter()
            .map(|entry| Table::parse(&payload, &entry.name, entry.base as usize))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::assemble(name, path.into(), RegionKind::Crowd, Some(index), payload, tables))
    }

    pub fn from_standalone(name: &str, path: impl Into<PathBuf>, payload: Vec<u8>) -> Result<Self> {
        let path = path.into();
        let table_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| RandomizerError::Config(format!("{} has no file name", path.display())))?;
        let payload = ByteBuffer::new(payload);
        let table = Table::parse(&payload, &table_name, 0)?;
        Ok(Self::assemble(name, path, RegionKind::Standalone, None, payload, vec![table]))
    }

    fn assemble(
        name: &str,
        path: PathBuf,
        kind: RegionKind,
        index: Option<RecordIndex>,
        payload: ByteBuffer,
        tables: Vec<Table>,
    ) -> Self {
        let by_name = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();
        Self {
            name: name.to_string(),
            path,
            kind,
            index,
            payload,
            tables,
            by_name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location relative to the romfs root.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    pub fn index(&self) -> Option<&RecordIndex> {
        self.index.as_ref()
    }

    pub fn payload(&self) -> &ByteBuffer {
        &self.payload
    }

    /// Relative path of the payload file this region writes back.
    pub fn payload_path(&self) -> PathBuf {
        match self.kind {
            RegionKind::Crowd => self.path.join(PAYLOAD_FILE),
            RegionKind::Standalone => self.path.clone(),
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.by_name.get(name).map(|&i| &self.tables[i])
    }

    pub fn view(&self, name: &str) -> Result<TableView<'_>> {
        let table = self.table(name).ok_or_else(|| self.missing(name))?;
        Ok(table.view(&self.payload))
    }

    pub fn view_mut(&mut self, name: &str) -> Result<TableViewMut<'_>> {
        match self.by_name.get(name) {
            Some(&i) => Ok(self.tables[i].view_mut(&mut self.payload)),
            None => Err(self.missing(name)),
        }
    }

    fn missing(&self, name: &str) -> RandomizerError {
        RandomizerError::MissingTable {
            region: self.name.clone(),
            name: name.to_string(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Container {
    regions: Vec<Region>,
}

impl Container {
    pub fn from_regions(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn load(root: &Path, layout: &Layout) -> Result<Self> {
        let mut regions = Vec::with_capacity(layout.regions.len());
        for spec in &layout.regions {
            let path = PathBuf::from(spec.path);
            let region = match spec.kind {
                RegionKind::Crowd => {
                    let dir = root.join(&path);
                    Region::from_crowd(
                        spec.name,
                        path,
                        read_region_file(&dir.join(INDEX_FILE))?,
                        read_region_file(&dir.join(PAYLOAD_FILE))?,
                    )?
                }
                RegionKind::Standalone => {
                    let bytes = read_region_file(&root.join(&path))?;
                    Region::from_standalone(spec.name, path, bytes)?
                }
            };
            debug!(region = spec.name, tables = region.tables().len(), "region loaded");
            regions.push(region);
        }
        Ok(Self { regions })
    }

    /// Loads every directory under `root` that holds an index/payload pair.
    /// Regions are named by their path relative to `root`.
    pub fn discover(root: &Path) -> Result<Self> {
        let mut regions = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| RandomizerError::Io(e.into()))?;
            if !entry.file_type().is_file() || entry.file_name() != INDEX_FILE {
                continue;
            }
            let Some(dir) = entry.path().parent() else {
                continue;
            };
            let payload = dir.join(PAYLOAD_FILE);
            if !payload.is_file() {
                continue;
            }
            let relative = dir.strip_prefix(root).unwrap_or(dir).to_path_buf();
            let name = relative.to_string_lossy().replace('\\', "/");
            regions.push(Region::from_crowd(
                &name,
                relative,
                fs::read(entry.path())?,
                fs::read(&payload)?,
            )?);
        }
        Ok(Self { regions })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Result<&Region> {
        self.regions
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| RandomizerError::MissingRegion(name.to_string()))
    }

    pub fn region_mut(&mut self, name: &str) -> Result<&mut Region> {
        self.regions
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| RandomizerError::MissingRegion(name.to_string()))
    }

    pub fn has_table(&self, table: TableRef) -> bool {
        self.region(table.region)
            .map(|r| r.table(table.table).is_some())
            .unwrap_or(false)
    }

    pub fn view(&self, table: TableRef) -> Result<TableView<'_>> {
        self.region(table.region)?.view(table.table)
    }

    pub fn view_mut(&mut self, table: TableRef) -> Result<TableViewMut<'_>> {
        self.region_mut(table.region)?.view_mut(table.table)
    }

    /// Writes every payload under `out`, mirroring the romfs layout. Index
    /// files are never rewritten. Returns the paths written.
    pub fn dump(&self, out: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.regions.len());
        for region in &self.regions {
            let dest = out.join(region.payload_path());
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, region.payload.as_bytes())?;
            debug!(path = %dest.display(), "payload written");
            written.push(dest);
        }
        Ok(written)
    }

    // Every write is checked before any byte changes.
    pub fn apply(&mut self, batch: PatchBatch) -> Result<()> {
        for write in &batch.writes {
            let region = self.region(&write.region)?;
            let table = region
                .table(&write.table)
                .ok_or_else(|| region.missing(&write.table))?;
            table.check_cell(write.row, write.col)?;
        }
        for write in batch.writes {
            self.region_mut(&write.region)?
                .view_mut(&write.table)?
                .patch_value(write.value, write.row, write.col)?;
        }
        Ok(())
    }
}

#[cfg(test)]
impl Container {
    pub(crate) fn from_fixture(regions: Vec<crate::testing::FixtureRegion>) -> Self {
        let regions = regions
            .into_iter()
            .map(|r| match r.index {
                Some(index) => Region::from_crowd(r.name, r.path, index, r.payload),
                None => Region::from_standalone(r.name, r.path, r.payload),
            })
            .collect::<Result<Vec<_>>>()
            .expect("fixture regions parse");
        Self { regions }
    }
}

fn read_region_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RandomizerError::Config(format!("Could not find {}", path.display()))
        } else {
            RandomizerError::Io(e)
        }
    })
}

#[derive(Clone, Debug)]
struct CellWrite {
    region: String,
    table: String,
    row: usize,
    col: usize,
    value: u32,
}

/// Cell writes across several tables that must land together.
#[derive(Clone, Debug, Default)]
pub struct PatchBatch {
    writes: Vec<CellWrite>,
}

impl PatchBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, region: &str, table: &str, row: usize, col: usize, value: u32) {
        self.writes.push(CellWrite {
            region: region.to_string(),
            table: table.to_string(),
            row,
            col,
            value,
        });
    }

    pub fn set_column(&mut self, region: &str, table: &str, col: usize, values: &[u32]) {
        for (row, &value) in values.iter().enumerate() {
            self.set(region, table, row, col, value);
        }
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}
