use crate::buffer::{ByteBuffer, Width};
use crate::{RandomizerError, Result};

/// Every cell is a 4-byte field regardless of its logical width.
pub const CELL_SIZE: usize = 4;

const HEADER_OFFSET: usize = 8;

/// Table header with all region offsets resolved to absolute addresses.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TableHeader {
    pub data_offset: usize,
    pub data_size: usize,
    pub label_offset: usize,
    pub label_size: usize,
    pub name_offset: usize,
    pub name_size: usize,
    pub stride: usize,
    pub row_count: usize,
}

/// Row/column layout of one subfile inside a payload buffer.
///
/// A `Table` holds no bytes itself; several tables share the payload buffer
/// of their region. Use [`TableView`] and [`TableViewMut`] to pair a table
/// with its buffer.
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    base: usize,
    header: TableHeader,
    labels: Vec<String>,
    names: Vec<String>,
}

impl Table {
    pub fn parse(buffer: &ByteBuffer, name: &str, base: usize) -> Result<Self> {
        let mut fields = [0usize; 8];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = buffer.read_int(base + HEADER_OFFSET + i * CELL_SIZE, Width::Word)? as usize;
        }
        let [data_offset, data_size, label_offset, label_size, name_offset, name_size, stride, row_count] =
            fields;

        let header = TableHeader {
            data_offset: base + data_offset,
            data_size,
            label_offset: base + label_offset,
            label_size,
            name_offset: base + name_offset,
            name_size,
            stride,
            row_count,
        };

        if stride.checked_mul(row_count) != Some(data_size) {
            return Err(RandomizerError::CorruptHeader(format!(
                "{name}: data size {data_size} is not stride {stride} x {row_count} rows"
            )));
        }
        for (offset, size) in [
            (header.data_offset, header.data_size),
            (header.label_offset, header.label_size),
            (header.name_offset, header.name_size),
        ] {
            if size > 0 && offset.checked_add(size).map_or(true, |end| end > buffer.len()) {
                return Err(RandomizerError::CorruptData {
                    offset,
                    len: size,
                    size: buffer.len(),
                });
            }
        }

        let labels = read_string_list(buffer, header.label_offset, header.label_size, Width::Byte)?;
        let names = read_string_list(buffer, header.name_offset, header.name_size, Width::Half)?;

        Ok(Self {
            name: name.to_string(),
            base,
            header,
            labels,
            names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn header(&self) -> &TableHeader {
        &self.header
    }

    pub fn row_count(&self) -> usize {
        self.header.row_count
    }

    pub fn stride(&self) -> usize {
        self.header.stride
    }

    pub fn column_count(&self) -> usize {
        self.header.stride / CELL_SIZE
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn row_of_label(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Absolute address of `(row, col)`; no bounds check.
    pub fn address(&self, row: usize, col: usize) -> usize {
        self.header.data_offset + col * CELL_SIZE + row * self.header.stride
    }

    fn cell(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.header.row_count || (col + 1) * CELL_SIZE > self.header.stride {
            return Err(RandomizerError::Contract(format!(
                "{}: cell ({row}, {col}) outside {} rows x {} columns",
                self.name,
                self.header.row_count,
                self.column_count()
            )));
        }
        Ok(self.address(row, col))
    }

    pub(crate) fn check_cell(&self, row: usize, col: usize) -> Result<()> {
        self.cell(row, col).map(|_| ())
    }

    fn string_address(&self, buffer: &ByteBuffer, row: usize, col: usize) -> Result<usize> {
        let offset = buffer.read_int(self.cell(row, col)?, Width::Word)? as usize;
        if offset >= self.header.name_size {
            return Err(RandomizerError::CorruptHeader(format!(
                "{}: string offset 0x{offset:X} at ({row}, {col}) is outside the name region",
                self.name
            )));
        }
        Ok(self.header.name_offset + offset)
    }

    pub fn view<'a>(&'a self, buffer: &'a ByteBuffer) -> TableView<'a> {
        TableView { table: self, buffer }
    }

    pub fn view_mut<'a>(&'a self, buffer: &'a mut ByteBuffer) -> TableViewMut<'a> {
        TableViewMut { table: self, buffer }
    }
}

fn read_string_list(
    buffer: &ByteBuffer,
    offset: usize,
    size: usize,
    unit: Width,
) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let end = offset + size;
    let mut at = offset;
    while size > 0 && at < end {
        let (text, next) = buffer.string_at(at, unit)?;
        strings.push(text);
        at = next;
    }
    Ok(strings)
}

#[derive(Clone, Copy)]
pub struct TableView<'a> {
    table: &'a Table,
    buffer: &'a ByteBuffer,
}

pub struct TableViewMut<'a> {
    table: &'a Table,
    buffer: &'a mut ByteBuffer,
}

macro_rules! read_methods {
    () => {
        pub fn table(&self) -> &Table {
            self.table
        }

        pub fn row_count(&self) -> usize {
            self.table.row_count()
        }

        pub fn read_value(&self, row: usize, col: usize) -> Result<u32> {
            self.buffer.read_int(self.table.cell(row, col)?, Width::Word)
        }

        pub fn read_column(&self, col: usize) -> Result<Vec<u32>> {
            self.read_column_from(col, 0, self.table.row_count())
        }

        /// Reads up to `count` values of `col` starting at `row_start`,
        /// clamped to the rows the table declares.
        pub fn read_column_from(&self, col: usize, row_start: usize, count: usize) -> Result<Vec<u32>> {
            let count = count.min(self.table.row_count().saturating_sub(row_start));
            if count == 0 {
                return Ok(Vec::new());
            }
            let address = self.table.cell(row_start, col)?;
            self.buffer
                .read_array(address, count, self.table.stride(), Width::Word)
        }

        /// Reads the name-region string that `(row, col)` points at.
        pub fn read_string(&self, row: usize, col: usize) -> Result<String> {
            let address = self.table.string_address(&*self.buffer, row, col)?;
            Ok(self.buffer.string_at(address, Width::Half)?.0)
        }

        pub fn read_strings(&self, col: usize) -> Result<Vec<String>> {
            (0..self.table.row_count())
                .map(|row| self.read_string(row, col))
                .collect()
        }
    };
}

impl<'a> TableView<'a> {
    read_methods!();
}

impl<'a> TableViewMut<'a> {
    read_methods!();

    pub fn patch_value(&mut self, value: u32, row: usize, col: usize) -> Result<()> {
        let address = self.table.cell(row, col)?;
        self.buffer.patch_int(value, address, Width::Word)
    }

    pub fn patch_column(&mut self, values: &[u32], col: usize) -> Result<()> {
        self.patch_column_from(values, col, 0)
    }

    pub fn patch_column_from(&mut self, values: &[u32], col: usize, row_start: usize) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        let address = self.table.cell(row_start, col)?;
        if row_start + values.len() > self.table.row_count() {
            return Err(RandomizerError::Contract(format!(
                "{}: {} values from row {row_start} exceed {} rows",
                self.table.name(),
                values.len(),
                self.table.row_count()
            )));
        }
        self.buffer
            .patch_array(values, address, self.table.stride(), Width::Word)
    }

    pub fn patch_string(&mut self, text: &str, row: usize, col: usize) -> Result<()> {
        let address = self.table.string_address(&*self.buffer, row, col)?;
        self.buffer.patch_string(text, address, Width::Half)
    }
}
