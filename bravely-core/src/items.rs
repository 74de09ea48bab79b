use std::collections::HashMap;

use crate::container::Container;
use crate::layout::{ItemColumns, Layout, TableRef};
use crate::{RandomizerError, Result};

/// Item ids and names, read once. Ids are unique; names are not (an item
/// and a spell can share one).
#[derive(Clone, Debug)]
pub(crate) struct ItemCatalog {
    table: TableRef,
    cols: ItemColumns,
    ids: Vec<u32>,
    names: Vec<String>,
    rows: HashMap<u32, usize>,
}

impl ItemCatalog {
    pub fn load(container: &Container, layout: &Layout) -> Result<Self> {
        let view = container.view(layout.items)?;
        let cols = layout.item_cols;
        let ids = view.read_column(cols.id)?;
        let names = view.read_strings(cols.name)?;
        let rows = ids.iter().enumerate().map(|(row, &id)| (id, row)).collect();
        Ok(Self {
            table: layout.items,
            cols,
            ids,
            names,
            rows,
        })
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.rows.get(&id).map(|&row| self.names[row].as_str())
    }

    pub fn display_name(&self, id: u32) -> String {
        self.name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("Item #{id}"))
    }

    pub fn is_dummy(&self, id: u32) -> bool {
        self.name(id).map_or(false, |n| n.contains("Dummy"))
    }

    fn row(&self, id: u32) -> Result<usize> {
        self.rows.get(&id).copied().ok_or_else(|| {
            RandomizerError::Contract(format!("item {id} is not in {}", self.table))
        })
    }

    fn read(&self, container: &Container, id: u32, col: usize) -> Result<u32> {
        container.view(self.table)?.read_value(self.row(id)?, col)
    }

    fn write(&self, container: &mut Container, id: u32, col: usize, value: u32) -> Result<()> {
        let row = self.row(id)?;
        container.view_mut(self.table)?.patch_value(value, row, col)
    }

    pub fn order(&self, container: &Container, id: u32) -> Result<u32> {
        self.read(container, id, self.cols.order)
    }

    pub fn icon(&self, container: &Container, id: u32) -> Result<u32> {
        self.read(container, id, self.cols.icon)
    }

    pub fn cost(&self, container: &Container, id: u32) -> Result<u32> {
        self.read(container, id, self.cols.cost)
    }

    pub fn set_order(&self, container: &mut Container, id: u32, value: u32) -> Result<()> {
        self.write(container, id, self.cols.order, value)
    }

    pub fn set_icon(&self, container: &mut Container, id: u32, value: u32) -> Result<()> {
        self.write(container, id, self.cols.icon, value)
    }

    /// Sets the buy price; the sell price follows at half.
    pub fn set_cost(&self, container: &mut Container, id: u32, value: u32) -> Result<()> {
        self.write(container, id, self.cols.cost, value)?;
        self.write(container, id, self.cols.sell, value / 2)
    }

    pub fn change_cost_by_name(&self, container: &mut Container, name: &str, value: u32) -> Result<()> {
        let mut matches = self.names.iter().enumerate().filter(|(_, n)| *n == name);
        let id = match (matches.next(), matches.next()) {
            (Some((row, _)), None) => self.ids[row],
            (None, _) => {
                return Err(RandomizerError::Contract(format!(
                    "{name} does not exist in the item table"
                )))
            }
            (Some(_), Some(_)) => {
                return Err(RandomizerError::Contract(format!(
                    "{name} is not unique in the item table"
                )))
            }
        };
        self.set_cost(container, id, value)
    }
}
