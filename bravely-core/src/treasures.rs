use std::collections::BTreeSet;

use tracing::debug;

use crate::container::{Container, PatchBatch};
use crate::items::ItemCatalog;
use crate::layout::{Layout, TreasureLayout};
use crate::shuffle::{CandidatePool, Draw};
use crate::{RandomizerError, Result};

const ITEM_COL: usize = 1;
const MONEY_COL: usize = 2;
const COUNT_COL: usize = 3;

/// Contents of one chest: an item with a count, or money.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Chest {
    pub item: u32,
    pub money: u32,
    pub count: u32,
}

impl Chest {
    pub fn is_empty(&self) -> bool {
        self.item == 0 && self.money == 0 && self.count == 0
    }
}

fn layout_of(layout: &Layout) -> Result<&TreasureLayout> {
    layout
        .treasures
        .as_ref()
        .ok_or_else(|| RandomizerError::Contract(format!("{} has no treasure tables", layout.edition)))
}

/// Chest tables in index order, message table excluded.
pub(crate) fn chest_tables(container: &Container, layout: &Layout) -> Result<Vec<String>> {
    let treasures = layout_of(layout)?;
    Ok(container
        .region(treasures.region)?
        .tables()
        .iter()
        .map(|t| t.name().to_string())
        .filter(|name| !treasures.skipped.contains(&name.as_str()))
        .collect())
}

pub(crate) fn read_chests(container: &Container, region: &str, table: &str) -> Result<Vec<Chest>> {
    let view = container.region(region)?.view(table)?;
    let items = view.read_column(ITEM_COL)?;
    let money = view.read_column(MONEY_COL)?;
    let counts = view.read_column(COUNT_COL)?;
    Ok(items
        .into_iter()
        .zip(money)
        .zip(counts)
        .map(|((item, money), count)| Chest { item, money, count })
        .collect())
}

/// Deals every non-key chest from a shared pool: the contents of all
/// chests plus one of each non-dummy item that no chest holds. Key items
/// stay where they are and never enter the pool.
pub(crate) fn shuffle_treasures<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    items: &ItemCatalog,
    draw: &mut D,
) -> Result<()> {
    let treasures = layout_of(layout)?;
    let floor = treasures.key_item_floor;
    let tables = chest_tables(container, layout)?;

    let mut chests = Vec::with_capacity(tables.len());
    for table in &tables {
        chests.push(read_chests(container, treasures.region, table)?);
    }

    let mut candidates: Vec<Chest> = chests.iter().flatten().copied().filter(|c| !c.is_empty()).collect();
    let in_chests: BTreeSet<u32> = candidates.iter().map(|c| c.item).collect();
    let unplaced: BTreeSet<u32> = items
        .ids()
        .iter()
        .copied()
        .filter(|&id| !items.is_dummy(id) && !in_chests.contains(&id))
        .collect();
    candidates.extend(unplaced.into_iter().map(|item| Chest {
        item,
        money: 0,
        count: 1,
    }));
    candidates.retain(|c| c.item < floor);
    debug!(candidates = candidates.len(), tables = tables.len(), "treasure pool built");

    let mut pool = CandidatePool::shuffled("treasure", candidates, draw);
    let mut batch = PatchBatch::new();
    for (table, rows) in tables.iter().zip(&chests) {
        for (row, chest) in rows.iter().enumerate() {
            if chest.is_empty() || chest.item >= floor {
                continue;
            }
            let dealt = pool.take()?;
            batch.set(treasures.region, table, row, ITEM_COL, dealt.item);
            batch.set(treasures.region, table, row, MONEY_COL, dealt.money);
            batch.set(treasures.region, table, row, COUNT_COL, dealt.count);
        }
    }
    container.apply(batch)?;

    copy_chests(container, treasures)
}

/// The early ship reuses the first chests of the later airship.
fn copy_chests(container: &mut Container, treasures: &TreasureLayout) -> Result<()> {
    let source = read_chests(container, treasures.region, treasures.copy_from)?;
    let mut batch = PatchBatch::new();
    for (row, chest) in source.iter().take(treasures.copy_rows).enumerate() {
        batch.set(treasures.region, treasures.copy_to, row, ITEM_COL, chest.item);
        batch.set(treasures.region, treasures.copy_to, row, MONEY_COL, chest.money);
        batch.set(treasures.region, treasures.copy_to, row, COUNT_COL, chest.count);
    }
    container.apply(batch)
}
