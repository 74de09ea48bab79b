//! Deterministic quality-of-life edits applied after randomization.

use tracing::debug;

use crate::container::Container;
use crate::items::ItemCatalog;
use crate::layout::Layout;
use crate::Result;

pub(crate) const EXP_CAP: u32 = 999_999;
pub(crate) const JP_CAP: u32 = 999;
pub(crate) const PG_CAP: u32 = 999_999;

/// Party level tables are numbered from 1; the first gap ends the list.
const MAX_PC_TABLES: usize = 6;

/// Clears the total and next-level EXP columns so every character starts
/// at the level cap.
pub(crate) fn zero_pc_exp(container: &mut Container, layout: &Layout) -> Result<()> {
    let region = container.region_mut(layout.pc_region)?;
    for i in 1..=MAX_PC_TABLES {
        let name = format!("PcLevelTable00{i}.btb");
        if region.table(&name).is_none() {
            break;
        }
        let mut view = region.view_mut(&name)?;
        let zeros = vec![0; view.row_count()];
        view.patch_column(&zeros, 1)?;
        view.patch_column(&zeros, 2)?;
        debug!(table = %name, "experience cleared");
    }
    Ok(())
}

pub(crate) fn free_teleport_stones(container: &mut Container, layout: &Layout, items: &ItemCatalog) -> Result<()> {
    items.change_cost_by_name(container, layout.teleport_stone, 0)
}

fn scale_value(value: u32, scale: f64, cap: u32) -> u32 {
    (value as f64 * scale).round().min(cap as f64) as u32
}

fn scale_columns(container: &mut Container, layout: &Layout, cols: &[usize], scale: f64, cap: u32) -> Result<()> {
    let mut view = container.view_mut(layout.rewards.monsters)?;
    for &col in cols {
        let scaled: Vec<u32> = view
            .read_column(col)?
            .into_iter()
            .map(|v| scale_value(v, scale, cap))
            .collect();
        view.patch_column(&scaled, col)?;
    }
    Ok(())
}

/// Multiplies monster EXP, JP and money rewards, clamped to what the game
/// can display.
pub(crate) fn scale_rewards(container: &mut Container, layout: &Layout, exp: f64, jp: f64, pg: f64) -> Result<()> {
    let rewards = &layout.rewards;
    scale_columns(container, layout, rewards.exp_cols, exp, EXP_CAP)?;
    scale_columns(container, layout, rewards.jp_cols, jp, JP_CAP)?;
    scale_columns(container, layout, rewards.pg_cols, pg, PG_CAP)
}
