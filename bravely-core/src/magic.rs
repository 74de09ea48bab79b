//! Spell shuffling and the magic-level commands of caster jobs.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::container::Container;
use crate::items::ItemCatalog;
use crate::jobs::JobRoster;
use crate::layout::{Layout, TableRef};
use crate::shuffle::{self, Draw};
use crate::{RandomizerError, Result};

const LEVELS: std::ops::RangeInclusive<u32> = 1..=7;

#[derive(Clone, Debug)]
struct SpellSlot {
    table: &'static str,
    row: usize,
    level: u32,
    ability: u32,
    item: u32,
    order: u32,
    icon: u32,
    cost: u32,
}

fn load_slots(container: &Container, layout: &Layout, items: &ItemCatalog) -> Result<Vec<SpellSlot>> {
    let region = container.region(layout.abilities.region)?;
    let mut slots = Vec::new();
    for &table in layout.magic.tables {
        if Some(table) == layout.magic.spell_fencer {
            continue;
        }
        let view = region.view(table)?;
        let levels = view.read_column(0)?;
        let abilities = view.read_column(1)?;
        let item_ids = view.read_column(2)?;
        for (row, ((level, ability), item)) in levels.into_iter().zip(abilities).zip(item_ids).enumerate() {
            slots.push(SpellSlot {
                table,
                row,
                level,
                ability,
                item,
                order: items.order(container, item)?,
                icon: items.icon(container, item)?,
                cost: items.cost(container, item)?,
            });
        }
        debug!(table, rows = view.row_count(), "loaded magic table");
    }
    Ok(slots)
}

/// Shuffles `(ability, item)` pairs among slots of the same level. Every
/// item inherits the shop order, icon and cost of the slot it lands in.
pub(crate) fn shuffle_spells<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    items: &ItemCatalog,
    starter_purchasable: bool,
    draw: &mut D,
) -> Result<()> {
    let magic = &layout.magic;
    let region = layout.abilities.region;
    let slots = load_slots(container, layout, items)?;
    let mut spells: Vec<(u32, u32)> = slots.iter().map(|s| (s.ability, s.item)).collect();

    for level in LEVELS {
        let positions: Vec<usize> = (0..slots.len()).filter(|&i| slots[i].level == level).collect();
        if level == 1 && starter_purchasable {
            shuffle_starters(container, layout, &slots, &mut spells, &positions, draw)?;
        } else {
            shuffle::shuffle_positions(&mut spells, &positions, draw);
        }
    }

    for (slot, &(ability, item)) in slots.iter().zip(&spells) {
        let mut view = container.region_mut(region)?.view_mut(slot.table)?;
        view.patch_value(ability, slot.row, 1)?;
        view.patch_value(item, slot.row, 2)?;
        items.set_order(container, item, slot.order)?;
        items.set_icon(container, item, slot.icon)?;
        items.set_cost(container, item, slot.cost)?;
    }

    let moved: HashMap<u32, (u32, u32)> = slots.iter().map(|s| s.ability).zip(spells.iter().copied()).collect();
    remap_red_mage(container, layout, &moved)?;

    if let Some(fencer) = magic.spell_fencer {
        swap_spell_fencer(container, layout, fencer, &slots, &spells, draw)?;
    }
    if let Some(summons) = magic.summon_table {
        shuffle_summons(container, layout, summons, draw)?;
    }
    rewrite_details(container, layout, items)
}

/// Level-1 rejection loop: reshuffle until every starter-table slot holds an
/// item sold in the starting magic shop. Returns the number of shuffles.
fn shuffle_starters<D: Draw + ?Sized>(
    container: &Container,
    layout: &Layout,
    slots: &[SpellSlot],
    spells: &mut [(u32, u32)],
    positions: &[usize],
    draw: &mut D,
) -> Result<usize> {
    let magic = &layout.magic;
    let sold: HashSet<u32> = container.view(magic.starter_shop)?.read_column(0)?.into_iter().collect();
    let starters: Vec<usize> = positions
        .iter()
        .enumerate()
        .filter(|(_, p)| magic.starter_tables.contains(&slots[**p].table))
        .map(|(i, _)| i)
        .collect();

    let mut bucket: Vec<(u32, u32)> = positions.iter().map(|&p| spells[p]).collect();
    let purchasable = bucket.iter().filter(|(_, item)| sold.contains(item)).count();
    if purchasable < starters.len() {
        return Err(RandomizerError::Contract(format!(
            "{} level 1 spells are sold in {} but the starter tables need {}",
            purchasable,
            magic.starter_shop,
            starters.len()
        )));
    }

    let attempts = shuffle::shuffle_until(&mut bucket, draw, |b| {
        starters.iter().all(|&i| sold.contains(&b[i].1))
    });
    debug!(attempts, "starter spells are purchasable");
    for (&p, spell) in positions.iter().zip(bucket) {
        spells[p] = spell;
    }
    Ok(attempts)
}

/// The Red Mage table reuses spells from the other tables; each entry
/// follows the spell now sitting where it used to be.
fn remap_red_mage(container: &mut Container, layout: &Layout, moved: &HashMap<u32, (u32, u32)>) -> Result<()> {
    let red_mage = layout.magic.red_mage;
    let mut view = container.region_mut(layout.abilities.region)?.view_mut(red_mage)?;
    for (row, ability) in view.read_column(1)?.into_iter().enumerate() {
        match moved.get(&ability) {
            Some(&(new_ability, new_item)) => {
                view.patch_value(new_ability, row, 1)?;
                view.patch_value(new_item, row, 2)?;
            }
            None => warn!(ability, row, "red mage spell is not in any shuffled table"),
        }
    }
    Ok(())
}

/// A spell that ended up with the same item as a Spell Fencer entry trades
/// ability ids with it on a coin flip.
fn swap_spell_fencer<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    fencer: &'static str,
    slots: &[SpellSlot],
    spells: &[(u32, u32)],
    draw: &mut D,
) -> Result<()> {
    let region = layout.abilities.region;
    let view = container.region(region)?.view(fencer)?;
    let mut by_item: HashMap<u32, (usize, u32)> = view
        .read_column(2)?
        .into_iter()
        .zip(view.read_column(1)?)
        .enumerate()
        .map(|(row, (item, ability))| (item, (row, ability)))
        .collect();

    for (slot, &(ability, item)) in slots.iter().zip(spells) {
        let Some(entry) = by_item.get_mut(&item) else {
            continue;
        };
        if !draw.chance(0.5) {
            continue;
        }
        let (fencer_row, fencer_ability) = *entry;
        let tables = container.region_mut(region)?;
        tables.view_mut(slot.table)?.patch_value(fencer_ability, slot.row, 1)?;
        tables.view_mut(fencer)?.patch_value(ability, fencer_row, 1)?;
        entry.1 = ability;
    }
    Ok(())
}

fn shuffle_summons<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    summons: &'static str,
    draw: &mut D,
) -> Result<()> {
    let mut view = container.region_mut(layout.abilities.region)?.view_mut(summons)?;
    let mut pairs: Vec<(u32, u32)> = view.read_column(1)?.into_iter().zip(view.read_column(2)?).collect();
    for group in layout.magic.summon_groups {
        if let Some(&row) = group.iter().find(|&&row| row >= pairs.len()) {
            return Err(RandomizerError::Contract(format!(
                "summon group row {row} outside {summons} ({} rows)",
                pairs.len()
            )));
        }
        shuffle::shuffle_positions(&mut pairs, group, draw);
    }
    let (abilities, items): (Vec<u32>, Vec<u32>) = pairs.into_iter().unzip();
    view.patch_column(&abilities, 1)?;
    view.patch_column(&items, 2)
}

/// Rewrites the "Enables use of" text of every magic level command from
/// the current contents of its magic table.
fn rewrite_details(container: &mut Container, layout: &Layout, items: &ItemCatalog) -> Result<()> {
    let magic = &layout.magic;
    let detail_rows: HashMap<u32, usize> = container
        .view(magic.detail_info)?
        .read_column(0)?
        .into_iter()
        .enumerate()
        .map(|(row, id)| (id, row))
        .collect();

    let mut texts = Vec::new();
    let region = container.region(layout.abilities.region)?;
    for &(table, commands) in magic.detail_commands {
        if region.table(table).is_none() {
            warn!(table, "magic table missing, detail text left alone");
            continue;
        }
        let view = region.view(table)?;
        let rows: Vec<(u32, u32, u32)> = view
            .read_column(0)?
            .into_iter()
            .zip(view.read_column(1)?)
            .zip(view.read_column(2)?)
            .map(|((level, ability), item)| (level, ability, item))
            .collect();

        for (level, &command) in (1u32..).zip(commands) {
            let names: Vec<String> = rows
                .iter()
                .filter(|(l, _, _)| *l == level)
                .map(|&(_, ability, item)| {
                    let name = items.display_name(item);
                    match &magic.spell_fencer_marks {
                        Some(marks) if marks.contains(&ability) => format!("{name} (SM)"),
                        _ => name,
                    }
                })
                .collect();
            if names.is_empty() {
                warn!(table, level, "no spells at this level");
                continue;
            }
            let Some(&row) = detail_rows.get(&command) else {
                warn!(command, "no detail row for magic command");
                continue;
            };
            texts.push((row, detail_text(table == magic.summoner, &names)));
        }
    }

    let mut detail = container.view_mut(magic.detail_info)?;
    for (row, text) in texts {
        detail.patch_string(&text, row, 2)?;
    }
    Ok(())
}

fn detail_text(summoner: bool, names: &[String]) -> String {
    if summoner && names.len() == 8 {
        "Enables the remaining summons.".to_string()
    } else if names.len() > 4 {
        format!("Enables use of:\n{}\n{}", names[..4].join(", "), names[4..].join(", "))
    } else {
        format!("Enables use of:\n{}", names.join(", "))
    }
}

/// Shuffles the magic-level commands (title column) of caster jobs: first
/// within each job, then at every tier a single-cycle pass across jobs so
/// no tier stays with its owner.
pub(crate) fn shuffle_magic_levels<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    roster: &JobRoster,
    draw: &mut D,
) -> Result<()> {
    let levels = layout.magic.levels.as_ref().ok_or_else(|| {
        RandomizerError::Contract(format!("{} has no magic level commands", layout.edition))
    })?;
    let casters: Vec<_> = roster
        .jobs()
        .iter()
        .zip(roster.casters(container, layout)?)
        .filter(|(_, caster)| *caster)
        .map(|(job, _)| job)
        .collect();

    let mut titles = casters
        .iter()
        .map(|job| roster.read_column(container, job, levels.title_col))
        .collect::<Result<Vec<_>>>()?;
    let mut commands: Vec<Vec<u32>> = titles
        .iter()
        .map(|t| t.iter().copied().filter(|&c| c != 0).collect())
        .collect();

    for owned in commands.iter_mut() {
        shuffle::shuffle(owned, draw);
    }
    let tiers = commands.iter().map(Vec::len).max().unwrap_or(0);
    for tier in 0..tiers {
        let owners: Vec<usize> = (0..commands.len()).filter(|&o| tier < commands[o].len()).collect();
        let mut level: Vec<u32> = owners.iter().map(|&o| commands[o][tier]).collect();
        shuffle::sattolo(&mut level, draw);
        for (&o, command) in owners.iter().zip(level) {
            commands[o][tier] = command;
        }
    }

    let mut old_to_new = HashMap::new();
    for (slots, new) in titles.iter_mut().zip(commands) {
        let mut new = new.into_iter();
        for slot in slots.iter_mut().filter(|s| **s != 0) {
            if let Some(command) = new.next() {
                old_to_new.insert(*slot, command);
                *slot = command;
            }
        }
    }
    for (job, slots) in casters.iter().zip(&titles) {
        roster.patch_column(container, job, levels.title_col, slots)?;
    }

    let index = TableRef::new(roster.region(), layout.jobs.index_table);
    let remapped: Vec<u32> = container
        .view(index)?
        .read_column(levels.job_index_command_col)?
        .into_iter()
        .map(|c| old_to_new.get(&c).copied().unwrap_or(c))
        .collect();
    container.view_mut(index)?.patch_column(&remapped, levels.job_index_command_col)?;

    let job_commands = TableRef::new(layout.abilities.region, layout.abilities.job_command_table);
    let mut view = container.view_mut(job_commands)?;
    let ids = view.read_column(0)?;
    let icons = view.read_column(levels.command_icon_col)?;
    let icon_of: HashMap<u32, u32> = ids.iter().copied().zip(icons.iter().copied()).collect();
    let new_to_old: HashMap<u32, u32> = old_to_new.iter().map(|(&o, &n)| (n, o)).collect();
    let icons: Vec<u32> = ids
        .iter()
        .zip(&icons)
        .map(|(id, &icon)| {
            new_to_old
                .get(id)
                .and_then(|old| icon_of.get(old))
                .copied()
                .unwrap_or(icon)
        })
        .collect();
    view.patch_column(&icons, levels.command_icon_col)?;
    for (row, id) in ids.iter().enumerate() {
        if old_to_new.contains_key(id) {
            view.patch_string(levels.description, row, levels.command_description_col)?;
        }
    }
    Ok(())
}
