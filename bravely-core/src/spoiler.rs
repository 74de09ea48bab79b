//! Plain-text spoiler log describing the randomized game data.

use std::collections::BTreeMap;

use crate::abilities::AbilityCatalog;
use crate::container::Container;
use crate::items::ItemCatalog;
use crate::jobs::JobRoster;
use crate::layout::{stat_columns, Layout, TableRef};
use crate::treasures;
use crate::Result;

/// Everything the log reads, borrowed from the randomizer.
pub(crate) struct SpoilerContext<'a> {
    pub container: &'a Container,
    pub layout: &'a Layout,
    pub seed: u64,
    pub items: &'a ItemCatalog,
    pub abilities: &'a AbilityCatalog,
    pub roster: &'a JobRoster,
}

fn section(log: &mut String, title: &str) {
    let rule = "=".repeat(title.len());
    log.push_str(&format!("{rule}\n{title}\n{rule}\n\n"));
}

fn heading(log: &mut String, title: &str) {
    log.push_str(&format!("{title}\n{}\n", "-".repeat(title.len())));
}

fn grade(value: u32) -> &'static str {
    match value {
        200 => "S",
        180 => "A",
        160 => "B",
        140 => "C",
        120 => "D",
        100 => "E",
        _ => "?",
    }
}

pub(crate) fn spoiler_log(ctx: &SpoilerContext<'_>) -> Result<String> {
    let mut log = format!(
        "Bravely randomizer seed: {}\ngame: {}\n\n",
        ctx.seed, ctx.layout.edition
    );
    aptitudes(ctx, &mut log)?;
    affinities(ctx, &mut log)?;
    job_abilities(ctx, &mut log)?;
    spells(ctx, &mut log)?;
    chests(ctx, &mut log)?;
    Ok(log)
}

fn aptitudes(ctx: &SpoilerContext<'_>, log: &mut String) -> Result<()> {
    let Some(aptitudes) = &ctx.layout.jobs.aptitudes else {
        return Ok(());
    };
    section(log, "JOB APTITUDES");
    let view = ctx
        .container
        .view(TableRef::new(ctx.roster.region(), ctx.layout.jobs.index_table))?;

    let mut header = " ".repeat(20);
    for (name, _) in aptitudes.spoiler_cols {
        header.push_str(&format!("{name:>10}"));
    }
    log.push_str(&format!("{header}\n"));
    for job in ctx.roster.jobs() {
        let mut line = format!("{:>20}", job.name);
        for &(_, col) in aptitudes.spoiler_cols {
            line.push_str(&format!("{:>10}", grade(view.read_value(job.row, col)?)));
        }
        log.push_str(&format!("{line}\n"));
    }
    log.push_str("\n\n");
    Ok(())
}

fn affinities(ctx: &SpoilerContext<'_>, log: &mut String) -> Result<()> {
    section(log, "JOB AFFINITIES");
    let mut header = " ".repeat(20);
    for (name, _) in stat_columns() {
        header.push_str(&format!("{name:>6}"));
    }
    log.push_str(&format!("{header}\n"));

    let region = ctx.container.region(ctx.roster.region())?;
    for job in ctx.roster.jobs() {
        let view = region.view(&job.table)?;
        let mut line = format!("{:>20}", job.name);
        for &(_, col) in stat_columns() {
            line.push_str(&format!("{:>6}", format!("{}%", view.read_value(0, col)?)));
        }
        log.push_str(&format!("{line}\n"));
    }
    log.push_str("\n\n");
    Ok(())
}

fn job_abilities(ctx: &SpoilerContext<'_>, log: &mut String) -> Result<()> {
    section(log, "JOB ABILITIES");
    let jobs = &ctx.layout.jobs;
    let region = ctx.container.region(ctx.roster.region())?;

    for job in ctx.roster.jobs() {
        let view = region.view(&job.table)?;
        heading(log, &job.name);
        log.push_str(&format!(
            "\n  Specialty: {}\n\n  Abilities:\n",
            ctx.abilities.name(view.read_value(0, jobs.specialty_col)?)
        ));

        let columns = jobs
            .slot_cols
            .iter()
            .map(|&col| view.read_column(col))
            .collect::<Result<Vec<_>>>()?;
        for row in 0..view.row_count() {
            // An empty ability slot is a magic level; the other slot columns
            // name the command it unlocks.
            let id = match columns[0][row] {
                0 => columns[1..].iter().map(|c| c[row]).max().unwrap_or(0),
                id => id,
            };
            let level = format!("{:>5} ", row + 1);
            if ctx.layout.is_support(id) {
                log.push_str(&format!(
                    "{level} {:<20} {} SP\n",
                    ctx.abilities.name(id),
                    ctx.abilities.support_cost(ctx.container, id)?
                ));
            } else {
                log.push_str(&format!("{level} {}\n", ctx.abilities.name(id)));
            }
        }
        log.push_str("\n\n");
    }
    Ok(())
}

fn spells(ctx: &SpoilerContext<'_>, log: &mut String) -> Result<()> {
    section(log, "JOB SPELLS & SUMMONS");
    let region = ctx.container.region(ctx.layout.abilities.region)?;
    for &(table, mage) in ctx.layout.magic.mages {
        if region.table(table).is_none() {
            continue;
        }
        let view = region.view(table)?;
        let mut levels: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for (level, ability) in view.read_column(0)?.into_iter().zip(view.read_column(1)?) {
            levels.entry(level).or_default().push(ctx.abilities.name(ability));
        }

        heading(log, mage);
        log.push('\n');
        for (level, names) in levels {
            log.push_str(&format!(" Level {level}:   {}\n", names.join(", ")));
        }
        log.push_str("\n\n");
    }
    Ok(())
}

fn chests(ctx: &SpoilerContext<'_>, log: &mut String) -> Result<()> {
    let Some(layout) = &ctx.layout.treasures else {
        return Ok(());
    };
    section(log, "TREASURES");
    let region = ctx.container.region(layout.region)?;
    for &(table, location) in layout.locations {
        if region.table(table).is_none() {
            continue;
        }
        heading(log, location);
        log.push('\n');
        for chest in treasures::read_chests(ctx.container, layout.region, table)? {
            if chest.is_empty() {
                continue;
            }
            if chest.money > 0 {
                log.push_str(&format!("   {} pg\n", chest.money));
            } else if chest.count > 2 {
                log.push_str(&format!("   {} x{}\n", ctx.items.display_name(chest.item), chest.count));
            } else {
                log.push_str(&format!("   {}\n", ctx.items.display_name(chest.item)));
            }
        }
        log.push_str("\n\n");
    }
    Ok(())
}
