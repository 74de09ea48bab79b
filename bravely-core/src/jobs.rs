use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::abilities::AbilityCatalog;
use crate::container::{Container, PatchBatch};
use crate::layout::{stat_columns, Layout, TableRef};
use crate::shuffle::{self, CandidatePool, Draw};
use crate::{RandomizerError, Result};

#[derive(Clone, Debug)]
pub(crate) struct Job {
    /// Job number, also the owner id stored in support ability tables.
    pub id: u32,
    pub name: String,
    pub row: usize,
    pub table: String,
}

/// Jobs in edition order, plus the command and support ids the jobs use.
#[derive(Clone, Debug)]
pub(crate) struct JobRoster {
    region: &'static str,
    jobs: Vec<Job>,
    command_ids: Vec<u32>,
    support_ids: Vec<u32>,
}

impl JobRoster {
    pub fn load(container: &Container, layout: &Layout) -> Result<Self> {
        let jobs_layout = &layout.jobs;
        let region = container.region(jobs_layout.region)?;
        let index = region.view(jobs_layout.index_table)?;
        let names = index.read_strings(jobs_layout.name_col)?;
        let numbers = match jobs_layout.index_col {
            Some(col) => index.read_column(col)?,
            None => (0..names.len() as u32).collect(),
        };

        let mut seen = BTreeSet::new();
        let mut jobs: Vec<Job> = numbers
            .into_iter()
            .zip(names)
            .enumerate()
            .filter(|(_, (id, name))| {
                (*id as usize) < jobs_layout.job_count && !name.is_empty() && seen.insert(*id)
            })
            .map(|(row, (id, name))| Job {
                id,
                name,
                row,
                table: format!("JobTable{id:02}.btb"),
            })
            .collect();
        jobs.sort_by_key(|job| job.id);

        let mut abilities = BTreeSet::new();
        for job in &jobs {
            let view = region.view(&job.table)?;
            abilities.insert(view.read_value(0, jobs_layout.specialty_col)?);
            abilities.extend(view.read_column(jobs_layout.ability_col)?);
        }
        abilities.remove(&0);
        let (support_ids, command_ids): (Vec<u32>, Vec<u32>) =
            abilities.into_iter().partition(|&id| layout.is_support(id));

        debug!(
            jobs = jobs.len(),
            commands = command_ids.len(),
            supports = support_ids.len(),
            "job roster loaded"
        );
        Ok(Self {
            region: jobs_layout.region,
            jobs,
            command_ids,
            support_ids,
        })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn region(&self) -> &'static str {
        self.region
    }

    pub fn command_ids(&self) -> &[u32] {
        &self.command_ids
    }

    pub fn support_ids(&self) -> &[u32] {
        &self.support_ids
    }

    pub fn read_column(&self, container: &Container, job: &Job, col: usize) -> Result<Vec<u32>> {
        container.region(self.region)?.view(&job.table)?.read_column(col)
    }

    pub fn patch_column(&self, container: &mut Container, job: &Job, col: usize, values: &[u32]) -> Result<()> {
        container
            .region_mut(self.region)?
            .view_mut(&job.table)?
            .patch_column(values, col)
    }

    /// Jobs that learn spells: any job with an empty ability slot.
    pub fn casters(&self, container: &Container, layout: &Layout) -> Result<Vec<bool>> {
        self.jobs
            .iter()
            .map(|job| Ok(self.read_column(container, job, layout.jobs.ability_col)?.contains(&0)))
            .collect()
    }

    /// Job currently holding `ability` as a level ability or specialty.
    pub fn owner_of(&self, container: &Container, layout: &Layout, ability: u32) -> Result<Option<&Job>> {
        for job in &self.jobs {
            let view = container.region(self.region)?.view(&job.table)?;
            if view.read_value(0, layout.jobs.specialty_col)? == ability
                || view.read_column(layout.jobs.ability_col)?.contains(&ability)
            {
                return Ok(Some(job));
            }
        }
        Ok(None)
    }
}

/// Swaps whole stat columns between jobs: for each stat, the per-job
/// columns are permuted as units.
pub(crate) fn shuffle_affinities<D: Draw + ?Sized>(
    container: &mut Container,
    roster: &JobRoster,
    draw: &mut D,
) -> Result<()> {
    for &(_, col) in stat_columns() {
        let mut columns = roster
            .jobs()
            .iter()
            .map(|job| roster.read_column(container, job, col))
            .collect::<Result<Vec<_>>>()?;
        shuffle::shuffle(&mut columns, draw);
        for (job, values) in roster.jobs().iter().zip(&columns) {
            roster.patch_column(container, job, col, values)?;
        }
    }
    Ok(())
}

pub(crate) fn random_specialties<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    roster: &JobRoster,
    draw: &mut D,
) -> Result<()> {
    let mut pool = CandidatePool::shuffled("specialty", roster.support_ids().to_vec(), draw);
    for job in roster.jobs() {
        let value = pool.take()?;
        container
            .region_mut(roster.region())?
            .view_mut(&job.table)?
            .patch_value(value, 0, layout.jobs.specialty_col)?;
    }
    Ok(())
}

pub(crate) fn shuffle_commands<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    roster: &JobRoster,
    draw: &mut D,
) -> Result<()> {
    let col = layout.jobs.ability_col;
    let mut pool = CandidatePool::shuffled("command", roster.command_ids().to_vec(), draw);
    for job in roster.jobs() {
        let mut abilities = roster.read_column(container, job, col)?;
        for slot in abilities.iter_mut() {
            if *slot != 0 && !layout.is_support(*slot) {
                *slot = pool.take()?;
            }
        }
        roster.patch_column(container, job, col, &abilities)?;
    }
    Ok(())
}

/// Deals the support pool into every support slot. Each dealt ability takes
/// over the owner and owner icon recorded for the ability it replaced.
pub(crate) fn shuffle_support<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    roster: &JobRoster,
    abilities: &AbilityCatalog,
    draw: &mut D,
) -> Result<()> {
    let col = layout.jobs.ability_col;
    let ability_layout = &layout.abilities;
    let owner_col = ability_layout.support_owner_col;
    let support = container
        .region(ability_layout.region)?
        .view(ability_layout.support_table)?;
    let owners = support.read_column(owner_col)?;
    let icons = match ability_layout.support_icon_col {
        Some(icon_col) => Some((icon_col, support.read_column(icon_col)?)),
        None => None,
    };
    let tables: Vec<&'static str> = abilities
        .support_tables()
        .filter(|&table| container.has_table(TableRef::new(ability_layout.region, table)))
        .collect();

    let mut pool = CandidatePool::shuffled("support", roster.support_ids().to_vec(), draw);
    let mut batch = PatchBatch::new();
    for job in roster.jobs() {
        let mut slots = roster.read_column(container, job, col)?;
        for slot in slots.iter_mut() {
            if !layout.is_support(*slot) {
                continue;
            }
            let replaced = abilities.support_row(*slot)?;
            let dealt = pool.take()?;
            let row = abilities.support_row(dealt)?;
            for &table in &tables {
                batch.set(ability_layout.region, table, row, owner_col, owners[replaced]);
                if let Some((icon_col, icons)) = &icons {
                    batch.set(ability_layout.region, table, row, *icon_col, icons[replaced]);
                }
            }
            *slot = dealt;
        }
        batch.set_column(roster.region(), &job.table, col, &slots);
    }
    container.apply(batch)
}

/// Partitioned deal: casters receive only support abilities in their
/// non-empty slots; every slot of the other jobs is dealt from the leftover
/// supports merged with all commands. Support owners and icons follow.
pub(crate) fn shuffle_mixed<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    roster: &JobRoster,
    abilities: &AbilityCatalog,
    draw: &mut D,
) -> Result<()> {
    let col = layout.jobs.ability_col;
    let casters = roster.casters(container, layout)?;
    let mut columns = roster
        .jobs()
        .iter()
        .map(|job| roster.read_column(container, job, col))
        .collect::<Result<Vec<_>>>()?;

    let mut supports = CandidatePool::shuffled("caster support", roster.support_ids().to_vec(), draw);
    for (slots, _) in columns.iter_mut().zip(&casters).filter(|(_, caster)| **caster) {
        for slot in slots.iter_mut().filter(|s| **s != 0) {
            *slot = supports.take()?;
        }
    }

    let mut merged = supports.into_values();
    merged.extend_from_slice(roster.command_ids());
    let mut pool = CandidatePool::shuffled("mixed", merged, draw);
    for (slots, _) in columns.iter_mut().zip(&casters).filter(|(_, caster)| !**caster) {
        for slot in slots.iter_mut() {
            *slot = pool.take()?;
        }
    }

    let mut owner_of = HashMap::new();
    for (job, slots) in roster.jobs().iter().zip(&columns) {
        for &ability in slots {
            owner_of.insert(ability, job.id);
        }
    }

    let ability_layout = &layout.abilities;
    let mut owners = Vec::with_capacity(abilities.support_ids().len());
    let mut icons = Vec::with_capacity(abilities.support_ids().len());
    for id in abilities.support_ids() {
        match owner_of.get(id) {
            Some(&owner) => {
                owners.push(owner);
                icons.push(abilities.owner_icon(owner));
            }
            None => {
                owners.push(0);
                icons.push(0);
            }
        }
    }

    let mut batch = PatchBatch::new();
    for (job, slots) in roster.jobs().iter().zip(&columns) {
        batch.set_column(roster.region(), &job.table, col, slots);
    }
    for table in abilities.support_tables() {
        if !container.has_table(TableRef::new(ability_layout.region, table)) {
            continue;
        }
        batch.set_column(ability_layout.region, table, ability_layout.support_owner_col, &owners);
        if let Some(icon_col) = ability_layout.support_icon_col {
            batch.set_column(ability_layout.region, table, icon_col, &icons);
        }
    }
    container.apply(batch)
}

/// Shuffles each equipment aptitude column across jobs. A column tied to a
/// lore support ability keeps its top grade on whichever job holds that
/// ability.
pub(crate) fn shuffle_aptitudes<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    roster: &JobRoster,
    draw: &mut D,
) -> Result<()> {
    let aptitudes = layout.jobs.aptitudes.as_ref().ok_or_else(|| {
        RandomizerError::Contract(format!("{} has no equipment aptitudes", layout.edition))
    })?;
    let table = TableRef::new(roster.region(), layout.jobs.index_table);

    for col in aptitudes.cols.clone() {
        let mut grades = container.view(table)?.read_column(col)?;
        shuffle::shuffle(&mut grades, draw);

        if let Some(&(_, lore)) = aptitudes.lore.iter().find(|(c, _)| *c == col) {
            if let Some(job) = roster.owner_of(container, layout, lore)? {
                shuffle::keep_value_at(&mut grades, job.row, &aptitudes.top_grade, draw)?;
            }
        }
        container.view_mut(table)?.patch_column(&grades, col)?;
    }
    Ok(())
}

pub(crate) fn zero_jp(container: &mut Container, roster: &JobRoster) -> Result<()> {
    for job in roster.jobs() {
        let mut view = container.region_mut(roster.region())?.view_mut(&job.table)?;
        let zeros = vec![0; view.row_count()];
        view.patch_column(&zeros, 1)?;
        view.patch_column(&zeros, 2)?;
    }
    Ok(())
}
