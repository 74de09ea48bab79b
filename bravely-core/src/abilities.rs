use std::collections::HashMap;

use crate::container::{Container, PatchBatch};
use crate::layout::{AbilityLayout, Layout, TableRef};
use crate::shuffle::{self, Draw};
use crate::{RandomizerError, Result};

/// Names and rows of command, support and job-command abilities.
#[derive(Clone, Debug)]
pub(crate) struct AbilityCatalog {
    layout: AbilityLayout,
    command_names: HashMap<u32, String>,
    support_ids: Vec<u32>,
    support_rows: HashMap<u32, usize>,
    support_names: HashMap<u32, String>,
    owner_icons: HashMap<u32, u32>,
    job_command_names: HashMap<u32, String>,
}

impl AbilityCatalog {
    pub fn load(container: &Container, layout: &Layout) -> Result<Self> {
        let abilities = &layout.abilities;
        let region = container.region(abilities.region)?;

        let commands = region.view(abilities.command_table)?;
        let mut command_names = HashMap::new();
        // Repeated ids keep their first name.
        for (id, name) in commands
            .read_column(0)?
            .into_iter()
            .zip(commands.read_strings(abilities.command_name_col)?)
        {
            command_names.entry(id).or_insert(name);
        }

        let supports = region.view(abilities.support_table)?;
        let support_ids = supports.read_column(0)?;
        let support_rows = support_ids.iter().enumerate().map(|(r, &id)| (id, r)).collect();
        let support_names = support_ids
            .iter()
            .copied()
            .zip(supports.read_strings(abilities.support_name_col)?)
            .collect();
        // Icon each owning job gives its support abilities, taken before any
        // phase moves owners around.
        let mut owner_icons = HashMap::new();
        if let Some(icon_col) = abilities.support_icon_col {
            for (owner, icon) in supports
                .read_column(abilities.support_owner_col)?
                .into_iter()
                .zip(supports.read_column(icon_col)?)
            {
                owner_icons.entry(owner).or_insert(icon);
            }
        }

        let job_commands = region.view(abilities.job_command_table)?;
        let job_command_names = job_commands
            .read_column(0)?
            .into_iter()
            .zip(job_commands.read_strings(abilities.job_command_name_col)?)
            .collect();

        Ok(Self {
            layout: abilities.clone(),
            command_names,
            support_ids,
            support_rows,
            support_names,
            owner_icons,
            job_command_names,
        })
    }

    pub fn name(&self, id: u32) -> String {
        let names = if self.layout.job_command_ids.contains(&id) {
            &self.job_command_names
        } else if self.layout.command_ids.contains(&id) {
            &self.command_names
        } else if id >= self.layout.support_threshold {
            &self.support_names
        } else {
            return format!("Ability #{id}");
        };
        names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Ability #{id}"))
    }

    pub fn support_ids(&self) -> &[u32] {
        &self.support_ids
    }

    pub fn support_row(&self, id: u32) -> Result<usize> {
        self.support_rows.get(&id).copied().ok_or_else(|| {
            RandomizerError::Contract(format!(
                "support ability {id} is not in {}",
                self.layout.support_table
            ))
        })
    }

    /// Icon that goes with abilities owned by `owner`; 0 for unknown owners.
    pub fn owner_icon(&self, owner: u32) -> u32 {
        self.owner_icons.get(&owner).copied().unwrap_or(0)
    }

    pub fn support_cost(&self, container: &Container, id: u32) -> Result<u32> {
        container
            .region(self.layout.region)?
            .view(self.layout.support_table)?
            .read_value(self.support_row(id)?, self.layout.support_cost_col)
    }

    pub fn support_tables(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.layout.support_table).chain(self.layout.support_mirror)
    }
}

/// Plain shuffle of the support cost column. The mirror table, if any,
/// receives the same costs.
pub(crate) fn shuffle_support_costs<D: Draw + ?Sized>(
    container: &mut Container,
    layout: &Layout,
    draw: &mut D,
) -> Result<()> {
    let abilities = &layout.abilities;
    let col = abilities.support_cost_col;
    let mut costs = container
        .region(abilities.region)?
        .view(abilities.support_table)?
        .read_column(col)?;
    shuffle::shuffle(&mut costs, draw);

    let mut batch = PatchBatch::new();
    batch.set_column(abilities.region, abilities.support_table, col, &costs);
    if let Some(mirror) = abilities.support_mirror {
        if container.has_table(TableRef::new(abilities.region, mirror)) {
            batch.set_column(abilities.region, mirror, col, &costs);
        }
    }
    container.apply(batch)
}
