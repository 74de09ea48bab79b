use tracing::{info, warn};

use crate::abilities::{self, AbilityCatalog};
use crate::container::Container;
use crate::items::ItemCatalog;
use crate::jobs::{self, JobRoster};
use crate::layout::Layout;
use crate::shuffle::Phase;
use crate::spoiler::{self, SpoilerContext};
use crate::{magic, qol, treasures, RandomizerSettings, Result};

/// A loaded romfs plus the catalogs read from it before any change.
pub struct Randomizer {
    container: Container,
    layout: Layout,
    seed: u64,
    items: ItemCatalog,
    abilities: AbilityCatalog,
    roster: JobRoster,
}

impl Randomizer {
    pub fn new(container: Container, layout: Layout, seed: u64) -> Result<Self> {
        let items = ItemCatalog::load(&container, &layout)?;
        let abilities = AbilityCatalog::load(&container, &layout)?;
        let roster = JobRoster::load(&container, &layout)?;
        Ok(Self {
            container,
            layout,
            seed,
            items,
            abilities,
            roster,
        })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn randomize(&mut self, settings: &RandomizerSettings) -> Result<()> {
        let seed = self.seed;
        let container = &mut self.container;
        let layout = &self.layout;

        if settings.jobs_magic {
            info!("shuffling spells");
            magic::shuffle_spells(
                container,
                layout,
                &self.items,
                settings.magic_starter_purchasable,
                &mut Phase::Spells.rng(seed),
            )?;
        }
        if settings.jobs_support_costs {
            info!("shuffling support ability costs");
            abilities::shuffle_support_costs(container, layout, &mut Phase::SupportCosts.rng(seed))?;
        }
        if settings.jobs_stat_affinities {
            info!("shuffling job stat affinities");
            jobs::shuffle_affinities(container, &self.roster, &mut Phase::StatAffinities.rng(seed))?;
        }
        if settings.jobs_specialties {
            info!("randomizing job specialties");
            jobs::random_specialties(container, layout, &self.roster, &mut Phase::Specialties.rng(seed))?;
        }
        if settings.jobs_commands {
            info!("shuffling job commands");
            jobs::shuffle_commands(container, layout, &self.roster, &mut Phase::Commands.rng(seed))?;
        }
        if settings.jobs_support {
            info!("shuffling job support abilities");
            jobs::shuffle_support(
                container,
                layout,
                &self.roster,
                &self.abilities,
                &mut Phase::Support.rng(seed),
            )?;
        }
        if settings.jobs_mixed_abilities {
            info!("mixing job commands and support abilities");
            jobs::shuffle_mixed(
                container,
                layout,
                &self.roster,
                &self.abilities,
                &mut Phase::MixedAbilities.rng(seed),
            )?;
        }
        if settings.jobs_magic_levels {
            if layout.magic.levels.is_some() {
                info!("shuffling magic levels");
                magic::shuffle_magic_levels(container, layout, &self.roster, &mut Phase::MagicLevels.rng(seed))?;
            } else {
                warn!(game = %layout.edition, "magic level shuffle not supported, skipping");
            }
        }
        if settings.jobs_equip_aptitudes {
            if layout.jobs.aptitudes.is_some() {
                info!("shuffling job equipment aptitudes");
                jobs::shuffle_aptitudes(container, layout, &self.roster, &mut Phase::Aptitudes.rng(seed))?;
            } else {
                warn!(game = %layout.edition, "equipment aptitudes not supported, skipping");
            }
        }
        if settings.treasures {
            if layout.treasures.is_some() {
                info!("shuffling treasures");
                treasures::shuffle_treasures(container, layout, &self.items, &mut Phase::Treasures.rng(seed))?;
            } else {
                warn!(game = %layout.edition, "treasure shuffle not supported, skipping");
            }
        }
        Ok(())
    }

    pub fn quality_of_life(&mut self, settings: &RandomizerSettings) -> Result<()> {
        let container = &mut self.container;
        let layout = &self.layout;

        if settings.qol_mastered_jobs {
            info!("jobs will be mastered");
            jobs::zero_jp(container, &self.roster)?;
        }
        if settings.no_exp {
            info!("characters start at the level cap");
            qol::zero_pc_exp(container, layout)?;
        }
        if settings.qol_teleport_stones {
            info!("teleport stones will be free");
            qol::free_teleport_stones(container, layout, &self.items)?;
        }
        info!(
            exp = settings.qol_exp,
            jp = settings.qol_jp,
            pg = settings.qol_pg,
            "rescaling battle rewards"
        );
        qol::scale_rewards(container, layout, settings.qol_exp, settings.qol_jp, settings.qol_pg)
    }

    pub fn spoiler_log(&self) -> Result<String> {
        spoiler::spoiler_log(&SpoilerContext {
            container: &self.container,
            layout: &self.layout,
            seed: self.seed,
            items: &self.items,
            abilities: &self.abilities,
            roster: &self.roster,
        })
    }
}
