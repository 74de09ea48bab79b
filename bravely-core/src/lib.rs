use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

pub mod buffer;
pub mod container;
pub mod index;
pub mod layout;
pub mod shuffle;
pub mod table;

mod abilities;
mod items;
mod jobs;
mod magic;
mod qol;
mod randomizer;
mod spoiler;
mod treasures;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod testing;

pub use container::{Container, PatchBatch, Region};
pub use layout::{Edition, Layout, TableRef};
pub use randomizer::Randomizer;

#[derive(Debug, Error)]
pub enum RandomizerError {
    #[error("corrupt data: {len} bytes at 0x{offset:X} exceed buffer of {size} bytes")]
    CorruptData { offset: usize, len: usize, size: usize },

    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("contract violation: {0}")]
    Contract(String),

    #[error("region {0} is not loaded")]
    MissingRegion(String),

    #[error("table {name} not found in region {region}")]
    MissingTable { region: String, name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RandomizerError>;

fn default_output() -> PathBuf {
    PathBuf::from(".")
}

fn default_scale() -> f64 {
    1.0
}

/// Options for one randomizer run, loadable from the tool's settings JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RandomizerSettings {
    pub seed: u64,
    pub game: Edition,
    pub rom: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,

    #[serde(default)]
    pub jobs_magic: bool,
    #[serde(default)]
    pub jobs_support_costs: bool,
    #[serde(default)]
    pub jobs_stat_affinities: bool,
    #[serde(default)]
    pub jobs_specialties: bool,
    #[serde(default)]
    pub jobs_commands: bool,
    #[serde(default)]
    pub jobs_equip_aptitudes: bool,
    #[serde(default)]
    pub jobs_support: bool,
    #[serde(default)]
    pub jobs_mixed_abilities: bool,
    #[serde(default)]
    pub jobs_magic_levels: bool,
    #[serde(default)]
    pub treasures: bool,
    #[serde(default)]
    pub magic_starter_purchasable: bool,

    #[serde(default)]
    pub qol_mastered_jobs: bool,
    #[serde(default)]
    pub no_exp: bool,
    #[serde(default)]
    pub qol_teleport_stones: bool,
    #[serde(default = "default_scale")]
    pub qol_exp: f64,
    #[serde(default = "default_scale")]
    pub qol_jp: f64,
    #[serde(default = "default_scale")]
    pub qol_pg: f64,
}

impl RandomizerSettings {
    pub fn new(seed: u64, game: Edition, rom: impl Into<PathBuf>) -> Self {
        Self {
            seed,
            game,
            rom: rom.into(),
            output: default_output(),
            jobs_magic: false,
            jobs_support_costs: false,
            jobs_stat_affinities: false,
            jobs_specialties: false,
            jobs_commands: false,
            jobs_equip_aptitudes: false,
            jobs_support: false,
            jobs_mixed_abilities: false,
            jobs_magic_levels: false,
            treasures: false,
            magic_starter_purchasable: false,
            qol_mastered_jobs: false,
            no_exp: false,
            qol_teleport_stones: false,
            qol_exp: default_scale(),
            qol_jp: default_scale(),
            qol_pg: default_scale(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn output_root(&self) -> PathBuf {
        self.output
            .join(format!("patch_{}_{}", self.game.code(), self.seed))
    }

    fn validate(&self) -> Result<()> {
        if !self.rom.is_dir() {
            return Err(RandomizerError::Config(format!(
                "Input path is not a directory: {}",
                self.rom.display()
            )));
        }
        for (key, scale) in [
            ("qol-exp", self.qol_exp),
            ("qol-jp", self.qol_jp),
            ("qol-pg", self.qol_pg),
        ] {
            if !scale.is_finite() || scale < 0.0 {
                return Err(RandomizerError::Config(format!(
                    "{key} must be a non-negative number, got {scale}"
                )));
            }
        }
        Ok(())
    }
}

/// Loads the romfs, applies every enabled phase and writes the patch tree.
///
/// Returns the output root. On any failure the partially written output root
/// is removed before the error is returned.
pub fn run(settings: &RandomizerSettings) -> Result<PathBuf> {
    settings.validate()?;

    let out_root = settings.output_root();
    if out_root.exists() {
        fs::remove_dir_all(&out_root)?;
    }
    fs::create_dir_all(&out_root)?;

    match write_patch(settings, &out_root) {
        Ok(()) => {
            info!(output = %out_root.display(), "randomization complete");
            Ok(out_root)
        }
        Err(err) => {
            error!(%err, "randomization failed, removing {}", out_root.display());
            if let Err(cleanup) = fs::remove_dir_all(&out_root) {
                error!(%cleanup, "could not remove {}", out_root.display());
            }
            Err(err)
        }
    }
}

fn write_patch(settings: &RandomizerSettings, out_root: &Path) -> Result<()> {
    let layout = settings.game.layout();
    let container = Container::load(&settings.rom, &layout)?;

    let mut randomizer = Randomizer::new(container, layout, settings.seed)?;
    randomizer.randomize(settings)?;
    randomizer.quality_of_life(settings)?;

    let written = randomizer.container().dump(&out_root.join("romfs"))?;
    info!(files = written.len(), "payloads written");

    let log = randomizer.spoiler_log()?;
    fs::write(out_root.join("spoiler.log"), log)?;

    let manifest = serde_json::to_string_pretty(settings)?;
    fs::write(out_root.join("settings.json"), manifest)?;
    Ok(())
}
