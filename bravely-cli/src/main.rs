use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use bravely_core::{run, Container, Edition, RandomizerError, RandomizerSettings};

#[derive(Debug, Parser)]
#[command(name = "bravely-randomizer", version, about = "Bravely Default / Bravely Second randomizer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Randomize a romfs dump and write the patch tree.
    Randomize(RandomizeArgs),
    /// List the regions and tables found under a romfs directory.
    Inspect {
        #[arg(value_name = "DIR")]
        root: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RandomizeArgs {
    /// Settings JSON; flags given on the command line take precedence.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    rom: Option<PathBuf>,

    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// BD or BS.
    #[arg(long)]
    game: Option<Edition>,

    // Phase toggles: a bare flag means true, `--flag=false` overrides a
    // settings file.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_magic: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_support_costs: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_stat_affinities: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_specialties: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_commands: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_equip_aptitudes: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_support: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_mixed_abilities: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    jobs_magic_levels: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    treasures: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    magic_starter_purchasable: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    qol_mastered_jobs: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    no_exp: Option<bool>,

    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true", action = ArgAction::Set)]
    qol_teleport_stones: Option<bool>,

    #[arg(long)]
    qol_exp: Option<f64>,

    #[arg(long)]
    qol_jp: Option<f64>,

    #[arg(long)]
    qol_pg: Option<f64>,
}

macro_rules! override_toggles {
    ($settings:ident, $args:ident, $($flag:ident),+ $(,)?) => {
        $(
            if let Some(value) = $args.$flag {
                $settings.$flag = value;
            }
        )+
    };
}

fn missing(flag: &str) -> RandomizerError {
    RandomizerError::Config(format!("--{flag} is required when no --settings file is given"))
}

impl RandomizeArgs {
    fn into_settings(self) -> Result<RandomizerSettings, RandomizerError> {
        let mut settings = match &self.settings {
            Some(path) => RandomizerSettings::from_file(path)?,
            None => RandomizerSettings::new(
                self.seed.ok_or_else(|| missing("seed"))?,
                self.game.ok_or_else(|| missing("game"))?,
                self.rom.clone().ok_or_else(|| missing("rom"))?,
            ),
        };

        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(game) = self.game {
            settings.game = game;
        }
        if let Some(rom) = self.rom {
            settings.rom = rom;
        }
        if let Some(output) = self.output {
            settings.output = output;
        }

        override_toggles!(
            settings,
            self,
            jobs_magic,
            jobs_support_costs,
            jobs_stat_affinities,
            jobs_specialties,
            jobs_commands,
            jobs_equip_aptitudes,
            jobs_support,
            jobs_mixed_abilities,
            jobs_magic_levels,
            treasures,
            magic_starter_purchasable,
            qol_mastered_jobs,
            no_exp,
            qol_teleport_stones,
        );

        if let Some(scale) = self.qol_exp {
            settings.qol_exp = scale;
        }
        if let Some(scale) = self.qol_jp {
            settings.qol_jp = scale;
        }
        if let Some(scale) = self.qol_pg {
            settings.qol_pg = scale;
        }
        Ok(settings)
    }
}

fn inspect(root: PathBuf) -> Result<(), RandomizerError> {
    let container = Container::discover(&root)?;
    for region in container.regions() {
        println!("{} ({})", region.name(), region.path().display());
        for table in region.tables() {
            println!(
                "  {:<32} stride {:>4}  cols {:>3}  rows {:>5}",
                table.name(),
                table.stride(),
                table.column_count(),
                table.row_count()
            );
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Randomize(args) => args.into_settings().and_then(|settings| {
            let out_root = run(&settings)?;
            println!("Patch written to {}", out_root.display());
            Ok(())
        }),
        Command::Inspect { root } => inspect(root),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
