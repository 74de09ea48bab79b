mod common;

use std::fs;
use std::path::{Path, PathBuf};

use bravely_core::{run, Edition, RandomizerError, RandomizerSettings};
use common::{bd_romfs, bs_romfs, write_romfs, FixtureRegion};

fn payload_files(regions: &[FixtureRegion]) -> Vec<PathBuf> {
    regions
        .iter()
        .map(|r| match r.index {
            Some(_) => Path::new(r.path).join("crowd.fs"),
            None => PathBuf::from(r.path),
        })
        .collect()
}

fn all_phases(seed: u64, game: Edition, rom: &Path, output: &Path) -> RandomizerSettings {
    let mut settings = RandomizerSettings::new(seed, game, rom);
    settings.output = output.to_path_buf();
    settings.jobs_magic = true;
    settings.jobs_support_costs = true;
    settings.jobs_stat_affinities = true;
    settings.jobs_specialties = true;
    settings.jobs_commands = true;
    settings.jobs_support = true;
    settings.jobs_mixed_abilities = true;
    settings.jobs_magic_levels = true;
    settings.jobs_equip_aptitudes = true;
    settings.treasures = true;
    settings.magic_starter_purchasable = true;
    settings.qol_mastered_jobs = true;
    settings.no_exp = true;
    settings.qol_teleport_stones = true;
    settings.qol_exp = 2.0;
    settings
}

#[test]
fn same_seed_writes_identical_patches() {
    for (game, regions) in [
        (Edition::BravelyDefault, bd_romfs()),
        (Edition::BravelySecond, bs_romfs()),
    ] {
        let dir = tempfile::tempdir().unwrap();
        let rom = dir.path().join("romfs");
        write_romfs(&rom, &regions);

        let first = run(&all_phases(2024, game, &rom, &dir.path().join("a"))).unwrap();
        let second = run(&all_phases(2024, game, &rom, &dir.path().join("b"))).unwrap();
        assert!(first.ends_with(format!("patch_{}_2024", game.code())));

        for file in payload_files(&regions) {
            let a = fs::read(first.join("romfs").join(&file)).unwrap();
            let b = fs::read(second.join("romfs").join(&file)).unwrap();
            assert_eq!(a, b, "{} differs between runs", file.display());
            assert_eq!(a.len(), fs::read(rom.join(&file)).unwrap().len());
        }
        assert_eq!(
            fs::read_to_string(first.join("spoiler.log")).unwrap(),
            fs::read_to_string(second.join("spoiler.log")).unwrap()
        );

        let manifest = fs::read_to_string(first.join("settings.json")).unwrap();
        let reloaded: RandomizerSettings = serde_json::from_str(&manifest).unwrap();
        assert_eq!(reloaded.seed, 2024);
        assert!(reloaded.jobs_magic);
    }
}

#[test]
fn different_seeds_usually_differ() {
    let dir = tempfile::tempdir().unwrap();
    let rom = dir.path().join("romfs");
    let regions = bd_romfs();
    write_romfs(&rom, &regions);

    let outputs: Vec<Vec<u8>> = (0..4)
        .map(|seed| {
            let root = run(&all_phases(seed, Edition::BravelyDefault, &rom, dir.path())).unwrap();
            fs::read(root.join("romfs").join("Common_en/Paramater/crowd.fs")).unwrap()
        })
        .collect();
    assert!(outputs.windows(2).any(|w| w[0] != w[1]));
}

#[test]
fn no_phases_round_trips_every_payload() {
    let dir = tempfile::tempdir().unwrap();
    let rom = dir.path().join("romfs");
    let regions = bs_romfs();
    write_romfs(&rom, &regions);

    let mut settings = RandomizerSettings::new(1, Edition::BravelySecond, &rom);
    settings.output = dir.path().join("out");
    let root = run(&settings).unwrap();

    for file in payload_files(&regions) {
        assert_eq!(
            fs::read(root.join("romfs").join(&file)).unwrap(),
            fs::read(rom.join(&file)).unwrap(),
            "{} changed",
            file.display()
        );
    }
    assert!(!root.join("romfs/Common_en/Parameter/Job/index.fs").exists());
}

#[test]
fn failed_run_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let rom = dir.path().join("romfs");
    let regions: Vec<FixtureRegion> = bd_romfs().into_iter().filter(|r| r.name != "Shop").collect();
    write_romfs(&rom, &regions);

    let settings = all_phases(8, Edition::BravelyDefault, &rom, dir.path());
    let stale = settings.output_root().join("stale.txt");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "previous run").unwrap();

    let err = run(&settings).unwrap_err();
    assert!(matches!(err, RandomizerError::Config(_)), "{err}");
    assert!(!settings.output_root().exists());
}

#[test]
fn rerun_replaces_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let rom = dir.path().join("romfs");
    write_romfs(&rom, &bd_romfs());

    let settings = all_phases(3, Edition::BravelyDefault, &rom, dir.path());
    let root = run(&settings).unwrap();
    fs::write(root.join("leftover.txt"), "x").unwrap();
    let again = run(&settings).unwrap();
    assert_eq!(root, again);
    assert!(!again.join("leftover.txt").exists());
    assert!(again.join("spoiler.log").is_file());
}
