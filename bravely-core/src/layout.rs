use std::fmt;
use std::ops::{Range, RangeInclusive};

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Edition {
    #[serde(rename = "BD")]
    BravelyDefault,
    #[serde(rename = "BS")]
    BravelySecond,
}

impl Edition {
    pub fn code(self) -> &'static str {
        match self {
            Edition::BravelyDefault => "BD",
            Edition::BravelySecond => "BS",
        }
    }

    pub fn layout(self) -> Layout {
        match self {
            Edition::BravelyDefault => Layout::bravely_default(),
            Edition::BravelySecond => Layout::bravely_second(),
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BD" => Ok(Edition::BravelyDefault),
            "BS" => Ok(Edition::BravelySecond),
            other => Err(format!("unknown game '{other}', expected BD or BS")),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegionKind {
    // index.fs + crowd.fs directory
    Crowd,
    Standalone,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RegionSpec {
    pub name: &'static str,
    /// Directory (crowd) or file (standalone) relative to the romfs root.
    pub path: &'static str,
    pub kind: RegionKind,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TableRef {
    pub region: &'static str,
    pub table: &'static str,
}

impl TableRef {
    pub const fn new(region: &'static str, table: &'static str) -> Self {
        Self { region, table }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region, self.table)
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ItemColumns {
    pub id: usize,
    pub name: usize,
    pub order: usize,
    pub icon: usize,
    pub cost: usize,
    pub sell: usize,
}

#[derive(Clone, Debug)]
pub struct AbilityLayout {
    pub region: &'static str,
    pub command_table: &'static str,
    pub support_table: &'static str,
    /// Mirror of the support table that receives the same owner patches.
    pub support_mirror: Option<&'static str>,
    pub job_command_table: &'static str,
    pub command_name_col: usize,
    pub support_name_col: usize,
    pub job_command_name_col: usize,
    pub support_cost_col: usize,
    pub support_owner_col: usize,
    pub support_icon_col: Option<usize>,
    pub job_command_ids: Range<u32>,
    pub command_ids: Range<u32>,
    /// Ids at or above this value are support abilities.
    pub support_threshold: u32,
}

#[derive(Clone, Debug)]
pub struct AptitudeLayout {
    pub cols: RangeInclusive<usize>,
    /// Column paired with the lore support ability that needs top grade in it.
    pub lore: &'static [(usize, u32)],
    pub top_grade: u32,
    pub spoiler_cols: &'static [(&'static str, usize)],
}

#[derive(Clone, Debug)]
pub struct JobLayout {
    pub region: &'static str,
    pub index_table: &'static str,
    /// Column that maps a row of the index table to its `JobTableNN` file.
    /// `None` means the row number is the job number.
    pub index_col: Option<usize>,
    /// Number of `JobTableNN` files; index rows outside it are padding.
    pub job_count: usize,
    pub name_col: usize,
    pub specialty_col: usize,
    pub ability_col: usize,
    /// Columns consulted to name a level slot in the spoiler log.
    pub slot_cols: &'static [usize],
    pub aptitudes: Option<AptitudeLayout>,
}

/// Command-level columns touched when caster magic levels move between jobs.
#[derive(Clone, Debug)]
pub struct MagicLevelLayout {
    pub title_col: usize,
    pub job_index_command_col: usize,
    pub command_icon_col: usize,
    pub command_description_col: usize,
    pub description: &'static str,
}

#[derive(Clone, Debug)]
pub struct MagicLayout {
    pub tables: &'static [&'static str],
    pub red_mage: &'static str,
    pub spell_fencer: Option<&'static str>,
    /// Command ability ids shown with a spell fencer mark in detail text.
    pub spell_fencer_marks: Option<RangeInclusive<u32>>,
    pub summon_table: Option<&'static str>,
    pub summon_groups: &'static [[usize; 4]],
    pub mages: &'static [(&'static str, &'static str)],
    pub detail_info: TableRef,
    pub detail_commands: &'static [(&'static str, &'static [u32])],
    pub summoner: &'static str,
    pub starter_tables: &'static [&'static str],
    pub starter_shop: TableRef,
    pub levels: Option<MagicLevelLayout>,
}

#[derive(Clone, Debug)]
pub struct RewardLayout {
    pub monsters: TableRef,
    pub exp_cols: &'static [usize],
    pub jp_cols: &'static [usize],
    pub pg_cols: &'static [usize],
}

#[derive(Clone, Debug)]
pub struct TreasureLayout {
    pub region: &'static str,
    pub skipped: &'static [&'static str],
    /// Item ids at or above this value are key items and never move.
    pub key_item_floor: u32,
    pub copy_from: &'static str,
    pub copy_to: &'static str,
    pub copy_rows: usize,
    pub locations: &'static [(&'static str, &'static str)],
}

#[derive(Clone, Debug)]
pub struct Layout {
    pub edition: Edition,
    pub regions: Vec<RegionSpec>,
    pub items: TableRef,
    pub item_cols: ItemColumns,
    pub abilities: AbilityLayout,
    pub jobs: JobLayout,
    pub magic: MagicLayout,
    pub rewards: RewardLayout,
    pub pc_region: &'static str,
    pub treasures: Option<TreasureLayout>,
    pub teleport_stone: &'static str,
}

const fn crowd(name: &'static str, path: &'static str) -> RegionSpec {
    RegionSpec {
        name,
        path,
        kind: RegionKind::Crowd,
    }
}

const STATS: &[(&str, usize)] = &[
    ("HP", 4),
    ("MP", 5),
    ("STR", 6),
    ("VIT", 7),
    ("INT", 8),
    ("MND", 9),
    ("AGI", 10),
    ("DEX", 11),
];

/// Stat affinity columns shared by both editions' job tables.
pub fn stat_columns() -> &'static [(&'static str, usize)] {
    STATS
}

const BD_MAGES: &[(&str, &str)] = &[
    ("AbilityWMG.btb", "White Mage"),
    ("AbilityBMG.btb", "Black Mage"),
    ("AbilityWBM.btb", "Red Mage"),
    ("AbilityTMG.btb", "Time Mage"),
    ("AbilityMGS.btb", "Spell Fencer"),
    ("AbilitySMG.btb", "Summoner"),
    ("AbilitySMU.btb", "Conjurer"),
];

const BD_DETAIL_COMMANDS: &[(&str, &[u32])] = &[
    ("AbilityWMG.btb", &[2001, 2002, 2003, 2004, 2005, 2006]),
    ("AbilityBMG.btb", &[2009, 2010, 2011, 2012, 2013, 2014]),
    ("AbilityTMG.btb", &[2025, 2026, 2027, 2028, 2029, 2030]),
    ("AbilityMGS.btb", &[2037, 2038, 2039, 2040, 2041, 2042]),
    ("AbilitySMG.btb", &[2031, 2050, 2051, 2052, 2053, 2054]),
    ("AbilitySMU.btb", &[2055, 2056, 2057, 2058, 2059, 2060]),
    ("AbilityWBM.btb", &[2064, 2065, 2066, 2067]),
];

const BD_TREASURE_LOCATIONS: &[(&str, &str)] = &[
    ("EV_10.trb", "Small Airship"),
    ("EV_15.trb", "SS Funky Francisca"),
    ("ND_10.trb", "Norende Ravine"),
    ("ND_11.trb", "Ruins of Centro Keep"),
    ("ND_12.trb", "Lontano Villa"),
    ("ND_13.trb", "Temple of Wind"),
    ("ND_14.trb", "Vestment Cave"),
    ("ND_15.trb", "Harena Ruins"),
    ("ND_16.trb", "Grand Mill Works"),
    ("ND_17.trb", "Miasma Woods"),
    ("ND_18.trb", "Mount Framentum"),
    ("ND_19.trb", "Temple of Water"),
    ("ND_20.trb", "Witherwood"),
    ("ND_21.trb", "Florem Gardens"),
    ("ND_22.trb", "Twilight Ruins"),
    ("ND_23.trb", "Mythril Mines"),
    ("ND_24.trb", "Underflow"),
    ("ND_25.trb", "Temple of Fire"),
    ("ND_26.trb", "Starkfort Interior"),
    ("ND_27.trb", "Grapp Keep"),
    ("ND_28.trb", "Engine Room"),
    ("ND_29.trb", "Central Command"),
    ("ND_30.trb", "Everlast Tower & Temple of Earth"),
    ("ND_31.trb", "Vampire Castle"),
    ("ND_32.trb", "Dark Aurora"),
    ("ND_33.trb", "Dimension's Hasp"),
    ("TW_10.trb", "Kingdom of Caldisla"),
    ("TW_11.trb", "Ancheim"),
    ("TW_12.trb", "Yulyana Woods Needleworks"),
    ("TW_13.trb", "Florem"),
    ("TW_14.trb", "Grandship"),
    ("TW_16.trb", "Hartschild"),
    ("TW_17.trb", "Starkfort"),
    ("TW_18.trb", "Eternia"),
    ("TW_19.trb", "Gravemark Village"),
    ("TW_20.trb", "Grandship (Airship, Ch. 6+)"),
];

const BS_MAGES: &[(&str, &str)] = &[
    ("AbilityBMG.btb", "Black Mage"),
    ("AbilityWMG.btb", "White Mage"),
    ("AbilityTMG.btb", "Time Mage"),
    ("AbilitySMG.btb", "Summoner"),
    ("AbilityWBM.btb", "Red Mage"),
    ("AbilityBIS.btb", "Bishop"),
    ("AbilityWIZ.btb", "Wizard"),
    ("AbilityAST.btb", "Astrologian"),
    ("AbilityFOX.btb", "Yokai"),
];

const BS_DETAIL_COMMANDS: &[(&str, &[u32])] = &[
    ("AbilityWMG.btb", &[2001, 2002, 2003, 2004, 2005, 2006, 2007]),
    ("AbilityBMG.btb", &[2009, 2010, 2011, 2012, 2013, 2014, 2015]),
    ("AbilityTMG.btb", &[2025, 2026, 2027, 2028, 2029, 2030, 2032]),
    ("AbilitySMG.btb", &[2031, 2050, 2051, 2052, 2055]),
    ("AbilityWBM.btb", &[2064, 2065, 2066, 2067]),
    ("AbilityBIS.btb", &[2074, 2075, 2076, 2077, 2078, 2079, 2080]),
    ("AbilityWIZ.btb", &[2081]),
    ("AbilityAST.btb", &[2089, 2090, 2091, 2092, 2093, 2094, 2095]),
];

const BS_LORE: &[(usize, u32)] = &[
    (24, 20103), // Shield
    (12, 20201), // Rod
    (17, 20402), // Knuckle
    (15, 20502), // Bow
    (16, 20901), // Katana
    (10, 21002), // Axe
    (18, 21201), // Greatsword
    (11, 21701), // Spear
    (14, 22101), // Dagger
    (9, 22404),  // Sword
    (13, 22502), // Staff
    (19, 23002), // Rifle
    (22, 23003), // Armor
];

const BS_EQUIPMENT: &[(&str, usize)] = &[
    ("Swords", 9),
    ("Axes", 10),
    ("Spears", 11),
    ("Rods", 12),
    ("Staves", 13),
    ("Daggers", 14),
    ("Bows", 15),
    ("Katana", 16),
    ("Knuckles", 17),
    ("G. Swds", 18),
    ("Pistols", 19),
    ("Shields", 24),
    ("Helms", 21),
    ("Armor", 22),
];

impl Layout {
    pub fn bravely_default() -> Self {
        const PARAM: &str = "Paramater";
        Layout {
            edition: Edition::BravelyDefault,
            regions: vec![
                crowd(PARAM, "Common_en/Paramater"),
                crowd("TreasureTable", "Common_en/TreasureTable"),
                crowd("Battle", "Common_en/Battle"),
                crowd("Shop", "Common_en/Shop"),
            ],
            items: TableRef::new(PARAM, "ItemTable.btb"),
            item_cols: ItemColumns {
                id: 0,
                name: 4,
                order: 3,
                icon: 11,
                cost: 17,
                sell: 18,
            },
            abilities: AbilityLayout {
                region: PARAM,
                command_table: "CommandAbility.btb",
                support_table: "SupportAbility.btb",
                support_mirror: Some("SupportAbilityAL.btb"),
                job_command_table: "JobCommand.btb",
                command_name_col: 4,
                support_name_col: 3,
                job_command_name_col: 1,
                support_cost_col: 5,
                support_owner_col: 2,
                support_icon_col: Some(66),
                job_command_ids: 2000..2100,
                command_ids: 0..1000,
                support_threshold: 1000,
            },
            jobs: JobLayout {
                region: PARAM,
                index_table: "JobTable.btb",
                index_col: Some(1),
                job_count: 24,
                name_col: 2,
                specialty_col: 12,
                ability_col: 13,
                slot_cols: &[13, 16],
                aptitudes: None,
            },
            magic: MagicLayout {
                tables: &[
                    "AbilityWMG.btb",
                    "AbilityBMG.btb",
                    "AbilityTMG.btb",
                    "AbilityMGS.btb",
                ],
                red_mage: "AbilityWBM.btb",
                spell_fencer: Some("AbilityMGS.btb"),
                spell_fencer_marks: Some(75..=92),
                summon_table: None,
                summon_groups: &[],
                mages: BD_MAGES,
                detail_info: TableRef::new(PARAM, "DetailInfoMagicTable.btb"),
                detail_commands: BD_DETAIL_COMMANDS,
                summoner: "AbilitySMG.btb",
                starter_tables: &["AbilityWMG.btb", "AbilityBMG.btb"],
                starter_shop: TableRef::new("Shop", "TW_10_Magic.spb"),
                levels: Some(MagicLevelLayout {
                    title_col: 16,
                    job_index_command_col: 4,
                    command_icon_col: 4,
                    command_description_col: 3,
                    description: "Cast magic/summons.",
                }),
            },
            rewards: RewardLayout {
                monsters: TableRef::new("Battle", "MonsterData.btb"),
                exp_cols: &[91],
                jp_cols: &[92],
                pg_cols: &[93],
            },
            pc_region: PARAM,
            treasures: Some(TreasureLayout {
                region: "TreasureTable",
                skipped: &["TreasureMessageTable.btb"],
                key_item_floor: 90000,
                copy_from: "TW_20.trb",
                copy_to: "TW_14.trb",
                copy_rows: 7,
                locations: BD_TREASURE_LOCATIONS,
            }),
            teleport_stone: "Teleport Stone",
        }
    }

    pub fn bravely_second() -> Self {
        Layout {
            edition: Edition::BravelySecond,
            regions: vec![
                RegionSpec {
                    name: "Item",
                    path: "Common_en/Parameter/Item/ItemTable.btb",
                    kind: RegionKind::Standalone,
                },
                crowd("Ability", "Common_en/Parameter/Ability"),
                crowd("Job", "Common_en/Parameter/Job"),
                crowd("Shop", "Common_en/Shop"),
                crowd("Pc", "Common_en/Parameter/Pc"),
                crowd("Battle", "Common_en/Battle"),
                crowd("DetailInfo", "Common_en/Parameter/DetailInfo"),
            ],
            items: TableRef::new("Item", "ItemTable.btb"),
            item_cols: ItemColumns {
                id: 0,
                name: 4,
                order: 3,
                icon: 11,
                cost: 19,
                sell: 20,
            },
            abilities: AbilityLayout {
                region: "Ability",
                command_table: "CommandAbility.btb",
                support_table: "SupportAbility.btb",
                support_mirror: None,
                job_command_table: "JobCommand.btb",
                command_name_col: 4,
                support_name_col: 4,
                job_command_name_col: 2,
                support_cost_col: 6,
                support_owner_col: 2,
                support_icon_col: None,
                job_command_ids: 2000..2200,
                command_ids: 10000..20000,
                support_threshold: 20000,
            },
            jobs: JobLayout {
                region: "Job",
                index_table: "JobTable.btb",
                index_col: None,
                job_count: 24,
                name_col: 2,
                specialty_col: 12,
                ability_col: 13,
                slot_cols: &[13, 14, 15],
                aptitudes: Some(AptitudeLayout {
                    cols: 9..=24,
                    lore: BS_LORE,
                    top_grade: 200,
                    spoiler_cols: BS_EQUIPMENT,
                }),
            },
            magic: MagicLayout {
                tables: &[
                    "AbilityBMG.btb",
                    "AbilityWMG.btb",
                    "AbilityTMG.btb",
                    "AbilityBIS.btb",
                    "AbilityWIZ.btb",
                    "AbilityAST.btb",
                ],
                red_mage: "AbilityWBM.btb",
                spell_fencer: None,
                spell_fencer_marks: None,
                summon_table: Some("AbilitySMG.btb"),
                summon_groups: &[[0, 1, 8, 9], [2, 3, 10, 11], [4, 5, 12, 13], [6, 7, 14, 15]],
                mages: BS_MAGES,
                detail_info: TableRef::new("DetailInfo", "DetailInfoMagicTable.btb"),
                detail_commands: BS_DETAIL_COMMANDS,
                summoner: "AbilitySMG.btb",
                starter_tables: &["AbilityBMG.btb", "AbilityWMG.btb"],
                starter_shop: TableRef::new("Shop", "TW_10_Magic.spb"),
                levels: None,
            },
            rewards: RewardLayout {
                monsters: TableRef::new("Battle", "MonsterData.btb"),
                exp_cols: &[111, 112],
                jp_cols: &[113, 114],
                pg_cols: &[115, 116],
            },
            pc_region: "Pc",
            treasures: None,
            teleport_stone: "Teleport Stone",
        }
    }

    pub fn region(&self, name: &str) -> Option<&RegionSpec> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn is_support(&self, id: u32) -> bool {
        id >= self.abilities.support_threshold
    }
}
