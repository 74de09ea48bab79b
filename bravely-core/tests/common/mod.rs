//! Synthetic index/payload builders shared by unit and integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Builds an `index.fs` chain with one record per entry.
#[derive(Default)]
pub struct IndexBuilder {
    entries: Vec<(String, u32, u32)>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, name: &str, base: u32, size: u32) -> Self {
        self.entries.push((name.to_string(), base, size));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let records: Vec<Vec<u8>> = self
            .entries
            .iter()
            .map(|(name, base, size)| {
                let mut record = Vec::new();
                push_u32(&mut record, 0);
                push_u32(&mut record, *base);
                push_u32(&mut record, *size);
                push_u32(&mut record, checksum(name));
                record.extend_from_slice(name.as_bytes());
                record.push(0);
                pad4(&mut record);
                record
            })
            .collect();

        let mut out = Vec::new();
        let count = records.len();
        for (i, mut record) in records.into_iter().enumerate() {
            if i + 1 < count {
                let next = (out.len() + record.len()) as u32;
                record[..4].copy_from_slice(&next.to_le_bytes());
            }
            out.extend(record);
        }
        out
    }
}

fn checksum(name: &str) -> u32 {
    name.bytes()
        .fold(0x811C_9DC5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193))
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn pad4(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

/// Builds one table subfile: 8 bytes of magic, the 8-field header, rows,
/// labels (1-byte units) and names (2-byte units).
#[derive(Clone)]
pub struct TableBuilder {
    columns: usize,
    rows: Vec<Vec<u32>>,
    labels: Vec<String>,
    text: Vec<(usize, Vec<String>)>,
}

impl TableBuilder {
    pub const DATA_OFFSET: usize = 0x28;

    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            labels: Vec::new(),
            text: Vec::new(),
        }
    }

    pub fn row(mut self, values: &[u32]) -> Self {
        assert!(values.len() <= self.columns, "row wider than table");
        let mut row = values.to_vec();
        row.resize(self.columns, 0);
        self.rows.push(row);
        self
    }

    /// Sets `col` of a row from a sparse list of `(col, value)` pairs.
    pub fn sparse_row(self, cells: &[(usize, u32)]) -> Self {
        let mut row = vec![0; self.columns];
        for &(col, value) in cells {
            row[col] = value;
        }
        self.row(&row)
    }

    pub fn label(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }

    /// Stores `texts` in the name region and points rows `0..texts.len()` of
    /// `col` at them, adding empty rows as needed.
    pub fn text_column(mut self, col: usize, texts: &[&str]) -> Self {
        self.text
            .push((col, texts.iter().map(|t| t.to_string()).collect()));
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let mut names = Vec::new();
        for (col, texts) in &self.text {
            for (row, text) in texts.iter().enumerate() {
                while self.rows.len() <= row {
                    self.rows.push(vec![0; self.columns]);
                }
                self.rows[row][*col] = names.len() as u32;
                for unit in text.encode_utf16() {
                    names.extend_from_slice(&unit.to_le_bytes());
                }
                names.extend_from_slice(&[0, 0]);
            }
        }
        pad4(&mut names);

        let mut labels = Vec::new();
        for label in &self.labels {
            labels.extend_from_slice(label.as_bytes());
            labels.push(0);
        }
        pad4(&mut labels);

        let stride = self.columns * 4;
        let data_size = stride * self.rows.len();
        let label_offset = Self::DATA_OFFSET + data_size;
        let name_offset = label_offset + labels.len();

        let mut out = b"@BTB\x01\0\0\0".to_vec();
        for field in [
            Self::DATA_OFFSET,
            data_size,
            if labels.is_empty() { 0 } else { label_offset },
            labels.len(),
            if names.is_empty() { 0 } else { name_offset },
            names.len(),
            stride,
            self.rows.len(),
        ] {
            push_u32(&mut out, field as u32);
        }
        for row in &self.rows {
            for &value in row {
                push_u32(&mut out, value);
            }
        }
        out.extend(labels);
        out.extend(names);
        out
    }
}

/// Packs several tables into an `index.fs` / `crowd.fs` pair.
#[derive(Default)]
pub struct CrowdBuilder {
    tables: Vec<(String, Vec<u8>)>,
}

impl CrowdBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, name: &str, table: TableBuilder) -> Self {
        self.tables.push((name.to_string(), table.build()));
        self
    }

    /// Returns `(index, payload)`.
    pub fn build(self) -> (Vec<u8>, Vec<u8>) {
        let mut payload = Vec::new();
        let mut index = IndexBuilder::new();
        for (name, bytes) in self.tables {
            while payload.len() % 16 != 0 {
                payload.push(0);
            }
            index = index.entry(&name, payload.len() as u32, bytes.len() as u32);
            payload.extend(bytes);
        }
        (index.build(), payload)
    }
}

/// One region of a synthetic romfs.
pub struct FixtureRegion {
    pub name: &'static str,
    pub path: &'static str,
    /// `None` for standalone table files.
    pub index: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

pub fn write_romfs(root: &Path, regions: &[FixtureRegion]) {
    for region in regions {
        match &region.index {
            Some(index) => {
                let dir = root.join(region.path);
                fs::create_dir_all(&dir).unwrap();
                fs::write(dir.join("index.fs"), index).unwrap();
                fs::write(dir.join("crowd.fs"), &region.payload).unwrap();
            }
            None => {
                let file = root.join(region.path);
                fs::create_dir_all(file.parent().unwrap()).unwrap();
                fs::write(file, &region.payload).unwrap();
            }
        }
    }
}

fn crowd_region(name: &'static str, path: &'static str, crowd: CrowdBuilder) -> FixtureRegion {
    let (index, payload) = crowd.build();
    FixtureRegion {
        name,
        path,
        index: Some(index),
        payload,
    }
}

const LONG_TEXT: &str =
    "Placeholder text long enough to hold any rewritten description in these fixtures.";

pub const BD_ITEMS: &[(u32, &str)] = &[
    (100, "Teleport Stone"),
    (101, "Potion"),
    (102, "Dummy Item"),
    (103, "Phoenix Down"),
    (200, "Broadsword"),
    (50000, "Cure"),
    (50001, "Poisona"),
    (50002, "Raise"),
    (50003, "Protect"),
    (50100, "Fire"),
    (50101, "Blizzard"),
    (50102, "Thunder"),
    (50103, "Aero"),
    (50200, "Slow"),
    (50201, "Haste"),
    (90001, "Sky Knight Key"),
];

/// `(job index, name, abilities col 13, titles col 16, specialty)`
pub const BD_JOBS: &[(u32, &str, [u32; 4], [u32; 4], u32)] = &[
    (0, "Freelancer", [1, 1001, 2, 1002], [0; 4], 1100),
    (1, "Knight", [3, 1003, 4, 1004], [0; 4], 1101),
    (2, "White Mage", [0, 1005, 0, 1006], [2001, 0, 2002, 0], 1102),
    (3, "Black Mage", [0, 1007, 0, 1008], [2009, 0, 2010, 0], 1103),
];

pub const BD_SUPPORT: &[(u32, &str, u32)] = &[
    (1001, "Abilities Up", 1),
    (1002, "Free Lunch", 2),
    (1003, "Shield Up", 3),
    (1004, "Protect Ally", 4),
    (1005, "Magic Up", 1),
    (1006, "Cure Up", 2),
    (1007, "Black Magic Up", 3),
    (1008, "Magic Defense Up", 4),
    (1100, "Genome Drain", 1),
    (1101, "Chivalry", 2),
    (1102, "Angel Whisper", 3),
    (1103, "Black Magic Amp", 4),
];

/// `(level, ability, item)` rows per magic table.
pub const BD_MAGIC: &[(&str, &[(u32, u32, u32)])] = &[
    ("AbilityWMG.btb", &[(1, 10, 50000), (1, 11, 50001), (2, 12, 50002), (2, 13, 50003)]),
    ("AbilityBMG.btb", &[(1, 20, 50100), (1, 21, 50101), (2, 22, 50102), (2, 23, 50103)]),
    ("AbilityTMG.btb", &[(1, 30, 50200), (2, 31, 50201)]),
    ("AbilityMGS.btb", &[(1, 75, 50100), (2, 76, 50002)]),
    ("AbilityWBM.btb", &[(1, 10, 50000), (1, 20, 50100)]),
];

pub const BD_COMMANDS: &[(u32, &str)] = &[
    (1, "Mug"),
    (2, "Attack"),
    (3, "Defend"),
    (4, "Dragon Slayer"),
    (10, "Cure"),
    (11, "Poisona"),
    (12, "Raise"),
    (13, "Protect"),
    (20, "Fire"),
    (21, "Blizzard"),
    (22, "Thunder"),
    (23, "Aero"),
    (30, "Slow"),
    (31, "Haste"),
    (75, "Fire Strike"),
    (76, "Raise Strike"),
];

pub const BD_JOB_COMMANDS: &[(u32, &str, u32)] = &[
    (2001, "White Magic 1", 40),
    (2002, "White Magic 2", 41),
    (2009, "Black Magic 1", 50),
    (2010, "Black Magic 2", 51),
];

pub const BD_STARTER_SHOP: &[u32] = &[50000, 50001, 50100, 50200, 101];

/// A small but complete Bravely Default romfs.
pub fn bd_romfs() -> Vec<FixtureRegion> {
    let mut items = TableBuilder::new(20);
    for (i, (id, _)) in BD_ITEMS.iter().enumerate() {
        let i = i as u32;
        items = items.sparse_row(&[(0, *id), (3, 10 + i), (11, 300 + i), (17, 100 * (i + 1)), (18, 50 * (i + 1))]);
    }
    let item_names: Vec<&str> = BD_ITEMS.iter().map(|(_, n)| *n).collect();
    let items = items.text_column(4, &item_names);

    let mut commands = TableBuilder::new(5);
    for (id, _) in BD_COMMANDS {
        commands = commands.row(&[*id]);
    }
    let command_names: Vec<&str> = BD_COMMANDS.iter().map(|(_, n)| *n).collect();
    let commands = commands.text_column(4, &command_names);

    let support_table = || {
        let mut table = TableBuilder::new(67);
        for (id, _, cost) in BD_SUPPORT {
            let owner = BD_JOBS
                .iter()
                .find(|job| job.2.contains(id) || job.4 == *id)
                .map(|job| job.0)
                .unwrap_or(0);
            table = table.sparse_row(&[(0, *id), (2, owner), (5, *cost), (66, 500 + owner)]);
        }
        let names: Vec<&str> = BD_SUPPORT.iter().map(|(_, n, _)| *n).collect();
        table.text_column(3, &names)
    };

    let mut job_commands = TableBuilder::new(5);
    for (id, _, icon) in BD_JOB_COMMANDS {
        job_commands = job_commands.sparse_row(&[(0, *id), (4, *icon)]);
    }
    let job_command_names: Vec<&str> = BD_JOB_COMMANDS.iter().map(|(_, n, _)| *n).collect();
    let job_commands = job_commands
        .text_column(1, &job_command_names)
        .text_column(3, &[LONG_TEXT; 4]);

    // Rows deliberately out of job-index order.
    let mut job_index = TableBuilder::new(5);
    let mut job_names = Vec::new();
    for &(index, name, _, titles, _) in BD_JOBS.iter().rev() {
        job_index = job_index.sparse_row(&[(1, index), (4, titles[0])]);
        job_names.push(name);
    }
    let job_index = job_index.text_column(2, &job_names);

    let mut crowd = CrowdBuilder::new()
        .table("ItemTable.btb", items)
        .table("CommandAbility.btb", commands)
        .table("SupportAbility.btb", support_table())
        .table("SupportAbilityAL.btb", support_table())
        .table("JobCommand.btb", job_commands)
        .table("JobTable.btb", job_index);

    for &(index, _, abilities, titles, specialty) in BD_JOBS {
        let mut job = TableBuilder::new(17);
        for level in 0..4 {
            let stat = 100 + index * 10 + level as u32;
            let mut cells = vec![
                (1, 10 * (level as u32 + 1)),
                (2, 5),
                (13, abilities[level]),
                (16, titles[level]),
            ];
            for col in 4..12 {
                cells.push((col, stat + col as u32));
            }
            if level == 0 {
                cells.push((12, specialty));
            }
            job = job.sparse_row(&cells);
        }
        crowd = crowd.table(&format!("JobTable{index:02}.btb"), job);
    }

    for (name, rows) in BD_MAGIC {
        let mut table = TableBuilder::new(3);
        for &(level, ability, item) in *rows {
            table = table.row(&[level, ability, item]);
        }
        crowd = crowd.table(name, table);
    }

    let detail_ids = [2001, 2002, 2009, 2010, 2025, 2026, 2037, 2038, 2064];
    let mut detail = TableBuilder::new(3);
    for id in detail_ids {
        detail = detail.row(&[id]);
    }
    crowd = crowd.table(
        "DetailInfoMagicTable.btb",
        detail.text_column(2, &[LONG_TEXT; 9]),
    );

    for pc in 1..=2 {
        let mut table = TableBuilder::new(3);
        for level in 1..=5u32 {
            table = table.row(&[level, level * 100, 100]);
        }
        crowd = crowd.table(&format!("PcLevelTable00{pc}.btb"), table);
    }

    let treasure = |rows: &[[u32; 3]]| {
        let mut table = TableBuilder::new(4);
        for (chest, row) in rows.iter().enumerate() {
            table = table.row(&[chest as u32, row[0], row[1], row[2]]);
        }
        table
    };
    let treasures = CrowdBuilder::new()
        .table(
            "TW_14.trb",
            treasure(&[
                [101, 0, 1],
                [0, 500, 0],
                [103, 0, 2],
                [0, 0, 0],
                [101, 0, 3],
                [200, 0, 1],
                [101, 0, 1],
                [90001, 0, 1],
            ]),
        )
        .table(
            "TW_20.trb",
            treasure(&[
                [103, 0, 1],
                [0, 1000, 0],
                [101, 0, 1],
                [101, 0, 2],
                [0, 0, 0],
                [200, 0, 1],
                [103, 0, 1],
                [0, 250, 0],
            ]),
        )
        .table("ND_10.trb", treasure(&[[101, 0, 1], [0, 0, 0], [90001, 0, 1]]))
        .table(
            "TreasureMessageTable.btb",
            TableBuilder::new(2).row(&[1, 2]).text_column(1, &["You found a treasure!"]),
        );

    let mut monsters = TableBuilder::new(94);
    for (exp, jp, pg) in [(10, 2, 30), (500_000, 600, 400_000), (0, 0, 0)] {
        monsters = monsters.sparse_row(&[(0, 1), (91, exp), (92, jp), (93, pg)]);
    }
    let battle = CrowdBuilder::new().table("MonsterData.btb", monsters);

    let mut shop = TableBuilder::new(2);
    for item in BD_STARTER_SHOP {
        shop = shop.row(&[*item, 0]);
    }
    let shops = CrowdBuilder::new()
        .table("TW_10_Magic.spb", shop)
        .table("ShopMasterTable_Magic.spb", TableBuilder::new(2).row(&[1, 1]));

    vec![
        crowd_region("Paramater", "Common_en/Paramater", crowd),
        crowd_region("TreasureTable", "Common_en/TreasureTable", treasures),
        crowd_region("Battle", "Common_en/Battle", battle),
        crowd_region("Shop", "Common_en/Shop", shops),
    ]
}

pub const BS_JOBS: &[&str] = &["Freelancer", "Knight", "Black Mage", "White Mage"];

/// A small Bravely Second romfs: four jobs, one standalone item table.
pub fn bs_romfs() -> Vec<FixtureRegion> {
    let item_rows: &[(u32, &str)] = &[
        (100, "Teleport Stone"),
        (101, "Potion"),
        (50000, "Cure"),
        (50001, "Esuna"),
        (50100, "Fire"),
        (50101, "Blizzard"),
        (50200, "Slow"),
        (50201, "Haste"),
        (50300, "Banish"),
        (50400, "Flare"),
        (50500, "Libra"),
        (51000, "Ifrit"),
    ];
    let mut items = TableBuilder::new(21);
    for (i, (id, _)) in item_rows.iter().enumerate() {
        let i = i as u32;
        items = items.sparse_row(&[(0, *id), (3, i), (11, 400 + i), (19, 80 * (i + 1)), (20, 40 * (i + 1))]);
    }
    let names: Vec<&str> = item_rows.iter().map(|(_, n)| *n).collect();
    let item_table = items.text_column(4, &names).build();

    // Job abilities: 10001.. commands, 20001.. supports, 0 for magic.
    let abilities: [[u32; 3]; 4] = [
        [10001, 20001, 10002],
        [10003, 20103, 20002],
        [0, 20003, 0],
        [0, 20004, 0],
    ];
    let specialties = [20100, 20101, 20102, 20104];

    let mut job_index = TableBuilder::new(25);
    for row in 0..4u32 {
        let mut cells = vec![];
        for col in 9..25 {
            // Grade 200 (S) sits with Knight for shields; others descend.
            let grade = if col == 24 && row == 1 { 200 } else { 100 + 20 * ((row + col as u32) % 5) };
            cells.push((col, grade));
        }
        job_index = job_index.sparse_row(&cells);
    }
    let job_index = job_index.text_column(2, BS_JOBS);

    let mut jobs = CrowdBuilder::new().table("JobTable.btb", job_index);
    for (i, slots) in abilities.iter().enumerate() {
        let mut job = TableBuilder::new(16);
        for (level, &ability) in slots.iter().enumerate() {
            let mut cells = vec![(1, 100), (2, 50), (13, ability)];
            for col in 4..12 {
                cells.push((col, 90 + i as u32 * 5 + col as u32));
            }
            if level == 0 {
                cells.push((12, specialties[i]));
            }
            if ability == 0 {
                cells.push((14, 2001 + level as u32));
            }
            job = job.sparse_row(&cells);
        }
        jobs = jobs.table(&format!("JobTable{i:02}.btb"), job);
    }

    let supports: &[(u32, &str)] = &[
        (20001, "Abilities Up"),
        (20002, "Free Lunch"),
        (20003, "Magic Up"),
        (20004, "Cure Up"),
        (20100, "Genome Drain"),
        (20101, "Chivalry"),
        (20102, "Bookkeeper"),
        (20103, "Shield Lore"),
        (20104, "Magic Amp"),
    ];
    let mut support = TableBuilder::new(7);
    for (row, (id, _)) in supports.iter().enumerate() {
        support = support.sparse_row(&[(0, *id), (2, row as u32 % 4), (6, row as u32 + 1)]);
    }
    let support_names: Vec<&str> = supports.iter().map(|(_, n)| *n).collect();
    let support = support.text_column(4, &support_names);

    let mut commands = TableBuilder::new(5);
    let command_rows: &[(u32, &str)] = &[
        (10001, "Mug"),
        (10002, "Attack"),
        (10003, "Defend"),
        (10010, "Cure"),
        (10011, "Esuna"),
        (10020, "Fire"),
        (10021, "Blizzard"),
        (10030, "Slow"),
        (10031, "Haste"),
        (10040, "Ifrit"),
    ];
    for (id, _) in command_rows {
        commands = commands.row(&[*id]);
    }
    let command_names: Vec<&str> = command_rows.iter().map(|(_, n)| *n).collect();
    let commands = commands.text_column(4, &command_names);

    let job_commands = TableBuilder::new(3)
        .row(&[2001])
        .row(&[2002])
        .text_column(2, &["White Magic", "Black Magic"]);

    let magic = |rows: &[(u32, u32, u32)]| {
        let mut table = TableBuilder::new(3);
        for &(level, ability, item) in rows {
            table = table.row(&[level, ability, item]);
        }
        table
    };
    let mut summons = TableBuilder::new(3);
    for row in 0..16u32 {
        summons = summons.row(&[1 + row / 8, 10040 + row, 51000]);
    }

    let ability_region = CrowdBuilder::new()
        .table("CommandAbility.btb", commands)
        .table("SupportAbility.btb", support)
        .table("JobCommand.btb", job_commands)
        .table("AbilityBMG.btb", magic(&[(1, 10020, 50100), (1, 10021, 50101)]))
        .table("AbilityWMG.btb", magic(&[(1, 10010, 50000), (1, 10011, 50001)]))
        .table("AbilityTMG.btb", magic(&[(1, 10030, 50200), (2, 10031, 50201)]))
        .table("AbilityBIS.btb", magic(&[(2, 10050, 50300)]))
        .table("AbilityWIZ.btb", magic(&[(2, 10060, 50400)]))
        .table("AbilityAST.btb", magic(&[(2, 10070, 50500)]))
        .table("AbilityWBM.btb", magic(&[(1, 10010, 50000), (1, 10020, 50100)]))
        .table("AbilitySMG.btb", summons);

    let detail = TableBuilder::new(3)
        .row(&[2001])
        .row(&[2009])
        .row(&[2025])
        .row(&[2064])
        .text_column(2, &[LONG_TEXT; 4]);

    let mut pc = CrowdBuilder::new();
    for i in 1..=3 {
        let mut table = TableBuilder::new(3);
        for level in 1..=4u32 {
            table = table.row(&[level, level * 50, 50]);
        }
        pc = pc.table(&format!("PcLevelTable00{i}.btb"), table);
    }

    let mut monsters = TableBuilder::new(117);
    monsters = monsters.sparse_row(&[(111, 100), (112, 200), (113, 10), (114, 20), (115, 300), (116, 400)]);

    let shop = TableBuilder::new(1)
        .row(&[50000])
        .row(&[50001])
        .row(&[50100])
        .row(&[50101]);

    vec![
        FixtureRegion {
            name: "Item",
            path: "Common_en/Parameter/Item/ItemTable.btb",
            index: None,
            payload: item_table,
        },
        crowd_region("Ability", "Common_en/Parameter/Ability", ability_region),
        crowd_region("Job", "Common_en/Parameter/Job", jobs),
        crowd_region("Shop", "Common_en/Shop", CrowdBuilder::new().table("TW_10_Magic.spb", shop)),
        crowd_region("Pc", "Common_en/Parameter/Pc", pc),
        crowd_region(
            "Battle",
            "Common_en/Battle",
            CrowdBuilder::new().table("MonsterData.btb", monsters),
        ),
        crowd_region(
            "DetailInfo",
            "Common_en/Parameter/DetailInfo",
            CrowdBuilder::new().table("DetailInfoMagicTable.btb", detail),
        ),
    ]
}
