//! Regulatory table store.
//!
//! Holds the immutable lookup data the calculators consult: NBR 14276
//! brigade rules, NR-05 Quadro I (CIPA) and NR-04 Quadro II (SESMT) bands,
//! and the audit checklists. A [`TableStore`] is built once at startup,
//! validated, and shared read-only (`Arc<TableStore>`) by every handler.
//!
//! # Lookups
//!
//! | Method | Unknown key |
//! |--------|-------------|
//! | [`TableStore::lookup_brigade_rule`] | group default, then global default |
//! | [`TableStore::lookup_cipa_band`] | unknown risk grade → `Configuration` error |
//! | [`TableStore::lookup_sesmt_band`] | unknown risk grade → `Configuration` error |
//! | [`TableStore::checklist_items`] | empty list |
//!
//! Operators may replace the built-in definitions with a TOML file of the
//! same shape as [`TableDefinitions`] (`[tables] path` in the config).

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::checklists;
use crate::config::TablesConfig;
use crate::error::SstError;
use crate::models::{BrigadeRule, RoleCounts, SesmtRole, TrainingTier};

/// Risk grades defined by NR-04 Anexo I.
pub const RISK_GRADES: [u8; 4] = [1, 2, 3, 4];

/// An inclusive headcount band. `high == None` marks the open-ended last band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Band<T> {
    pub low: u32,
    pub high: Option<u32>,
    pub value: T,
}

impl<T> Band<T> {
    fn contains(&self, headcount: u32) -> bool {
        self.low <= headcount && self.high.map_or(true, |hi| headcount <= hi)
    }
}

/// CIPA seats: (effective, alternate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipaSeats {
    pub effective: u32,
    pub alternate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChecklistDefinition {
    pub name: String,
    pub items: Vec<String>,
}

/// How a division code was matched to a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleResolution {
    Exact,
    /// Code unknown; the default rule of its letter group was used.
    GroupDefault,
    /// Neither the code nor its group is known; the office rule was used.
    GlobalDefault,
}

#[derive(Debug, Clone)]
pub struct ResolvedRule<'a> {
    /// The normalized code the caller asked for.
    pub requested: String,
    pub rule: &'a BrigadeRule,
    pub resolution: RuleResolution,
}

// ============ Serializable definitions ============

#[derive(Debug, Clone, Deserialize)]
pub struct TableDefinitions {
    pub brigade: BrigadeDefinitions,
    pub cipa: Vec<CipaBandDefinition>,
    pub sesmt: Vec<SesmtBandDefinition>,
    #[serde(default)]
    pub checklists: Vec<ChecklistDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrigadeDefinitions {
    pub rules: Vec<BrigadeRule>,
    /// Letter group → rule code used when a code of that group is unknown.
    pub group_defaults: BTreeMap<String, String>,
    pub global_default: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CipaBandDefinition {
    pub grade: u8,
    pub low: u32,
    #[serde(default)]
    pub high: Option<u32>,
    pub effective: u32,
    pub alternate: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SesmtBandDefinition {
    pub grade: u8,
    pub low: u32,
    #[serde(default)]
    pub high: Option<u32>,
    #[serde(default)]
    pub safety_technician: u32,
    #[serde(default)]
    pub safety_engineer: u32,
    #[serde(default)]
    pub nursing_assistant: u32,
    #[serde(default)]
    pub nurse: u32,
    #[serde(default)]
    pub physician: u32,
}

impl SesmtBandDefinition {
    fn role_counts(&self) -> RoleCounts {
        let mut counts = RoleCounts::new();
        counts.insert(SesmtRole::SafetyTechnician, self.safety_technician);
        counts.insert(SesmtRole::SafetyEngineer, self.safety_engineer);
        counts.insert(SesmtRole::NursingAssistant, self.nursing_assistant);
        counts.insert(SesmtRole::Nurse, self.nurse);
        counts.insert(SesmtRole::Physician, self.physician);
        counts
    }
}

// ============ Store ============

#[derive(Debug, Clone)]
pub struct TableStore {
    brigade: HashMap<String, BrigadeRule>,
    group_defaults: HashMap<char, String>,
    global_default: String,
    cipa: BTreeMap<u8, Vec<Band<CipaSeats>>>,
    sesmt: BTreeMap<u8, Vec<Band<RoleCounts>>>,
    checklists: Vec<ChecklistDefinition>,
}

impl TableStore {
    /// Built-in tables.
    pub fn standard() -> Result<Self, SstError> {
        Self::from_definitions(standard_definitions())
    }

    /// The operator's tables file when `[tables] path` is set, else the
    /// built-in tables.
    pub fn from_config(config: &TablesConfig) -> Result<Self, SstError> {
        match &config.path {
            Some(path) => Self::from_toml_file(path),
            None => Self::standard(),
        }
    }

    /// Load definitions from an operator-supplied TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, SstError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SstError::config(format!("cannot read tables file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, SstError> {
        let defs: TableDefinitions = toml::from_str(content)
            .map_err(|e| SstError::config(format!("malformed tables file: {}", e)))?;
        Self::from_definitions(defs)
    }

    /// Validate and index a set of definitions.
    pub fn from_definitions(defs: TableDefinitions) -> Result<Self, SstError> {
        let mut brigade = HashMap::new();
        for rule in defs.brigade.rules {
            if rule.rate_percent > 100 {
                return Err(SstError::config(format!(
                    "brigade rule {} has rate {}%, must be within 0-100",
                    rule.code, rule.rate_percent
                )));
            }
            let code = normalize_code(&rule.code);
            if brigade.contains_key(&code) {
                return Err(SstError::config(format!("duplicate brigade rule {}", code)));
            }
            brigade.insert(code.clone(), BrigadeRule { code, ..rule });
        }

        let global_default = normalize_code(&defs.brigade.global_default);
        if !brigade.contains_key(&global_default) {
            return Err(SstError::config(format!(
                "global default brigade rule {} is not defined",
                global_default
            )));
        }

        let mut group_defaults = HashMap::new();
        for (group, code) in defs.brigade.group_defaults {
            let mut letters = group.trim().chars();
            let letter = match (letters.next(), letters.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
                _ => {
                    return Err(SstError::config(format!(
                        "brigade group '{}' must be a single letter",
                        group
                    )))
                }
            };
            let code = normalize_code(&code);
            if !brigade.contains_key(&code) {
                return Err(SstError::config(format!(
                    "group default {} for group {} is not defined",
                    code, letter
                )));
            }
            group_defaults.insert(letter, code);
        }

        let mut cipa: BTreeMap<u8, Vec<Band<CipaSeats>>> = BTreeMap::new();
        for def in defs.cipa {
            cipa.entry(def.grade).or_default().push(Band {
                low: def.low,
                high: def.high,
                value: CipaSeats {
                    effective: def.effective,
                    alternate: def.alternate,
                },
            });
        }
        validate_band_table("cipa", &mut cipa)?;

        let mut sesmt: BTreeMap<u8, Vec<Band<RoleCounts>>> = BTreeMap::new();
        for def in defs.sesmt {
            sesmt.entry(def.grade).or_default().push(Band {
                low: def.low,
                high: def.high,
                value: def.role_counts(),
            });
        }
        validate_band_table("sesmt", &mut sesmt)?;

        let mut seen = HashSet::new();
        for list in &defs.checklists {
            if !seen.insert(list.name.as_str()) {
                return Err(SstError::config(format!(
                    "duplicate checklist '{}'",
                    list.name
                )));
            }
        }

        Ok(Self {
            brigade,
            group_defaults,
            global_default,
            cipa,
            sesmt,
            checklists: defs.checklists,
        })
    }

    /// Resolve a division code to a rule: exact match, then the group
    /// default for its first letter, then the global default.
    pub fn lookup_brigade_rule(&self, code: &str) -> ResolvedRule<'_> {
        let requested = normalize_code(code);

        if let Some(rule) = self.brigade.get(&requested) {
            return ResolvedRule {
                requested,
                rule,
                resolution: RuleResolution::Exact,
            };
        }

        let group_rule = requested
            .chars()
            .next()
            .and_then(|c| self.group_defaults.get(&c))
            .and_then(|code| self.brigade.get(code));
        if let Some(rule) = group_rule {
            return ResolvedRule {
                requested,
                rule,
                resolution: RuleResolution::GroupDefault,
            };
        }

        ResolvedRule {
            requested,
            // present: checked in from_definitions
            rule: &self.brigade[&self.global_default],
            resolution: RuleResolution::GlobalDefault,
        }
    }

    pub fn lookup_cipa_band(&self, risk_grade: u8, headcount: u32) -> Result<CipaSeats, SstError> {
        let bands = self
            .cipa
            .get(&risk_grade)
            .ok_or_else(|| unknown_grade(risk_grade))?;
        Ok(find_band(bands, headcount).value)
    }

    pub fn lookup_sesmt_band(&self, risk_grade: u8, headcount: u32) -> Result<RoleCounts, SstError> {
        let bands = self
            .sesmt
            .get(&risk_grade)
            .ok_or_else(|| unknown_grade(risk_grade))?;
        Ok(find_band(bands, headcount).value.clone())
    }

    pub fn list_checklists(&self) -> Vec<String> {
        self.checklists.iter().map(|c| c.name.clone()).collect()
    }

    pub fn checklist_items(&self, name: &str) -> Vec<String> {
        self.checklists
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.items.clone())
            .unwrap_or_default()
    }

    pub fn brigade_rules(&self) -> impl Iterator<Item = &BrigadeRule> {
        self.brigade.values()
    }

    #[cfg(test)]
    fn cipa_bands(&self, grade: u8) -> &[Band<CipaSeats>] {
        &self.cipa[&grade]
    }

    #[cfg(test)]
    fn sesmt_bands(&self, grade: u8) -> &[Band<RoleCounts>] {
        &self.sesmt[&grade]
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn unknown_grade(grade: u8) -> SstError {
    SstError::config(format!(
        "unknown risk grade {}; expected one of 1, 2, 3, 4",
        grade
    ))
}

/// Headcounts past the last bounded band clamp to the last band.
fn find_band<T>(bands: &[Band<T>], headcount: u32) -> &Band<T> {
    bands
        .iter()
        .find(|b| b.contains(headcount))
        .unwrap_or_else(|| &bands[bands.len() - 1])
}

/// Sort each grade's bands and check they partition [0, ∞).
fn validate_band_table<T>(table: &str, bands: &mut BTreeMap<u8, Vec<Band<T>>>) -> Result<(), SstError> {
    for grade in bands.keys() {
        if !RISK_GRADES.contains(grade) {
            return Err(SstError::config(format!(
                "{} table defines unknown risk grade {}",
                table, grade
            )));
        }
    }

    for grade in RISK_GRADES {
        let rows = bands.get_mut(&grade).ok_or_else(|| {
            SstError::config(format!("{} table has no bands for risk grade {}", table, grade))
        })?;
        rows.sort_by_key(|b| b.low);

        let mut expected_low = 0u32;
        for (i, band) in rows.iter().enumerate() {
            let is_last = i + 1 == rows.len();
            if band.low != expected_low {
                return Err(SstError::config(format!(
                    "{} grade {}: band starting at {} leaves a gap or overlap (expected {})",
                    table, grade, band.low, expected_low
                )));
            }
            match band.high {
                Some(hi) if hi < band.low => {
                    return Err(SstError::config(format!(
                        "{} grade {}: band {}-{} is inverted",
                        table, grade, band.low, hi
                    )))
                }
                Some(_) if is_last => {
                    return Err(SstError::config(format!(
                        "{} grade {}: last band must be open-ended",
                        table, grade
                    )))
                }
                None if !is_last => {
                    return Err(SstError::config(format!(
                        "{} grade {}: only the last band may be open-ended",
                        table, grade
                    )))
                }
                Some(hi) => expected_low = hi.saturating_add(1),
                None => {}
            }
        }
    }
    Ok(())
}

// ============ Built-in definitions ============

fn rule(code: &str, name: &str, base: u32, rate_percent: u32, tier: TrainingTier) -> BrigadeRule {
    BrigadeRule {
        code: code.to_string(),
        name: name.to_string(),
        base,
        rate_percent,
        tier,
    }
}

fn cipa_band(grade: u8, low: u32, high: Option<u32>, effective: u32, alternate: u32) -> CipaBandDefinition {
    CipaBandDefinition {
        grade,
        low,
        high,
        effective,
        alternate,
    }
}

/// `counts` order: technician, engineer, nursing assistant, nurse, physician.
fn sesmt_band(grade: u8, low: u32, high: Option<u32>, counts: [u32; 5]) -> SesmtBandDefinition {
    SesmtBandDefinition {
        grade,
        low,
        high,
        safety_technician: counts[0],
        safety_engineer: counts[1],
        nursing_assistant: counts[2],
        nurse: counts[3],
        physician: counts[4],
    }
}

/// NBR 14276 Tabela A.1 (simplified), NR-05 Quadro I, NR-04 Quadro II.
pub fn standard_definitions() -> TableDefinitions {
    use TrainingTier::*;

    let rules = vec![
        // Group A - residential
        rule("A-1", "Habitação Unifamiliar", 2, 0, Basic),
        rule("A-2", "Habitação Multifamiliar", 2, 5, Basic),
        rule("A-3", "Habitação Coletiva", 2, 5, Basic),
        // Group B - lodging
        rule("B-1", "Hotel e assemelhado", 4, 5, Basic),
        rule("B-2", "Hotel residencial", 4, 5, Basic),
        // Group C - commercial
        rule("C-1", "Comércio em geral", 4, 5, Intermediate),
        rule("C-2", "Shopping centers", 4, 5, Intermediate),
        // Group D - services
        rule("D-1", "Escritório", 2, 5, Basic),
        rule("D-2", "Agência bancária", 4, 5, Intermediate),
        // Group I - industry
        rule("I-1", "Indústria (Carga Baixa)", 4, 7, Intermediate),
        rule("I-2", "Indústria (Carga Média)", 8, 7, Intermediate),
        rule("I-3", "Indústria (Carga Alta)", 10, 10, Advanced),
        // Group J - storage
        rule("J-1", "Depósito (Incombustível)", 2, 5, Basic),
        rule("J-2", "Depósito (Carga Baixa)", 4, 7, Intermediate),
        rule("J-3", "Depósito (Carga Média)", 8, 7, Intermediate),
        rule("J-4", "Depósito (Carga Alta)", 10, 10, Advanced),
    ];

    let group_defaults = [
        ("A", "A-2"),
        ("B", "B-1"),
        ("C", "C-1"),
        ("D", "D-1"),
        ("I", "I-2"),
        ("J", "J-2"),
    ]
    .iter()
    .map(|(g, c)| (g.to_string(), c.to_string()))
    .collect();

    let mut cipa = Vec::new();
    for grade in RISK_GRADES {
        let high_risk = grade >= 3;
        cipa.push(cipa_band(grade, 0, Some(19), 0, 0));
        cipa.push(cipa_band(grade, 20, Some(29), 1, 1));
        if high_risk {
            cipa.push(cipa_band(grade, 30, Some(50), 2, 2));
            cipa.push(cipa_band(grade, 51, Some(100), 3, 3));
        } else {
            cipa.push(cipa_band(grade, 30, Some(50), 1, 1));
            cipa.push(cipa_band(grade, 51, Some(100), 2, 2));
        }
        cipa.push(cipa_band(grade, 101, None, 4, 3));
    }

    const BANDS: [(u32, Option<u32>); 8] = [
        (0, Some(49)),
        (50, Some(100)),
        (101, Some(250)),
        (251, Some(500)),
        (501, Some(1000)),
        (1001, Some(2000)),
        (2001, Some(3500)),
        (3501, None),
    ];
    let staffing: [(u8, [[u32; 5]; 8]); 4] = [
        (
            1,
            [
                [0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0],
                [1, 0, 0, 0, 0],
                [1, 0, 0, 0, 0],
                [1, 1, 1, 0, 1],
                [2, 1, 1, 1, 1],
            ],
        ),
        (
            2,
            [
                [0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0],
                [1, 0, 0, 0, 0],
                [1, 1, 1, 0, 1],
                [2, 1, 1, 0, 1],
                [5, 1, 1, 1, 1],
            ],
        ),
        (
            3,
            [
                [0, 0, 0, 0, 0],
                [1, 0, 0, 0, 0],
                [2, 0, 0, 0, 0],
                [3, 0, 0, 0, 0],
                [4, 1, 1, 0, 1],
                [6, 1, 2, 0, 1],
                [8, 2, 1, 1, 2],
                [10, 3, 1, 1, 3],
            ],
        ),
        (
            4,
            [
                [0, 0, 0, 0, 0],
                [1, 0, 0, 0, 0],
                [2, 1, 0, 0, 1],
                [3, 1, 0, 0, 1],
                [5, 1, 1, 0, 1],
                [8, 2, 2, 0, 2],
                [10, 3, 1, 1, 3],
                [15, 4, 2, 1, 4],
            ],
        ),
    ];
    let mut sesmt = Vec::new();
    for (grade, rows) in staffing {
        for ((low, high), counts) in BANDS.iter().zip(rows) {
            sesmt.push(sesmt_band(grade, *low, *high, counts));
        }
    }

    TableDefinitions {
        brigade: BrigadeDefinitions {
            rules,
            group_defaults,
            global_default: "D-1".to_string(),
        },
        cipa,
        sesmt,
        checklists: checklists::builtin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TableStore {
        TableStore::standard().unwrap()
    }

    #[test]
    fn standard_tables_validate() {
        let s = store();
        assert_eq!(s.brigade_rules().count(), 16);
        assert_eq!(s.list_checklists().len(), 12);
    }

    #[test]
    fn exact_rule_lookup_normalizes_code() {
        let s = store();
        let r = s.lookup_brigade_rule(" i-2 ");
        assert_eq!(r.resolution, RuleResolution::Exact);
        assert_eq!(r.rule.code, "I-2");
        assert_eq!(r.rule.base, 8);
        assert_eq!(r.rule.rate_percent, 7);
    }

    #[test]
    fn unknown_code_falls_back_to_group_default() {
        let s = store();
        let r = s.lookup_brigade_rule("I-9");
        assert_eq!(r.resolution, RuleResolution::GroupDefault);
        assert_eq!(r.rule.code, "I-2");
        assert_eq!(r.requested, "I-9");

        let r = s.lookup_brigade_rule("C-3");
        assert_eq!(r.rule.code, "C-1");
    }

    #[test]
    fn unknown_group_falls_back_to_office_rule() {
        let s = store();
        for code in ["F-5", "", "zzz", "9"] {
            let r = s.lookup_brigade_rule(code);
            assert_eq!(r.resolution, RuleResolution::GlobalDefault, "{}", code);
            assert_eq!(r.rule.code, "D-1");
        }
    }

    #[test]
    fn bands_partition_every_headcount() {
        let s = store();
        for grade in RISK_GRADES {
            for bands in [
                s.cipa_bands(grade).iter().map(|b| (b.low, b.high)).collect::<Vec<_>>(),
                s.sesmt_bands(grade).iter().map(|b| (b.low, b.high)).collect::<Vec<_>>(),
            ] {
                assert_eq!(bands[0].0, 0);
                for pair in bands.windows(2) {
                    assert_eq!(pair[0].1.map(|h| h + 1), Some(pair[1].0));
                }
                assert_eq!(bands.last().unwrap().1, None);
            }
            // Exactly one band matches each headcount.
            for h in (0..6000).chain([u32::MAX]) {
                let n = s.cipa_bands(grade).iter().filter(|b| b.contains(h)).count();
                assert_eq!(n, 1, "cipa grade {} headcount {}", grade, h);
                let n = s.sesmt_bands(grade).iter().filter(|b| b.contains(h)).count();
                assert_eq!(n, 1, "sesmt grade {} headcount {}", grade, h);
            }
        }
    }

    #[test]
    fn cipa_rows_follow_quadro_i() {
        let s = store();
        assert_eq!(
            s.lookup_cipa_band(3, 30).unwrap(),
            CipaSeats {
                effective: 2,
                alternate: 2
            }
        );
        assert_eq!(s.lookup_cipa_band(2, 30).unwrap().effective, 1);
        assert_eq!(s.lookup_cipa_band(2, 19).unwrap().effective, 0);
        assert_eq!(s.lookup_cipa_band(4, 100).unwrap().effective, 3);
        assert_eq!(s.lookup_cipa_band(1, 100_000).unwrap().alternate, 3);
    }

    #[test]
    fn unknown_risk_grade_is_configuration_error() {
        let s = store();
        for grade in [0, 5, 255] {
            assert!(matches!(
                s.lookup_cipa_band(grade, 50),
                Err(SstError::Configuration(_))
            ));
            assert!(matches!(
                s.lookup_sesmt_band(grade, 50),
                Err(SstError::Configuration(_))
            ));
        }
    }

    #[test]
    fn sesmt_reports_every_role() {
        let s = store();
        let counts = s.lookup_sesmt_band(3, 75).unwrap();
        assert_eq!(counts.len(), SesmtRole::ALL.len());
        assert_eq!(counts[&SesmtRole::SafetyTechnician], 1);
        assert_eq!(counts[&SesmtRole::Physician], 0);
    }

    #[test]
    fn sesmt_clamps_above_last_band() {
        let s = store();
        assert_eq!(
            s.lookup_sesmt_band(4, 4000).unwrap(),
            s.lookup_sesmt_band(4, 90_000).unwrap()
        );
    }

    #[test]
    fn checklist_items_are_ordered_and_idempotent() {
        let s = store();
        let name = "NR-35: Trabalho em Altura";
        let first = s.checklist_items(name);
        assert_eq!(first.len(), 10);
        assert!(first[0].starts_with("35.4 - Foi realizada a Análise de Risco"));
        assert_eq!(first, s.checklist_items(name));
        assert!(s.checklist_items("NR-99").is_empty());
        assert_eq!(s.list_checklists()[0], "NR-01: Disposições Gerais e GRO");
    }

    #[test]
    fn rejects_gap_between_bands() {
        let mut defs = standard_definitions();
        defs.cipa.retain(|b| !(b.grade == 2 && b.low == 20));
        let err = TableStore::from_definitions(defs).unwrap_err();
        assert!(matches!(err, SstError::Configuration(ref m) if m.contains("gap")));
    }

    #[test]
    fn rejects_missing_grade() {
        let mut defs = standard_definitions();
        defs.sesmt.retain(|b| b.grade != 4);
        assert!(TableStore::from_definitions(defs).is_err());
    }

    #[test]
    fn rejects_closed_last_band() {
        let mut defs = standard_definitions();
        for b in defs.cipa.iter_mut() {
            if b.grade == 1 && b.low == 101 {
                b.high = Some(5000);
            }
        }
        assert!(TableStore::from_definitions(defs).is_err());
    }

    #[test]
    fn rejects_undefined_global_default() {
        let mut defs = standard_definitions();
        defs.brigade.global_default = "Z-1".into();
        assert!(TableStore::from_definitions(defs).is_err());
    }

    #[test]
    fn loads_tables_from_toml() {
        let toml = r#"
            [brigade]
            global_default = "D-1"
            group_defaults = { D = "D-1" }

            [[brigade.rules]]
            code = "D-1"
            name = "Escritório"
            base = 2
            rate_percent = 5
            tier = "Basic"

            [[cipa]]
            grade = 1
            low = 0
            effective = 0
            alternate = 0
            [[cipa]]
            grade = 2
            low = 0
            effective = 0
            alternate = 0
            [[cipa]]
            grade = 3
            low = 0
            effective = 0
            alternate = 0
            [[cipa]]
            grade = 4
            low = 0
            high = 9
            effective = 0
            alternate = 0
            [[cipa]]
            grade = 4
            low = 10
            effective = 1
            alternate = 1

            [[sesmt]]
            grade = 1
            low = 0
            [[sesmt]]
            grade = 2
            low = 0
            [[sesmt]]
            grade = 3
            low = 0
            [[sesmt]]
            grade = 4
            low = 0
            safety_technician = 2

            [[checklists]]
            name = "Custom"
            items = ["B?", "A?"]
        "#;
        let s = TableStore::from_toml_str(toml).unwrap();
        assert_eq!(s.lookup_cipa_band(4, 12).unwrap().effective, 1);
        assert_eq!(
            s.lookup_sesmt_band(4, 1).unwrap()[&SesmtRole::SafetyTechnician],
            2
        );
        assert_eq!(s.checklist_items("Custom"), vec!["B?", "A?"]);
        assert_eq!(s.lookup_brigade_rule("X").rule.code, "D-1");
    }

    #[test]
    fn malformed_toml_is_configuration_error() {
        assert!(matches!(
            TableStore::from_toml_str("not = [valid"),
            Err(SstError::Configuration(_))
        ));
    }
}
