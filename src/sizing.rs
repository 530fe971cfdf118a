//! Sizing calculators: fire brigade (NBR 14276), CIPA (NR-05) and SESMT
//! (NR-04).
//!
//! Each calculator is a pure function over a [`TableStore`]. The returned
//! `computation_trace` reproduces the arithmetic in Portuguese; it is the
//! audit justification printed on reports, so its wording is part of the
//! output contract.

use crate::config::RiskConfig;
use crate::error::SstError;
use crate::models::{BrigadeResult, CipaResult, SesmtResult};
use crate::tables::{RuleResolution, TableStore, RISK_GRADES};

/// Brigade formula threshold: population up to this size uses the base only.
pub const BRIGADE_BASE_POPULATION: u32 = 10;

/// Below this headcount NR-05 requires a designated person, not a commission.
pub const CIPA_MIN_HEADCOUNT: u32 = 20;

/// Maps a CNAE activity code to a risk grade by longest matching prefix.
#[derive(Debug, Clone)]
pub struct RiskClassifier {
    default_grade: u8,
    /// Sorted longest prefix first.
    prefixes: Vec<(String, u8)>,
}

impl RiskClassifier {
    pub fn new(config: &RiskConfig) -> Self {
        let mut prefixes: Vec<(String, u8)> = config
            .prefixes
            .iter()
            .map(|p| (digits_only(&p.prefix), p.grade))
            .filter(|(p, _)| !p.is_empty())
            .collect();
        prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
        Self {
            default_grade: config.default_grade,
            prefixes,
        }
    }

    /// Formatting characters are ignored: "4120-4/00" classifies as "4120400".
    pub fn classify(&self, activity_code: &str) -> u8 {
        let code = digits_only(activity_code);
        self.prefixes
            .iter()
            .find(|(prefix, _)| code.starts_with(prefix.as_str()))
            .map(|(_, grade)| *grade)
            .unwrap_or(self.default_grade)
    }

    /// An explicit grade wins over classification but must be a known grade.
    pub fn resolve(&self, activity_code: &str, explicit: Option<i64>) -> Result<u8, SstError> {
        match explicit {
            Some(g) => u8::try_from(g)
                .ok()
                .filter(|g| RISK_GRADES.contains(g))
                .ok_or_else(|| {
                    SstError::config(format!(
                        "unknown risk grade {}; expected one of 1, 2, 3, 4",
                        g
                    ))
                }),
            None => Ok(self.classify(activity_code)),
        }
    }
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}

fn digits_only(code: &str) -> String {
    code.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn positive_headcount(value: i64, what: &str) -> Result<u32, SstError> {
    if value <= 0 {
        return Err(SstError::invalid(format!(
            "{} must be a positive integer, got {}",
            what, value
        )));
    }
    u32::try_from(value).map_err(|_| {
        SstError::invalid(format!(
            "{} must be at most {}, got {}",
            what,
            u32::MAX,
            value
        ))
    })
}

/// Integer ceiling of `excess * rate_percent / 100`.
fn ceil_percent(excess: u32, rate_percent: u32) -> u32 {
    let scaled = u64::from(excess) * u64::from(rate_percent);
    u32::try_from(scaled.div_ceil(100)).unwrap_or(u32::MAX)
}

/// Fire-brigade size for a population in a given occupancy division.
pub fn size_brigade(
    tables: &TableStore,
    population: i64,
    division_code: &str,
) -> Result<BrigadeResult, SstError> {
    let population = positive_headcount(population, "population")?;
    let resolved = tables.lookup_brigade_rule(division_code);
    let rule = resolved.rule;

    let (required, mut trace) = if population <= BRIGADE_BASE_POPULATION {
        let (required, comparison) = if population >= rule.base {
            (
                rule.base,
                format!(
                    "Base ({}) ≤ População ({}): adotada a Base.",
                    rule.base, population
                ),
            )
        } else {
            (
                population,
                format!(
                    "Base ({}) > População ({}): adotada a População.",
                    rule.base, population
                ),
            )
        };
        (
            required,
            format!(
                "População ({}) ≤ {}. {} Total {}.",
                population, BRIGADE_BASE_POPULATION, comparison, required
            ),
        )
    } else {
        let excess = population - BRIGADE_BASE_POPULATION;
        let additional = ceil_percent(excess, rule.rate_percent);
        let required = rule.base.saturating_add(additional);
        (
            required,
            format!(
                "Base ({}) + {}% sobre excedente de {} ({} pessoas = {}) = Total {}.",
                rule.base,
                rule.rate_percent,
                BRIGADE_BASE_POPULATION,
                excess,
                additional,
                required
            ),
        )
    };

    let label = match resolved.resolution {
        RuleResolution::Exact => format!("{} - {}", rule.code, rule.name),
        _ => format!(
            "{} (regra {} aplicada) - {}",
            display_code(&resolved.requested),
            rule.code,
            rule.name
        ),
    };
    match resolved.resolution {
        RuleResolution::Exact => {}
        RuleResolution::GroupDefault => trace.push_str(&format!(
            " Divisão {} não tabelada; aplicada a regra padrão do grupo ({}).",
            display_code(&resolved.requested),
            rule.code
        )),
        RuleResolution::GlobalDefault => trace.push_str(&format!(
            " Divisão {} não tabelada; aplicada a regra padrão geral ({}).",
            display_code(&resolved.requested),
            rule.code
        )),
    }

    Ok(BrigadeResult {
        required_count: required,
        training_tier: rule.tier,
        computation_trace: trace,
        classification_label: label,
        resolved_division: rule.code.clone(),
        fallback_applied: resolved.resolution != RuleResolution::Exact,
    })
}

fn display_code(code: &str) -> &str {
    if code.is_empty() {
        "(vazia)"
    } else {
        code
    }
}

/// CIPA composition for an establishment.
pub fn size_cipa(
    tables: &TableStore,
    classifier: &RiskClassifier,
    activity_code: &str,
    headcount: i64,
    explicit_grade: Option<i64>,
) -> Result<CipaResult, SstError> {
    let headcount = positive_headcount(headcount, "headcount")?;
    let grade = classifier.resolve(activity_code, explicit_grade)?;
    let seats = tables.lookup_cipa_band(grade, headcount)?;

    let designated_only = headcount < CIPA_MIN_HEADCOUNT;
    let note = if designated_only {
        "Designado (NR-05 5.4.13): abaixo de 20 empregados basta um representante designado e treinado"
    } else {
        "Quadro I"
    };

    Ok(CipaResult {
        effective_members: seats.effective,
        alternate_members: seats.alternate,
        risk_grade: grade,
        computation_trace: format!(
            "Dimensionamento p/ Grau de Risco {} e {} func. ({}): {} efetivo(s), {} suplente(s).",
            grade, headcount, note, seats.effective, seats.alternate
        ),
        designated_only,
    })
}

/// SESMT staffing for an establishment.
pub fn size_sesmt(
    tables: &TableStore,
    classifier: &RiskClassifier,
    activity_code: &str,
    headcount: i64,
    explicit_grade: Option<i64>,
) -> Result<SesmtResult, SstError> {
    let headcount = positive_headcount(headcount, "headcount")?;
    let grade = classifier.resolve(activity_code, explicit_grade)?;
    let role_counts = tables.lookup_sesmt_band(grade, headcount)?;

    let mut trace = format!("Quadro II NR-04 (Grau {}, {} func).", grade, headcount);
    let required: Vec<String> = role_counts
        .iter()
        .filter(|(_, n)| **n > 0)
        .map(|(role, n)| format!("{} {}", n, role.label()))
        .collect();
    if required.is_empty() {
        trace.push_str(" Não há exigência de quadro próprio, apenas assistência.");
    } else {
        trace.push_str(&format!(" Equipe exigida: {}.", required.join(", ")));
    }

    Ok(SesmtResult {
        role_counts,
        risk_grade: grade,
        computation_trace: trace,
    })
}
