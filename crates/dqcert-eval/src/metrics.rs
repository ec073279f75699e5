//! Quality metrics over a normalized table.
//!
//! Every function here is pure and reads the same immutable table, so the
//! engine can run them concurrently.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use dqcert_core::{Cell, FormatKind, RuleSet, Table, parse_timestamp};
use regex::Regex;

use crate::model::{FormatFinding, FreshnessStatus};

/// Score assigned when no primary key can be checked.
pub const PK_ADVISORY_SCORE: f64 = 70.0;
/// Score of the reserved placeholder metric.
pub const RESERVED_SCORE: f64 = 100.0;
/// Points lost per day past the freshness allowance.
pub const FRESHNESS_PENALTY_PER_DAY: f64 = 5.0;

const EMAIL_PATTERN: &str = r"^[\w.-]+@[\w.-]+\.\w+$";
const PHONE_PATTERN: &str = r"^\d{2,3}[- .]?\d{3,4}[- .]?\d{4}$";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"));
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_PATTERN).expect("phone pattern compiles"));

/// Score, hard-fail flag and offending rows shared by the row-level metrics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricOutcome {
    pub score: f64,
    pub hard_fail: bool,
    pub offending: BTreeSet<usize>,
}

impl MetricOutcome {
    fn clean(score: f64) -> Self {
        Self {
            score,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequiredOutcome {
    pub outcome: MetricOutcome,
    pub missing_rows: usize,
    pub missing_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryKeyOutcome {
    pub outcome: MetricOutcome,
    pub null_rows: usize,
    pub duplicate_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormatOutcome {
    pub outcome: MetricOutcome,
    pub columns: Vec<FormatFinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FreshnessOutcome {
    pub outcome: MetricOutcome,
    pub status: FreshnessStatus,
}

/// Configured columns that do not exist in the table, sorted.
pub fn schema_missing(table: &Table, rules: &RuleSet) -> Vec<String> {
    rules
        .referenced_columns()
        .into_iter()
        .filter(|column| !table.has_column(column))
        .map(str::to_string)
        .collect()
}

pub fn schema_conformity(missing: &[String]) -> MetricOutcome {
    MetricOutcome {
        score: if missing.is_empty() { 100.0 } else { 0.0 },
        hard_fail: !missing.is_empty(),
        offending: BTreeSet::new(),
    }
}

/// Share of non-absent cells; 100 for a table without cells.
pub fn value_completeness(table: &Table) -> (f64, usize) {
    let absent = table.absent_count();
    let cells = table.cell_count();
    if cells == 0 {
        return (100.0, absent);
    }
    let score = 100.0 * (1.0 - absent as f64 / cells as f64);
    (score.clamp(0.0, 100.0), absent)
}

pub fn required_completeness(table: &Table, rules: &RuleSet) -> RequiredOutcome {
    let columns: Option<Vec<&[Cell]>> = rules
        .required_columns
        .iter()
        .map(|name| table.column(name).map(|column| column.cells.as_slice()))
        .collect();

    let columns = match columns {
        Some(columns) if !columns.is_empty() && !table.is_empty() => columns,
        _ => {
            return RequiredOutcome {
                outcome: MetricOutcome::clean(100.0),
                missing_rows: 0,
                missing_pct: 0.0,
            };
        }
    };

    let offending: BTreeSet<usize> = (0..table.row_count())
        .filter(|row| columns.iter().any(|cells| cells[*row].is_absent()))
        .collect();
    let missing_rows = offending.len();
    let missing_pct = 100.0 * missing_rows as f64 / table.row_count() as f64;

    RequiredOutcome {
        outcome: MetricOutcome {
            score: (100.0 - missing_pct).max(0.0),
            hard_fail: missing_pct > rules.required_missing_threshold_pct,
            offending,
        },
        missing_rows,
        missing_pct,
    }
}

pub fn primary_key_integrity(table: &Table, rules: &RuleSet) -> PrimaryKeyOutcome {
    let column = rules
        .primary_key
        .as_deref()
        .and_then(|name| table.column(name))
        .filter(|_| !table.is_empty());

    let Some(column) = column else {
        return PrimaryKeyOutcome {
            outcome: MetricOutcome::clean(PK_ADVISORY_SCORE),
            null_rows: 0,
            duplicate_rows: 0,
        };
    };

    let mut nulls = BTreeSet::new();
    let mut by_key: HashMap<KeyValue, Vec<usize>> = HashMap::new();
    for (row, cell) in column.cells.iter().enumerate() {
        match KeyValue::of(cell) {
            Some(key) => by_key.entry(key).or_default().push(row),
            None => {
                nulls.insert(row);
            }
        }
    }
    let duplicates: BTreeSet<usize> = by_key
        .into_values()
        .filter(|rows| rows.len() > 1)
        .flatten()
        .collect();

    let null_rows = nulls.len();
    let duplicate_rows = duplicates.len();
    let offending: BTreeSet<usize> = nulls.union(&duplicates).copied().collect();
    let bad = offending.len() as f64;
    let score = (100.0 - 100.0 * bad / table.row_count() as f64).max(0.0);

    PrimaryKeyOutcome {
        outcome: MetricOutcome {
            score,
            hard_fail: null_rows > 0 || duplicate_rows > 0,
            offending,
        },
        null_rows,
        duplicate_rows,
    }
}

/// Primary key value compared without going through its display form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum KeyValue {
    Text(String),
    Number(u64),
    Temporal(NaiveDateTime),
}

impl KeyValue {
    fn of(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Absent => None,
            Cell::Number(value) if value.is_nan() => None,
            // -0.0 and 0.0 are the same key.
            Cell::Number(value) if *value == 0.0 => Some(Self::Number(0.0f64.to_bits())),
            Cell::Number(value) => Some(Self::Number(value.to_bits())),
            Cell::Text(value) => Some(Self::Text(value.clone())),
            Cell::Temporal(value) => Some(Self::Temporal(*value)),
        }
    }
}

pub fn format_pattern(kind: FormatKind) -> &'static Regex {
    match kind {
        FormatKind::Email => &EMAIL_RE,
        FormatKind::Phone => &PHONE_RE,
    }
}

/// Advisory validity of configured format columns; never a hard fail.
pub fn format_validity(table: &Table, rules: &RuleSet) -> FormatOutcome {
    let mut columns = Vec::new();
    let mut offending = BTreeSet::new();

    for (kind, name) in &rules.formats {
        let Some(column) = table.column(name) else {
            continue;
        };
        let pattern = format_pattern(*kind);

        let mut finding = FormatFinding {
            format: *kind,
            column: name.clone(),
            valid: 0,
            checked: 0,
        };
        for (row, value) in column.cells.iter().enumerate() {
            let Some(value) = value.render() else {
                continue;
            };
            finding.checked += 1;
            if pattern.is_match(&value) {
                finding.valid += 1;
            } else {
                offending.insert(row);
            }
        }
        columns.push(finding);
    }

    let score = if columns.is_empty() {
        100.0
    } else {
        let total: f64 = columns.iter().map(FormatFinding::ratio).sum();
        total / columns.len() as f64 * 100.0
    };

    FormatOutcome {
        outcome: MetricOutcome {
            score,
            hard_fail: false,
            offending,
        },
        columns,
    }
}

pub fn freshness(table: &Table, rules: &RuleSet, now: NaiveDateTime) -> FreshnessOutcome {
    let column = rules
        .timestamp_column
        .as_deref()
        .filter(|_| rules.freshness_days > 0)
        .and_then(|name| table.column(name));

    let Some(column) = column else {
        return FreshnessOutcome {
            outcome: MetricOutcome::clean(100.0),
            status: FreshnessStatus::Skipped,
        };
    };

    let newest = column.cells.iter().filter_map(cell_timestamp).max();
    let Some(newest) = newest else {
        return FreshnessOutcome {
            outcome: MetricOutcome {
                score: 0.0,
                hard_fail: true,
                offending: (0..column.cells.len()).collect(),
            },
            status: FreshnessStatus::Unparsable {
                column: column.name.clone(),
            },
        };
    };

    let allowed_days = rules.freshness_days;
    let age_days = (now - newest).num_days();
    if age_days <= i64::from(allowed_days) {
        return FreshnessOutcome {
            outcome: MetricOutcome::clean(100.0),
            status: FreshnessStatus::Fresh {
                newest,
                age_days,
                allowed_days,
            },
        };
    }

    let overdue = (age_days - i64::from(allowed_days)) as f64;
    let penalty = (overdue * FRESHNESS_PENALTY_PER_DAY).min(100.0);
    FreshnessOutcome {
        outcome: MetricOutcome {
            score: (100.0 - penalty).max(0.0),
            hard_fail: true,
            offending: BTreeSet::new(),
        },
        status: FreshnessStatus::Stale {
            newest,
            age_days,
            allowed_days,
        },
    }
}

fn cell_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Temporal(value) => Some(*value),
        Cell::Text(value) => parse_timestamp(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dqcert_core::{Column, ColumnKind};

    fn text_column(name: &str, values: &[Option<&str>]) -> Column {
        let cells = values
            .iter()
            .map(|value| match value {
                Some(value) => Cell::Text(value.to_string()),
                None => Cell::Absent,
            })
            .collect();
        Column::new(name, ColumnKind::Text, cells)
    }

    #[test]
    fn email_pattern_accepts_common_addresses() {
        let pattern = format_pattern(FormatKind::Email);
        assert!(pattern.is_match("first.last@mail.example.com"));
        assert!(pattern.is_match("a_b@c-d.io"));
        assert!(!pattern.is_match("bad"));
        assert!(!pattern.is_match("a@b"));
        assert!(!pattern.is_match("a b@c.com"));
    }

    #[test]
    fn phone_pattern_accepts_separators() {
        let pattern = format_pattern(FormatKind::Phone);
        assert!(pattern.is_match("010-1234-5678"));
        assert!(pattern.is_match("02 123 4567"));
        assert!(pattern.is_match("01012345678"));
        assert!(!pattern.is_match("12-34"));
        assert!(!pattern.is_match("010/1234/5678"));
    }

    #[test]
    fn numeric_phone_cells_match_on_rendered_text() {
        let table = Table::new(vec![Column::new(
            "tel",
            ColumnKind::Numeric,
            vec![Cell::Number(1012345678.0), Cell::Number(f64::NAN)],
        )])
        .expect("table");
        let rules = RuleSet::default().with_format(FormatKind::Phone, "tel");

        let outcome = format_validity(&table, &rules);
        assert_eq!(outcome.columns[0].checked, 1);
        assert_eq!(outcome.columns[0].valid, 1);
        assert_eq!(outcome.outcome.score, 100.0);
    }

    #[test]
    fn format_column_without_values_scores_full() {
        let table = Table::new(vec![
            text_column("email", &[None, None]),
            text_column("tel", &[Some("x"), Some("010-1234-5678")]),
        ])
        .expect("table");
        let rules = RuleSet::default()
            .with_format(FormatKind::Email, "email")
            .with_format(FormatKind::Phone, "tel");

        let outcome = format_validity(&table, &rules);
        assert_eq!(outcome.outcome.score, 75.0);
        assert_eq!(outcome.outcome.offending, BTreeSet::from([0]));
        assert!(!outcome.outcome.hard_fail);
    }

    #[test]
    fn pk_configured_but_missing_is_advisory() {
        let table = Table::new(vec![text_column("a", &[Some("1")])]).expect("table");
        let outcome = primary_key_integrity(&table, &RuleSet::default().with_primary_key("id"));
        assert_eq!(outcome.outcome.score, PK_ADVISORY_SCORE);
        assert!(!outcome.outcome.hard_fail);
    }

    #[test]
    fn pk_counts_nulls_and_every_duplicate_row() {
        let table = Table::new(vec![text_column(
            "id",
            &[Some("1"), Some("1"), None, Some("2"), Some("1")],
        )])
        .expect("table");
        let outcome = primary_key_integrity(&table, &RuleSet::default().with_primary_key("id"));
        assert_eq!(outcome.null_rows, 1);
        assert_eq!(outcome.duplicate_rows, 3);
        assert_eq!(outcome.outcome.offending, BTreeSet::from([0, 1, 2, 4]));
        assert!((outcome.outcome.score - 20.0).abs() < 1e-9);
        assert!(outcome.outcome.hard_fail);
    }

    #[test]
    fn pk_temporal_keys_keep_subsecond_precision() {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let first = day.and_hms_milli_opt(10, 0, 0, 100).expect("time");
        let second = day.and_hms_milli_opt(10, 0, 0, 200).expect("time");
        let table = Table::new(vec![Column::new(
            "ts",
            ColumnKind::Temporal,
            vec![Cell::Temporal(first), Cell::Temporal(second)],
        )])
        .expect("table");

        let outcome = primary_key_integrity(&table, &RuleSet::default().with_primary_key("ts"));
        assert_eq!(outcome.duplicate_rows, 0);
        assert_eq!(outcome.outcome.score, 100.0);
        assert!(!outcome.outcome.hard_fail);
    }

    #[test]
    fn pk_numeric_keys_compare_by_value() {
        let table = Table::new(vec![Column::new(
            "id",
            ColumnKind::Numeric,
            vec![Cell::Number(0.0), Cell::Number(-0.0), Cell::Number(1.5)],
        )])
        .expect("table");

        let outcome = primary_key_integrity(&table, &RuleSet::default().with_primary_key("id"));
        assert_eq!(outcome.duplicate_rows, 2);
        assert_eq!(outcome.outcome.offending, BTreeSet::from([0, 1]));
    }

    #[test]
    fn required_missing_at_threshold_passes() {
        let table = Table::new(vec![text_column("name", &[Some("a"), None, Some("b"), Some("c")])])
            .expect("table");
        let rules = RuleSet::default()
            .with_required(["name"])
            .with_required_threshold(25.0);
        let outcome = required_completeness(&table, &rules);
        assert_eq!(outcome.missing_rows, 1);
        assert_eq!(outcome.missing_pct, 25.0);
        assert!(!outcome.outcome.hard_fail);
        assert_eq!(outcome.outcome.score, 75.0);
    }

    #[test]
    fn required_with_missing_column_is_skipped() {
        let table = Table::new(vec![text_column("name", &[None])]).expect("table");
        let rules = RuleSet::default().with_required(["name", "ghost"]);
        let outcome = required_completeness(&table, &rules);
        assert_eq!(outcome.outcome.score, 100.0);
        assert!(!outcome.outcome.hard_fail);
    }

    #[test]
    fn unparsable_timestamps_fail_freshness() {
        let table = Table::new(vec![text_column("ts", &[Some("soon"), None])]).expect("table");
        let rules = RuleSet::default().with_freshness("ts", 7);
        let now = parse_timestamp("2024-03-01").expect("now");

        let outcome = freshness(&table, &rules, now);
        assert_eq!(outcome.outcome.score, 0.0);
        assert!(outcome.outcome.hard_fail);
        assert_eq!(outcome.outcome.offending, BTreeSet::from([0, 1]));
    }

    #[test]
    fn freshness_uses_newest_timestamp() {
        let table = Table::new(vec![text_column(
            "ts",
            &[Some("2024-01-01"), Some("2024-02-25 10:00"), Some("junk")],
        )])
        .expect("table");
        let rules = RuleSet::default().with_freshness("ts", 7);
        let now = parse_timestamp("2024-03-01").expect("now");

        let outcome = freshness(&table, &rules, now);
        assert_eq!(outcome.outcome.score, 100.0);
        assert!(matches!(
            outcome.status,
            FreshnessStatus::Fresh { age_days: 4, .. }
        ));
    }

    #[test]
    fn zero_day_allowance_skips_freshness() {
        let table = Table::new(vec![text_column("ts", &[Some("1999-01-01")])]).expect("table");
        let rules = RuleSet::default().with_freshness("ts", 0);
        let now = parse_timestamp("2024-03-01").expect("now");
        let outcome = freshness(&table, &rules, now);
        assert_eq!(outcome.status, FreshnessStatus::Skipped);
        assert_eq!(outcome.outcome.score, 100.0);
    }

    fn freshness_at(timestamp: &str, allowed_days: u32) -> FreshnessOutcome {
        let table = Table::new(vec![text_column("ts", &[Some(timestamp)])]).expect("table");
        let rules = RuleSet::default().with_freshness("ts", allowed_days);
        let now = parse_timestamp("2024-03-01").expect("now");
        freshness(&table, &rules, now)
    }

    #[test]
    fn freshness_allowance_is_inclusive() {
        let outcome = freshness_at("2024-02-20", 10);
        assert_eq!(outcome.outcome.score, 100.0);
        assert!(!outcome.outcome.hard_fail);
        assert!(matches!(
            outcome.status,
            FreshnessStatus::Fresh { age_days: 10, allowed_days: 10, .. }
        ));
    }

    #[test]
    fn one_day_past_allowance_loses_five_points() {
        let outcome = freshness_at("2024-02-19", 10);
        assert_eq!(outcome.outcome.score, 95.0);
        assert!(outcome.outcome.hard_fail);
        assert!(matches!(
            outcome.status,
            FreshnessStatus::Stale { age_days: 11, .. }
        ));
    }

    #[test]
    fn long_overdue_freshness_floors_at_zero() {
        let outcome = freshness_at("2024-01-01", 10);
        assert_eq!(outcome.outcome.score, 0.0);
        assert!(outcome.outcome.hard_fail);
        assert!(matches!(
            outcome.status,
            FreshnessStatus::Stale { age_days: 60, .. }
        ));
    }
}
