// Aggregation and KPI derivation: pure functions over the canonical table.
// Every function is total on empty input and never mutates its argument.
use crate::types::{CanonicalRecord, KpiSet, Trend};
use std::collections::HashMap;

/// Categorical grouping dimensions the presentation layer can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Region,
    Municipality,
    Zone,
    Year,
    ArticleKey,
}

impl Dimension {
    fn key_of(self, r: &CanonicalRecord) -> String {
        match self {
            Dimension::Region => r.region.clone(),
            Dimension::Municipality => r.municipality.clone(),
            Dimension::Zone => r.zone.clone(),
            Dimension::Year => r.year.to_string(),
            Dimension::ArticleKey => r.article_key.clone(),
        }
    }
}

/// Percent-change band treated as flat when classifying the overall trend.
const STABLE_BAND_PCT: f64 = 5.0;

/// Group by one dimension and sum case counts.
///
/// Keys appear in first-encounter order over the canonical table, which
/// makes downstream tie-breaking deterministic. Empty input yields an empty
/// aggregate.
pub fn sum_by(records: &[CanonicalRecord], dim: Dimension) -> Vec<(String, u64)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<(String, u64)> = Vec::new();
    for r in records {
        let key = dim.key_of(r);
        match index.get(&key) {
            Some(&i) => out[i].1 += r.case_count,
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, r.case_count));
            }
        }
    }
    out
}

/// Group by (year, article key); the heatmap-shaped aggregate.
pub fn sum_by_year_article(records: &[CanonicalRecord]) -> Vec<((i32, String), u64)> {
    let mut index: HashMap<(i32, String), usize> = HashMap::new();
    let mut out: Vec<((i32, String), u64)> = Vec::new();
    for r in records {
        let key = (r.year, r.article_key.clone());
        match index.get(&key) {
            Some(&i) => out[i].1 += r.case_count,
            None => {
                index.insert(key.clone(), out.len());
                out.push((key, r.case_count));
            }
        }
    }
    out
}

/// Top `n` groups by summed case count, descending.
///
/// The sort is stable over the first-encounter-ordered aggregate, so tied
/// groups keep the order in which their keys first appeared in the table.
pub fn top_n(records: &[CanonicalRecord], dim: Dimension, n: usize) -> Vec<(String, u64)> {
    let mut sums = sum_by(records, dim);
    sums.sort_by(|a, b| b.1.cmp(&a.1));
    sums.truncate(n);
    sums
}

/// Derive the full KPI set from the canonical table.
pub fn compute_kpis(records: &[CanonicalRecord]) -> KpiSet {
    let total_cases: u64 = records.iter().map(|r| r.case_count).sum();

    let known_years: Vec<i32> = records
        .iter()
        .map(|r| r.year)
        .filter(|&y| y != 0)
        .collect();
    let year_range = match (known_years.iter().min(), known_years.iter().max()) {
        (Some(&min), Some(&max)) => Some((min, max)),
        _ => None,
    };

    KpiSet {
        total_cases,
        records_analyzed: records.len(),
        year_range,
        top_article: leader(records, Dimension::ArticleKey),
        top_region: leader(records, Dimension::Region),
        trend: compute_trend(records, year_range),
    }
}

/// Argmax of `sum_by(dim)`. Undefined (rendered "N/A") when fewer than 2
/// distinct categories exist; ties resolve to the first-encountered key,
/// like `top_n`.
fn leader(records: &[CanonicalRecord], dim: Dimension) -> Option<String> {
    let sums = sum_by(records, dim);
    if sums.len() < 2 {
        return None;
    }
    sums.into_iter()
        .reduce(|best, x| if x.1 > best.1 { x } else { best })
        .map(|(k, _)| k)
}

fn compute_trend(records: &[CanonicalRecord], year_range: Option<(i32, i32)>) -> Trend {
    let Some((first, last)) = year_range else {
        return Trend::InsufficientData;
    };
    trend_of(year_total(records, first), year_total(records, last))
}

fn year_total(records: &[CanonicalRecord], year: i32) -> u64 {
    records
        .iter()
        .filter(|r| r.year == year)
        .map(|r| r.case_count)
        .sum()
}

/// Trend policy between the earliest- and latest-year sums.
///
/// A zero initial sum short-circuits to a fixed label instead of dividing;
/// a zero final sum means the latest known year carries no usable signal.
/// Never returns infinity or NaN.
pub fn trend_of(initial: u64, final_: u64) -> Trend {
    if final_ == 0 {
        return Trend::InsufficientData;
    }
    if initial == 0 {
        return Trend::ExplosiveGrowth;
    }
    let pct = (final_ as f64 - initial as f64) / initial as f64 * 100.0;
    if pct > STABLE_BAND_PCT {
        Trend::Growth(pct)
    } else if pct < -STABLE_BAND_PCT {
        Trend::Decline(pct)
    } else {
        Trend::Stable(pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(year: i32, region: &str, article: &str, zone: &str, count: u64) -> CanonicalRecord {
        CanonicalRecord {
            date_of_incident: None,
            year,
            region: region.to_string(),
            municipality: String::new(),
            zone: zone.to_string(),
            conduct_description: format!("{}. DETALLE", article),
            conduct_description_short: article.to_string(),
            article_key: article.to_string(),
            case_count: count,
        }
    }

    fn sample() -> Vec<CanonicalRecord> {
        vec![
            record(2018, "ANTIOQUIA", "TALA", "RURAL", 3),
            record(2018, "CAUCA", "CAZA", "RURAL", 2),
            record(2019, "ANTIOQUIA", "TALA", "URBANA", 4),
            record(2019, "META", "PESCA", "RURAL", 2),
            record(0, "CAUCA", "CAZA", "URBANA", 1),
        ]
    }

    #[test]
    fn sum_by_conserves_total_cases() {
        let records = sample();
        let total: u64 = records.iter().map(|r| r.case_count).sum();
        for dim in [
            Dimension::Region,
            Dimension::ArticleKey,
            Dimension::Zone,
            Dimension::Year,
        ] {
            let grouped: u64 = sum_by(&records, dim).iter().map(|(_, s)| s).sum();
            assert_eq!(grouped, total);
        }
    }

    #[test]
    fn sum_by_keeps_first_encounter_order() {
        let keys: Vec<String> = sum_by(&sample(), Dimension::Region)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["ANTIOQUIA", "CAUCA", "META"]);
    }

    #[test]
    fn sum_by_empty_input_is_empty() {
        assert!(sum_by(&[], Dimension::Region).is_empty());
        assert!(sum_by_year_article(&[]).is_empty());
    }

    #[test]
    fn top_n_is_deterministic_and_breaks_ties_by_encounter_order() {
        let records = vec![
            record(2019, "META", "PESCA", "RURAL", 2),
            record(2019, "CAUCA", "CAZA", "RURAL", 2),
            record(2019, "ANTIOQUIA", "TALA", "RURAL", 5),
        ];
        let first = top_n(&records, Dimension::ArticleKey, 3);
        let second = top_n(&records, Dimension::ArticleKey, 3);
        assert_eq!(first, second);
        assert_eq!(first[0].0, "TALA");
        // PESCA and CAZA are tied; PESCA appeared first.
        assert_eq!(first[1].0, "PESCA");
        assert_eq!(first[2].0, "CAZA");
    }

    #[test]
    fn year_article_grouping_sums_pairs() {
        let agg = sum_by_year_article(&sample());
        let tala_2018 = agg
            .iter()
            .find(|((y, a), _)| *y == 2018 && a == "TALA")
            .unwrap();
        assert_eq!(tala_2018.1, 3);
    }

    #[test]
    fn kpis_on_sample() {
        let k = compute_kpis(&sample());
        assert_eq!(k.total_cases, 12);
        assert_eq!(k.records_analyzed, 5);
        assert_eq!(k.year_range, Some((2018, 2019)));
        assert_eq!(k.top_article.as_deref(), Some("TALA"));
        assert_eq!(k.top_region.as_deref(), Some("ANTIOQUIA"));
        // 2018 sum 5, 2019 sum 6: +20% growth.
        assert_eq!(k.trend, Trend::Growth(20.0));
    }

    #[test]
    fn kpis_on_empty_table_are_neutral() {
        let k = compute_kpis(&[]);
        assert_eq!(k.total_cases, 0);
        assert_eq!(k.year_range, None);
        assert_eq!(k.top_article, None);
        assert_eq!(k.top_region, None);
        assert_eq!(k.trend, Trend::InsufficientData);
    }

    #[test]
    fn leaders_undefined_with_fewer_than_two_categories() {
        let records = vec![record(2019, "META", "PESCA", "RURAL", 9)];
        let k = compute_kpis(&records);
        assert_eq!(k.top_article, None);
        assert_eq!(k.top_region, None);
    }

    #[test]
    fn unknown_years_are_excluded_from_the_range() {
        let records = vec![
            record(0, "META", "PESCA", "RURAL", 1),
            record(0, "CAUCA", "CAZA", "RURAL", 1),
        ];
        let k = compute_kpis(&records);
        assert_eq!(k.year_range, None);
        assert_eq!(k.trend, Trend::InsufficientData);
    }

    #[test]
    fn trend_policy_table() {
        assert_eq!(trend_of(0, 100), Trend::ExplosiveGrowth);
        assert_eq!(trend_of(100, 0), Trend::InsufficientData);
        assert_eq!(trend_of(0, 0), Trend::InsufficientData);
        assert_eq!(trend_of(100, 105), Trend::Stable(5.0));
        assert_eq!(trend_of(100, 106), Trend::Growth(6.0));
        assert_eq!(trend_of(100, 95), Trend::Stable(-5.0));
        assert_eq!(trend_of(100, 94), Trend::Decline(-6.0));
    }

    #[test]
    fn trend_never_produces_non_finite_values() {
        for (i, f) in [(0u64, 0u64), (0, 7), (7, 0), (1, u32::MAX as u64)] {
            match trend_of(i, f) {
                Trend::Growth(p) | Trend::Decline(p) | Trend::Stable(p) => {
                    assert!(p.is_finite())
                }
                Trend::ExplosiveGrowth | Trend::InsufficientData => {}
            }
        }
    }

    #[test]
    fn single_known_year_reports_stable_zero() {
        let records = vec![
            record(2019, "META", "PESCA", "RURAL", 4),
            record(2019, "CAUCA", "CAZA", "RURAL", 2),
        ];
        assert_eq!(compute_kpis(&records).trend, Trend::Stable(0.0));
    }
}
