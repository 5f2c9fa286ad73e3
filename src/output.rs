use crate::types::{KpiSet, Trend};
use crate::util::{format_int, format_pct};
use serde::Serialize;
use std::error::Error;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Render the KPI card block the way the dashboard's metric row reads.
pub fn print_kpis(kpis: &KpiSet) {
    println!("Total cases:          {}", format_int(kpis.total_cases));
    println!(
        "Records analyzed:     {}",
        format_int(kpis.records_analyzed as u64)
    );
    println!(
        "Year range:           {}",
        match kpis.year_range {
            Some((min, max)) => format!("{}–{}", min, max),
            None => "N/A".to_string(),
        }
    );
    println!(
        "Top offense:          {}",
        kpis.top_article.as_deref().unwrap_or("N/A")
    );
    println!(
        "Top department:       {}",
        kpis.top_region.as_deref().unwrap_or("N/A")
    );
    println!("Trend:                {}", describe_trend(&kpis.trend));
}

pub fn describe_trend(trend: &Trend) -> String {
    match trend {
        Trend::Growth(p) => format!("growth ({})", format_pct(*p)),
        Trend::Decline(p) => format!("decline ({})", format_pct(*p)),
        Trend::Stable(p) => format!("stable ({})", format_pct(*p)),
        Trend::ExplosiveGrowth => "explosive growth".to_string(),
        Trend::InsufficientData => "insufficient data".to_string(),
    }
}
