// Entry point and high-level CLI flow.
//
// - Option [1] loads, cleans and derives the incident CSV, printing
//   diagnostics; repeated loads of an unchanged file reuse the cached
//   canonical table.
// - Option [2] prints the KPI card block, previews the aggregate tables,
//   and exports them as CSV plus a JSON KPI summary.
mod derive;
mod error;
mod geo;
mod loader;
mod normalize;
mod output;
mod pipeline;
mod reports;
mod types;
mod util;

use geo::{BoundaryIndex, GeoSource};
use once_cell::sync::Lazy;
use pipeline::PipelineCache;
use reports::Dimension;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use types::{AggregateRow, YearArticleRow};

const DEFAULT_DATASET: &str = "BD_Delitos_ambientales.csv";

// Simple in-memory app state so we only load/clean the CSV once but can
// generate reports multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        cache: PipelineCache::new(),
    })
});

struct AppState {
    cache: PipelineCache,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the report selection menu after
/// generating reports.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: run the load pipeline on the chosen CSV file.
fn handle_load() {
    print!("Enter CSV filename (blank for {}): ", DEFAULT_DATASET);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    let trimmed = buf.trim();
    let path = if trimmed.is_empty() {
        DEFAULT_DATASET
    } else {
        trimmed
    };

    let mut state = APP_STATE.lock().unwrap();
    match state.cache.load(Path::new(path)) {
        Ok((_, stats)) => {
            println!(
                "Processing dataset... ({} rows read, {} canonical rows)",
                util::format_int(stats.total_rows as u64),
                util::format_int(stats.canonical_rows as u64)
            );
            if stats.duplicates_removed > 0 {
                println!(
                    "Note: {} duplicate rows collapsed.",
                    util::format_int(stats.duplicates_removed as u64)
                );
            }
            if stats.unparsed_dates > 0 {
                println!(
                    "Note: {} rows carry no parseable incident date.",
                    util::format_int(stats.unparsed_dates as u64)
                );
            }
            println!();
        }
        Err(e) => {
            eprintln!("No data available: {}\n", e);
        }
    }
}

/// Handle option [2]: KPI cards, aggregate previews and file exports.
fn handle_generate_reports() {
    let state = APP_STATE.lock().unwrap();
    let Some(records) = state.cache.records() else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };

    println!("Generating reports...\n");

    let kpis = reports::compute_kpis(records);
    println!("Summary Indicators\n");
    output::print_kpis(&kpis);
    println!();
    if let Err(e) = output::write_json("kpis.json", &kpis) {
        eprintln!("Write error: {}", e);
    }

    let by_region = to_rows(reports::sum_by(records, Dimension::Region));
    export_aggregate("Cases by Department", "cases_by_department.csv", &by_region);

    let top_articles = to_rows(reports::top_n(records, Dimension::ArticleKey, 10));
    export_aggregate("Top Offense Types", "top_offense_types.csv", &top_articles);

    let by_zone = to_rows(reports::sum_by(records, Dimension::Zone));
    export_aggregate("Cases by Zone", "cases_by_zone.csv", &by_zone);

    let by_year_article: Vec<YearArticleRow> = reports::sum_by_year_article(records)
        .into_iter()
        .map(|((year, article), cases)| YearArticleRow {
            year,
            article,
            cases,
        })
        .collect();
    export_aggregate(
        "Cases by Year and Offense",
        "cases_by_year_offense.csv",
        &by_year_article,
    );

    match BoundaryIndex::from_source(&GeoSource::Embedded) {
        Ok(index) => {
            let map = to_rows(geo::choropleth_aggregate(records, &index));
            export_aggregate("Choropleth Input", "choropleth_input.csv", &map);
        }
        Err(e) => {
            // Map rendering degrades; every other report already ran.
            eprintln!("Skipping choropleth input: {}", e);
        }
    }

    println!("(KPI summary exported to kpis.json)\n");
}

fn to_rows(agg: Vec<(String, u64)>) -> Vec<AggregateRow> {
    agg.into_iter()
        .map(|(key, cases)| AggregateRow { key, cases })
        .collect()
}

fn export_aggregate<T>(title: &str, file: &str, rows: &[T])
where
    T: serde::Serialize + tabled::Tabled + Clone,
{
    println!("{}\n", title);
    output::preview_table(rows, 5);
    if let Err(e) = output::write_csv(file, rows) {
        eprintln!("Write error: {}", e);
    }
    println!("(Full table exported to {})\n", file);
}

fn main() {
    env_logger::init();
    loop {
        println!("Environmental Crime Incident Report");
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_generate_reports();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
