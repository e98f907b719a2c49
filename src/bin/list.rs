use std::error::Error;

use chrono::Local;
use colored::Colorize as _;
use job_board::{init_logger, Board, BoardConfig, Facet, FilterSelection, JobCard};
use tiny_bail::prelude::*;

const FILTERS_FILE_PATH: &str = "data/filters.ron";

/// Prints facet counts and one page of jobs from the saved snapshot.
/// Usage: `list [PAGE]`
fn main() -> Result<(), Box<dyn Error>> {
    init_logger(log::LevelFilter::Info);
    let config = BoardConfig::load(BoardConfig::PATH)?;
    let mut board = Board::new(config.page_size, config.sort);
    board.load_snapshot(&config.snapshot_path)?;
    board.set_selection(load_filters());
    if let Some(page) = std::env::args().nth(1) {
        board.set_page(page.parse()?);
    }

    for facet in Facet::ALL {
        let counts = board.facet_counts(facet);
        cq!(!counts.is_empty());
        println!("{}", facet.to_string().bold());
        for (value, count) in counts {
            let mark = if board.selection().contains(facet, value) {
                "[x]"
            } else {
                "[ ]"
            };
            println!("  {} {} ({})", mark, value, count);
        }
    }
    println!();

    let today = Local::now().date_naive();
    let page = board.current_page(today);
    for job in &page.jobs {
        println!("{}\n", JobCard::new(job, today));
    }
    if page.jobs.is_empty() {
        println!("No jobs found.");
    }
    println!(
        "{} of {} jobs (page {} of {})",
        page.jobs.len(),
        page.total,
        page.window.page,
        page.total_pages.max(1),
    );
    Ok(())
}

fn load_filters() -> FilterSelection {
    let Ok(filters_str) = std::fs::read_to_string(FILTERS_FILE_PATH) else {
        return FilterSelection::new();
    };
    match ron::from_str(&filters_str) {
        Ok(selection) => selection,
        Err(err) => {
            log::warn!("Ignoring {}: {}", FILTERS_FILE_PATH, err);
            FilterSelection::new()
        }
    }
}
