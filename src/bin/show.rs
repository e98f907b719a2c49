use std::{error::Error, sync::Arc};

use chrono::Local;
use job_board::{
    init_logger, Board, BoardConfig, Credentials, JobDetail, RecruitingApi, TokenCache,
};

/// Renders one job's structured description.
/// Usage: `show JOB_ID`. Looks in the snapshot first, then asks the API.
fn main() -> Result<(), Box<dyn Error>> {
    init_logger(log::LevelFilter::Info);
    let id = std::env::args().nth(1).ok_or("usage: show JOB_ID")?;
    let config = BoardConfig::load(BoardConfig::PATH)?;

    let mut board = Board::new(config.page_size, config.sort);
    if let Err(err) = board.load_snapshot(&config.snapshot_path) {
        log::warn!("{}", err);
    }
    let cached = board
        .jobs()
        .iter()
        .rev()
        .find(|job| job.id == id || job.encrypted_id.as_deref() == Some(id.as_str()))
        .cloned();
    let job = match cached {
        Some(job) => job,
        None => {
            let api = RecruitingApi::new(
                config,
                Credentials::from_env()?,
                Arc::new(TokenCache::new()),
            )?;
            api.fetch_job(&id)?
        }
    };

    println!("{}", JobDetail::new(&job, Local::now().date_naive()));
    Ok(())
}
