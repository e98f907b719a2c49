use std::{error::Error, sync::Arc};

use job_board::{
    init_logger, Board, BoardConfig, Credentials, LoadState, RecruitingApi, TokenCache,
};

fn main() -> Result<(), Box<dyn Error>> {
    init_logger(log::LevelFilter::Info);
    let config = BoardConfig::load(BoardConfig::PATH)?;
    let api = RecruitingApi::new(
        config.clone(),
        Credentials::from_env()?,
        Arc::new(TokenCache::new()),
    )?;

    let mut board = Board::new(config.page_size, config.sort);
    let ticket = board.begin_fetch();
    board.finish_fetch(ticket, api.fetch_jobs());
    if let LoadState::Failed(message) = board.state() {
        return Err(message.clone().into());
    }

    board.save_snapshot(&config.snapshot_path)?;
    log::info!(
        "Saved {} jobs to {}",
        board.jobs().len(),
        config.snapshot_path.display(),
    );
    Ok(())
}
