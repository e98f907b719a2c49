use std::{error::Error, sync::Arc};

use job_board::{init_logger, BoardConfig, CompanyCard, Credentials, RecruitingApi, TokenCache};

fn main() -> Result<(), Box<dyn Error>> {
    init_logger(log::LevelFilter::Info);
    let config = BoardConfig::load(BoardConfig::PATH)?;
    let api = RecruitingApi::new(
        config,
        Credentials::from_env()?,
        Arc::new(TokenCache::new()),
    )?;

    let companies = api.fetch_companies()?;
    for company in &companies {
        println!("{}\n", CompanyCard::new(company));
    }
    if companies.is_empty() {
        println!("No companies found.");
    }
    Ok(())
}
