macro_rules! re {
    ($name:ident, $($e:expr),* $(,)?) => {
        static $name: std::sync::LazyLock<regex::Regex> = std::sync::LazyLock::new(
            || regex::Regex::new(concat!($($e),*)).unwrap(),
        );
    };
}

mod api;
mod board;
mod config;
mod describe;
mod facet;
mod filter;
mod job;
mod present;
mod text;

pub use api::{Credentials, FetchError, RecruitingApi, TokenCache, TokenGrant};
pub use board::{Board, FetchTicket, LoadState, SnapshotError};
pub use config::{BoardConfig, ConfigError};
pub use describe::{bullet_points, describe, structure, DescriptionBlock};
pub use facet::{aggregate, normalize_value, split_values, Facet, FacetCounts, FacetIndex};
pub use filter::{filter_jobs, FilterSelection, JobPage, PageWindow, SortOrder};
pub use job::{days_ago, decode_listing, parse_date, Company, JobRecord};
pub use present::{
    format_cities, format_salary, posted_label, render_blocks, CompanyCard, JobCard, JobDetail,
    Logo,
};
pub use text::{excerpt, normalize};

pub fn init_logger(default_level: log::LevelFilter) {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(default_level)
        .parse_default_env()
        .init();
}
