use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ron::ser::PrettyConfig;

use crate::{
    api::FetchError,
    facet::{Facet, FacetCounts, FacetIndex},
    filter::{filter_jobs, FilterSelection, JobPage, PageWindow, SortOrder},
    job::JobRecord,
};

/// Identifies one job-list request. Later tickets compare greater.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct FetchTicket(u64);

#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last fetch failed. Nothing retries until the next `begin_fetch`.
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] ron::Error),
}

/// The job list view: jobs, their facet counts, the active filters and the
/// current page.
pub struct Board {
    jobs: Vec<JobRecord>,
    facets: FacetIndex,
    selection: FilterSelection,
    page: usize,
    page_size: usize,
    sort: SortOrder,
    state: LoadState,
    latest_ticket: u64,
}

impl Board {
    pub fn new(page_size: usize, sort: SortOrder) -> Self {
        Self {
            jobs: Vec::new(),
            facets: FacetIndex::default(),
            selection: FilterSelection::new(),
            page: 1,
            page_size: page_size.max(1),
            sort,
            state: LoadState::Idle,
            latest_ticket: 0,
        }
    }

    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    /// Swaps in a new job list and recounts facets. Filters are kept.
    pub fn replace_jobs(&mut self, jobs: Vec<JobRecord>) {
        self.facets = FacetIndex::build(&jobs);
        self.jobs = jobs;
        self.page = 1;
    }

    /// Counts over the full job list, independent of the active filters.
    pub fn facet_counts(&self, facet: Facet) -> &FacetCounts {
        self.facets.get(facet)
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn toggle_filter(&mut self, facet: Facet, value: &str) -> bool {
        self.page = 1;
        self.selection.toggle(facet, value)
    }

    pub fn set_selection(&mut self, selection: FilterSelection) {
        self.page = 1;
        self.selection = selection;
    }

    pub fn clear_filters(&mut self) {
        self.page = 1;
        self.selection.clear();
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.page, self.page_size)
    }

    pub fn current_page(&self, today: NaiveDate) -> JobPage<'_> {
        filter_jobs(&self.jobs, &self.selection, self.window(), self.sort, today)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Starts a job-list request. Only the newest ticket's result will be applied.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_ticket += 1;
        self.state = LoadState::Loading;
        FetchTicket(self.latest_ticket)
    }

    /// Applies a finished request. Returns `false` and changes nothing if a
    /// newer request has been started since `ticket` was issued.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<JobRecord>, FetchError>,
    ) -> bool {
        if ticket.0 != self.latest_ticket {
            log::debug!(
                "Dropping stale job list (request {} of {})",
                ticket.0,
                self.latest_ticket,
            );
            return false;
        }

        match result {
            Ok(jobs) => {
                self.replace_jobs(jobs);
                self.state = LoadState::Ready;
            }
            Err(err) => {
                log::error!("Failed to fetch jobs: {}", err);
                self.state = LoadState::Failed(err.to_string());
            }
        }
        true
    }

    /// Loads the job list saved by [`Board::save_snapshot`].
    pub fn load_snapshot(&mut self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let jobs_str = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let jobs: Vec<JobRecord> = ron::from_str(&jobs_str)?;
        log::debug!("Loaded {} jobs from {}", jobs.len(), path.display());
        self.replace_jobs(jobs);
        self.state = LoadState::Ready;
        Ok(())
    }

    /// Writes the job list as RON, keeping the previous snapshot as `<path>.backup`.
    pub fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let io_error = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };

        if path.exists() {
            let mut backup = path.as_os_str().to_owned();
            backup.push(".backup");
            std::fs::copy(path, &backup).map_err(io_error)?;
        }
        let jobs_str = ron::ser::to_string_pretty(&self.jobs, PrettyConfig::default())?;
        std::fs::write(path, jobs_str).map_err(io_error)?;
        log::debug!("Saved {} jobs to {}", self.jobs.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn job(id: &str, category: &str) -> JobRecord {
        JobRecord {
            category_name: Some(category.into()),
            start_date: Some(format!("2024-05-{:02}", id.len())),
            ..JobRecord::new(id)
        }
    }

    fn jobs() -> Vec<JobRecord> {
        vec![
            job("1", "Engineering, Design"),
            job("2", "Engineering"),
            job("3", "Sales"),
        ]
    }

    #[test]
    fn facets_ignore_filters() {
        let mut board = Board::new(25, SortOrder::OldestFirst);
        board.replace_jobs(jobs());
        let before = board.facet_counts(Facet::Category).clone();

        board.toggle_filter(Facet::Category, "Sales");
        assert_eq!(board.current_page(today()).total, 1);
        assert_eq!(board.facet_counts(Facet::Category), &before);
        assert_eq!(before.get("Engineering"), Some(&2));
    }

    #[test]
    fn filter_changes_reset_page() {
        let mut board = Board::new(1, SortOrder::OldestFirst);
        board.replace_jobs(jobs());
        board.set_page(3);
        assert_eq!(board.current_page(today()).jobs.len(), 1);

        board.toggle_filter(Facet::Category, "Engineering");
        assert_eq!(board.page(), 1);
        assert_eq!(board.current_page(today()).total, 2);

        board.set_page(5);
        assert!(board.current_page(today()).jobs.is_empty());
        board.clear_filters();
        assert_eq!(board.page(), 1);
        assert!(board.selection().is_empty());

        board.set_page(0);
        assert_eq!(board.page(), 1);
    }

    #[test]
    fn stale_fetch_is_dropped() {
        let mut board = Board::new(25, SortOrder::OldestFirst);
        let stale = board.begin_fetch();
        let fresh = board.begin_fetch();
        assert!(stale < fresh);
        assert_eq!(board.state(), &LoadState::Loading);

        assert!(board.finish_fetch(fresh, Ok(jobs())));
        assert!(!board.finish_fetch(stale, Ok(vec![job("9", "Stale")])));
        assert_eq!(board.jobs().len(), 3);
        assert_eq!(board.state(), &LoadState::Ready);
    }

    #[test]
    fn failed_fetch_is_terminal() {
        let mut board = Board::new(25, SortOrder::OldestFirst);
        board.replace_jobs(jobs());
        let ticket = board.begin_fetch();
        assert!(board.finish_fetch(ticket, Err(FetchError::MissingCredential("CLIENT_ID"))));
        assert!(matches!(board.state(), LoadState::Failed(msg) if msg.contains("CLIENT_ID")));
        assert_eq!(board.jobs().len(), 3);
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = std::env::temp_dir().join(format!("job_board_snapshot_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jobs.ron");

        let mut board = Board::new(25, SortOrder::OldestFirst);
        board.replace_jobs(jobs());
        board.save_snapshot(&path).unwrap();
        board.replace_jobs(vec![job("4", "Sales")]);
        board.save_snapshot(&path).unwrap();
        assert!(dir.join("jobs.ron.backup").exists());

        let mut loaded = Board::new(25, SortOrder::OldestFirst);
        loaded.load_snapshot(dir.join("jobs.ron.backup")).unwrap();
        assert_eq!(loaded.jobs(), &jobs()[..]);
        assert_eq!(loaded.state(), &LoadState::Ready);

        assert!(matches!(
            loaded.load_snapshot(dir.join("missing.ron")),
            Err(SnapshotError::Io { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
