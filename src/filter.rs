use std::{
    collections::{BTreeSet, HashMap},
    ops::Range,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tiny_bail::prelude::*;

use crate::{
    facet::{split_values, Facet},
    job::JobRecord,
};

/// The user's chosen facet values: AND across facets, OR within one.
///
/// Values are compared case-insensitively. An empty facet imposes no constraint.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq, Debug)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSelection {
    category: BTreeSet<String>,
    organization: BTreeSet<String>,
    city: BTreeSet<String>,
    country: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self, facet: Facet) -> &BTreeSet<String> {
        match facet {
            Facet::Category => &self.category,
            Facet::Organization => &self.organization,
            Facet::City => &self.city,
            Facet::Country => &self.country,
        }
    }

    fn values_mut(&mut self, facet: Facet) -> &mut BTreeSet<String> {
        match facet {
            Facet::Category => &mut self.category,
            Facet::Organization => &mut self.organization,
            Facet::City => &mut self.city,
            Facet::Country => &mut self.country,
        }
    }

    pub fn contains(&self, facet: Facet, value: &str) -> bool {
        let key = match_key(value);
        self.values(facet).iter().any(|v| match_key(v) == key)
    }

    /// Adds `value` if absent, removes it otherwise. Returns whether it is now selected.
    pub fn toggle(&mut self, facet: Facet, value: &str) -> bool {
        let key = match_key(value);
        if key.is_empty() {
            return false;
        }
        let values = self.values_mut(facet);
        let before = values.len();
        values.retain(|v| match_key(v) != key);
        if values.len() < before {
            return false;
        }
        values.insert(key);
        true
    }

    pub fn set(&mut self, facet: Facet, values: impl IntoIterator<Item = impl AsRef<str>>) {
        *self.values_mut(facet) = values
            .into_iter()
            .map(|v| match_key(v.as_ref()))
            .filter(|v| !v.is_empty())
            .collect();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        Facet::ALL.iter().all(|&facet| self.values(facet).is_empty())
    }

    pub fn matches(&self, job: &JobRecord) -> bool {
        Facet::ALL.iter().all(|&facet| {
            let selected = self.values(facet);
            if selected.is_empty() {
                return true;
            }
            let Some(raw) = facet.field(job) else {
                return false;
            };
            split_values(raw)
                .map(match_key)
                .any(|own| selected.iter().any(|v| match_key(v) == own))
        })
    }
}

/// Lower-cased with internal whitespace collapsed.
fn match_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A 1-based page of fixed size.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct PageWindow {
    pub page: usize,
    pub page_size: usize,
}

impl PageWindow {
    pub fn new(page: usize, page_size: usize) -> Self {
        Self { page, page_size }
    }

    /// Index range of this page within `total` items. Empty when out of range.
    pub fn range(&self, total: usize) -> Range<usize> {
        if self.page == 0 || self.page_size == 0 {
            return 0..0;
        }
        let start = (self.page - 1).saturating_mul(self.page_size);
        if start >= total {
            return 0..0;
        }
        start..total.min(start.saturating_add(self.page_size))
    }

    pub fn total_pages(&self, total: usize) -> usize {
        if self.page_size == 0 {
            0
        } else {
            total.div_ceil(self.page_size)
        }
    }
}

/// Order by start date. Jobs without a parseable start date always go last.
#[derive(Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, Debug)]
pub enum SortOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

/// One page of filtered, sorted jobs.
#[derive(Clone, PartialEq, Debug)]
pub struct JobPage<'a> {
    pub jobs: Vec<&'a JobRecord>,
    /// Number of jobs that passed the filter, across all pages.
    pub total: usize,
    pub window: PageWindow,
    pub total_pages: usize,
}

/// Filters, deduplicates, sorts and paginates `jobs`.
///
/// When ids repeat, the last matching record wins.
pub fn filter_jobs<'a>(
    jobs: &'a [JobRecord],
    selection: &FilterSelection,
    window: PageWindow,
    order: SortOrder,
    today: NaiveDate,
) -> JobPage<'a> {
    let mut by_id = HashMap::with_capacity(jobs.len());
    for job in jobs {
        cq!(selection.matches(job));
        if by_id.insert(job.id.as_str(), job).is_some() {
            log::debug!("Job found with duplicate ID: {}", job.id);
        }
    }

    let mut matched = by_id.into_values().collect::<Vec<_>>();
    sort_jobs(&mut matched, order, today);

    let total = matched.len();
    let jobs = matched[window.range(total)].to_vec();
    JobPage {
        jobs,
        total,
        window,
        total_pages: window.total_pages(total),
    }
}

fn sort_jobs(jobs: &mut [&JobRecord], order: SortOrder, today: NaiveDate) {
    jobs.sort_by_cached_key(|job| {
        let age = job.days_since_start(today);
        let age = match order {
            SortOrder::OldestFirst => age.map(|days| -days),
            SortOrder::NewestFirst => age,
        };
        (age.is_none(), age.unwrap_or_default(), job.id.clone())
    });
}
