use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use serde::{Deserialize, Serialize};
use tiny_bail::prelude::*;

use crate::job::JobRecord;

/// Normalized facet value to the number of jobs carrying it.
pub type FacetCounts = BTreeMap<String, usize>;

/// A categorical dimension jobs can be filtered on.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Facet {
    Category,
    Organization,
    City,
    Country,
}

impl Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Facet::Category => "Categories",
            Facet::Organization => "Organizations",
            Facet::City => "Cities",
            Facet::Country => "Countries",
        })
    }
}

impl Facet {
    pub const ALL: [Facet; 4] = [
        Facet::Category,
        Facet::Organization,
        Facet::City,
        Facet::Country,
    ];

    /// The raw field this facet reads from a job.
    pub fn field(self, job: &JobRecord) -> Option<&str> {
        match self {
            Facet::Category => job.category_name.as_deref(),
            Facet::Organization => job.organization.as_deref(),
            Facet::City => job.city.as_deref(),
            Facet::Country => job.country.as_deref(),
        }
    }
}

/// Splits a multi-valued field on `,`, `&` or the word `and`, trimming pieces
/// and dropping empty ones.
pub fn split_values(raw: &str) -> impl Iterator<Item = &str> {
    re!(DELIMITER_RE, r"(?i),|&|\band\b");

    DELIMITER_RE
        .split(raw)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
}

/// Title-cases a facet piece, or rejects it if it is shorter than three
/// characters or holds anything but letters and spaces.
pub fn normalize_value(piece: &str) -> Option<String> {
    let piece = piece.trim();
    if piece.chars().count() < 3
        || !piece.chars().all(|c| c.is_alphabetic() || c.is_whitespace())
    {
        return None;
    }

    let words = piece.split_whitespace().map(|word| {
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            return String::new();
        };
        first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect::<String>()
    });
    Some(words.collect::<Vec<String>>().join(" "))
}

/// Counts normalized facet values across `jobs`. A job counts once per
/// distinct value, so multi-valued fields contribute to several entries.
pub fn aggregate(jobs: &[JobRecord], facet: Facet) -> FacetCounts {
    let mut counts = FacetCounts::new();
    for job in jobs {
        let raw = cq!(facet.field(job));
        let values = split_values(raw)
            .filter_map(normalize_value)
            .collect::<BTreeSet<_>>();
        for value in values {
            *counts.entry(value).or_default() += 1;
        }
    }
    counts
}

/// Facet counts for every facet over the full, unfiltered job list.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct FacetIndex {
    category: FacetCounts,
    organization: FacetCounts,
    city: FacetCounts,
    country: FacetCounts,
}

impl FacetIndex {
    pub fn build(jobs: &[JobRecord]) -> Self {
        Self {
            category: aggregate(jobs, Facet::Category),
            organization: aggregate(jobs, Facet::Organization),
            city: aggregate(jobs, Facet::City),
            country: aggregate(jobs, Facet::Country),
        }
    }

    pub fn get(&self, facet: Facet) -> &FacetCounts {
        match facet {
            Facet::Category => &self.category,
            Facet::Organization => &self.organization,
            Facet::City => &self.city,
            Facet::Country => &self.country,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, category: &str, city: &str) -> JobRecord {
        JobRecord {
            category_name: Some(category.into()),
            city: Some(city.into()),
            ..JobRecord::new(id)
        }
    }

    #[test]
    fn category_counts() {
        let jobs = [
            job("1", "Engineering, Design", "Lahore"),
            job("2", "Engineering", "Lahore"),
            job("3", "Sales", "Karachi"),
        ];
        let counts = aggregate(&jobs, Facet::Category);
        assert_eq!(
            counts,
            FacetCounts::from([
                ("Design".into(), 1),
                ("Engineering".into(), 2),
                ("Sales".into(), 1),
            ]),
        );
    }

    #[test]
    fn messy_cities() {
        let jobs = [
            job("1", "", "lahore, KARACHI & Islamabad and Multan"),
            job("2", "", "Lahore,, Lahore, 54000, G-9, NY"),
            job("3", "", "  new   york "),
            JobRecord::new("4"),
        ];
        let counts = aggregate(&jobs, Facet::City);
        assert_eq!(
            counts,
            FacetCounts::from([
                ("Islamabad".into(), 1),
                ("Karachi".into(), 1),
                ("Lahore".into(), 2),
                ("Multan".into(), 1),
                ("New York".into(), 1),
            ]),
        );
    }

    #[test]
    fn normalize_values() {
        for (piece, expected) in [
            ("engineering", Some("Engineering")),
            ("  SALES  ", Some("Sales")),
            ("research  development", Some("Research Development")),
            ("IT", None),
            ("Level 3", None),
            ("R&D", None),
            ("São paulo", Some("São Paulo")),
            ("", None),
        ] {
            assert_eq!(normalize_value(piece).as_deref(), expected, "{}", piece);
        }
    }

    #[test]
    fn split_on_delimiters() {
        assert_eq!(
            split_values("A, B & C AND D, Andover").collect::<Vec<_>>(),
            ["A", "B", "C", "D", "Andover"],
        );
        assert_eq!(split_values(" , & ").count(), 0);
    }

    #[test]
    fn index_covers_every_facet() {
        let jobs = [JobRecord {
            organization: Some("Acme".into()),
            country: Some("Pakistan".into()),
            ..job("1", "Sales", "Lahore")
        }];
        let index = FacetIndex::build(&jobs);
        for facet in Facet::ALL {
            assert_eq!(index.get(facet).values().sum::<usize>(), 1, "{}", facet);
        }
    }
}
