use std::fmt::Display;

use chrono::NaiveDate;
use colored::Colorize as _;
use url::Url;

use crate::{
    describe::{describe, DescriptionBlock},
    facet::split_values,
    job::{Company, JobRecord},
    text::{excerpt, normalize},
};

/// Cities shown on a card before collapsing into "+N more".
const SHOWN_CITIES: usize = 3;
/// Preview length for card descriptions, in characters.
const EXCERPT_CHARS: usize = 160;

/// How an organization is pictured.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Logo {
    Image(Url),
    /// Placeholder letter when there is no usable logo URL.
    Initial(char),
}

impl Logo {
    /// Uses `url` only if it is an absolute HTTP(S) URL.
    pub fn new(url: Option<&str>, organization: Option<&str>) -> Self {
        let image = url
            .and_then(|url| Url::parse(url.trim()).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"));
        match image {
            Some(url) => Logo::Image(url),
            None => Logo::Initial(initial(organization)),
        }
    }
}

fn initial(name: Option<&str>) -> char {
    name.and_then(|name| name.chars().find(|c| c.is_alphanumeric()))
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}

/// A job as shown in the list view.
#[derive(Clone, PartialEq, Debug)]
pub struct JobCard {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub logo: Logo,
    pub country: String,
    pub cities: String,
    pub category: Option<String>,
    pub salary: Option<String>,
    pub posted: String,
    pub excerpt: String,
    pub link: String,
}

impl JobCard {
    pub fn new(job: &JobRecord, today: NaiveDate) -> Self {
        let public_id = job.encrypted_id.as_deref().unwrap_or(&job.id);

        Self {
            id: job.id.clone(),
            title: job.to_string(),
            organization: job.organization.clone().unwrap_or_else(|| "Unknown".into()),
            logo: Logo::new(
                job.organization_logo.as_deref(),
                job.organization.as_deref(),
            ),
            country: job.country.clone().unwrap_or_else(|| "Unknown".into()),
            cities: job
                .city
                .as_deref()
                .map(|city| format_cities(city, SHOWN_CITIES))
                .unwrap_or_default(),
            category: job.category_name.clone(),
            salary: job.salary.and_then(format_salary),
            posted: posted_label(job.days_since_start(today)),
            excerpt: excerpt(
                &normalize(job.description.as_deref().unwrap_or_default()),
                EXCERPT_CHARS,
            ),
            link: format!("/jobs/{}", public_id),
        }
    }
}

impl Display for JobCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let logo = match &self.logo {
            Logo::Image(_) => "◉".to_string(),
            Logo::Initial(c) => c.to_string(),
        };
        writeln!(f, "[{}] {} ({})", logo.bold(), self.title.bold(), self.link.italic())?;
        write!(f, "    {}", self.organization)?;
        if !self.cities.is_empty() {
            write!(f, " • {}", self.cities)?;
        }
        writeln!(f, ", {}", self.country)?;
        if let Some(category) = &self.category {
            writeln!(f, "    {}", category.green())?;
        }
        if let Some(salary) = &self.salary {
            writeln!(f, "    Salary: {}", salary)?;
        }
        writeln!(f, "    {}", self.posted.dimmed())?;
        write!(f, "    {}", self.excerpt)
    }
}

/// A job as shown on its own page, description structured into blocks.
#[derive(Clone, PartialEq, Debug)]
pub struct JobDetail {
    pub card: JobCard,
    pub blocks: Vec<DescriptionBlock>,
    pub positions: Option<String>,
    pub closes: Option<String>,
    pub profile_url: Option<String>,
}

impl JobDetail {
    pub fn new(job: &JobRecord, today: NaiveDate) -> Self {
        Self {
            card: JobCard::new(job, today),
            blocks: describe(job.description.as_deref().unwrap_or_default()),
            positions: job.positions.clone(),
            closes: job
                .ends()
                .map(|date| date.format("%d %b %Y").to_string())
                .or_else(|| job.end_date.clone()),
            profile_url: job.url.clone(),
        }
    }
}

impl Display for JobDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let card = &self.card;
        writeln!(f, "{}", card.title.bold())?;
        write!(f, "{}", card.organization)?;
        if !card.cities.is_empty() {
            write!(f, " • {}", card.cities)?;
        }
        writeln!(f, ", {}", card.country)?;
        if let Some(category) = &card.category {
            writeln!(f, "{}", category.green())?;
        }
        if let Some(positions) = &self.positions {
            writeln!(f, "Positions: {}", positions)?;
        }
        if let Some(salary) = &card.salary {
            writeln!(f, "Salary: {}", salary)?;
        }
        writeln!(f, "{}", card.posted.dimmed())?;
        writeln!(f)?;
        writeln!(f, "{}", render_blocks(&self.blocks))?;
        if let Some(closes) = &self.closes {
            writeln!(f)?;
            writeln!(f, "Closes: {}", closes)?;
        }
        if let Some(url) = &self.profile_url {
            write!(f, "Company profile: {}", url.italic())?;
        }
        Ok(())
    }
}

/// A company as shown in the companies view.
#[derive(Clone, PartialEq, Debug)]
pub struct CompanyCard {
    pub name: String,
    pub logo: Logo,
    pub location: String,
    pub category: Option<String>,
    pub positions: Option<String>,
    pub excerpt: String,
    pub link: Option<String>,
}

impl CompanyCard {
    pub fn new(company: &Company) -> Self {
        let location = [company.city.as_deref(), company.country.as_deref()]
            .into_iter()
            .flatten()
            .map(|part| format_cities(part, SHOWN_CITIES))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            name: company.to_string(),
            logo: Logo::new(
                company.organization_logo.as_deref(),
                company.organization.as_deref(),
            ),
            location,
            category: company.category_name.clone(),
            positions: company.positions.clone(),
            excerpt: excerpt(
                &normalize(company.description.as_deref().unwrap_or_default()),
                EXCERPT_CHARS,
            ),
            link: company.url.clone(),
        }
    }
}

impl Display for CompanyCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let logo = match &self.logo {
            Logo::Image(_) => "◉".to_string(),
            Logo::Initial(c) => c.to_string(),
        };
        write!(f, "[{}] {}", logo.bold(), self.name.bold())?;
        if let Some(positions) = &self.positions {
            write!(f, " ({} open)", positions)?;
        }
        writeln!(f)?;
        if !self.location.is_empty() {
            writeln!(f, "    {}", self.location)?;
        }
        if let Some(category) = &self.category {
            writeln!(f, "    {}", category.green())?;
        }
        write!(f, "    {}", self.excerpt)
    }
}

/// Joins up to `shown` cities with `•`, summarizing the rest as "+N more".
pub fn format_cities(raw: &str, shown: usize) -> String {
    let cities = split_values(raw).collect::<Vec<_>>();
    let mut label = cities
        .iter()
        .take(shown)
        .copied()
        .collect::<Vec<_>>()
        .join(" • ");
    if cities.len() > shown {
        if !label.is_empty() {
            label.push(' ');
        }
        label.push_str(&format!("+{} more", cities.len() - shown));
    }
    label
}

/// Rounds to whole units and groups thousands with commas.
pub fn format_salary(amount: f64) -> Option<String> {
    if !amount.is_finite() {
        return None;
    }
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0.0 {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    Some(grouped)
}

pub fn posted_label(days: Option<i64>) -> String {
    match days {
        None => "Unknown".to_string(),
        Some(0) => "Posted today".to_string(),
        Some(1) => "Posted 1 day ago".to_string(),
        Some(-1) => "Starts tomorrow".to_string(),
        Some(days) if days < 0 => format!("Starts in {} days", -days),
        Some(days) => format!("Posted {} days ago", days),
    }
}

/// Renders description blocks for a terminal: headings bold, labels bold,
/// bullet lists as `•` items, paragraphs plain.
pub fn render_blocks(blocks: &[DescriptionBlock]) -> String {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            DescriptionBlock::Heading(text) => lines.push(text.bold().to_string()),
            DescriptionBlock::LabelValue(label, value) => {
                lines.push(format!("{} {}", format!("{label}:").bold(), value));
            }
            DescriptionBlock::BulletList(items) => {
                lines.extend(items.iter().map(|item| format!("  • {}", item)));
            }
            DescriptionBlock::Paragraph(text) => lines.push(text.clone()),
        }
    }
    lines.join("\n")
}
