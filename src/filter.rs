use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::JobApplication;

/// Column the dashboard list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    JobPosition,
    Company,
    Location,
    Status,
    DateSaved,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::JobPosition,
        SortKey::Company,
        SortKey::Location,
        SortKey::Status,
        SortKey::DateSaved,
    ];

    /// Field name as the backend spells it.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::JobPosition => "jobPosition",
            SortKey::Company => "company",
            SortKey::Location => "location",
            SortKey::Status => "status",
            SortKey::DateSaved => "dateSaved",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::JobPosition => "Job Position",
            SortKey::Company => "Company",
            SortKey::Location => "Location",
            SortKey::Status => "Status",
            SortKey::DateSaved => "Date Saved",
        }
    }

    pub fn next(&self) -> SortKey {
        let idx = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], "").to_lowercase();
        Self::ALL
            .iter()
            .find(|k| k.as_str().to_lowercase() == wanted)
            .copied()
            .ok_or_else(|| {
                format!(
                    "unknown sort key '{}'. Available: jobPosition, company, location, status, dateSaved",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    /// Newest saves first.
    fn default() -> Self {
        Self {
            key: SortKey::DateSaved,
            direction: SortDirection::Desc,
        }
    }
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Result of clicking a column header: the active column ascending flips
    /// to descending, anything else starts ascending.
    pub fn toggled(self, key: SortKey) -> SortConfig {
        let direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        SortConfig { key, direction }
    }
}

impl fmt::Display for SortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key.label(), self.direction.arrow())
    }
}

/// Search term plus ordering: everything the derived view depends on
/// besides the record list itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search_term: String,
    pub sort: SortConfig,
}

/// Case-insensitive substring match against position, company and location.
pub fn matches_search(job: &JobApplication, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    job.job_position.to_lowercase().contains(&needle)
        || job.company.to_lowercase().contains(&needle)
        || job
            .location
            .as_deref()
            .is_some_and(|loc| loc.to_lowercase().contains(&needle))
}

/// Ascending comparison of two records on one column. Text columns compare
/// case-sensitively; a missing location sorts as the empty string and an
/// unparseable save date sorts before any real one.
pub fn compare_by(a: &JobApplication, b: &JobApplication, key: SortKey) -> Ordering {
    match key {
        SortKey::JobPosition => a.job_position.cmp(&b.job_position),
        SortKey::Company => a.company.cmp(&b.company),
        SortKey::Location => a
            .location
            .as_deref()
            .unwrap_or("")
            .cmp(b.location.as_deref().unwrap_or("")),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        SortKey::DateSaved => a.saved_at().cmp(&b.saved_at()),
    }
}

/// Indices into `jobs` of the filtered, sorted view. `sort_by` is stable, so
/// ties keep their input order in both directions.
pub fn derive_indices(jobs: &[JobApplication], query: &ViewQuery) -> Vec<usize> {
    let mut indices: Vec<usize> = jobs
        .iter()
        .enumerate()
        .filter(|(_, job)| matches_search(job, &query.search_term))
        .map(|(i, _)| i)
        .collect();

    let sort = query.sort;
    indices.sort_by(|&a, &b| {
        let ord = compare_by(&jobs[a], &jobs[b], sort.key);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    indices
}

pub fn derive_view<'a>(jobs: &'a [JobApplication], query: &ViewQuery) -> Vec<&'a JobApplication> {
    derive_indices(jobs, query)
        .into_iter()
        .map(|i| &jobs[i])
        .collect()
}

/// Memoised derived view. Recomputes only when the list generation or the
/// query differs from the last call.
#[derive(Debug, Default)]
pub struct DerivedView {
    cached_for: Option<(u64, ViewQuery)>,
    indices: Vec<usize>,
}

impl DerivedView {
    pub fn indices(&mut self, generation: u64, jobs: &[JobApplication], query: &ViewQuery) -> &[usize] {
        let fresh = matches!(&self.cached_for, Some((g, q)) if *g == generation && q == query);
        if !fresh {
            self.indices = derive_indices(jobs, query);
            self.cached_for = Some((generation, query.clone()));
        }
        &self.indices
    }
}
