use std::collections::BTreeMap;

use crate::models::{JobApplication, JobStatus};

/// One bar or point of a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub name: String,
    pub count: usize,
}

/// Count per status for every status, zero included, in pipeline order.
pub fn status_summary(jobs: &[JobApplication]) -> Vec<(JobStatus, usize)> {
    JobStatus::ALL
        .iter()
        .map(|status| (*status, jobs.iter().filter(|j| j.status == *status).count()))
        .collect()
}

/// Statuses that actually occur, in the order they first appear.
pub fn applications_by_status(jobs: &[JobApplication]) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    for job in jobs {
        let name = job.status.as_str();
        match buckets.iter_mut().find(|b| b.name == name) {
            Some(bucket) => bucket.count += 1,
            None => buckets.push(Bucket {
                name: name.to_string(),
                count: 1,
            }),
        }
    }
    buckets
}

/// Applications per `YYYY-MM` of their save date, oldest month first.
pub fn applications_over_time(jobs: &[JobApplication]) -> Vec<Bucket> {
    let mut months: BTreeMap<String, usize> = BTreeMap::new();
    for saved in jobs.iter().filter_map(|j| j.saved_at()) {
        *months.entry(saved.format("%Y-%m").to_string()).or_default() += 1;
    }
    months
        .into_iter()
        .map(|(name, count)| Bucket { name, count })
        .collect()
}
