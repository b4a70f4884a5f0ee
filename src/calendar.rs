use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::{Datelike, Months, NaiveDate};

use crate::models::{JobApplication, JobId};

/// An all-day entry on the day an application was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: Option<JobId>,
    pub title: String,
    pub date: NaiveDate,
}

pub fn calendar_events(jobs: &[JobApplication]) -> Vec<CalendarEvent> {
    jobs.iter()
        .filter_map(|job| {
            job.applied_on().map(|date| CalendarEvent {
                id: job.id,
                title: format!("{} @ {}", job.job_position, job.company),
                date,
            })
        })
        .collect()
}

/// First day of a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Month(NaiveDate);

impl Month {
    pub fn containing(date: NaiveDate) -> Self {
        Month(date.with_day(1).unwrap_or(date))
    }

    /// Parse `YYYY-MM`.
    pub fn parse(raw: &str) -> Result<Self> {
        NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
            .map(Month)
            .map_err(|_| anyhow!("invalid month '{}', expected YYYY-MM", raw))
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn next(&self) -> Self {
        Month(self.0.checked_add_months(Months::new(1)).unwrap_or(self.0))
    }

    pub fn prev(&self) -> Self {
        Month(self.0.checked_sub_months(Months::new(1)).unwrap_or(self.0))
    }

    pub fn days(&self) -> u32 {
        let next = self.next().0;
        if next == self.0 {
            return 31;
        }
        next.signed_duration_since(self.0).num_days() as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.0.year() && date.month() == self.0.month()
    }

    pub fn label(&self) -> String {
        self.0.format("%B %Y").to_string()
    }
}

/// Events of one month keyed by day of month.
pub fn events_by_day(events: &[CalendarEvent], month: Month) -> BTreeMap<u32, Vec<&CalendarEvent>> {
    let mut days: BTreeMap<u32, Vec<&CalendarEvent>> = BTreeMap::new();
    for event in events.iter().filter(|e| month.contains(e.date)) {
        days.entry(event.date.day()).or_default().push(event);
    }
    days
}

/// Weeks of the month as rows of seven cells starting on Sunday; cells
/// outside the month are `None`.
pub fn month_grid(month: Month) -> Vec<[Option<u32>; 7]> {
    let offset = month.first_day().weekday().num_days_from_sunday() as usize;
    let mut weeks = Vec::new();
    let mut week = [None; 7];
    let mut slot = offset;
    for day in 1..=month.days() {
        week[slot] = Some(day);
        slot += 1;
        if slot == 7 {
            weeks.push(week);
            week = [None; 7];
            slot = 0;
        }
    }
    if slot != 0 {
        weeks.push(week);
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn applied(position: &str, date: Option<&str>) -> JobApplication {
        JobApplication {
            id: Some(1),
            job_position: position.into(),
            company: "Acme".into(),
            date_applied: date.map(Into::into),
            ..JobApplication::blank()
        }
    }

    #[test]
    fn events_only_for_applied_records() {
        let jobs = vec![
            applied("Engineer", Some("2024-02-10T00:00:00")),
            applied("Analyst", None),
        ];
        let events = calendar_events(&jobs);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Engineer @ Acme");
        assert_eq!(events[0].date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
    }

    #[test]
    fn groups_events_in_month() {
        let jobs = vec![
            applied("A", Some("2024-02-10")),
            applied("B", Some("2024-02-10")),
            applied("C", Some("2024-03-01")),
        ];
        let events = calendar_events(&jobs);
        let feb = Month::parse("2024-02").unwrap();
        let by_day = events_by_day(&events, feb);
        assert_eq!(by_day.len(), 1);
        assert_eq!(by_day[&10].len(), 2);
    }

    #[test]
    fn month_navigation_and_length() {
        let feb = Month::parse("2024-02").unwrap();
        assert_eq!(feb.days(), 29);
        assert_eq!(feb.next(), Month::parse("2024-03").unwrap());
        assert_eq!(Month::parse("2024-01").unwrap().prev(), Month::parse("2023-12").unwrap());
        assert_eq!(feb.label(), "February 2024");
        assert!(Month::parse("2024-13").is_err());
    }

    #[test]
    fn grid_starts_on_correct_weekday() {
        // 1 September 2024 was a Sunday, 1 February 2024 a Thursday.
        let sep = month_grid(Month::parse("2024-09").unwrap());
        assert_eq!(sep[0][0], Some(1));
        let feb = month_grid(Month::parse("2024-02").unwrap());
        assert_eq!(feb[0], [None, None, None, None, Some(1), Some(2), Some(3)]);
        assert_eq!(feb.len(), 5);
    }
}
