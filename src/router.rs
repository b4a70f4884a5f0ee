use tracing::debug;

use crate::filter::{DerivedView, SortKey, ViewQuery};
use crate::models::JobApplication;
use crate::session::FormSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Calendar,
    Reports,
    Form,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Calendar => "Calendar",
            View::Reports => "Reports",
            View::Form => "Application",
        }
    }
}

/// Sequence number handed out for each list fetch.
pub type FetchToken = u64;

/// Owns the authoritative job list, the current view and the open form
/// session. Pure state: it never performs I/O, the controller does.
#[derive(Debug, Default)]
pub struct Router {
    view: View,
    jobs: Vec<JobApplication>,
    generation: u64,
    query: ViewQuery,
    derived: DerivedView,
    session: Option<FormSession>,
    next_epoch: u64,
    latest_fetch: FetchToken,
    loading: bool,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn jobs(&self) -> &[JobApplication] {
        &self.jobs
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn session(&self) -> Option<&FormSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut FormSession> {
        self.session.as_mut()
    }

    pub fn is_editing(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_editing())
    }

    /// Switch view. Always discards the form session. Returns the epoch of
    /// the discarded session so its in-flight work can be cancelled.
    pub fn navigate(&mut self, target: View) -> Option<u64> {
        self.view = target;
        self.session.take().map(|s| s.epoch())
    }

    pub fn show_add_page(&mut self) -> Option<u64> {
        let dropped = self.navigate(View::Form);
        self.session = Some(FormSession::new_record(self.bump_epoch()));
        dropped
    }

    pub fn show_edit_page(&mut self, record: &JobApplication) -> Option<u64> {
        let dropped = self.navigate(View::Form);
        self.session = Some(FormSession::edit(self.bump_epoch(), record));
        dropped
    }

    pub fn cancel(&mut self) -> Option<u64> {
        self.navigate(View::Dashboard)
    }

    fn bump_epoch(&mut self) -> u64 {
        self.next_epoch += 1;
        self.next_epoch
    }

    /// True when `epoch` names the session currently open in the form.
    pub fn is_current_session(&self, epoch: u64) -> bool {
        self.session.as_ref().is_some_and(|s| s.epoch() == epoch)
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.query.search_term = term.to_string();
    }

    pub fn sort_by(&mut self, key: SortKey) {
        self.query.sort = self.query.sort.toggled(key);
    }

    /// Start a list fetch. Only the most recently issued token is applied.
    pub fn begin_fetch(&mut self) -> FetchToken {
        self.latest_fetch += 1;
        self.loading = true;
        self.latest_fetch
    }

    /// Apply a fetched list wholesale. Returns false (and changes nothing)
    /// when a newer fetch has been issued since this one.
    pub fn apply_fetch(&mut self, token: FetchToken, jobs: Vec<JobApplication>) -> bool {
        if token != self.latest_fetch {
            debug!(token, latest = self.latest_fetch, "dropping stale job list");
            return false;
        }
        self.jobs = jobs;
        self.generation += 1;
        self.loading = false;
        true
    }

    /// A fetch failed: keep the previous list, stop showing the spinner if
    /// it was the latest request.
    pub fn fail_fetch(&mut self, token: FetchToken) {
        if token == self.latest_fetch {
            self.loading = false;
        }
    }

    /// The filtered and sorted dashboard rows.
    pub fn visible_jobs(&mut self) -> Vec<&JobApplication> {
        let indices = self.derived.indices(self.generation, &self.jobs, &self.query);
        indices.iter().map(|&i| &self.jobs[i]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SortDirection;
    use crate::models::JobStatus;
    use pretty_assertions::assert_eq;

    fn record(id: i64, position: &str) -> JobApplication {
        JobApplication {
            id: Some(id),
            job_position: position.into(),
            company: "Acme".into(),
            date_saved: Some(format!("2024-01-0{}", id)),
            ..JobApplication::blank()
        }
    }

    #[test]
    fn starts_on_dashboard() {
        let router = Router::new();
        assert_eq!(router.view(), View::Dashboard);
        assert!(router.session().is_none());
        assert!(!router.is_editing());
    }

    #[test]
    fn add_page_opens_blank_session() {
        let mut router = Router::new();
        router.show_add_page();
        assert_eq!(router.view(), View::Form);
        assert!(!router.is_editing());
        assert_eq!(router.session().unwrap().buffer(), &JobApplication::blank());
    }

    #[test]
    fn edit_page_copies_record() {
        let mut router = Router::new();
        let original = record(3, "Engineer");
        router.show_edit_page(&original);
        assert!(router.is_editing());
        router.session_mut().unwrap().cycle_status(true);
        assert_eq!(original.status, JobStatus::Bookmarked);
        assert_eq!(router.session().unwrap().buffer().status, JobStatus::Applying);
    }

    #[test]
    fn navigate_clears_session_and_reports_epoch() {
        let mut router = Router::new();
        router.show_add_page();
        let epoch = router.session().unwrap().epoch();
        assert_eq!(router.navigate(View::Reports), Some(epoch));
        assert_eq!(router.view(), View::Reports);
        assert!(router.session().is_none());
        assert!(!router.is_editing());
        assert_eq!(router.navigate(View::Calendar), None);
    }

    #[test]
    fn each_session_gets_a_new_epoch() {
        let mut router = Router::new();
        router.show_add_page();
        let first = router.session().unwrap().epoch();
        let dropped = router.show_edit_page(&record(1, "Engineer"));
        assert_eq!(dropped, Some(first));
        assert!(!router.is_current_session(first));
        let second = router.session().unwrap().epoch();
        assert!(router.is_current_session(second));
    }

    #[test]
    fn cancel_returns_to_dashboard() {
        let mut router = Router::new();
        router.show_edit_page(&record(1, "Engineer"));
        router.cancel();
        assert_eq!(router.view(), View::Dashboard);
        assert!(router.session().is_none());
    }

    #[test]
    fn stale_fetch_is_dropped() {
        let mut router = Router::new();
        let older = router.begin_fetch();
        let newer = router.begin_fetch();

        assert!(router.apply_fetch(newer, vec![record(1, "Fresh")]));
        assert!(!router.apply_fetch(older, vec![record(2, "Stale")]));
        assert_eq!(router.jobs().len(), 1);
        assert_eq!(router.jobs()[0].job_position, "Fresh");
        assert!(!router.is_loading());
    }

    #[test]
    fn failed_fetch_keeps_previous_list() {
        let mut router = Router::new();
        let first = router.begin_fetch();
        router.apply_fetch(first, vec![record(1, "Kept")]);
        let second = router.begin_fetch();
        assert!(router.is_loading());
        router.fail_fetch(second);
        assert!(!router.is_loading());
        assert_eq!(router.jobs()[0].job_position, "Kept");
    }

    #[test]
    fn visible_jobs_follow_query() {
        let mut router = Router::new();
        let token = router.begin_fetch();
        router.apply_fetch(token, vec![record(1, "Analyst"), record(2, "Engineer")]);

        let names: Vec<_> = router.visible_jobs().iter().map(|j| j.job_position.clone()).collect();
        assert_eq!(names, vec!["Engineer", "Analyst"]);

        router.sort_by(SortKey::JobPosition);
        assert_eq!(router.query().sort.direction, SortDirection::Asc);
        router.set_search_term("eng");
        let names: Vec<_> = router.visible_jobs().iter().map(|j| j.job_position.clone()).collect();
        assert_eq!(names, vec!["Engineer"]);
    }
}
