use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, Endpoints, RecordStore, UploadFile};
use crate::models::{Document, DocumentId, JobApplication, JobId};
use crate::router::{FetchToken, Router, View};
use crate::session::{FormField, SaveRequest};
use crate::theme::{Palette, ThemePreference};

/// What a background task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// A list fetch; superseded fetches are aborted.
    List,
    /// Work started from one form session.
    Session(u64),
    /// Work that outlives any view, e.g. deleting a job from the dashboard.
    Detached,
}

#[derive(Debug)]
enum Outcome {
    Listed {
        token: FetchToken,
        result: Result<Vec<JobApplication>, ApiError>,
    },
    Saved {
        epoch: u64,
        result: Result<JobApplication, ApiError>,
    },
    JobDeleted {
        id: JobId,
        result: Result<(), ApiError>,
    },
    Uploaded {
        epoch: u64,
        result: Result<Document, ApiError>,
    },
    DocumentDeleted {
        epoch: u64,
        document_id: DocumentId,
        result: Result<(), ApiError>,
    },
}

#[derive(Debug)]
struct Completion {
    task: u64,
    outcome: Outcome,
}

/// A destructive action waiting for a yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    DeleteJob { id: JobId, label: String },
    DeleteDocument { epoch: u64, document_id: DocumentId, file_name: String },
}

impl Confirm {
    pub fn prompt(&self) -> String {
        match self {
            Confirm::DeleteJob { label, .. } => {
                format!("Delete '{}' and all its documents? (y/n)", label)
            }
            Confirm::DeleteDocument { file_name, .. } => {
                format!("Delete document '{}'? (y/n)", file_name)
            }
        }
    }
}

/// One line of feedback in the footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

/// Wires the router and form session to the record store. Store calls run
/// as tokio tasks; their results come back over a channel and are applied
/// by [`App::poll`] (from the UI loop) or [`App::settle`].
pub struct App {
    router: Router,
    store: Arc<dyn RecordStore>,
    endpoints: Endpoints,
    runtime: Handle,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
    tasks: HashMap<u64, (Scope, JoinHandle<()>)>,
    next_task: u64,
    confirm: Option<Confirm>,
    theme: ThemePreference,
    status: Option<StatusLine>,
}

impl App {
    pub fn new(store: Arc<dyn RecordStore>, endpoints: Endpoints, theme: ThemePreference, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            router: Router::new(),
            store,
            endpoints,
            runtime,
            tx,
            rx,
            tasks: HashMap::new(),
            next_task: 0,
            confirm: None,
            theme,
            status: None,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn confirm_pending(&self) -> Option<&Confirm> {
        self.confirm.as_ref()
    }

    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    pub fn palette(&self) -> Palette {
        Palette::for_mode(self.theme.mode())
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    pub fn visible_jobs(&mut self) -> Vec<&JobApplication> {
        self.router.visible_jobs()
    }

    fn info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: false,
        });
    }

    fn fail(&mut self, text: impl Into<String>) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    fn spawn<F>(&mut self, scope: Scope, work: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        self.next_task += 1;
        let task = self.next_task;
        let tx = self.tx.clone();
        let handle = self.runtime.spawn(async move {
            let outcome = work.await;
            // The receiver only goes away when the app shuts down.
            let _ = tx.send(Completion { task, outcome });
        });
        self.tasks.insert(task, (scope, handle));
    }

    fn abort_scope(&mut self, scope: Scope) {
        self.tasks.retain(|task, (s, handle)| {
            if *s == scope {
                debug!(task, ?scope, "aborting task");
                handle.abort();
                false
            } else {
                true
            }
        });
    }

    // --- Record list ---

    /// Re-fetch the whole list. Any fetch still in flight is aborted and,
    /// should it have finished already, its result is dropped as stale.
    pub fn fetch_jobs(&mut self) {
        self.abort_scope(Scope::List);
        let token = self.router.begin_fetch();
        let store = Arc::clone(&self.store);
        debug!(token, "fetching job list");
        self.spawn(Scope::List, async move {
            Outcome::Listed {
                token,
                result: store.list_jobs().await,
            }
        });
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.router.set_search_term(term);
    }

    pub fn sort_by(&mut self, key: crate::filter::SortKey) {
        self.router.sort_by(key);
    }

    // --- Navigation ---

    pub fn navigate(&mut self, target: View) {
        self.router.navigate(target);
        self.drop_session_prompt();
    }

    pub fn show_add_page(&mut self) {
        self.router.show_add_page();
        self.drop_session_prompt();
    }

    pub fn show_edit_page(&mut self, id: JobId) {
        let Some(record) = self.router.jobs().iter().find(|j| j.id == Some(id)).cloned() else {
            warn!(id, "edit requested for unknown job");
            return;
        };
        self.router.show_edit_page(&record);
        self.drop_session_prompt();
    }

    pub fn cancel_form(&mut self) {
        self.router.cancel();
        self.drop_session_prompt();
    }

    fn drop_session_prompt(&mut self) {
        if matches!(&self.confirm, Some(Confirm::DeleteDocument { epoch, .. }) if !self.router.is_current_session(*epoch)) {
            self.confirm = None;
        }
    }

    // --- Form session ---

    pub fn edit_field(&mut self, field: FormField, input: &str) {
        let Some(session) = self.router.session_mut() else { return };
        if let Err(e) = session.set_field(field, input) {
            self.fail(e.to_string());
        }
    }

    pub fn cycle_status(&mut self, forward: bool) {
        if let Some(session) = self.router.session_mut() {
            session.cycle_status(forward);
        }
    }

    /// Submit the buffer. On failure the form stays open with the buffer
    /// untouched so the user can retry.
    pub fn save(&mut self) {
        let Some(session) = self.router.session() else { return };
        let epoch = session.epoch();
        let request = match session.save_request() {
            Ok(request) => request,
            Err(e) => {
                self.fail(e.to_string());
                return;
            }
        };

        let store = Arc::clone(&self.store);
        self.spawn(Scope::Session(epoch), async move {
            let result = match request {
                SaveRequest::Create(payload) => store.create_job(&payload).await,
                SaveRequest::Update { id, payload } => store.update_job(id, &payload).await,
            };
            Outcome::Saved { epoch, result }
        });
    }

    /// Attach a file to the record being edited. A record that has never
    /// been saved has no id to attach to, so nothing is sent.
    pub fn upload(&mut self, path: PathBuf) -> bool {
        let Some(session) = self.router.session() else { return false };
        let epoch = session.epoch();
        let Some(job_id) = session.upload_target() else {
            self.fail("Save the application before attaching documents");
            return false;
        };

        let store = Arc::clone(&self.store);
        self.spawn(Scope::Session(epoch), async move {
            let result = match UploadFile::read(&path).await {
                Ok(file) => store.upload_document(job_id, file).await,
                Err(e) => Err(e),
            };
            Outcome::Uploaded { epoch, result }
        });
        true
    }

    pub fn request_delete_document(&mut self, index: usize) {
        let Some(session) = self.router.session() else { return };
        let Some(document) = session.document_at(index) else { return };
        self.confirm = Some(Confirm::DeleteDocument {
            epoch: session.epoch(),
            document_id: document.id,
            file_name: document.file_name.clone(),
        });
    }

    // --- Dashboard actions ---

    pub fn request_delete_job(&mut self, id: JobId) {
        let Some(job) = self.router.jobs().iter().find(|j| j.id == Some(id)) else { return };
        let label = format!("{} at {}", job.job_position, job.company);
        self.confirm = Some(Confirm::DeleteJob { id, label });
    }

    /// Answer the pending prompt. Declining issues no request.
    pub fn confirm(&mut self, accepted: bool) {
        let Some(confirm) = self.confirm.take() else { return };
        if !accepted {
            debug!(?confirm, "confirmation declined");
            return;
        }
        match confirm {
            Confirm::DeleteJob { id, .. } => {
                let store = Arc::clone(&self.store);
                self.spawn(Scope::Detached, async move {
                    Outcome::JobDeleted {
                        id,
                        result: store.delete_job(id).await,
                    }
                });
            }
            Confirm::DeleteDocument { epoch, document_id, .. } => {
                if !self.router.is_current_session(epoch) {
                    return;
                }
                let store = Arc::clone(&self.store);
                self.spawn(Scope::Session(epoch), async move {
                    Outcome::DocumentDeleted {
                        epoch,
                        document_id,
                        result: store.delete_document(document_id).await,
                    }
                });
            }
        }
    }

    pub fn toggle_theme(&mut self) {
        match self.theme.toggle() {
            Ok(mode) => info!(theme = mode.as_str(), "theme changed"),
            Err(e) => {
                error!(error = %e, "failed to persist theme");
                self.fail(format!("Theme not saved: {}", e));
            }
        }
    }

    // --- Completions ---

    /// Apply every completion that has arrived. Never blocks.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            changed = true;
        }
        changed
    }

    /// Wait until every outstanding task has reported back.
    pub async fn settle(&mut self) {
        while !self.tasks.is_empty() {
            match self.rx.recv().await {
                Some(completion) => self.apply(completion),
                None => break,
            }
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.tasks.remove(&completion.task);
        match completion.outcome {
            Outcome::Listed { token, result } => match result {
                Ok(jobs) => {
                    let count = jobs.len();
                    if self.router.apply_fetch(token, jobs) {
                        debug!(count, "job list replaced");
                    }
                }
                Err(e) => {
                    error!(operation = "list_jobs", error = %e, "failed to fetch jobs");
                    self.router.fail_fetch(token);
                    self.fail(format!("Could not load applications: {}", e));
                }
            },
            Outcome::Saved { epoch, result } => match result {
                Ok(job) => {
                    info!(id = ?job.id, position = %job.job_position, "application saved");
                    if self.router.is_current_session(epoch) {
                        self.router.navigate(View::Dashboard);
                    }
                    self.info(format!("Saved '{}'", job.job_position));
                    self.fetch_jobs();
                }
                Err(e) => {
                    error!(operation = "save_job", error = %e, "failed to save job");
                    self.fail(format!("Save failed: {}", e));
                }
            },
            Outcome::JobDeleted { id, result } => match result {
                Ok(()) => {
                    info!(id, "application deleted");
                    self.info("Application deleted");
                    self.fetch_jobs();
                }
                Err(e) => {
                    error!(operation = "delete_job", id, error = %e, "failed to delete job");
                    self.fail(format!("Delete failed: {}", e));
                }
            },
            Outcome::Uploaded { epoch, result } => match result {
                Ok(document) => {
                    info!(id = document.id, file = %document.file_name, "document uploaded");
                    if let Some(session) = self.router.session_mut().filter(|s| s.epoch() == epoch) {
                        session.apply_uploaded(document);
                    }
                }
                Err(e) => {
                    error!(operation = "upload_document", error = %e, "failed to upload document");
                    self.fail(format!("Upload failed: {}", e));
                }
            },
            Outcome::DocumentDeleted {
                epoch,
                document_id,
                result,
            } => match result {
                Ok(()) => {
                    info!(id = document_id, "document deleted");
                    if let Some(session) = self.router.session_mut().filter(|s| s.epoch() == epoch) {
                        session.apply_document_deleted(document_id);
                    }
                }
                Err(e) => {
                    error!(operation = "delete_document", id = document_id, error = %e, "failed to delete document");
                    self.fail(format!("Could not delete document: {}", e));
                }
            },
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.tasks.drain() {
            handle.abort();
        }
    }
}
