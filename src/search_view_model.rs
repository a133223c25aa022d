use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::repository::{QuestionRepository, Resource};
use crate::view_state::{drive_refresh, search_ui_state, QueryState, RefreshStatus, SearchUiState};

/// State holder for the search screen.
///
/// Owns the tasks feeding its state. Dropping it aborts them, which also
/// cancels a fetch still in flight.
pub struct SearchViewModel {
    repository: QuestionRepository,
    runtime: Handle,
    refresh: Arc<watch::Sender<RefreshStatus>>,
    query: watch::Sender<QueryState>,
    ui_state: watch::Receiver<SearchUiState>,
    refresh_task: Option<JoinHandle<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl SearchViewModel {
    /// Starts observing the cache and loads the newest questions.
    pub fn new(repository: QuestionRepository, runtime: Handle) -> Self {
        let (refresh, _) = watch::channel(RefreshStatus {
            is_refreshing: true,
            ..RefreshStatus::default()
        });
        let refresh = Arc::new(refresh);
        let (query, _) = watch::channel(QueryState::default());
        let (ui_tx, ui_state) = watch::channel(SearchUiState::Loading);

        let combine = runtime.spawn(combine_state(
            repository.clone(),
            refresh.subscribe(),
            query.subscribe(),
            ui_tx,
        ));

        let mut view_model = Self {
            repository,
            runtime,
            refresh,
            query,
            ui_state,
            refresh_task: None,
            tasks: vec![combine],
        };
        view_model.refresh_newest();
        view_model
    }

    pub fn ui_state(&self) -> SearchUiState {
        self.ui_state.borrow().clone()
    }

    /// A failure that happened while cached questions stayed visible.
    pub fn refresh_error(&self) -> Option<String> {
        self.refresh.borrow().error.clone()
    }

    pub fn dismiss_refresh_error(&self) {
        self.refresh.send_if_modified(|status| status.error.take().is_some());
    }

    pub fn input_query(&self) -> String {
        self.query.borrow().input_query.clone()
    }

    /// Tracks the text field on every keystroke. Nothing is fetched.
    pub fn update_query(&self, input: &str) {
        self.query.send_if_modified(|state| {
            if state.input_query == input {
                return false;
            }
            state.input_query = input.to_string();
            true
        });
    }

    /// Submits `query`. Re-submitting the current query does nothing; a
    /// blank query goes back to the newest questions.
    pub fn search_questions(&mut self, query: &str) {
        let query = query.trim().to_string();
        if self.query.borrow().submitted_query == query {
            debug!("Query {:?} already submitted", query);
            return;
        }
        self.query.send_modify(|state| state.submitted_query = query.clone());

        if query.is_empty() {
            self.refresh_newest();
        } else {
            info!("Searching for {:?}", query);
            let resources = self.repository.search_questions(&query);
            self.start_refresh(resources);
        }
    }

    /// Re-runs whatever produced the current list.
    pub fn retry_refresh(&mut self) {
        let submitted = self.query.borrow().submitted_query.clone();
        if submitted.is_empty() {
            self.refresh_newest();
        } else {
            let resources = self.repository.search_questions(&submitted);
            self.start_refresh(resources);
        }
    }

    /// Calls `on_change` whenever the screen state or the refresh flags move.
    pub fn watch_changes<F>(&mut self, on_change: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut ui_state = self.ui_state.clone();
        let mut refresh = self.refresh.subscribe();
        let task = self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    changed = ui_state.changed() => if changed.is_err() { break },
                    changed = refresh.changed() => if changed.is_err() { break },
                }
                on_change();
            }
        });
        self.tasks.push(task);
    }

    fn refresh_newest(&mut self) {
        let resources = self.repository.fetch_newest_questions();
        self.start_refresh(resources);
    }

    // One refresh at a time: a new one supersedes whatever is still running.
    fn start_refresh(&mut self, resources: BoxStream<'static, Resource<()>>) {
        if let Some(previous) = self.refresh_task.take() {
            previous.abort();
        }
        self.refresh.send_modify(|status| {
            status.error = None;
            status.is_refreshing = true;
        });
        let refresh = Arc::clone(&self.refresh);
        self.refresh_task = Some(
            self.runtime
                .spawn(async move { drive_refresh(resources, &refresh).await }),
        );
    }
}

impl Drop for SearchViewModel {
    fn drop(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn combine_state(
    repository: QuestionRepository,
    mut refresh: watch::Receiver<RefreshStatus>,
    mut query: watch::Receiver<QueryState>,
    ui_state: watch::Sender<SearchUiState>,
) {
    let mut questions_stream = repository.get_questions();
    let Some(mut questions) = questions_stream.next().await else {
        return;
    };

    loop {
        let state = search_ui_state(&questions, &refresh.borrow_and_update(), &query.borrow_and_update());
        ui_state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });

        tokio::select! {
            next = questions_stream.next() => match next {
                Some(rows) => questions = rows,
                None => break,
            },
            changed = refresh.changed() => if changed.is_err() { break },
            changed = query.changed() => if changed.is_err() { break },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::repository::tests::{question_dto, FakeRemote};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    fn view_model(remote: Arc<FakeRemote>) -> SearchViewModel {
        let db = Database::open_in_memory().unwrap();
        SearchViewModel::new(QuestionRepository::new(remote, db), Handle::current())
    }

    /// Polls until `check` holds for the current state, failing after two seconds.
    async fn wait_for<F>(view_model: &SearchViewModel, check: F) -> SearchUiState
    where
        F: Fn(&SearchUiState) -> bool,
    {
        let mut rx = view_model.ui_state.clone();
        timeout(Duration::from_secs(2), async {
            loop {
                let state = rx.borrow_and_update().clone();
                if check(&state) && !view_model.refresh.borrow().is_refreshing {
                    return state;
                }
                tokio::select! {
                    _ = rx.changed() => {}
                    _ = sleep(Duration::from_millis(10)) => {}
                }
            }
        })
        .await
        .expect("state never settled")
    }

    fn titles(state: &SearchUiState) -> Vec<String> {
        match state {
            SearchUiState::Data { data, .. } => data.questions.iter().map(|q| q.title.clone()).collect(),
            _ => Vec::new(),
        }
    }

    #[tokio::test]
    async fn loads_newest_on_start() {
        let remote = Arc::new(FakeRemote::default());
        *remote.newest.lock().unwrap() = vec![question_dto(1, 100), question_dto(2, 200)];
        let vm = view_model(remote.clone());

        let state = wait_for(&vm, |s| titles(s).len() == 2).await;
        assert_eq!(titles(&state), vec!["Question 2", "Question 1"]);
        assert_eq!(remote.newest_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn same_query_twice_fetches_once() {
        let remote = Arc::new(FakeRemote::default());
        *remote.search_results.lock().unwrap() = vec![question_dto(3, 300)];
        let mut vm = view_model(remote.clone());

        vm.search_questions("lifetimes");
        vm.search_questions("lifetimes ");
        let state = wait_for(&vm, |s| titles(s) == vec!["Question 3"]).await;
        if let SearchUiState::Data { data, .. } = state {
            assert_eq!(data.submitted_query, "lifetimes");
        }
        assert_eq!(remote.search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_with_empty_cache_is_error_state() {
        let remote = Arc::new(FakeRemote::failing());
        let vm = view_model(remote);

        let state = wait_for(&vm, |s| matches!(s, SearchUiState::Error(_))).await;
        assert_eq!(state, SearchUiState::Error("Failed to load questions".to_string()));
    }

    #[tokio::test]
    async fn failure_with_cached_rows_keeps_data() {
        let remote = Arc::new(FakeRemote::default());
        *remote.newest.lock().unwrap() = vec![question_dto(1, 100)];
        let mut vm = view_model(remote.clone());
        wait_for(&vm, |s| titles(s).len() == 1).await;

        remote.fail.store(true, Ordering::SeqCst);
        vm.search_questions("anything");
        let mut rx = vm.refresh.subscribe();
        timeout(Duration::from_secs(2), rx.wait_for(|s| s.error.is_some() && !s.is_refreshing))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(titles(&vm.ui_state()), vec!["Question 1"]);
        assert_eq!(vm.refresh_error().as_deref(), Some("Failed to load questions"));
        vm.dismiss_refresh_error();
        assert_eq!(vm.refresh_error(), None);
    }

    #[tokio::test]
    async fn retry_follows_submitted_query() {
        let remote = Arc::new(FakeRemote::default());
        let mut vm = view_model(remote.clone());
        wait_for(&vm, |s| matches!(s, SearchUiState::Data { .. })).await;

        vm.retry_refresh();
        wait_for(&vm, |s| matches!(s, SearchUiState::Data { .. })).await;
        assert_eq!(remote.newest_calls.load(Ordering::SeqCst), 2);

        vm.search_questions("traits");
        vm.retry_refresh();
        wait_for(&vm, |s| matches!(s, SearchUiState::Data { .. })).await;
        assert_eq!(remote.last_query.lock().unwrap().as_deref(), Some("traits"));
        assert!(remote.search_calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn blank_query_goes_back_to_newest() {
        let remote = Arc::new(FakeRemote::default());
        *remote.newest.lock().unwrap() = vec![question_dto(1, 100)];
        *remote.search_results.lock().unwrap() = vec![question_dto(3, 300)];
        let mut vm = view_model(remote.clone());
        wait_for(&vm, |s| titles(s) == vec!["Question 1"]).await;

        vm.search_questions("x");
        wait_for(&vm, |s| titles(s) == vec!["Question 3"]).await;
        assert_eq!(remote.newest_calls.load(Ordering::SeqCst), 1);

        vm.search_questions("   ");
        let state = wait_for(&vm, |s| titles(s) == vec!["Question 1"]).await;
        if let SearchUiState::Data { data, .. } = state {
            assert_eq!(data.submitted_query, "");
        }
        assert_eq!(remote.newest_calls.load(Ordering::SeqCst), 2);
        assert_eq!(remote.search_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn typing_updates_input_only() {
        let remote = Arc::new(FakeRemote::default());
        let vm = view_model(remote.clone());
        wait_for(&vm, |s| matches!(s, SearchUiState::Data { .. })).await;

        vm.update_query("asy");
        let state = wait_for(&vm, |s| matches!(s, SearchUiState::Data { data, .. } if data.input_query == "asy")).await;
        if let SearchUiState::Data { data, .. } = state {
            assert_eq!(data.submitted_query, "");
        }
        assert_eq!(vm.input_query(), "asy");
        assert_eq!(remote.search_calls.load(Ordering::SeqCst), 0);
    }
}
