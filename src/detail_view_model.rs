use futures::stream::{BoxStream, StreamExt};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::models::{Answer, AnswerSortOrder, Question};
use crate::repository::{AnswerRepository, QuestionRepository};
use crate::view_state::{detail_ui_state, drive_refresh, DetailUiState, RefreshStatus};

/// State holder for one question's detail screen. Lives as long as the
/// screen is shown; dropping it cancels the answer refresh and the cache
/// subscriptions.
pub struct DetailViewModel {
    question_id: i64,
    answers: AnswerRepository,
    runtime: Handle,
    refresh: Arc<watch::Sender<RefreshStatus>>,
    sort_order: watch::Sender<AnswerSortOrder>,
    ui_state: watch::Receiver<DetailUiState>,
    refresh_task: Option<JoinHandle<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl DetailViewModel {
    pub fn new(question_id: i64, questions: QuestionRepository, answers: AnswerRepository, runtime: Handle) -> Self {
        let (refresh, _) = watch::channel(RefreshStatus::default());
        let refresh = Arc::new(refresh);
        let (sort_order, _) = watch::channel(AnswerSortOrder::default());
        let (ui_tx, ui_state) = watch::channel(DetailUiState::Loading);

        let combine = runtime.spawn(combine_state(
            questions.get_question_by_id(question_id),
            answers.get_answers_by_question_id(question_id),
            refresh.subscribe(),
            sort_order.subscribe(),
            ui_tx,
        ));

        let mut view_model = Self {
            question_id,
            answers,
            runtime,
            refresh,
            sort_order,
            ui_state,
            refresh_task: None,
            tasks: vec![combine],
        };
        view_model.refresh_answers();
        view_model
    }

    pub fn question_id(&self) -> i64 {
        self.question_id
    }

    pub fn ui_state(&self) -> DetailUiState {
        self.ui_state.borrow().clone()
    }

    /// Web address the API gave for the question, once it is loaded.
    pub fn question_link(&self) -> Option<String> {
        match &*self.ui_state.borrow() {
            DetailUiState::Data { data, .. } => data.link.clone(),
            _ => None,
        }
    }

    pub fn refresh_error(&self) -> Option<String> {
        self.refresh.borrow().error.clone()
    }

    pub fn dismiss_refresh_error(&self) {
        self.refresh.send_if_modified(|status| status.error.take().is_some());
    }

    pub fn sort_order(&self) -> AnswerSortOrder {
        *self.sort_order.borrow()
    }

    /// Re-sorts the cached answers in memory. Never fetches.
    pub fn set_sort_order(&self, order: AnswerSortOrder) {
        self.sort_order.send_if_modified(|current| {
            if *current == order {
                return false;
            }
            *current = order;
            true
        });
    }

    pub fn retry_refresh(&mut self) {
        self.refresh_answers();
    }

    /// See [`crate::search_view_model::SearchViewModel::watch_changes`].
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

    fn refresh_answers(&mut self) {
        if let Some(previous) = self.refresh_task.take() {
            previous.abort();
        }
        info!("Refreshing answers for question {}", self.question_id);
        self.refresh.send_modify(|status| {
            status.error = None;
            status.is_refreshing = true;
        });
        let resources = self.answers.fetch_answers_for_question(self.question_id);
        let refresh = Arc::clone(&self.refresh);
        self.refresh_task = Some(
            self.runtime
                .spawn(async move { drive_refresh(resources, &refresh).await }),
        );
    }
}

impl Drop for DetailViewModel {
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
    mut question_stream: BoxStream<'static, Option<Question>>,
    mut answers_stream: BoxStream<'static, Vec<Answer>>,
    mut refresh: watch::Receiver<RefreshStatus>,
    mut sort_order: watch::Receiver<AnswerSortOrder>,
    ui_state: watch::Sender<DetailUiState>,
) {
    let (Some(mut question), Some(mut answers)) = (question_stream.next().await, answers_stream.next().await) else {
        return;
    };

    loop {
        let order = *sort_order.borrow_and_update();
        let state = detail_ui_state(question.as_ref(), &answers, &refresh.borrow_and_update(), order);
        ui_state.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });

        tokio::select! {
            next = question_stream.next() => match next {
                Some(row) => question = row,
                None => break,
            },
            next = answers_stream.next() => match next {
                Some(rows) => answers = rows,
                None => break,
            },
            changed = refresh.changed() => if changed.is_err() { break },
            changed = sort_order.changed() => if changed.is_err() { break },
        }
    }
}
