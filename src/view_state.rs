use futures::stream::{BoxStream, StreamExt};
use tokio::sync::watch;
use tracing::debug;

use crate::formatting::{DETAIL_DATE_PATTERN, SEARCH_DATE_PATTERN};
use crate::mappers::{detail_ui_data, question_item_ui_data};
use crate::models::{Answer, AnswerSortOrder, Question};
use crate::repository::Resource;
use crate::ui_models::{DetailUiData, SearchUiData};

pub const QUESTION_MISSING_ERROR: &str = "Unable to load question";

/// Transient refresh flags shared by both screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStatus {
    pub is_refreshing: bool,
    pub error: Option<String>,
    /// Set once the first refresh has finished, successfully or not.
    pub has_completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pub input_query: String,
    pub submitted_query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchUiState {
    Loading,
    Data { data: SearchUiData, is_refreshing: bool },
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailUiState {
    Loading,
    Data { data: DetailUiData, is_refreshing: bool },
    Error(String),
}

/// Feeds one fetch into the refresh flags. The error is cleared up front and
/// `is_refreshing` drops back to false once the stream ends.
pub async fn drive_refresh(mut resources: BoxStream<'static, Resource<()>>, status: &watch::Sender<RefreshStatus>) {
    status.send_modify(|s| {
        s.error = None;
        s.is_refreshing = true;
    });
    while let Some(resource) = resources.next().await {
        match resource {
            Resource::Loading => status.send_modify(|s| s.is_refreshing = true),
            Resource::Success(()) => status.send_modify(|s| s.error = None),
            Resource::Error { message, .. } => status.send_modify(|s| s.error = Some(message)),
        }
    }
    status.send_modify(|s| {
        s.is_refreshing = false;
        s.has_completed = true;
    });
    debug!("Refresh finished");
}

/// Folds the cached list, refresh flags and query text into one screen state.
///
/// An error only replaces the screen when there is nothing cached to show
/// and no refresh is running. With rows present a failure stays in
/// `refresh.error` and the list remains visible.
pub fn search_ui_state(questions: &[Question], refresh: &RefreshStatus, query: &QueryState) -> SearchUiState {
    if questions.is_empty() {
        if let Some(error) = &refresh.error {
            if !refresh.is_refreshing {
                return SearchUiState::Error(error.clone());
            }
        }
        if refresh.is_refreshing {
            return SearchUiState::Loading;
        }
    }

    SearchUiState::Data {
        data: SearchUiData {
            input_query: query.input_query.clone(),
            submitted_query: query.submitted_query.clone(),
            questions: questions
                .iter()
                .map(|q| question_item_ui_data(q, SEARCH_DATE_PATTERN))
                .collect(),
        },
        is_refreshing: refresh.is_refreshing,
    }
}

pub fn detail_ui_state(
    question: Option<&Question>,
    answers: &[Answer],
    refresh: &RefreshStatus,
    order: AnswerSortOrder,
) -> DetailUiState {
    let Some(question) = question else {
        if answers.is_empty() && !refresh.is_refreshing {
            if let Some(error) = &refresh.error {
                return DetailUiState::Error(error.clone());
            }
        }
        if refresh.is_refreshing || !refresh.has_completed {
            return DetailUiState::Loading;
        }
        return DetailUiState::Error(
            refresh
                .error
                .clone()
                .unwrap_or_else(|| QUESTION_MISSING_ERROR.to_string()),
        );
    };

    let mut sorted = answers.to_vec();
    sort_answers(&mut sorted, order);
    DetailUiState::Data {
        data: detail_ui_data(question, &sorted, DETAIL_DATE_PATTERN),
        is_refreshing: refresh.is_refreshing,
    }
}

/// Stable, so equal keys keep the cache order.
pub fn sort_answers(answers: &mut [Answer], order: AnswerSortOrder) {
    match order {
        AnswerSortOrder::Votes => answers.sort_by(|a, b| b.score.cmp(&a.score)),
        AnswerSortOrder::Oldest => answers.sort_by_key(|a| a.creation_date_epoch_sec),
        AnswerSortOrder::Active => answers.sort_by(|a, b| activity(b).cmp(&activity(a))),
    }
}

fn activity(answer: &Answer) -> i64 {
    answer
        .last_activity_epoch_sec
        .unwrap_or(answer.creation_date_epoch_sec)
}
