use anyhow::Error;
use futures::future::ready;
use futures::stream::{self, BoxStream, StreamExt};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::{AnswerEntity, Cancellation, Database};
use crate::mappers::{answers_to_entities, questions_to_entities};
use crate::models::{Answer, Question};
use crate::stack_client::{AnswerService, QuestionService, QuestionsResponse, RemoteError};

pub const QUESTIONS_ERROR: &str = "Failed to load questions";
pub const ANSWERS_ERROR: &str = "Failed to load answers";

/// Progress of a single fetch. A fetch stream yields `Loading` and then
/// exactly one of `Success` or `Error`.
#[derive(Clone)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error { message: String, cause: Arc<Error> },
}

impl<T: fmt::Debug> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Loading => write!(f, "Loading"),
            Resource::Success(value) => f.debug_tuple("Success").field(value).finish(),
            Resource::Error { message, cause } => f
                .debug_struct("Error")
                .field("message", message)
                .field("cause", &format_args!("{:#}", cause))
                .finish(),
        }
    }
}

struct CancelOnDrop(Cancellation);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Runs `fetch` once and wraps its outcome. The future only starts when the
/// stream is polled past `Loading`, so dropping the stream early cancels it.
/// Dropping it later raises the cancellation handed to `fetch`, which stops a
/// cache write that is already queued on the connection.
fn fetch_stream<F, Fut>(message: &'static str, fetch: F) -> BoxStream<'static, Resource<()>>
where
    F: FnOnce(Cancellation) -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<usize>> + Send + 'static,
{
    let cancel = Cancellation::default();
    let guard = CancelOnDrop(cancel.clone());
    let fetch = fetch(cancel);
    stream::once(ready(Resource::Loading))
        .chain(stream::once(async move {
            let _guard = guard;
            match fetch.await {
                Ok(count) => {
                    debug!("Replaced cache with {} rows", count);
                    Resource::Success(())
                }
                Err(e) => {
                    warn!("{}: {:#}", message, e);
                    Resource::Error {
                        message: message.to_string(),
                        cause: Arc::new(e),
                    }
                }
            }
        }))
        .boxed()
}

async fn replace_questions(
    db: Database,
    response: Result<QuestionsResponse, RemoteError>,
    cancel: Cancellation,
) -> anyhow::Result<usize> {
    let entities = questions_to_entities(response?);
    let count = entities.len();
    tokio::task::spawn_blocking(move || db.replace_all_questions_unless_cancelled(&entities, &cancel))
        .await??;
    Ok(count)
}

#[derive(Clone)]
pub struct QuestionRepository {
    service: Arc<dyn QuestionService>,
    db: Database,
}

impl QuestionRepository {
    pub fn new(service: Arc<dyn QuestionService>, db: Database) -> Self {
        Self { service, db }
    }

    pub fn fetch_newest_questions(&self) -> BoxStream<'static, Resource<()>> {
        let service = Arc::clone(&self.service);
        let db = self.db.clone();
        fetch_stream(QUESTIONS_ERROR, move |cancel| async move {
            let response = service.get_newest_questions().await;
            replace_questions(db, response, cancel).await
        })
    }

    /// Same contract as `fetch_newest_questions`, the search results replace
    /// whatever list was cached before.
    pub fn search_questions(&self, query: &str) -> BoxStream<'static, Resource<()>> {
        let service = Arc::clone(&self.service);
        let db = self.db.clone();
        let query = query.to_string();
        fetch_stream(QUESTIONS_ERROR, move |cancel| async move {
            let response = service.search_questions(&query).await;
            replace_questions(db, response, cancel).await
        })
    }

    pub fn get_questions(&self) -> BoxStream<'static, Vec<Question>> {
        self.db
            .observe_questions()
            .map(|rows| rows.into_iter().map(Question::from).collect())
            .boxed()
    }

    pub fn get_question_by_id(&self, id: i64) -> BoxStream<'static, Option<Question>> {
        self.db
            .observe_question(id)
            .map(|row| row.map(Question::from))
            .boxed()
    }
}

#[derive(Clone)]
pub struct AnswerRepository {
    service: Arc<dyn AnswerService>,
    db: Database,
}

impl AnswerRepository {
    pub fn new(service: Arc<dyn AnswerService>, db: Database) -> Self {
        Self { service, db }
    }

    pub fn fetch_answers_for_question(&self, question_id: i64) -> BoxStream<'static, Resource<()>> {
        let service = Arc::clone(&self.service);
        let db = self.db.clone();
        fetch_stream(ANSWERS_ERROR, move |cancel| async move {
            let response = service.get_answers_for_question(question_id).await?;
            let entities: Vec<AnswerEntity> = answers_to_entities(response);
            let count = entities.len();
            tokio::task::spawn_blocking(move || {
                db.replace_answers_unless_cancelled(question_id, &entities, &cancel)
            })
            .await??;
            Ok(count)
        })
    }

    pub fn get_answers_by_question_id(&self, question_id: i64) -> BoxStream<'static, Vec<Answer>> {
        self.db
            .observe_answers(question_id)
            .map(|rows| rows.into_iter().map(Answer::from).collect())
            .boxed()
    }
}
