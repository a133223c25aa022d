use anyhow::{anyhow, Result};
use futures::stream::{self, BoxStream, StreamExt};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Cached question row. Tags are kept as a JSON array column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionEntity {
    pub question_id: i64,
    pub title: String,
    pub body: Option<String>,
    pub owner_display_name: Option<String>,
    pub owner_reputation: Option<i32>,
    pub owner_profile_image: Option<String>,
    pub tags: Vec<String>,
    pub answer_count: i32,
    pub score: i32,
    pub view_count: i32,
    pub creation_date_epoch_sec: i64,
    pub last_activity_epoch_sec: i64,
    pub last_edit_epoch_sec: Option<i64>,
    pub has_accepted_answer: bool,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEntity {
    pub answer_id: i64,
    pub question_id: i64,
    pub is_accepted: bool,
    pub score: i32,
    pub body: String,
    pub creation_date_epoch_sec: i64,
    pub last_activity_epoch_sec: Option<i64>,
    pub last_edit_epoch_sec: Option<i64>,
    pub owner_display_name: Option<String>,
    pub owner_profile_image: Option<String>,
    pub owner_reputation: Option<i32>,
}

/// Raised when the fetch that owns a pending write goes away. Replaces check
/// it under the connection lock, so a stale write never lands after a newer one.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Change counter for one table. Every committed write bumps it once, and
/// each live query re-runs when it sees a new value.
struct TableNotifier {
    version: watch::Sender<u64>,
}

impl TableNotifier {
    fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self { version }
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS question (
        question_id             INTEGER PRIMARY KEY NOT NULL,
        title                   TEXT NOT NULL,
        body                    TEXT,
        owner_display_name      TEXT,
        owner_reputation        INTEGER,
        owner_profile_image     TEXT,
        tags                    TEXT NOT NULL DEFAULT '[]',
        answer_count            INTEGER NOT NULL,
        score                   INTEGER NOT NULL,
        view_count              INTEGER NOT NULL,
        creation_date_epoch_sec INTEGER NOT NULL,
        last_activity_epoch_sec INTEGER NOT NULL,
        last_edit_epoch_sec     INTEGER,
        has_accepted_answer     INTEGER NOT NULL DEFAULT 0,
        link                    TEXT
    );

    CREATE TABLE IF NOT EXISTS answer (
        answer_id               INTEGER PRIMARY KEY NOT NULL,
        question_id             INTEGER NOT NULL,
        is_accepted             INTEGER NOT NULL,
        score                   INTEGER NOT NULL,
        body                    TEXT NOT NULL,
        creation_date_epoch_sec INTEGER NOT NULL,
        last_activity_epoch_sec INTEGER,
        last_edit_epoch_sec     INTEGER,
        owner_display_name      TEXT,
        owner_profile_image     TEXT,
        owner_reputation        INTEGER
    );

    CREATE INDEX IF NOT EXISTS index_answer_question_id
        ON answer(question_id);
";

const QUESTION_COLUMNS: &str = "question_id, title, body, owner_display_name, owner_reputation, \
     owner_profile_image, tags, answer_count, score, view_count, creation_date_epoch_sec, \
     last_activity_epoch_sec, last_edit_epoch_sec, has_accepted_answer, link";

const ANSWER_COLUMNS: &str = "answer_id, question_id, is_accepted, score, body, \
     creation_date_epoch_sec, last_activity_epoch_sec, last_edit_epoch_sec, \
     owner_display_name, owner_profile_image, owner_reputation";

/// Local question/answer cache. Cheap to clone; all clones share one
/// connection and one set of change notifiers.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    questions_changed: Arc<TableNotifier>,
    answers_changed: Arc<TableNotifier>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        // WAL keeps readers from blocking on the replace transactions
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        let db = Self::from_connection(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;

        // Caches written before links were stored lack the column
        let has_link = conn.query_row(
            "SELECT COUNT(*) FROM pragma_table_info('question') WHERE name = 'link'",
            [],
            |row| row.get::<_, i32>(0),
        )?;
        if has_link == 0 {
            conn.execute("ALTER TABLE question ADD COLUMN link TEXT", [])?;
            info!("Added link column to question table");
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            questions_changed: Arc::new(TableNotifier::new()),
            answers_changed: Arc::new(TableNotifier::new()),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Failed to lock database connection"))
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    // -- Questions --

    #[cfg(test)]
    pub fn replace_all_questions(&self, items: &[QuestionEntity]) -> Result<()> {
        self.replace_all_questions_unless_cancelled(items, &Cancellation::default())
            .map(|_| ())
    }

    /// Swaps the whole question table for `items` in one transaction. A
    /// duplicate id aborts the swap and the previous rows stay in place.
    /// Returns `false` without writing if `cancel` was raised first.
    pub fn replace_all_questions_unless_cancelled(
        &self,
        items: &[QuestionEntity],
        cancel: &Cancellation,
    ) -> Result<bool> {
        {
            let mut conn = self.lock()?;
            if cancel.is_cancelled() {
                debug!("Skipped stale question replace");
                return Ok(false);
            }
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM question", [])?;
            insert_questions(&tx, items)?;
            tx.commit()?;
        }
        debug!("Replaced question cache with {} rows", items.len());
        self.questions_changed.notify();
        Ok(true)
    }

    pub fn get_all_questions(&self) -> Result<Vec<QuestionEntity>> {
        self.with_conn(query_all_questions)
    }

    #[cfg(test)]
    pub fn get_question_by_id(&self, id: i64) -> Result<Option<QuestionEntity>> {
        self.with_conn(|conn| query_question_by_id(conn, id))
    }

    /// All cached questions, most recently active first. Yields the current
    /// rows immediately and again after every write to the table.
    pub fn observe_questions(&self) -> BoxStream<'static, Vec<QuestionEntity>> {
        self.observe(&self.questions_changed, query_all_questions)
    }

    pub fn observe_question(&self, id: i64) -> BoxStream<'static, Option<QuestionEntity>> {
        self.observe(&self.questions_changed, move |conn| query_question_by_id(conn, id))
    }

    // -- Answers --

    #[cfg(test)]
    pub fn replace_answers_for_question(&self, question_id: i64, items: &[AnswerEntity]) -> Result<()> {
        self.replace_answers_unless_cancelled(question_id, items, &Cancellation::default())
            .map(|_| ())
    }

    /// Swaps the cached answers of one question, leaving other questions'
    /// answers untouched.
    pub fn replace_answers_unless_cancelled(
        &self,
        question_id: i64,
        items: &[AnswerEntity],
        cancel: &Cancellation,
    ) -> Result<bool> {
        {
            let mut conn = self.lock()?;
            if cancel.is_cancelled() {
                debug!("Skipped stale answer replace for question {}", question_id);
                return Ok(false);
            }
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM answer WHERE question_id = ?1", params![question_id])?;
            if !items.is_empty() {
                insert_answers(&tx, items)?;
            }
            tx.commit()?;
        }
        debug!("Replaced {} cached answers for question {}", items.len(), question_id);
        self.answers_changed.notify();
        Ok(true)
    }

    #[cfg(test)]
    pub fn get_answers_by_question_id(&self, question_id: i64) -> Result<Vec<AnswerEntity>> {
        self.with_conn(|conn| query_answers_by_question_id(conn, question_id))
    }

    pub fn observe_answers(&self, question_id: i64) -> BoxStream<'static, Vec<AnswerEntity>> {
        self.observe(&self.answers_changed, move |conn| {
            query_answers_by_question_id(conn, question_id)
        })
    }

    fn observe<T, F>(&self, notifier: &TableNotifier, query: F) -> BoxStream<'static, T>
    where
        T: Send + 'static,
        F: Fn(&Connection) -> Result<T> + Send + Sync + 'static,
    {
        let receiver = notifier.subscribe();
        let state = (self.clone(), receiver, Arc::new(query), true);

        stream::unfold(state, |(db, mut receiver, query, first)| async move {
            if !first && receiver.changed().await.is_err() {
                return None;
            }
            loop {
                let _ = receiver.borrow_and_update();
                let reader = db.clone();
                let run = query.clone();
                match tokio::task::spawn_blocking(move || reader.with_conn(|conn| run(conn))).await {
                    Ok(Ok(value)) => return Some((value, (db, receiver, query, false))),
                    Ok(Err(e)) => warn!("Cache query failed: {:#}", e),
                    Err(e) => warn!("Cache query task failed: {}", e),
                }
                // Try again on the next write
                if receiver.changed().await.is_err() {
                    return None;
                }
            }
        })
        .boxed()
    }
}

fn insert_questions(conn: &Connection, items: &[QuestionEntity]) -> Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO question ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        QUESTION_COLUMNS
    ))?;
    for item in items {
        stmt.execute(params![
            item.question_id,
            item.title,
            item.body,
            item.owner_display_name,
            item.owner_reputation,
            item.owner_profile_image,
            serde_json::to_string(&item.tags)?,
            item.answer_count,
            item.score,
            item.view_count,
            item.creation_date_epoch_sec,
            item.last_activity_epoch_sec,
            item.last_edit_epoch_sec,
            item.has_accepted_answer,
            item.link,
        ])?;
    }
    Ok(())
}

fn insert_answers(conn: &Connection, items: &[AnswerEntity]) -> Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT OR REPLACE INTO answer ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        ANSWER_COLUMNS
    ))?;
    for item in items {
        stmt.execute(params![
            item.answer_id,
            item.question_id,
            item.is_accepted,
            item.score,
            item.body,
            item.creation_date_epoch_sec,
            item.last_activity_epoch_sec,
            item.last_edit_epoch_sec,
            item.owner_display_name,
            item.owner_profile_image,
            item.owner_reputation,
        ])?;
    }
    Ok(())
}

fn query_all_questions(conn: &Connection) -> Result<Vec<QuestionEntity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM question ORDER BY last_activity_epoch_sec DESC",
        QUESTION_COLUMNS
    ))?;
    let rows = stmt.query_map([], question_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn query_question_by_id(conn: &Connection, id: i64) -> Result<Option<QuestionEntity>> {
    let question = conn
        .query_row(
            &format!("SELECT {} FROM question WHERE question_id = ?1 LIMIT 1", QUESTION_COLUMNS),
            params![id],
            question_from_row,
        )
        .optional()?;
    Ok(question)
}

fn query_answers_by_question_id(conn: &Connection, question_id: i64) -> Result<Vec<AnswerEntity>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM answer WHERE question_id = ?1 \
         ORDER BY is_accepted DESC, score DESC, creation_date_epoch_sec ASC",
        ANSWER_COLUMNS
    ))?;
    let rows = stmt.query_map(params![question_id], answer_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<QuestionEntity> {
    let tags_json: String = row.get(6)?;
    Ok(QuestionEntity {
        question_id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        owner_display_name: row.get(3)?,
        owner_reputation: row.get(4)?,
        owner_profile_image: row.get(5)?,
        // Unreadable tag lists degrade to no tags
        tags: serde_json::from_str(&tags_json).unwrap_or_default(),
        answer_count: row.get(7)?,
        score: row.get(8)?,
        view_count: row.get(9)?,
        creation_date_epoch_sec: row.get(10)?,
        last_activity_epoch_sec: row.get(11)?,
        last_edit_epoch_sec: row.get(12)?,
        has_accepted_answer: row.get(13)?,
        link: row.get(14)?,
    })
}

fn answer_from_row(row: &Row<'_>) -> rusqlite::Result<AnswerEntity> {
    Ok(AnswerEntity {
        answer_id: row.get(0)?,
        question_id: row.get(1)?,
        is_accepted: row.get(2)?,
        score: row.get(3)?,
        body: row.get(4)?,
        creation_date_epoch_sec: row.get(5)?,
        last_activity_epoch_sec: row.get(6)?,
        last_edit_epoch_sec: row.get(7)?,
        owner_display_name: row.get(8)?,
        owner_profile_image: row.get(9)?,
        owner_reputation: row.get(10)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    pub(crate) fn question(id: i64, last_activity: i64) -> QuestionEntity {
        QuestionEntity {
            question_id: id,
            title: format!("Question {}", id),
            body: Some("<p>body</p>".to_string()),
            owner_display_name: Some("owner".to_string()),
            owner_reputation: Some(10),
            owner_profile_image: None,
            tags: vec!["rust".to_string()],
            answer_count: 1,
            score: 2,
            view_count: 3,
            creation_date_epoch_sec: last_activity - 100,
            last_activity_epoch_sec: last_activity,
            last_edit_epoch_sec: None,
            has_accepted_answer: false,
            link: Some(format!("https://stackoverflow.com/q/{}", id)),
        }
    }

    pub(crate) fn answer(id: i64, question_id: i64, accepted: bool, score: i32, created: i64) -> AnswerEntity {
        AnswerEntity {
            answer_id: id,
            question_id,
            is_accepted: accepted,
            score,
            body: format!("<p>answer {}</p>", id),
            creation_date_epoch_sec: created,
            last_activity_epoch_sec: None,
            last_edit_epoch_sec: None,
            owner_display_name: None,
            owner_profile_image: None,
            owner_reputation: None,
        }
    }

    #[test]
    fn questions_round_trip_and_order_by_activity() {
        let db = Database::open_in_memory().unwrap();
        let mut edited = question(2, 500);
        edited.last_edit_epoch_sec = Some(450);
        edited.tags = vec!["a".to_string(), "b,c".to_string()];
        edited.owner_display_name = None;
        edited.link = None;
        db.replace_all_questions(&[question(1, 100), edited.clone(), question(3, 300)]).unwrap();

        let all = db.get_all_questions().unwrap();
        let ids: Vec<i64> = all.iter().map(|q| q.question_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(all[0], edited);
        assert_eq!(db.get_question_by_id(3).unwrap(), Some(question(3, 300)));
        assert_eq!(db.get_question_by_id(99).unwrap(), None);
    }

    #[test]
    fn replace_drops_previous_generation() {
        let db = Database::open_in_memory().unwrap();
        db.replace_all_questions(&[question(1, 100), question(2, 200)]).unwrap();
        db.replace_all_questions(&[question(3, 300)]).unwrap();
        let ids: Vec<i64> = db.get_all_questions().unwrap().iter().map(|q| q.question_id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn duplicate_question_aborts_and_keeps_old_rows() {
        let db = Database::open_in_memory().unwrap();
        db.replace_all_questions(&[question(1, 100)]).unwrap();
        assert!(db.replace_all_questions(&[question(2, 200), question(2, 200)]).is_err());
        let ids: Vec<i64> = db.get_all_questions().unwrap().iter().map(|q| q.question_id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn bad_tags_column_reads_as_empty() {
        let db = Database::open_in_memory().unwrap();
        db.replace_all_questions(&[question(1, 100)]).unwrap();
        db.with_conn(|conn| {
            conn.execute("UPDATE question SET tags = 'not json'", [])?;
            Ok(())
        })
        .unwrap();
        assert!(db.get_question_by_id(1).unwrap().unwrap().tags.is_empty());
    }

    #[test]
    fn answers_are_scoped_by_question_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        db.replace_answers_for_question(1, &[
            answer(10, 1, false, 5, 300),
            answer(11, 1, true, 1, 400),
            answer(12, 1, false, 5, 100),
            answer(13, 1, false, 9, 500),
        ])
        .unwrap();
        db.replace_answers_for_question(2, &[answer(20, 2, false, 0, 100)]).unwrap();

        let ids: Vec<i64> = db.get_answers_by_question_id(1).unwrap().iter().map(|a| a.answer_id).collect();
        assert_eq!(ids, vec![11, 13, 12, 10]);

        db.replace_answers_for_question(1, &[answer(14, 1, false, 0, 100)]).unwrap();
        let ids: Vec<i64> = db.get_answers_by_question_id(1).unwrap().iter().map(|a| a.answer_id).collect();
        assert_eq!(ids, vec![14]);
        assert_eq!(db.get_answers_by_question_id(2).unwrap().len(), 1);

        db.replace_answers_for_question(1, &[]).unwrap();
        assert!(db.get_answers_by_question_id(1).unwrap().is_empty());
    }

    #[test]
    fn old_cache_gains_link_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE question (
                question_id INTEGER PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                body TEXT,
                owner_display_name TEXT,
                owner_reputation INTEGER,
                owner_profile_image TEXT,
                tags TEXT NOT NULL DEFAULT '[]',
                answer_count INTEGER NOT NULL,
                score INTEGER NOT NULL,
                view_count INTEGER NOT NULL,
                creation_date_epoch_sec INTEGER NOT NULL,
                last_activity_epoch_sec INTEGER NOT NULL,
                last_edit_epoch_sec INTEGER,
                has_accepted_answer INTEGER NOT NULL DEFAULT 0
            );
            INSERT INTO question (question_id, title, answer_count, score, view_count,
                creation_date_epoch_sec, last_activity_epoch_sec)
            VALUES (1, 'old', 0, 0, 0, 10, 20);",
        )
        .unwrap();

        let db = Database::from_connection(conn).unwrap();
        assert_eq!(db.get_question_by_id(1).unwrap().unwrap().link, None);

        db.replace_all_questions(&[question(2, 200)]).unwrap();
        assert_eq!(
            db.get_question_by_id(2).unwrap().unwrap().link.as_deref(),
            Some("https://stackoverflow.com/q/2")
        );
    }

    #[test]
    fn cancelled_replace_leaves_rows_alone() {
        let db = Database::open_in_memory().unwrap();
        db.replace_all_questions(&[question(1, 100)]).unwrap();
        db.replace_answers_for_question(1, &[answer(10, 1, false, 1, 5)]).unwrap();

        let cancel = Cancellation::default();
        cancel.cancel();
        assert!(!db.replace_all_questions_unless_cancelled(&[question(2, 200)], &cancel).unwrap());
        assert!(!db.replace_answers_unless_cancelled(1, &[], &cancel).unwrap());

        let ids: Vec<i64> = db.get_all_questions().unwrap().iter().map(|q| q.question_id).collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(db.get_answers_by_question_id(1).unwrap().len(), 1);
    }

    #[test]
    fn answer_conflicts_replace() {
        let db = Database::open_in_memory().unwrap();
        let mut updated = answer(10, 1, false, 1, 100);
        updated.score = 50;
        db.replace_answers_for_question(1, &[answer(10, 1, false, 1, 100), updated.clone()]).unwrap();
        assert_eq!(db.get_answers_by_question_id(1).unwrap(), vec![updated]);
    }

    #[test]
    fn readers_never_see_an_empty_table_mid_replace() {
        let db = Database::open_in_memory().unwrap();
        let small: Vec<QuestionEntity> = (1..=3).map(|i| question(i, i * 10)).collect();
        let large: Vec<QuestionEntity> = (10..=15).map(|i| question(i, i * 10)).collect();
        db.replace_all_questions(&small).unwrap();
        db.replace_answers_for_question(7, &[answer(1, 7, false, 0, 1)]).unwrap();

        let done = Arc::new(AtomicBool::new(false));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let db = db.clone();
                let done = done.clone();
                std::thread::spawn(move || {
                    let mut reads = 0;
                    while !done.load(Ordering::Relaxed) || reads < 50 {
                        let count = db.get_all_questions().unwrap().len();
                        assert!(count == 3 || count == 6, "observed {} questions", count);
                        assert_eq!(db.get_answers_by_question_id(7).unwrap().len(), 1);
                        reads += 1;
                    }
                })
            })
            .collect();

        for round in 0..200 {
            let items = if round % 2 == 0 { &large } else { &small };
            db.replace_all_questions(items).unwrap();
            let answer_id = round as i64 + 2;
            db.replace_answers_for_question(7, &[answer(answer_id, 7, false, 0, 1)]).unwrap();
        }
        done.store(true, Ordering::Relaxed);

        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[tokio::test]
    async fn observe_emits_current_rows_then_each_write() {
        let db = Database::open_in_memory().unwrap();
        db.replace_all_questions(&[question(1, 100)]).unwrap();

        let mut stream = db.observe_questions();
        assert_eq!(stream.next().await.unwrap().len(), 1);

        db.replace_all_questions(&[question(2, 200), question(3, 300)]).unwrap();
        let next = stream.next().await.unwrap();
        assert_eq!(next.iter().map(|q| q.question_id).collect::<Vec<_>>(), vec![3, 2]);

        // One write, one emission
        let extra = tokio::time::timeout(Duration::from_millis(100), stream.next()).await;
        assert!(extra.is_err());
    }

    #[tokio::test]
    async fn observe_question_tracks_single_row() {
        let db = Database::open_in_memory().unwrap();
        let mut stream = db.observe_question(5);
        assert_eq!(stream.next().await.unwrap(), None);

        db.replace_all_questions(&[question(5, 100)]).unwrap();
        assert_eq!(stream.next().await.unwrap().map(|q| q.question_id), Some(5));
    }

    #[tokio::test]
    async fn answer_writes_do_not_wake_question_readers() {
        let db = Database::open_in_memory().unwrap();
        let mut questions = db.observe_questions();
        let mut answers = db.observe_answers(1);
        assert!(questions.next().await.unwrap().is_empty());
        assert!(answers.next().await.unwrap().is_empty());

        db.replace_answers_for_question(1, &[answer(1, 1, true, 3, 10)]).unwrap();
        assert_eq!(answers.next().await.unwrap().len(), 1);
        let woke = tokio::time::timeout(Duration::from_millis(100), questions.next()).await;
        assert!(woke.is_err());
    }
}
