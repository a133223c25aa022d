use crate::db::{AnswerEntity, QuestionEntity};
use crate::formatting::{format_epoch, format_thousands, format_views, format_votes, time_ago};
use crate::html::{html_excerpt, unescape_html};
use crate::models::{Answer, Question};
use crate::stack_client::{AnswersResponse, QuestionsResponse};
use crate::ui_models::{AnswerUiData, DetailUiData, QuestionItemUiData};

const EXCERPT_MAX_CHARS: usize = 340;

// -- Remote to cache --

pub fn questions_to_entities(response: QuestionsResponse) -> Vec<QuestionEntity> {
    response
        .items
        .into_iter()
        .map(|question| QuestionEntity {
            question_id: question.question_id,
            title: unescape_html(&question.title),
            body: question.body,
            owner_display_name: question.owner.display_name.as_deref().map(unescape_html),
            owner_reputation: question.owner.reputation,
            owner_profile_image: question.owner.profile_image,
            tags: question.tags,
            answer_count: question.answer_count,
            score: question.score,
            view_count: question.view_count,
            creation_date_epoch_sec: question.creation_date,
            last_activity_epoch_sec: question.last_activity_date,
            last_edit_epoch_sec: question.last_edit_date,
            has_accepted_answer: question.is_answered,
            link: question.link,
        })
        .collect()
}

/// Answers without a question id can't be attached to anything and are
/// skipped; the rest keep their order.
pub fn answers_to_entities(response: AnswersResponse) -> Vec<AnswerEntity> {
    response
        .items
        .into_iter()
        .filter_map(|answer| {
            let question_id = answer.question_id?;
            Some(AnswerEntity {
                answer_id: answer.answer_id,
                question_id,
                is_accepted: answer.is_accepted,
                score: answer.score,
                body: answer.body,
                creation_date_epoch_sec: answer.creation_date,
                last_activity_epoch_sec: answer.last_activity_date,
                last_edit_epoch_sec: answer.last_edit_date,
                owner_display_name: answer.owner.display_name.as_deref().map(unescape_html),
                owner_profile_image: answer.owner.profile_image,
                owner_reputation: answer.owner.reputation,
            })
        })
        .collect()
}

// -- Cache to domain --

impl From<QuestionEntity> for Question {
    fn from(entity: QuestionEntity) -> Self {
        Self {
            id: entity.question_id,
            title: entity.title,
            body: entity.body,
            owner_display_name: entity.owner_display_name,
            owner_reputation: entity.owner_reputation,
            owner_profile_image: entity.owner_profile_image,
            tags: entity.tags,
            answer_count: entity.answer_count,
            score: entity.score,
            view_count: entity.view_count,
            creation_date_epoch_sec: entity.creation_date_epoch_sec,
            last_activity_epoch_sec: entity.last_activity_epoch_sec,
            last_edit_epoch_sec: entity.last_edit_epoch_sec,
            has_accepted_answer: entity.has_accepted_answer,
            link: entity.link,
        }
    }
}

impl From<Question> for QuestionEntity {
    fn from(question: Question) -> Self {
        Self {
            question_id: question.id,
            title: question.title,
            body: question.body,
            owner_display_name: question.owner_display_name,
            owner_reputation: question.owner_reputation,
            owner_profile_image: question.owner_profile_image,
            tags: question.tags,
            answer_count: question.answer_count,
            score: question.score,
            view_count: question.view_count,
            creation_date_epoch_sec: question.creation_date_epoch_sec,
            last_activity_epoch_sec: question.last_activity_epoch_sec,
            last_edit_epoch_sec: question.last_edit_epoch_sec,
            has_accepted_answer: question.has_accepted_answer,
            link: question.link,
        }
    }
}

impl From<AnswerEntity> for Answer {
    fn from(entity: AnswerEntity) -> Self {
        Self {
            id: entity.answer_id,
            question_id: entity.question_id,
            is_accepted: entity.is_accepted,
            score: entity.score,
            body: entity.body,
            creation_date_epoch_sec: entity.creation_date_epoch_sec,
            last_activity_epoch_sec: entity.last_activity_epoch_sec,
            last_edit_epoch_sec: entity.last_edit_epoch_sec,
            owner_display_name: entity.owner_display_name,
            owner_profile_image: entity.owner_profile_image,
            owner_reputation: entity.owner_reputation,
        }
    }
}

impl From<Answer> for AnswerEntity {
    fn from(answer: Answer) -> Self {
        Self {
            answer_id: answer.id,
            question_id: answer.question_id,
            is_accepted: answer.is_accepted,
            score: answer.score,
            body: answer.body,
            creation_date_epoch_sec: answer.creation_date_epoch_sec,
            last_activity_epoch_sec: answer.last_activity_epoch_sec,
            last_edit_epoch_sec: answer.last_edit_epoch_sec,
            owner_display_name: answer.owner_display_name,
            owner_profile_image: answer.owner_profile_image,
            owner_reputation: answer.owner_reputation,
        }
    }
}

// -- Domain to UI --

pub fn question_item_ui_data(question: &Question, date_pattern: &str) -> QuestionItemUiData {
    QuestionItemUiData {
        id: question.id,
        title: question.title.clone(),
        excerpt: html_excerpt(question.body.as_deref().unwrap_or_default(), EXCERPT_MAX_CHARS),
        owner: question.owner_display_name.clone().unwrap_or_default(),
        asked_date: format_epoch(question.creation_date_epoch_sec, date_pattern),
        answers: question.answer_count,
        votes: question.score,
        views: question.view_count,
        is_accepted: question.has_accepted_answer,
    }
}

pub fn detail_ui_data(question: &Question, answers: &[Answer], date_pattern: &str) -> DetailUiData {
    DetailUiData {
        id: question.id,
        title: question.title.clone(),
        asked_date: time_ago(question.creation_date_epoch_sec),
        modified_date: time_ago(
            question
                .last_edit_epoch_sec
                .unwrap_or(question.last_activity_epoch_sec),
        ),
        asked_exact: format_epoch(question.creation_date_epoch_sec, date_pattern),
        views: format_views(question.view_count),
        votes: question.score,
        body: question.body.clone().unwrap_or_default(),
        tags: question.tags.clone(),
        author_name: question.owner_display_name.clone().unwrap_or_default(),
        author_reputation: format_thousands(question.owner_reputation.unwrap_or(0) as i64),
        author_avatar_url: question.owner_profile_image.clone(),
        link: question.link.clone(),
        answers: answers
            .iter()
            .map(|answer| answer_ui_data(answer, date_pattern))
            .collect(),
    }
}

pub fn answer_ui_data(answer: &Answer, date_pattern: &str) -> AnswerUiData {
    AnswerUiData {
        id: answer.id,
        is_accepted: answer.is_accepted,
        score: answer.score.to_string(),
        score_text: format_votes(answer.score),
        body: answer.body.clone(),
        author_name: answer.owner_display_name.clone().unwrap_or_default(),
        reputation: format_thousands(answer.owner_reputation.unwrap_or(0) as i64),
        created: format_epoch(answer.creation_date_epoch_sec, date_pattern),
        avatar_url: answer.owner_profile_image.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatting::{DETAIL_DATE_PATTERN, SEARCH_DATE_PATTERN};
    use crate::stack_client::{AnswerDto, ItemsResponse, OwnerDto, QuestionDto};

    fn answer_dto(id: i64, question_id: Option<i64>) -> AnswerDto {
        AnswerDto {
            answer_id: id,
            question_id,
            is_accepted: false,
            score: 1,
            body: "<p>a</p>".to_string(),
            creation_date: 100,
            last_activity_date: Some(200),
            last_edit_date: None,
            owner: OwnerDto {
                display_name: Some("Fran&#231;ois".to_string()),
                profile_image: None,
                reputation: Some(5),
            },
        }
    }

    fn envelope<T>(items: Vec<T>) -> ItemsResponse<T> {
        ItemsResponse {
            items,
            has_more: false,
            quota_max: None,
            quota_remaining: None,
        }
    }

    fn full_question() -> Question {
        Question {
            id: 7,
            title: "Title".to_string(),
            body: Some("<p>Hello <code>x</code></p>".to_string()),
            owner_display_name: Some("Ann".to_string()),
            owner_reputation: Some(12345),
            owner_profile_image: Some("https://example.com/ann.png".to_string()),
            tags: vec!["rust".to_string(), "tokio".to_string()],
            answer_count: 3,
            score: 4,
            view_count: 1500,
            creation_date_epoch_sec: 1_700_000_000,
            last_activity_epoch_sec: 1_700_000_600,
            last_edit_epoch_sec: Some(1_700_000_300),
            has_accepted_answer: true,
            link: Some("https://math.stackexchange.com/questions/7/title".to_string()),
        }
    }

    #[test]
    fn answers_without_question_id_are_dropped_in_order() {
        let response = envelope(vec![
            answer_dto(1, Some(9)),
            answer_dto(2, None),
            answer_dto(3, Some(9)),
            answer_dto(4, None),
            answer_dto(5, Some(9)),
        ]);
        let entities = answers_to_entities(response);
        let ids: Vec<i64> = entities.iter().map(|a| a.answer_id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
        assert_eq!(entities[0].owner_display_name.as_deref(), Some("François"));
        assert_eq!(entities[0].last_activity_epoch_sec, Some(200));
    }

    #[test]
    fn question_titles_and_owners_are_unescaped() {
        let response = envelope(vec![QuestionDto {
            question_id: 1,
            title: "Why is &lt;T&gt; &quot;sized&quot;?".to_string(),
            body: Some("<p>&lt;kept&gt;</p>".to_string()),
            tags: vec!["generics".to_string()],
            answer_count: 0,
            score: 0,
            view_count: 0,
            creation_date: 1,
            last_activity_date: 2,
            last_edit_date: None,
            is_answered: true,
            owner: OwnerDto::default(),
            link: Some("https://superuser.com/questions/1/why".to_string()),
        }]);
        let entity = &questions_to_entities(response)[0];
        assert_eq!(entity.title, "Why is <T> \"sized\"?");
        assert_eq!(entity.body.as_deref(), Some("<p>&lt;kept&gt;</p>"));
        assert_eq!(entity.owner_display_name, None);
        assert!(entity.has_accepted_answer);
        assert_eq!(entity.link.as_deref(), Some("https://superuser.com/questions/1/why"));
    }

    #[test]
    fn question_round_trips_through_entity() {
        let question = full_question();
        let back: Question = QuestionEntity::from(question.clone()).into();
        assert_eq!(back, question);

        let sparse = Question {
            body: None,
            owner_display_name: None,
            owner_reputation: None,
            owner_profile_image: None,
            last_edit_epoch_sec: None,
            tags: Vec::new(),
            link: None,
            ..full_question()
        };
        let back: Question = QuestionEntity::from(sparse.clone()).into();
        assert_eq!(back, sparse);
    }

    #[test]
    fn answer_round_trips_through_entity() {
        let answer = Answer {
            id: 1,
            question_id: 2,
            is_accepted: true,
            score: -3,
            body: "b".to_string(),
            creation_date_epoch_sec: 10,
            last_activity_epoch_sec: None,
            last_edit_epoch_sec: Some(11),
            owner_display_name: None,
            owner_profile_image: Some("img".to_string()),
            owner_reputation: None,
        };
        let back: Answer = AnswerEntity::from(answer.clone()).into();
        assert_eq!(back, answer);
    }

    #[test]
    fn list_item_uses_excerpt_and_defaults() {
        let mut question = full_question();
        question.owner_display_name = None;
        let item = question_item_ui_data(&question, SEARCH_DATE_PATTERN);
        assert_eq!(item.excerpt, "Hello x");
        assert_eq!(item.owner, "");
        assert!(item.is_accepted);
        assert_eq!(item.views, 1500);
        assert!(!item.asked_date.is_empty());

        question.body = None;
        assert_eq!(question_item_ui_data(&question, SEARCH_DATE_PATTERN).excerpt, "");
    }

    #[test]
    fn detail_maps_answers_and_counts() {
        let answer = Answer {
            id: 3,
            question_id: 7,
            is_accepted: false,
            score: 1,
            body: "<p>yes</p>".to_string(),
            creation_date_epoch_sec: 1_700_000_100,
            last_activity_epoch_sec: None,
            last_edit_epoch_sec: None,
            owner_display_name: None,
            owner_profile_image: None,
            owner_reputation: None,
        };
        let detail = detail_ui_data(&full_question(), &[answer], DETAIL_DATE_PATTERN);
        assert_eq!(detail.views, "1.5k views");
        assert_eq!(detail.author_reputation, "12,345");
        assert_eq!(detail.tags, vec!["rust", "tokio"]);
        assert_eq!(detail.answers.len(), 1);
        assert_eq!(detail.answers[0].score_text, "1 vote");
        assert_eq!(detail.answers[0].reputation, "0");
        assert_eq!(detail.answers[0].author_name, "");
    }

    #[test]
    fn detail_keeps_the_question_link() {
        let detail = detail_ui_data(&full_question(), &[], DETAIL_DATE_PATTERN);
        assert_eq!(
            detail.link.as_deref(),
            Some("https://math.stackexchange.com/questions/7/title")
        );

        let unlinked = Question {
            link: None,
            ..full_question()
        };
        assert_eq!(detail_ui_data(&unlinked, &[], DETAIL_DATE_PATTERN).link, None);
    }
}
