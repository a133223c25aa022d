// Display-ready data for the two screens. Everything here is already
// formatted, the screens only lay it out.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionItemUiData {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub owner: String,
    pub asked_date: String,
    pub answers: i32,
    pub votes: i32,
    pub views: i32,
    pub is_accepted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchUiData {
    pub input_query: String,
    pub submitted_query: String,
    pub questions: Vec<QuestionItemUiData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailUiData {
    pub id: i64,
    pub title: String,
    pub asked_date: String,
    pub modified_date: String,
    pub asked_exact: String,
    pub views: String,
    pub votes: i32,
    pub body: String,
    pub tags: Vec<String>,
    pub author_name: String,
    pub author_reputation: String,
    pub author_avatar_url: Option<String>,
    /// Canonical web address from the API, when it sent one.
    pub link: Option<String>,
    pub answers: Vec<AnswerUiData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerUiData {
    pub id: i64,
    pub is_accepted: bool,
    pub score: String,
    pub score_text: String,
    pub body: String,
    pub author_name: String,
    pub reputation: String,
    pub created: String,
    pub avatar_url: Option<String>,
}
