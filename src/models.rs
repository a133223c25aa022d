#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
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
pub struct Answer {
    pub id: i64,
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

/// User-selectable ordering of answers on the detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerSortOrder {
    #[default]
    Votes,
    Oldest,
    Active,
}

impl AnswerSortOrder {
    pub const ALL: [AnswerSortOrder; 3] = [Self::Votes, Self::Oldest, Self::Active];

    pub fn label(self) -> &'static str {
        match self {
            Self::Votes => "Votes",
            Self::Oldest => "Oldest",
            Self::Active => "Active",
        }
    }
}
