use eframe::egui;
use egui::{CornerRadius, RichText, ScrollArea, Stroke, Ui};

use crate::avatars::AvatarCache;
use crate::formatting::{format_views, format_votes};
use crate::html::{html_blocks, HtmlBlock};
use crate::models::AnswerSortOrder;
use crate::theme::AppTheme;
use crate::ui_models::{AnswerUiData, DetailUiData, QuestionItemUiData, SearchUiData};
use crate::view_state::{DetailUiState, SearchUiState};

/// What the user asked for on the search screen this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchAction {
    QueryChanged(String),
    Submit(String),
    Retry,
    DismissError,
    OpenQuestion(i64),
    OpenSiteSearch(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailAction {
    Back,
    Retry,
    DismissError,
    SetSortOrder(AnswerSortOrder),
    OpenInBrowser,
    CopyLink,
}

fn pointer_on_hover(ui: &Ui, response: &egui::Response) {
    if response.hovered() {
        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
    }
}

fn round_button(ui: &mut Ui, theme: &AppTheme, icon: &str, tooltip: &str) -> bool {
    let response = ui
        .add(
            egui::Button::new(RichText::new(icon).color(theme.button_foreground).size(20.0))
                .min_size(egui::Vec2::new(32.0, 32.0))
                .corner_radius(CornerRadius::same(16))
                .fill(theme.button_background),
        )
        .on_hover_text(tooltip);
    pointer_on_hover(ui, &response);
    response.clicked()
}

fn text_button(ui: &mut Ui, theme: &AppTheme, label: &str) -> bool {
    let response = ui.add(
        egui::Button::new(RichText::new(label).color(theme.button_foreground))
            .min_size(egui::Vec2::new(0.0, 28.0))
            .corner_radius(CornerRadius::same(6))
            .fill(theme.button_background),
    );
    pointer_on_hover(ui, &response);
    response.clicked()
}

fn centered_message(ui: &mut Ui, theme: &AppTheme, message: &str, with_retry: bool) -> bool {
    let mut retry = false;
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.label(RichText::new(message).color(theme.secondary_text).size(18.0));
        if with_retry {
            ui.add_space(12.0);
            retry = text_button(ui, theme, "Retry");
        }
    });
    retry
}

fn loading(ui: &mut Ui) {
    ui.vertical_centered(|ui| {
        ui.add_space(80.0);
        ui.add(egui::Spinner::new().size(32.0));
    });
}

fn refreshing_hint(ui: &mut Ui, theme: &AppTheme) {
    ui.horizontal(|ui| {
        ui.add_space(8.0);
        ui.spinner();
        ui.label(RichText::new("Refreshing…").color(theme.secondary_text));
    });
}

/// Inline banner for a refresh failure over content that is still shown.
fn error_banner(ui: &mut Ui, theme: &AppTheme, message: &str) -> (bool, bool) {
    let mut retry = false;
    let mut dismiss = false;
    egui::Frame::new()
        .fill(theme.card_background)
        .corner_radius(CornerRadius::same(6))
        .stroke(Stroke::new(1.0, theme.error))
        .inner_margin(8.0)
        .outer_margin(egui::vec2(8.0, 4.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(message).color(theme.error));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    dismiss = text_button(ui, theme, "Dismiss");
                    retry = text_button(ui, theme, "Retry");
                });
            });
        });
    (retry, dismiss)
}

// -- Search --

const SEARCH_INPUT_ID: &str = "search_query";

pub fn search_screen(
    ui: &mut Ui,
    theme: &AppTheme,
    state: &SearchUiState,
    refresh_error: Option<&str>,
    input: &mut String,
) -> Vec<SearchAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        let field = ui.add(
            egui::TextEdit::singleline(input)
                .id(egui::Id::new(SEARCH_INPUT_ID))
                .hint_text("Search questions by title")
                .desired_width((ui.available_width() - 200.0).max(120.0)),
        );
        if field.changed() {
            actions.push(SearchAction::QueryChanged(input.clone()));
        }
        let submitted = field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let clicked = text_button(ui, theme, "Search");
        if submitted || clicked {
            actions.push(SearchAction::Submit(input.clone()));
        }
        if round_button(ui, theme, "↻", "Refresh") {
            actions.push(SearchAction::Retry);
        }
        if round_button(ui, theme, "🌐", "Open this search on the site") {
            actions.push(SearchAction::OpenSiteSearch(input.trim().to_string()));
        }
    });
    ui.add_space(6.0);

    match state {
        SearchUiState::Loading => loading(ui),
        SearchUiState::Error(message) => {
            if centered_message(ui, theme, message, true) {
                actions.push(SearchAction::Retry);
            }
        }
        SearchUiState::Data { data, is_refreshing } => {
            if let Some(message) = refresh_error {
                let (retry, dismiss) = error_banner(ui, theme, message);
                if retry {
                    actions.push(SearchAction::Retry);
                }
                if dismiss {
                    actions.push(SearchAction::DismissError);
                }
            }
            if *is_refreshing {
                refreshing_hint(ui, theme);
            }
            question_list(ui, theme, data, &mut actions);
        }
    }

    actions
}

fn question_list(ui: &mut Ui, theme: &AppTheme, data: &SearchUiData, actions: &mut Vec<SearchAction>) {
    if data.questions.is_empty() {
        let message = if data.submitted_query.is_empty() {
            "No questions yet".to_string()
        } else {
            format!("No results found for '{}'", data.submitted_query)
        };
        centered_message(ui, theme, &message, false);
        return;
    }

    let pending = data.input_query.trim();
    if !pending.is_empty() && pending != data.submitted_query {
        ui.horizontal(|ui| {
            ui.add_space(8.0);
            ui.label(
                RichText::new("Press Enter to search")
                    .color(theme.secondary_text)
                    .italics(),
            );
        });
    }

    ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
        for question in &data.questions {
            if question_card(ui, theme, question) {
                actions.push(SearchAction::OpenQuestion(question.id));
            }
        }
    });
}

fn question_card(ui: &mut Ui, theme: &AppTheme, question: &QuestionItemUiData) -> bool {
    let mut clicked = false;
    egui::Frame::new()
        .fill(theme.card_background)
        .corner_radius(CornerRadius::same(8))
        .stroke(theme.card_stroke(question.is_accepted))
        .inner_margin(12.0)
        .outer_margin(egui::vec2(8.0, 6.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(70.0);
                    ui.label(
                        RichText::new(format_votes(question.votes))
                            .color(theme.score_color(question.votes))
                            .strong(),
                    );
                    let answers = RichText::new(if question.answers == 1 {
                        "1 answer".to_string()
                    } else {
                        format!("{} answers", question.answers)
                    });
                    ui.label(if question.is_accepted {
                        answers.color(theme.accepted).strong()
                    } else {
                        answers.color(theme.secondary_text)
                    });
                    ui.label(RichText::new(format_views(question.views)).color(theme.secondary_text));
                });

                ui.vertical(|ui| {
                    let title = ui.add(
                        egui::Label::new(RichText::new(&question.title).color(theme.text).size(16.0).strong())
                            .sense(egui::Sense::click()),
                    );
                    pointer_on_hover(ui, &title);
                    clicked = title.clicked();

                    if !question.excerpt.is_empty() {
                        ui.label(RichText::new(&question.excerpt).color(theme.secondary_text));
                    }
                    ui.horizontal(|ui| {
                        if !question.owner.is_empty() {
                            ui.label(RichText::new(&question.owner).color(theme.accent).size(13.0));
                        }
                        ui.label(
                            RichText::new(format!("asked {}", question.asked_date))
                                .color(theme.secondary_text)
                                .size(13.0),
                        );
                    });
                });
            });
        });
    clicked
}

// -- Detail --

pub fn detail_screen(
    ui: &mut Ui,
    theme: &AppTheme,
    avatars: &mut AvatarCache,
    state: &DetailUiState,
    refresh_error: Option<&str>,
    sort_order: AnswerSortOrder,
) -> Vec<DetailAction> {
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        if round_button(ui, theme, "←", "Back") {
            actions.push(DetailAction::Back);
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if round_button(ui, theme, "📋", "Copy link") {
                actions.push(DetailAction::CopyLink);
            }
            if round_button(ui, theme, "🌐", "Open in browser") {
                actions.push(DetailAction::OpenInBrowser);
            }
            if round_button(ui, theme, "↻", "Refresh answers") {
                actions.push(DetailAction::Retry);
            }
        });
    });
    ui.add_space(6.0);

    match state {
        DetailUiState::Loading => loading(ui),
        DetailUiState::Error(message) => {
            if centered_message(ui, theme, message, true) {
                actions.push(DetailAction::Retry);
            }
        }
        DetailUiState::Data { data, is_refreshing } => {
            if let Some(message) = refresh_error {
                let (retry, dismiss) = error_banner(ui, theme, message);
                if retry {
                    actions.push(DetailAction::Retry);
                }
                if dismiss {
                    actions.push(DetailAction::DismissError);
                }
            }
            if *is_refreshing {
                refreshing_hint(ui, theme);
            }
            ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
                ui.push_id(data.id, |ui| question_header(ui, theme, avatars, data));
                ui.add_space(8.0);
                if let Some(order) = answers_header(ui, theme, data.answers.len(), sort_order) {
                    actions.push(DetailAction::SetSortOrder(order));
                }
                for answer in &data.answers {
                    ui.push_id(answer.id, |ui| answer_card(ui, theme, avatars, answer));
                }
            });
        }
    }

    actions
}

fn question_header(ui: &mut Ui, theme: &AppTheme, avatars: &mut AvatarCache, data: &DetailUiData) {
    egui::Frame::new()
        .fill(theme.card_background)
        .corner_radius(CornerRadius::same(8))
        .stroke(Stroke::new(1.0, theme.separator))
        .inner_margin(12.0)
        .outer_margin(egui::vec2(8.0, 6.0))
        .show(ui, |ui| {
            ui.label(RichText::new(&data.title).color(theme.text).size(20.0).strong());
            ui.horizontal_wrapped(|ui| {
                let meta = [
                    format!("Asked {}", data.asked_date),
                    format!("Modified {}", data.modified_date),
                    data.views.clone(),
                ];
                for item in meta {
                    ui.label(RichText::new(item).color(theme.secondary_text).size(13.0));
                    ui.add_space(8.0);
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(data.votes.to_string())
                        .color(theme.score_color(data.votes))
                        .size(20.0)
                        .strong(),
                );
                ui.add_space(8.0);
                ui.vertical(|ui| html_body(ui, theme, &data.body));
            });

            if !data.tags.is_empty() {
                ui.add_space(6.0);
                ui.horizontal_wrapped(|ui| {
                    for tag in &data.tags {
                        tag_chip(ui, theme, tag);
                    }
                });
            }

            ui.add_space(6.0);
            author_row(
                ui,
                theme,
                avatars,
                &format!("asked {}", data.asked_exact),
                &data.author_name,
                &data.author_reputation,
                data.author_avatar_url.as_deref(),
            );
        });
}

/// Section title plus the sort selector. Returns a newly picked order.
fn answers_header(ui: &mut Ui, theme: &AppTheme, count: usize, current: AnswerSortOrder) -> Option<AnswerSortOrder> {
    let mut picked = None;
    ui.horizontal(|ui| {
        ui.add_space(8.0);
        let title = if count == 1 {
            "1 Answer".to_string()
        } else {
            format!("{} Answers", count)
        };
        ui.label(RichText::new(title).color(theme.text).size(18.0).strong());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            // right_to_left lays out in reverse
            for order in AnswerSortOrder::ALL.iter().rev() {
                let response = ui.selectable_label(*order == current, order.label());
                pointer_on_hover(ui, &response);
                if response.clicked() && *order != current {
                    picked = Some(*order);
                }
            }
            ui.label(RichText::new("Sorted by:").color(theme.secondary_text));
        });
    });
    picked
}

fn answer_card(ui: &mut Ui, theme: &AppTheme, avatars: &mut AvatarCache, answer: &AnswerUiData) {
    egui::Frame::new()
        .fill(theme.card_background)
        .corner_radius(CornerRadius::same(8))
        .stroke(theme.card_stroke(answer.is_accepted))
        .inner_margin(12.0)
        .outer_margin(egui::vec2(8.0, 6.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(60.0);
                    ui.label(
                        RichText::new(&answer.score)
                            .color(theme.score_color(answer.score.parse().unwrap_or(0)))
                            .size(18.0)
                            .strong(),
                    );
                    ui.label(RichText::new(&answer.score_text).color(theme.secondary_text).size(12.0));
                    if answer.is_accepted {
                        ui.label(RichText::new("✔ Accepted").color(theme.accepted).strong());
                    }
                });
                ui.vertical(|ui| html_body(ui, theme, &answer.body));
            });
            ui.add_space(6.0);
            author_row(
                ui,
                theme,
                avatars,
                &format!("answered {}", answer.created),
                &answer.author_name,
                &answer.reputation,
                answer.avatar_url.as_deref(),
            );
        });
}

fn author_row(
    ui: &mut Ui,
    theme: &AppTheme,
    avatars: &mut AvatarCache,
    when: &str,
    name: &str,
    reputation: &str,
    avatar_url: Option<&str>,
) {
    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
        ui.vertical(|ui| {
            ui.label(RichText::new(when).color(theme.secondary_text).size(12.0));
            ui.horizontal(|ui| {
                ui.label(RichText::new(name).color(theme.accent).strong());
                ui.label(RichText::new(reputation).color(theme.secondary_text).strong());
            });
        });
        if let Some(texture) = avatar_url.and_then(|url| avatars.get(ui.ctx(), url)) {
            ui.add(
                egui::Image::from_texture(egui::load::SizedTexture::from_handle(&texture))
                    .fit_to_exact_size(egui::vec2(32.0, 32.0)),
            );
        }
    });
}

fn tag_chip(ui: &mut Ui, theme: &AppTheme, tag: &str) {
    egui::Frame::new()
        .fill(theme.tag_background)
        .corner_radius(CornerRadius::same(4))
        .inner_margin(egui::Margin::symmetric(6, 2))
        .show(ui, |ui| {
            ui.label(RichText::new(tag).color(theme.tag_text).size(12.0));
        });
}

/// Lays out a post body: prose wraps, code keeps its lines.
pub fn html_body(ui: &mut Ui, theme: &AppTheme, html: &str) {
    for block in html_blocks(html) {
        match block {
            HtmlBlock::Heading(text) => {
                ui.label(RichText::new(text).color(theme.text).size(17.0).strong());
            }
            HtmlBlock::Paragraph(text) => {
                ui.label(RichText::new(text).color(theme.text));
            }
            HtmlBlock::ListItem(text) => {
                ui.label(RichText::new(format!("• {}", text)).color(theme.text));
            }
            HtmlBlock::Quote(text) => {
                egui::Frame::new()
                    .stroke(Stroke::new(1.0, theme.highlight))
                    .inner_margin(egui::Margin::symmetric(8, 4))
                    .show(ui, |ui| {
                        ui.label(RichText::new(text).color(theme.secondary_text).italics());
                    });
            }
            HtmlBlock::Code(code) => {
                egui::Frame::new()
                    .fill(theme.code_background)
                    .corner_radius(CornerRadius::same(4))
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ScrollArea::horizontal()
                            .id_salt(ui.next_auto_id())
                            .show(ui, |ui| {
                                ui.label(RichText::new(code).monospace().color(theme.text));
                            });
                    });
            }
        }
        ui.add_space(4.0);
    }
}

/// Notice shown while the API host can't be reached.
pub fn offline_dialog(ctx: &egui::Context, theme: &AppTheme) {
    egui::Window::new("No connection")
        .id(egui::Id::new("offline_dialog"))
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(theme.card_background)
                .stroke(Stroke::new(1.0, theme.separator))
                .corner_radius(CornerRadius::same(8)),
        )
        .show(ctx, |ui| {
            ui.label(RichText::new("You appear to be offline.").color(theme.text).size(16.0));
            ui.label(
                RichText::new("Cached questions stay available. This closes once the connection is back.")
                    .color(theme.secondary_text),
            );
        });
}
