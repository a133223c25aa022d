use anyhow::{anyhow, Context, Result};
use eframe::egui;
use egui::{CornerRadius, RichText, ViewportBuilder};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod avatars;
mod config;
mod db;
mod detail_view_model;
mod formatting;
mod html;
mod mappers;
mod models;
mod network_monitor;
mod repository;
mod screens;
mod search_view_model;
mod stack_client;
mod theme;
mod ui_models;
mod view_state;

use crate::avatars::AvatarCache;
use crate::config::Config;
use crate::db::Database;
use crate::detail_view_model::DetailViewModel;
use crate::network_monitor::NetworkMonitor;
use crate::repository::{AnswerRepository, QuestionRepository};
use crate::screens::{DetailAction, SearchAction};
use crate::search_view_model::SearchViewModel;
use crate::stack_client::StackExchangeClient;
use crate::theme::AppTheme;

const ICON_PNG: &[u8] = include_bytes!("../logo/logo.png");

// Function to load an image as an icon
fn load_icon(bytes: &[u8]) -> Result<egui::IconData> {
    let img = image::load_from_memory(bytes)?;
    let rgba_image = img.into_rgba8();
    let (width, height) = rgba_image.dimensions();

    Ok(egui::IconData {
        rgba: rgba_image.into_raw(),
        width,
        height,
    })
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stack_search=info")),
        )
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("stack-search-io")
        .build()
        .context("Failed to start async runtime")?;

    let database = Database::open(&config.db_path)?;
    info!("{} questions in the local cache", database.get_all_questions()?.len());
    let client = Arc::new(StackExchangeClient::new(&config)?);
    let questions = QuestionRepository::new(client.clone(), database.clone());
    let answers = AnswerRepository::new(client, database);
    let monitor = NetworkMonitor::start(&config.base_url, config.connectivity_interval, runtime.handle())?;
    let avatars = AvatarCache::new(runtime.handle().clone())?;
    info!("Using {} on {}", config.base_url, config.site);

    let mut options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_min_inner_size([700.0, 500.0])
            .with_title("Stack Search"),
        ..Default::default()
    };
    match load_icon(ICON_PNG) {
        Ok(icon) => options.viewport.icon = Some(Arc::new(icon)),
        Err(e) => warn!("Failed to load icon: {}", e),
    }

    let handle = runtime.handle().clone();
    eframe::run_native(
        "Stack Search",
        options,
        Box::new(move |cc| {
            let is_dark_mode = cc
                .storage
                .and_then(|storage| storage.get_string("is_dark_mode"))
                .and_then(|value| value.parse::<bool>().ok())
                .unwrap_or(true);

            let app = StackSearchApp::new(
                cc.egui_ctx.clone(),
                config,
                handle,
                questions,
                answers,
                monitor,
                avatars,
                is_dark_mode,
            );
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow!("UI terminated with an error: {}", e))?;

    info!("Shutting down");
    Ok(())
}

enum Screen {
    Search,
    /// Owns the detail view-model; leaving the screen drops it and cancels
    /// its work.
    Detail(DetailViewModel),
}

struct StackSearchApp {
    config: Config,
    runtime: Handle,
    ctx: egui::Context,
    questions: QuestionRepository,
    answers: AnswerRepository,
    search: SearchViewModel,
    screen: Screen,
    search_input: String,
    monitor: NetworkMonitor,
    avatars: AvatarCache,
    theme: AppTheme,
    is_dark_mode: bool,
    notice: Option<String>,
}

impl StackSearchApp {
    #[allow(clippy::too_many_arguments)]
    fn new(
        ctx: egui::Context,
        config: Config,
        runtime: Handle,
        questions: QuestionRepository,
        answers: AnswerRepository,
        monitor: NetworkMonitor,
        avatars: AvatarCache,
        is_dark_mode: bool,
    ) -> Self {
        let mut search = SearchViewModel::new(questions.clone(), runtime.clone());
        let repaint = ctx.clone();
        search.watch_changes(move || repaint.request_repaint());

        let mut online = monitor.subscribe();
        let repaint = ctx.clone();
        runtime.spawn(async move {
            while online.changed().await.is_ok() {
                repaint.request_repaint();
            }
        });

        Self {
            config,
            runtime,
            ctx,
            questions,
            answers,
            search_input: search.input_query(),
            search,
            screen: Screen::Search,
            monitor,
            avatars,
            theme: AppTheme::for_mode(is_dark_mode),
            is_dark_mode,
            notice: None,
        }
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            error!("Failed to open URL {}: {}", url, e);
        }
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        let result = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.to_string()));
        self.notice = Some(match result {
            Ok(()) => "Link copied".to_string(),
            Err(e) => {
                error!("Failed to copy to clipboard: {}", e);
                "Could not copy link".to_string()
            }
        });
    }

    fn toggle_theme(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
        self.theme = AppTheme::for_mode(self.is_dark_mode);
    }

    fn open_question(&mut self, question_id: i64) {
        info!("Opening question {}", question_id);
        let mut detail = DetailViewModel::new(
            question_id,
            self.questions.clone(),
            self.answers.clone(),
            self.runtime.clone(),
        );
        let repaint = self.ctx.clone();
        detail.watch_changes(move || repaint.request_repaint());
        self.notice = None;
        self.screen = Screen::Detail(detail);
    }

    fn go_back(&mut self) {
        self.notice = None;
        self.screen = Screen::Search;
    }

    fn handle_search_action(&mut self, action: SearchAction) {
        match action {
            SearchAction::QueryChanged(input) => self.search.update_query(&input),
            SearchAction::Submit(query) => self.search.search_questions(&query),
            SearchAction::Retry => self.search.retry_refresh(),
            SearchAction::DismissError => self.search.dismiss_refresh_error(),
            SearchAction::OpenQuestion(id) => self.open_question(id),
            SearchAction::OpenSiteSearch(query) => {
                let url = self.config.site_search_url(&query);
                self.open_link(&url);
            }
        }
    }

    fn handle_detail_action(&mut self, action: DetailAction) {
        if let DetailAction::Back = action {
            self.go_back();
            return;
        }
        let Screen::Detail(detail) = &mut self.screen else {
            return;
        };
        let question_url = detail
            .question_link()
            .unwrap_or_else(|| self.config.question_url(detail.question_id()));
        match action {
            DetailAction::Back => {}
            DetailAction::Retry => detail.retry_refresh(),
            DetailAction::DismissError => detail.dismiss_refresh_error(),
            DetailAction::SetSortOrder(order) => detail.set_sort_order(order),
            DetailAction::OpenInBrowser => self.open_link(&question_url),
            DetailAction::CopyLink => self.copy_to_clipboard(&question_url),
        }
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Stack Search").color(self.theme.highlight).size(24.0));
                ui.label(RichText::new(&self.config.site).color(self.theme.secondary_text));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    // Sun for light mode, moon for dark mode
                    let theme_icon = if self.is_dark_mode { "☀" } else { "☾" };
                    let theme_btn = ui
                        .add(
                            egui::Button::new(
                                RichText::new(theme_icon).color(self.theme.button_foreground).size(20.0),
                            )
                            .min_size(egui::Vec2::new(32.0, 32.0))
                            .corner_radius(CornerRadius::same(16))
                            .fill(self.theme.button_background),
                        )
                        .on_hover_text(if self.is_dark_mode {
                            "Switch to Light Mode"
                        } else {
                            "Switch to Dark Mode"
                        });
                    if theme_btn.hovered() {
                        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                    }
                    if theme_btn.clicked() {
                        self.toggle_theme();
                        ctx.request_repaint();
                    }

                    if let Some(notice) = &self.notice {
                        ui.add_space(12.0);
                        ui.label(RichText::new(notice).color(self.theme.secondary_text));
                    }
                    if !self.monitor.is_online() {
                        ui.add_space(12.0);
                        ui.label(RichText::new("Offline").color(self.theme.error).strong());
                    }
                });
            });
            ui.add_space(6.0);
        });
    }
}

impl eframe::App for StackSearchApp {
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);
        self.avatars.poll(ctx);
        self.render_header(ctx);

        let mut search_actions = Vec::new();
        let mut detail_actions = Vec::new();

        egui::CentralPanel::default().show(ctx, |ui| match &self.screen {
            Screen::Search => {
                let state = self.search.ui_state();
                let refresh_error = self.search.refresh_error();
                search_actions = screens::search_screen(
                    ui,
                    &self.theme,
                    &state,
                    refresh_error.as_deref(),
                    &mut self.search_input,
                );
            }
            Screen::Detail(detail) => {
                let state = detail.ui_state();
                let refresh_error = detail.refresh_error();
                detail_actions = screens::detail_screen(
                    ui,
                    &self.theme,
                    &mut self.avatars,
                    &state,
                    refresh_error.as_deref(),
                    detail.sort_order(),
                );
            }
        });

        if matches!(self.screen, Screen::Detail(_)) && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            detail_actions.push(DetailAction::Back);
        }

        for action in search_actions {
            self.handle_search_action(action);
        }
        for action in detail_actions {
            self.handle_detail_action(action);
        }

        if !self.monitor.is_online() {
            screens::offline_dialog(ctx, &self.theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_icon_decodes() {
        let icon = load_icon(ICON_PNG).unwrap();
        assert_eq!((icon.width, icon.height), (128, 128));
        assert_eq!(icon.rgba.len(), 128 * 128 * 4);
    }

    #[test]
    fn broken_icon_is_an_error() {
        assert!(load_icon(b"not a png").is_err());
    }
}
