use anyhow::{anyhow, Context as _};
use eframe::egui;
use egui::{RichText, ScrollArea, ViewportBuilder};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

mod config;
mod controller;
mod debounce;
mod dispatcher;
mod error;
mod hn_client;
mod models;
mod render;
mod session;
mod theme;

use crate::config::AppConfig;
use crate::hn_client::HackerNewsClient;
use crate::render::show_list;
use crate::session::SearchSession;
use crate::theme::AppTheme;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hn_story_search=info".parse()?),
        )
        .with_target(false)
        .init();

    let config = AppConfig::default();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    let client = Arc::new(HackerNewsClient::new(&config).context("failed to build the HTTP client")?);

    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([900.0, 800.0])
            .with_min_inner_size([480.0, 400.0])
            .with_title("Hacker News"),
        ..Default::default()
    };

    info!(base_url = %config.base_url, "starting");
    eframe::run_native(
        "Hacker News",
        options,
        Box::new(move |cc| {
            let mut session = SearchSession::new(&config, client, runtime.handle().clone());
            let ctx = cc.egui_ctx.clone();
            session.set_on_complete(move || ctx.request_repaint());
            session.start(Instant::now());
            Ok(Box::new(HnSearchApp::new(session, runtime)))
        }),
    )
    .map_err(|e| anyhow!("window failed: {e}"))
}

struct HnSearchApp {
    session: SearchSession<HackerNewsClient>,
    // Keeps the fetch tasks alive for as long as the window is open.
    _runtime: tokio::runtime::Runtime,
    search_input: String,
    theme: AppTheme,
}

impl HnSearchApp {
    fn new(session: SearchSession<HackerNewsClient>, runtime: tokio::runtime::Runtime) -> Self {
        Self {
            session,
            _runtime: runtime,
            search_input: String::new(),
            theme: AppTheme::dark(),
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = if self.theme.is_dark() {
            AppTheme::light()
        } else {
            AppTheme::dark()
        };
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            warn!(%url, error = %e, "failed to open link");
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("📈 Top Stories").color(self.theme.highlight).size(14.0).strong());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let theme_icon = if self.theme.is_dark() { "☀" } else { "🌙" };
                if ui.button(RichText::new(theme_icon).size(16.0)).on_hover_text("Toggle theme").clicked() {
                    self.toggle_theme();
                }
                let hover = match self.session.committed_term() {
                    Some("") | None => "Refetch the front page".to_string(),
                    Some(term) => format!("Refetch results for '{}'", term),
                };
                // Nothing to refetch while a request is still out
                let idle = !self.session.state().is_loading();
                let refresh = ui.add_enabled(idle, egui::Button::new(RichText::new("⟳ Refresh").size(14.0)));
                if refresh.on_hover_text(hover).clicked() {
                    self.session.retry();
                }
            });
        });

        ui.add_space(4.0);
        ui.label(RichText::new("Hacker News").size(34.0).strong().color(self.theme.text));
        ui.add_space(16.0);

        let response = ui.add_sized(
            [ui.available_width(), 40.0],
            egui::TextEdit::singleline(&mut self.search_input)
                .hint_text("🔍 Search stories...")
                .font(egui::TextStyle::Heading)
                .margin(egui::vec2(12.0, 8.0)),
        );
        if response.changed() {
            self.session.on_input(&self.search_input, Instant::now());
        }
        // Enter skips the quiet window
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            self.session.commit_now(Instant::now());
        }
        ui.add_space(12.0);
    }
}

impl eframe::App for HnSearchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        self.session.pump(Instant::now());

        let view = self.session.view();
        let mut clicked_link = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                ui.set_max_width(760.0);
                ui.add_space(24.0);
                self.render_header(ui);
                clicked_link = show_list(ui, &self.theme, &view);
                ui.add_space(24.0);
            });
        });

        // The header may have recorded a keystroke this frame
        if let Some(wait) = self.session.next_wakeup(Instant::now()) {
            ctx.request_repaint_after(wait);
        }

        if let Some(url) = clicked_link {
            self.open_link(&url);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("shutting down");
        self.session.shutdown();
    }
}
