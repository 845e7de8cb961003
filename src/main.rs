use eframe::egui;
use egui::{Color32, CornerRadius, RichText, ScrollArea, Stroke, Ui, ViewportBuilder};
use std::sync::mpsc;
use std::thread;

mod models;
mod search_client;
mod store;

use crate::models::{PageResult, SearchItem, SortKey};
use crate::search_client::{SearchClient, DEFAULT_QUERY};
use crate::store::ResultStore;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([720.0, 480.0])
            .with_title("Hacker News Search"),
        ..Default::default()
    };

    eframe::run_native(
        "Hacker News Search",
        options,
        Box::new(|cc| {
            let mut app = SearchApp::new();

            if let Some(storage) = cc.storage {
                // Restore the saved theme preference
                if let Some(theme_str) = storage.get_string("is_dark_mode") {
                    if let Ok(is_dark_mode) = theme_str.parse::<bool>() {
                        app.is_dark_mode = is_dark_mode;
                        app.theme = if is_dark_mode {
                            AppTheme::dark()
                        } else {
                            AppTheme::light()
                        };
                    }
                }
            }

            Ok(Box::new(app))
        }),
    )
}

struct AppTheme {
    background: Color32,
    card_background: Color32,
    text: Color32,
    secondary_text: Color32,
    highlight: Color32,
    separator: Color32,
    score_high: Color32,
    score_medium: Color32,
    score_low: Color32,
    button_background: Color32,
    button_foreground: Color32,
    button_active_background: Color32,
    button_hover_background: Color32,
}

impl AppTheme {
    fn dark() -> Self {
        Self {
            background: Color32::from_rgb(18, 18, 18),
            card_background: Color32::from_rgb(30, 30, 30),
            text: Color32::from_rgb(240, 240, 240),
            secondary_text: Color32::from_rgb(180, 180, 180),
            highlight: Color32::from_rgb(255, 102, 0), // HN orange
            separator: Color32::from_rgb(60, 60, 60),
            score_high: Color32::from_rgb(76, 175, 80),
            score_medium: Color32::from_rgb(255, 193, 7),
            score_low: Color32::from_rgb(158, 158, 158),
            button_background: Color32::from_rgb(66, 66, 66),
            button_foreground: Color32::from_rgb(240, 240, 240),
            button_active_background: Color32::from_rgb(255, 102, 0),
            button_hover_background: Color32::from_rgb(80, 80, 80),
        }
    }

    fn light() -> Self {
        Self {
            background: Color32::from_rgb(245, 245, 245),
            card_background: Color32::from_rgb(255, 255, 255),
            text: Color32::from_rgb(20, 20, 20),
            secondary_text: Color32::from_rgb(90, 90, 90),
            highlight: Color32::from_rgb(235, 92, 0),
            separator: Color32::from_rgb(200, 200, 200),
            score_high: Color32::from_rgb(30, 110, 40),
            score_medium: Color32::from_rgb(190, 130, 0),
            score_low: Color32::from_rgb(80, 80, 80),
            button_background: Color32::from_rgb(235, 235, 235),
            button_foreground: Color32::from_rgb(20, 20, 20),
            button_active_background: Color32::from_rgb(235, 92, 0),
            button_hover_background: Color32::from_rgb(210, 210, 210),
        }
    }

    fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        // Set base colors
        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.card_background;
        style.visuals.window_stroke = Stroke::new(1.0, self.separator);
        style.visuals.widgets.noninteractive.bg_fill = self.card_background;

        // Set text colors
        style.visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, self.text);

        // Set button styles
        style.visuals.widgets.inactive.bg_fill = self.button_background;
        style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.active.bg_fill = self.button_active_background;
        style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, self.button_foreground);
        style.visuals.widgets.hovered.bg_fill = self.button_hover_background;
        style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, self.button_foreground);

        // Set selection color
        style.visuals.selection.bg_fill = self.highlight;
        style.visuals.selection.stroke = Stroke::new(1.0, self.highlight);

        // Set various rounding amounts
        style.visuals.window_corner_radius = CornerRadius::same(8);
        style.visuals.menu_corner_radius = CornerRadius::same(6);
        style.visuals.widgets.noninteractive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.inactive.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.hovered.corner_radius = CornerRadius::same(4);
        style.visuals.widgets.active.corner_radius = CornerRadius::same(4);

        ctx.set_style(style);
    }

    fn score_color(&self, points: i32) -> Color32 {
        if points >= 300 {
            self.score_high
        } else if points >= 100 {
            self.score_medium
        } else {
            self.score_low
        }
    }
}

struct SearchApp {
    search_client: SearchClient,
    // The accumulated per-query cache; replaced wholesale on every transition
    results: ResultStore,
    // Live contents of the search field
    search_term: String,
    // The term that was last submitted; indexes the cache
    search_key: String,
    sort_key: SortKey,
    sort_reverse: bool,
    loading: bool,
    error: Option<String>,
    theme: AppTheme,
    is_dark_mode: bool,
    needs_repaint: bool,
    initial_search_done: bool,
    load_thread: Option<thread::JoinHandle<()>>,
    page_receiver: Option<mpsc::Receiver<anyhow::Result<PageResult>>>,
    // Deferred removal to avoid borrowing the row list while it renders
    pending_dismiss: Option<String>,
}

impl SearchApp {
    fn new() -> Self {
        Self {
            search_client: SearchClient::new(),
            results: ResultStore::new(),
            search_term: DEFAULT_QUERY.to_string(),
            search_key: String::new(),
            sort_key: SortKey::None,
            sort_reverse: false,
            loading: false,
            error: None,
            theme: AppTheme::dark(),
            is_dark_mode: true,
            needs_repaint: false,
            initial_search_done: false,
            load_thread: None,
            page_receiver: None,
            pending_dismiss: None,
        }
    }

    /// Makes the edited term the active search key and fetches its first page
    /// unless the cache already holds results for it.
    fn submit_search(&mut self) {
        if self.loading {
            return; // Don't start another load if we're already loading
        }

        self.search_key = self.search_term.clone();

        if self.results.needs_fetch(&self.search_key) {
            self.fetch_page(0);
        } else {
            // Cached term: render straight from the store, no request
            self.error = None;
            self.needs_repaint = true;
        }
    }

    /// Fetches the page after the last one merged for the active key.
    fn load_more(&mut self) {
        if self.loading {
            return;
        }

        let next_page = self.results.active_view(&self.search_key).page + 1;
        self.fetch_page(next_page);
    }

    fn fetch_page(&mut self, page: u32) {
        if self.loading {
            return;
        }

        self.loading = true;
        self.error = None;

        // Run the request on its own thread and hand the result back over a
        // channel polled from update()
        let client = self.search_client.clone();
        let key = self.search_key.clone();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let _ = tx.send(client.search(&key, page));
        });

        self.load_thread = Some(handle);
        self.page_receiver = Some(rx);
    }

    fn poll_fetch_result(&mut self) {
        if let Some(rx) = &self.page_receiver {
            match rx.try_recv() {
                Ok(Ok(result)) => {
                    self.results = self.results.merge(result);
                    self.error = None;
                    self.loading = false;
                    self.page_receiver = None; // Consume the receiver
                    self.needs_repaint = true;
                }
                Ok(Err(e)) => {
                    self.error = Some(e.to_string());
                    self.loading = false;
                    self.page_receiver = None; // Consume the receiver
                    self.needs_repaint = true;
                }
                Err(mpsc::TryRecvError::Empty) => {
                    // Still waiting for the response
                }
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.error = Some("the search request was interrupted".to_string());
                    self.loading = false;
                    self.page_receiver = None;
                    self.needs_repaint = true;
                }
            }
        }

        // Reap the worker thread once it is done
        if let Some(handle) = &self.load_thread {
            if handle.is_finished() {
                if let Some(handle) = self.load_thread.take() {
                    let _ = handle.join();
                }
            }
        }
    }

    fn on_sort(&mut self, sort_key: SortKey) {
        if self.sort_key == sort_key {
            self.sort_reverse = !self.sort_reverse;
        } else {
            self.sort_key = sort_key;
            self.sort_reverse = false;
        }
        self.needs_repaint = true;
    }

    fn open_link(&self, url: &str) {
        if let Err(e) = open::that(url) {
            eprintln!("Failed to open URL: {}", e);
        }
    }

    fn toggle_theme(&mut self) {
        self.is_dark_mode = !self.is_dark_mode;
        self.theme = if self.is_dark_mode {
            AppTheme::dark()
        } else {
            AppTheme::light()
        };
        self.needs_repaint = true;
    }

    fn render_header(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.heading(
                RichText::new("Hacker News Search")
                    .color(self.theme.highlight)
                    .size(24.0),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let theme_icon = if self.is_dark_mode { "☀" } else { "☾" };
                let theme_btn = ui.add(
                    egui::Button::new(
                        RichText::new(theme_icon)
                            .color(self.theme.button_foreground)
                            .size(18.0),
                    )
                    .min_size(egui::Vec2::new(32.0, 32.0))
                    .corner_radius(CornerRadius::same(16))
                    .fill(self.theme.button_background),
                );

                if theme_btn.clicked() {
                    self.toggle_theme();
                }

                if theme_btn.hovered() {
                    ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                }
            });
        });
    }

    fn render_search_bar(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Search:").color(self.theme.text).size(16.0));
            ui.add_space(8.0);

            let text_edit = ui.add_sized(
                [ui.available_width() - 110.0, 32.0],
                egui::TextEdit::singleline(&mut self.search_term)
                    .hint_text("Search Hacker News...")
                    .text_color(self.theme.text)
                    .cursor_at_end(true)
                    .frame(true),
            );

            let submitted =
                text_edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            ui.add_space(8.0);
            let search_btn = ui.add_sized(
                [90.0, 32.0],
                egui::Button::new(
                    RichText::new("Search")
                        .color(self.theme.button_foreground)
                        .size(14.0),
                )
                .corner_radius(CornerRadius::same(6))
                .fill(self.theme.button_background),
            );

            if submitted || search_btn.clicked() {
                self.submit_search();
            }
        });
    }

    fn render_error(&self, ui: &mut Ui, message: &str) {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            egui::Frame::new()
                .fill(self.theme.card_background)
                .corner_radius(CornerRadius::same(8))
                .stroke(Stroke::new(1.0, self.theme.separator))
                .inner_margin(16.0)
                .show(ui, |ui| {
                    ui.label(
                        RichText::new("An error has occurred.")
                            .color(self.theme.highlight)
                            .size(18.0)
                            .strong(),
                    );
                    ui.add_space(6.0);
                    ui.label(
                        RichText::new(message)
                            .color(self.theme.secondary_text)
                            .size(14.0),
                    );
                    ui.add_space(6.0);
                    ui.label(
                        RichText::new("Submit the search again to retry.")
                            .color(self.theme.secondary_text)
                            .size(13.0)
                            .italics(),
                    );
                });
        });
    }

    fn sort_button(&mut self, ui: &mut Ui, sort_key: SortKey, width: f32) {
        let is_active = self.sort_key == sort_key;
        let label = if is_active {
            let arrow = if self.sort_reverse { "▲" } else { "▼" };
            format!("{} {}", sort_key.label(), arrow)
        } else {
            sort_key.label().to_string()
        };

        let btn = ui.add_sized(
            [width, 28.0],
            egui::Button::new(
                RichText::new(label)
                    .color(if is_active {
                        self.theme.button_foreground
                    } else {
                        self.theme.secondary_text
                    })
                    .size(14.0),
            )
            .corner_radius(CornerRadius::same(6))
            .fill(if is_active {
                self.theme.button_active_background
            } else {
                self.theme.button_background
            }),
        );

        if btn.clicked() {
            self.on_sort(sort_key);
        }

        if btn.hovered() {
            ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
        }
    }

    fn render_results_table(&mut self, ui: &mut Ui) {
        // Sort a copy of the active list at render time; the store itself
        // stays in fetch order
        let mut items = {
            let view = self.results.active_view(&self.search_key);
            self.sort_key.sorted(view.items)
        };
        if self.sort_reverse {
            items.reverse();
        }

        let total_width = ui.available_width() - 32.0;
        let title_width = total_width * 0.42;
        let author_width = total_width * 0.20;
        let comments_width = total_width * 0.12;
        let points_width = total_width * 0.12;
        let dismiss_width = total_width * 0.12;

        // Header row with the sort controls
        ui.horizontal(|ui| {
            ui.add_space(8.0);
            self.sort_button(ui, SortKey::Title, title_width);
            self.sort_button(ui, SortKey::Author, author_width);
            self.sort_button(ui, SortKey::Comments, comments_width);
            self.sort_button(ui, SortKey::Points, points_width);
            ui.add_sized(
                [dismiss_width, 28.0],
                egui::Label::new(
                    RichText::new("Archive")
                        .color(self.theme.secondary_text)
                        .size(14.0),
                ),
            );
        });

        if items.is_empty() {
            if !self.loading {
                ui.add_space(24.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        RichText::new("No results.")
                            .color(self.theme.secondary_text)
                            .size(14.0),
                    );
                });
            }
            return;
        }

        let mut dismissed = None;
        for item in &items {
            self.render_result_row(
                ui,
                item,
                [
                    title_width,
                    author_width,
                    comments_width,
                    points_width,
                    dismiss_width,
                ],
                &mut dismissed,
            );
        }

        if dismissed.is_some() {
            self.pending_dismiss = dismissed;
        }
    }

    fn render_result_row(
        &self,
        ui: &mut Ui,
        item: &SearchItem,
        widths: [f32; 5],
        dismissed: &mut Option<String>,
    ) {
        let [title_width, author_width, comments_width, points_width, dismiss_width] = widths;

        egui::Frame::new()
            .fill(self.theme.card_background)
            .corner_radius(CornerRadius::same(8))
            .stroke(Stroke::new(1.0, self.theme.separator))
            .inner_margin(8.0)
            .outer_margin(egui::vec2(8.0, 3.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    // Title opens the story in the system browser
                    let title_label = ui.add_sized(
                        [title_width, 22.0],
                        egui::Label::new(
                            RichText::new(&item.title)
                                .color(self.theme.text)
                                .size(15.0)
                                .strong(),
                        )
                        .truncate()
                        .sense(egui::Sense::click()),
                    );

                    if title_label.clicked() && !item.url.is_empty() {
                        self.open_link(&item.url);
                    }

                    if title_label.hovered() && !item.url.is_empty() {
                        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                    }

                    ui.add_sized(
                        [author_width, 22.0],
                        egui::Label::new(
                            RichText::new(&item.author)
                                .color(self.theme.secondary_text)
                                .size(14.0),
                        )
                        .truncate(),
                    );

                    ui.add_sized(
                        [comments_width, 22.0],
                        egui::Label::new(
                            RichText::new(format!("{}", item.num_comments))
                                .color(self.theme.text)
                                .size(14.0),
                        ),
                    );

                    ui.add_sized(
                        [points_width, 22.0],
                        egui::Label::new(
                            RichText::new(format!("{}", item.points))
                                .color(self.theme.score_color(item.points))
                                .size(14.0)
                                .strong(),
                        ),
                    );

                    let dismiss_btn = ui.add_sized(
                        [dismiss_width - 8.0, 24.0],
                        egui::Button::new(
                            RichText::new("Dismiss")
                                .color(self.theme.button_foreground)
                                .size(13.0),
                        )
                        .corner_radius(CornerRadius::same(6))
                        .fill(self.theme.button_background),
                    );

                    if dismiss_btn.clicked() {
                        *dismissed = Some(item.id.clone());
                    }

                    if dismiss_btn.hovered() {
                        ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                    }
                });
            });
    }

    fn render_more_control(&mut self, ui: &mut Ui) {
        ui.vertical_centered(|ui| {
            if self.loading {
                ui.spinner();
                ui.add_space(4.0);
                ui.label(
                    RichText::new("Loading...")
                        .color(self.theme.secondary_text)
                        .size(14.0),
                );
            } else {
                let more_btn = ui.add_sized(
                    [120.0, 32.0],
                    egui::Button::new(
                        RichText::new("More")
                            .color(self.theme.button_foreground)
                            .size(14.0),
                    )
                    .corner_radius(CornerRadius::same(6))
                    .fill(self.theme.button_background),
                );

                if more_btn.clicked() {
                    self.load_more();
                }

                if more_btn.hovered() {
                    ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
                }
            }
        });
    }
}

impl eframe::App for SearchApp {
    // Persist the theme preference when the app is closing
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        storage.set_string("is_dark_mode", self.is_dark_mode.to_string());
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        // Check whether an in-flight request has finished
        self.poll_fetch_result();

        // Submit the default query once on startup
        if !self.initial_search_done {
            self.initial_search_done = true;
            self.submit_search();
        }

        // Apply a dismissal queued during the previous render pass
        if let Some(item_id) = self.pending_dismiss.take() {
            self.results = self.results.dismiss(&self.search_key, &item_id);
            self.needs_repaint = true;
        }

        if self.needs_repaint {
            ctx.request_repaint();
            self.needs_repaint = false;
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            ui.add(egui::Separator::default().spacing(12.0));
            self.render_search_bar(ui);
            ui.add_space(8.0);

            if let Some(message) = self.error.clone() {
                self.render_error(ui, &message);
            } else {
                ScrollArea::vertical()
                    .auto_shrink([false; 2])
                    .show(ui, |ui| {
                        self.render_results_table(ui);
                        ui.add_space(12.0);
                        self.render_more_control(ui);
                        ui.add_space(20.0);
                    });
            }
        });
    }
}
