#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod chart;
mod logger;
mod style;
mod table;

use chart::PriceChart;
use data::snapshot::Snapshot;
use data::tickers_table::TickersTable;
use data::watchlist::{self, FileStorage, WatchlistStore};
use data::{InternalError, ScaleMode};
use exchange::fetcher::{ApiClient, RequestTag, RequestTracker};
use exchange::{History, Period, RowRecord};

use iced::widget::{
    button, checkbox, column, container, pick_list, row, rule, text, text_input,
};
use iced::{Alignment, Element, Length, Subscription, Task, Theme, window};

fn main() {
    if let Err(e) = logger::setup(cfg!(debug_assertions)) {
        eprintln!("Failed to initialize logger: {e}");
    }

    let result = iced::application(Stockwatch::new, Stockwatch::update, Stockwatch::view)
        .title(Stockwatch::title)
        .theme(Stockwatch::theme)
        .subscription(Stockwatch::subscription)
        .window(window::Settings {
            size: iced::Size::new(1280.0, 860.0),
            exit_on_close_request: false,
            ..window::Settings::default()
        })
        .settings(iced::Settings {
            antialiasing: true,
            default_text_size: iced::Pixels(13.0),
            ..Default::default()
        })
        .run();

    if let Err(e) = result {
        log::error!("Application exited with error: {e}");
    }
}

struct Stockwatch {
    client: ApiClient,
    saved_api_base: String,
    tickers_input: String,
    table: TickersTable,
    metrics_requests: RequestTracker,
    metrics_error: Option<String>,
    chart: PriceChart,
    history_requests: RequestTracker,
    selected: Option<String>,
    period: Period,
    snapshot: Option<Snapshot>,
    watchlists: WatchlistStore<FileStorage>,
    active_watchlist: Option<String>,
    watchlist_name: String,
    notice: Option<String>,
}

#[derive(Debug, Clone)]
enum Message {
    TickersInputChanged(String),
    LoadMetrics,
    MetricsFetched(RequestTag, Result<Vec<RowRecord>, InternalError>),
    Table(table::Message),
    PeriodSelected(Period),
    HistoryFetched(RequestTag, Result<History, InternalError>),
    ScaleModeToggled(bool),
    WatchlistNameChanged(String),
    CreateWatchlist,
    SaveWatchlist,
    WatchlistSelected(String),
    CloseRequested(window::Id),
}

impl Stockwatch {
    fn new() -> (Self, Task<Message>) {
        let saved_state = data::load_saved_state();

        let api_base = data::config::api_base(&saved_state.api_base);
        let client = ApiClient::new(&api_base).unwrap_or_else(|e| {
            log::error!("Invalid API url {api_base:?}, using the default: {e}");
            ApiClient::default()
        });
        log::info!("Using API at {}", client.base());

        let watchlists = WatchlistStore::load(FileStorage::default());

        let mut tickers_input = saved_state.tickers_input;
        let active_watchlist = saved_state
            .active_watchlist
            .filter(|name| watchlists.exists(name));
        if let Some(tickers) = active_watchlist.as_deref().and_then(|n| watchlists.get(n)) {
            tickers_input = tickers.join(" ");
        }

        let mut state = Self {
            client,
            saved_api_base: saved_state.api_base,
            tickers_input,
            table: TickersTable::new(),
            metrics_requests: RequestTracker::default(),
            metrics_error: None,
            chart: PriceChart::new(saved_state.scale_mode),
            history_requests: RequestTracker::default(),
            selected: None,
            period: saved_state.period,
            snapshot: None,
            watchlist_name: active_watchlist.clone().unwrap_or_default(),
            watchlists,
            active_watchlist,
            notice: None,
        };

        let load = state.load_metrics();
        (state, load)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TickersInputChanged(input) => {
                self.tickers_input = input;
            }
            Message::LoadMetrics => return self.load_metrics(),
            Message::MetricsFetched(tag, result) => {
                if !self.metrics_requests.is_current(&tag) {
                    log::debug!("Discarding stale metrics response #{}", tag.id);
                    return Task::none();
                }

                match result {
                    Ok(rows) => {
                        log::info!("Loaded metrics for {} tickers", rows.len());
                        self.metrics_error = None;
                        self.table.set_rows(rows);

                        let tickers = self.table.tickers();
                        let keep_selection = self
                            .selected
                            .as_ref()
                            .is_some_and(|s| tickers.contains(s));

                        if !keep_selection && let Some(first) = tickers.into_iter().next() {
                            return self.select_ticker(first);
                        }
                    }
                    Err(e) => {
                        log::error!("Failed to fetch metrics: {e}");
                        self.metrics_error = Some(e.to_string());
                    }
                }
            }
            Message::Table(message) => match message {
                table::Message::SortBy(column) => {
                    self.table.sort_by(column.key());
                }
                table::Message::TickerSelected(ticker) => {
                    return self.select_ticker(ticker);
                }
            },
            Message::PeriodSelected(period) => {
                if period != self.period {
                    self.period = period;
                    self.save_state();
                }
                return self.load_history();
            }
            Message::HistoryFetched(tag, result) => {
                if !self.history_requests.is_current(&tag) {
                    log::debug!(
                        "Discarding stale history response #{} for {}",
                        tag.id,
                        tag.subject
                    );
                    return Task::none();
                }

                let period = tag.period.unwrap_or(self.period);
                match result {
                    Ok(history) => {
                        self.chart.load(&tag.subject, period, history);

                        let session = self.chart.session();
                        self.snapshot = Some(Snapshot::new(
                            session.ticker(),
                            session.meta(),
                            session.series(),
                        ));
                    }
                    Err(e) => {
                        log::error!("Failed to fetch history for {}: {e}", tag.subject);
                        self.chart.fail(e.to_string());
                    }
                }
            }
            Message::ScaleModeToggled(trim) => {
                self.chart.set_scale_mode(if trim {
                    ScaleMode::Trimmed
                } else {
                    ScaleMode::Full
                });
                self.save_state();
            }
            Message::WatchlistNameChanged(name) => {
                self.watchlist_name = name;
            }
            Message::CreateWatchlist => {
                let name = self.watchlist_name.trim().to_string();

                match self.watchlists.create(&name) {
                    Ok(()) => {
                        log::info!("Created watchlist {name}");
                        self.notice = Some(format!("Created watchlist \"{name}\""));
                        self.active_watchlist = Some(name);
                        self.save_state();
                    }
                    Err(e) => self.report_watchlist_error(e),
                }
            }
            Message::SaveWatchlist => {
                let name = self.watchlist_name.trim().to_string();
                let tickers = watchlist::parse_tickers(&self.tickers_input);
                let count = tickers.len();

                match self.watchlists.replace(&name, tickers) {
                    Ok(()) => {
                        log::info!("Saved watchlist {name} with {count} tickers");
                        self.notice = Some(format!("Saved {count} tickers to \"{name}\""));
                        self.active_watchlist = Some(name);
                        self.save_state();
                    }
                    Err(e) => self.report_watchlist_error(e),
                }
            }
            Message::WatchlistSelected(name) => {
                let Some(tickers) = self.watchlists.get(&name) else {
                    log::warn!("Selected unknown watchlist {name}");
                    return Task::none();
                };

                self.tickers_input = tickers.join(" ");
                self.watchlist_name = name.clone();
                self.active_watchlist = Some(name);
                self.notice = None;
                self.save_state();

                return self.load_metrics();
            }
            Message::CloseRequested(_window) => {
                self.save_state();
                return iced::exit();
            }
        }

        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let controls = row![
            text_input("Tickers, e.g. AAPL MSFT GOOGL", &self.tickers_input)
                .on_input(Message::TickersInputChanged)
                .on_submit(Message::LoadMetrics)
                .width(Length::FillPortion(3)),
            button(text("Load")).on_press(Message::LoadMetrics),
            rule::vertical(1),
            pick_list(
                self.watchlists
                    .list()
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
                self.active_watchlist.clone(),
                Message::WatchlistSelected,
            )
            .placeholder("Watchlists"),
            text_input("Watchlist name", &self.watchlist_name)
                .on_input(Message::WatchlistNameChanged)
                .width(Length::FillPortion(1)),
            button(text("Create")).on_press(Message::CreateWatchlist),
            button(text("Save")).on_press(Message::SaveWatchlist),
        ]
        .spacing(8)
        .align_y(Alignment::Center);

        let mut status = column![].spacing(2);
        if let Some(notice) = &self.notice {
            status = status.push(text(notice).size(12));
        }
        if let Some(error) = &self.metrics_error {
            status = status.push(
                text(format!("Error loading metrics: {error}"))
                    .size(12)
                    .style(style::error_text),
            );
        }

        let table = container(
            table::view(&self.table, self.selected.as_deref()).map(Message::Table),
        )
        .padding(4)
        .style(style::panel)
        .height(Length::FillPortion(2));

        column![controls, status, table, self.chart_panel()]
            .spacing(8)
            .padding(12)
            .into()
    }

    fn chart_panel(&self) -> Element<'_, Message> {
        let header: Element<'_, Message> = match &self.snapshot {
            Some(snapshot) => {
                let direction = snapshot.direction;

                let title = row![
                    text(&snapshot.ticker).size(18),
                    text(&snapshot.name).size(14),
                    text(&snapshot.sector).size(12),
                    text(&snapshot.price).size(18).font(style::MONO),
                    text(&snapshot.change)
                        .font(style::MONO)
                        .style(move |theme: &Theme| style::change_text(theme, direction)),
                ]
                .spacing(12)
                .align_y(Alignment::Center);

                let stats = row(snapshot.stats().into_iter().map(|(label, value)| {
                    row![
                        text(label).size(11),
                        text(value.to_string()).size(12).font(style::MONO)
                    ]
                    .spacing(4)
                    .into()
                }))
                .spacing(16);

                column![title, stats].spacing(4).into()
            }
            None => text(
                self.selected
                    .as_deref()
                    .unwrap_or("Select a ticker to see its chart"),
            )
            .size(14)
            .into(),
        };

        let periods = row(Period::ALL.iter().map(|&period| {
            let is_active = period == self.period;

            button(text(period.as_str()).size(12))
                .style(move |theme, status| style::button::bordered_toggle(theme, status, is_active))
                .on_press(Message::PeriodSelected(period))
                .into()
        }))
        .spacing(4);

        let trim = checkbox(self.chart.scale_mode() == ScaleMode::Trimmed)
            .label(ScaleMode::Trimmed.to_string())
            .on_toggle(Message::ScaleModeToggled);

        let mut toolbar = row![periods, trim].spacing(16).align_y(Alignment::Center);
        if let chart::Status::Failed(reason) = self.chart.status() {
            toolbar = toolbar.push(text(reason).size(12).style(style::error_text));
        }

        container(
            column![header, toolbar, self.chart.view()]
                .spacing(8)
                .height(Length::Fill),
        )
        .padding(8)
        .style(style::panel)
        .height(Length::FillPortion(3))
        .into()
    }

    fn title(&self) -> String {
        match &self.selected {
            Some(ticker) => format!("Stockwatch [{ticker}]"),
            None => "Stockwatch".to_string(),
        }
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        window::close_requests().map(Message::CloseRequested)
    }

    fn load_metrics(&mut self) -> Task<Message> {
        let tickers = watchlist::parse_tickers(&self.tickers_input);
        if tickers.is_empty() {
            self.notice = Some("Enter at least one ticker".to_string());
            return Task::none();
        }

        let tag = self.metrics_requests.issue(tickers.join(" "), None);
        log::debug!("Requesting metrics #{} for {}", tag.id, tag.subject);

        let client = self.client.clone();
        Task::perform(
            async move {
                client
                    .fetch_metrics(&tickers)
                    .await
                    .map_err(|e| InternalError::Fetch(e.to_string()))
            },
            move |result| Message::MetricsFetched(tag, result),
        )
    }

    fn select_ticker(&mut self, ticker: String) -> Task<Message> {
        self.selected = Some(ticker);
        self.load_history()
    }

    fn load_history(&mut self) -> Task<Message> {
        let Some(ticker) = self.selected.clone() else {
            return Task::none();
        };
        let period = self.period;

        let tag = self.history_requests.issue(ticker.clone(), Some(period));
        log::debug!("Requesting {period} history #{} for {ticker}", tag.id);
        self.chart.set_loading();

        let client = self.client.clone();
        Task::perform(
            async move {
                client
                    .fetch_history(&ticker, period)
                    .await
                    .map_err(|e| InternalError::Fetch(e.to_string()))
            },
            move |result| Message::HistoryFetched(tag, result),
        )
    }

    fn report_watchlist_error(&mut self, error: watchlist::Error) {
        log::warn!("Watchlist action failed: {error}");
        self.notice = Some(InternalError::Watchlist(error.to_string()).to_string());
    }

    fn save_state(&self) {
        data::save_state(&data::State {
            api_base: self.saved_api_base.clone(),
            tickers_input: self.tickers_input.clone(),
            period: self.period,
            active_watchlist: self.active_watchlist.clone(),
            scale_mode: self.chart.scale_mode(),
        });
    }
}
