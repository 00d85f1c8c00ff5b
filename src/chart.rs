use crate::style;
use data::ScaleMode;
use data::chart::geometry::LineGeometry;
use data::chart::interaction::{self, Hover};
use data::chart::{ChartSession, Geometry, GeometryBuilder, Margins};
use data::util::fmt_price;
use exchange::{History, Period};

use iced::theme::palette::Extended;
use iced::widget::canvas::{self, Cache, Canvas, Event, Frame, Path, Stroke};
use iced::{Alignment, Color, Element, Length, Point, Rectangle, Renderer, Size, Theme, mouse};

const TEXT_SIZE: f32 = 11.0;
const VALUE_TICKS: usize = 5;
const INDEX_TICKS: usize = 5;
const MARGINS: Margins = Margins {
    top: 12.0,
    right: 72.0,
    bottom: 28.0,
    left: 12.0,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Failed(String),
}

/// The chart pane: the loaded session plus the render caches
#[derive(Default)]
pub struct PriceChart {
    session: ChartSession,
    scale_mode: ScaleMode,
    status: Status,
    cache: Cache,
}

impl PriceChart {
    pub fn new(scale_mode: ScaleMode) -> Self {
        Self {
            scale_mode,
            ..Self::default()
        }
    }

    pub fn session(&self) -> &ChartSession {
        &self.session
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.scale_mode
    }

    pub fn set_scale_mode(&mut self, mode: ScaleMode) {
        if self.scale_mode != mode {
            self.scale_mode = mode;
            self.cache.clear();
        }
    }

    pub fn set_loading(&mut self) {
        self.status = Status::Loading;
        self.cache.clear();
    }

    pub fn load(&mut self, ticker: &str, period: Period, history: History) {
        self.session.load(ticker, period, history);
        self.status = Status::Idle;
        self.cache.clear();
    }

    /// Keeps the previous series and header, only the status changes
    pub fn fail(&mut self, reason: String) {
        self.status = Status::Failed(reason);
        self.cache.clear();
    }

    pub fn view<'a, Message: 'a>(&'a self) -> Element<'a, Message> {
        Canvas::new(self)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn geometry(&self, size: Size) -> Geometry {
        let label_chars = self
            .session
            .series()
            .last()
            .map_or(8, |p| fmt_price(p.close).chars().count());
        let (label_width, label_height) = text_box(label_chars);

        self.session.geometry(
            GeometryBuilder::new(f64::from(size.width), f64::from(size.height), MARGINS)
                .scale_mode(self.scale_mode)
                .value_ticks(VALUE_TICKS)
                .index_ticks(INDEX_TICKS)
                .label_size(f64::from(label_width), f64::from(label_height)),
        )
    }
}

impl<Message> canvas::Program<Message> for PriceChart {
    type State = ();

    fn update(
        &self,
        _state: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        match event {
            Event::Mouse(mouse::Event::CursorMoved { .. } | mouse::Event::CursorLeft) => {
                if cursor.is_over(bounds) || matches!(event, Event::Mouse(mouse::Event::CursorLeft))
                {
                    Some(canvas::Action::request_redraw())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let size = bounds.size();
        if size.width <= 0.0 || size.height <= 0.0 {
            return vec![];
        }

        let palette = theme.extended_palette();
        let geometry = self.geometry(size);

        let main = self.cache.draw(renderer, size, |frame| match &geometry {
            Geometry::NoData => {
                let message = match &self.status {
                    Status::Failed(_) => "Error loading chart",
                    Status::Loading => "Loading...",
                    Status::Idle => "No data",
                };
                draw_placeholder(frame, palette, message, matches!(self.status, Status::Failed(_)));
            }
            Geometry::Line(line) => {
                draw_grid(frame, palette, line);
                draw_series(frame, palette, line);
                draw_last_label(frame, palette, line);

                if let Status::Failed(_) = self.status {
                    draw_stale_badge(frame, palette, line);
                }
            }
        });

        let mut overlay = Frame::new(renderer, size);
        if let (Geometry::Line(line), Some(position)) = (&geometry, cursor.position_in(bounds))
            && let Some(hover) =
                interaction::hover(f64::from(position.x), line, self.session.period())
        {
            draw_crosshair(&mut overlay, theme, line, &hover);
        }

        vec![main, overlay.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) && self.session.series().is_drawable() {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}

/// Rough box around a monospace label of `chars` characters
fn text_box(chars: usize) -> (f32, f32) {
    (chars as f32 * TEXT_SIZE * 0.6 + 12.0, TEXT_SIZE * 1.2 + 8.0)
}

fn point(x: f64, y: f64) -> Point {
    Point::new(x as f32, y as f32)
}

fn polyline(points: &[(f64, f64)], close: bool) -> Path {
    Path::new(|builder| {
        let mut iter = points.iter();
        if let Some(&(x, y)) = iter.next() {
            builder.move_to(point(x, y));
            for &(x, y) in iter {
                builder.line_to(point(x, y));
            }
            if close {
                builder.close();
            }
        }
    })
}

fn trend_color(palette: &Extended, line: &LineGeometry) -> Color {
    match (line.points.first(), line.points.last()) {
        (Some(first), Some(last)) if last.price < first.price => palette.danger.base.color,
        _ => palette.success.base.color,
    }
}

fn label(content: String, position: Point, color: Color, align_x: Alignment) -> canvas::Text {
    canvas::Text {
        content,
        position,
        color,
        size: iced::Pixels(TEXT_SIZE),
        align_x: align_x.into(),
        align_y: Alignment::Center.into(),
        font: style::MONO,
        ..Default::default()
    }
}

fn draw_placeholder(frame: &mut Frame, palette: &Extended, message: &str, is_error: bool) {
    let color = if is_error {
        palette.danger.base.color
    } else {
        palette.background.strong.text
    };

    frame.fill_text(label(
        message.to_string(),
        frame.center(),
        color,
        Alignment::Center,
    ));
}

fn draw_grid(frame: &mut Frame, palette: &Extended, line: &LineGeometry) {
    let stroke = style::grid_line(palette);
    let text_color = palette.background.base.text.scale_alpha(0.7);
    let plot = line.plot;

    for tick in &line.value_ticks {
        frame.stroke(
            &Path::line(point(plot.left, tick.position), point(plot.right(), tick.position)),
            stroke,
        );
        frame.fill_text(label(
            tick.label.clone(),
            point(plot.right() + 6.0, tick.position),
            text_color,
            Alignment::Start,
        ));
    }

    let label_y = plot.bottom() + MARGINS.bottom / 2.0;
    let last = line.index_ticks.len().saturating_sub(1);

    for (i, tick) in line.index_ticks.iter().enumerate() {
        frame.stroke(
            &Path::line(point(tick.position, plot.top), point(tick.position, plot.bottom())),
            stroke,
        );

        let align = match i {
            0 => Alignment::Start,
            i if i == last => Alignment::End,
            _ => Alignment::Center,
        };
        frame.fill_text(label(
            tick.label.clone(),
            point(tick.position, label_y),
            text_color,
            align,
        ));
    }
}

fn draw_series(frame: &mut Frame, palette: &Extended, line: &LineGeometry) {
    let color = trend_color(palette, line);

    frame.fill(&polyline(&line.path.area, true), color.scale_alpha(0.12));
    frame.stroke(
        &polyline(&line.path.line, false),
        Stroke::with_color(
            Stroke {
                width: 1.5,
                ..Default::default()
            },
            color,
        ),
    );

    if let Some(last) = line.last_point() {
        frame.fill(&Path::circle(point(last.x, last.y), 3.0), color);
    }
}

fn draw_last_label(frame: &mut Frame, palette: &Extended, line: &LineGeometry) {
    let rect = &line.last_label;
    let color = trend_color(palette, line);

    frame.fill_rectangle(
        point(rect.x, rect.y),
        Size::new(rect.width as f32, rect.height as f32),
        color,
    );
    frame.fill_text(label(
        rect.text.clone(),
        point(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0),
        palette.background.base.color,
        Alignment::Center,
    ));
}

fn draw_stale_badge(frame: &mut Frame, palette: &Extended, line: &LineGeometry) {
    frame.fill_text(label(
        "Refresh failed, showing last data".to_string(),
        point(line.plot.left + 4.0, line.plot.top + TEXT_SIZE as f64),
        palette.danger.base.color,
        Alignment::Start,
    ));
}

fn draw_crosshair(frame: &mut Frame, theme: &Theme, line: &LineGeometry, hover: &Hover) {
    let palette = theme.extended_palette();
    let dashed = style::dashed_line(theme);
    let plot = line.plot;
    let p = hover.point;

    frame.stroke(&Path::line(point(p.x, plot.top), point(p.x, plot.bottom())), dashed);
    frame.stroke(&Path::line(point(plot.left, p.y), point(plot.right(), p.y)), dashed);
    frame.fill(&Path::circle(point(p.x, p.y), 4.0), trend_color(palette, line));

    let content = hover.label();
    let (width, height) = text_box(content.chars().count());

    let mut x = p.x as f32 + 10.0;
    if x + width > plot.right() as f32 {
        x = p.x as f32 - 10.0 - width;
    }
    let x = x.max(plot.left as f32);
    let y = plot.top as f32;

    frame.fill_rectangle(
        Point::new(x, y),
        Size::new(width, height),
        palette.background.weakest.color.scale_alpha(0.9),
    );
    frame.fill_text(label(
        content,
        Point::new(x + 6.0, y + height / 2.0),
        palette.background.base.text,
        Alignment::Start,
    ));
}
