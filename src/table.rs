use crate::style;
use data::chart::geometry::sparkline;
use data::tickers_table::{Column, PriceChangeDirection, TickersTable};
use exchange::RowRecord;

use iced::widget::canvas::{self, Canvas, Path, Stroke};
use iced::widget::{button, column, container, row, scrollable, text};
use iced::{Element, Length, Point, Rectangle, Renderer, Theme, mouse};

const CELL_WIDTH: f32 = 88.0;
const SPARK_WIDTH: f32 = 96.0;
const ROW_HEIGHT: f32 = 26.0;

#[derive(Debug, Clone)]
pub enum Message {
    SortBy(Column),
    TickerSelected(String),
}

pub fn view<'a>(table: &'a TickersTable, selected: Option<&'a str>) -> Element<'a, Message> {
    if table.is_empty() {
        return container(text("No rows loaded"))
            .padding(12)
            .width(Length::Fill)
            .into();
    }

    let header = row(Column::ALL.iter().map(|&col| {
        let label = match table.sort_indicator(col) {
            Some(arrow) => format!("{} {arrow}", col.label()),
            None => col.label().to_string(),
        };
        let is_sorted = table.sort_indicator(col).is_some();

        button(text(label).size(12))
            .width(CELL_WIDTH)
            .style(move |theme, status| style::button::transparent(theme, status, is_sorted))
            .on_press(Message::SortBy(col))
            .into()
    }))
    .push(container(text("Trend").size(12)).width(SPARK_WIDTH).padding([5, 10]));

    let rows = column(
        table
            .current_view()
            .iter()
            .map(|record| table_row(record, selected)),
    );

    column![header, scrollable(rows).height(Length::Fill)]
        .spacing(4)
        .into()
}

fn table_row<'a>(record: &'a RowRecord, selected: Option<&str>) -> Element<'a, Message> {
    let ticker = record.ticker().unwrap_or_default();
    let is_selected = selected.is_some_and(|s| s == ticker);

    let cells = row(Column::ALL.iter().map(|&col| {
        let direction = col.direction(record);

        container(
            text(col.cell(record))
                .size(12)
                .font(style::MONO)
                .style(move |theme: &Theme| style::change_text(theme, direction)),
        )
        .width(CELL_WIDTH)
        .padding([5, 10])
        .into()
    }))
    .push(
        Canvas::new(Sparkline {
            values: record.spark(),
            direction: PriceChangeDirection::from_change(record.number(Column::WeeklyChange.key())),
        })
        .width(SPARK_WIDTH)
        .height(ROW_HEIGHT),
    );

    let content = button(cells)
        .padding(0)
        .style(move |theme, status| style::button::transparent(theme, status, is_selected));

    if ticker.is_empty() {
        content.into()
    } else {
        content
            .on_press(Message::TickerSelected(ticker.to_string()))
            .into()
    }
}

/// Recent closes drawn as a bare line inside a table cell
struct Sparkline<'a> {
    values: &'a [f64],
    direction: PriceChangeDirection,
}

impl<Message> canvas::Program<Message> for Sparkline<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let inset = 4.0;
        let path = sparkline(
            self.values,
            f64::from(bounds.width - inset * 2.0),
            f64::from(bounds.height - inset * 2.0),
        );
        if path.is_empty() {
            return vec![];
        }

        let palette = theme.extended_palette();
        let color = style::change_color(palette, self.direction)
            .unwrap_or(palette.background.strong.color);

        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let line = Path::new(|builder| {
            for (i, &(x, y)) in path.iter().enumerate() {
                let p = Point::new(x as f32 + inset, y as f32 + inset);
                if i == 0 {
                    builder.move_to(p);
                } else {
                    builder.line_to(p);
                }
            }
        });
        frame.stroke(
            &line,
            Stroke::with_color(
                Stroke {
                    width: 1.0,
                    ..Default::default()
                },
                color,
            ),
        );

        vec![frame.into_geometry()]
    }
}
