use data::tickers_table::PriceChangeDirection;

use iced::theme::palette::Extended;
use iced::widget::canvas::{LineDash, Stroke};
use iced::widget::container::Style;
use iced::{Border, Color, Font, Theme};

pub const MONO: Font = Font::MONOSPACE;

pub fn panel(theme: &Theme) -> Style {
    let palette = theme.extended_palette();

    Style {
        background: Some(palette.background.weakest.color.scale_alpha(0.4).into()),
        border: Border {
            radius: 4.0.into(),
            width: 1.0,
            color: palette.background.strong.color,
        },
        ..Default::default()
    }
}

/// Gain/loss colour, `None` leaves the default text colour
pub fn change_color(palette: &Extended, direction: PriceChangeDirection) -> Option<Color> {
    match direction {
        PriceChangeDirection::Increased => Some(palette.success.strong.color),
        PriceChangeDirection::Decreased => Some(palette.danger.strong.color),
        PriceChangeDirection::Unchanged => None,
    }
}

pub fn change_text(theme: &Theme, direction: PriceChangeDirection) -> iced::widget::text::Style {
    iced::widget::text::Style {
        color: change_color(theme.extended_palette(), direction),
    }
}

pub fn error_text(theme: &Theme) -> iced::widget::text::Style {
    iced::widget::text::Style {
        color: Some(theme.extended_palette().danger.base.color),
    }
}

pub mod button {
    use iced::{
        Border, Theme,
        widget::button::{Status, Style},
    };

    pub fn transparent(theme: &Theme, status: Status, is_clicked: bool) -> Style {
        let palette = theme.extended_palette();

        Style {
            text_color: palette.background.base.text,
            border: Border {
                radius: 3.0.into(),
                ..Default::default()
            },
            background: match status {
                Status::Active => {
                    if is_clicked {
                        Some(palette.background.weak.color.into())
                    } else {
                        None
                    }
                }
                Status::Pressed => Some(palette.background.weak.color.into()),
                Status::Hovered => Some(palette.background.strong.color.into()),
                Status::Disabled => Some(palette.background.strong.color.into()),
            },
            ..Default::default()
        }
    }

    pub fn bordered_toggle(theme: &Theme, status: Status, is_active: bool) -> Style {
        let palette = theme.extended_palette();

        Style {
            text_color: palette.background.base.text,
            background: match (status, is_active) {
                (_, true) => Some(palette.primary.weak.color.scale_alpha(0.4).into()),
                (Status::Hovered, false) => Some(palette.background.strong.color.into()),
                _ => None,
            },
            border: Border {
                radius: 3.0.into(),
                width: 1.0,
                color: if is_active {
                    palette.primary.base.color
                } else {
                    palette.background.strong.color
                },
            },
            ..Default::default()
        }
    }
}

/// Crosshair stroke
pub fn dashed_line(theme: &'_ Theme) -> Stroke<'_> {
    dashed_line_from_palette(theme.extended_palette())
}

pub fn dashed_line_from_palette(palette: &'_ Extended) -> Stroke<'_> {
    Stroke::with_color(
        Stroke {
            width: 1.0,
            line_dash: LineDash {
                segments: &[4.0, 4.0],
                offset: 8,
            },
            ..Default::default()
        },
        palette
            .secondary
            .strong
            .color
            .scale_alpha(if palette.is_dark { 0.8 } else { 1.0 }),
    )
}

pub fn grid_line(palette: &Extended) -> Stroke<'static> {
    Stroke::with_color(
        Stroke {
            width: 1.0,
            ..Default::default()
        },
        palette.background.strong.color.scale_alpha(0.25),
    )
}
