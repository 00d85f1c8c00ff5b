use chrono::{DateTime, Utc};
use exchange::Period;

/// Shown in place of any absent or unusable value
pub const PLACEHOLDER: &str = "—";

pub fn fmt_number(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_money(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() && v < 0.0 => format!("-${:.2}", v.abs()),
        Some(v) if v.is_finite() => format!("${:.2}", v),
        _ => PLACEHOLDER.to_string(),
    }
}

pub fn fmt_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Percentage with an explicit `+` for gains
pub fn pct_change(value: Option<f64>) -> String {
    match value {
        Some(c) if c.is_finite() && c > 0.0 => format!("+{:.2}%", c),
        Some(c) if c.is_finite() => format!("{:.2}%", c),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Axis label for a price, thousands separated with decimals shrinking as the
/// magnitude grows
pub fn format_with_commas(num: f64) -> String {
    if num == 0.0 {
        return "0".to_string();
    }

    let abs_num = num.abs();
    let decimals = match abs_num {
        n if n >= 1000.0 => 0,
        n if n >= 1.0 => 2,
        _ => 4,
    };

    let is_negative = num < 0.0;

    if abs_num < 1000.0 {
        return format!(
            "{}{:.*}",
            if is_negative { "-" } else { "" },
            decimals,
            abs_num
        );
    }

    let integer_part = format!("{:.0}", abs_num);

    format!(
        "{}{}",
        if is_negative { "-" } else { "" },
        group_thousands(&integer_part)
    )
}

/// Price readout with cents kept at every magnitude
pub fn fmt_price(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }

    let fixed = format!("{:.2}", value.abs());
    let (integer_part, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };

    format!("{sign}${}.{cents}", group_thousands(integer_part))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut result = String::with_capacity(len + len.saturating_sub(1) / 3);

    for (i, ch) in digits.chars().enumerate() {
        result.push(ch);

        let pos_from_right = len - i - 1;
        if pos_from_right > 0 && pos_from_right % 3 == 0 {
            result.push(',');
        }
    }

    result
}

/// Date label granularity that suits the span of a period
pub fn date_label(timestamp: DateTime<Utc>, period: Period) -> String {
    let fmt = match period {
        Period::D1 => "%H:%M",
        Period::W1 | Period::M1 | Period::M3 | Period::M6 | Period::Y1 => "%b %d",
        Period::Y5 => "%b %Y",
    };
    timestamp.format(fmt).to_string()
}

pub fn tooltip_date(timestamp: DateTime<Utc>, period: Period) -> String {
    if period.is_intraday() {
        timestamp.format("%b %d %H:%M").to_string()
    } else {
        timestamp.format("%Y-%m-%d").to_string()
    }
}
