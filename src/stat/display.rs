use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const ISO_DATE: &str = "%Y-%m-%d";
const DISPLAY_DATE: &str = "%m/%d/%y";

pub fn display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE).to_string()
}

/// `YYYY-MM-DD` to `MM/DD/YY`. The date is a plain calendar date, so there is
/// no timezone to shift it; anything that does not parse comes back as is.
pub fn format_display_date(raw: &str) -> Cow<'_, str> {
    match NaiveDate::parse_from_str(raw, ISO_DATE) {
        Ok(date) => Cow::Owned(display_date(date)),
        Err(_) => Cow::Borrowed(raw),
    }
}

/// Colour families a shoe can be themed with. Free-text colours that do not
/// name one of these exactly fall back to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorKey {
    Black,
    White,
    Gray,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Brown,
    Other,
}

impl ColorKey {
    pub const ALL: [ColorKey; 12] = [
        ColorKey::Black,
        ColorKey::White,
        ColorKey::Gray,
        ColorKey::Red,
        ColorKey::Orange,
        ColorKey::Yellow,
        ColorKey::Green,
        ColorKey::Blue,
        ColorKey::Purple,
        ColorKey::Pink,
        ColorKey::Brown,
        ColorKey::Other,
    ];

    pub fn from_name(name: &str) -> ColorKey {
        match name.trim().to_ascii_lowercase().as_str() {
            "black" => ColorKey::Black,
            "white" => ColorKey::White,
            "gray" | "grey" => ColorKey::Gray,
            "red" => ColorKey::Red,
            "orange" => ColorKey::Orange,
            "yellow" => ColorKey::Yellow,
            "green" => ColorKey::Green,
            "blue" | "navy" => ColorKey::Blue,
            "purple" | "violet" => ColorKey::Purple,
            "pink" => ColorKey::Pink,
            "brown" | "tan" => ColorKey::Brown,
            _ => ColorKey::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ColorKey::Black => "black",
            ColorKey::White => "white",
            ColorKey::Gray => "gray",
            ColorKey::Red => "red",
            ColorKey::Orange => "orange",
            ColorKey::Yellow => "yellow",
            ColorKey::Green => "green",
            ColorKey::Blue => "blue",
            ColorKey::Purple => "purple",
            ColorKey::Pink => "pink",
            ColorKey::Brown => "brown",
            ColorKey::Other => "other",
        }
    }
}
