/// Date and time token extraction.
///
/// A date token is the configured trigger immediately followed by a value
/// wrapped in `{...}` or `[[...]]`; a time token is the time trigger
/// followed by `{...}`. Values are parsed strictly against the configured
/// formats; an unparsable value is not a match, the text is left alone
/// (better to under-extract than to corrupt the document).
use std::ops::Range;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

use super::at_token_boundary;
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub date_str: String,
    /// A time token directly adjacent to the date is captured with it.
    pub time: Option<NaiveTime>,
    pub time_str: Option<String>,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeMatch {
    pub time: NaiveTime,
    pub time_str: String,
    pub span: Range<usize>,
}

fn date_token_regex(trigger: &str) -> Regex {
    let escaped = regex::escape(trigger);
    Regex::new(&format!(
        r"{escaped}(?:\{{([^{{}}\n]+)\}}|\[\[([^\[\]\n]+)\]\])"
    ))
    .expect("valid date token regex")
}

fn time_token_regex(trigger: &str, anchored: bool) -> Regex {
    let escaped = regex::escape(trigger);
    let prefix = if anchored { r"^ ?" } else { "" };
    Regex::new(&format!(r"{prefix}{escaped}\{{([^{{}}\n]+)\}}"))
        .expect("valid time token regex")
}

/// First date token that parses under the configured format. Folds in a
/// directly adjacent time token when present.
pub fn extract_date(text: &str, settings: &Settings) -> Option<DateMatch> {
    let date_re = date_token_regex(&settings.date_trigger);
    let date_format = settings.chrono_date_format();

    for caps in date_re.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        if !at_token_boundary(text, whole.start()) {
            continue;
        }
        let value = caps
            .get(1)
            .or_else(|| caps.get(2))
            .expect("one alternative always captures");
        let Ok(date) = NaiveDate::parse_from_str(value.as_str(), &date_format) else {
            continue;
        };

        let mut span = whole.range();
        let mut time = None;
        let mut time_str = None;
        let adjacent_re = time_token_regex(&settings.time_trigger, true);
        if let Some(time_caps) = adjacent_re.captures(&text[span.end..]) {
            let raw = time_caps.get(1).expect("time value capture");
            if let Ok(parsed) =
                NaiveTime::parse_from_str(raw.as_str(), &settings.chrono_time_format())
            {
                time = Some(parsed);
                time_str = Some(raw.as_str().to_string());
                span.end += time_caps.get(0).expect("capture 0").end();
            }
        }

        return Some(DateMatch {
            date,
            date_str: value.as_str().to_string(),
            time,
            time_str,
            span,
        });
    }
    None
}

/// First standalone time token that parses under the configured format.
pub fn extract_time(text: &str, settings: &Settings) -> Option<TimeMatch> {
    let time_re = time_token_regex(&settings.time_trigger, false);
    let time_format = settings.chrono_time_format();

    for caps in time_re.captures_iter(text) {
        let whole = caps.get(0).expect("capture 0 always present");
        if !at_token_boundary(text, whole.start()) {
            continue;
        }
        let raw = caps.get(1).expect("time value capture");
        let Ok(time) = NaiveTime::parse_from_str(raw.as_str(), &time_format) else {
            continue;
        };
        return Some(TimeMatch {
            time,
            time_str: raw.as_str().to_string(),
            span: whole.range(),
        });
    }
    None
}
