//! Review annotations embedded in PGN comments
//!
//! The schedule of a move lives inside the comment of the node it reaches, as
//! two independent command tags in the style of `[%clk ...]`:
//!
//! ```text
//! { [%review 2023-01-01T12:10:00+00:00] [%interval 0+1:00] }
//! ```
//!
//! - `[%review <ISO-8601>]` - due-time
//! - `[%interval <days>+<hours>:<minutes>]` - interval, seconds dropped,
//!   minutes zero-padded
//!
//! This module is the only place that looks at comment text. Everything
//! else goes through [`ReviewAnnotation`].
//!
//! # Editing Rules
//!
//! - Setting a tag that is present replaces the first occurrence in place,
//!   keeping at most one whitespace character on either side of it.
//! - Setting a tag that is absent appends it, separated by a space unless
//!   the comment is empty or already ends in a space or newline.
//! - Clearing a tag removes it together with the whitespace it leaves
//!   dangling, so `"a [%review x] b"` becomes `"a b"`.

use std::ops::Range;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

const SECONDS_PER_DAY: i64 = 24 * 3600;

/// Parsed schedule of one node
///
/// A projection of the comment text, never stored on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewAnnotation {
    pub due: Option<DateTime<Utc>>,
    pub interval: Option<TimeDelta>,
}

impl ReviewAnnotation {
    /// Read both tags from a comment; each one decodes independently
    pub fn decode(comment: &str) -> Self {
        Self {
            due: due_time(comment),
            interval: interval(comment),
        }
    }

    /// Write both tags into a comment, adding, replacing or removing as needed
    pub fn encode_into(&self, comment: &mut String) {
        set_due_time(comment, self.due);
        set_interval(comment, self.interval);
    }

    pub fn is_empty(&self) -> bool {
        self.due.is_none() && self.interval.is_none()
    }
}

/// Due-time tag, if present and well formed
pub fn due_time(comment: &str) -> Option<DateTime<Utc>> {
    let found = Tag::Review.find(comment)?;
    DateTime::parse_from_rfc3339(&comment[found.body])
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Interval tag, if present
pub fn interval(comment: &str) -> Option<TimeDelta> {
    let found = Tag::Interval.find(comment)?;
    let (days, hours, minutes) = split_interval(&comment[found.body])?;
    let days: u32 = days.parse().ok()?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    Some(
        TimeDelta::days(i64::from(days))
            + TimeDelta::hours(i64::from(hours))
            + TimeDelta::minutes(i64::from(minutes)),
    )
}

/// Set or clear the due-time tag
pub fn set_due_time(comment: &mut String, due: Option<DateTime<Utc>>) {
    let text = due.map(|dt| {
        format!(
            "{} {}]",
            Tag::Review.opener(),
            dt.to_rfc3339_opts(SecondsFormat::Secs, false)
        )
    });
    Tag::Review.set(comment, text);
}

/// Set or clear the interval tag
pub fn set_interval(comment: &mut String, interval: Option<TimeDelta>) {
    let text = interval.map(|interval| format!("{} {}]", Tag::Interval.opener(), format_interval(interval)));
    Tag::Interval.set(comment, text);
}

/// `<days>+<hours>:<minutes>` with seconds truncated
pub fn format_interval(interval: TimeDelta) -> String {
    let total = interval.num_seconds();
    let days = total.div_euclid(SECONDS_PER_DAY);
    let rest = total.rem_euclid(SECONDS_PER_DAY);
    format!("{}+{}:{:02}", days, rest / 3600, rest % 3600 / 60)
}

fn split_interval(body: &str) -> Option<(&str, &str, &str)> {
    let (days, clock) = body.split_once('+')?;
    let (hours, minutes) = clock.split_once(':')?;
    let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    (all_digits(days) && all_digits(hours) && all_digits(minutes)).then_some((days, hours, minutes))
}

#[derive(Debug, Clone, Copy)]
enum Tag {
    Review,
    Interval,
}

/// Location of a tag occurrence inside a comment
struct Found {
    /// Whole match, including the optional surrounding whitespace
    span: Range<usize>,
    /// Whitespace character before the tag, possibly empty
    prefix: Range<usize>,
    /// Whitespace character after the tag, possibly empty
    suffix: Range<usize>,
    body: Range<usize>,
}

impl Tag {
    fn opener(self) -> &'static str {
        match self {
            Tag::Review => "[%review",
            Tag::Interval => "[%interval",
        }
    }

    fn accepts(self, body: &str) -> bool {
        match self {
            Tag::Review => !body.is_empty(),
            Tag::Interval => split_interval(body).is_some(),
        }
    }

    /// First well-formed occurrence of the tag
    fn find(self, comment: &str) -> Option<Found> {
        let opener = self.opener();
        for (start, _) in comment.match_indices(opener) {
            let after_opener = start + opener.len();
            let Some(separator) = comment[after_opener..].chars().next() else {
                continue;
            };
            if !separator.is_whitespace() {
                continue;
            }
            let body_start = after_opener + separator.len_utf8();
            let Some(body_len) = comment[body_start..].find(']') else {
                continue;
            };
            let body = body_start..body_start + body_len;
            if !self.accepts(&comment[body.clone()]) {
                continue;
            }
            let tag_end = body.end + 1;

            let prefix_start = comment[..start]
                .chars()
                .next_back()
                .filter(|c| c.is_whitespace())
                .map_or(start, |c| start - c.len_utf8());
            let suffix_end = comment[tag_end..]
                .chars()
                .next()
                .filter(|c| c.is_whitespace())
                .map_or(tag_end, |c| tag_end + c.len_utf8());

            return Some(Found {
                span: prefix_start..suffix_end,
                prefix: prefix_start..start,
                suffix: tag_end..suffix_end,
                body,
            });
        }
        None
    }

    fn set(self, comment: &mut String, text: Option<String>) {
        match (self.find(comment), text) {
            (Some(found), Some(text)) => {
                let replacement = format!(
                    "{}{}{}",
                    &comment[found.prefix.clone()],
                    text,
                    &comment[found.suffix.clone()]
                );
                comment.replace_range(found.span, &replacement);
            }
            (Some(found), None) => {
                let replacement = if found.prefix.is_empty() {
                    String::new()
                } else {
                    comment[found.suffix.clone()].to_string()
                };
                comment.replace_range(found.span, &replacement);
            }
            (None, Some(text)) => {
                if !comment.is_empty() && !comment.ends_with(' ') && !comment.ends_with('\n') {
                    comment.push(' ');
                }
                comment.push_str(&text);
            }
            (None, None) => {}
        }
    }
}
