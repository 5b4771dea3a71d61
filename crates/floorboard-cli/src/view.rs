//! Feed layout for the terminal
//!
//! One line per message plus a heading whenever the day changes. The line
//! count is the scroll container's content height.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use floorboard_client::ScrollMetrics;
use floorboard_client::format::{day_label, time_label};
use floorboard_core::{Message, PrincipalId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedLine {
    Day(String),
    Message {
        time: String,
        author: String,
        text: String,
        own: bool,
    },
}

/// Lay out `messages` (oldest first) relative to `now`
pub fn feed_lines<Tz>(messages: &[Message], me: Option<&PrincipalId>, now: &DateTime<Tz>) -> Vec<FeedLine>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let tz = now.timezone();
    let mut lines = Vec::with_capacity(messages.len() + 4);
    let mut last_day: Option<String> = None;

    for message in messages {
        let at = message.created_at.with_timezone(&tz);
        let day = day_label(&at, now);
        if last_day.as_deref() != Some(day.as_str()) {
            lines.push(FeedLine::Day(day.clone()));
            last_day = Some(day);
        }
        lines.push(FeedLine::Message {
            time: time_label(&at),
            author: message.author_label.clone(),
            text: message.text.clone(),
            own: me == Some(&message.author_id),
        });
    }
    lines
}

/// The lines inside the viewport
pub fn visible(lines: &[FeedLine], metrics: Option<ScrollMetrics>) -> &[FeedLine] {
    let Some(metrics) = metrics else {
        return lines;
    };
    let start = (metrics.scroll_top.max(0.0) as usize).min(lines.len());
    let end = start
        .saturating_add(metrics.client_height.max(0.0) as usize)
        .min(lines.len());
    &lines[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use floorboard_core::{Floor, MessageId};

    fn message(id: &str, author: &str, day: u32, hour: u32) -> Message {
        Message {
            id: MessageId::new(id),
            floor: Floor::new(3),
            text: format!("text {}", id),
            author_id: PrincipalId::new(author),
            author_label: author.to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_day_headings_between_days() {
        let now = Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap();
        let messages = vec![
            message("1", "ana", 1, 9),
            message("2", "bo", 1, 15),
            message("3", "ana", 20, 8),
        ];
        let lines = feed_lines(&messages, Some(&PrincipalId::new("ana")), &now);

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], FeedLine::Day("Jan 1".to_string()));
        assert!(matches!(&lines[1], FeedLine::Message { own: true, time, .. } if time == "9:00 AM"));
        assert!(matches!(&lines[2], FeedLine::Message { own: false, .. }));
        assert_eq!(lines[3], FeedLine::Day("Today".to_string()));
    }

    #[test]
    fn test_visible_window() {
        let lines: Vec<_> = (0..10).map(|i| FeedLine::Day(i.to_string())).collect();
        let metrics = ScrollMetrics {
            scroll_top: 6.0,
            scroll_height: 10.0,
            client_height: 4.0,
        };
        assert_eq!(visible(&lines, Some(metrics)), &lines[6..10]);
        assert_eq!(visible(&lines, None).len(), 10);
        assert!(visible(&[], Some(metrics)).is_empty());
    }

    #[test]
    fn test_visible_window_taller_than_any_feed() {
        let lines: Vec<_> = (0..10).map(|i| FeedLine::Day(i.to_string())).collect();
        let metrics = ScrollMetrics {
            scroll_top: 3.0,
            scroll_height: 10.0,
            client_height: f64::MAX,
        };
        assert_eq!(visible(&lines, Some(metrics)), &lines[3..10]);
    }
}
