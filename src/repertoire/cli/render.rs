//! Terminal rendering for command results.
//!
//! Every `render_*` function returns a `String` so the layout can be tested
//! without a terminal. Colors come from `colored`, which turns itself off
//! when stdout is not a tty or `NO_COLOR` is set.

use chrono::{DateTime, Utc};
use colored::Colorize;
use repertoire::commands::helpers::movetext;
use repertoire::commands::{CmdMessage, ListedOpening, MessageLevel, StoreStatus};
use repertoire::facets::Facets;
use repertoire::model::Color;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 16;
const SIDE_WIDTH: usize = 8;

pub fn print_messages(messages: &[CmdMessage]) {
    print!("{}", render_messages(messages));
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    let mut output = String::new();
    for message in messages {
        let line = match message.level {
            MessageLevel::Info => message.content.dimmed(),
            MessageLevel::Success => message.content.green(),
            MessageLevel::Warning => message.content.yellow(),
            MessageLevel::Error => message.content.red(),
        };
        output.push_str(&format!("{}\n", line));
    }
    output
}

fn side_label(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

/// One line per opening: key and category on the left, side and review
/// state on the right.
pub fn render_opening_list(openings: &[ListedOpening], now: DateTime<Utc>) -> String {
    let mut output = String::new();

    for (i, listed) in openings.iter().enumerate() {
        let record = &listed.record;
        let idx_str = format!("{:>3}. ", i + 1);

        let label = format!("{}  {}", listed.key, record.category);
        let fixed_width = idx_str.width() + SIDE_WIDTH + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let label_display = truncate_to_width(&label, available);
        let padding = available.saturating_sub(label_display.width());

        let state = if listed.due {
            format!("{:>width$}", "due", width = TIME_WIDTH).yellow()
        } else {
            match record.last_reviewed {
                Some(at) => format_time_ago(at, now).dimmed(),
                None => format!("{:>width$}", "", width = TIME_WIDTH).normal(),
            }
        };

        output.push_str(&format!(
            "{}{}{}{:>side$}{}\n",
            idx_str.dimmed(),
            label_display,
            " ".repeat(padding),
            side_label(record.playing_as),
            state,
            side = SIDE_WIDTH
        ));
    }

    output
}

pub fn render_full_openings(openings: &[ListedOpening]) -> String {
    let mut output = String::new();

    for (i, listed) in openings.iter().enumerate() {
        let record = &listed.record;
        if i > 0 {
            output.push_str("\n================================\n\n");
        }
        output.push_str(&format!("{}\n", record.name.bold()));
        output.push_str("--------------------------------\n");
        output.push_str(&format!("Key:         {}\n", listed.key));
        output.push_str(&format!("Category:    {}\n", record.category));
        output.push_str(&format!("Playing as:  {}\n", side_label(record.playing_as)));
        output.push_str(&format!("Moves:       {}\n", movetext(&record.moves)));
        output.push_str(&format!("Reviews:     {}\n", record.review_count));
        output.push_str(&format!("Difficulty:  {:.2}\n", record.difficulty));
        let next = match record.next_review {
            Some(at) if !listed.due => at.format("%Y-%m-%d %H:%M").to_string(),
            _ => "due now".yellow().to_string(),
        };
        output.push_str(&format!("Next review: {}\n", next));
        if let Some(fen) = &record.fen {
            output.push_str(&format!("Final FEN:   {}\n", fen.dimmed()));
        }
    }

    output
}

pub fn render_facets(facets: &Facets) -> String {
    fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
        let joined = items.collect::<Vec<_>>().join(", ");
        if joined.is_empty() {
            "-".to_string()
        } else {
            joined
        }
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{} {}\n",
        "Colors:     ".bold(),
        join(facets.colors.iter().map(|c| side_label(*c)))
    ));
    output.push_str(&format!(
        "{} {}\n",
        "Categories: ".bold(),
        join(facets.categories.iter().map(String::as_str))
    ));
    output.push_str(&format!(
        "{} {}\n",
        "First moves:".bold(),
        join(facets.first_moves.iter().map(String::as_str))
    ));
    output
}

pub fn render_status(status: &StoreStatus) -> String {
    let due = if status.due > 0 {
        status.due.to_string().yellow()
    } else {
        status.due.to_string().green()
    };
    let usage = format!("{:.1}%", status.quota.percent());
    let usage = if status.quota.is_warning() {
        usage.red()
    } else {
        usage.normal()
    };

    format!(
        "Openings: {}\nDue now:  {}\nStorage:  {} of {} KiB ({})\n",
        status.total,
        due,
        status.quota.used_bytes / 1024,
        status.quota.limit_bytes / 1024,
        usage
    )
}

pub fn render_text_list(lines: &[String], empty_message: &str) -> String {
    if lines.is_empty() {
        return format!("{}\n", empty_message);
    }
    lines.iter().map(|l| format!("{}\n", l)).collect()
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(timestamp);
    let time_str = Formatter::new().convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use repertoire::model::OpeningRecord;
    use repertoire::store::openings::QuotaStatus;

    fn listed(key: &str, color: Color, moves: &str, due: bool) -> ListedOpening {
        let moves = moves.split_whitespace().map(str::to_string).collect();
        let record = OpeningRecord::new(key, Some("Open Games".into()), color, moves).unwrap();
        ListedOpening {
            key: key.to_string(),
            record,
            due,
        }
    }

    #[test]
    fn empty_text_list_shows_placeholder() {
        assert_eq!(render_text_list(&[], "Nothing here."), "Nothing here.\n");
    }

    #[test]
    fn list_rows_carry_key_side_and_due_marker() {
        let rows = vec![
            listed("Italian", Color::White, "e4 e5 Nf3", true),
            listed("Caro-Kann", Color::Black, "e4 c6", false),
        ];
        let output = render_opening_list(&rows, Utc::now());
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Italian"));
        assert!(lines[0].contains("Open Games"));
        assert!(lines[0].contains("white"));
        assert!(lines[0].contains("due"));
        assert!(lines[1].contains("black"));
        assert!(!lines[1].contains("due"));
    }

    #[test]
    fn long_labels_are_truncated() {
        let long = "x".repeat(200);
        let output = render_opening_list(&[listed(&long, Color::White, "e4", true)], Utc::now());
        assert!(output.contains('…'));
        assert!(!output.contains(&long));
    }

    #[test]
    fn reviewed_lines_show_time_ago() {
        let now = Utc::now();
        let mut row = listed("London", Color::White, "d4 d5 Bf4", false);
        row.record.last_reviewed = Some(now - Duration::days(3));
        let output = render_opening_list(&[row], now);
        assert!(output.contains("3 days ago"));
    }

    #[test]
    fn full_view_numbers_moves() {
        let output = render_full_openings(&[listed("Italian", Color::White, "e4 e5 Nf3", false)]);
        assert!(output.contains("1. e4 e5 2. Nf3"));
        assert!(output.contains("Playing as:  white"));
    }

    #[test]
    fn facets_show_placeholder_when_empty() {
        let output = render_facets(&Facets::default());
        assert_eq!(output.matches(" -\n").count(), 3);
    }

    #[test]
    fn status_reports_counts() {
        let status = StoreStatus {
            total: 4,
            due: 1,
            quota: QuotaStatus {
                used_bytes: 2048,
                limit_bytes: 5 * 1024 * 1024,
            },
        };
        let output = render_status(&status);
        assert!(output.contains("Openings: 4"));
        assert!(output.contains("2 of 5120 KiB"));
    }
}
