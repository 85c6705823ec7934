//! ASCII timeline of a recorded history.
//!
//! One row per operation in start order, with a bar showing where the
//! operation's interval falls within the span of the whole history.

use std::fmt::{self, Write};

use chrono::Local;
use linear_kv_core::{History, OperationRecord, Timestamp};

/// Rendered when the history is empty.
pub const EMPTY_TIMELINE: &str = "No operations recorded yet.\n";

const BAR: char = '█';
const RULE_WIDTH: usize = 80;

/// Renders a history as a fixed-width text timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineRenderer {
    /// Number of cells the full span of the history is scaled onto.
    pub width: usize,
    /// Values longer than this many characters are truncated.
    pub value_width: usize,
}

impl Default for TimelineRenderer {
    fn default() -> Self {
        Self {
            width: 60,
            value_width: 8,
        }
    }
}

impl TimelineRenderer {
    /// Create a renderer with the default widths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of cells used for the bars.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Render the timeline as a string.
    pub fn render(&self, history: &History) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.render_to(history, &mut out);
        out
    }

    /// Render the timeline into any formatter sink.
    pub fn render_to<W: Write>(&self, history: &History, out: &mut W) -> fmt::Result {
        let Some(span) = history.span() else {
            return out.write_str(EMPTY_TIMELINE);
        };

        let total = span.duration();
        let earliest = span.start();

        writeln!(
            out,
            "Timeline Visualization ({:.2}ms total)",
            total.as_nanos() as f64 / 1e6
        )?;
        writeln!(
            out,
            "{:<20} {:<8} {:<10} {:<15} {}",
            "Time", "Op", "Key", "Value", "Timeline"
        )?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

        let total_nanos = total.as_nanos() as f64;
        for op in history.sorted_by_start() {
            let (start_pos, end_pos) = if total_nanos > 0.0 {
                let offset = |nanos: u128| (nanos as f64 / total_nanos * self.width as f64) as usize;
                (
                    offset(op.start().saturating_duration_since(earliest).as_nanos()),
                    offset(op.end().saturating_duration_since(earliest).as_nanos()),
                )
            } else {
                (0, 0)
            };
            let end_pos = end_pos.max(start_pos + 1);

            let bar: String = std::iter::repeat(' ')
                .take(start_pos)
                .chain(std::iter::repeat(BAR).take(end_pos - start_pos))
                .collect();

            writeln!(
                out,
                "{:<20} {:<8} {:<10} {:<15} {}",
                wall_clock(op.start()),
                op.kind.as_str(),
                op.key,
                self.truncate(op),
                bar
            )?;
        }

        Ok(())
    }

    fn truncate(&self, op: &OperationRecord) -> String {
        let value = op.value_str().unwrap_or_default();
        if value.chars().count() > self.value_width {
            let mut cut: String = value.chars().take(self.value_width).collect();
            cut.push_str("...");
            cut
        } else {
            value.to_owned()
        }
    }
}

/// `HH:MM:SS.mmm` in the local time zone of the rendering process.
fn wall_clock(ts: Timestamp) -> String {
    ts.to_datetime()
        .with_timezone(&Local)
        .format("%H:%M:%S%.3f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use linear_kv_core::{Interval, Outcome};

    fn iv(start: u64, end: u64) -> Interval {
        Interval::new(Timestamp::from_nanos(start), Timestamp::from_nanos(end)).unwrap()
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(
            TimelineRenderer::new().render(&History::new()),
            "No operations recorded yet.\n"
        );
    }

    #[test]
    fn test_layout() {
        let history = History::from_records(vec![
            OperationRecord::read("c1", "a", Some("averyverylongvalue".into()), iv(2_000_000, 4_000_000)),
            OperationRecord::write("r1", "a", "x", Outcome::Ok, iv(0, 1_000_000)),
        ]);

        let text = TimelineRenderer::new().render(&history);
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Timeline Visualization (4.00ms total)");
        assert!(lines[1].starts_with("Time                 Op       Key        Value           Timeline"));
        assert_eq!(lines[2], "-".repeat(80));

        // Rows are sorted by start, not by log order.
        assert!(lines[3].starts_with(&format!(
            "{:<20} PUT      a          x               ",
            wall_clock(Timestamp::from_nanos(0))
        )));
        assert!(lines[3].ends_with(&"█".repeat(15)));
        assert!(lines[4].contains("GET      a          averyver...     "));
        assert!(lines[4].ends_with(&format!("{}{}", " ".repeat(30), "█".repeat(30))));
    }

    #[test]
    fn test_row_time_is_local() {
        // 1_700_000_000.123456789s after the epoch.
        let ts = Timestamp::from_nanos(1_700_000_000_123_456_789);
        let local = Local.timestamp_nanos(1_700_000_000_123_456_789);

        let expected = format!(
            "{:02}:{:02}:{:02}.123",
            local.hour(),
            local.minute(),
            local.second()
        );
        assert_eq!(wall_clock(ts), expected);

        let history = History::from_records(vec![OperationRecord::write(
            "r1",
            "k",
            "v",
            Outcome::Ok,
            Interval::new(ts, ts).unwrap(),
        )]);
        let text = TimelineRenderer::new().render(&history);
        assert!(text.lines().nth(3).unwrap().starts_with(&expected));
    }

    #[test]
    fn test_instant_operations_get_one_cell() {
        let history = History::from_records(vec![OperationRecord::read(
            "",
            "k",
            None,
            iv(5, 5),
        )]);

        let text = TimelineRenderer::new().render(&history);
        assert!(text.starts_with("Timeline Visualization (0.00ms total)\n"));
        assert!(text.lines().last().unwrap().ends_with(" █"));
    }

    #[test]
    fn test_custom_width() {
        let history = History::from_records(vec![OperationRecord::write(
            "r1",
            "k",
            "v",
            Outcome::Ok,
            iv(0, 100),
        )]);

        let text = TimelineRenderer::new().with_width(10).render(&history);
        assert!(text.lines().last().unwrap().ends_with(&format!(" {}", "█".repeat(10))));
        assert_eq!(TimelineRenderer::new().with_width(0).width, 1);
    }
}
