//! Render targets for a [`MonthView`].
//!
//! A target receives the matching records as key/value pairs and the calendar grid, and
//! produces its own output. Two targets ship with the core: plain text for terminals and an
//! HTML fragment for browsers. In the fragment flagged cells only carry a `flagged` class;
//! [`month_page`] wraps it in a page that styles them.

use crate::{CalendarDay, CalendarGrid, MonthView};
use case_types::CaseRecord;
use chrono::{Datelike, Month};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::fmt::Write as _;

pub trait RenderTarget {
    type Output;

    fn records(&mut self, records: &[CaseRecord]);
    fn calendar(&mut self, grid: &CalendarGrid);
    fn finish(self) -> Self::Output;
}

/// Feeds a month view through `target`: records first, then the calendar.
pub fn render_month<R: RenderTarget>(view: &MonthView, mut target: R) -> R::Output {
    target.records(&view.records);
    target.calendar(&view.grid);
    target.finish()
}

fn month_title(grid: &CalendarGrid) -> String {
    let name = u8::try_from(grid.month())
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| format!("{:02}", grid.month()));
    format!("{} {}", name, grid.year())
}

#[derive(Debug, Default)]
pub struct TextRenderer {
    out: String,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTarget for TextRenderer {
    type Output = String;

    fn records(&mut self, records: &[CaseRecord]) {
        if records.is_empty() {
            self.out.push_str("No cases this month.\n");
        }
        for (i, record) in records.iter().enumerate() {
            let _ = writeln!(self.out, "[{}]", i + 1);
            for (name, value) in record.iter() {
                let _ = writeln!(self.out, "  {name}: {value}");
            }
        }
        self.out.push('\n');
    }

    // Flagged days are marked with `*`.
    fn calendar(&mut self, grid: &CalendarGrid) {
        let _ = writeln!(self.out, "{:^28}", month_title(grid));
        for weekday in grid.weekday_headers() {
            let label = weekday.to_string();
            let _ = write!(self.out, " {:<3}", &label[..2]);
        }
        self.out.push('\n');

        for week in grid.weeks() {
            for day in week {
                if !day.in_month {
                    self.out.push_str("    ");
                } else {
                    let mark = if day.flagged { '*' } else { ' ' };
                    let _ = write!(self.out, " {:>2}{}", day.date.day(), mark);
                }
            }
            let trimmed = self.out.trim_end_matches(' ').len();
            self.out.truncate(trimmed);
            self.out.push('\n');
        }
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Builds the month as HTML: one table per record, then the calendar table.
///
/// Field names and values are escaped by `maud`.
#[derive(Debug, Default)]
pub struct HtmlRenderer {
    parts: Vec<Markup>,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderTarget for HtmlRenderer {
    type Output = Markup;

    fn records(&mut self, records: &[CaseRecord]) {
        self.parts.push(html! {
            section.cases {
                @for record in records {
                    table.case {
                        @for (name, value) in record.iter() {
                            tr {
                                th { (name) }
                                td { (value.to_string()) }
                            }
                        }
                    }
                }
            }
        });
    }

    fn calendar(&mut self, grid: &CalendarGrid) {
        self.parts.push(html! {
            table border="0" cellpadding="0" cellspacing="0" class="month" {
                tr {
                    th colspan="7" class="month" { (month_title(grid)) }
                }
                tr {
                    @for weekday in grid.weekday_headers() {
                        @let label = weekday.to_string();
                        th class=(label.to_lowercase()) { (label) }
                    }
                }
                @for week in grid.weeks() {
                    tr {
                        @for day in week {
                            @if day.in_month {
                                td class=(day_class(day)) { (day.date.day()) }
                            } @else {
                                td.noday { (PreEscaped("&nbsp;")) }
                            }
                        }
                    }
                }
            }
        });
    }

    fn finish(self) -> Markup {
        html! {
            @for part in &self.parts {
                (part)
            }
        }
    }
}

fn day_class(day: &CalendarDay) -> String {
    let weekday = day.date.weekday().to_string().to_lowercase();
    if day.flagged {
        format!("{weekday} flagged")
    } else {
        weekday
    }
}

const PAGE_STYLE: &str = "td.flagged { background-color: lightgreen; }";

/// A standalone HTML page for the month, with flagged days highlighted.
pub fn month_page(view: &MonthView) -> Markup {
    let title = format!("Cases {}-{:02}", view.year, view.month);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (PreEscaped(PAGE_STYLE)) }
            }
            body {
                h1 { (title) }
                (render_month(view, HtmlRenderer::new()))
            }
        }
    }
}
