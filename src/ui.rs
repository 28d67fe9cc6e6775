use crate::engine::{CounterHandle, CounterState};
use crate::report::ReportView;
use chrono::NaiveDate;
use std::fmt::Write;

/// Renders the quick-record panel: one line per tracked person.
pub fn render_board(date: NaiveDate, counters: &[(String, CounterHandle)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{date}");
    if counters.is_empty() {
        out.push_str("  (no persons tracked)\n");
        return out;
    }
    let width = counters
        .iter()
        .map(|(name, _)| name.chars().count())
        .max()
        .unwrap_or(0);
    for (name, handle) in counters {
        let marker = match handle.state {
            CounterState::Idle => ' ',
            CounterState::OptimisticallyUpdated => '~',
            CounterState::Reconciling => '*',
        };
        let _ = writeln!(out, "  {name:width$}  {:>4}{marker}", handle.displayed);
    }
    out
}

pub fn render_report(view: &ReportView) -> String {
    let mut out = String::new();
    let stats = view.stats();
    let _ = writeln!(
        out,
        "records: {}  total: {}  avg/record: {:.1}  max: {}",
        stats.total_records, stats.total_count, stats.average_count, stats.max_count
    );

    if !view.daily().is_empty() {
        out.push_str("per day:\n");
        for point in view.daily() {
            let _ = writeln!(out, "  {}  {}", point.date, point.total);
        }
    }
    if !view.by_person().is_empty() {
        out.push_str("per person:\n");
        for point in view.by_person() {
            let _ = writeln!(out, "  {}  {}", point.person, point.total);
        }
    }

    if view.page_records().is_empty() {
        out.push_str("no records\n");
        return out;
    }
    out.push_str("\n  id     date        time      person          count\n");
    for record in view.page_records() {
        let time = record
            .time
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "  {:<6} {}  {:<8}  {:<15} {}",
            record.id, record.date, time, record.person, record.count
        );
    }

    let (start, end) = view.page_range();
    let _ = writeln!(
        out,
        "\nshowing {start}-{end} of {}  page {}/{}  {}",
        view.total_records(),
        view.page(),
        view.total_pages(),
        render_page_bar(view.page(), view.total_pages())
    );
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Gap,
}

/// Page numbers worth showing for the pagination bar: a window around the
/// current page, widened near either edge, with the first and last pages
/// always present behind gaps.
pub fn page_window(current: usize, total: usize) -> Vec<PageItem> {
    if total <= 1 {
        return Vec::new();
    }

    let mut start = current.saturating_sub(2).max(1);
    let mut end = (current + 2).min(total);
    if current <= 3 {
        end = total.min(5);
    }
    if current + 2 >= total {
        start = total.saturating_sub(4).max(1);
    }

    let mut items = Vec::new();
    if start > 1 {
        items.push(PageItem::Page(1));
        if start > 2 {
            items.push(PageItem::Gap);
        }
    }
    for page in start..=end {
        items.push(PageItem::Page(page));
    }
    if end < total {
        if end < total - 1 {
            items.push(PageItem::Gap);
        }
        items.push(PageItem::Page(total));
    }
    items
}

fn render_page_bar(current: usize, total: usize) -> String {
    let mut out = String::new();
    for item in page_window(current, total) {
        match item {
            PageItem::Page(page) if page == current => {
                let _ = write!(out, "[{page}] ");
            }
            PageItem::Page(page) => {
                let _ = write!(out, "{page} ");
            }
            PageItem::Gap => out.push_str("... "),
        }
    }
    out.trim_end().to_string()
}
