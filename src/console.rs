use validator_lib::{PageView, Row, RunState, RunSummary};

/// Status as shown while browsing results
pub fn display_status(row: &Row) -> &'static str {
    if row.is_processing {
        return "Checking...";
    }
    match row.status {
        Some(true) => "Valid",
        Some(false) => "Invalid",
        None => "—",
    }
}

/// Render a page of results as a plain text table followed by the pager line.
pub fn render_page(view: &PageView) -> String {
    let width = view
        .rows
        .iter()
        .map(|row| row.number.chars().count())
        .max()
        .unwrap_or(0)
        .max("Number".len());

    let mut out = String::new();
    out.push_str(&format!("{:>5}  {:<width$}  {:<11}  Error\n", "#", "Number", "Status"));
    for (offset, row) in view.rows.iter().enumerate() {
        out.push_str(
            format!(
                "{:>5}  {:<width$}  {:<11}  {}",
                view.first_row_number + offset,
                row.number,
                display_status(row),
                row.error.as_deref().unwrap_or("")
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if view.page_count > 0 {
        let pager = view
            .window
            .iter()
            .map(|n| {
                if *n == view.page_number {
                    format!("[{n}]")
                } else {
                    n.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(&format!(
            "Page {} of {}  {pager}\n",
            view.page_number, view.page_count
        ));
    }

    out
}

pub fn render_progress(state: &RunState) -> String {
    format!("⏳ Processing... {}%", state.progress())
}

pub fn render_summary(summary: &RunSummary) -> String {
    format!(
        "{} numbers: {} valid, {} invalid, {} unchecked",
        summary.total, summary.valid, summary.invalid, summary.unchecked
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator_lib::page;

    fn rows(numbers: &[&str]) -> Vec<Row> {
        numbers.iter().map(|n| Row::new(*n)).collect()
    }

    #[test]
    fn test_display_status_labels() {
        let mut row = Row::new("1");
        assert_eq!(display_status(&row), "—");
        row.is_processing = true;
        assert_eq!(display_status(&row), "Checking...");
        row.is_processing = false;
        row.status = Some(true);
        assert_eq!(display_status(&row), "Valid");
        row.status = Some(false);
        assert_eq!(display_status(&row), "Invalid");
    }

    #[test]
    fn test_render_page_numbers_rows_from_page_start() {
        let numbers: Vec<String> = (0..60).map(|i| format!("+1555{i:04}")).collect();
        let mut all: Vec<Row> = numbers.iter().map(Row::new).collect();
        all[55].status = Some(false);
        all[55].error = Some("Not on WhatsApp".to_string());

        let text = render_page(&page(&all, 50, 2));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 12);
        assert!(lines[1].trim_start().starts_with("51  +15550050"));
        assert!(lines[6].contains("Invalid"));
        assert!(lines[6].ends_with("Not on WhatsApp"));
        assert_eq!(lines[11], "Page 2 of 2  1 [2]");
    }

    #[test]
    fn test_render_empty_page_has_no_pager() {
        let text = render_page(&page(&rows(&[]), 50, 1));
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_render_summary() {
        let summary = RunSummary {
            total: 5,
            valid: 2,
            invalid: 1,
            unchecked: 2,
        };
        assert_eq!(
            render_summary(&summary),
            "5 numbers: 2 valid, 1 invalid, 2 unchecked"
        );
    }
}
