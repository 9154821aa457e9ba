/// Host table screen

use chrono::{DateTime, Local};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use std::sync::Arc;

use crate::core::{classify, ConnectionState, HostMetrics, HostSnapshot, Severity};
use crate::utils::{
    fit_width, Column, COLUMNS, COL_CPU_TYPE, COL_CPU_UTIL, COL_DISK_USAGE, COL_HOST, COL_RAM_USAGE, CONNECTING_TEXT,
    FAILED_TEXT, PLACEHOLDER_TEXT, TITLE,
};

/// What a row shows, derived from a store snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum RowView {
    /// Gave up connecting; the whole row is red
    Failed,
    /// No metrics yet
    Connecting,
    Metrics(Arc<HostMetrics>),
}

impl RowView {
    pub fn from_snapshot(snapshot: &HostSnapshot) -> Self {
        if snapshot.status.state == ConnectionState::Blocked {
            return RowView::Failed;
        }
        match &snapshot.metrics {
            Some(metrics) => RowView::Metrics(Arc::clone(metrics)),
            None => RowView::Connecting,
        }
    }
}

pub fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Green => Color::Green,
        Severity::Yellow => Color::Yellow,
        Severity::Red => Color::Red,
    }
}

fn cell(text: &str, column: Column, style: Style) -> Cell<'static> {
    Cell::from(Span::styled(fit_width(text, column.width as usize), style))
}

fn metric_cell(text: &str, column: Column) -> Cell<'static> {
    cell(text, column, Style::default().fg(severity_color(classify(text))))
}

pub struct Dashboard {
    pub title: String,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self { title: TITLE.to_string() }
    }

    pub fn render(&self, frame: &mut Frame, snapshots: &[HostSnapshot], last_sweep: Option<DateTime<Local>>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Hosts
                Constraint::Length(3), // Footer
            ])
            .split(frame.size());

        let updated = match last_sweep {
            Some(at) => format!("Last update: {}", at.format("%H:%M:%S")),
            None => "Waiting for first update".to_string(),
        };
        let title = Paragraph::new(Line::from(vec![
            Span::styled(&self.title, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(updated, Style::default().fg(Color::Gray)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, chunks[0]);

        let header = Row::new(COLUMNS.iter().map(|c| c.title).collect::<Vec<_>>())
            .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .bottom_margin(1);

        let rows: Vec<Row> = snapshots.iter().map(Self::row).collect();

        let table = Table::new(rows, COLUMNS.iter().map(|c| Constraint::Length(c.width)))
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!("Hosts ({})", snapshots.len())));
        frame.render_widget(table, chunks[1]);

        let footer = Paragraph::new(Line::from(vec![
            Span::styled("[q]", Style::default().fg(Color::Yellow)),
            Span::raw("uit"),
        ]))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn row(snapshot: &HostSnapshot) -> Row<'static> {
        let host_style = Style::default().fg(Color::Green);

        match RowView::from_snapshot(snapshot) {
            RowView::Failed => {
                let red = Style::default().fg(Color::Red);
                Row::new(vec![
                    cell(&snapshot.host, COL_HOST, red),
                    cell(FAILED_TEXT, COL_CPU_TYPE, red),
                    cell(PLACEHOLDER_TEXT, COL_CPU_UTIL, red),
                    cell(PLACEHOLDER_TEXT, COL_RAM_USAGE, red),
                    cell(PLACEHOLDER_TEXT, COL_DISK_USAGE, red),
                ])
                .style(red)
            }
            RowView::Connecting => Row::new(vec![
                cell(&snapshot.host, COL_HOST, host_style),
                cell(CONNECTING_TEXT, COL_CPU_TYPE, Style::default().fg(Color::Gray)),
                cell(PLACEHOLDER_TEXT, COL_CPU_UTIL, Style::default()),
                cell(PLACEHOLDER_TEXT, COL_RAM_USAGE, Style::default()),
                cell(PLACEHOLDER_TEXT, COL_DISK_USAGE, Style::default()),
            ]),
            RowView::Metrics(m) => Row::new(vec![
                cell(&snapshot.host, COL_HOST, host_style),
                cell(&m.cpu_type, COL_CPU_TYPE, Style::default()),
                metric_cell(&m.cpu_utilization, COL_CPU_UTIL),
                metric_cell(&m.ram_info, COL_RAM_USAGE),
                metric_cell(&m.disk_info, COL_DISK_USAGE),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionStatus;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    fn snapshot(host: &str, state: ConnectionState, metrics: Option<HostMetrics>) -> HostSnapshot {
        HostSnapshot {
            host: host.to_string(),
            status: SessionStatus {
                state,
                consecutive_failures: if state == ConnectionState::Blocked { 3 } else { 0 },
            },
            metrics: metrics.map(Arc::new),
        }
    }

    fn sample_metrics() -> HostMetrics {
        HostMetrics {
            cpu_type: "AMD EPYC 7763 64-Core Processor".to_string(),
            ram_info: "6.90GB/7.80GB (88.46%)".to_string(),
            disk_info: "20G/50G (40%)".to_string(),
            cpu_utilization: "65%".to_string(),
        }
    }

    fn draw(snapshots: &[HostSnapshot]) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(120, 14)).unwrap();
        let dashboard = Dashboard::new();
        terminal.draw(|f| dashboard.render(f, snapshots, None)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn line(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width).map(|x| buffer.get(x, y).symbol()).collect()
    }

    /// Find `text` on screen and return the colour of its first character
    fn fg_of(buffer: &Buffer, text: &str) -> Option<Color> {
        (0..buffer.area.height).find_map(|y| {
            let line = line(buffer, y);
            // borders are multi-byte, so count chars rather than bytes
            let x = line[..line.find(text)?].chars().count();
            Some(buffer.get(x as u16, y).fg)
        })
    }

    fn screen(buffer: &Buffer) -> String {
        (0..buffer.area.height).map(|y| line(buffer, y)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_row_view() {
        assert_eq!(
            RowView::from_snapshot(&snapshot("a", ConnectionState::Disconnected, None)),
            RowView::Connecting
        );
        // blocked wins over stale metrics
        assert_eq!(
            RowView::from_snapshot(&snapshot("a", ConnectionState::Blocked, Some(sample_metrics()))),
            RowView::Failed
        );
        assert!(matches!(
            RowView::from_snapshot(&snapshot("a", ConnectionState::Connected, Some(sample_metrics()))),
            RowView::Metrics(_)
        ));
    }

    #[test]
    fn test_renders_title_and_header() {
        let buffer = draw(&[]);
        let text = screen(&buffer);
        assert!(text.contains(TITLE));
        assert!(text.contains("Waiting for first update"));
        for column in COLUMNS {
            assert!(text.contains(column.title), "missing header {}", column.title);
        }
        assert!(text.contains("[q]uit"));
    }

    #[test]
    fn test_metric_cells_coloured_by_severity() {
        let buffer = draw(&[snapshot("web1", ConnectionState::Connected, Some(sample_metrics()))]);

        assert_eq!(fg_of(&buffer, "web1"), Some(Color::Green));
        assert_eq!(fg_of(&buffer, "65%"), Some(Color::Yellow));
        assert_eq!(fg_of(&buffer, "6.90GB/7.80GB (88.46%)"), Some(Color::Red));
        assert_eq!(fg_of(&buffer, "20G/50G (40%)"), Some(Color::Green));
        // clipped to the column width
        assert!(screen(&buffer).contains("AMD EPYC 7763 64-Core Pro "));
    }

    #[test]
    fn test_connecting_and_failed_rows() {
        let buffer = draw(&[
            snapshot("web1", ConnectionState::Disconnected, None),
            snapshot("db1", ConnectionState::Blocked, None),
        ]);

        assert!(fg_of(&buffer, CONNECTING_TEXT).is_some());
        assert_eq!(fg_of(&buffer, "web1"), Some(Color::Green));
        assert_eq!(fg_of(&buffer, "db1"), Some(Color::Red));
        assert_eq!(fg_of(&buffer, FAILED_TEXT), Some(Color::Red));
    }

    #[test]
    fn test_rows_keep_host_order() {
        let buffer = draw(&[
            snapshot("zeta", ConnectionState::Disconnected, None),
            snapshot("alpha", ConnectionState::Disconnected, None),
        ]);
        let text = screen(&buffer);
        assert!(text.find("zeta").unwrap() < text.find("alpha").unwrap());
    }
}
