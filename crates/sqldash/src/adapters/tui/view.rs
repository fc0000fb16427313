use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
    Frame,
};

use crate::core::{controller::Dashboard, series::ChartSeries};

pub struct ViewContext {
    pub source: String,
    pub refresh_ms: u64,
}

pub fn draw(frame: &mut Frame, dash: &Dashboard, ctx: &ViewContext) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(12),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], dash, ctx);
    draw_status(frame, chunks[1], dash);
    draw_kpis(frame, chunks[2], dash);
    draw_table(frame, chunks[3], dash);
    draw_chart(frame, chunks[4], dash);
    draw_footer(frame, chunks[5]);
}

fn draw_header(frame: &mut Frame, area: Rect, dash: &Dashboard, ctx: &ViewContext) {
    let live = if dash.live {
        Span::styled(
            format!("LIVE every {} ms", ctx.refresh_ms),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled("live off", Style::default().fg(Color::DarkGray))
    };

    let title = Line::from(vec![
        Span::styled(
            "sqldash",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(ctx.source.clone(), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        live,
    ]);
    let input = Line::from(vec![
        Span::styled("SQL> ", Style::default().fg(Color::Yellow)),
        Span::raw(dash.input.clone()),
        Span::styled("█", Style::default().fg(Color::DarkGray)),
    ]);

    let widget = Paragraph::new(vec![title, input])
        .block(Block::default().borders(Borders::ALL).title(" QUERY CONSOLE "));
    frame.render_widget(widget, area);
}

fn draw_status(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let style = if dash.status.starts_with("Error") {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if dash.status.starts_with("OK") {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let widget = Paragraph::new(Line::from(Span::styled(format!(" {}", dash.status), style)));
    frame.render_widget(widget, area);
}

fn draw_kpis(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let spans = vec![
        Span::styled("Avg Memory: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            dash.kpis.avg_memory.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("    "),
        Span::styled("Avg CPU: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            dash.kpis.avg_cpu.clone(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
    ];
    let widget = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" SUMMARY "));
    frame.render_widget(widget, area);
}

fn draw_table(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let header = Row::new(dash.table.columns.iter().map(|c| Cell::from(c.clone())))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let rows = dash
        .table
        .rows
        .iter()
        .map(|r| Row::new(r.iter().map(|c| Cell::from(c.clone()))));
    let widths = vec![Constraint::Fill(1); dash.table.columns.len().max(1)];

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " RESULTS  Rows: {} ",
            dash.table.row_count
        )));
    frame.render_widget(widget, area);
}

fn draw_chart(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let mem_points = finite_points(&dash.chart.memory);
    let cpu_points = finite_points(&dash.chart.cpu);
    let (x_bounds, y_bounds) = chart_bounds(&dash.chart);

    let datasets = vec![
        Dataset::default()
            .name("Memory Usage")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&mem_points),
        Dataset::default()
            .name("CPU Usage")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Magenta))
            .data(&cpu_points),
    ];

    let widget = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(" USAGE OVER TIME "))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds(x_bounds)
                .labels(x_axis_labels(&dash.chart.labels)),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds(y_bounds)
                .labels(y_axis_labels(y_bounds)),
        );
    frame.render_widget(widget, area);
}

fn draw_footer(frame: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let hint = Style::default().fg(Color::DarkGray);
    let spans = vec![
        Span::styled("[Enter]", key),
        Span::styled(" Run  ", hint),
        Span::styled("[Ctrl-L]", key),
        Span::styled(" Live  ", hint),
        Span::styled("[Ctrl-U]", key),
        Span::styled(" Clear  ", hint),
        Span::styled("[Esc]", key),
        Span::styled(" Quit", hint),
    ];
    let widget = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" KEYS "));
    frame.render_widget(widget, area);
}

/// Series points with their x index, non-finite values dropped.
fn finite_points(series: &[f64]) -> Vec<(f64, f64)> {
    series
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

fn chart_bounds(chart: &ChartSeries) -> ([f64; 2], [f64; 2]) {
    if chart.is_empty() {
        return ([0.0, 1.0], [0.0, 100.0]);
    }
    let x_max = chart.len().saturating_sub(1).max(1) as f64;
    let finite: Vec<f64> = chart
        .memory
        .iter()
        .chain(chart.cpu.iter())
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    if finite.is_empty() {
        return ([0.0, x_max], [0.0, 100.0]);
    }

    let lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pad = ((hi - lo) * 0.1).max(1.0);
    ([0.0, x_max], [(lo - pad).max(0.0), hi + pad])
}

fn x_axis_labels(labels: &[String]) -> Vec<String> {
    match labels {
        [] => Vec::new(),
        [only] => vec![only.clone()],
        [first, .., last] => vec![first.clone(), last.clone()],
    }
}

fn y_axis_labels(bounds: [f64; 2]) -> Vec<String> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    vec![
        format!("{:.0}", bounds[0]),
        format!("{mid:.0}"),
        format!("{:.0}", bounds[1]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_points_are_not_plotted() {
        let points = finite_points(&[1.0, f64::NAN, 3.0]);
        assert_eq!(points, vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn bounds_ignore_nan_and_pad_the_range() {
        let chart = ChartSeries {
            labels: vec!["a".into(), "b".into()],
            memory: vec![50.0, f64::NAN],
            cpu: vec![10.0, 30.0],
        };
        let (x, y) = chart_bounds(&chart);
        assert_eq!(x, [0.0, 1.0]);
        assert!(y[0] <= 10.0 && y[1] >= 50.0);
        assert!(y[0].is_finite() && y[1].is_finite());
    }

    #[test]
    fn empty_series_get_default_bounds() {
        let (x, y) = chart_bounds(&ChartSeries::default());
        assert_eq!(x, [0.0, 1.0]);
        assert_eq!(y, [0.0, 100.0]);
    }

    #[test]
    fn all_nan_series_fall_back_to_percent_scale() {
        let chart = ChartSeries {
            labels: vec!["a".into()],
            memory: vec![f64::NAN],
            cpu: vec![f64::NAN],
        };
        let (_, y) = chart_bounds(&chart);
        assert_eq!(y, [0.0, 100.0]);
    }

    #[test]
    fn x_axis_shows_first_and_last_label() {
        let labels = vec!["09:00:00".to_string(), "09:00:02".into(), "09:00:04".into()];
        assert_eq!(x_axis_labels(&labels), vec!["09:00:00", "09:00:04"]);
        assert_eq!(x_axis_labels(&labels[..1]), vec!["09:00:00"]);
        assert!(x_axis_labels(&[]).is_empty());
    }
}
