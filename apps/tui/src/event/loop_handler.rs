use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use perf_dashboard_tui::api::AggregateRow;
use perf_dashboard_tui::domain::{round_metric, truncate_label, Collection, Metric, PageKind, LABEL_WIDTH};
use perf_dashboard_tui::filters::FilterSet;
use perf_dashboard_tui::sync::SyncPhase;
use perf_dashboard_tui::view::{DashboardView, DetailView};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use serde::Serialize;
use std::io::Stdout;

use crate::app::{handle_input, App};
use crate::ui;

/// Run the application in headless mode (no UI)
pub async fn run_headless(app: &mut App, json: bool) -> Result<()> {
    app.settle().await;

    let report = HeadlessReport {
        url: app.sync.current_url(),
        page: app.sync.page(),
        phase: app.sync.phase(),
        filters: &app.sync.current().filters,
        header_links: app.sync.header_links(),
        view: &app.view,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_headless_text(&report);
    }

    match &app.view.failure {
        Some(failure) => Err(color_eyre::eyre::eyre!("{failure}")),
        None => Ok(()),
    }
}

#[derive(Serialize)]
struct HeadlessReport<'a> {
    url: String,
    page: &'a PageKind,
    phase: SyncPhase,
    filters: &'a FilterSet,
    header_links: Vec<(Collection, String)>,
    view: &'a DashboardView,
}

fn render_headless_text(report: &HeadlessReport<'_>) {
    let collection = report.page.collection();
    println!("\n{}", collection.label());
    println!("{}", "=".repeat(collection.label().len()));
    println!("Page: {}", report.url);

    if report.filters.is_empty() {
        println!("Filters: none");
    } else {
        println!("Filters:");
        for filter in report.filters {
            println!("- {filter}");
        }
    }

    if let Some(failure) = &report.view.failure {
        println!("\n{failure}");
        return;
    }

    if report.page.is_detail() {
        render_headless_detail(&report.view.detail);
        return;
    }

    println!(
        "\n{} ({})",
        collection.label_column(),
        report.view.grid_info()
    );
    for row in &report.view.grid.rows {
        print_row(row);
    }

    for metric in Metric::ALL {
        println!("\nTop by {}:", metric.label());
        for row in report.view.charts.for_metric(metric) {
            println!(
                "- {:>12} | {}",
                round_metric(row.metric(metric)),
                truncate_label(&row.label, LABEL_WIDTH)
            );
        }
    }
}

fn render_headless_detail(detail: &DetailView) {
    match detail {
        DetailView::Loaded(series) => {
            let stats = series.stats;
            println!("\n{}", truncate_label(&series.label, LABEL_WIDTH));
            println!(
                "count {} | total {} | avg {} | min {} | max {}",
                stats.count,
                round_metric(stats.total),
                round_metric(stats.avg),
                round_metric(stats.min),
                round_metric(stats.max)
            );
            println!("Events: {}", series.points.len());
        }
        DetailView::Empty | DetailView::NotLoaded => println!("\nNo data"),
    }
}

fn print_row(row: &AggregateRow) {
    println!(
        "- {} | count {} | total {} | avg {} | min {} | max {}",
        truncate_label(&row.label, LABEL_WIDTH),
        row.count,
        round_metric(row.total),
        round_metric(row.avg),
        round_metric(row.min),
        round_metric(row.max)
    );
}

/// Run the main application event loop
pub fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    // Configure event poll timeout (ms)
    const EVENT_POLL_TIMEOUT: u64 = 50;

    loop {
        // Resolve finished fetches, advance the throbber
        app.update();

        if let Err(e) = terminal.draw(|f| ui::ui(app, f)) {
            return Err(color_eyre::eyre::eyre!("Terminal draw error: {e}"));
        }

        if matches!(
            event::poll(std::time::Duration::from_millis(EVENT_POLL_TIMEOUT)),
            Ok(true)
        ) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        app.running = false;
                    } else {
                        handle_input(app, key.code);
                    }
                    if !app.running {
                        break;
                    }
                }
                Ok(Event::Resize(_, _)) => {
                    // Non-fatal, the next iteration draws again
                    let _ = terminal.draw(|f| ui::ui(app, f));
                }
                Ok(_) | Err(_) => {}
            }
        }
    }
    Ok(())
}
