use crate::collector::{AccuracyTracker, QueryReport};
use crate::debug;
use crossterm::{
    cursor::MoveToPreviousLine,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io;

/// Line-per-query progress for the baseline and availability passes.
pub struct ScanTUI {
    pass: String,
    total_units: usize,
    completed: usize,
    overflow_alerts: usize,
    unit_line_open: bool,
}

pub fn percent(ratio: f64) -> String {
    format!("{:.2}%", ratio * 100.0)
}

impl ScanTUI {
    pub fn new() -> Self {
        Self {
            pass: String::new(),
            total_units: 0,
            completed: 0,
            overflow_alerts: 0,
            unit_line_open: false,
        }
    }

    pub fn start_pass(&mut self, pass: &str, total_units: usize) -> io::Result<()> {
        self.pass = pass.to_string();
        self.total_units = total_units;
        self.completed = 0;
        self.overflow_alerts = 0;
        execute!(
            io::stdout(),
            SetForegroundColor(Color::White),
            Print(format!("\n🔎 {} pass - {} queries\n", pass, total_units)),
            ResetColor
        )
    }

    /// Shows the query currently being paged through.
    pub fn start_unit(&mut self, label: &str) -> io::Result<()> {
        let spinner = match self.completed % 4 {
            0 => "⠋",
            1 => "⠙",
            2 => "⠹",
            _ => "⠸",
        };
        execute!(
            io::stdout(),
            SetForegroundColor(Color::White),
            Print(format!(
                "{} {} {}/{}: {}\n",
                spinner,
                self.pass,
                self.completed + 1,
                self.total_units,
                label
            )),
            ResetColor
        )?;
        // debug output interleaves with the unit line, so only rewrite it in place when quiet
        self.unit_line_open = !debug::is_debug_enabled();
        Ok(())
    }

    pub fn finish_unit(&mut self, label: &str, report: &QueryReport) -> io::Result<()> {
        self.completed += 1;
        if self.unit_line_open {
            execute!(io::stdout(), MoveToPreviousLine(1), Clear(ClearType::CurrentLine))?;
            self.unit_line_open = false;
        }

        let position = format!("{}/{}", self.completed, self.total_units);
        match report.accuracy() {
            Some(ratio) => execute!(
                io::stdout(),
                SetForegroundColor(Color::Green),
                Print(format!(
                    "✓ {} {}: sample of {}/{} listings ({} accuracy)\n",
                    label,
                    position,
                    report.accepted,
                    report.sampled,
                    percent(ratio)
                )),
                ResetColor
            )?,
            None => execute!(
                io::stdout(),
                SetForegroundColor(Color::DarkGrey),
                Print(format!("– {} {}: search provided no results\n", label, position)),
                ResetColor
            )?,
        }

        if report.failed_pages() > 0 {
            execute!(
                io::stdout(),
                SetForegroundColor(Color::Red),
                Print(format!("  ✗ {} page(s) failed to load\n", report.failed_pages())),
                ResetColor
            )?;
        }
        if report.overflow {
            self.overflow_alerts += 1;
            self.overflow_alert(report)?;
        }
        Ok(())
    }

    fn overflow_alert(&self, report: &QueryReport) -> io::Result<()> {
        execute!(
            io::stdout(),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "  ⚠ ALERT: listings missed - search span included {} pages\n",
                report.declared_pages
            )),
            ResetColor
        )
    }

    pub fn cancelled(&mut self) -> io::Result<()> {
        execute!(
            io::stdout(),
            SetForegroundColor(Color::Yellow),
            Print(format!("⏹ {} pass cancelled after {} queries\n", self.pass, self.completed)),
            ResetColor
        )
    }

    pub fn finish_pass(&mut self, accuracy: &AccuracyTracker) -> io::Result<()> {
        let summary = match (accuracy.pooled_accuracy(), accuracy.mean_accuracy()) {
            (Some(pooled), Some(mean)) => format!(
                "✓ {} pass: sample of {}/{} listings ({} accuracy, {} mean per query)\n",
                self.pass,
                accuracy.accepted(),
                accuracy.sampled(),
                percent(pooled),
                percent(mean)
            ),
            _ => format!("– {} pass: no listings sampled\n", self.pass),
        };
        execute!(
            io::stdout(),
            SetForegroundColor(Color::DarkGrey),
            Print(summary),
            ResetColor
        )?;
        if self.overflow_alerts > 0 {
            execute!(
                io::stdout(),
                SetForegroundColor(Color::Yellow),
                Print(format!(
                    "⚠ {} queries hit the page ceiling; use a finer grid\n",
                    self.overflow_alerts
                )),
                ResetColor
            )?;
        }
        Ok(())
    }
}

impl Default for ScanTUI {
    fn default() -> Self {
        Self::new()
    }
}
