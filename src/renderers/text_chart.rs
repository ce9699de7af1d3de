use std::fmt::Write;

use crate::error::{ProcessingError, Result};
use crate::renderers::{MetricsRenderer, PlotRequest};

/// Horizontal bar chart drawn with plain characters, one bar per table row.
pub struct TextChartRenderer {
    width: usize,
    bar: char,
}

impl TextChartRenderer {
    pub fn new() -> Self {
        Self { width: 50, bar: '#' }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_bar(mut self, bar: char) -> Self {
        self.bar = bar;
        self
    }
}

impl Default for TextChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRenderer for TextChartRenderer {
    type Output = String;

    fn render(&self, request: &PlotRequest<'_>) -> Result<String> {
        if self.width == 0 {
            return Err(ProcessingError::configuration("Chart width must be positive"));
        }
        if request.x_interval == Some(0) {
            return Err(ProcessingError::configuration("x interval must be positive"));
        }

        let table = request.table;
        let values: Vec<f64> = table.rows.iter().map(|r| r.value(request.column)).collect();
        let (low, high) = match request.y_limits {
            Some((low, high)) if high > low => (low, high),
            Some((low, high)) => {
                return Err(ProcessingError::configuration(format!(
                    "Invalid y limits ({}, {})",
                    low, high
                )))
            }
            None => (0.0, values.iter().cloned().fold(0.0, f64::max).max(1.0)),
        };

        let labels: Vec<String> = table
            .rows
            .iter()
            .map(|r| match r.season {
                Some(bucket) => format!("{} {}", r.year, bucket.code()),
                None => r.year.to_string(),
            })
            .collect();
        let label_width = labels.iter().map(|l| l.len()).max().unwrap_or(4);
        let interval = request.x_interval.unwrap_or(1);

        let mut out = String::new();
        let _ = writeln!(out, "{}", request.title);
        for (i, (label, value)) in labels.iter().zip(&values).enumerate() {
            let shown = if i % interval == 0 { label.as_str() } else { "" };
            let scaled = ((value - low) / (high - low)).clamp(0.0, 1.0);
            let length = (scaled * self.width as f64).round() as usize;
            let bar: String = std::iter::repeat(self.bar).take(length).collect();
            let _ = writeln!(
                out,
                "{:<lw$} |{:<w$} {}",
                shown,
                bar,
                value,
                lw = label_width,
                w = self.width
            );
        }
        Ok(out)
    }
}
