pub mod text_chart;

pub use text_chart::TextChartRenderer;

use crate::error::Result;
use crate::models::{MetricColumn, MetricsTable};

/// What to draw from a finished metrics table.
#[derive(Debug, Clone)]
pub struct PlotRequest<'a> {
    pub table: &'a MetricsTable,
    pub column: MetricColumn,
    pub title: String,
    /// Fixed value axis; derived from the data when unset.
    pub y_limits: Option<(f64, f64)>,
    /// Label every n-th group along the x axis.
    pub x_interval: Option<usize>,
}

impl<'a> PlotRequest<'a> {
    pub fn new(table: &'a MetricsTable, column: MetricColumn) -> Self {
        Self {
            table,
            column,
            title: column.header(&table.prefix),
            y_limits: None,
            x_interval: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_y_limits(mut self, low: f64, high: f64) -> Self {
        self.y_limits = Some((low, high));
        self
    }

    pub fn with_x_interval(mut self, interval: usize) -> Self {
        self.x_interval = Some(interval);
        self
    }
}

/// Consumes metrics tables after aggregation; never feeds back into detection.
pub trait MetricsRenderer {
    type Output;

    fn render(&self, request: &PlotRequest<'_>) -> Result<Self::Output>;
}
