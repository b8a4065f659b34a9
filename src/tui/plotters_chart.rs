//! Plotters-powered price chart widget for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//! - easy to extend later (annotations, exportable PNG/SVG backends, etc.)
//!
//! We render Plotters output into the Ratatui buffer using
//! `plotters-ratatui-backend`.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// High-contrast series palette, shared with the legend rendering so chart
/// lines and competitor labels stay in sync.
pub const SERIES_COLORS: [(u8, u8, u8); 8] = [
    (0, 255, 255),  // cyan
    (0, 255, 0),    // green
    (255, 255, 0),  // yellow
    (255, 0, 255),  // magenta
    (255, 128, 0),  // orange
    (0, 128, 255),  // blue
    (255, 0, 0),    // red
    (255, 255, 255),// white
];

pub fn series_color(idx: usize) -> (u8, u8, u8) {
    SERIES_COLORS[idx % SERIES_COLORS.len()]
}

/// A lightweight, render-only chart description.
///
/// One line series per competitor; x is the day offset from `epoch` so the
/// axis stays numeric, with tick labels formatted back into calendar dates.
/// All series and bounds are computed outside the render call, which keeps
/// `render()` focused on drawing.
pub struct PriceChart<'a> {
    pub series: &'a [(String, Vec<(f64, f64)>)],
    /// X bounds (day offsets from `epoch`).
    pub x_bounds: [f64; 2],
    /// Y bounds (price).
    pub y_bounds: [f64; 2],
    /// Date the x axis counts from.
    pub epoch: NaiveDate,
}

impl<'a> Widget for PriceChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a
        // chart. In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let epoch = self.epoch;

        // `plotters-ratatui-backend` draws Plotters primitives via Ratatui's
        // `Canvas` widget, which ultimately writes to the terminal buffer.
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                // Small margins keep the chart readable without wasting space.
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Axes + tick labels.
            //
            // We disable the mesh lines to reduce visual clutter in
            // low-resolution terminal rendering; the axes + labels are
            // usually enough.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc("price")
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_date_offset(epoch, *v))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (idx, (_, points)) in self.series.iter().enumerate() {
                let (r, g, b) = series_color(idx);
                let color = RGBColor(r, g, b);
                chart.draw_series(LineSeries::new(points.iter().copied(), &color))?;
                // Mark the observations as well: with sparse dates a bare
                // line can hide where the data actually is.
                chart.draw_series(points.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn fmt_date_offset(epoch: NaiveDate, offset: f64) -> String {
    let date = epoch + Duration::days(offset.round() as i64);
    date.format("%d-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps_around() {
        assert_eq!(series_color(0), series_color(SERIES_COLORS.len()));
    }

    #[test]
    fn date_offsets_format_as_calendar_days() {
        let epoch = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(fmt_date_offset(epoch, 0.0), "01-01");
        assert_eq!(fmt_date_offset(epoch, 31.0), "01-02");
    }
}
