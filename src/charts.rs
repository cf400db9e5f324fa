//! PNG chart rendering with plotters.
//!
//! Rendering is a side effect only; callers log failures and carry on.

use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use tracing::info;

use crate::analyzers::types::PositivityRecord;

/// Positivity threshold recommended by the WHO.
pub const WHO_THRESHOLD: f64 = 0.05;

const SIZE: (u32, u32) = (1300, 729);

/// Dated points for one county, oldest first, restricted to dates after `since`.
pub fn series<F>(
    records: &[PositivityRecord],
    county: &str,
    since: Option<NaiveDate>,
    value: F,
) -> Vec<(NaiveDate, f64)>
where
    F: Fn(&PositivityRecord) -> Option<f64>,
{
    let mut points: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter(|r| r.county() == county)
        .filter(|r| since.is_none_or(|s| r.date() > s))
        .filter_map(|r| value(r).map(|v| (r.date(), v)))
        .collect();
    points.sort_by_key(|(date, _)| *date);
    points
}

/// Latest rolling positivity per county, in the given order.
pub fn latest_rates(records: &[PositivityRecord], counties: &[String]) -> Vec<(String, Option<f64>)> {
    counties
        .iter()
        .map(|county| {
            let latest = records
                .iter()
                .filter(|r| r.county() == county)
                .max_by_key(|r| r.date());
            (county.clone(), latest.and_then(|r| r.rolling_pp))
        })
        .collect()
}

/// Writes charts into `dir`.
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    dir: PathBuf,
    since: Option<NaiveDate>,
}

impl ChartRenderer {
    pub fn new(dir: impl Into<PathBuf>, since: Option<NaiveDate>) -> Self {
        Self {
            dir: dir.into(),
            since,
        }
    }

    fn target(&self, name: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(self.dir.join(name))
    }

    /// 14-day positivity over time, one line per county, with the WHO threshold.
    pub fn positivity_lines(
        &self,
        records: &[PositivityRecord],
        counties: &[String],
    ) -> Result<PathBuf> {
        let lines: Vec<(&String, Vec<(NaiveDate, f64)>)> = counties
            .iter()
            .map(|c| (c, series(records, c, self.since, |r| r.rolling_pp)))
            .filter(|(_, points)| !points.is_empty())
            .collect();

        let Some((start, end)) = date_span(lines.iter().flat_map(|(_, p)| p.iter())) else {
            bail!("no positivity data to plot");
        };
        let max_y = lines
            .iter()
            .flat_map(|(_, p)| p.iter().map(|(_, v)| *v))
            .fold(WHO_THRESHOLD, f64::max)
            * 1.1;

        let path = self.target("positivity_line.png")?;
        {
            let root = BitMapBackend::new(&path, SIZE).into_drawing_area();
            root.fill(&WHITE)?;

            let days = (end - start).num_days().max(1) as f64;
            let mut chart = ChartBuilder::on(&root)
                .caption("14 Day Average Test Positivity Rate Over Time", ("sans-serif", 32))
                .margin(20)
                .x_label_area_size(50)
                .y_label_area_size(80)
                .build_cartesian_2d(0f64..days, 0f64..max_y)?;

            chart
                .configure_mesh()
                .x_desc("Date")
                .y_desc("Positivity Rate")
                .x_label_formatter(&|x| day_label(start, *x))
                .y_label_formatter(&|y| format!("{:.2}%", y * 100.0))
                .draw()?;

            for (i, (county, points)) in lines.iter().enumerate() {
                let color = Palette99::pick(i).stroke_width(4);
                chart
                    .draw_series(LineSeries::new(
                        points.iter().map(|(d, v)| (offset(start, *d), *v)),
                        color,
                    ))?
                    .label(county.as_str())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }

            chart
                .draw_series(LineSeries::new(
                    [(0.0, WHO_THRESHOLD), (days, WHO_THRESHOLD)],
                    RED.stroke_width(3),
                ))?
                .label("WHO Recommended Threshold")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

            chart
                .configure_series_labels()
                .border_style(BLACK)
                .background_style(WHITE.mix(0.8))
                .draw()?;

            root.present()?;
        }
        info!(path = %path.display(), "Rendered positivity line chart");
        Ok(path)
    }

    /// Horizontal bars of each county's latest 14-day positivity against
    /// the WHO threshold.
    pub fn positivity_bullets(
        &self,
        records: &[PositivityRecord],
        counties: &[String],
    ) -> Result<PathBuf> {
        let rates = latest_rates(records, counties);
        if rates.is_empty() {
            bail!("no counties to plot");
        }
        let max_x = rates
            .iter()
            .filter_map(|(_, r)| *r)
            .fold(0.2, f64::max);

        let path = self.target("positivity_bullet.png")?;
        {
            let root = BitMapBackend::new(&path, SIZE).into_drawing_area();
            root.fill(&WHITE)?;

            let n = rates.len();
            let mut chart = ChartBuilder::on(&root)
                .caption("14 Day Test Positivity Rate", ("sans-serif", 32))
                .margin(20)
                .x_label_area_size(50)
                .y_label_area_size(160)
                .build_cartesian_2d(0f64..max_x, 0f64..n as f64)?;

            chart
                .configure_mesh()
                .disable_y_mesh()
                .y_labels(n)
                .y_label_formatter(&|y| {
                    rates
                        .get(y.floor() as usize)
                        .map(|(c, _)| format!("{c} County"))
                        .unwrap_or_default()
                })
                .x_label_formatter(&|x| format!("{:.0}%", x * 100.0))
                .draw()?;

            chart.draw_series(rates.iter().enumerate().map(|(i, (_, rate))| {
                let y = i as f64;
                Rectangle::new(
                    [(0.0, y + 0.3), (rate.unwrap_or(0.0), y + 0.7)],
                    BLACK.filled(),
                )
            }))?;

            chart.draw_series(LineSeries::new(
                [(WHO_THRESHOLD, 0.0), (WHO_THRESHOLD, n as f64)],
                RED.stroke_width(2),
            ))?;

            root.present()?;
        }
        info!(path = %path.display(), "Rendered positivity bullet chart");
        Ok(path)
    }

    /// Active cases over time for one county.
    pub fn active_cases(&self, records: &[PositivityRecord], county: &str) -> Result<PathBuf> {
        let points = series(records, county, self.since, |r| {
            Some(r.record.active_cases as f64)
        });
        let Some((start, end)) = date_span(points.iter()) else {
            bail!("no active case data for {county} County");
        };
        let max_y = points.iter().map(|(_, v)| *v).fold(10.0, f64::max) * 1.1;

        let path = self.target(&format!("active_cases_{}.png", file_stem(county)))?;
        {
            let root = BitMapBackend::new(&path, SIZE).into_drawing_area();
            root.fill(&WHITE)?;

            let days = (end - start).num_days().max(1) as f64;
            let mut chart = ChartBuilder::on(&root)
                .caption(
                    format!("Active COVID-19 cases in {county} County over time"),
                    ("sans-serif", 32),
                )
                .margin(20)
                .x_label_area_size(50)
                .y_label_area_size(80)
                .build_cartesian_2d(0f64..days, 0f64..max_y)?;

            chart
                .configure_mesh()
                .x_desc("date")
                .y_desc("active cases")
                .x_label_formatter(&|x| day_label(start, *x))
                .draw()?;

            chart.draw_series(LineSeries::new(
                points.iter().map(|(d, v)| (offset(start, *d), *v)),
                BLACK.stroke_width(2),
            ))?;

            root.present()?;
        }
        info!(path = %path.display(), "Rendered active cases chart");
        Ok(path)
    }
}

fn date_span<'a, I>(points: I) -> Option<(NaiveDate, NaiveDate)>
where
    I: Iterator<Item = &'a (NaiveDate, f64)>,
{
    points.fold(None, |span, (d, _)| match span {
        None => Some((*d, *d)),
        Some((lo, hi)) => Some((lo.min(*d), hi.max(*d))),
    })
}

fn offset(start: NaiveDate, date: NaiveDate) -> f64 {
    (date - start).num_days() as f64
}

fn day_label(start: NaiveDate, x: f64) -> String {
    (start + Duration::days(x.round() as i64))
        .format("%b %d")
        .to_string()
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}
