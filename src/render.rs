//! Gradient plot rendering.
//!
//! The renderer receives the gradient samples, their stability bands and
//! the plot labels, and writes one SVG per station and slot. Each classified
//! sample becomes a translucent horizontal span covering the layer it was
//! computed from; the gradient and the mid-layer temperature are drawn as
//! profiles against altitude.

use crate::constants::{
    GRADIENT_PROFILE_COLOR, PLOT_HEIGHT_RANGE, PLOT_TEMP_RANGE, SPAN_OPACITY, TEMP_PROFILE_COLOR,
};
use crate::error::{Result, SoundingError};
use crate::models::{GradientSample, Slot, SoundingResult};
use crate::stability::{BandSpan, StabilityBand, band_spans};
use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;
const TEMP_GRID_STEP: f64 = 5.0;
const HEIGHT_GRID_STEP: f64 = 500.0;

/// Everything the rendering sink needs for one plot
#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    pub station_code: &'a str,
    pub station_name: &'a str,
    pub slot: Slot,
    pub date: &'a str,
    pub time: &'a str,
    pub samples: &'a [GradientSample],
    pub bands: &'a [Option<StabilityBand>],
}

impl<'a> RenderRequest<'a> {
    pub fn from_result(result: &'a SoundingResult, station_name: &'a str, date: &'a str) -> Self {
        Self {
            station_code: &result.station_code,
            station_name,
            slot: result.slot,
            date,
            time: &result.meta.observation_time,
            samples: &result.gradient,
            bands: &result.bands,
        }
    }

    pub fn title(&self) -> String {
        format!(
            "Gradient in {} on {}, at {}",
            self.station_name, self.date, self.time
        )
    }
}

/// Image file name for a station and slot, e.g. `VSST80_current.svg`
pub fn image_file_name(station_code: &str, slot: Slot) -> String {
    format!("{}_{}.svg", station_code, slot)
}

/// Destination for rendered plots
pub trait RenderSink {
    fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf>;
}

/// Writes plots as SVG files into one directory
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    image_dir: PathBuf,
}

impl SvgRenderer {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
        }
    }
}

impl RenderSink for SvgRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<PathBuf> {
        let path = self
            .image_dir
            .join(image_file_name(request.station_code, request.slot));

        let svg = build_svg(request).map_err(|e| SoundingError::Render {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        fs::create_dir_all(&self.image_dir)?;
        fs::write(&path, svg)?;

        debug!("Rendered {}", path.display());
        Ok(path)
    }
}

/// Pixel coordinates of the plot area
struct Frame;

impl Frame {
    fn x(temp: f64) -> f64 {
        let (lo, hi) = PLOT_TEMP_RANGE;
        MARGIN_LEFT + (temp - lo) / (hi - lo) * (WIDTH - MARGIN_LEFT - MARGIN_RIGHT)
    }

    fn y(height: f64) -> f64 {
        let (lo, hi) = PLOT_HEIGHT_RANGE;
        HEIGHT - MARGIN_BOTTOM - (height - lo) / (hi - lo) * (HEIGHT - MARGIN_TOP - MARGIN_BOTTOM)
    }

    fn clamp_height(height: f64) -> f64 {
        height.clamp(PLOT_HEIGHT_RANGE.0, PLOT_HEIGHT_RANGE.1)
    }
}

fn build_svg(request: &RenderRequest<'_>) -> std::result::Result<String, std::fmt::Error> {
    let mut svg = String::new();
    let (t_lo, t_hi) = PLOT_TEMP_RANGE;
    let (h_lo, h_hi) = PLOT_HEIGHT_RANGE;
    let (left, right) = (Frame::x(t_lo), Frame::x(t_hi));
    let (top, bottom) = (Frame::y(h_hi), Frame::y(h_lo));

    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" font-family="sans-serif" font-size="12">"#,
        WIDTH, HEIGHT, WIDTH, HEIGHT
    )?;
    writeln!(
        svg,
        r#"<defs><clipPath id="plot"><rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}"/></clipPath></defs>"#,
        left,
        top,
        right - left,
        bottom - top
    )?;
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;

    // Stability spans
    writeln!(svg, r#"<g clip-path="url(#plot)">"#)?;
    for span in band_spans(request.samples, request.bands) {
        write_span(&mut svg, &span, left, right)?;
    }
    writeln!(svg, "</g>")?;

    // Grid
    writeln!(svg, r##"<g stroke="#b0b0b0" stroke-width="0.5">"##)?;
    let mut t = t_lo;
    while t <= t_hi {
        let x = Frame::x(t);
        writeln!(svg, r#"<line x1="{x:.1}" y1="{top:.1}" x2="{x:.1}" y2="{bottom:.1}"/>"#)?;
        t += TEMP_GRID_STEP;
    }
    let mut h = h_lo;
    while h <= h_hi {
        let y = Frame::y(h);
        writeln!(svg, r#"<line x1="{left:.1}" y1="{y:.1}" x2="{right:.1}" y2="{y:.1}"/>"#)?;
        h += HEIGHT_GRID_STEP;
    }
    writeln!(svg, "</g>")?;

    // Profiles
    writeln!(svg, r#"<g clip-path="url(#plot)" fill="none" stroke-width="1.5">"#)?;
    write_profile(&mut svg, request.samples, |s| s.temp_gradient, GRADIENT_PROFILE_COLOR)?;
    write_profile(&mut svg, request.samples, |s| s.temp_mid, TEMP_PROFILE_COLOR)?;
    writeln!(svg, "</g>")?;

    // Axes, ticks and labels
    writeln!(
        svg,
        r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="black"/>"#,
        left,
        top,
        right - left,
        bottom - top
    )?;
    let mut t = t_lo;
    while t <= t_hi {
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            Frame::x(t),
            bottom + 16.0,
            t
        )?;
        t += 2.0 * TEMP_GRID_STEP;
    }
    let mut h = h_lo;
    while h <= h_hi {
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
            left - 6.0,
            Frame::y(h) + 4.0,
            h
        )?;
        h += 2.0 * HEIGHT_GRID_STEP;
    }
    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">Temperature [°C]</text>"#,
        (left + right) / 2.0,
        HEIGHT - 12.0
    )?;
    writeln!(
        svg,
        r#"<text transform="translate(16 {:.1}) rotate(-90)" text-anchor="middle">Altitude AMSL [m]</text>"#,
        (top + bottom) / 2.0
    )?;
    writeln!(
        svg,
        r#"<text x="{:.1}" y="24" text-anchor="middle" font-size="14">{}</text>"#,
        WIDTH / 2.0,
        escape_xml(&request.title())
    )?;
    writeln!(svg, "</svg>")?;

    Ok(svg)
}

fn write_span(
    svg: &mut String,
    span: &BandSpan,
    left: f64,
    right: f64,
) -> std::result::Result<(), std::fmt::Error> {
    let lower = Frame::clamp_height(span.lower);
    let upper = Frame::clamp_height(span.upper);
    if upper <= lower {
        return Ok(());
    }

    writeln!(
        svg,
        r#"<rect x="{:.1}" y="{:.2}" width="{:.1}" height="{:.2}" fill="{}" fill-opacity="{}"/>"#,
        left,
        Frame::y(upper),
        right - left,
        Frame::y(lower) - Frame::y(upper),
        span.color,
        SPAN_OPACITY
    )
}

fn write_profile(
    svg: &mut String,
    samples: &[GradientSample],
    value: impl Fn(&GradientSample) -> f64,
    color: &str,
) -> std::result::Result<(), std::fmt::Error> {
    if samples.is_empty() {
        return Ok(());
    }

    let points: Vec<String> = samples
        .iter()
        .map(|s| format!("{:.1},{:.1}", Frame::x(value(s)), Frame::y(s.height_mid)))
        .collect();

    writeln!(
        svg,
        r#"<polyline stroke="{}" points="{}"/>"#,
        color,
        points.join(" ")
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
