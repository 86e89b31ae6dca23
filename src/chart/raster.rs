//! Minimal raster plotting on top of `image::RgbImage`.
//!
//! Charts carry no text: axes, ticks, colorbars and reference lines only.

use image::{Rgb, RgbImage};

use crate::sweep::ProbabilityGrid;

pub type Color = Rgb<u8>;

pub const WHITE: Color = Rgb([255, 255, 255]);
pub const BLACK: Color = Rgb([0, 0, 0]);
pub const BAR_GRAY: Color = Rgb([128, 128, 128]);
pub const THRESHOLD_RED: Color = Rgb([214, 39, 40]);
pub const GRID_GRAY: Color = Rgb([210, 210, 210]);

/// Qualitative palette for category bars.
const PALETTE: [Color; 6] = [
    Rgb([31, 119, 180]),
    Rgb([255, 127, 14]),
    Rgb([44, 160, 44]),
    Rgb([148, 103, 189]),
    Rgb([140, 86, 75]),
    Rgb([23, 190, 207]),
];

/// ColorBrewer "Greens", light to dark.
const GREENS: [[u8; 3]; 9] = [
    [247, 252, 245],
    [229, 245, 224],
    [199, 233, 192],
    [161, 217, 155],
    [116, 196, 118],
    [65, 171, 93],
    [35, 139, 69],
    [0, 109, 44],
    [0, 68, 27],
];

const TICKS: u32 = 5;
const TICK_LEN: u32 = 6;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn of(image: &RgbImage) -> Self {
        Self {
            x: 0,
            y: 0,
            width: image.width(),
            height: image.height(),
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn inset(self, left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            x: self.x + left.min(self.width),
            y: self.y + top.min(self.height),
            width: self.width.saturating_sub(left + right),
            height: self.height.saturating_sub(top + bottom),
        }
    }

    /// Left and right halves.
    pub fn split_columns(self) -> (Self, Self) {
        let left = self.width / 2;
        (
            Self {
                width: left,
                ..self
            },
            Self {
                x: self.x + left,
                width: self.width - left,
                ..self
            },
        )
    }
}

/// Maps `[lo, hi]` data values onto pixel offsets.
#[derive(Debug, Clone, Copy)]
struct Scale {
    lo: f64,
    hi: f64,
}

impl Scale {
    fn fraction(&self, value: f64) -> f64 {
        let span = self.hi - self.lo;
        if span.abs() < f64::EPSILON {
            return 0.0;
        }
        ((value - self.lo) / span).clamp(0.0, 1.0)
    }

    fn x(&self, plot: Rect, value: f64) -> u32 {
        plot.x + (self.fraction(value) * plot.width as f64).round() as u32
    }

    fn y(&self, plot: Rect, value: f64) -> u32 {
        plot.bottom() - (self.fraction(value) * plot.height as f64).round() as u32
    }
}

/// Interpolated "Greens" colour for a fraction in `[0, 1]`.
pub fn greens(fraction: f64) -> Color {
    let f = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    let scaled = f * (GREENS.len() - 1) as f64;
    let idx = (scaled.floor() as usize).min(GREENS.len() - 2);
    let t = scaled - idx as f64;
    let (a, b) = (GREENS[idx], GREENS[idx + 1]);
    let mix = |i: usize| (a[i] as f64 + (b[i] as f64 - a[i] as f64) * t).round() as u8;
    Rgb([mix(0), mix(1), mix(2)])
}

pub fn blank(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

pub fn fill_rect(image: &mut RgbImage, rect: Rect, color: Color) {
    let x_end = rect.right().min(image.width());
    let y_end = rect.bottom().min(image.height());
    for y in rect.y..y_end {
        for x in rect.x..x_end {
            image.put_pixel(x, y, color);
        }
    }
}

fn outline(image: &mut RgbImage, rect: Rect, color: Color) {
    hline(image, rect.x, rect.right(), rect.y, 1, color, None);
    hline(image, rect.x, rect.right(), rect.bottom(), 1, color, None);
    vline(image, rect.x, rect.y, rect.bottom(), color);
    vline(image, rect.right(), rect.y, rect.bottom(), color);
}

/// Horizontal line, optionally dashed as `(on, off)` pixel runs.
pub fn hline(
    image: &mut RgbImage,
    x0: u32,
    x1: u32,
    y: u32,
    thickness: u32,
    color: Color,
    dash: Option<(u32, u32)>,
) {
    let x_end = x1.min(image.width().saturating_sub(1));
    for x in x0..=x_end {
        if let Some((on, off)) = dash {
            if (x - x0) % (on + off).max(1) >= on {
                continue;
            }
        }
        for dy in 0..thickness {
            let py = y + dy;
            if py < image.height() {
                image.put_pixel(x, py, color);
            }
        }
    }
}

pub fn vline(image: &mut RgbImage, x: u32, y0: u32, y1: u32, color: Color) {
    if x >= image.width() {
        return;
    }
    let y_end = y1.min(image.height().saturating_sub(1));
    for y in y0..=y_end {
        image.put_pixel(x, y, color);
    }
}

fn draw_axes(image: &mut RgbImage, plot: Rect) {
    hline(image, plot.x, plot.right(), plot.bottom(), 1, BLACK, None);
    vline(image, plot.x, plot.y, plot.bottom(), BLACK);
    for i in 0..=TICKS {
        let x = plot.x + plot.width * i / TICKS;
        vline(image, x, plot.bottom(), plot.bottom() + TICK_LEN, BLACK);
        let y = plot.bottom() - plot.height * i / TICKS;
        hline(image, plot.x.saturating_sub(TICK_LEN), plot.x, y, 1, BLACK, None);
    }
}

fn draw_y_grid(image: &mut RgbImage, plot: Rect) {
    for i in 1..=TICKS {
        let y = plot.bottom() - plot.height * i / TICKS;
        hline(image, plot.x, plot.right(), y, 1, GRID_GRAY, Some((6, 4)));
    }
}

/// Heatmap of `grid` with origin at the lower left and a colorbar on the right.
pub fn draw_heatmap(image: &mut RgbImage, region: Rect, grid: &ProbabilityGrid) {
    let plot = region.inset(80, 30, 140, 70);
    let colorbar = Rect {
        x: plot.right() + 30,
        y: plot.y,
        width: 24,
        height: plot.height,
    };
    let (lo, hi) = grid.bounds().unwrap_or((0.0, 1.0));
    let scale = Scale { lo, hi };
    let (rows, cols) = (grid.rows(), grid.cols());

    if rows > 0 && cols > 0 && plot.width > 0 && plot.height > 0 {
        for py in 0..plot.height {
            let row_frac = 1.0 - (py as f64 + 0.5) / plot.height as f64;
            let row = ((row_frac * rows as f64) as usize).min(rows - 1);
            for px in 0..plot.width {
                let col_frac = (px as f64 + 0.5) / plot.width as f64;
                let col = ((col_frac * cols as f64) as usize).min(cols - 1);
                let fraction = match grid.get(row, col) {
                    Some(v) if v.is_finite() => scale.fraction(v),
                    Some(v) if v > 0.0 => 1.0,
                    _ => 0.0,
                };
                image.put_pixel(plot.x + px, plot.y + py, greens(fraction));
            }
        }
    }

    for py in 0..colorbar.height {
        let fraction = 1.0 - py as f64 / colorbar.height.max(1) as f64;
        let color = greens(fraction);
        for px in 0..colorbar.width {
            let (x, y) = (colorbar.x + px, colorbar.y + py);
            if x < image.width() && y < image.height() {
                image.put_pixel(x, y, color);
            }
        }
    }
    outline(image, colorbar, BLACK);
    draw_axes(image, plot);
}

/// Gray utilization bars with a dashed saturation line at rho = 1.
pub fn draw_utilization_bars(image: &mut RgbImage, region: Rect, series: &[(f64, f64)]) {
    let plot = region.inset(80, 30, 30, 70);
    draw_y_grid(image, plot);

    let peak = series
        .iter()
        .map(|&(_, rho)| rho)
        .filter(|rho| rho.is_finite())
        .fold(1.0_f64, f64::max);
    let y_scale = Scale {
        lo: 0.0,
        hi: peak * 1.1,
    };

    if let (Some(&(first, _)), Some(&(last, _))) = (series.first(), series.last()) {
        let spacing = match series.get(1) {
            Some(&(second, _)) if second > first => second - first,
            _ => 1.0,
        };
        let x_scale = Scale {
            lo: first - spacing / 2.0,
            hi: last + spacing / 2.0,
        };
        let half_bar = spacing * 0.3;
        for &(x, rho) in series {
            if !rho.is_finite() || rho <= 0.0 {
                continue;
            }
            let left = x_scale.x(plot, x - half_bar);
            let right = x_scale.x(plot, x + half_bar);
            let top = y_scale.y(plot, rho);
            fill_rect(
                image,
                Rect {
                    x: left,
                    y: top,
                    width: right.saturating_sub(left).max(1),
                    height: plot.bottom().saturating_sub(top),
                },
                BAR_GRAY,
            );
        }
    }

    let threshold = y_scale.y(plot, 1.0);
    hline(
        image,
        plot.x,
        plot.right(),
        threshold.saturating_sub(1),
        2,
        THRESHOLD_RED,
        Some((12, 8)),
    );
    draw_axes(image, plot);
}

/// One coloured bar per value, optionally on a log10 axis.
pub fn draw_category_bars(image: &mut RgbImage, region: Rect, values: &[f64], log_scale: bool) {
    let plot = region.inset(80, 30, 30, 70);
    draw_y_grid(image, plot);

    let positive: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    let max = positive.iter().copied().fold(0.0_f64, f64::max);
    let min = positive.iter().copied().fold(f64::INFINITY, f64::min);
    let transform = |v: f64| if log_scale { v.log10() } else { v };
    let y_scale = if positive.is_empty() {
        Scale { lo: 0.0, hi: 1.0 }
    } else if log_scale {
        Scale {
            lo: min.log10().floor() - 1.0,
            hi: max.log10().ceil(),
        }
    } else {
        Scale {
            lo: 0.0,
            hi: max * 1.1,
        }
    };

    let count = values.len().max(1) as u32;
    let slot = plot.width / count;
    for (i, &value) in values.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            continue;
        }
        let top = y_scale.y(plot, transform(value));
        fill_rect(
            image,
            Rect {
                x: plot.x + slot * i as u32 + slot / 5,
                y: top,
                width: (slot * 3 / 5).max(1),
                height: plot.bottom().saturating_sub(top),
            },
            PALETTE[i % PALETTE.len()],
        );
    }
    draw_axes(image, plot);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greens_endpoints() {
        assert_eq!(greens(0.0), Rgb([247, 252, 245]));
        assert_eq!(greens(1.0), Rgb([0, 68, 27]));
        assert_eq!(greens(f64::NAN), greens(0.0));
    }

    #[test]
    fn inset_saturates() {
        let rect = Rect {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        };
        let inner = rect.inset(8, 8, 8, 8);
        assert_eq!((inner.width, inner.height), (0, 0));
    }

    #[test]
    fn threshold_line_is_red() {
        let mut image = blank(400, 300);
        let region = Rect::of(&image);
        draw_utilization_bars(&mut image, region, &[(100.0, 0.5), (200.0, 2.0)]);
        let has_red = image.pixels().any(|p| *p == THRESHOLD_RED);
        let has_bar = image.pixels().any(|p| *p == BAR_GRAY);
        assert!(has_red && has_bar);
    }
}
