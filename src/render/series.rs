//! Time-series graphics for EOF mode scores.

use crate::render::error::RenderError;
use image::{Rgba, RgbaImage};

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 400;
const PAD: u32 = 20;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const AXIS: Rgba<u8> = Rgba([120, 120, 120, 255]);
const LINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
const POSITIVE_FILL: Rgba<u8> = Rgba([214, 96, 77, 255]);
const NEGATIVE_FILL: Rgba<u8> = Rgba([67, 147, 195, 255]);

/// Renders a score time series: the zero axis, a warm fill above it, a cool
/// fill below it, and the score polyline on top.
pub fn render_scores(scores: &[f64]) -> Result<RgbaImage, RenderError> {
    if scores.len() < 2 {
        return Err(RenderError::EmptyData);
    }

    let limit = scores
        .iter()
        .fold(0.0f64, |m, s| m.max(s.abs()))
        .max(f64::MIN_POSITIVE);
    let plot_h = (HEIGHT - 2 * PAD) as f64;
    let plot_w = (WIDTH - 2 * PAD) as f64;
    let zero_y = HEIGHT / 2;
    let to_y = |score: f64| {
        let frac = (score / limit).clamp(-1.0, 1.0);
        (zero_y as f64 - frac * plot_h / 2.0).round() as i64
    };
    let to_x = |i: usize| {
        (PAD as f64 + i as f64 / (scores.len() - 1) as f64 * plot_w).round() as u32
    };

    let mut img = RgbaImage::from_pixel(WIDTH, HEIGHT, WHITE);
    for x in PAD..WIDTH - PAD {
        img.put_pixel(x, zero_y, AXIS);
    }

    // Fill between the zero axis and the interpolated score at each column.
    for x in PAD..WIDTH - PAD {
        let pos = (x - PAD) as f64 / plot_w * (scores.len() - 1) as f64;
        let i = (pos.floor() as usize).min(scores.len() - 2);
        let frac = pos - i as f64;
        let score = scores[i] * (1.0 - frac) + scores[i + 1] * frac;
        let y = to_y(score);
        let (fill, range) = if y < zero_y as i64 {
            (POSITIVE_FILL, y..zero_y as i64)
        } else {
            (NEGATIVE_FILL, zero_y as i64 + 1..y + 1)
        };
        for yy in range {
            if yy >= 0 && (yy as u32) < HEIGHT {
                img.put_pixel(x, yy as u32, fill);
            }
        }
    }

    // Polyline connecting consecutive samples.
    for i in 0..scores.len() - 1 {
        draw_segment(
            &mut img,
            to_x(i) as i64,
            to_y(scores[i]),
            to_x(i + 1) as i64,
            to_y(scores[i + 1]),
        );
    }

    Ok(img)
}

fn draw_segment(img: &mut RgbaImage, x0: i64, y0: i64, x1: i64, y1: i64) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, LINE);
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sample_is_rejected() {
        assert!(matches!(render_scores(&[1.0]), Err(RenderError::EmptyData)));
    }

    #[test]
    fn fills_sit_on_the_correct_side_of_zero() {
        let scores = vec![2.0, 2.0, -2.0, -2.0];
        let img = render_scores(&scores).unwrap();
        assert_eq!(img.width(), WIDTH);
        assert_eq!(img.height(), HEIGHT);

        let zero_y = HEIGHT / 2;
        // Left quarter is positive: warm fill above the axis.
        assert_eq!(*img.get_pixel(WIDTH / 8, zero_y - 20), POSITIVE_FILL);
        // Right quarter is negative: cool fill below the axis.
        assert_eq!(*img.get_pixel(WIDTH * 7 / 8, zero_y + 20), NEGATIVE_FILL);
    }

    #[test]
    fn flat_zero_series_draws_only_the_axis_region() {
        let img = render_scores(&[0.0, 0.0, 0.0]).unwrap();
        let zero_y = HEIGHT / 2;
        assert_eq!(*img.get_pixel(WIDTH / 2, zero_y - 30), WHITE);
        assert_eq!(*img.get_pixel(WIDTH / 2, zero_y + 30), WHITE);
    }
}
