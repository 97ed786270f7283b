//! Rasterized map graphics for observation tables and gridded fields.
//!
//! Maps are drawn straight into an RGBA buffer: tables are splatted point by
//! point, grids are sampled nearest-cell per output pixel. A horizontal
//! colorbar with tick notches runs along the bottom of every map.

use crate::prism::derive::ColorScale;
use crate::render::colormap::Colormap;
use crate::render::error::RenderError;
use crate::types::spatial::SpatialWindow;
use image::{Rgba, RgbaImage};
use log::info;
use polars::prelude::DataFrame;
use std::path::Path;

pub const MAP_WIDTH: u32 = 1200;
const MIN_MAP_HEIGHT: u32 = 100;
const MAX_MAP_HEIGHT: u32 = 2400;
const COLORBAR_HEIGHT: u32 = 28;
const COLORBAR_MARGIN: u32 = 12;

/// Fill behind the data, CSS aliceblue.
const BACKGROUND: Rgba<u8> = Rgba([240, 248, 255, 255]);
const TICK_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Map height preserving the window's aspect ratio in plate carrée.
fn map_height(window: &SpatialWindow) -> u32 {
    let ratio = window.lat_span() / window.lon_span();
    ((MAP_WIDTH as f64 * ratio).round() as u32).clamp(MIN_MAP_HEIGHT, MAX_MAP_HEIGHT)
}

fn blank_canvas(window: &SpatialWindow) -> (RgbaImage, u32) {
    let h = map_height(window);
    let total_h = h + COLORBAR_MARGIN + COLORBAR_HEIGHT;
    let mut img = RgbaImage::from_pixel(MAP_WIDTH, total_h, BACKGROUND);
    for y in h..total_h {
        for x in 0..MAP_WIDTH {
            img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }
    (img, h)
}

fn to_pixel(window: &SpatialWindow, map_h: u32, lat: f64, lon: f64) -> Option<(u32, u32)> {
    if !window.contains(lat, lon) {
        return None;
    }
    let x = (lon - window.west) / window.lon_span() * (MAP_WIDTH - 1) as f64;
    let y = (window.north - lat) / window.lat_span() * (map_h - 1) as f64;
    Some((x.round() as u32, y.round() as u32))
}

fn draw_colorbar(img: &mut RgbaImage, map_h: u32, scale: &ColorScale, cmap: &Colormap) {
    let top = map_h + COLORBAR_MARGIN;
    for x in 0..MAP_WIDTH {
        let t = x as f64 / (MAP_WIDTH - 1) as f64;
        let color = cmap.sample(t);
        for y in top..top + COLORBAR_HEIGHT {
            img.put_pixel(x, y, color);
        }
    }
    // Tick notches extend above and below the bar.
    for tick in &scale.ticks {
        let t = scale.normalize(*tick);
        let x = (t * (MAP_WIDTH - 1) as f64).round() as u32;
        for y in top.saturating_sub(6)..(top + COLORBAR_HEIGHT + 6).min(img.height()) {
            img.put_pixel(x, y, TICK_COLOR);
        }
    }
}

/// Renders an observation table (`latitude`, `longitude`, value column) into
/// a map image. Each observation is splatted as a small square so the dense
/// PRISM grids fill in solid at map resolution.
pub fn render_table(
    df: &DataFrame,
    variable: &str,
    window: &SpatialWindow,
    scale: &ColorScale,
    cmap: &Colormap,
) -> Result<RgbaImage, RenderError> {
    let lats = df
        .column("latitude")
        .and_then(|c| c.f64().cloned())
        .map_err(|_| RenderError::EmptyData)?;
    let lons = df
        .column("longitude")
        .and_then(|c| c.f64().cloned())
        .map_err(|_| RenderError::EmptyData)?;
    let vals = df
        .column(variable)
        .and_then(|c| c.f64().cloned())
        .map_err(|_| RenderError::EmptyData)?;
    if df.height() == 0 {
        return Err(RenderError::EmptyData);
    }

    let (mut img, map_h) = blank_canvas(window);
    let splat = 2i64;
    for ((lat, lon), val) in (&lats).into_iter().zip(&lons).zip(&vals) {
        let (Some(lat), Some(lon), Some(val)) = (lat, lon, val) else {
            continue;
        };
        if !val.is_finite() {
            continue;
        }
        let Some((px, py)) = to_pixel(window, map_h, lat, lon) else {
            continue;
        };
        let color = cmap.sample(scale.normalize(val));
        for dy in -splat..=splat {
            for dx in -splat..=splat {
                let x = px as i64 + dx;
                let y = py as i64 + dy;
                if x >= 0 && y >= 0 && (x as u32) < MAP_WIDTH && (y as u32) < map_h {
                    img.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }

    draw_colorbar(&mut img, map_h, scale, cmap);
    Ok(img)
}

/// Renders a row-major (lat, lon) grid into a map image by nearest-cell
/// sampling. NaN cells keep the background color.
pub fn render_field(
    values: &[f64],
    lats: &[f64],
    lons: &[f64],
    scale: &ColorScale,
    cmap: &Colormap,
) -> Result<RgbaImage, RenderError> {
    if values.is_empty() || lats.is_empty() || lons.is_empty() {
        return Err(RenderError::EmptyData);
    }
    let (south, north) = min_max(lats);
    let (west, east) = min_max(lons);
    let window = SpatialWindow {
        west,
        east: if east > west { east } else { west + 1.0 },
        south,
        north: if north > south { north } else { south + 1.0 },
    };

    let (mut img, map_h) = blank_canvas(&window);
    for py in 0..map_h {
        let lat = window.north - py as f64 / (map_h - 1).max(1) as f64 * window.lat_span();
        let yi = nearest_index(lats, lat);
        for px in 0..MAP_WIDTH {
            let lon = window.west + px as f64 / (MAP_WIDTH - 1) as f64 * window.lon_span();
            let xi = nearest_index(lons, lon);
            let v = values[yi * lons.len() + xi];
            if v.is_finite() {
                img.put_pixel(px, py, cmap.sample(scale.normalize(v)));
            }
        }
    }

    draw_colorbar(&mut img, map_h, scale, cmap);
    Ok(img)
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

fn nearest_index(coords: &[f64], target: f64) -> usize {
    let mut best = 0;
    let mut best_dist = f64::MAX;
    for (i, &c) in coords.iter().enumerate() {
        let d = (c - target).abs();
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

pub fn save_png(img: &RgbaImage, path: &Path) -> Result<(), RenderError> {
    img.save(path)
        .map_err(|e| RenderError::Write(path.to_path_buf(), e))?;
    info!("Wrote {}", path.display());
    Ok(())
}
