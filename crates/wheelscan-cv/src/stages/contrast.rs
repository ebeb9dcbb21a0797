//! Luma conversion and contrast-limited adaptive histogram equalization
//!
//! The frame is split into a fixed grid of tiles. Each tile gets its own
//! clipped, equalized lookup table and pixels blend the tables of the four
//! nearest tile centres bilinearly, so no seams appear at tile borders.

use image::{GrayImage, Luma, RgbImage};

const BINS: usize = 256;

/// Single-channel intensity of a color image.
pub fn to_luma(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// CLAHE over a `tile_grid` (columns, rows) of tiles.
///
/// Frames that do not divide evenly are padded by mirroring (without
/// repeating the edge pixel) for histogram purposes only.
pub fn equalize_clahe(image: &GrayImage, clip_limit: f64, tile_grid: (u32, u32)) -> GrayImage {
    let (w, h) = image.dimensions();
    let (cols, rows) = (tile_grid.0.max(1) as usize, tile_grid.1.max(1) as usize);
    if w == 0 || h == 0 {
        return image.clone();
    }

    let (w, h) = (w as usize, h as usize);
    let tile_w = w.div_ceil(cols);
    let tile_h = h.div_ceil(rows);
    let tile_area = tile_w * tile_h;

    let clip = if clip_limit > 0.0 {
        Some(((clip_limit * tile_area as f64 / BINS as f64) as u32).max(1))
    } else {
        None
    };

    let mut luts = vec![[0u8; BINS]; cols * rows];
    for ty in 0..rows {
        for tx in 0..cols {
            let mut hist = [0u32; BINS];
            for y in ty * tile_h..(ty + 1) * tile_h {
                let sy = reflect_101(y, h) as u32;
                for x in tx * tile_w..(tx + 1) * tile_w {
                    let sx = reflect_101(x, w) as u32;
                    hist[image.get_pixel(sx, sy)[0] as usize] += 1;
                }
            }
            if let Some(limit) = clip {
                clip_histogram(&mut hist, limit);
            }
            luts[ty * cols + tx] = build_lut(&hist, tile_area);
        }
    }

    let mut out = GrayImage::new(w as u32, h as u32);
    for y in 0..h {
        let (ty0, ty1, fy) = neighbours(y, tile_h, rows);
        for x in 0..w {
            let (tx0, tx1, fx) = neighbours(x, tile_w, cols);
            let v = image.get_pixel(x as u32, y as u32)[0] as usize;

            let lut = |row: usize, col: usize| luts[row * cols + col][v] as f32;
            let top = lut(ty0, tx0) * (1.0 - fx) + lut(ty0, tx1) * fx;
            let bottom = lut(ty1, tx0) * (1.0 - fx) + lut(ty1, tx1) * fx;
            let blended = top * (1.0 - fy) + bottom * fy;

            out.put_pixel(x as u32, y as u32, Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }
    out
}

/// Mirror index `i` into `0..n` without repeating the border sample.
fn reflect_101(i: usize, n: usize) -> usize {
    if n == 1 || i < n {
        return i.min(n - 1);
    }
    (2 * n - 2).saturating_sub(i)
}

/// The two tiles whose centres bracket `pos`, and the weight of the second.
fn neighbours(pos: usize, tile: usize, count: usize) -> (usize, usize, f32) {
    let f = pos as f32 / tile as f32 - 0.5;
    let lower = f.floor();
    let weight = f - lower;
    let first = lower.max(0.0) as usize;
    let second = ((lower + 1.0).max(0.0) as usize).min(count - 1);
    (first.min(count - 1), second, weight)
}

/// Cap every bin at `limit` and spread the excess back over all bins.
fn clip_histogram(hist: &mut [u32; BINS], limit: u32) {
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let batch = excess / BINS as u32;
    let mut residual = excess - batch * BINS as u32;
    for bin in hist.iter_mut() {
        *bin += batch;
    }

    if residual > 0 {
        let step = (BINS / residual as usize).max(1);
        for bin in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *bin += 1;
            residual -= 1;
        }
    }
}

fn build_lut(hist: &[u32; BINS], total: usize) -> [u8; BINS] {
    let scale = 255.0 / total as f32;
    let mut lut = [0u8; BINS];
    let mut sum = 0u32;
    for (entry, &count) in lut.iter_mut().zip(hist.iter()) {
        sum += count;
        *entry = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}
