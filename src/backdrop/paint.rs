/// Procedural rasters for the page backgrounds.
use image::{Rgba, RgbaImage};

pub const GRID_TILE: u32 = 300;
pub const GRID_LINE: u32 = 10;
/// `rgba(1,241,248,0.9)`
pub const GRID_COLOR: Rgba<u8> = Rgba([1, 241, 248, 230]);

pub const SUN_SIZE: u32 = 512;
pub const SUN_STRIPE_PITCH: u32 = 22;
pub const SUN_STRIPE_HEIGHT: u32 = 14;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

// ── Grid ──────────────────────────────────────────────────────────────────────

pub struct GridTiles {
    /// Line along the left edge, full height.
    pub vertical: RgbaImage,
    /// Line along the top edge, full width.
    pub horizontal: RgbaImage,
}

pub fn grid_tiles() -> GridTiles {
    let mut vertical = RgbaImage::from_pixel(GRID_TILE, GRID_TILE, TRANSPARENT);
    fill_rect(&mut vertical, 0, 0, GRID_LINE, GRID_TILE, GRID_COLOR);

    let mut horizontal = RgbaImage::from_pixel(GRID_TILE, GRID_TILE, TRANSPARENT);
    fill_rect(&mut horizontal, 0, 0, GRID_TILE, GRID_LINE, GRID_COLOR);

    GridTiles { vertical, horizontal }
}

fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, color);
        }
    }
}

// ── Sun disc ──────────────────────────────────────────────────────────────────

/// Radial gradient stops, offset in `[0, 1]` from centre to edge.
pub fn sun_stops(core: Rgba<u8>, rim: Rgba<u8>) -> [(f32, Rgba<u8>); 5] {
    [
        (0.0, Rgba([0xff, 0xf6, 0xd2, 255])),
        (0.38, core),
        (0.62, Rgba([0xff, 0x9c, 0x66, 255])),
        (0.85, rim),
        (1.0, rim),
    ]
}

/// A radial gradient disc cut into horizontal bands: rows inside a stripe
/// keep the gradient, rows in the gaps and everything outside the circle
/// are transparent.
pub fn sun_disc(core: Rgba<u8>, rim: Rgba<u8>) -> RgbaImage {
    let stops = sun_stops(core, rim);
    let radius = SUN_SIZE as f32 / 2.0;

    RgbaImage::from_fn(SUN_SIZE, SUN_SIZE, |x, y| {
        if y % SUN_STRIPE_PITCH >= SUN_STRIPE_HEIGHT {
            return TRANSPARENT;
        }
        let dx = x as f32 + 0.5 - radius;
        let dy = y as f32 + 0.5 - radius;
        let dist = (dx * dx + dy * dy).sqrt();
        // half-pixel ramp at the rim
        let coverage = (radius - dist + 0.5).clamp(0.0, 1.0);
        if coverage == 0.0 {
            return TRANSPARENT;
        }
        let Rgba([r, g, b, a]) = gradient_at(&stops, dist / radius);
        Rgba([r, g, b, (a as f32 * coverage).round() as u8])
    })
}

fn gradient_at(stops: &[(f32, Rgba<u8>)], t: f32) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);
    let Some(&(first_at, first)) = stops.first() else {
        return TRANSPARENT;
    };
    if t <= first_at {
        return first;
    }
    for pair in stops.windows(2) {
        let (a_at, a) = pair[0];
        let (b_at, b) = pair[1];
        if t <= b_at {
            let span = b_at - a_at;
            let f = if span > 0.0 { (t - a_at) / span } else { 1.0 };
            return lerp(a, b, f);
        }
    }
    stops[stops.len() - 1].1
}

fn lerp(a: Rgba<u8>, b: Rgba<u8>, f: f32) -> Rgba<u8> {
    let mix = |i: usize| (a.0[i] as f32 + (b.0[i] as f32 - a.0[i] as f32) * f).round() as u8;
    Rgba([mix(0), mix(1), mix(2), mix(3)])
}
