/// Decorative page backgrounds.
///
/// Two generators, each gated on its own target element:
///   `.bg-grid`   → a pair of tileable 300×300 line tiles (vertical + horizontal)
///   `.bg-sunset` → a striped sun disc, colours taken from `--sun-core` / `--sun-rim`
///
/// Images are encoded as PNG data URLs and applied through a generated
/// stylesheet, so the page needs no drawing support of its own.
pub mod color;
pub mod page;
pub mod paint;

use std::fmt::Write as _;
use std::io::Cursor;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, Rgba, RgbaImage};

pub use page::Page;

pub const GRID_SELECTOR: &str = "bg-grid";
pub const SUNSET_SELECTOR: &str = "bg-sunset";

pub const SUN_CORE_VAR: &str = "--sun-core";
pub const SUN_RIM_VAR: &str = "--sun-rim";
pub const SUN_CORE_DEFAULT: Rgba<u8> = Rgba([0xff, 0xd2, 0x9a, 255]);
pub const SUN_RIM_DEFAULT: Rgba<u8> = Rgba([0xff, 0x6a, 0x4d, 255]);

// ── Output ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridBackground {
    pub vertical_url: String,
    pub horizontal_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SunsetBackground {
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decorations {
    pub grid: Option<GridBackground>,
    pub sunset: Option<SunsetBackground>,
}

impl Decorations {
    pub fn is_empty(&self) -> bool {
        self.grid.is_none() && self.sunset.is_none()
    }

    /// Style rules applying the generated images to their target elements.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        if let Some(grid) = &self.grid {
            let size = format!("{t}px {t}px", t = paint::GRID_TILE);
            let _ = writeln!(css, ".{GRID_SELECTOR} {{");
            let _ = writeln!(
                css,
                "  background-image: url({}), url({});",
                grid.vertical_url, grid.horizontal_url
            );
            let _ = writeln!(css, "  background-size: {size}, {size};");
            let _ = writeln!(css, "}}");
        }
        if let Some(sun) = &self.sunset {
            let _ = writeln!(css, ".{SUNSET_SELECTOR} {{");
            let _ = writeln!(css, "  background-image: url({});", sun.image_url);
            let _ = writeln!(css, "  background-repeat: no-repeat;");
            let _ = writeln!(css, "  background-size: 100% 100%;");
            let _ = writeln!(css, "  -webkit-mask: none;");
            let _ = writeln!(css, "  mask: none;");
            let _ = writeln!(css, "}}");
        }
        css
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Generate backgrounds for whichever target elements `page` contains.
/// A page with neither target gets no images and no raster work.
pub fn decorate(page: &Page) -> Result<Decorations> {
    let mut out = Decorations::default();

    if page.has(GRID_SELECTOR) {
        let tiles = paint::grid_tiles();
        out.grid = Some(GridBackground {
            vertical_url: png_data_url(&tiles.vertical)?,
            horizontal_url: png_data_url(&tiles.horizontal)?,
        });
        tracing::debug!("grid tiles generated");
    }

    if page.has(SUNSET_SELECTOR) {
        let core = sun_color(page, SUN_CORE_VAR, SUN_CORE_DEFAULT);
        let rim = sun_color(page, SUN_RIM_VAR, SUN_RIM_DEFAULT);
        out.sunset = Some(SunsetBackground {
            image_url: png_data_url(&paint::sun_disc(core, rim))?,
        });
        tracing::debug!(?core, ?rim, "sun disc generated");
    }

    if out.is_empty() {
        tracing::debug!("no backdrop targets on page");
    }
    Ok(out)
}

fn sun_color(page: &Page, var: &str, fallback: Rgba<u8>) -> Rgba<u8> {
    match page.var(var) {
        Some(raw) => color::parse(raw).unwrap_or_else(|| {
            tracing::warn!(var, value = raw, "unparseable colour, using default");
            fallback
        }),
        None => fallback,
    }
}

pub fn png_data_url(img: &RgbaImage) -> Result<String> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(buf.into_inner())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(url: &str) -> RgbaImage {
        let b64 = url.strip_prefix("data:image/png;base64,").unwrap();
        let bytes = BASE64.decode(b64).unwrap();
        image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .to_rgba8()
    }

    #[test]
    fn test_no_targets_no_images() {
        let decorations = decorate(&Page::default().with_var(SUN_CORE_VAR, "#fff")).unwrap();
        assert!(decorations.is_empty());
        assert_eq!(decorations.to_css(), "");
    }

    #[test]
    fn test_grid_only() {
        let decorations = decorate(&Page::default().with_class(GRID_SELECTOR)).unwrap();
        assert!(decorations.sunset.is_none());
        let grid = decorations.grid.as_ref().unwrap();
        let v = decode(&grid.vertical_url);
        assert_eq!(v.dimensions(), (300, 300));
        assert_eq!(*v.get_pixel(5, 100), paint::GRID_COLOR);

        let css = decorations.to_css();
        assert!(css.starts_with(".bg-grid {"));
        assert!(css.contains("background-size: 300px 300px, 300px 300px;"));
        assert!(!css.contains(".bg-sunset"));
    }

    #[test]
    fn test_sunset_uses_page_colours() {
        let rim = "#102030";
        let page = Page::default()
            .with_class(SUNSET_SELECTOR)
            .with_var(SUN_RIM_VAR, &format!("  {rim} "));
        let decorations = decorate(&page).unwrap();
        assert!(decorations.grid.is_none());
        let img = decode(&decorations.sunset.as_ref().unwrap().image_url);
        assert_eq!(img.dimensions(), (512, 512));
        assert_eq!(*img.get_pixel(256, 10), Rgba([0x10, 0x20, 0x30, 255]));

        let css = decorations.to_css();
        assert!(css.contains("background-repeat: no-repeat;"));
        assert!(css.contains("background-size: 100% 100%;"));
        assert!(css.contains("mask: none;"));
    }

    #[test]
    fn test_bad_colour_falls_back() {
        let page = Page::default().with_var(SUN_CORE_VAR, "not-a-colour");
        assert_eq!(sun_color(&page, SUN_CORE_VAR, SUN_CORE_DEFAULT), SUN_CORE_DEFAULT);
        assert_eq!(sun_color(&page, SUN_RIM_VAR, SUN_RIM_DEFAULT), SUN_RIM_DEFAULT);
    }

    #[test]
    fn test_both_targets_from_html() {
        let html = r#"<div class="bg-grid"></div><div class="bg-sunset"></div>"#;
        let decorations = decorate(&Page::parse(html, &[])).unwrap();
        assert!(decorations.grid.is_some());
        assert!(decorations.sunset.is_some());
        let css = decorations.to_css();
        assert!(css.find(".bg-grid").unwrap() < css.find(".bg-sunset").unwrap());
    }
}
