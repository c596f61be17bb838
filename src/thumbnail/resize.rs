/// Aspect-preserving fit with centering
///
/// The source is scaled uniformly so it fits entirely inside the target
/// box, then drawn centered on a transparent canvas of exactly the
/// requested size. Whatever the scaled image does not cover stays transparent.
use image::{imageops, imageops::FilterType, DynamicImage, RgbaImage};

use super::key::ThumbnailSize;

/// High quality filter used for every thumbnail
const FILTER: FilterType = FilterType::Lanczos3;

/// Where the scaled source lands on the target canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitLayout {
    pub dest_width: u32,
    pub dest_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// Compute the placement of a `source_width`×`source_height` image in `target`.
///
/// scale = min(tw / sw, th / sh), dest = round(src × scale), centered.
/// Dest dimensions are clamped to `1..=target` so degenerate aspect ratios
/// still draw a visible sliver and rounding never overflows the canvas.
pub fn fit_into(source_width: u32, source_height: u32, target: ThumbnailSize) -> FitLayout {
    if target.is_empty() || source_width == 0 || source_height == 0 {
        return FitLayout {
            dest_width: 0,
            dest_height: 0,
            offset_x: target.width / 2,
            offset_y: target.height / 2,
        };
    }

    let scale_w = target.width as f64 / source_width as f64;
    let scale_h = target.height as f64 / source_height as f64;
    let scale = scale_w.min(scale_h);

    let dest_width = ((source_width as f64 * scale).round() as u32).clamp(1, target.width);
    let dest_height = ((source_height as f64 * scale).round() as u32).clamp(1, target.height);

    FitLayout {
        dest_width,
        dest_height,
        offset_x: (target.width - dest_width) / 2,
        offset_y: (target.height - dest_height) / 2,
    }
}

/// Render a thumbnail canvas of exactly `target` from a decoded source.
///
/// Takes the source by value: the full-size decode is dropped as soon as
/// the scaled copy exists.
pub fn render_thumbnail(source: DynamicImage, target: ThumbnailSize) -> DynamicImage {
    let layout = fit_into(source.width(), source.height(), target);
    let mut canvas = RgbaImage::new(target.width, target.height);

    if layout.dest_width == 0 || layout.dest_height == 0 {
        return DynamicImage::ImageRgba8(canvas);
    }

    let scaled = source
        .resize_exact(layout.dest_width, layout.dest_height, FILTER)
        .into_rgba8();
    drop(source);

    imageops::replace(
        &mut canvas,
        &scaled,
        i64::from(layout.offset_x),
        i64::from(layout.offset_y),
    );

    DynamicImage::ImageRgba8(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_landscape_into_square() {
        let layout = fit_into(4000, 3000, ThumbnailSize::square(120));
        assert_eq!(
            layout,
            FitLayout {
                dest_width: 120,
                dest_height: 90,
                offset_x: 0,
                offset_y: 15,
            }
        );
    }

    #[test]
    fn test_portrait_into_square() {
        let layout = fit_into(600, 1200, ThumbnailSize::square(240));
        assert_eq!(layout.dest_width, 120);
        assert_eq!(layout.dest_height, 240);
        assert_eq!(layout.offset_x, 60);
        assert_eq!(layout.offset_y, 0);
    }

    #[test]
    fn test_upscales_small_sources() {
        let layout = fit_into(30, 20, ThumbnailSize::square(120));
        assert_eq!((layout.dest_width, layout.dest_height), (120, 80));
        assert_eq!((layout.offset_x, layout.offset_y), (0, 20));
    }

    #[test]
    fn test_aspect_ratio_preserved() {
        let target = ThumbnailSize::square(120);
        for (w, h) in [(4000, 3000), (1920, 1080), (1000, 1500), (333, 777), (5000, 200)] {
            let layout = fit_into(w, h, target);
            let source_ratio = w as f64 / h as f64;
            let dest_ratio = layout.dest_width as f64 / layout.dest_height as f64;
            // One pixel of rounding on the short side
            let tolerance = source_ratio.max(1.0 / source_ratio) / layout.dest_width.min(layout.dest_height) as f64;
            assert!(
                (source_ratio - dest_ratio).abs() <= tolerance + 1e-9,
                "{}x{} -> {:?}",
                w,
                h,
                layout
            );
            assert!(layout.dest_width <= target.width && layout.dest_height <= target.height);
        }
    }

    #[test]
    fn test_degenerate_aspect_keeps_a_sliver() {
        let layout = fit_into(10_000, 1, ThumbnailSize::square(120));
        assert_eq!(layout.dest_width, 120);
        assert_eq!(layout.dest_height, 1);
    }

    #[test]
    fn test_render_pads_with_transparency() {
        let source = DynamicImage::ImageRgb8(image::ImageBuffer::from_pixel(400, 300, Rgb([200u8, 10, 10])));
        let thumb = render_thumbnail(source, ThumbnailSize::square(120)).into_rgba8();

        assert_eq!(thumb.dimensions(), (120, 120));
        // Letterbox bands
        assert_eq!(thumb.get_pixel(60, 0)[3], 0);
        assert_eq!(thumb.get_pixel(60, 14)[3], 0);
        assert_eq!(thumb.get_pixel(60, 105)[3], 0);
        assert_eq!(thumb.get_pixel(60, 119)[3], 0);
        // Drawn region
        assert_eq!(thumb.get_pixel(60, 15)[3], 255);
        assert_eq!(thumb.get_pixel(60, 60)[3], 255);
        assert_eq!(thumb.get_pixel(60, 104)[3], 255);
    }

    #[test]
    fn test_render_empty_target() {
        let source = DynamicImage::new_rgb8(10, 10);
        let thumb = render_thumbnail(source, ThumbnailSize::new(0, 50));
        assert_eq!((thumb.width(), thumb.height()), (0, 50));
    }
}
