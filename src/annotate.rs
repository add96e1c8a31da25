//! Debug overlay for analysis results
//!
//! Draws the detected seam and the cover-region boundaries onto a copy of
//! the original page so detections can be checked by eye.

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::analyzer::SpreadReport;
use crate::cover_region::RegionOutcome;

/// Seam line color
pub const SEAM_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Accepted cover-region boundaries
pub const REGION_COLOR: Rgb<u8> = Rgb([0, 200, 0]);

/// Boundaries of a candidate rejected as too wide
pub const REJECTED_REGION_COLOR: Rgb<u8> = Rgb([255, 190, 0]);

/// Line thickness relative to image width
const LINE_WIDTH_DIVISOR: u32 = 400;

/// Render `report` over a copy of `image`
pub fn draw_analysis(image: &DynamicImage, report: &SpreadReport) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = canvas.dimensions();
    let thickness = (width / LINE_WIDTH_DIVISOR).max(2);

    if let Some(rect) = report.cover_region.candidate {
        let color = match report.cover_region.outcome {
            RegionOutcome::Cropped => REGION_COLOR,
            _ => REJECTED_REGION_COLOR,
        };
        draw_vertical_line(&mut canvas, rect.x, thickness, color);
        draw_vertical_line(&mut canvas, rect.right().saturating_sub(1), thickness, color);
    }

    if report.is_double_page && width >= 2 && height > 0 {
        draw_vertical_line(&mut canvas, report.seam.x, thickness, SEAM_COLOR);
    }

    canvas
}

/// Full-height line centered on `x`, clipped to the canvas
fn draw_vertical_line(canvas: &mut RgbImage, x: u32, thickness: u32, color: Rgb<u8>) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let left = x.saturating_sub(thickness / 2).min(width - 1);
    let line_width = thickness.min(width - left);
    let rect = Rect::at(left as i32, 0).of_size(line_width, height);
    draw_filled_rect_mut(canvas, rect, color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::SpreadAnalyzer;

    fn framed_cover() -> DynamicImage {
        // dark frame lines at 20% and 80% of a light wraparound scan
        DynamicImage::ImageRgb8(RgbImage::from_fn(1000, 400, |x, _| {
            if (198..203).contains(&x) || (798..803).contains(&x) {
                Rgb([0, 0, 0])
            } else {
                Rgb([235, 235, 235])
            }
        }))
    }

    #[test]
    fn test_overlay_keeps_size() {
        let image = framed_cover();
        let report = SpreadAnalyzer::default().analyze(&image).unwrap();
        let canvas = draw_analysis(&image, &report);
        assert_eq!(canvas.dimensions(), (1000, 400));
    }

    #[test]
    fn test_seam_drawn_in_red() {
        let image = framed_cover();
        let report = SpreadAnalyzer::default().analyze(&image).unwrap();
        let canvas = draw_analysis(&image, &report);
        assert_eq!(*canvas.get_pixel(report.seam.x, 200), SEAM_COLOR);
    }

    #[test]
    fn test_region_boundaries_drawn() {
        let image = framed_cover();
        let report = SpreadAnalyzer::default().analyze(&image).unwrap();
        assert_eq!(report.cover_region.outcome, RegionOutcome::Cropped);
        let rect = report.cover_region.candidate.unwrap();
        let canvas = draw_analysis(&image, &report);
        assert_eq!(*canvas.get_pixel(rect.x, 10), REGION_COLOR);
        assert_eq!(*canvas.get_pixel(rect.right() - 1, 10), REGION_COLOR);
    }

    #[test]
    fn test_line_clipped_at_right_edge() {
        let mut canvas = RgbImage::new(10, 4);
        draw_vertical_line(&mut canvas, 9, 4, SEAM_COLOR);
        assert_eq!(*canvas.get_pixel(9, 3), SEAM_COLOR);
        assert_eq!(*canvas.get_pixel(8, 0), SEAM_COLOR);
        assert_eq!(*canvas.get_pixel(6, 0), Rgb([0, 0, 0]));
    }
}
