use crate::braille::BrailleCanvas;

/// A ring projected into braille pixel space
pub type PixelRing = Vec<(f64, f64)>;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Scanline fill with the even-odd rule. Holes are just more rings.
///
/// Pixel centers are sampled at (x + 0.5, y + 0.5).
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[PixelRing]) {
    let (pixel_w, pixel_h) = canvas.pixel_size();
    if pixel_w == 0 || pixel_h == 0 {
        return;
    }

    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    if !min_y.is_finite() || !max_y.is_finite() {
        return;
    }

    let row_start = (min_y.floor().max(0.0)) as usize;
    let row_end = (max_y.ceil().min(pixel_h as f64 - 1.0)).max(0.0) as usize;

    let mut crossings: Vec<f64> = Vec::new();

    for row in row_start..=row_end {
        let sy = row as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            let mut prev = ring[ring.len() - 1];
            for &cur in ring {
                let (x0, y0) = prev;
                let (x1, y1) = cur;
                // Half-open rule avoids double counting shared vertices
                if (y0 <= sy && y1 > sy) || (y1 <= sy && y0 > sy) {
                    crossings.push(x0 + (sy - y0) / (y1 - y0) * (x1 - x0));
                }
                prev = cur;
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().max(0.0);
            let end = (pair[1] - 0.5).floor().min(pixel_w as f64 - 1.0);
            if end >= start {
                canvas.fill_span(row, start as usize, end as usize);
            }
        }
    }
}

/// Even-odd point in polygon test over all rings
pub fn rings_contain(rings: &[Vec<(f64, f64)>], x: f64, y: f64) -> bool {
    let mut inside = false;
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (xi, yi) = ring[i];
            let (xj, yj) = ring[j];
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<(f64, f64)> {
        vec![(x0, y0), (x0 + size, y0), (x0 + size, y0 + size), (x0, y0 + size), (x0, y0)]
    }

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert_eq!(canvas.to_string(), "⠉⠉⠉⠉⠉");
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.to_string(), "⡇\n⡇");
    }

    #[test]
    fn test_fill_full_cell() {
        let mut canvas = BrailleCanvas::new(1, 1);
        fill_polygon(&mut canvas, &[square(0.0, 0.0, 2.0)]);
        // 2x2 square covers the top two dot rows
        assert_eq!(canvas.to_string(), "⠛");

        let mut canvas = BrailleCanvas::new(1, 1);
        fill_polygon(&mut canvas, &[square(0.0, 0.0, 4.0)]);
        assert_eq!(canvas.to_string(), "⣿");
    }

    #[test]
    fn test_fill_respects_hole() {
        let mut canvas = BrailleCanvas::new(3, 3);
        fill_polygon(&mut canvas, &[square(0.0, 0.0, 6.0), square(2.0, 4.0, 2.0)]);
        assert!(canvas.is_set(0, 0));
        assert!(canvas.is_set(5, 5));
        assert!(!canvas.is_set(2, 4));
        assert!(!canvas.is_set(3, 5));
    }

    #[test]
    fn test_fill_clips_offscreen() {
        let mut canvas = BrailleCanvas::new(2, 2);
        fill_polygon(&mut canvas, &[square(-50.0, -50.0, 100.0)]);
        assert_eq!(canvas.to_string(), "⣿⣿\n⣿⣿");
    }

    #[test]
    fn test_rings_contain() {
        let rings = vec![square(0.0, 0.0, 10.0), square(4.0, 4.0, 2.0)];
        assert!(rings_contain(&rings, 1.0, 1.0));
        assert!(!rings_contain(&rings, 5.0, 5.0));
        assert!(!rings_contain(&rings, 11.0, 1.0));
    }
}
