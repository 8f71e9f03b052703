use crate::braille::BrailleCanvas;

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

/// Scan-convert projected rings with the even-odd rule.
///
/// A pixel is inside when its centre is; `plot(x, y)` is called once per
/// covered pixel inside the `width` x `height` canvas. Holes fall out of the
/// even-odd rule, so all rings of one polygon go in together.
pub fn fill_rings<F>(rings: &[Vec<(f64, f64)>], width: usize, height: usize, mut plot: F)
where
    F: FnMut(usize, usize),
{
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in rings.iter().flatten() {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !min_y.is_finite() || !max_y.is_finite() || height == 0 || width == 0 {
        return;
    }

    let row_start = (min_y - 0.5).ceil().max(0.0) as usize;
    let row_end = ((max_y - 0.5).floor().min(height as f64 - 1.0)).max(-1.0);
    if row_end < row_start as f64 {
        return;
    }
    let row_end = row_end as usize;

    let mut crossings: Vec<f64> = Vec::new();
    for row in row_start..=row_end {
        let yc = row as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            if ring.len() < 3 {
                continue;
            }
            let mut prev = ring[ring.len() - 1];
            for &point in ring {
                let (x0, y0) = prev;
                let (x1, y1) = point;
                if (y0 <= yc) != (y1 <= yc) {
                    crossings.push(x0 + (yc - y0) * (x1 - x0) / (y1 - y0));
                }
                prev = point;
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0);
            let end = (span[1] - 0.5).ceil().min(width as f64);
            if end <= start {
                continue;
            }
            for x in start as usize..end as usize {
                plot(x, row);
            }
        }
    }
}
