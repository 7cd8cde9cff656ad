use simple_sampler_core::waveform::Waveform;

/// Draws the waveform as text, `width` columns by `rows` lines.
pub fn render_ascii(waveform: &Waveform, width: usize, rows: usize) -> Vec<String> {
    let rows = rows.max(1);
    let width = width.max(1);
    let mut grid = vec![vec![' '; width]; rows];

    let amplitude = (rows - 1) as f32 / 2.0;
    for (x, y) in waveform.path_points(width, (rows - 1) as f32, amplitude) {
        let x = x as usize;
        if x >= width {
            break;
        }
        let row = (y.round().max(0.0) as usize).min(rows - 1);
        grid[row][x] = '*';
    }

    grid.into_iter().map(|line| line.into_iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_one_point_per_column() {
        let waveform = Waveform::new("w", vec![1.0, 0.0, -1.0, 0.0], 4);
        let lines = render_ascii(&waveform, 4, 3);
        assert_eq!(lines, vec!["*   ", " * *", "  * "]);
    }

    #[test]
    fn empty_waveform_is_blank() {
        let lines = render_ascii(&Waveform::default(), 8, 2);
        assert!(lines.iter().all(|l| l.trim().is_empty()));
    }
}
