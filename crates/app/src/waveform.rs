/// Levels from silent to full scale, one character per column.
const LEVELS: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Reduces interleaved `samples` to `width` columns of (min, max) over all
/// channels. Columns past the end of a short snapshot stay at zero.
pub fn column_extents(samples: &[f32], channels: usize, width: usize) -> Vec<(f32, f32)> {
    let channels = channels.max(1);
    let frames = samples.len() / channels;
    let mut columns = vec![(0.0_f32, 0.0_f32); width];
    if frames == 0 || width == 0 {
        return columns;
    }

    for (index, frame) in samples.chunks_exact(channels).enumerate() {
        let column = index * width / frames;
        let (min, max) = &mut columns[column];
        for &sample in frame {
            *min = min.min(sample);
            *max = max.max(sample);
        }
    }
    columns
}

/// Renders one line of peak levels, one character per column.
pub fn render_line(columns: &[(f32, f32)]) -> String {
    let top = (LEVELS.len() - 1) as f32;
    columns
        .iter()
        .map(|(min, max)| {
            let peak = min.abs().max(max.abs()).clamp(0.0, 1.0);
            LEVELS[(peak * top).round() as usize]
        })
        .collect()
}
