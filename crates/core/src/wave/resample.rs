/// Number of frames produced when converting `frames` from `source_rate` to
/// `target_rate`, rounded up so the final source frame is always covered.
pub fn output_frames(frames: usize, source_rate: u32, target_rate: u32) -> usize {
    if source_rate == 0 {
        return 0;
    }
    let scaled = frames as u64 * u64::from(target_rate);
    scaled.div_ceil(u64::from(source_rate)) as usize
}

/// Linear-interpolation resampler over interleaved frames.
///
/// Output frame `i` sits at source position `i * source_rate / target_rate`
/// and blends the two neighbouring source frames per channel. Positions past
/// the last frame hold its value. No anti-aliasing filter is applied.
pub fn linear(samples: &[f32], channels: usize, source_rate: u32, target_rate: u32) -> Vec<f32> {
    if channels == 0 || samples.len() < channels || source_rate == target_rate {
        return samples.to_vec();
    }

    let in_frames = samples.len() / channels;
    let out_frames = output_frames(in_frames, source_rate, target_rate);
    let step = f64::from(source_rate) / f64::from(target_rate);
    let last = in_frames - 1;

    let mut out = Vec::with_capacity(out_frames * channels);
    for i in 0..out_frames {
        let position = i as f64 * step;
        let index = (position.floor() as usize).min(last);
        let next = (index + 1).min(last);
        let frac = (position - index as f64).clamp(0.0, 1.0) as f32;

        let current = &samples[index * channels..(index + 1) * channels];
        let following = &samples[next * channels..(next + 1) * channels];
        out.extend(
            current
                .iter()
                .zip(following)
                .map(|(a, b)| a + (b - a) * frac),
        );
    }
    out
}
