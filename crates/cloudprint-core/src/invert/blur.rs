//! Separable box blur over flat luminance buffers
//!
//! Each pass slides a window of `2 * radius + 1` samples along one axis,
//! keeping a running sum: the sample entering on the trailing edge is added
//! and the one leaving the leading edge is subtracted. Near the borders the
//! window is clipped and the sum is divided by the number of samples actually
//! inside it, so a uniform input stays uniform all the way to the edges.

/// Horizontal pass: average each sample with its row neighbours within `radius`
pub fn blur_horizontal(values: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
    debug_assert_eq!(values.len(), width * height);
    let mut output = vec![0.0; values.len()];
    if width == 0 || height == 0 {
        return output;
    }

    for y in 0..height {
        let row = y * width;
        sliding_mean(
            width,
            radius,
            |x| values[row + x],
            |x, mean| output[row + x] = mean,
        );
    }

    output
}

/// Vertical pass: average each sample with its column neighbours within `radius`
pub fn blur_vertical(values: &[f32], width: usize, height: usize, radius: usize) -> Vec<f32> {
    debug_assert_eq!(values.len(), width * height);
    let mut output = vec![0.0; values.len()];
    if width == 0 || height == 0 {
        return output;
    }

    for x in 0..width {
        sliding_mean(
            height,
            radius,
            |y| values[y * width + x],
            |y, mean| output[y * width + x] = mean,
        );
    }

    output
}

/// Running-sum mean over a line of `len` samples
fn sliding_mean(
    len: usize,
    radius: usize,
    sample: impl Fn(usize) -> f32,
    mut emit: impl FnMut(usize, f32),
) {
    let mut sum = 0.0f64;
    let mut count = 0usize;

    // Prime with everything left of the first trailing edge
    for i in 0..radius.min(len) {
        sum += sample(i) as f64;
        count += 1;
    }

    for i in 0..len {
        let entering = i + radius;
        if entering < len {
            sum += sample(entering) as f64;
            count += 1;
        }
        if i > radius {
            sum -= sample(i - radius - 1) as f64;
            count -= 1;
        }
        emit(i, (sum / count as f64) as f32);
    }
}
