//! Piecewise-linear range mapping

/// What to do with inputs outside the input range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Extrapolate {
    /// Continue the slope of the nearest segment
    #[default]
    Extend,
    /// Pin to the nearest output bound
    Clamp,
    /// Return the input unchanged
    Identity,
}

/// Map `value` from `input` breakpoints onto `output` breakpoints.
///
/// `input` must be non-decreasing and both slices must have the same length
/// of at least two; otherwise `value` is returned unchanged.
pub fn interpolate(value: f64, input: &[f64], output: &[f64], extrapolate: Extrapolate) -> f64 {
    if input.len() < 2 || input.len() != output.len() {
        tracing::debug!(
            inputs = input.len(),
            outputs = output.len(),
            "interpolate called with mismatched ranges"
        );
        return value;
    }

    let last = input.len() - 1;
    let below = value < input[0];
    let above = value > input[last];

    if below || above {
        match extrapolate {
            Extrapolate::Clamp => return if below { output[0] } else { output[last] },
            Extrapolate::Identity => return value,
            Extrapolate::Extend => {}
        }
    }

    // Segment containing the value (edge segments for extrapolation)
    let segment = if below {
        0
    } else if above {
        last - 1
    } else {
        input
            .windows(2)
            .position(|w| value <= w[1])
            .unwrap_or(last - 1)
    };

    let (x0, x1) = (input[segment], input[segment + 1]);
    let (y0, y1) = (output[segment], output[segment + 1]);
    if x1 == x0 {
        return y1;
    }
    y0 + (value - x0) * (y1 - y0) / (x1 - x0)
}
