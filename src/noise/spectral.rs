//! Spectral estimates for noise tests
//!
//! Welch-style averaging of Hann-windowed Goertzel bins. Only the bins a
//! test asks for are evaluated, so no FFT is needed.

use std::f64::consts::PI;

/// Power of DFT bin `k` of a Hann-windowed segment
pub fn goertzel_power(segment: &[f64], k: f64) -> f64 {
    let n = segment.len() as f64;
    let omega = 2.0 * PI * k / n;
    let coeff = 2.0 * omega.cos();
    let mean = segment.iter().sum::<f64>() / n;

    let (mut s_prev, mut s_prev2) = (0.0, 0.0);
    for (i, &x) in segment.iter().enumerate() {
        let window = 0.5 - 0.5 * (2.0 * PI * i as f64 / (n - 1.0)).cos();
        let s = (x - mean) * window + coeff * s_prev - s_prev2;
        s_prev2 = s_prev;
        s_prev = s;
    }

    s_prev * s_prev + s_prev2 * s_prev2 - coeff * s_prev * s_prev2
}

/// Mean power of bin `k` over consecutive segments of `segment_len`
pub fn averaged_power(samples: &[f64], segment_len: usize, k: f64) -> f64 {
    let segments: Vec<&[f64]> = samples.chunks_exact(segment_len).collect();
    if segments.is_empty() {
        return 0.0;
    }
    segments.iter().map(|s| goertzel_power(s, k)).sum::<f64>() / segments.len() as f64
}

/// Least-squares slope of log10(power) against log10(bin) over
/// geometrically spaced bins in `[k_min, k_max]`
pub fn psd_slope(samples: &[f64], segment_len: usize, k_min: usize, k_max: usize) -> f64 {
    let mut bins = Vec::new();
    let mut k = k_min as f64;
    while k <= k_max as f64 {
        let bin = k.round() as usize;
        if bins.last() != Some(&bin) {
            bins.push(bin);
        }
        k *= 2f64.powf(0.25);
    }

    let points: Vec<(f64, f64)> = bins
        .iter()
        .map(|&bin| {
            let power = averaged_power(samples, segment_len, bin as f64);
            ((bin as f64).log10(), power.max(f64::MIN_POSITIVE).log10())
        })
        .collect();

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let cov: f64 = points.iter().map(|p| (p.0 - mean_x) * (p.1 - mean_y)).sum();
    let var: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    cov / var
}

/// Summed power over `[f_low, f_high]` Hz for samples taken at `sample_rate_hz`
pub fn band_power(
    samples: &[f64],
    segment_len: usize,
    sample_rate_hz: f64,
    f_low: f64,
    f_high: f64,
) -> f64 {
    let resolution = sample_rate_hz / segment_len as f64;
    let k_low = (f_low / resolution).ceil() as usize;
    let k_high = (f_high / resolution).floor() as usize;
    (k_low..=k_high)
        .map(|k| averaged_power(samples, segment_len, k as f64))
        .sum()
}

/// Frequency (Hz) of the strongest bin in `[f_low, f_high]`
pub fn peak_frequency(
    samples: &[f64],
    segment_len: usize,
    sample_rate_hz: f64,
    f_low: f64,
    f_high: f64,
) -> f64 {
    let resolution = sample_rate_hz / segment_len as f64;
    let k_low = (f_low / resolution).ceil() as usize;
    let k_high = (f_high / resolution).floor() as usize;

    let mut best = (k_low, f64::MIN);
    for k in k_low..=k_high {
        let power = averaged_power(samples, segment_len, k as f64);
        if power > best.1 {
            best = (k, power);
        }
    }
    best.0 as f64 * resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goertzel_finds_sine() {
        let n = 1024;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 32.0 * i as f64 / n as f64).sin())
            .collect();

        let on_bin = goertzel_power(&signal, 32.0);
        let off_bin = goertzel_power(&signal, 100.0);
        assert!(on_bin > off_bin * 1e6);
    }

    #[test]
    fn test_peak_frequency() {
        let rate = 100.0;
        let signal: Vec<f64> = (0..4096)
            .map(|i| (2.0 * PI * 10.0 * i as f64 / rate).sin())
            .collect();

        let peak = peak_frequency(&signal, 1024, rate, 2.0, 40.0);
        assert!((peak - 10.0).abs() < 0.2, "peak at {peak}");
    }
}
