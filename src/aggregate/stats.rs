// src/aggregate/stats.rs
//! Small numeric helpers over `f64` samples. Empty input gives `None`.

pub fn min(xs: &[f64]) -> Option<f64> {
    xs.iter().copied().reduce(f64::min)
}

pub fn max(xs: &[f64]) -> Option<f64> {
    xs.iter().copied().reduce(f64::max)
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

fn sorted(xs: &[f64]) -> Vec<f64> {
    let mut v = xs.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

pub fn median(xs: &[f64]) -> Option<f64> {
    let v = sorted(xs);
    let n = v.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(v[n / 2]),
        _ => Some((v[n / 2 - 1] + v[n / 2]) / 2.0),
    }
}

/// Mean after cutting `floor(proportion * n)` samples off each end of the
/// sorted sample.
pub fn trim_mean(xs: &[f64], proportion: f64) -> Option<f64> {
    let v = sorted(xs);
    let n = v.len();
    let cut = (proportion.clamp(0.0, 0.5) * n as f64).floor() as usize;
    if cut * 2 >= n {
        return None;
    }
    mean(&v[cut..n - cut])
}

/// `ln(x + 1)`, undefined at or below -1.
pub fn ln_1p(x: f64) -> Option<f64> {
    (x > -1.0).then(|| x.ln_1p())
}

/// `a / b`, `None` when the quotient is not a finite number.
pub fn ratio(a: f64, b: f64) -> Option<f64> {
    let q = a / b;
    q.is_finite().then_some(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_aggregates() {
        let xs = [3.0, 1.0, 2.0, 10.0];
        assert_eq!(min(&xs), Some(1.0));
        assert_eq!(max(&xs), Some(10.0));
        assert_eq!(mean(&xs), Some(4.0));
        assert_eq!(median(&xs), Some(2.5));
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn trimmed_mean_cuts_both_tails() {
        // ten samples, one cut from each end
        let xs = [100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, -50.0];
        assert_eq!(trim_mean(&xs, 0.1), Some(4.5));
        // fewer than ten samples: nothing is cut
        assert_eq!(trim_mean(&[1.0, 2.0, 6.0], 0.1), Some(3.0));
        assert_eq!(trim_mean(&[], 0.1), None);
    }

    #[test]
    fn log_and_ratio_domains() {
        assert_eq!(ln_1p(0.0), Some(0.0));
        assert!(ln_1p(-1.0).is_none());
        assert!(ln_1p(-3.0).is_none());
        assert_eq!(ratio(20.0, 100.0), Some(0.2));
        assert_eq!(ratio(0.0, 0.0), None);
        assert_eq!(ratio(1.0, 0.0), None);
    }
}
