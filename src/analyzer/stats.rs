/**
* filename : stats
* author : HAMA
* date: 2025. 4. 11.
* description: Order-independent summaries over fee-rate samples
**/

/// Sums in sorted order so the result does not depend on sample order.
pub fn mean(samples: &[f64]) -> Option<f64> {
  if samples.is_empty() {
    return None;
  }
  let mut sorted = samples.to_vec();
  sorted.sort_by(f64::total_cmp);
  Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
}

/// Middle value of the sorted samples; the average of the two middle values
/// for an even count.
pub fn median(samples: &[f64]) -> Option<f64> {
  if samples.is_empty() {
    return None;
  }
  let mut sorted = samples.to_vec();
  sorted.sort_by(f64::total_cmp);
  let mid = sorted.len() / 2;
  if sorted.len() % 2 == 0 {
    Some((sorted[mid - 1] + sorted[mid]) / 2.0)
  } else {
    Some(sorted[mid])
  }
}

pub fn min(samples: &[f64]) -> Option<f64> {
  samples.iter().copied().min_by(f64::total_cmp)
}

pub fn max(samples: &[f64]) -> Option<f64> {
  samples.iter().copied().max_by(f64::total_cmp)
}
