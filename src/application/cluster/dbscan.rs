//! Density-based clustering over embedding vectors.

/// Cosine similarity in `[-1, 1]`. Zero vectors are dissimilar to everything.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Label points with DBSCAN using cosine distance.
///
/// `min_samples` counts the point itself. Returns one label per point;
/// `None` marks noise.
#[must_use]
pub fn dbscan(points: &[Vec<f32>], eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let n = points.len();
    let neighbours: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| 1.0 - cosine_similarity(&points[i], &points[j]) <= eps || i == j)
                .collect()
        })
        .collect();
    let is_core: Vec<bool> = neighbours.iter().map(|nb| nb.len() >= min_samples).collect();

    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut next_label = 0;

    for start in 0..n {
        if labels[start].is_some() || !is_core[start] {
            continue;
        }
        let label = next_label;
        next_label += 1;
        labels[start] = Some(label);

        let mut stack = vec![start];
        while let Some(point) = stack.pop() {
            if !is_core[point] {
                continue;
            }
            for &nb in &neighbours[point] {
                if labels[nb].is_none() {
                    labels[nb] = Some(label);
                    stack.push(nb);
                }
            }
        }
    }

    labels
}
