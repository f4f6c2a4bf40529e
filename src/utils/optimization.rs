//! Bounded Nelder-Mead simplex search used to estimate smoothing and ARMA
//! parameters.

use std::cmp::Ordering;

/// Best vertex found by [`nelder_mead`].
#[derive(Debug, Clone)]
pub struct Minimum {
    pub point: Vec<f64>,
    /// Objective at `point`.
    pub value: f64,
    pub iterations: usize,
    /// False when the iteration budget ran out first.
    pub converged: bool,
}

/// Simplex search settings. The move coefficients are the textbook ones.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    pub max_iterations: usize,
    /// Stop once objective values or vertex spread fall below this.
    pub tolerance: f64,
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
    /// Relative offset of the starting vertices; absolute for zero coordinates.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-8,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
            initial_step: 0.05,
        }
    }
}

/// Minimise `objective` starting from `initial`, clamping every candidate
/// into `bounds` when given.
///
/// # Example
/// ```
/// use booking_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 0.4).powi(2),
///     &[0.1],
///     Some(&[(0.0, 1.0)]),
///     NelderMeadConfig::default(),
/// );
/// assert!((result.point[0] - 0.4).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Minimum {
            point: Vec::new(),
            value: f64::NAN,
            iterations: 0,
            converged: false,
        };
    }

    let clamp = |point: Vec<f64>| clamp_to(point, bounds);
    // NaN objective values sort as worst.
    let eval = |point: &[f64]| {
        let v = objective(point);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(clamp(initial.to_vec()));
    for i in 0..n {
        let mut vertex = initial.to_vec();
        vertex[i] += if initial[i].abs() > 1e-10 {
            config.initial_step * initial[i].abs()
        } else {
            config.initial_step
        };
        simplex.push(clamp(vertex));
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
        let (best, second_worst, worst) = (order[0], order[n - 1], order[n]);

        if (values[worst] - values[best]).abs() < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);
        let diameter = simplex
            .iter()
            .map(|v| distance(v, &centroid))
            .fold(0.0, f64::max);
        if diameter < config.tolerance {
            converged = true;
            break;
        }

        let reflected = clamp(lerp(&centroid, &simplex[worst], -config.reflection));
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = clamp(lerp(&centroid, &reflected, config.expansion));
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        // Outside contraction when the reflection improved on the worst
        // vertex, inside contraction otherwise.
        let (target, target_value) = if reflected_value < values[worst] {
            (reflected, reflected_value)
        } else {
            (simplex[worst].clone(), values[worst])
        };
        let contracted = clamp(lerp(&centroid, &target, config.contraction));
        let contracted_value = eval(&contracted);
        if contracted_value < target_value {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i == best {
                continue;
            }
            let shrunk = clamp(lerp(&anchor, &simplex[i], config.shrink));
            values[i] = eval(&shrunk);
            simplex[i] = shrunk;
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    Minimum {
        point: simplex[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

/// `from + t * (to - from)`, element-wise.
fn lerp(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(a, b)| a + t * (b - a)).collect()
}

fn centroid_without(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let dims = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; dims];
    for (i, vertex) in simplex.iter().enumerate() {
        if i == exclude {
            continue;
        }
        for (c, v) in centroid.iter_mut().zip(vertex) {
            *c += v;
        }
    }
    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

fn clamp_to(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
