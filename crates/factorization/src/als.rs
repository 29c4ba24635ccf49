//! Implicit-feedback alternating least squares.
//!
//! Each stored interaction value `c` is a confidence for preference 1;
//! missing entries are preference 0 with confidence 1. One iteration solves
//! every user row with the item factors fixed, then every item row with the
//! user factors fixed:
//!
//! ```text
//! x_u = (YᵀY + Σ_i (c_ui - 1) y_i y_iᵀ + λI)⁻¹ Σ_i c_ui y_i
//! ```
//!
//! The per-row systems are independent and solved in parallel. Results are
//! collected in row order, so a fixed seed always yields the same model.

use crate::{FactorModel, FactorizationError, FactorizationParams, Factorizer, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use sprs::CsMat;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Upper bound of the uniform factor initialisation
const INIT_SCALE: f64 = 0.01;

/// Sparse rows as `(column, confidence)` pairs
type Adjacency = Vec<Vec<(usize, f64)>>;

/// ALS solver with no state of its own; all settings come from
/// `FactorizationParams`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsFactorizer;

impl AlsFactorizer {
    pub fn new() -> Self {
        Self
    }
}

impl Factorizer for AlsFactorizer {
    fn name(&self) -> &'static str {
        "als"
    }

    #[instrument(skip(self, interactions), fields(users = interactions.rows(), items = interactions.cols()))]
    fn fit(
        &self,
        interactions: &CsMat<f32>,
        params: &FactorizationParams,
    ) -> Result<Box<dyn FactorModel>> {
        params.validate()?;
        validate_interactions(interactions)?;

        let start = Instant::now();
        let (user_rows, item_rows) = adjacency(interactions);
        let lambda = f64::from(params.regularization);

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut user_factors = random_factors(&mut rng, interactions.rows(), params.factors);
        let mut item_factors = random_factors(&mut rng, interactions.cols(), params.factors);

        for iteration in 0..params.iterations {
            user_factors = solve_rows(&item_factors, &user_rows, lambda)?;
            item_factors = solve_rows(&user_factors, &item_rows, lambda)?;

            debug!(
                iteration,
                loss = implicit_loss(&user_factors, &item_factors, &user_rows, lambda),
                "ALS iteration complete"
            );
        }

        info!(
            factors = params.factors,
            iterations = params.iterations,
            nnz = interactions.nnz(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ALS model fitted"
        );

        Ok(Box::new(AlsModel {
            user_factors: user_factors.mapv(|v| v as f32),
            item_factors: item_factors.mapv(|v| v as f32),
        }))
    }
}

/// Fitted user and item factor matrices
#[derive(Debug, Clone)]
pub struct AlsModel {
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
}

impl AlsModel {
    pub fn user_factors(&self) -> &Array2<f32> {
        &self.user_factors
    }

    pub fn item_factors(&self) -> &Array2<f32> {
        &self.item_factors
    }
}

impl FactorModel for AlsModel {
    fn recommend(
        &self,
        user_index: usize,
        user_items: &CsMat<f32>,
        n: usize,
    ) -> Result<Vec<(usize, f32)>> {
        if user_index >= self.n_users() {
            return Err(FactorizationError::UnknownUser {
                index: user_index,
                n_users: self.n_users(),
            });
        }

        // CSR row indices are sorted
        let liked: Vec<usize> = user_items
            .outer_view(user_index)
            .map(|row| row.indices().to_vec())
            .unwrap_or_default();

        let scores = self.item_factors.dot(&self.user_factors.row(user_index));

        let mut ranked: Vec<(usize, f32)> = scores
            .iter()
            .enumerate()
            .filter(|(item, _)| liked.binary_search(item).is_err())
            .map(|(item, &score)| (item, score))
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        Ok(ranked)
    }

    fn n_users(&self) -> usize {
        self.user_factors.nrows()
    }

    fn n_items(&self) -> usize {
        self.item_factors.nrows()
    }

    fn factors(&self) -> usize {
        self.user_factors.ncols()
    }
}

fn validate_interactions(interactions: &CsMat<f32>) -> Result<()> {
    if !interactions.is_csr() {
        return Err(FactorizationError::InvalidInput(
            "matrix must be in CSR (user-major) storage".into(),
        ));
    }
    if interactions.rows() == 0 || interactions.cols() == 0 || interactions.nnz() == 0 {
        return Err(FactorizationError::InvalidInput(
            "matrix has no interactions".into(),
        ));
    }
    if let Some(bad) = interactions
        .data()
        .iter()
        .find(|v| !v.is_finite() || **v <= 0.0)
    {
        return Err(FactorizationError::InvalidInput(format!(
            "interaction values must be finite and positive, found {bad}"
        )));
    }
    Ok(())
}

/// User-major and item-major views of the same interactions
fn adjacency(interactions: &CsMat<f32>) -> (Adjacency, Adjacency) {
    let mut item_rows: Adjacency = vec![Vec::new(); interactions.cols()];

    let user_rows: Adjacency = interactions
        .outer_iterator()
        .enumerate()
        .map(|(user, row)| {
            row.iter()
                .map(|(item, &value)| {
                    item_rows[item].push((user, f64::from(value)));
                    (item, f64::from(value))
                })
                .collect()
        })
        .collect();

    (user_rows, item_rows)
}

fn random_factors(rng: &mut StdRng, rows: usize, factors: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, factors), |_| rng.random::<f64>() * INIT_SCALE)
}

/// Solve every row of `rows` against the fixed factor matrix
fn solve_rows(fixed: &Array2<f64>, rows: &Adjacency, lambda: f64) -> Result<Array2<f64>> {
    let factors = fixed.ncols();
    let gram = fixed.t().dot(fixed);

    let solutions: Vec<Array1<f64>> = rows
        .par_iter()
        .map(|entries| {
            let mut a = gram.clone();
            let mut b = Array1::<f64>::zeros(factors);

            for &(col, confidence) in entries {
                let y = fixed.row(col);
                for p in 0..factors {
                    b[p] += confidence * y[p];
                    for q in 0..factors {
                        a[[p, q]] += (confidence - 1.0) * y[p] * y[q];
                    }
                }
            }
            for p in 0..factors {
                a[[p, p]] += lambda;
            }

            cholesky_solve(a, b)
        })
        .collect::<Result<_>>()?;

    let mut solved = Array2::<f64>::zeros((rows.len(), factors));
    for (i, solution) in solutions.into_iter().enumerate() {
        solved.row_mut(i).assign(&solution);
    }
    Ok(solved)
}

/// Solve `a x = b` for symmetric positive-definite `a`
fn cholesky_solve(mut a: Array2<f64>, b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();

    // Lower triangle of `a` becomes L with a = L Lᵀ
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= a[[j, k]] * a[[j, k]];
        }
        if !diag.is_finite() || diag <= 0.0 {
            return Err(FactorizationError::NumericalFailure(format!(
                "normal equations not positive definite (pivot {j} = {diag})"
            )));
        }
        let diag = diag.sqrt();
        a[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= a[[i, k]] * a[[j, k]];
            }
            a[[i, j]] = sum / diag;
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= a[[i, k]] * y[k];
        }
        y[i] = sum / a[[i, i]];
    }

    // Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= a[[k, i]] * x[k];
        }
        x[i] = sum / a[[i, i]];
    }

    Ok(x)
}

/// Weighted squared error over the full matrix plus the L2 penalty.
///
/// The all-zero-preference part is `tr(XᵀX · YᵀY)`; observed entries then
/// swap their zero-preference term for the weighted one.
fn implicit_loss(x: &Array2<f64>, y: &Array2<f64>, user_rows: &Adjacency, lambda: f64) -> f64 {
    let unobserved = (&x.t().dot(x) * &y.t().dot(y)).sum();

    let observed: f64 = user_rows
        .iter()
        .enumerate()
        .map(|(user, entries)| {
            let xu = x.row(user);
            entries
                .iter()
                .map(|&(item, confidence)| {
                    let predicted = xu.dot(&y.row(item));
                    confidence * (1.0 - predicted).powi(2) - predicted.powi(2)
                })
                .sum::<f64>()
        })
        .sum();

    let penalty = lambda * (x.iter().map(|v| v * v).sum::<f64>() + y.iter().map(|v| v * v).sum::<f64>());
    unobserved + observed + penalty
}
