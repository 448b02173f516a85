// ARIMA(1,1,1) fitted by conditional least squares.
//
// The series is differenced once and an ARMA(1,1) with constant is fit
// to the differences by minimizing the conditional sum of squared
// one-step residuals with Levenberg-Marquardt. The recursion
//
//   e_t = d_t - c - phi * d_{t-1} - theta * e_{t-1},  e_0 = 0
//
// defines the residuals; their derivatives w.r.t. (c, phi, theta) are
// computed by the matching recursions for the exact Jacobian.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{Dyn, OMatrix, OVector, Owned, Vector3, U3};

use crate::types::ConfidenceBand;
use crate::util::mean;

/// Minimum series length for a fit: one differencing step plus at
/// least three conditional residuals to estimate three parameters.
const MIN_POINTS: usize = 5;

struct CssProblem {
    /// Parameter vector [c, phi, theta].
    params: Vector3<f64>,
    /// First differences of the observed series.
    diffs: Vec<f64>,
}

impl CssProblem {
    /// One-step residuals e_1 .. e_{m-1} for the current parameters.
    fn residual_seq(&self) -> Vec<f64> {
        let c = self.params[0];
        let phi = self.params[1];
        let theta = self.params[2];
        let mut out = Vec::with_capacity(self.diffs.len().saturating_sub(1));
        let mut prev_e = 0.0;
        for t in 1..self.diffs.len() {
            let e = self.diffs[t] - c - phi * self.diffs[t - 1] - theta * prev_e;
            out.push(e);
            prev_e = e;
        }
        out
    }
}

impl LeastSquaresProblem<f64, Dyn, U3> for CssProblem {
    type ParameterStorage = Owned<f64, U3>;
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U3>;

    fn set_params(&mut self, p: &Vector3<f64>) {
        self.params.copy_from(p);
    }

    fn params(&self) -> Vector3<f64> {
        self.params
    }

    fn residuals(&self) -> Option<OVector<f64, Dyn>> {
        let seq = self.residual_seq();
        Some(OVector::<f64, Dyn>::from_vec(seq))
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U3>> {
        let c = self.params[0];
        let phi = self.params[1];
        let theta = self.params[2];
        let m = self.diffs.len();
        let mut jac = OMatrix::<f64, Dyn, U3>::zeros(m - 1);

        // Derivatives of e_t follow the same recursion as e_t itself,
        // seeded with zero because e_0 does not depend on the params.
        let mut prev_e = 0.0;
        let (mut dc, mut dphi, mut dtheta) = (0.0, 0.0, 0.0);
        for t in 1..m {
            let e = self.diffs[t] - c - phi * self.diffs[t - 1] - theta * prev_e;
            let dc_t = -1.0 - theta * dc;
            let dphi_t = -self.diffs[t - 1] - theta * dphi;
            let dtheta_t = -prev_e - theta * dtheta;
            jac[(t - 1, 0)] = dc_t;
            jac[(t - 1, 1)] = dphi_t;
            jac[(t - 1, 2)] = dtheta_t;
            prev_e = e;
            dc = dc_t;
            dphi = dphi_t;
            dtheta = dtheta_t;
        }
        Some(jac)
    }
}

/// A fitted ARIMA(1,1,1) model, ready to forecast.
#[derive(Debug, Clone)]
pub struct Arima111 {
    c: f64,
    phi: f64,
    theta: f64,
    sigma2: f64,
    last_value: f64,
    last_diff: f64,
    last_residual: f64,
}

impl Arima111 {
    /// Fit the model on an observed series.
    ///
    /// Fails on short or degenerate input and on non-convergent or
    /// non-stationary/non-invertible estimates; the caller treats any
    /// failure as a signal to drop to the next forecasting tier.
    pub fn fit(values: &[f64]) -> Result<Self, String> {
        let n = values.len();
        if n < MIN_POINTS {
            return Err(format!(
                "need at least {} data points for ARIMA(1,1,1), got {}",
                MIN_POINTS, n
            ));
        }

        let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
        let d_mean = mean(&diffs);
        if diffs.iter().all(|d| (d - d_mean).abs() < 1e-9) {
            return Err("degenerate series: differenced values are constant".to_string());
        }

        // Start from the method-of-moments guesses: the mean difference
        // for c and the lag-1 autocorrelation of the differences for phi.
        let centered: Vec<f64> = diffs.iter().map(|d| d - d_mean).collect();
        let denom: f64 = centered.iter().map(|d| d * d).sum();
        let num: f64 = centered.windows(2).map(|w| w[0] * w[1]).sum();
        let phi0 = if denom > 0.0 {
            (num / denom).clamp(-0.9, 0.9)
        } else {
            0.0
        };

        let problem = CssProblem {
            params: Vector3::new(d_mean, phi0, 0.0),
            diffs: diffs.clone(),
        };
        let (result, report) = LevenbergMarquardt::new().minimize(problem);
        if !report.termination.was_successful() {
            return Err(format!(
                "ARIMA estimation did not converge: {:?}",
                report.termination
            ));
        }

        let c = result.params[0];
        let phi = result.params[1];
        let theta = result.params[2];
        if !c.is_finite() || !phi.is_finite() || !theta.is_finite() {
            return Err("ARIMA estimation produced non-finite parameters".to_string());
        }
        if phi.abs() >= 1.0 {
            return Err(format!("non-stationary AR estimate: phi={:.4}", phi));
        }
        if theta.abs() >= 1.0 {
            return Err(format!("non-invertible MA estimate: theta={:.4}", theta));
        }

        let residuals = result.residual_seq();
        let ssr: f64 = residuals.iter().map(|e| e * e).sum();
        let df = residuals.len().saturating_sub(3).max(1) as f64;
        let sigma2 = ssr / df;

        Ok(Arima111 {
            c,
            phi,
            theta,
            sigma2,
            last_value: values[n - 1],
            last_diff: diffs[diffs.len() - 1],
            last_residual: residuals.last().copied().unwrap_or(0.0),
        })
    }

    /// Point forecasts for the next `steps` periods plus a symmetric
    /// confidence band at the quantile `z` (e.g. 1.96 for 95%).
    pub fn forecast(&self, steps: usize, z: f64) -> (Vec<f64>, ConfidenceBand) {
        // Forecast the differences, then integrate back to levels. The
        // MA term only contributes to the first step ahead.
        let mut point = Vec::with_capacity(steps);
        let mut level = self.last_value;
        let mut prev_d = self.last_diff;
        for j in 0..steps {
            let ma = if j == 0 {
                self.theta * self.last_residual
            } else {
                0.0
            };
            let d = self.c + self.phi * prev_d + ma;
            level += d;
            point.push(level);
            prev_d = d;
        }

        // Forecast error variance via the psi weights of the ARMA(1,1)
        // part, accumulated through the integration step.
        let mut psi_sum = 1.0; // cumulative psi for the integrated series
        let mut psi = 1.0;
        let mut var_acc = 0.0;
        let mut lower = Vec::with_capacity(steps);
        let mut upper = Vec::with_capacity(steps);
        for (j, p) in point.iter().enumerate() {
            var_acc += psi_sum * psi_sum;
            let se = (self.sigma2 * var_acc).sqrt();
            lower.push(p - z * se);
            upper.push(p + z * se);
            psi = if j == 0 {
                self.phi + self.theta
            } else {
                self.phi * psi
            };
            psi_sum += psi;
        }

        (point, ConfidenceBand { lower, upper })
    }
}
