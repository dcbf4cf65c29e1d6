//! Two parallel diodes fed through a resistor.
//!
//! Each diode follows the Shockley equation:
//!   I = Is * (exp(V / Vt) - 1)
//!
//! with small-signal conductance
//!   G = dI/dV = Is/Vt * exp(V/Vt)

use tracing::info;

use super::THERMAL_VOLTAGE;
use crate::error::{RaphsonError, Result};
use crate::linalg::Matrix;
use crate::solver::{NewtonRaphson, SolveResult, SolverConfig};
use crate::system::NonlinearSystem;

/// Parameters of the reference circuit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeCircuitParams {
    /// Source voltage (V)
    pub vs: f64,
    /// Series resistance (Ω)
    pub r: f64,
    /// Saturation current of the first diode (A)
    pub is1: f64,
    /// Saturation current of the second diode (A)
    pub is2: f64,
    /// Thermal voltage (V)
    pub vt: f64,
}

impl Default for DiodeCircuitParams {
    fn default() -> Self {
        Self {
            vs: 5.0,
            r: 1000.0,
            is1: 2e-12,
            is2: 5e-12,
            vt: THERMAL_VOLTAGE,
        }
    }
}

impl DiodeCircuitParams {
    /// Check that every parameter is positive and finite.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("vs", self.vs),
            ("r", self.r),
            ("is1", self.is1),
            ("is2", self.is2),
            ("vt", self.vt),
        ];
        for (param, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(RaphsonError::invalid_parameter(
                    param,
                    format!("must be positive and finite, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// The circuit as a nonlinear system in `x = [I1, I2, VD]`.
///
/// ```text
/// f1 = I1 + I2 - (Vs - VD) / R
/// f2 = I1 - Is1 * (exp(VD / Vt) - 1)
/// f3 = I2 - Is2 * (exp(VD / Vt) - 1)
/// ```
#[derive(Debug, Clone)]
pub struct DiodeCircuit {
    params: DiodeCircuitParams,
}

impl DiodeCircuit {
    /// Create the system after validating `params`.
    pub fn new(params: DiodeCircuitParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DiodeCircuitParams {
        &self.params
    }

    /// Diode current at junction voltage `vd`.
    fn current(&self, is: f64, vd: f64) -> f64 {
        is * ((vd / self.params.vt).exp() - 1.0)
    }

    /// dI/dV at junction voltage `vd`.
    fn conductance(&self, is: f64, vd: f64) -> f64 {
        is / self.params.vt * (vd / self.params.vt).exp()
    }

    fn check_point(x: &[f64]) -> Result<()> {
        if x.len() != 3 {
            return Err(RaphsonError::dimension_mismatch("point", 3, x.len()));
        }
        Ok(())
    }
}

impl NonlinearSystem for DiodeCircuit {
    fn dimension(&self) -> usize {
        3
    }

    fn residual(&self, x: &[f64]) -> Result<Vec<f64>> {
        Self::check_point(x)?;
        let p = &self.params;
        let (i1, i2, vd) = (x[0], x[1], x[2]);

        Ok(vec![
            i1 + i2 - (p.vs - vd) / p.r,
            i1 - self.current(p.is1, vd),
            i2 - self.current(p.is2, vd),
        ])
    }

    fn jacobian(&self, x: &[f64]) -> Result<Matrix> {
        Self::check_point(x)?;
        let p = &self.params;
        let vd = x[2];

        Matrix::from_rows(vec![
            vec![1.0, 1.0, 1.0 / p.r],
            vec![1.0, 0.0, -self.conductance(p.is1, vd)],
            vec![0.0, 1.0, -self.conductance(p.is2, vd)],
        ])
    }
}

/// Operating point of the circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct DiodeSolution {
    /// Current through the first diode (A)
    pub i1: f64,
    /// Current through the second diode (A)
    pub i2: f64,
    /// Junction voltage (V)
    pub vd: f64,
    /// Full solver outcome, including history when requested
    pub result: SolveResult,
}

/// Solve the circuit from `initial = [I1, I2, VD]`.
pub fn solve_diode_circuit(
    params: DiodeCircuitParams,
    initial: [f64; 3],
    config: &SolverConfig,
) -> Result<DiodeSolution> {
    let circuit = DiodeCircuit::new(params)?;
    let result = NewtonRaphson::new(*config).solve(&circuit, &initial)?;

    let (i1, i2, vd) = (result.solution[0], result.solution[1], result.solution[2]);
    info!(i1, i2, vd, converged = result.converged, "diode operating point");

    Ok(DiodeSolution { i1, i2, vd, result })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const INITIAL: [f64; 3] = [0.021, 0.003, 0.7];

    #[test]
    fn test_reference_converges_in_ten_updates_plus_final() {
        let params = DiodeCircuitParams::default();
        let solution = solve_diode_circuit(params, INITIAL, &SolverConfig::default()).unwrap();

        assert!(solution.result.converged);
        // Ten large updates plus the converging one
        assert!(solution.result.iterations_performed <= 11);
        assert!(solution.i1 > 0.0);
        assert!(solution.i2 > 0.0);
        assert!(solution.vd > -1.0 && solution.vd < 1.0);

        let circuit = DiodeCircuit::new(params).unwrap();
        let f = circuit.residual(&solution.result.solution).unwrap();
        for value in f {
            assert!(value.abs() < 1e-6);
        }

        assert_abs_diff_eq!(solution.i1, 0.0012788, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.i2, 0.0031970, epsilon = 1e-6);
        assert_abs_diff_eq!(solution.vd, 0.524136, epsilon = 1e-5);
    }

    #[test]
    fn test_current_split_follows_saturation_ratio() {
        let solution =
            solve_diode_circuit(DiodeCircuitParams::default(), INITIAL, &SolverConfig::default())
                .unwrap();
        assert_abs_diff_eq!(solution.i2 / solution.i1, 2.5, epsilon = 1e-6);
    }

    #[test]
    fn test_jacobian_matches_finite_difference() {
        let circuit = DiodeCircuit::new(DiodeCircuitParams::default()).unwrap();
        let x = [0.001, 0.002, 0.5];
        let j = circuit.jacobian(&x).unwrap();

        let h = 1e-7;
        for k in 0..3 {
            let mut hi = x;
            let mut lo = x;
            hi[k] += h;
            lo[k] -= h;
            let f_hi = circuit.residual(&hi).unwrap();
            let f_lo = circuit.residual(&lo).unwrap();
            for i in 0..3 {
                let numeric = (f_hi[i] - f_lo[i]) / (2.0 * h);
                assert_abs_diff_eq!(j[(i, k)], numeric, epsilon = 1e-6 * (1.0 + numeric.abs()));
            }
        }
    }

    #[test]
    fn test_history_recorded() {
        let config = SolverConfig::default().with_history(true);
        let solution = solve_diode_circuit(DiodeCircuitParams::default(), INITIAL, &config).unwrap();
        assert_eq!(
            solution.result.history.len(),
            solution.result.iterations_performed + 1
        );
        assert_eq!(solution.result.history[0].x, INITIAL.to_vec());
    }

    #[test]
    fn test_invalid_parameters() {
        let bad = [
            DiodeCircuitParams { r: 0.0, ..Default::default() },
            DiodeCircuitParams { vs: -5.0, ..Default::default() },
            DiodeCircuitParams { is1: f64::NAN, ..Default::default() },
            DiodeCircuitParams { vt: f64::INFINITY, ..Default::default() },
        ];
        for params in bad {
            assert!(matches!(
                solve_diode_circuit(params, INITIAL, &SolverConfig::default()),
                Err(RaphsonError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_wrong_point_length() {
        let circuit = DiodeCircuit::new(DiodeCircuitParams::default()).unwrap();
        assert!(matches!(
            circuit.residual(&[0.0, 0.0]),
            Err(RaphsonError::DimensionMismatch { .. })
        ));
    }
}
