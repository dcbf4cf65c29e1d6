//! Raphson - Newton-Raphson solver for nonlinear systems
//!
//! # Usage
//!
//! ```bash
//! raphson system circle.nr --history --jacobian
//! raphson diode --vs 5 --r 1000 --is1 2e-12 --is2 5e-12
//! ```
//!
//! Log output goes to stderr and is controlled by `RUST_LOG`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use raphson_core::{
    circuit::{self, DiodeCircuitParams},
    error::Result,
    problem,
    solver::{self, SolveResult},
    SolverConfig,
};
use tracing_subscriber::EnvFilter;

/// Newton-Raphson solver for systems of nonlinear equations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve the equations in a problem file
    System {
        /// Path to the problem file
        #[arg(value_name = "PROBLEM_FILE")]
        file: PathBuf,

        #[command(flatten)]
        solver: SolverArgs,

        /// Print the symbolic Jacobian
        #[arg(long)]
        jacobian: bool,
    },
    /// Solve the two-diode reference circuit
    Diode {
        /// Source voltage (V)
        #[arg(long, default_value_t = 5.0)]
        vs: f64,

        /// Series resistance (ohms)
        #[arg(long, default_value_t = 1000.0)]
        r: f64,

        /// Saturation current of the first diode (A)
        #[arg(long, default_value_t = 2e-12)]
        is1: f64,

        /// Saturation current of the second diode (A)
        #[arg(long, default_value_t = 5e-12)]
        is2: f64,

        /// Thermal voltage (V)
        #[arg(long, default_value_t = circuit::THERMAL_VOLTAGE)]
        vt: f64,

        /// Initial guess for I1 (A)
        #[arg(long, default_value_t = 0.021)]
        i1: f64,

        /// Initial guess for I2 (A)
        #[arg(long, default_value_t = 0.003)]
        i2: f64,

        /// Initial guess for VD (V)
        #[arg(long, default_value_t = 0.7)]
        vd: f64,

        #[command(flatten)]
        solver: SolverArgs,
    },
}

/// Options shared by every subcommand. Unset values fall back to the
/// problem file, then to the library defaults.
#[derive(Args, Debug)]
struct SolverArgs {
    /// Convergence tolerance on the step norm [default: 1e-6]
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// Maximum number of iterations [default: 100]
    #[arg(short = 'n', long)]
    max_iterations: Option<usize>,

    /// Print the iteration history
    #[arg(long)]
    history: bool,
}

impl SolverArgs {
    fn apply(&self, mut config: SolverConfig) -> SolverConfig {
        if let Some(tolerance) = self.tolerance {
            config.tolerance = tolerance;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if self.history {
            config.record_history = true;
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let defaults = SolverConfig::default();

    match cli.command {
        Command::System {
            file,
            solver: args,
            jacobian,
        } => {
            let problem = problem::parse_file(&file)?;
            let system = problem.build_system()?;
            let config = args.apply(problem.solver_config(defaults));

            let result = solver::solve(&system, &problem.initial_guess, &config)?;
            let names = system.variables().to_vec();
            report(&names, &result, config.record_history);

            if jacobian {
                println!();
                println!("Jacobian:");
                for (equation, row) in system.equations().zip(system.jacobian_expressions()) {
                    println!("  {}", equation);
                    for (name, derivative) in names.iter().zip(row) {
                        println!("    d/d{} = {}", name, derivative);
                    }
                }
            }
        }
        Command::Diode {
            vs,
            r,
            is1,
            is2,
            vt,
            i1,
            i2,
            vd,
            solver: args,
        } => {
            let params = DiodeCircuitParams { vs, r, is1, is2, vt };
            let config = args.apply(defaults);

            let solution = circuit::solve_diode_circuit(params, [i1, i2, vd], &config)?;
            let names = ["I1", "I2", "VD"].map(String::from).to_vec();
            report(&names, &solution.result, config.record_history);
        }
    }

    Ok(())
}

fn report(names: &[String], result: &SolveResult, history: bool) {
    for (name, value) in names.iter().zip(&result.solution) {
        println!("{} = {:.12e}", name, value);
    }
    println!("iterations = {}", result.iterations_performed);
    println!("converged = {}", result.converged);

    if let Some(last) = result.history.last() {
        println!("residual_norm = {:.6e}", last.residual_norm());
    }

    if history {
        println!();
        print!("{}", result.history_table(names));
    }
}
