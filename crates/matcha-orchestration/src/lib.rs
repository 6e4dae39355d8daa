//! # matcha-orchestration
//!
//! Model selection, parallel execution, and result comparison.

pub mod interfaces;
pub mod model_selection;
pub mod orchestrator;

pub use interfaces::{CalculationResult, ProgressReporter, ResultPresenter};
pub use orchestrator::{analyze_comparison_results, execute_calculations};
