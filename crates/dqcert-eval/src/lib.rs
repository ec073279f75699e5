//! Certification engine: metrics, grading and violation index over a
//! normalized table.

pub mod engine;
pub mod errors;
pub mod grading;
pub mod metrics;
pub mod model;
pub mod report;
pub mod violations;

pub use engine::{CancelToken, EvaluationEngine};
pub use errors::EvalError;
pub use grading::{CONDITIONAL_THRESHOLD, grade, reference_score};
pub use model::{
    DEFAULT_PREVIEW_LIMIT, EvaluateOptions, EvaluationResult, Findings, FormatFinding,
    FreshnessStatus, Grade, HardFailFlags, Metric, MetricKind, ViolationPreview,
};
pub use report::render_report;
