//! # vt-metrics
//!
//! Evaluation metrics for the held-out test set.
//!
//! [`ConfusionMatrix`] accumulates truth/prediction counts and derives
//! per-class precision, recall, and F1; [`ClassificationReport`] renders them
//! as the familiar per-class table. The ranking metrics ([`roc_auc`],
//! [`average_precision`]) are strictly binary: they fail with an explicit
//! error unless the truth vector contains exactly two distinct classes.

pub mod confusion;
pub mod ranking;
pub mod report;

pub use confusion::ConfusionMatrix;
pub use ranking::{accuracy, average_precision, roc_auc};
pub use report::{ClassReportRow, ClassificationReport, ReportAverages};
