//! Evaluation metrics for binary classifiers

use crate::error::{ChurnError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Per-class precision/recall/F1 block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: u64,
}

/// Full classification report over both classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    #[serde(rename = "0")]
    pub negative: ClassMetrics,
    #[serde(rename = "1")]
    pub positive: ClassMetrics,
    pub accuracy: f64,
    #[serde(rename = "macro avg")]
    pub macro_avg: ClassMetrics,
    #[serde(rename = "weighted avg")]
    pub weighted_avg: ClassMetrics,
}

/// Receiver operating characteristic curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocPoints {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
}

/// Fraction of predictions matching the labels.
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (t.round() - p.round()).abs() < 0.5)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Precision/recall/F1 per class plus macro and weighted averages.
pub fn classification_report(
    y_true: &Array1<f64>,
    y_pred: &Array1<f64>,
) -> Result<ClassificationReport> {
    check_lengths(y_true, y_pred)?;

    let mut tp = 0u64;
    let mut fp = 0u64;
    let mut tn = 0u64;
    let mut fn_ = 0u64;
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        match (t.round() as i64, p.round() as i64) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (0, 0) => tn += 1,
            (1, 0) => fn_ += 1,
            _ => {
                return Err(ChurnError::ValidationError(
                    "labels must be 0 or 1".to_string(),
                ))
            }
        }
    }

    let positive = class_block(tp, fp, fn_, tp + fn_);
    // for the negative class the confusion cells swap roles
    let negative = class_block(tn, fn_, fp, tn + fp);
    let total = (tp + fp + tn + fn_) as f64;
    let acc = (tp + tn) as f64 / total;

    let macro_avg = ClassMetrics {
        precision: (negative.precision + positive.precision) / 2.0,
        recall: (negative.recall + positive.recall) / 2.0,
        f1_score: (negative.f1_score + positive.f1_score) / 2.0,
        support: negative.support + positive.support,
    };
    let w_neg = negative.support as f64 / total;
    let w_pos = positive.support as f64 / total;
    let weighted_avg = ClassMetrics {
        precision: negative.precision * w_neg + positive.precision * w_pos,
        recall: negative.recall * w_neg + positive.recall * w_pos,
        f1_score: negative.f1_score * w_neg + positive.f1_score * w_pos,
        support: negative.support + positive.support,
    };

    Ok(ClassificationReport {
        negative,
        positive,
        accuracy: acc,
        macro_avg,
        weighted_avg,
    })
}

fn class_block(tp: u64, fp: u64, fn_: u64, support: u64) -> ClassMetrics {
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    ClassMetrics {
        precision,
        recall,
        f1_score,
        support,
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// ROC curve from scores, swept over descending unique thresholds.
///
/// Starts at (0, 0) and ends at (1, 1). Requires both classes present.
pub fn roc_curve(y_true: &Array1<f64>, y_score: &Array1<f64>) -> Result<RocPoints> {
    check_lengths(y_true, y_score)?;

    let n_pos = y_true.iter().filter(|&&v| v >= 0.5).count() as f64;
    let n_neg = y_true.len() as f64 - n_pos;
    if n_pos == 0.0 || n_neg == 0.0 {
        return Err(ChurnError::ValidationError(
            "ROC curve requires both classes in the labels".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..y_score.len()).collect();
    order.sort_by(|&a, &b| {
        y_score[b]
            .partial_cmp(&y_score[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut tp = 0.0;
    let mut fp = 0.0;

    let mut i = 0;
    while i < order.len() {
        let score = y_score[order[i]];
        // tied scores move together
        while i < order.len() && y_score[order[i]] == score {
            if y_true[order[i]] >= 0.5 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }
        fpr.push(fp / n_neg);
        tpr.push(tp / n_pos);
    }

    Ok(RocPoints { fpr, tpr })
}

/// Area under the ROC curve, trapezoid rule over the computed curve.
pub fn roc_auc(y_true: &Array1<f64>, y_score: &Array1<f64>) -> Result<f64> {
    let roc = roc_curve(y_true, y_score)?;
    let mut area = 0.0;
    for w in 1..roc.fpr.len() {
        area += (roc.fpr[w] - roc.fpr[w - 1]) * (roc.tpr[w] + roc.tpr[w - 1]) / 2.0;
    }
    Ok(area)
}

fn check_lengths(a: &Array1<f64>, b: &Array1<f64>) -> Result<()> {
    if a.len() != b.len() {
        return Err(ChurnError::ShapeError {
            expected: format!("{} values", a.len()),
            actual: format!("{} values", b.len()),
        });
    }
    if a.is_empty() {
        return Err(ChurnError::ValidationError(
            "metrics require at least one sample".to_string(),
        ));
    }
    Ok(())
}
