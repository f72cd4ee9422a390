// Visual size normalization for popularity metrics

use crate::model::Document;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Curve applied to the log-normalized value before it is mapped into the
/// size range. Both variants send 0.5 to 0.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    Logistic { steepness: f64 },
}

impl Easing {
    fn apply(&self, x: f64) -> f64 {
        match self {
            Easing::Linear => x,
            Easing::Logistic { steepness } => 1.0 / (1.0 + (-steepness * (x - 0.5)).exp()),
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Logistic { steepness: 6.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentSizes {
    pub karma: f64,
    pub comments: f64,
    pub upvotes: f64,
}

/// Per-document sizes, computed once over the whole corpus
pub type SizeTable = HashMap<String, DocumentSizes>;

#[derive(Debug, Clone, PartialEq)]
pub struct SizeScaler {
    min_size: f64,
    max_size: f64,
    easing: Easing,
}

impl SizeScaler {
    pub fn new(min_size: f64, max_size: f64) -> Self {
        let (min_size, max_size) = if min_size <= max_size {
            (min_size, max_size)
        } else {
            (max_size, min_size)
        };
        Self {
            min_size,
            max_size,
            easing: Easing::default(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn max_size(&self) -> f64 {
        self.max_size
    }

    pub fn midpoint(&self) -> f64 {
        self.min_size + (self.max_size - self.min_size) * 0.5
    }

    /// Size of comment- and upvote-based metrics never drops below this,
    /// keeping any-activity items apart from zero-activity ones
    pub fn activity_floor(&self) -> f64 {
        self.min_size * 1.5
    }

    /// Scale one metric column into `[min_size, max_size]`, one size per row
    pub fn scale(&self, values: &[Option<f64>]) -> Vec<f64> {
        let logged: Vec<Option<f64>> = values
            .iter()
            .map(|v| v.filter(|x| x.is_finite() && *x > 0.0).map(f64::ln_1p))
            .collect();

        let (lo, hi) = logged
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });

        if lo > hi {
            // No row carried a signal
            return vec![self.min_size; values.len()];
        }

        let span = self.max_size - self.min_size;
        logged
            .iter()
            .map(|v| match v {
                None => self.min_size,
                Some(x) => {
                    let normalized = if hi == lo { 0.5 } else { (x - lo) / (hi - lo) };
                    let eased = self.easing.apply(normalized).clamp(0.0, 1.0);
                    self.min_size + span * eased
                }
            })
            .collect()
    }

    /// Like [`SizeScaler::scale`], with every size raised to the activity floor
    pub fn scale_with_floor(&self, values: &[Option<f64>]) -> Vec<f64> {
        let floor = self.activity_floor();
        self.scale(values)
            .into_iter()
            .map(|size| size.max(floor))
            .collect()
    }

    pub fn size_table(&self, documents: &[Document]) -> SizeTable {
        let karma: Vec<_> = documents.iter().map(|d| d.karma).collect();
        let comments: Vec<_> = documents.iter().map(|d| d.comment_count).collect();
        let upvotes: Vec<_> = documents.iter().map(|d| d.upvote_count).collect();

        let karma = self.scale(&karma);
        let comments = self.scale_with_floor(&comments);
        let upvotes = self.scale_with_floor(&upvotes);

        documents
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                (
                    doc.id.clone(),
                    DocumentSizes {
                        karma: karma[i],
                        comments: comments[i],
                        upvotes: upvotes[i],
                    },
                )
            })
            .collect()
    }
}

impl Default for SizeScaler {
    fn default() -> Self {
        Self::new(10.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_is_symmetric_around_midpoint() {
        let easing = Easing::default();
        assert_eq!(easing.apply(0.5), 0.5);
        let low = easing.apply(0.2);
        let high = easing.apply(0.8);
        assert!((low + high - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverted_bounds_are_swapped() {
        let scaler = SizeScaler::new(100.0, 10.0);
        assert_eq!(scaler.min_size(), 10.0);
        assert_eq!(scaler.max_size(), 100.0);
    }
}
