use std::fmt;

/// Default limit of quantification for genome-equivalent abundances,
/// derived from a 90% coverage assumption: -ln(0.9).
pub fn default_loq() -> f64 {
    -(0.9f64.ln())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub limit_threshold: f64,
    pub query_coverage: f64,
    pub percent_identity: f64,
}

impl GridPoint {
    pub fn trims_coverage(&self) -> bool {
        self.limit_threshold != 0.0
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "limit={} coverage={} identity={}",
            self.limit_threshold, self.query_coverage, self.percent_identity
        )
    }
}

#[derive(Debug, Clone)]
pub struct ParameterGrid {
    pub limit_threshold: Vec<f64>,
    pub query_coverage: Vec<f64>,
    pub percent_identity: Vec<f64>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self {
            limit_threshold: vec![0.0, 0.01, 0.05, 0.1, 0.15],
            query_coverage: vec![0.3, 0.5, 0.7, 0.9],
            percent_identity: vec![0.89, 0.91, 0.93, 0.95, 0.97, 0.99],
        }
    }
}

impl ParameterGrid {
    pub fn len(&self) -> usize {
        self.limit_threshold.len() * self.query_coverage.len() * self.percent_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walks the grid in the fixed nested order: limit threshold outermost,
    /// query coverage, then percent identity innermost. Iteration indices
    /// derived from this order become output column labels.
    pub fn points(&self) -> impl Iterator<Item = GridPoint> + '_ {
        self.limit_threshold.iter().copied().flat_map(move |limit| {
            self.query_coverage.iter().copied().flat_map(move |coverage| {
                self.percent_identity
                    .iter()
                    .copied()
                    .map(move |identity| GridPoint {
                        limit_threshold: limit,
                        query_coverage: coverage,
                        percent_identity: identity,
                    })
            })
        })
    }
}
