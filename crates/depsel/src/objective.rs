//! Objectives for choosing between feasible solutions
//!
//! An objective maps a candidate [`Solution`] to a [`Score`], a tuple of
//! reals compared lexicographically: the higher score wins. Context such as
//! the currently deployed versions is carried by the objective value itself
//! rather than captured from the environment.

use std::cmp::Ordering;

use indexmap::IndexMap;

use depsel_semver::Version;

use crate::graph::DependencyGraph;
use crate::selector::Solution;

/// A lexicographically ordered score tuple
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Score(Vec<f64>);

impl Score {
    pub fn new(values: Vec<f64>) -> Self {
        Score(values)
    }

    /// The "arbitrarily bad" tuple of the given arity
    pub fn floor(arity: usize) -> Self {
        Score(vec![f64::NEG_INFINITY; arity])
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append another score's components
    pub fn extend(&mut self, other: Score) {
        self.0.extend(other.0);
    }

    /// Lexicographic comparison; the first differing component decides and
    /// a strict prefix ranks lower. `0.0` and `-0.0` are equal, NaN follows
    /// the IEEE total order.
    pub fn compare(&self, other: &Score) -> Ordering {
        for (a, b) in self.0.iter().zip(&other.0) {
            match a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        self.0.len().cmp(&other.0.len())
    }

    /// Strictly better than `other`
    pub fn is_better_than(&self, other: &Score) -> bool {
        self.compare(other) == Ordering::Greater
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl From<Vec<f64>> for Score {
    fn from(values: Vec<f64>) -> Self {
        Score(values)
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Score(vec![value])
    }
}

/// Scores a candidate solution; higher is better
pub trait Objective {
    fn score(&self, solution: &Solution) -> Score;
}

impl<F> Objective for F
where
    F: Fn(&Solution) -> Score,
{
    fn score(&self, solution: &Solution) -> Score {
        self(solution)
    }
}

/// Penalizes every currently deployed package whose version would change.
///
/// Packages absent from the candidate solution do not count.
#[derive(Debug, Clone, Default)]
pub struct MinimizeChurn {
    current: IndexMap<String, Version>,
}

impl MinimizeChurn {
    pub fn new<I, S>(current: I) -> Self
    where
        I: IntoIterator<Item = (S, Version)>,
        S: Into<String>,
    {
        Self {
            current: current.into_iter().map(|(name, v)| (name.into(), v)).collect(),
        }
    }

    /// Number of deployed packages the solution would change
    pub fn churn(&self, solution: &Solution) -> usize {
        self.current
            .iter()
            .filter(|(name, version)| solution.get(name).is_some_and(|chosen| chosen != *version))
            .count()
    }
}

impl Objective for MinimizeChurn {
    fn score(&self, solution: &Solution) -> Score {
        Score::from(-(self.churn(solution) as f64))
    }
}

/// Penalizes every selected package that is not at its latest version
#[derive(Debug, Clone, Default)]
pub struct PreferLatest {
    latest: IndexMap<String, Version>,
}

impl PreferLatest {
    pub fn new<I, S>(latest: I) -> Self
    where
        I: IntoIterator<Item = (S, Version)>,
        S: Into<String>,
    {
        Self {
            latest: latest.into_iter().map(|(name, v)| (name.into(), v)).collect(),
        }
    }

    /// Latest known version of every package in the graph
    pub fn from_graph(graph: &DependencyGraph) -> Self {
        let latest = graph.packages().filter_map(|package| {
            let latest = match package.domain() {
                Some(domain) => domain.latest().copied(),
                None => package.versions().iter().map(|pv| *pv.version()).max(),
            };
            latest.map(|version| (package.name().to_string(), version))
        });
        Self::new(latest)
    }

    /// Number of solution packages below their latest version
    pub fn outdated(&self, solution: &Solution) -> usize {
        solution
            .iter()
            .filter(|solved| {
                self.latest
                    .get(&solved.package_name)
                    .is_some_and(|latest| latest != &solved.version)
            })
            .count()
    }
}

impl Objective for PreferLatest {
    fn score(&self, solution: &Solution) -> Score {
        Score::from(-(self.outdated(solution) as f64))
    }
}

/// Concatenates several objectives, most significant first
#[derive(Default)]
pub struct Lexicographic(Vec<Box<dyn Objective>>);

impl Lexicographic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, objective: impl Objective + 'static) -> Self {
        self.0.push(Box::new(objective));
        self
    }
}

impl Objective for Lexicographic {
    fn score(&self, solution: &Solution) -> Score {
        let mut score = Score::default();
        for objective in &self.0 {
            score.extend(objective.score(solution));
        }
        score
    }
}
