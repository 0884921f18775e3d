use super::domain::IndexRange;
use super::problem::VersionProblem;
use super::rule::VarId;

/// The set of values still possible for one variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDomain {
    words: Vec<u64>,
    size: usize,
}

impl VarDomain {
    /// A domain holding every value of `range`
    pub fn from_range(range: IndexRange) -> Self {
        let mut words = vec![0u64; range.hi / 64 + 1];
        for value in range.lo..=range.hi {
            words[value / 64] |= 1u64 << (value % 64);
        }
        Self {
            words,
            size: range.len(),
        }
    }

    pub fn contains(&self, value: usize) -> bool {
        self.words
            .get(value / 64)
            .is_some_and(|word| word & (1u64 << (value % 64)) != 0)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The only remaining value, if exactly one is left
    pub fn single(&self) -> Option<usize> {
        if self.size == 1 {
            self.values().next()
        } else {
            None
        }
    }

    /// Remaining values in ascending order
    pub fn values(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        (0..self.words.len() * 64).filter(move |&value| self.contains(value))
    }

    /// Whether any remaining value lies in `range`
    pub fn intersects(&self, range: IndexRange) -> bool {
        (range.lo..=range.hi).any(|value| self.contains(value))
    }

    fn remove(&mut self, value: usize) -> bool {
        if !self.contains(value) {
            return false;
        }
        self.words[value / 64] &= !(1u64 << (value % 64));
        self.size -= 1;
        true
    }

    fn retain_range(&mut self, range: IndexRange) -> bool {
        let outside: Vec<usize> = self.values().filter(|&v| !range.contains(v)).collect();
        for value in &outside {
            self.remove(*value);
        }
        !outside.is_empty()
    }
}

/// Tracks variable domains during search.
///
/// Every change made at a decision level is recorded on a trail so that
/// [`revert_to_level`](Self::revert_to_level) can restore the domains as
/// they were when that level was entered.
#[derive(Debug, Clone)]
pub struct Decisions {
    domains: Vec<VarDomain>,
    /// Previous domains, oldest first [(variable, domain before change)]
    trail: Vec<(VarId, VarDomain)>,
    /// Trail length at the start of each level above zero
    levels: Vec<usize>,
}

impl Decisions {
    /// Start from the declared domains of `problem`
    pub fn new(problem: &VersionProblem) -> Self {
        Self {
            domains: problem
                .variables()
                .iter()
                .map(|var| VarDomain::from_range(var.domain()))
                .collect(),
            trail: Vec::new(),
            levels: Vec::new(),
        }
    }

    /// Get the current decision level
    pub fn level(&self) -> usize {
        self.levels.len()
    }

    /// Enter a new decision level
    pub fn increment_level(&mut self) {
        self.levels.push(self.trail.len());
    }

    /// Undo every change made above `target_level`
    pub fn revert_to_level(&mut self, target_level: usize) {
        while self.levels.len() > target_level {
            let Some(mark) = self.levels.pop() else {
                break;
            };
            while self.trail.len() > mark {
                if let Some((var, previous)) = self.trail.pop() {
                    self.domains[var] = previous;
                }
            }
        }
    }

    pub fn domain(&self, var: VarId) -> &VarDomain {
        &self.domains[var]
    }

    /// The value of `var` if its domain is down to one value
    pub fn value(&self, var: VarId) -> Option<usize> {
        self.domains[var].single()
    }

    pub fn is_assigned(&self, var: VarId) -> bool {
        self.domains[var].len() == 1
    }

    /// The complete assignment, once every variable has a single value
    pub fn assignment(&self) -> Option<Vec<usize>> {
        self.domains.iter().map(VarDomain::single).collect()
    }

    /// Fix `var` to `value`.
    ///
    /// Returns false if `value` was no longer possible.
    pub fn decide(&mut self, var: VarId, value: usize) -> bool {
        if !self.domains[var].contains(value) {
            return false;
        }
        self.restrict(var, IndexRange::singleton(value));
        true
    }

    /// Remove `value` from `var`'s domain; returns whether anything changed
    pub fn remove(&mut self, var: VarId, value: usize) -> bool {
        if !self.domains[var].contains(value) {
            return false;
        }
        self.save(var);
        self.domains[var].remove(value)
    }

    /// Intersect `var`'s domain with `range`; returns whether anything changed
    pub fn restrict(&mut self, var: VarId, range: IndexRange) -> bool {
        if self.domains[var].values().all(|v| range.contains(v)) {
            return false;
        }
        self.save(var);
        self.domains[var].retain_range(range)
    }

    fn save(&mut self, var: VarId) {
        if !self.levels.is_empty() {
            self.trail.push((var, self.domains[var].clone()));
        }
    }
}
