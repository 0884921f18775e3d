use super::decisions::VarDomain;

/// Policy for ordering candidate versions during search.
///
/// Dense indices follow version order, so preferring the highest index
/// means trying the newest version first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    /// Prefer lowest versions (for testing)
    pub prefer_lowest: bool,
}

impl Policy {
    /// Create a new policy with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set preference for lowest versions
    pub fn prefer_lowest(mut self, prefer: bool) -> Self {
        self.prefer_lowest = prefer;
        self
    }

    /// Remaining values of a domain, best first
    pub fn select_preferred(&self, domain: &VarDomain) -> Vec<usize> {
        if self.prefer_lowest {
            domain.values().collect()
        } else {
            domain.values().rev().collect()
        }
    }
}
