//! Resolved call targets, keyed by source line.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The output of the points-to analysis: for every call site, the set of
/// callee names that may be invoked at runtime.
///
/// Entries are only ever added. Both levels are ordered, so rendering is
/// deterministic: lines ascend, names within a line sort lexicographically.
///
/// # Display
///
/// One line per call site; call sites without a resolved callee are omitted:
///
/// ```text
/// 7 : plus
/// 11 : minus, plus
/// 18 : malloc
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSiteResults {
    sites: BTreeMap<u32, BTreeSet<String>>,
}

impl CallSiteResults {
    /// Creates an empty result set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `callee` as a possible target of the call at `line`.
    pub fn record(&mut self, line: u32, callee: &str) {
        self.sites
            .entry(line)
            .or_default()
            .insert(callee.to_string());
    }

    /// Returns the callee names recorded for a line.
    #[must_use]
    pub fn targets(&self, line: u32) -> Option<&BTreeSet<String>> {
        self.sites.get(&line)
    }

    /// Returns the lines with at least one resolved callee, ascending.
    pub fn lines(&self) -> impl Iterator<Item = u32> + '_ {
        self.sites.keys().copied()
    }

    /// Iterates over `(line, callees)` in ascending line order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &BTreeSet<String>)> {
        self.sites.iter().map(|(&line, names)| (line, names))
    }

    /// Returns the number of call sites with resolved callees.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Returns `true` if no call site resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}

impl fmt::Display for CallSiteResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (line, names) in &self.sites {
            let joined = names.iter().cloned().collect::<Vec<_>>().join(", ");
            writeln!(f, "{line} : {joined}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_sorts_lines_and_names() {
        let mut r = CallSiteResults::new();
        r.record(11, "plus");
        r.record(7, "plus");
        r.record(11, "minus");
        r.record(11, "plus"); // duplicate collapses

        assert_eq!(r.to_string(), "7 : plus\n11 : minus, plus\n");
        assert_eq!(r.len(), 2);
        assert_eq!(r.lines().collect::<Vec<_>>(), vec![7, 11]);
    }

    #[test]
    fn empty_results_render_nothing() {
        assert_eq!(CallSiteResults::new().to_string(), "");
        assert!(CallSiteResults::new().is_empty());
    }
}
