//! The validated, topologically ordered chain of [`VersionChange`]s (spec
//! §4.4) and route planning between any two versions.

use apiver_core::{Version, VersionBundle};

use crate::error::BuildError;
use crate::version_change::VersionChange;

/// A validated set of [`VersionChange`]s forming a simple path from the
/// oldest declared version to head.
///
/// Constructed once at startup via [`ChainBuilder`]; immutable thereafter.
pub struct MigrationChain {
    changes: Vec<VersionChange>,
}

impl MigrationChain {
    /// The changes in ascending (oldest-to-newest) order.
    #[must_use]
    pub fn changes(&self) -> &[VersionChange] {
        &self.changes
    }

    /// The non-hidden changes, in ascending order, suitable for rendering a
    /// changelog to API consumers.
    #[must_use]
    pub fn changelog(&self) -> Vec<&VersionChange> {
        self.changes.iter().filter(|c| !c.hidden_from_changelog).collect()
    }

    /// Plan the ordered sequence of changes migrating between `src` and
    /// `dst`.
    ///
    /// An empty route if `src == dst`. If `src < dst`, the forward slice of
    /// changes with `from >= src` and `to <= dst`, in ascending order. If
    /// `src > dst`, the same slice traversed tail-first (spec §4.4).
    #[must_use]
    pub fn route(&self, src: &Version, dst: &Version) -> Vec<&VersionChange> {
        if src == dst {
            return Vec::new();
        }
        let (lo, hi) = if src < dst { (src, dst) } else { (dst, src) };
        let mut slice: Vec<&VersionChange> =
            self.changes.iter().filter(|c| &c.from_version >= lo && &c.to_version <= hi).collect();
        if src > dst {
            slice.reverse();
        }
        slice
    }
}

/// Builds a [`MigrationChain`] from a set of declared [`VersionChange`]s,
/// validating cycle-freedom and the one-outgoing-edge-per-version
/// invariant before accepting it.
#[derive(Default)]
pub struct ChainBuilder {
    changes: Vec<VersionChange>,
}

impl ChainBuilder {
    /// An empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare one more change. Order of calls does not matter; changes
    /// are sorted by `from_version` during [`ChainBuilder::build`].
    #[must_use]
    pub fn add(mut self, change: VersionChange) -> Self {
        self.changes.push(change);
        self
    }

    /// Validate and produce the [`MigrationChain`].
    ///
    /// An empty chain (no changes declared) is accepted as the identity
    /// chain (spec §4.4, step 1).
    ///
    /// # Errors
    ///
    /// - [`BuildError::DuplicateChange`] if two changes share the same
    ///   `(from, to)` pair.
    /// - [`BuildError::Branch`] if one version is the `from` of two
    ///   different changes.
    /// - [`BuildError::Cycle`] if the `from -> to` edges contain a cycle.
    pub fn build(mut self) -> Result<MigrationChain, BuildError> {
        self.changes.sort_by(|a, b| a.from_version.cmp(&b.from_version));

        for pair in self.changes.windows(2) {
            if pair[0].from_version == pair[1].from_version {
                return Err(BuildError::Branch {
                    from: pair[0].from_version.as_str().to_string(),
                    to_a: pair[0].to_version.as_str().to_string(),
                    to_b: pair[1].to_version.as_str().to_string(),
                });
            }
        }
        for a in &self.changes {
            for b in &self.changes {
                if std::ptr::eq(a, b) {
                    continue;
                }
                if a.from_version == b.from_version && a.to_version == b.to_version {
                    return Err(BuildError::DuplicateChange {
                        from: a.from_version.as_str().to_string(),
                        to: a.to_version.as_str().to_string(),
                    });
                }
            }
        }

        detect_cycle(&self.changes)?;

        Ok(MigrationChain { changes: self.changes })
    }

    /// [`ChainBuilder::build`], plus the full spec §3 invariant (c) check:
    /// the chain must cover `bundle` end to end, a single gap-free path from
    /// its oldest version to head, mentioning no version `bundle` doesn't
    /// declare.
    ///
    /// # Errors
    ///
    /// Everything [`ChainBuilder::build`] can return, plus:
    /// - [`BuildError::UnknownVersion`] if a change's `from` or `to` isn't a
    ///   version declared in `bundle` (and isn't head).
    /// - [`BuildError::Unreachable`] if some version in `bundle` is not on
    ///   the path from `bundle.oldest()` to head — e.g. a gap between two
    ///   changes, or a version with no change attached at all.
    pub fn build_for_bundle(self, bundle: &VersionBundle) -> Result<MigrationChain, BuildError> {
        let chain = self.build()?;

        for change in chain.changes() {
            if !change.from_version.is_head() && bundle.find(change.from_version.as_str()).is_none() {
                return Err(BuildError::UnknownVersion(change.from_version.as_str().to_string()));
            }
            if !change.to_version.is_head() && bundle.find(change.to_version.as_str()).is_none() {
                return Err(BuildError::UnknownVersion(change.to_version.as_str().to_string()));
            }
        }

        let mut reached = std::collections::HashSet::new();
        let mut cursor = bundle.oldest().clone();
        reached.insert(cursor.as_str().to_string());
        while let Some(change) = chain.changes().iter().find(|c| c.from_version == cursor) {
            cursor = change.to_version.clone();
            reached.insert(cursor.as_str().to_string());
        }

        for version in bundle.versions() {
            if !reached.contains(version.as_str()) {
                return Err(BuildError::Unreachable(version.as_str().to_string()));
            }
        }

        Ok(chain)
    }
}

/// Standard DFS coloring cycle detection over the `from -> to` edges.
fn detect_cycle(changes: &[VersionChange]) -> Result<(), BuildError> {
    #[derive(PartialEq, Eq, Clone, Copy)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn edge_to<'a>(changes: &'a [VersionChange], from: &Version) -> Option<&'a VersionChange> {
        changes.iter().find(|c| &c.from_version == from)
    }

    fn visit(
        changes: &[VersionChange],
        at: &Version,
        colors: &mut std::collections::HashMap<String, Color>,
    ) -> Result<(), BuildError> {
        colors.insert(at.as_str().to_string(), Color::Gray);
        if let Some(change) = edge_to(changes, at) {
            match colors.get(change.to_version.as_str()).copied().unwrap_or(Color::White) {
                Color::White => visit(changes, &change.to_version, colors)?,
                Color::Gray => {
                    return Err(BuildError::Cycle { at: change.to_version.as_str().to_string() });
                }
                Color::Black => {}
            }
        }
        colors.insert(at.as_str().to_string(), Color::Black);
        Ok(())
    }

    let mut colors = std::collections::HashMap::new();
    for change in changes {
        if colors.get(change.from_version.as_str()).copied().unwrap_or(Color::White) == Color::White {
            visit(changes, &change.from_version, &mut colors)?;
        }
    }
    Ok(())
}
