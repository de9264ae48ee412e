//! One version-to-version edge of a [`crate::MigrationChain`] (spec §3,
//! "`VersionChange`").

use std::collections::BTreeMap;

use apiver_core::Version;

use crate::error::BuildError;
use crate::operation::{Operation, SchemaOp};

/// The operations that migrate one version to the next, grouped by the
/// record type (schema) they apply to, plus global (schema-less) custom
/// operations.
///
/// Operations for the same schema apply in declaration order; a change's
/// per-schema blocks are independent of each other (spec §4.4).
#[derive(Clone)]
pub struct VersionChange {
    /// Human-readable summary, surfaced in [`crate::MigrationChain::changelog`].
    pub description: String,
    /// The version this change migrates from.
    pub from_version: Version,
    /// The version this change migrates to.
    pub to_version: Version,
    /// Operations keyed by the schema (record type name) they target.
    pub ops_by_schema: BTreeMap<&'static str, Vec<SchemaOp>>,
    /// Operations with no schema affinity, always applied.
    pub global_ops: Vec<Operation>,
    /// If `true`, this change is suppressed from the generated changelog
    /// (e.g. an internal-only renumbering) without affecting migration.
    pub hidden_from_changelog: bool,
}

impl VersionChange {
    /// Start building a change from `from_version` to `to_version`.
    #[must_use]
    pub fn builder(description: impl Into<String>, from_version: Version, to_version: Version) -> VersionChangeBuilder {
        VersionChangeBuilder {
            description: description.into(),
            from_version,
            to_version,
            ops_by_schema: BTreeMap::new(),
            global_ops: Vec::new(),
            hidden_from_changelog: false,
        }
    }

    /// The operations declared for `schema`, if any.
    #[must_use]
    pub fn ops_for(&self, schema: &str) -> &[SchemaOp] {
        self.ops_by_schema.get(schema).map_or(&[], Vec::as_slice)
    }
}

/// Fluent construction of a [`VersionChange`]. The builder is a convenience
/// layer only; it ultimately emits the same `VersionChange` data the chain
/// consumes directly (spec §9, "Fluent builder").
pub struct VersionChangeBuilder {
    description: String,
    from_version: Version,
    to_version: Version,
    ops_by_schema: BTreeMap<&'static str, Vec<SchemaOp>>,
    global_ops: Vec<Operation>,
    hidden_from_changelog: bool,
}

impl VersionChangeBuilder {
    /// Add an operation scoped to `schema`. Does not run against 4xx/5xx
    /// response bodies unless the operation is a [`Operation::Rename`]
    /// (whose error-string rewrite always runs on 4xx — see
    /// [`SchemaOp`]). Use [`VersionChangeBuilder::for_schema_migrating_errors`]
    /// to opt an operation into also running on error bodies.
    #[must_use]
    pub fn for_schema(mut self, schema: &'static str, op: Operation) -> Self {
        self.ops_by_schema.entry(schema).or_default().push(SchemaOp::new(op));
        self
    }

    /// Like [`VersionChangeBuilder::for_schema`], but the operation also
    /// runs against 4xx/5xx response bodies.
    #[must_use]
    pub fn for_schema_migrating_errors(mut self, schema: &'static str, op: Operation) -> Self {
        self.ops_by_schema.entry(schema).or_default().push(SchemaOp::migrating_errors(op));
        self
    }

    /// Add a global operation, applied regardless of matched schema.
    #[must_use]
    pub fn global(mut self, op: Operation) -> Self {
        self.global_ops.push(op);
        self
    }

    /// Suppress this change from the generated changelog.
    #[must_use]
    pub fn hidden_from_changelog(mut self) -> Self {
        self.hidden_from_changelog = true;
        self
    }

    /// Validate and produce the [`VersionChange`].
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Cycle`] (reused to mean "not an edge") if
    /// `from_version == to_version`, or if `from_version > to_version`.
    pub fn build(self) -> Result<VersionChange, BuildError> {
        if self.from_version == self.to_version {
            return Err(BuildError::Cycle { at: self.from_version.as_str().to_string() });
        }
        if self.from_version > self.to_version {
            return Err(BuildError::Cycle { at: self.from_version.as_str().to_string() });
        }
        Ok(VersionChange {
            description: self.description,
            from_version: self.from_version,
            to_version: self.to_version,
            ops_by_schema: self.ops_by_schema,
            global_ops: self.global_ops,
            hidden_from_changelog: self.hidden_from_changelog,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiver_core::Version;

    #[test]
    fn build_rejects_equal_versions() {
        let v = Version::date("2024-01-01").unwrap();
        let err = VersionChange::builder("noop", v.clone(), v).build().unwrap_err();
        assert!(matches!(err, BuildError::Cycle { .. }));
    }

    #[test]
    fn build_rejects_reversed_versions() {
        let a = Version::date("2024-01-01").unwrap();
        let b = Version::date("2024-06-01").unwrap();
        let err = VersionChange::builder("noop", b, a).build().unwrap_err();
        assert!(matches!(err, BuildError::Cycle { .. }));
    }

    #[test]
    fn ops_for_schema_preserves_declaration_order() {
        let a = Version::date("2024-01-01").unwrap();
        let b = Version::date("2024-06-01").unwrap();
        let change = VersionChange::builder("rename x then y", a, b)
            .for_schema("User", crate::operation::Operation::Rename { old: "a", new: "b" })
            .for_schema("User", crate::operation::Operation::Rename { old: "b", new: "c" })
            .build()
            .unwrap();
        assert_eq!(change.ops_for("User").len(), 2);
        assert!(change.ops_for("Other").is_empty());
    }
}
