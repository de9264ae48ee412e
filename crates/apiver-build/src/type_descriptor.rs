//! Reflective-style analysis of a record type (spec §4.3).
//!
//! Rust has no runtime reflection, so [`Described`] stands in for it: each
//! record type that can appear as a request or response body implements
//! `Described` by hand (or via a small derive macro in application code,
//! outside this crate's scope) to expose its fields as a `&'static` table of
//! [`FieldSpec`]s. `TypeDescriptor::analyze` then walks that table
//! depth-first the same way a reflective walker would walk struct tags.

use std::collections::BTreeMap;

use crate::error::BuildError;

/// A function pointer back to a type's field table. Two types are the same
/// type, for descriptor purposes, exactly when this pointer compares equal.
pub type DescriptorFn = fn() -> &'static [FieldSpec];

/// What shape a field's JSON value takes.
#[derive(Debug, Clone, Copy)]
pub enum FieldShape {
    /// A string, number, bool or null — nothing to recurse into.
    Scalar,
    /// A nested record. Carries the child type's name and field table.
    Object(&'static str, DescriptorFn),
    /// An array of a nested record. Carries the element type's name and
    /// field table; the path recorded for this field is the field's own
    /// path, not an indexed child path (spec §4.3: "elements of arrays
    /// contribute the path segment of their container").
    Array(&'static str, DescriptorFn),
}

/// One field of a [`Described`] type: its JSON name and shape.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// The field's name on the wire (after any rename attributes).
    pub json_name: &'static str,
    /// Scalar, nested object, or nested array.
    pub shape: FieldShape,
}

/// A record type whose fields can be walked without compile-time
/// reflection. Implement this for every request/response body type that
/// participates in migration.
pub trait Described {
    /// A human-readable name, used in [`TypeRef`] and in diagnostics.
    const TYPE_NAME: &'static str;

    /// This type's fields, in declaration order.
    fn fields() -> &'static [FieldSpec];
}

/// A reference to a type discovered during analysis: its name, plus the
/// field-table function pointer that identifies it for equality and for
/// further recursion.
#[derive(Debug, Clone, Copy)]
pub struct TypeRef {
    /// The type's name.
    pub name: &'static str,
    /// Its field table accessor.
    pub descriptor: DescriptorFn,
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && std::ptr::eq(self.descriptor as *const (), other.descriptor as *const ())
    }
}

impl Eq for TypeRef {}

/// The result of analyzing a record type: a path → child-type map for
/// nested objects, and a path → element-type map for nested arrays.
#[derive(Debug, Clone, Default)]
pub struct TypeDescriptor {
    /// Dotted JSON path → the record type nested there.
    pub nested_objects: BTreeMap<String, TypeRef>,
    /// Dotted JSON path → the element type of the array nested there.
    pub nested_arrays: BTreeMap<String, TypeRef>,
}

impl TypeDescriptor {
    /// Analyze `T`, recursing up to `max_depth` levels deep.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::DepthExceeded`] if recursion (through distinct
    /// types — cycles are short-circuited, not an infinite loop) exceeds
    /// `max_depth`.
    pub fn analyze<T: Described>(max_depth: usize) -> Result<Self, BuildError> {
        Self::analyze_fn(T::fields, max_depth)
    }

    /// Analyze a type by its field-table function pointer directly, for
    /// callers (such as `apiver-runtime`'s pipeline) that only have a
    /// [`TypeRef`] at hand rather than a `T: Described` in scope.
    ///
    /// # Errors
    ///
    /// Same as [`TypeDescriptor::analyze`].
    pub fn analyze_fn(descriptor: DescriptorFn, max_depth: usize) -> Result<Self, BuildError> {
        let mut out = Self::default();
        let mut visiting: Vec<usize> = Vec::new();
        walk(descriptor(), "", 0, max_depth, &mut visiting, &mut out)?;
        Ok(out)
    }
}

fn fn_identity(f: DescriptorFn) -> usize {
    f as *const () as usize
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

fn walk(
    fields: &'static [FieldSpec],
    path: &str,
    depth: usize,
    max_depth: usize,
    visiting: &mut Vec<usize>,
    out: &mut TypeDescriptor,
) -> Result<(), BuildError> {
    if depth > max_depth {
        return Err(BuildError::DepthExceeded { max_depth, path: path.to_string() });
    }
    for field in fields {
        let field_path = join_path(path, field.json_name);
        match field.shape {
            FieldShape::Scalar => {}
            FieldShape::Object(name, descriptor) => {
                out.nested_objects.insert(field_path.clone(), TypeRef { name, descriptor });
                recurse(descriptor, &field_path, depth, max_depth, visiting, out)?;
            }
            FieldShape::Array(name, descriptor) => {
                out.nested_arrays.insert(field_path.clone(), TypeRef { name, descriptor });
                recurse(descriptor, &field_path, depth, max_depth, visiting, out)?;
            }
        }
    }
    Ok(())
}

fn recurse(
    descriptor: DescriptorFn,
    field_path: &str,
    depth: usize,
    max_depth: usize,
    visiting: &mut Vec<usize>,
    out: &mut TypeDescriptor,
) -> Result<(), BuildError> {
    let id = fn_identity(descriptor);
    if visiting.contains(&id) {
        // Cycle: this type is already on the current path. It has been
        // recorded at `field_path` above; do not recurse into it again.
        return Ok(());
    }
    visiting.push(id);
    let result = walk(descriptor(), field_path, depth + 1, max_depth, visiting, out);
    visiting.pop();
    result
}
