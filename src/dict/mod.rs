//! The batch dictionary: a keyed container behaving like one batched array
//!
//! Every field of a [`BatchDict`] shares the dictionary's batch shape as a
//! prefix of its own shape. Indexing the dictionary normalizes the index
//! expression (ellipsis expansion), infers the resulting batch shape
//! without touching data, and then applies the expression to every field
//! through the field-kind dispatch layer.

use crate::array::Shape;
use crate::error::{Error, Result};
use crate::field::{Field, FieldOps};
use crate::index::{expand_ellipsis, has_ellipsis, infer_shape, Index};
use std::collections::BTreeMap;

/// Ordered map of named fields sharing one batch shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchDict {
    fields: BTreeMap<String, Field>,
    batch_shape: Shape,
}

impl BatchDict {
    /// Create an empty dictionary with the given batch shape
    pub fn new(batch_shape: impl Into<Shape>) -> Self {
        Self {
            fields: BTreeMap::new(),
            batch_shape: batch_shape.into(),
        }
    }

    /// The shared leading dimensions of every field
    #[inline]
    pub fn batch_shape(&self) -> &Shape {
        &self.batch_shape
    }

    /// Number of batch dimensions
    #[inline]
    pub fn batch_ndim(&self) -> usize {
        self.batch_shape.ndim()
    }

    /// Number of fields
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the dictionary holds no fields
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the field names
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    /// Iterate over `(name, field)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, f)| (k.as_str(), f))
    }

    /// Whether a field with this name exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Look up a field by name
    pub fn get(&self, key: &str) -> Result<&Field> {
        self.fields.get(key).ok_or_else(|| Error::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Look up a field by name, mutably
    pub fn get_mut(&mut self, key: &str) -> Result<&mut Field> {
        self.fields.get_mut(key).ok_or_else(|| Error::KeyNotFound {
            key: key.to_string(),
        })
    }

    /// Bind a field to a name
    ///
    /// The field's shape must carry this dictionary's batch shape as a
    /// prefix; for a ragged field that means a rank-1 batch of matching
    /// size.
    pub fn set(&mut self, key: impl Into<String>, field: impl Into<Field>) -> Result<()> {
        let field = field.into();
        let shape = FieldOps::shape(&field);
        if !shape.starts_with(&self.batch_shape) {
            return Err(Error::shape_mismatch(&self.batch_shape, &shape));
        }
        self.fields.insert(key.into(), field);
        Ok(())
    }

    /// Remove a field by name
    pub fn remove(&mut self, key: &str) -> Option<Field> {
        self.fields.remove(key)
    }

    /// The batch shape that indexing with `items` would produce
    ///
    /// Pure metadata: no field is touched.
    pub fn inferred_batch_shape(&self, items: &[Index]) -> Result<Shape> {
        if has_ellipsis(items) {
            let expanded = expand_ellipsis(items, &self.batch_shape)?;
            infer_shape(&self.batch_shape, &expanded)
        } else {
            infer_shape(&self.batch_shape, items)
        }
    }

    /// Select a sub-dictionary according to an index expression
    pub fn get_item(&self, items: &[Index]) -> Result<BatchDict> {
        let expanded;
        let items = if has_ellipsis(items) {
            expanded = expand_ellipsis(items, &self.batch_shape)?;
            &expanded[..]
        } else {
            items
        };
        let new_batch = infer_shape(&self.batch_shape, items)?;
        let mut out = BatchDict::new(new_batch);
        for (key, field) in &self.fields {
            out.set(key.clone(), field.get(items)?)?;
        }
        Ok(out)
    }

    /// Overwrite the selection with the fields of another dictionary
    ///
    /// `value`'s batch shape must equal the shape the selection infers, and
    /// every key of `value` must already exist here.
    pub fn set_item(&mut self, items: &[Index], value: &BatchDict) -> Result<()> {
        let expanded;
        let items = if has_ellipsis(items) {
            expanded = expand_ellipsis(items, &self.batch_shape)?;
            &expanded[..]
        } else {
            items
        };
        let selected = infer_shape(&self.batch_shape, items)?;
        if value.batch_shape != selected {
            return Err(Error::shape_mismatch(&selected, &value.batch_shape));
        }
        for (key, source) in &value.fields {
            let target = self
                .fields
                .get_mut(key)
                .ok_or_else(|| Error::KeyNotFound { key: key.clone() })?;
            target.set(items, source)?;
        }
        Ok(())
    }
}
