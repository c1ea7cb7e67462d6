use super::field::Field;
use super::value::FieldValue;

/// Ordered field → value list
///
/// Insertion order is preserved and is significant: it decides the token
/// order of the derived cache key. Setting a field that is already present
/// replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap<F: Field> {
    pairs: Vec<(F, FieldValue)>,
}

/// Key fields identifying a record or record set
pub type Filter<K> = FieldMap<K>;

/// Attribute fields to set on create or update
pub type Changes<A> = FieldMap<A>;

impl<F: Field> FieldMap<F> {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Builder form of [`FieldMap::set`]
    pub fn with(mut self, field: F, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: F, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((field, value)),
        }
    }

    pub fn get(&self, field: F) -> Option<&FieldValue> {
        self.pairs
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(F, FieldValue)> {
        self.pairs.iter()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<F: Field> Default for FieldMap<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Field, V: Into<FieldValue>> FromIterator<(F, V)> for FieldMap<F> {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (field, value) in iter {
            map.set(field, value);
        }
        map
    }
}
