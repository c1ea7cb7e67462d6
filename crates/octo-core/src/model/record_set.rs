use serde::{Deserialize, Serialize};

/// One or more records matching a filter
///
/// Zero matches is represented by the absence of a `RecordSet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSet<E> {
    One(E),
    Many(Vec<E>),
}

impl<E> RecordSet<E> {
    /// `None` for no records, `One` for exactly one, `Many` otherwise
    pub fn from_records(mut records: Vec<E>) -> Option<Self> {
        match records.len() {
            0 => None,
            1 => records.pop().map(RecordSet::One),
            _ => Some(RecordSet::Many(records)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordSet::One(_) => 1,
            RecordSet::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn records(&self) -> &[E] {
        match self {
            RecordSet::One(record) => std::slice::from_ref(record),
            RecordSet::Many(records) => records,
        }
    }

    pub fn single(&self) -> Option<&E> {
        match self {
            RecordSet::One(record) => Some(record),
            RecordSet::Many(_) => None,
        }
    }

    pub fn into_single(self) -> Option<E> {
        match self {
            RecordSet::One(record) => Some(record),
            RecordSet::Many(_) => None,
        }
    }

    pub fn into_vec(self) -> Vec<E> {
        match self {
            RecordSet::One(record) => vec![record],
            RecordSet::Many(records) => records,
        }
    }
}
