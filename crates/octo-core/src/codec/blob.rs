use serde::{Deserialize, Serialize};

use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::{Entity, RecordSet};

#[derive(Serialize)]
struct EnvelopeRef<'a, E> {
    entity: &'a str,
    set: &'a RecordSet<E>,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    entity: String,
}

#[derive(Deserialize)]
struct Envelope<E> {
    set: RecordSet<E>,
}

/// Serialize a record or record set for the cache store
///
/// Only persisted attributes are written (the entity's serde shape), wrapped
/// with the entity name so a blob is never decoded as another entity.
pub fn serialize<E: Entity>(set: &RecordSet<E>) -> Result<String> {
    serde_json::to_string(&EnvelopeRef {
        entity: E::NAME,
        set,
    })
    .map_err(|e| {
        ExError::new(ExErrorKind::Serialization)
            .with_op("serialize")
            .with_entity(E::NAME)
            .with_message(e.to_string())
    })
}

/// Inverse of [`serialize`]
///
/// Malformed JSON, an envelope written for another entity and a payload that
/// does not fit the entity shape all fail with `Deserialization`.
pub fn deserialize<E: Entity>(blob: &str) -> Result<RecordSet<E>> {
    let header: EnvelopeHeader = serde_json::from_str(blob).map_err(decode_error::<E>)?;
    if header.entity != E::NAME {
        return Err(ExError::new(ExErrorKind::Deserialization)
            .with_op("deserialize")
            .with_entity(E::NAME)
            .with_message(format!("blob belongs to entity '{}'", header.entity)));
    }
    let envelope: Envelope<E> = serde_json::from_str(blob).map_err(decode_error::<E>)?;
    Ok(envelope.set)
}

fn decode_error<E: Entity>(err: serde_json::Error) -> ExError {
    ExError::new(ExErrorKind::Deserialization)
        .with_op("deserialize")
        .with_entity(E::NAME)
        .with_message(err.to_string())
}
