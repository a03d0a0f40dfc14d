use vast_value::{Offset, Tag, Type, Value};

use crate::predicate::{IndexerKey, Predicate};

/// Splits a predicate tree into its meta half (answerable from partition
/// metadata/schema name alone) and its data half (requires indexer
/// evaluation). Only pulls meta leaves out of a top-level conjunction,
/// per the "conjunction-aware" rule — an `Or`/`Not` node is left intact
/// on the data side since meta extraction does not distribute over it.
pub fn split_meta_data(predicate: &Predicate) -> (Option<Predicate>, Option<Predicate>) {
    match predicate {
        Predicate::Timestamp(..) | Predicate::Name(..) => (Some(predicate.clone()), None),
        Predicate::And(parts) => {
            let mut metas = Vec::new();
            let mut datas = Vec::new();
            for part in parts {
                let (meta, data) = split_meta_data(part);
                metas.extend(meta);
                datas.extend(data);
            }
            (fold_and(metas), fold_and(datas))
        }
        _ => (None, Some(predicate.clone())),
    }
}

fn fold_and(mut parts: Vec<Predicate>) -> Option<Predicate> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(Predicate::And(parts)),
    }
}

/// Implements the four extractor→selection rules of the predicate
/// dispatch contract against a partition's flattened schema leaves,
/// deduplicating by [`IndexerKey`].
pub fn select_indexers(leaf: &Predicate, schema: &Type) -> Vec<IndexerKey> {
    let leaves = schema.leaves();
    let selected = match leaf {
        Predicate::Timestamp(..) | Predicate::Name(..) => {
            // handled directly against partition metadata, never routed
            // to a per-field indexer.
            Vec::new()
        }
        Predicate::Type(tag, ..) => leaves
            .iter()
            .filter(|(_, _, t)| t == tag)
            .map(|(offset, path, tag)| IndexerKey::new(offset.clone(), path.clone(), *tag))
            .collect(),
        Predicate::Schema(suffix, _, value) => select_by_suffix(&leaves, suffix, value),
        Predicate::And(parts) | Predicate::Or(parts) => {
            let mut out = Vec::new();
            for part in parts {
                out.extend(select_indexers(part, schema));
            }
            out
        }
        Predicate::Not(inner) => select_indexers(inner, schema),
    };
    dedup(selected)
}

fn select_by_suffix(
    leaves: &[(Offset, Vec<String>, Tag)],
    suffix: &[String],
    value: &Value,
) -> Vec<IndexerKey> {
    let matches: Vec<&(Offset, Vec<String>, Tag)> =
        leaves.iter().filter(|(_, path, _)| has_suffix(path, suffix)).collect();
    if matches.is_empty() {
        log::warn!("schema extractor suffix {suffix:?} matched no indexer");
        return Vec::new();
    }
    let Some(expected) = value.tag() else {
        log::warn!("schema extractor suffix {suffix:?} compared against an invalid constant");
        return Vec::new();
    };
    let mut out = Vec::new();
    for (offset, path, tag) in matches {
        if *tag == expected {
            out.push(IndexerKey::new(offset.clone(), path.clone(), *tag));
        } else {
            log::warn!(
                "schema extractor suffix {suffix:?} matched {path:?} but tag {tag:?} != {expected:?}"
            );
        }
    }
    out
}

fn has_suffix(path: &[String], suffix: &[String]) -> bool {
    if suffix.len() > path.len() {
        return false;
    }
    &path[path.len() - suffix.len()..] == suffix
}

fn dedup(mut keys: Vec<IndexerKey>) -> Vec<IndexerKey> {
    keys.sort_by(|a, b| (a.path.clone(), a.offset.0.clone()).cmp(&(b.path.clone(), b.offset.0.clone())));
    keys.dedup();
    keys
}
