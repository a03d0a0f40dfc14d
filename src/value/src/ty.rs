use serde::{Deserialize, Serialize};

use crate::offset::Offset;
use crate::value::Tag;
use vast_core::errors::{Error, SchemaMismatchSnafu};
use snafu::ensure;

/// A named schema tree whose leaves carry one of the basic [`Tag`]s. Only
/// the top-level type ordinarily carries a `name` (the event type name
/// the `name` indexer matches against); nested field types leave it
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Leaf(Tag),
    Record { name: Option<String>, fields: Vec<(String, Type)> },
}

impl Type {
    pub fn record(name: impl Into<String>, fields: Vec<(String, Type)>) -> Type {
        Type::Record { name: Some(name.into()), fields }
    }

    pub fn anonymous_record(fields: Vec<(String, Type)>) -> Type {
        Type::Record { name: None, fields }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Record { name, .. } => name.as_deref(),
            Type::Leaf(_) => None,
        }
    }

    /// Two types are merge-compatible iff identically-named leaves share
    /// the same tag; merging unions their leaves. A type name present on
    /// either side survives the merge; the left side wins on disagreement.
    pub fn merge(&self, other: &Type) -> Result<Type, Error> {
        match (self, other) {
            (Type::Leaf(a), Type::Leaf(b)) => {
                ensure!(
                    a == b,
                    SchemaMismatchSnafu {
                        what: format!("leaf tag mismatch: {a:?} vs {b:?}"),
                    }
                );
                Ok(Type::Leaf(*a))
            }
            (
                Type::Record { name: name_a, fields: a },
                Type::Record { name: name_b, fields: b },
            ) => {
                let mut fields: Vec<(String, Type)> = a.clone();
                for (name, ty) in b {
                    match fields.iter().position(|(n, _)| n == name) {
                        Some(idx) => {
                            let merged = fields[idx].1.merge(ty)?;
                            fields[idx].1 = merged;
                        }
                        None => fields.push((name.clone(), ty.clone())),
                    }
                }
                let name = name_a.clone().or_else(|| name_b.clone());
                Ok(Type::Record { name, fields })
            }
            _ => SchemaMismatchSnafu {
                what: "record/leaf shape mismatch".to_string(),
            }
            .fail(),
        }
    }

    /// Every leaf in left-to-right order, paired with its [`Offset`] and
    /// the dotted path of field names leading to it (used to build the
    /// on-disk indexer path `<type>/<k1>/.../<kN>`).
    pub fn leaves(&self) -> Vec<(Offset, Vec<String>, Tag)> {
        let mut out = Vec::new();
        self.collect_leaves(&Offset::default(), &mut Vec::new(), &mut out);
        out
    }

    fn collect_leaves(
        &self,
        prefix: &Offset,
        path: &mut Vec<String>,
        out: &mut Vec<(Offset, Vec<String>, Tag)>,
    ) {
        match self {
            Type::Leaf(tag) => out.push((prefix.clone(), path.clone(), *tag)),
            Type::Record { fields, .. } => {
                for (i, (name, ty)) in fields.iter().enumerate() {
                    path.push(name.clone());
                    ty.collect_leaves(&prefix.push(i), path, out);
                    path.pop();
                }
            }
        }
    }

    pub fn leaf_at(&self, offset: &Offset) -> Option<Tag> {
        let mut current = self;
        for &idx in &offset.0 {
            match current {
                Type::Record { fields, .. } => current = &fields.get(idx)?.1,
                Type::Leaf(_) => return None,
            }
        }
        match current {
            Type::Leaf(tag) => Some(*tag),
            Type::Record { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t_a_int() -> Type {
        Type::record("t", vec![("a".to_string(), Type::Leaf(Tag::Int64))])
    }

    #[test]
    fn merge_unions_leaves() {
        let a = t_a_int();
        let b = Type::anonymous_record(vec![("b".to_string(), Type::Leaf(Tag::String))]);
        let merged = a.merge(&b).unwrap();
        let leaves = merged.leaves();
        let names: Vec<&str> = leaves
            .iter()
            .map(|(_, path, _)| path.last().unwrap().as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(merged.name(), Some("t"));
    }

    #[test]
    fn merge_rejects_tag_conflict() {
        let a = t_a_int();
        let b = Type::anonymous_record(vec![("a".to_string(), Type::Leaf(Tag::String))]);
        assert!(a.merge(&b).is_err());
    }

    #[test]
    fn leaves_are_left_to_right() {
        let t = Type::record(
            "t",
            vec![
                ("a".to_string(), Type::Leaf(Tag::Int64)),
                (
                    "b".to_string(),
                    Type::anonymous_record(vec![("c".to_string(), Type::Leaf(Tag::String))]),
                ),
            ],
        );
        let leaves = t.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].0, Offset::new(vec![0]));
        assert_eq!(leaves[1].0, Offset::new(vec![1, 0]));
        assert_eq!(leaves[1].1, vec!["b".to_string(), "c".to_string()]);
    }
}
