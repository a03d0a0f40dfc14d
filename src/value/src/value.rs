use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// The discriminant of a [`Value`]'s basic type, independent of whether
/// the value is currently engaged, nil, or invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    Bool,
    Int64,
    UInt64,
    Double,
    Duration,
    Time,
    String,
    Regex,
    Address,
    Subnet,
    Port,
    Record,
    Vector,
    Set,
    Table,
}

pub const TAG_ORDER: [Tag; 15] = [
    Tag::Bool,
    Tag::Int64,
    Tag::UInt64,
    Tag::Double,
    Tag::Duration,
    Tag::Time,
    Tag::String,
    Tag::Regex,
    Tag::Address,
    Tag::Subnet,
    Tag::Port,
    Tag::Record,
    Tag::Vector,
    Tag::Set,
    Tag::Table,
]
;

/// A tagged union over the event-value domain. A `Value` is in one of
/// three states: [`Value::Invalid`] (no type at all), [`Value::Nil`]
/// (typed but unset), or one of the engaged variants (typed and set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Invalid,
    Nil(Tag),
    Bool(bool),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    /// Signed duration in microseconds.
    Duration(i64),
    /// Microseconds since the Unix epoch.
    Time(i64),
    String(String),
    Regex(String),
    Address(IpAddr),
    Subnet(IpAddr, u8),
    Port(u16),
    Record(Vec<Value>),
    Vector(Vec<Value>),
    Set(Vec<Value>),
    Table(Vec<(Value, Value)>),
}

impl Value {
    /// The value's tag, or `None` for [`Value::Invalid`].
    pub fn tag(&self) -> Option<Tag> {
        Some(match self {
            Value::Invalid => return None,
            Value::Nil(t) => *t,
            Value::Bool(_) => Tag::Bool,
            Value::Int64(_) => Tag::Int64,
            Value::UInt64(_) => Tag::UInt64,
            Value::Double(_) => Tag::Double,
            Value::Duration(_) => Tag::Duration,
            Value::Time(_) => Tag::Time,
            Value::String(_) => Tag::String,
            Value::Regex(_) => Tag::Regex,
            Value::Address(_) => Tag::Address,
            Value::Subnet(..) => Tag::Subnet,
            Value::Port(_) => Tag::Port,
            Value::Record(_) => Tag::Record,
            Value::Vector(_) => Tag::Vector,
            Value::Set(_) => Tag::Set,
            Value::Table(_) => Tag::Table,
        })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Value::Invalid)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil(_))
    }

    pub fn is_engaged(&self) -> bool {
        !self.is_invalid() && !self.is_nil()
    }

    fn tag_rank(tag: Tag) -> usize {
        TAG_ORDER.iter().position(|t| *t == tag).unwrap_or(usize::MAX)
    }

    /// Navigates a nested [`Value::Record`] by [`crate::Offset`],
    /// returning the leaf at that path, or `None` if the offset does
    /// not address a leaf of this value (e.g. the record doesn't carry
    /// that many fields, or an intermediate field isn't a record).
    pub fn at<'a>(&'a self, offset: &crate::Offset) -> Option<&'a Value> {
        let mut current = self;
        for &idx in &offset.0 {
            match current {
                Value::Record(fields) => current = fields.get(idx)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

impl PartialEq for Value {
    /// Equality is defined only between engaged values of the same tag;
    /// anything else (different tags, invalid, or nil operands) compares
    /// unequal rather than panicking.
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a == b,
            (Int64(a), Int64(b)) => a == b,
            (UInt64(a), UInt64(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Duration(a), Duration(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Regex(a), Regex(b)) => a == b,
            (Address(a), Address(b)) => a == b,
            (Subnet(a, la), Subnet(b, lb)) => a == b && la == lb,
            (Port(a), Port(b)) => a == b,
            (Record(a), Record(b)) => a == b,
            (Vector(a), Vector(b)) => a == b,
            (Set(a), Set(b)) => a == b,
            (Table(a), Table(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    /// `None` whenever either side is invalid or nil; otherwise orders
    /// same-tag values structurally and cross-tag values by the stable
    /// tag order in [`TAG_ORDER`].
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        let (ta, tb) = (self.tag()?, other.tag()?);
        if self.is_nil() || other.is_nil() {
            return None;
        }
        if ta != tb {
            return Self::tag_rank(ta).partial_cmp(&Self::tag_rank(tb));
        }
        use Value::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.partial_cmp(b),
            (Int64(a), Int64(b)) => a.partial_cmp(b),
            (UInt64(a), UInt64(b)) => a.partial_cmp(b),
            (Double(a), Double(b)) => a.partial_cmp(b),
            (Duration(a), Duration(b)) => a.partial_cmp(b),
            (Time(a), Time(b)) => a.partial_cmp(b),
            (String(a), String(b)) => a.partial_cmp(b),
            (Regex(a), Regex(b)) => a.partial_cmp(b),
            (Port(a), Port(b)) => a.partial_cmp(b),
            (Address(a), Address(b)) => a.partial_cmp(b),
            (Subnet(a, la), Subnet(b, lb)) => (a, la).partial_cmp(&(b, lb)),
            _ => None,
        }
    }
}
