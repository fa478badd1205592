//! The flat interchange form: nested records of integers and strings.

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One element of a flat tree.
///
/// A terminal is `[symbol, text]` or `[symbol, text, line, column]`, a
/// non-terminal is `[symbol, child, ...]`. Values of this type usually come
/// from outside the process and may have any shape.
#[derive(Debug, Clone)]
pub enum FlatValue {
    Int(i64),
    Str(String),
    Record(Vec<FlatValue>),
}

impl FlatValue {
    pub fn record(items: impl IntoIterator<Item = FlatValue>) -> Self {
        FlatValue::Record(items.into_iter().collect())
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            FlatValue::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlatValue::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&[FlatValue]> {
        match self {
            FlatValue::Record(items) => Some(items),
            _ => None,
        }
    }
}

impl From<i64> for FlatValue {
    fn from(value: i64) -> Self {
        FlatValue::Int(value)
    }
}

impl From<&str> for FlatValue {
    fn from(value: &str) -> Self {
        FlatValue::Str(value.to_owned())
    }
}

impl From<String> for FlatValue {
    fn from(value: String) -> Self {
        FlatValue::Str(value)
    }
}

impl From<Vec<FlatValue>> for FlatValue {
    fn from(items: Vec<FlatValue>) -> Self {
        FlatValue::Record(items)
    }
}

impl PartialEq for FlatValue {
    fn eq(&self, other: &Self) -> bool {
        let mut stack = vec![(self, other)];

        while let Some(pair) = stack.pop() {
            match pair {
                (FlatValue::Int(left), FlatValue::Int(right)) if left == right => {}
                (FlatValue::Str(left), FlatValue::Str(right)) if left == right => {}
                (FlatValue::Record(left), FlatValue::Record(right))
                    if left.len() == right.len() =>
                {
                    stack.extend(left.iter().zip(right));
                }
                _ => return false,
            }
        }

        true
    }
}

impl Eq for FlatValue {}

impl Drop for FlatValue {
    fn drop(&mut self) {
        let FlatValue::Record(items) = self else { return };
        if !items.iter().any(|item| matches!(item, FlatValue::Record(_))) {
            return;
        }

        let mut stack = std::mem::take(items);
        while let Some(mut item) = stack.pop() {
            if let FlatValue::Record(items) = &mut item {
                stack.append(items);
            }
        }
    }
}

impl Serialize for FlatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FlatValue::Int(value) => serializer.serialize_i64(*value),
            FlatValue::Str(value) => serializer.serialize_str(value),
            FlatValue::Record(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FlatValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FlatValueVisitor)
    }
}

struct FlatValueVisitor;

impl<'de> Visitor<'de> for FlatValueVisitor {
    type Value = FlatValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer, a string or an array of flat values")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<FlatValue, E> {
        Ok(FlatValue::Int(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<FlatValue, E> {
        match i64::try_from(value) {
            Ok(value) => Ok(FlatValue::Int(value)),
            Err(_) => Err(E::invalid_value(de::Unexpected::Unsigned(value), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<FlatValue, E> {
        Ok(FlatValue::Str(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<FlatValue, E> {
        Ok(FlatValue::Str(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FlatValue, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or_default().min(64));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(FlatValue::Record(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_arrays() {
        let value: FlatValue = serde_json::from_str(r#"[257, [1, "x", 1, 0], [0, ""]]"#).unwrap();
        assert_eq!(
            value,
            FlatValue::record([
                FlatValue::Int(257),
                FlatValue::record([
                    FlatValue::Int(1),
                    "x".into(),
                    FlatValue::Int(1),
                    FlatValue::Int(0),
                ]),
                FlatValue::record([FlatValue::Int(0), "".into()]),
            ])
        );
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"[257,[1,"x",1,0],[0,""]]"#);
    }

    #[test]
    fn json_rejects_other_values() {
        assert!(serde_json::from_str::<FlatValue>("1.5").is_err());
        assert!(serde_json::from_str::<FlatValue>("null").is_err());
        assert!(serde_json::from_str::<FlatValue>(r#"{"a": 1}"#).is_err());
        assert!(serde_json::from_str::<FlatValue>("18446744073709551615").is_err());
    }

    #[test]
    fn equality_is_structural() {
        let a = FlatValue::record([FlatValue::Int(1), "a".into()]);
        assert_eq!(a, a.clone());
        assert_ne!(a, FlatValue::record([FlatValue::Int(1), "b".into()]));
        assert_ne!(a, FlatValue::record([FlatValue::Int(1)]));
        assert_ne!(FlatValue::Int(1), FlatValue::Str("1".into()));
    }

    #[test]
    fn deep_values_drop_without_recursion() {
        let mut value = FlatValue::Int(0);
        for _ in 0..200_000 {
            value = FlatValue::record([value]);
        }
        let copy = FlatValue::record([FlatValue::Int(0)]);
        assert_ne!(value, copy);
        drop(value);
    }
}
