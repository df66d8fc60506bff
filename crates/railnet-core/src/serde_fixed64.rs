//! Serde adapter that reads and writes [`Fixed64`] as a plain decimal number.
//!
//! Config files say `break_probability: 0.4`, not a bit pattern.

use crate::fixed::Fixed64;
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(value: &Fixed64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(value.to_num::<f64>())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberInput {
        Int(i64),
        Float(f64),
    }

    match NumberInput::deserialize(deserializer)? {
        NumberInput::Int(v) => Fixed64::checked_from_num(v)
            .ok_or_else(|| D::Error::custom(format!("{v} is out of fixed-point range"))),
        NumberInput::Float(v) if v.is_finite() => Fixed64::checked_from_num(v)
            .ok_or_else(|| D::Error::custom(format!("{v} is out of fixed-point range"))),
        NumberInput::Float(v) => Err(D::Error::custom(format!("{v} is not a finite number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Wrapper {
        #[serde(with = "super")]
        p: Fixed64,
    }

    #[test]
    fn deserialize_accepts_float() {
        let parsed: Wrapper = serde_json::from_str(r#"{"p":0.5}"#).unwrap();
        assert_eq!(parsed.p, Fixed64::from_num(0.5));
    }

    #[test]
    fn deserialize_accepts_integer() {
        let parsed: Wrapper = serde_json::from_str(r#"{"p":2}"#).unwrap();
        assert_eq!(parsed.p, Fixed64::from_num(2));
    }

    #[test]
    fn deserialize_rejects_out_of_range() {
        let parsed: Result<Wrapper, _> = serde_json::from_str(r#"{"p":1e300}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn serializes_as_number() {
        let json = serde_json::to_string(&Wrapper {
            p: Fixed64::from_num(0.25),
        })
        .unwrap();
        assert_eq!(json, r#"{"p":0.25}"#);
    }
}
