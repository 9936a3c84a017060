//! Display and Serialize implementations for real-sets

use super::{Bound, Interval, RealSet};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;

// ---------------------------
// Display implementations
// ---------------------------

impl fmt::Display for RealSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.intervals.is_empty() {
            return write!(f, "∅");
        }
        for (i, interval) in self.intervals.iter().enumerate() {
            if i > 0 {
                write!(f, " ∪ ")?;
            }
            write!(f, "{}", interval)?;
        }
        Ok(())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_point() {
            if let Some(v) = self.min.value() {
                return write!(f, "{{{}}}", v);
            }
        }
        // Mathematical interval notation: (a, b], [a, +∞), etc.
        let l_bracket = if self.min.is_inclusive() { '[' } else { '(' };
        let r_bracket = if self.max.is_inclusive() { ']' } else { ')' };
        let min_str = match &self.min {
            Bound::Unbounded => "-∞".to_string(),
            Bound::Inclusive(v) | Bound::Exclusive(v) => v.to_string(),
        };
        let max_str = match &self.max {
            Bound::Unbounded => "+∞".to_string(),
            Bound::Inclusive(v) | Bound::Exclusive(v) => v.to_string(),
        };
        write!(f, "{}{}, {}{}", l_bracket, min_str, max_str, r_bracket)
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Unbounded => write!(f, "∞"),
            Bound::Inclusive(v) => write!(f, "[{}", v),
            Bound::Exclusive(v) => write!(f, "({}", v),
        }
    }
}

// ---------------------------
// Serialize implementations
// ---------------------------

impl Serialize for RealSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = serializer.serialize_struct("real_set", 1)?;
        st.serialize_field("intervals", &self.intervals)?;
        st.end()
    }
}

impl Serialize for Interval {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = serializer.serialize_struct("interval", 2)?;
        st.serialize_field("min", &self.min)?;
        st.serialize_field("max", &self.max)?;
        st.end()
    }
}

impl Serialize for Bound {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Bound::Unbounded => {
                let mut st = serializer.serialize_struct("bound", 1)?;
                st.serialize_field("type", "unbounded")?;
                st.end()
            }
            Bound::Inclusive(v) | Bound::Exclusive(v) => {
                let kind = if self.is_inclusive() {
                    "inclusive"
                } else {
                    "exclusive"
                };
                let mut st = serializer.serialize_struct("bound", 4)?;
                st.serialize_field("type", kind)?;
                st.serialize_field("value", &v.to_string())?;
                st.serialize_field("exact", &v.is_exact())?;
                st.serialize_field("approx", &v.to_f64())?;
                st.end()
            }
        }
    }
}
