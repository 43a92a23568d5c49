// Plain key/value table used for gsub table replacements and library
// registration. No metatables, no array part.

use ahash::RandomState;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::lua_value::{LuaString, LuaValue, float_to_integer};

pub type LuaTableRef = Rc<RefCell<LuaTable>>;

/// Hashable projection of a `LuaValue`. Integral floats normalize to
/// integers so `t[1]` and `t[1.0]` are the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TableKey {
    Boolean(bool),
    Integer(i64),
    Float(u64),
    String(LuaString),
    Object(usize),
}

impl TableKey {
    fn from_value(key: &LuaValue) -> Option<Self> {
        Some(match key {
            LuaValue::Nil => return None,
            LuaValue::Boolean(b) => TableKey::Boolean(*b),
            LuaValue::Integer(i) => TableKey::Integer(*i),
            LuaValue::Float(f) => match float_to_integer(*f) {
                Some(i) => TableKey::Integer(i),
                None if f.is_nan() => return None,
                None => TableKey::Float(f.to_bits()),
            },
            LuaValue::String(s) => TableKey::String(s.clone()),
            LuaValue::Table(t) => TableKey::Object(Rc::as_ptr(t) as usize),
            LuaValue::Function(f) => TableKey::Object(f.addr()),
        })
    }
}

#[derive(Debug, Default)]
pub struct LuaTable {
    entries: HashMap<TableKey, (LuaValue, LuaValue), RandomState>,
}

impl LuaTable {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
        }
    }

    /// Raw get; nil and NaN keys read as nil.
    pub fn get(&self, key: &LuaValue) -> LuaValue {
        TableKey::from_value(key)
            .and_then(|k| self.entries.get(&k))
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    pub fn get_str(&self, key: &str) -> LuaValue {
        self.get(&LuaValue::from(key))
    }

    /// Raw set. Assigning nil removes the entry. Returns false for keys a
    /// table cannot hold (nil, NaN).
    pub fn set(&mut self, key: LuaValue, value: LuaValue) -> bool {
        let Some(k) = TableKey::from_value(&key) else {
            return false;
        };
        if value.is_nil() {
            self.entries.remove(&k);
        } else {
            self.entries.insert(k, (key, value));
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LuaValue, &LuaValue)> {
        self.entries.values().map(|(k, v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_keys_normalize() {
        let mut t = LuaTable::new();
        t.set(LuaValue::integer(1), LuaValue::from("one"));
        assert_eq!(t.get(&LuaValue::float(1.0)), LuaValue::from("one"));
        t.set(LuaValue::float(1.5), LuaValue::from("half"));
        assert_eq!(t.get(&LuaValue::float(1.5)), LuaValue::from("half"));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_nil_assignment_removes() {
        let mut t = LuaTable::new();
        t.set(LuaValue::from("k"), LuaValue::boolean(true));
        t.set(LuaValue::from("k"), LuaValue::nil());
        assert!(t.is_empty());
        assert!(!t.set(LuaValue::nil(), LuaValue::integer(1)));
        assert!(t.get_str("k").is_nil());
    }
}
