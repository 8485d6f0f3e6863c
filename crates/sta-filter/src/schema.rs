//! Queryable property maps.
//!
//! Each entity service declares which client-visible property names exist and
//! which internal columns they map onto. Member access in filters and
//! `$orderby` keys are resolved through these maps.

/// Static value type of a column, used for comparability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Boolean,
    DateTime,
    Date,
    TimeOfDay,
    Geometry,
    Json,
    /// Type known only at runtime (e.g. an Observation result).
    Any,
}

impl ValueType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueType::Number | ValueType::Any)
    }

    /// True if values of the two types may be compared without coercion.
    pub fn comparable_with(&self, other: &ValueType) -> bool {
        matches!(self, ValueType::Any | ValueType::Json)
            || matches!(other, ValueType::Any | ValueType::Json)
            || self == other
    }

    /// True if a value of this type may be passed where `expected` is required.
    pub fn accepts(&self, expected: ValueType) -> bool {
        matches!(self, ValueType::Any) || *self == expected
    }
}

/// How a client-visible property maps onto storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    /// A single typed column.
    Column { name: &'static str, ty: ValueType },
    /// A time property stored as a start/end column pair.
    Span {
        start: &'static str,
        end: &'static str,
    },
    /// A free-form JSON column; trailing path segments index into it.
    Json { name: &'static str },
    /// A to-one navigation into another entity's property map.
    Relation { target: &'static str },
}

/// The queryable property set of one entity type.
#[derive(Debug)]
pub struct PropertyMap {
    pub entity: &'static str,
    pub properties: &'static [(&'static str, Property)],
}

impl PropertyMap {
    /// Look up a property, returning its canonical name alongside.
    pub fn entry(&self, name: &str) -> Option<(&'static str, Property)> {
        self.properties
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(n, p)| (*n, *p))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(|(n, _)| *n)
    }
}

/// Lookup of property maps by entity name, used to follow navigation paths.
pub trait SchemaRegistry {
    fn property_map(&self, entity: &str) -> Option<&'static PropertyMap>;
}

#[cfg(test)]
mod tests {
    use super::*;

    static THINGS: PropertyMap = PropertyMap {
        entity: "Thing",
        properties: &[
            ("id", Property::Column { name: "id", ty: ValueType::String }),
            ("name", Property::Column { name: "name", ty: ValueType::String }),
            ("properties", Property::Json { name: "properties" }),
        ],
    };

    #[test]
    fn test_entry_lookup() {
        assert!(THINGS.contains("name"));
        assert!(!THINGS.contains("Name"));
        let (name, prop) = THINGS.entry("properties").unwrap();
        assert_eq!(name, "properties");
        assert_eq!(prop, Property::Json { name: "properties" });
    }

    #[test]
    fn test_comparability() {
        assert!(ValueType::Number.comparable_with(&ValueType::Number));
        assert!(ValueType::Any.comparable_with(&ValueType::DateTime));
        assert!(!ValueType::String.comparable_with(&ValueType::DateTime));
    }
}
