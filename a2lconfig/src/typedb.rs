use fnv::FnvHashMap;
use std::fmt::Display;
use std::sync::LazyLock;

/// canonical storage layout of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Ubyte,
    Uword,
    Ulong,
    Slong,
    Float32Ieee,
    Curve,
    Map,
}

impl RecordType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Ubyte => "UBYTE",
            RecordType::Uword => "UWORD",
            RecordType::Ulong => "ULONG",
            RecordType::Slong => "SLONG",
            RecordType::Float32Ieee => "FLOAT32_IEEE",
            RecordType::Curve => "CURVE",
            RecordType::Map => "MAP",
        }
    }
}

impl Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from vendor specific type tags to canonical record types
///
/// Registering a tag that is already present replaces the earlier registration.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: FnvHashMap<String, RecordType>,
}

impl TypeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// register `tag`; the last registration of a tag wins
    pub fn register(&mut self, tag: &str, record_type: RecordType) {
        self.types.insert(tag.to_string(), record_type);
    }

    /// look up the canonical record type of a tag
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<RecordType> {
        self.types.get(tag).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// Lookup1D_SLONG is registered twice; the second registration (ULONG) is the effective one.
const BUILTIN_TYPES: &[(&str, RecordType)] = &[
    ("Lookup1D_BOOLEAN", RecordType::Ubyte),
    ("Lookup1D_BYTE", RecordType::Ubyte),
    ("Lookup1D_FLOAT32_IEEE", RecordType::Float32Ieee),
    ("Lookup1D_SLONG", RecordType::Slong),
    ("Lookup1D_SLONG", RecordType::Ulong),
    ("Lookup1D_UBYTE", RecordType::Ubyte),
    ("Lookup1D_ULONG", RecordType::Ulong),
    ("Lookup1D_UWORD", RecordType::Uword),
    ("Lookup1D_WORD", RecordType::Uword),
    ("Lookup1D_X_BOOLEAN", RecordType::Ubyte),
    ("Lookup1D_X_BYTE", RecordType::Ubyte),
    ("Lookup1D_X_FLOAT32_IEEE", RecordType::Float32Ieee),
    ("Lookup1D_X_LONG", RecordType::Ulong),
    ("Lookup1D_X_UBYTE", RecordType::Ubyte),
    ("Lookup1D_X_ULONG", RecordType::Ulong),
    ("Lookup1D_X_UWORD", RecordType::Uword),
    ("Lookup1D_X_WORD", RecordType::Uword),
    ("Lookup2D_BOOLEAN", RecordType::Ubyte),
    ("Lookup2D_BYTE", RecordType::Ubyte),
    ("Lookup2D_FLOAT32_IEEE", RecordType::Float32Ieee),
    ("Lookup2D_LONG", RecordType::Ulong),
    ("Lookup2D_UBYTE", RecordType::Ubyte),
    ("Lookup2D_ULONG", RecordType::Ulong),
    ("Lookup2D_UWORD", RecordType::Uword),
    ("Lookup2D_WORD", RecordType::Uword),
    ("Lookup2D_X_BOOLEAN", RecordType::Ubyte),
    ("Lookup2D_X_BYTE", RecordType::Ubyte),
    ("Lookup2D_X_FLOAT32_IEEE", RecordType::Float32Ieee),
    ("Lookup2D_X_LONG", RecordType::Ulong),
    ("Lookup2D_X_UBYTE", RecordType::Ubyte),
    ("Lookup2D_X_ULONG", RecordType::Ulong),
    ("Lookup2D_X_UWORD", RecordType::Uword),
    ("Lookup2D_X_WORD", RecordType::Uword),
    ("RL_X_FLOAT32_IEEE", RecordType::Float32Ieee),
    ("RL_X_UWORD", RecordType::Uword),
    ("SBYTE", RecordType::Ubyte),
    ("Scalar_BOOLEAN", RecordType::Ubyte),
    ("Scalar_BYTE", RecordType::Ubyte),
    ("Scalar_FLOAT32_IEEE", RecordType::Float32Ieee),
    ("Scalar_LONG", RecordType::Ulong),
    ("Scalar_SWORD", RecordType::Uword),
    ("Scalar_UBYTE", RecordType::Ubyte),
    ("Scalar_ULONG", RecordType::Ulong),
    ("Scalar_UWORD", RecordType::Uword),
    ("USHORT", RecordType::Uword),
    ("SWORD", RecordType::Uword),
    // canonical names resolve to themselves
    ("CURVE", RecordType::Curve),
    ("FLOAT32_IEEE", RecordType::Float32Ieee),
    ("MAP", RecordType::Map),
    ("UBYTE", RecordType::Ubyte),
    ("ULONG", RecordType::Ulong),
    ("UWORD", RecordType::Uword),
    ("SLONG", RecordType::Slong),
];

static TYPE_TABLE: LazyLock<TypeTable> = LazyLock::new(|| {
    let mut table = TypeTable::new();
    for (tag, record_type) in BUILTIN_TYPES {
        table.register(tag, *record_type);
    }
    table
});

/// the built-in type table. It is never modified after construction
pub fn builtin_types() -> &'static TypeTable {
    &TYPE_TABLE
}

pub(crate) fn resolve_record_type(tag: &str) -> Option<RecordType> {
    TYPE_TABLE.resolve(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_known_tags() {
        assert_eq!(resolve_record_type("Scalar_UBYTE"), Some(RecordType::Ubyte));
        assert_eq!(
            resolve_record_type("Lookup2D_X_FLOAT32_IEEE"),
            Some(RecordType::Float32Ieee)
        );
        assert_eq!(resolve_record_type("RL_X_UWORD"), Some(RecordType::Uword));
        assert_eq!(resolve_record_type("SWORD"), Some(RecordType::Uword));
    }

    #[test]
    fn canonical_tags_resolve_to_themselves() {
        for record_type in [
            RecordType::Ubyte,
            RecordType::Uword,
            RecordType::Ulong,
            RecordType::Slong,
            RecordType::Float32Ieee,
            RecordType::Curve,
            RecordType::Map,
        ] {
            assert_eq!(resolve_record_type(record_type.as_str()), Some(record_type));
        }
    }

    #[test]
    fn unknown_tags_fail() {
        assert_eq!(resolve_record_type("Bogus_TYPE"), None);
        // lookups are case sensitive
        assert_eq!(resolve_record_type("scalar_ubyte"), None);
        assert_eq!(resolve_record_type(""), None);
    }

    #[test]
    fn last_registration_wins() {
        assert_eq!(resolve_record_type("Lookup1D_SLONG"), Some(RecordType::Ulong));

        let mut table = TypeTable::new();
        table.register("Lookup1D_SLONG", RecordType::Slong);
        table.register("Lookup1D_SLONG", RecordType::Ulong);
        assert_eq!(table.resolve("Lookup1D_SLONG"), Some(RecordType::Ulong));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn builtin_table_size() {
        // one duplicate registration
        assert_eq!(builtin_types().len(), BUILTIN_TYPES.len() - 1);
        assert!(!builtin_types().is_empty());
    }
}
