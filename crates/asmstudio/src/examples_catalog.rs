/// One bundled example program.
#[derive(Debug, Clone, Copy)]
pub struct ExampleEntry {
    pub name: &'static str,
    pub source: &'static str,
}

/// The read-only set of example programs compiled into the binary.
/// Discovered once at startup; an empty catalog is a valid state and
/// simply leaves the picker unavailable.
pub struct ExamplesCatalog {
    entries: Vec<ExampleEntry>,
}

impl ExamplesCatalog {
    pub fn bundled() -> Self {
        Self::from_entries(vec![
            ExampleEntry {
                name: "counting",
                source: include_str!("../resources/examples/counting.s"),
            },
            ExampleEntry {
                name: "fibonacci",
                source: include_str!("../resources/examples/fibonacci.s"),
            },
            ExampleEntry {
                name: "memory_walk",
                source: include_str!("../resources/examples/memory_walk.s"),
            },
        ])
    }

    pub fn from_entries(mut entries: Vec<ExampleEntry>) -> Self {
        entries.sort_by_key(|e| e.name);
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ExampleEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&ExampleEntry> {
        self.entries.get(index)
    }
}
