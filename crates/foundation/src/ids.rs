/// Index of a basemap inside its registry.
///
/// Ids are stable for the lifetime of the registry because the set of
/// configured basemaps is fixed at startup. Holding an id never keeps a
/// backend alive.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BasemapId(u32);

impl BasemapId {
    pub fn new(index: u32) -> Self {
        BasemapId(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for BasemapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "basemap#{}", self.0)
    }
}

/// Monotonic counter identifying one loaded style instance on a backend.
///
/// Every `setStyle` on a backend yields a new generation; layer ids observed
/// under one generation say nothing about the next.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StyleGeneration(pub u64);

impl StyleGeneration {
    pub fn next(self) -> Self {
        StyleGeneration(self.0.wrapping_add(1))
    }
}
