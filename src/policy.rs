/// When an emptied bucket is dropped from the priority index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reclamation {
    /// Drop the priority as soon as the pop that empties its bucket returns.
    #[default]
    Eager,
    /// Leave the priority indexed until it is next seen at the top. A push
    /// that arrives first reuses the bucket without touching the index.
    Lazy,
}

impl std::fmt::Display for Reclamation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reclamation::Eager => write!(f, "eager"),
            Reclamation::Lazy => write!(f, "lazy"),
        }
    }
}
