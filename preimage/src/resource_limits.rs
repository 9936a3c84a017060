/// Resource limits that turn runaway solving into explicit failures
///
/// Every solve is pure and deterministic, so a limit that trips once will trip
/// again for the same input. These bounds are generous for hand-written
/// constraints while still stopping generated input from spinning forever.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Maximum bisection steps spent isolating the real roots of one polynomial
    /// Real usage: ~50 for degree 5, Limit: 10000
    pub max_isolation_steps: usize,

    /// Maximum nesting depth of a boolean/relational expression
    /// Real usage: ~3 levels, Limit: 100 (30x+)
    pub max_expression_depth: usize,

    /// Maximum distinct leaves handed to BDD simplification of an event
    pub max_bdd_atoms: usize,

    /// Maximum binary magnitude `|log2 |v||` of a finite interval endpoint
    /// Real usage: < 100 bits, Limit: 16384
    pub max_magnitude_bits: u64,

    /// Maximum symbolic operations nested inside one interval endpoint
    /// Real usage: < 10, Limit: 64
    pub max_endpoint_depth: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_isolation_steps: 10_000,
            max_expression_depth: 100,
            max_bdd_atoms: 64,
            max_magnitude_bits: 16_384,
            max_endpoint_depth: 64,
        }
    }
}

impl ResourceLimits {
    /// Create a new ResourceLimits with default values
    pub fn new() -> Self {
        Self::default()
    }
}
