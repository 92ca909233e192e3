/// Adjacency rule table between states across face directions
pub mod adjacency;
/// Fixed-capacity bitset of candidate states
pub mod bitset;
/// Boundary buffers and the cross-chunk synchronization protocol
pub mod boundary;
/// Versioned per-chunk bias cache
pub mod cache;
/// Collapse and propagation driver
pub mod executor;
/// Propagation events, their priority worklist and in-chunk filtering
pub mod propagation;
/// Minimum-entropy cell selection and biased state weighting
pub mod selection;
