//! Internal implementation details.

pub(crate) mod circular;

pub(crate) use circular::assert_no_circular_dependencies;
