//! Report gate - has this product family already been reported?

use crate::store::TelemetryState;

/// Returns false iff `state` holds a non-empty marker for `product_family`.
///
/// Must be evaluated on the state returned by [`crate::identity::resolve`],
/// since a reset state never carries markers.
pub fn should_report(state: &TelemetryState, product_family: &str) -> bool {
    !state
        .get(product_family)
        .is_some_and(|value| !value.is_empty())
}
