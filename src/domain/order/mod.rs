// ============================================================================
// Order Domain - Business Logic for the Order Aggregate
// ============================================================================
//
// This module contains ALL order-specific rules:
// - Value objects (OrderStatus with its transition table, OrderType, ...)
// - Pricing (Order Builder money derivation)
// - Errors (OrderError enum)
//
// Persistence and transport live elsewhere; everything here is pure.
//
// ============================================================================

pub mod errors;
pub mod pricing;
pub mod value_objects;

pub use errors::*;
pub use pricing::*;
pub use value_objects::*;
