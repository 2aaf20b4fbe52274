// ============================================================================
// STATE MODULE - Suscripciones a eventos del bridge
// ============================================================================

pub mod listeners;

pub use listeners::{EventListeners, Subscription, SubscriptionSet};
