//! Session ownership and identity-provider integration.
//!
//! # Responsibility
//! - Define the identity-provider contract (`IdentityProvider`).
//! - Own the single current-session slot (`SessionStore`).
//!
//! # Invariants
//! - Only provider events and provider-confirmed operations write the slot.
//! - Provider errors reach callers unchanged.

pub mod provider;
pub mod store;
pub mod supabase;

pub use provider::{AuthFailure, AuthResult, IdentityProvider, SessionSubscription, SignUpOutcome};
pub use store::SessionStore;
pub use supabase::SupabaseAuthProvider;
