//! # steadfast-core
//!
//! Deterministic content generation for Steadfast check-ins and journaling.
//!
//! This crate answers two questions for the surrounding wellness app:
//! - Which grounding nudges should follow this check-in?
//! - Which journaling prompt should this student see when no external
//!   provider is available?
//!
//! ## Key Guarantees
//!
//! 1. **Infallible**: composition and local draws always produce output
//! 2. **No network calls**: everything runs against an in-memory library
//! 3. **Reproducible**: randomness is injected, so a seeded generator pins
//!    the exact output
//! 4. **Immutable content**: libraries are validated once and shared
//!
//! ## Example
//!
//! ```rust
//! use rand::SeedableRng;
//! use steadfast_core::{
//!     build_suggestions, draw_local_card, CheckInContext, ContentLibrary, IdentityProfile,
//!     Persona, PromptRequest,
//! };
//!
//! let library = ContentLibrary::builtin();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! let context = CheckInContext::new(["anxious"], 4);
//! let profile = IdentityProfile::with_values(["Growth"]);
//! let nudges = build_suggestions(&context, Some(&profile), &library, &mut rng);
//! assert_eq!(nudges.len(), 4);
//!
//! let request = PromptRequest::new(Persona::Explorer, "").with_values(["Courage"]);
//! let card = draw_local_card(&request, &library, &mut rng);
//! assert_eq!(card.anchor, "Courage");
//! ```

pub mod content;
pub mod deck;
pub mod nudges;
pub mod types;

// Re-export main types at crate root
pub use content::{ContentError, ContentLibrary, PromptTemplate};
pub use deck::{anchor_for, draw_local_card};
pub use nudges::{build_suggestions, NudgeComposer, PACING_THRESHOLD, SOMATIC_TRIGGERS};
pub use types::{
    CheckInContext, EmptyNudgeList, IdentityProfile, NudgeList, Persona, PromptCard,
    PromptRequest, PromptSource, DEFAULT_PROVIDER_INTENTION,
};
