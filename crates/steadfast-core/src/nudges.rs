//! Nudge Composer
//!
//! Turns a check-in snapshot plus an identity profile into an ordered list
//! of short grounding nudges.
//!
//! ## Rules (additive, in order)
//!
//! | Step | Condition | Appends |
//! |------|-----------|---------|
//! | 1 | `pressure_level >= 3` | pacing nudge |
//! | 2 | emotions include `anxious` or `overwhelmed` | somatic nudge |
//! | 3 | profile lists at least one value | reminder for one value picked uniformly |
//! | 4 | always | one grounding prompt picked uniformly |
//!
//! Step 4 is unconditional, so the list is never empty.

use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use crate::content::ContentLibrary;
use crate::types::{CheckInContext, IdentityProfile, NudgeList};

/// Pressure level at which the pacing nudge fires.
pub const PACING_THRESHOLD: u32 = 3;

/// Emotion tags that trigger the somatic nudge.
pub const SOMATIC_TRIGGERS: [&str; 2] = ["anxious", "overwhelmed"];

/// Compose nudges for a check-in.
///
/// Pure apart from `rng`: the same seed and inputs always yield the same list.
pub fn build_suggestions<R: Rng + ?Sized>(
    context: &CheckInContext,
    profile: Option<&IdentityProfile>,
    library: &ContentLibrary,
    rng: &mut R,
) -> NudgeList {
    let mut nudges = Vec::with_capacity(3);

    if context.pressure_level >= PACING_THRESHOLD {
        nudges.push(library.pacing_nudge().to_string());
    }

    if SOMATIC_TRIGGERS.iter().any(|tag| context.has_emotion(tag)) {
        nudges.push(library.somatic_nudge().to_string());
    }

    if let Some(reminder) = profile.and_then(|p| value_reminder(p, library, rng)) {
        nudges.push(reminder);
    }

    let grounding = library.draw_grounding(rng).to_string();
    NudgeList::from_parts(nudges, grounding)
}

/// Reminder for one uniformly chosen value, skipping blank entries.
fn value_reminder<R: Rng + ?Sized>(
    profile: &IdentityProfile,
    library: &ContentLibrary,
    rng: &mut R,
) -> Option<String> {
    let candidates: Vec<&str> = profile
        .values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();

    let value = candidates.choose(rng)?;
    Some(match library.reminder_for(value) {
        Some(reminder) => reminder.to_string(),
        None => format!("Revisit why {} sits on your values list.", value),
    })
}

/// Composer bound to a content library.
#[derive(Debug, Clone)]
pub struct NudgeComposer {
    library: Arc<ContentLibrary>,
}

impl NudgeComposer {
    pub fn new(library: Arc<ContentLibrary>) -> Self {
        Self { library }
    }

    pub fn library(&self) -> &ContentLibrary {
        &self.library
    }

    /// Compose with an explicit random source.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        context: &CheckInContext,
        profile: Option<&IdentityProfile>,
        rng: &mut R,
    ) -> NudgeList {
        build_suggestions(context, profile, &self.library, rng)
    }

    /// Compose using the thread-local generator.
    pub fn suggest(&self, context: &CheckInContext, profile: Option<&IdentityProfile>) -> NudgeList {
        self.compose(context, profile, &mut rand::thread_rng())
    }
}

impl Default for NudgeComposer {
    fn default() -> Self {
        Self::new(ContentLibrary::builtin())
    }
}
