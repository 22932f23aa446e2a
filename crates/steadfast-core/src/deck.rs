//! Local prompt deck draws.
//!
//! This is the deterministic baseline behind prompt generation: it never
//! fails and never touches the network.

use rand::Rng;

use crate::content::ContentLibrary;
use crate::types::{PromptCard, PromptRequest, PromptSource};

/// Anchor for a card: the first listed value, or the library default when
/// there is none or it is blank.
pub fn anchor_for<'a>(values: &'a [String], library: &'a ContentLibrary) -> &'a str {
    values
        .first()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| library.default_anchor())
}

/// Draw a card from the request persona's deck.
///
/// The template is chosen uniformly; `anchor` and `intention` are overlaid
/// from the request, falling back to the library anchor and the persona's
/// default intention.
pub fn draw_local_card<R: Rng + ?Sized>(
    request: &PromptRequest,
    library: &ContentLibrary,
    rng: &mut R,
) -> PromptCard {
    let template = library.draw_template(request.persona, rng);

    PromptCard {
        prompt: template.prompt.clone(),
        reflection: template.reflection.clone(),
        follow_up: template.follow_up.clone(),
        anchor: anchor_for(&request.values, library).to_string(),
        intention: request
            .intention()
            .unwrap_or_else(|| request.persona.default_intention())
            .to_string(),
        source: PromptSource::Local,
    }
}
