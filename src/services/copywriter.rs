//! Copywriter service — menu text from the text generator.
//!
//! Generation is advisory. Every failure turns into a fixed fallback string
//! and a warn log; nothing here returns an error.

use tracing::{info, warn};

use crate::llm::TextGenerator;

pub const DESCRIPTION_EMPTY_FALLBACK: &str = "Could not generate a description.";
pub const DESCRIPTION_FAILED_FALLBACK: &str = "Unable to generate the description automatically.";
pub const PRICE_FALLBACK: &str = "Price suggestion unavailable.";

/// Max length the generator is asked to respect. Not enforced on the reply.
pub const DESCRIPTION_MAX_CHARS: usize = 200;

/// Text returned to the form, plus whether it is a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub fallback: bool,
}

impl Suggestion {
    fn generated(text: String) -> Self {
        Self { text, fallback: false }
    }

    fn fallback(text: &str) -> Self {
        Self { text: text.to_owned(), fallback: true }
    }
}

#[must_use]
pub fn description_prompt(product_name: &str, cuisine: &str) -> String {
    format!(
        "Write a short, appetizing description for a menu item called \"{product_name}\" \
         from a {cuisine} restaurant. Use at most {DESCRIPTION_MAX_CHARS} characters and make it persuasive."
    )
}

#[must_use]
pub fn price_prompt(product_name: &str, ingredients: &str) -> String {
    format!(
        "Suggest a fair menu price for \"{product_name}\", a dish made with: {ingredients}. \
         Answer with a price range and one short sentence of reasoning."
    )
}

/// Ask for a promotional description of `product_name`. The reply is used
/// as is when it has any text.
pub async fn generate_description(
    generator: Option<&dyn TextGenerator>,
    product_name: &str,
    cuisine: &str,
) -> Suggestion {
    let Some(generator) = generator else {
        warn!(product = %product_name, "description requested but no text generator is configured");
        return Suggestion::fallback(DESCRIPTION_FAILED_FALLBACK);
    };

    match generator.complete(&description_prompt(product_name, cuisine)).await {
        Ok(text) if text.trim().is_empty() => {
            warn!(product = %product_name, "text generator returned an empty description");
            Suggestion::fallback(DESCRIPTION_EMPTY_FALLBACK)
        }
        Ok(text) => {
            info!(product = %product_name, chars = text.chars().count(), "description generated");
            Suggestion::generated(text)
        }
        Err(e) => {
            warn!(product = %product_name, error = %e, "description generation failed");
            Suggestion::fallback(DESCRIPTION_FAILED_FALLBACK)
        }
    }
}

/// Advisory price range for `product_name`. Never touches a draft.
pub async fn suggest_price(
    generator: Option<&dyn TextGenerator>,
    product_name: &str,
    ingredients: &str,
) -> Suggestion {
    let Some(generator) = generator else {
        return Suggestion::fallback(PRICE_FALLBACK);
    };

    match generator.complete(&price_prompt(product_name, ingredients)).await {
        Ok(text) if !text.trim().is_empty() => Suggestion::generated(text),
        Ok(_) => Suggestion::fallback(PRICE_FALLBACK),
        Err(e) => {
            warn!(product = %product_name, error = %e, "price suggestion failed");
            Suggestion::fallback(PRICE_FALLBACK)
        }
    }
}

#[cfg(test)]
#[path = "copywriter_test.rs"]
mod tests;
