use super::*;

use std::sync::Mutex;

use crate::llm::types::LlmError;

// =========================================================================
// MockGenerator
// =========================================================================

struct MockGenerator {
    reply: Result<String, ()>,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    fn replying(text: &str) -> Self {
        Self { reply: Ok(text.into()), prompts: Mutex::new(Vec::new()) }
    }

    fn failing() -> Self {
        Self { reply: Err(()), prompts: Mutex::new(Vec::new()) }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TextGenerator for MockGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        self.reply
            .clone()
            .map_err(|()| LlmError::Status { status: 503, body: "overloaded".into() })
    }
}

// =========================================================================
// generate_description
// =========================================================================

#[tokio::test]
async fn description_uses_raw_reply() {
    let mock = MockGenerator::replying("  Wood-fired, blistered crust.\n");
    let out = generate_description(Some(&mock), "Margherita", "Italian").await;
    assert_eq!(out, Suggestion { text: "  Wood-fired, blistered crust.\n".into(), fallback: false });
}

#[tokio::test]
async fn description_prompt_names_product_and_limit() {
    let mock = MockGenerator::replying("ok");
    generate_description(Some(&mock), "Margherita", "Italian").await;
    let prompts = mock.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"Margherita\""));
    assert!(prompts[0].contains("Italian"));
    assert!(prompts[0].contains("200"));
}

#[tokio::test]
async fn empty_reply_falls_back() {
    let mock = MockGenerator::replying("   ");
    let out = generate_description(Some(&mock), "Margherita", "Italian").await;
    assert_eq!(out.text, DESCRIPTION_EMPTY_FALLBACK);
    assert!(out.fallback);
}

#[tokio::test]
async fn failure_falls_back() {
    let mock = MockGenerator::failing();
    let out = generate_description(Some(&mock), "Margherita", "Italian").await;
    assert_eq!(out.text, DESCRIPTION_FAILED_FALLBACK);
    assert!(out.fallback);
}

#[tokio::test]
async fn missing_generator_falls_back() {
    let out = generate_description(None, "Margherita", "Italian").await;
    assert_eq!(out.text, DESCRIPTION_FAILED_FALLBACK);
}

// =========================================================================
// suggest_price
// =========================================================================

#[tokio::test]
async fn price_suggestion_passes_through() {
    let mock = MockGenerator::replying("R$ 35-45: premium cheese.");
    let out = suggest_price(Some(&mock), "Margherita", "mozzarella, basil").await;
    assert_eq!(out.text, "R$ 35-45: premium cheese.");
    let prompt = &mock.prompts()[0];
    assert!(prompt.contains("\"Margherita\""));
    assert!(prompt.contains("mozzarella, basil"));
}

#[tokio::test]
async fn price_suggestion_fallbacks() {
    assert_eq!(suggest_price(None, "Pie", "x").await.text, PRICE_FALLBACK);
    assert_eq!(suggest_price(Some(&MockGenerator::failing()), "Pie", "x").await.text, PRICE_FALLBACK);
    assert_eq!(suggest_price(Some(&MockGenerator::replying("")), "Pie", "x").await.text, PRICE_FALLBACK);
}
