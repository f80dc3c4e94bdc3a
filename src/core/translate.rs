use async_trait::async_trait;

use crate::core::error::TranslationError;
use crate::core::preferences::Language;

/// Converts text between the user's language and the service language.
///
/// The controller always routes text through a translator, once before
/// sending and once after receiving, so a real implementation can be dropped
/// in without touching the round trip.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target: Language,
        source: Language,
    ) -> Result<String, TranslationError>;
}

/// Returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

#[async_trait]
impl Translator for IdentityTranslator {
    async fn translate(
        &self,
        text: &str,
        _target: Language,
        _source: Language,
    ) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identity_translation_is_passthrough() {
        let out = IdentityTranslator
            .translate("¿Qué tal?", Language::SERVICE, Language::Es)
            .await
            .unwrap();
        assert_eq!(out, "¿Qué tal?");
    }
}
