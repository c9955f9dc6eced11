//! Deterministic generator for runs without a language model
//!
//! Follows the same prompt policy as the hosted model: scripted greeting,
//! explicit "nothing found", and only upcoming dates from the context.

use async_trait::async_trait;

use crate::generator::error::GeneratorResult;
use crate::generator::prompt::{Prompt, GREETING_REPLY};
use crate::generator::AnswerGenerator;
use crate::retrieval::CONTEXT_SEPARATOR;

const SENTINEL_PREFIX: &str = "Aucun événement trouvé";

#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGenerator;

impl OfflineGenerator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AnswerGenerator for OfflineGenerator {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(&self, prompt: &Prompt) -> GeneratorResult<String> {
        if prompt.is_greeting() {
            return Ok(GREETING_REPLY.to_string());
        }

        let context = prompt.context.trim();
        if context.starts_with(SENTINEL_PREFIX) {
            return Ok(format!(
                "{context} Je préfère ne rien inventer : essayez une autre période ou un autre thème."
            ));
        }

        let lines: Vec<String> = context.split(CONTEXT_SEPARATOR).map(summarize).collect();
        Ok(format!(
            "Voici les événements qui correspondent à votre demande :\n{}",
            lines.join("\n")
        ))
    }
}

/// "- Titre (Lieu) : première date à venir. Lien"
fn summarize(block: &str) -> String {
    let field = |name: &str| {
        block
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let next_date = block
        .lines()
        .skip_while(|line| !line.starts_with("Dates à venir"))
        .skip(1)
        .take_while(|line| line.starts_with("- "))
        .map(|line| line.trim_start_matches("- "))
        .next();

    let mut line = format!("- {}", field("Titre:").unwrap_or("Sans titre"));
    if let Some(place) = field("Lieu:") {
        line.push_str(&format!(" ({place})"));
    }
    if let Some(date) = next_date {
        line.push_str(&format!(" : {date}"));
    }
    if let Some(link) = field("Lien:") {
        line.push_str(&format!(". {link}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_greeting() {
        let answer = OfflineGenerator::new()
            .complete(&Prompt::new("", "bonjour", "lundi"))
            .await
            .unwrap();
        assert_eq!(answer, GREETING_REPLY);
    }

    #[tokio::test]
    async fn test_sentinel_is_relayed() {
        let prompt = Prompt::new("Aucun événement trouvé pour janvier 2026.", "q", "lundi");
        let answer = OfflineGenerator::new().complete(&prompt).await.unwrap();
        assert!(answer.starts_with("Aucun événement trouvé pour janvier 2026."));
    }

    #[tokio::test]
    async fn test_lists_upcoming_dates_only() {
        let block = "Titre: Jazz\nDescription: Concert\nLieu: Parc Floral\n\
Dates à venir:\n- mardi 23 décembre 2025 de 18h00 à 20h00\n\
Dates passées (archivées, ne pas proposer):\n- lundi 1 décembre 2025 de 18h00 à 20h00\n\
Mots-clés: jazz\nLien: https://jazz";
        let context = format!("{block}{CONTEXT_SEPARATOR}Titre: Poterie\nDates: non spécifiée");

        let answer = OfflineGenerator::new()
            .complete(&Prompt::new(context, "q", "lundi"))
            .await
            .unwrap();

        assert!(answer.contains(
            "- Jazz (Parc Floral) : mardi 23 décembre 2025 de 18h00 à 20h00. https://jazz"
        ));
        assert!(answer.contains("- Poterie"));
        assert!(!answer.contains("1 décembre"));
    }
}
