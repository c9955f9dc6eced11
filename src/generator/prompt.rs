//! Prompt policy
//!
//! The model is only allowed to answer from the assembled context. Two
//! special contexts drive scripted behaviour: an empty context (greeting)
//! and the "Aucun événement trouvé" sentinel.

use serde::Serialize;

/// Reply to a greeting, also used verbatim by the offline generator
pub const GREETING_REPLY: &str = "Bonjour ! Je suis l'assistant des événements culturels. \
Posez-moi une question sur les sorties à venir : concerts, expositions, ateliers, festivals...";

pub const SYSTEM_PROMPT: &str = "Tu es un assistant expert en événements culturels. \
Tu réponds en français, de manière concise et amicale.

Règles strictes :
1. Réponds uniquement à partir du CONTEXTE fourni. N'utilise aucune connaissance extérieure.
2. Si le CONTEXTE commence par « Aucun événement trouvé », dis simplement qu'aucun événement \
ne correspond à la période demandée. N'invente jamais d'événement, de date ou de lieu.
3. Ne propose jamais une date listée sous « Dates passées (archivées, ne pas proposer) ».
4. Si le CONTEXTE est vide, l'utilisateur te salue : réponds uniquement par un court message \
d'accueil qui l'invite à poser une question sur les événements culturels.
5. Pour chaque événement proposé, donne le titre, le lieu, la ou les dates à venir et le lien.";

/// Everything the generator needs for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    /// Assembled context; empty for greetings
    pub context: String,
    pub question: String,
    /// Today's date as a French label, e.g. "lundi 22 décembre 2025"
    pub current_date: String,
}

impl Prompt {
    pub fn new(
        context: impl Into<String>,
        question: impl Into<String>,
        current_date: impl Into<String>,
    ) -> Self {
        Self {
            context: context.into(),
            question: question.into(),
            current_date: current_date.into(),
        }
    }

    pub fn is_greeting(&self) -> bool {
        self.context.trim().is_empty()
    }

    pub fn system_message(&self) -> String {
        format!("{SYSTEM_PROMPT}\n\nDate du jour : {}.", self.current_date)
    }

    pub fn user_message(&self) -> String {
        format!(
            "CONTEXTE:\n{}\n\nQUESTION: {}\n\nRÉPONSE:",
            self.context, self.question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let prompt = Prompt::new("Titre: Jazz", "Un concert ?", "lundi 22 décembre 2025");

        assert!(!prompt.is_greeting());
        assert!(prompt.system_message().ends_with("Date du jour : lundi 22 décembre 2025."));
        assert_eq!(
            prompt.user_message(),
            "CONTEXTE:\nTitre: Jazz\n\nQUESTION: Un concert ?\n\nRÉPONSE:"
        );
    }

    #[test]
    fn test_empty_context_is_greeting() {
        assert!(Prompt::new("", "salut", "lundi").is_greeting());
    }
}
