//! Role-prompted specialists answering the same task.

use local_agent_model::{ModelMessage, ModelProvider, ModelRequest};

use crate::model_client::ModelClient;

/// Role prompt used for specialties without a dedicated one.
pub const GENERIC_ASSISTANT_PROMPT: &str = "You are a helpful AI assistant.";

const SPECIALIST_PROMPTS: [(&str, &str); 4] = [
    (
        "coder",
        "You are an expert Python programmer. Provide clean, efficient code \
         with explanations.",
    ),
    (
        "analyst",
        "You are a data analyst. Provide insights, patterns, and \
         recommendations.",
    ),
    (
        "debugger",
        "You are a debugging expert. Identify issues and provide solutions.",
    ),
    (
        "architect",
        "You are a system architect. Design scalable, maintainable solutions.",
    ),
];

/// A group of specialists, each a fixed role prompt in front of the task.
#[derive(Clone)]
pub struct SpecialistTeam {
    model_client: ModelClient,
}

impl SpecialistTeam {
    /// Creates a team over the given provider.
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        Self::with_model_client(ModelClient::new(provider))
    }

    /// Creates a team sharing an existing model client.
    #[inline]
    pub fn with_model_client(model_client: ModelClient) -> Self {
        Self { model_client }
    }

    /// Names of the specialties with a dedicated role prompt.
    pub fn specialties() -> impl Iterator<Item = &'static str> {
        SPECIALIST_PROMPTS.iter().map(|(name, _)| *name)
    }

    /// Returns the role prompt for `specialty`.
    pub fn role_prompt(specialty: &str) -> &'static str {
        SPECIALIST_PROMPTS
            .iter()
            .find(|(name, _)| *name == specialty)
            .map(|(_, prompt)| *prompt)
            .unwrap_or(GENERIC_ASSISTANT_PROMPT)
    }

    /// Asks one specialist. A failed model call is returned as
    /// `Error: <message>`.
    pub async fn run_specialist(&self, task: &str, specialty: &str) -> String {
        let prompt = format!("{}\n\nTask: {task}", Self::role_prompt(specialty));
        let request = ModelRequest::with_messages([ModelMessage::User(prompt)]);
        match self.model_client.send_request(request, |_| {}).await {
            Ok(resp) => resp.transcript,
            Err(err) => {
                warn!("specialist {specialty} failed: {err}");
                format!("Error: {err}")
            }
        }
    }

    /// Asks every specialist in turn, returning `(specialty, answer)` pairs
    /// in the given order.
    pub async fn collaborate<S: AsRef<str>>(
        &self,
        task: &str,
        specialists: &[S],
    ) -> Vec<(String, String)> {
        let mut results = Vec::with_capacity(specialists.len());
        for specialty in specialists {
            let specialty = specialty.as_ref();
            debug!("asking the {specialty}");
            let answer = self.run_specialist(task, specialty).await;
            results.push((specialty.to_owned(), answer));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use local_agent_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[test]
    fn test_role_prompts() {
        assert_eq!(
            SpecialistTeam::specialties().collect::<Vec<_>>(),
            ["coder", "analyst", "debugger", "architect"]
        );
        assert!(
            SpecialistTeam::role_prompt("debugger")
                .starts_with("You are a debugging expert.")
        );
        assert_eq!(
            SpecialistTeam::role_prompt("poet"),
            GENERIC_ASSISTANT_PROMPT
        );
    }

    #[tokio::test]
    async fn test_collaborate() {
        let mut provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_text("def is_pal(s): ..."));
        provider.add_response(PresetResponse::failing("connection reset"));
        provider.add_response(PresetResponse::with_text("Looks fine."));
        let observer = provider.clone();

        let team = SpecialistTeam::new(provider);
        let task = "Check if a string is a palindrome.";
        let results = team
            .collaborate(task, &["coder", "architect", "poet"])
            .await;

        assert_eq!(
            results,
            [
                ("coder".to_owned(), "def is_pal(s): ...".to_owned()),
                ("architect".to_owned(), "Error: connection reset".to_owned()),
                ("poet".to_owned(), "Looks fine.".to_owned()),
            ]
        );

        let requests = observer.requests();
        assert_eq!(
            requests[2].messages,
            [ModelMessage::User(format!(
                "You are a helpful AI assistant.\n\nTask: {task}"
            ))]
        );
    }
}
