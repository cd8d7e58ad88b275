//! Emergency classification
//!
//! Every utterance is assessed before normal dialogue. The classifier
//! never fails: model errors and unparsable replies degrade to "no
//! emergency" so the chat branch can still answer.

use std::sync::Arc;
use std::time::Duration;

use dwani_core::capability::guard;
use dwani_core::structured::{self, preview};
use dwani_core::{EmergencyAssessment, GenerateRequest, LanguageModel, Message};
use dwani_llm::{emergency_prompt, Situation};
use serde_json::Value;

/// Classification wants short, deterministic answers
const CLASSIFIER_TEMPERATURE: f32 = 0.1;
const CLASSIFIER_MAX_TOKENS: u32 = 300;

pub struct EmergencyClassifier {
    llm: Arc<dyn LanguageModel>,
    timeout: Duration,
}

impl EmergencyClassifier {
    pub fn new(llm: Arc<dyn LanguageModel>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    pub async fn assess(&self, utterance: &str, situation: Option<&Situation>) -> EmergencyAssessment {
        let request = GenerateRequest::from_messages(vec![Message::user(emergency_prompt(
            utterance, situation,
        ))])
        .with_temperature(CLASSIFIER_TEMPERATURE)
        .with_max_tokens(CLASSIFIER_MAX_TOKENS);

        let response = match guard("chat", self.timeout, self.llm.generate(request)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Emergency classification unavailable");
                metrics::counter!("dwani_capability_failures_total", "capability" => "classifier")
                    .increment(1);
                return EmergencyAssessment::no_emergency(format!(
                    "Emergency analysis unavailable: {}",
                    e
                ));
            }
        };

        match structured::decode::<Value>(&response.text) {
            Ok(value) if value.is_object() => {
                let assessment = EmergencyAssessment::from_value(&value);
                tracing::info!(
                    is_emergency = assessment.is_emergency,
                    urgency = %assessment.urgency_level,
                    emergency_type = %assessment.emergency_type,
                    hazards = ?assessment.detected_hazards,
                    "Utterance assessed"
                );
                assessment
            }
            _ => {
                tracing::debug!(raw = %preview(&response.text, 200), "Unparsable assessment");
                EmergencyAssessment::no_emergency(format!(
                    "Analysis completed but parsing failed: {}...",
                    preview(&response.text, 100)
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dwani_core::{EmergencyType, Error, GenerateResponse, ToolDefinition, UrgencyLevel};

    struct FixedLlm {
        reply: Result<&'static str, ()>,
    }

    #[async_trait]
    impl LanguageModel for FixedLlm {
        async fn generate_with_tools(
            &self,
            request: GenerateRequest,
            tools: &[ToolDefinition],
        ) -> dwani_core::Result<GenerateResponse> {
            assert!(tools.is_empty());
            assert!(request.messages[0].content.contains("Analyze this message"));
            match self.reply {
                Ok(text) => Ok(GenerateResponse::text(text)),
                Err(()) => Err(Error::unavailable("chat", "connection refused")),
            }
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn classifier(reply: Result<&'static str, ()>) -> EmergencyClassifier {
        EmergencyClassifier::new(Arc::new(FixedLlm { reply }), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_fenced_fire_assessment() {
        let reply = "```json\n{\"is_emergency\": true, \"urgency_level\": \"critical\", \"detected_hazards\": [\"smoke\", \"flames\"], \"required_action\": \"evacuate\", \"emergency_type\": \"fire\", \"speak\": \"Leave now\"}\n```";
        let assessment = classifier(Ok(reply))
            .assess("There's smoke and flames everywhere!", None)
            .await;

        assert!(assessment.is_emergency);
        assert_eq!(assessment.emergency_type, EmergencyType::Fire);
        assert_eq!(assessment.urgency_level, UrgencyLevel::Critical);
        assert_eq!(assessment.detected_hazards, vec!["smoke", "flames"]);
    }

    #[tokio::test]
    async fn test_assessment_followed_by_prose_with_braces() {
        let reply = "{\"is_emergency\": true, \"urgency_level\": \"high\", \"detected_hazards\": [\"gas smell\"], \"emergency_type\": \"gas_leak\"}\nReasoning: the user mentioned {gas} near the stove.";
        let assessment = classifier(Ok(reply))
            .assess("I smell gas in the kitchen", None)
            .await;

        assert!(assessment.is_emergency);
        assert_eq!(assessment.emergency_type, EmergencyType::GasLeak);
        assert_eq!(assessment.urgency_level, UrgencyLevel::High);
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_not_an_emergency() {
        let assessment = classifier(Ok("I think everything is fine"))
            .assess("hello", None)
            .await;

        assert!(!assessment.is_emergency);
        assert_eq!(assessment.urgency_level, UrgencyLevel::Low);
        assert!(assessment
            .speak
            .starts_with("Analysis completed but parsing failed: I think everything"));
    }

    #[tokio::test]
    async fn test_model_failure_is_not_an_emergency() {
        let assessment = classifier(Err(())).assess("help", None).await;
        assert!(!assessment.is_emergency);
        assert!(assessment.speak.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_explicit_true_required() {
        let assessment = classifier(Ok(r#"{"is_emergency": "maybe", "emergency_type": "flood"}"#))
            .assess("water on the street", None)
            .await;
        assert!(!assessment.is_emergency);
        assert_eq!(assessment.emergency_type, EmergencyType::Flood);
    }
}
