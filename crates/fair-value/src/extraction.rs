//! Asks a language model for the variables driving a question.

use serde::{Deserialize, Serialize};

use crate::error::{FairValueError, Result};
use crate::llm::{strip_code_fences, Completion, Llm};
use crate::simulation::Variable;

const SYSTEM_PROMPT: &str =
    "You are a quantitative prediction market analyst. Respond only in valid JSON.";

/// What the model returned for a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableExtraction {
    #[serde(default = "default_base_probability")]
    pub overall_base_probability: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub variables: Vec<Variable>,
}

fn default_base_probability() -> f64 {
    0.5
}

#[must_use]
pub fn extraction_prompt(question: &str, market_price: f64) -> String {
    format!(
        r#"You are a quantitative analyst for prediction markets.

Given this prediction market question: "{question}"
Current market price (YES): {market_price}

Identify 3-6 key independent variables that determine the outcome probability.
For each variable, provide:
- name: short label
- description: what it measures
- base_rate: probability estimate (0.0 to 1.0)
- volatility: how uncertain (0.05 = very certain, 0.3 = very uncertain)
- weight: influence on outcome (0.0 to 1.0, sum to ~1.0)
- direction: "positive" if higher = more likely YES, "negative" otherwise

Also provide:
- overall_base_probability: best estimate (0.0 to 1.0)
- reasoning: brief explanation

Respond ONLY in JSON format:
{{
  "overall_base_probability": 0.XX,
  "reasoning": "...",
  "variables": [
    {{
      "name": "...", "description": "...", "base_rate": 0.XX,
      "volatility": 0.XX, "weight": 0.XX, "direction": "positive"
    }}
  ]
}}"#
    )
}

/// Parses a model reply, tolerating a surrounding code fence.
///
/// # Errors
/// Returns [`FairValueError::Parse`] if the reply is not the expected JSON.
pub fn parse_extraction(reply: &str) -> Result<VariableExtraction> {
    serde_json::from_str(strip_code_fences(reply))
        .map_err(|e| FairValueError::parse(format!("variable extraction: {e}")))
}

/// Prompts `llm` and parses the variables it names.
///
/// # Errors
/// Propagates provider failures and unparseable replies.
pub async fn extract_variables(
    llm: &dyn Llm,
    question: &str,
    market_price: f64,
) -> Result<VariableExtraction> {
    let prompt = extraction_prompt(question, market_price);
    let reply = llm
        .complete(&Completion {
            system: SYSTEM_PROMPT,
            user: &prompt,
            temperature: 0.3,
            max_tokens: 1000,
        })
        .await?;
    let extraction = parse_extraction(&reply)?;
    tracing::debug!(
        model = llm.model(),
        variables = extraction.variables.len(),
        base = extraction.overall_base_probability,
        "variables extracted"
    );
    Ok(extraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Direction;

    #[test]
    fn parses_fenced_reply() {
        let reply = r#"```json
{
  "overall_base_probability": 0.12,
  "reasoning": "Low base rate.",
  "variables": [
    {"name": "Diplomacy", "description": "talks", "base_rate": 0.3,
     "volatility": 0.2, "weight": 0.6, "direction": "negative"},
    {"name": "Escalation", "base_rate": 0.1, "volatility": 0.15,
     "weight": 0.4, "direction": "positive"}
  ]
}
```"#;
        let parsed = parse_extraction(reply).unwrap();
        assert_eq!(parsed.overall_base_probability, 0.12);
        assert_eq!(parsed.variables.len(), 2);
        assert_eq!(parsed.variables[0].direction, Direction::Negative);
        assert_eq!(parsed.variables[1].description, "");
    }

    #[test]
    fn missing_fields_default() {
        let parsed = parse_extraction("{}").unwrap();
        assert_eq!(parsed.overall_base_probability, 0.5);
        assert!(parsed.variables.is_empty());
    }

    #[test]
    fn prose_is_a_parse_error() {
        assert!(matches!(
            parse_extraction("I cannot estimate that."),
            Err(FairValueError::Parse(_))
        ));
    }

    #[test]
    fn prompt_embeds_question_and_price() {
        let prompt = extraction_prompt("Will it rain?", 0.05);
        assert!(prompt.contains("\"Will it rain?\""));
        assert!(prompt.contains("Current market price (YES): 0.05"));
        assert!(prompt.contains("\"variables\": ["));
    }
}
