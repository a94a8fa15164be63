//! "Wisest option" decision advisor.
//!
//! The client scores each option itself; the advisor classifies the decision,
//! frames the scores in a prompt and asks the chat model for an independent
//! recommendation.


use itertools::Itertools;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::chat::{ChatMessage, ChatModel};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Category {
    pub title: String,
    pub metrics: serde_json::Value,
    pub importance: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionScore {
    pub option: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChoiceConsideration {
    pub option: String,
    pub consideration: Option<String>,
}

/// Body of `POST /wisest`. Field names follow the web client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecisionRequest {
    pub options: Vec<String>,
    pub categories: Vec<Category>,
    pub scores: Vec<OptionScore>,
    pub best_decision: String,
    #[serde(rename = "main_Consideration")]
    pub main_consideration: String,
    #[serde(rename = "choice_Considerations")]
    pub choice_considerations: Vec<ChoiceConsideration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionContext {
    Strategic,
    Personal,
    Practical,
}

/// Headings the model is asked to use, chosen per decision context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLabels {
    pub advantages: &'static str,
    pub risks: &'static str,
    pub action: &'static str,
    pub metric: &'static str,
}

const STRATEGIC_KEYWORDS: &[&str] = &[
    "business",
    "company",
    "market",
    "strategy",
    "investment",
    "career",
];
const PERSONAL_KEYWORDS: &[&str] = &[
    "happiness",
    "fulfillment",
    "life",
    "relationship",
    "personal",
    "dream",
];

impl DecisionContext {
    #[inline]
    pub fn labels(self) -> SectionLabels {
        match self {
            Self::Strategic => SectionLabels {
                advantages: "Strategic Advantages",
                risks: "Risk Mitigation",
                action: "Implementation Priority",
                metric: "Success Metrics",
            },
            Self::Personal => SectionLabels {
                advantages: "Key Benefits",
                risks: "Potential Challenges",
                action: "Next Steps",
                metric: "Fulfillment Indicators",
            },
            Self::Practical => SectionLabels {
                advantages: "Key Advantages",
                risks: "Things to Watch",
                action: "Priority Action",
                metric: "Success Indicators",
            },
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strategic => "strategic",
            Self::Personal => "personal",
            Self::Practical => "practical",
        }
    }

    #[inline]
    pub fn title(self) -> &'static str {
        match self {
            Self::Strategic => "Strategic",
            Self::Personal => "Personal",
            Self::Practical => "Practical",
        }
    }
}

impl fmt::Display for DecisionContext {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a decision from its main consideration.
///
/// Case-insensitive substring match; strategic keywords win over personal
/// ones. Anything else, including practical keywords such as "cost" or
/// "routine", is practical.
#[inline]
pub fn classify_decision_context(main_consideration: &str) -> DecisionContext {
    let text = main_consideration.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| text.contains(k));

    if mentions(STRATEGIC_KEYWORDS) {
        DecisionContext::Strategic
    } else if mentions(PERSONAL_KEYWORDS) {
        DecisionContext::Personal
    } else {
        DecisionContext::Practical
    }
}

fn format_scores(scores: &[OptionScore]) -> String {
    scores
        .iter()
        .map(|s| format!("- {}: {:.2}\n", s.option, s.score))
        .collect()
}

fn format_thoughts(considerations: &[ChoiceConsideration]) -> String {
    let thoughts = considerations
        .iter()
        .filter_map(|c| {
            let text = c.consideration.as_deref()?.trim();
            (!text.is_empty()).then(|| format!("{}: {}", c.option, text))
        })
        .join("; ");

    if thoughts.is_empty() {
        "none given".to_string()
    } else {
        thoughts
    }
}

#[inline]
pub fn build_prompt(request: &DecisionRequest, context: DecisionContext) -> String {
    let labels = context.labels();

    format!(
        r#"You are an intelligent decision advisor with deep knowledge of companies, industries, products, services, and real-world experiences. Provide your independent recommendation for this decision.

**DECISION CONTEXT:**
- Options: {options}
- Main goal: {goal}
- Decision type: {title} decision
- Their thoughts: {thoughts}

**MATHEMATICAL ANALYSIS:**
The decision system calculated these scores based on their priorities:
{scores}- Calculated best option: {best}

**YOUR TASK:**
Make your own independent recommendation. You may agree or disagree with the calculated best option.

**RESPONSE FORMAT:**
**Choose [YOUR RECOMMENDED OPTION]**

**Why This Decision**: [Direct reasoning. If it differs from the calculated best option, explain why]

**{advantages}**: [2-3 key benefits relevant to this decision type]

**{risks}**: [How to handle potential downsides or challenges]

**{action}**: [Specific next step to take]

**{metric}**: [How to measure if this was the right choice]

**GUIDELINES:**
- Use {context} language appropriate for this decision type
- Treat the calculated scores as one input among others
- Be direct and concise (under 500 words total)
- Provide actionable, practical advice
"#,
        options = request.options.join(", "),
        goal = request.main_consideration,
        title = context.title(),
        thoughts = format_thoughts(&request.choice_considerations),
        scores = format_scores(&request.scores),
        best = request.best_decision,
        advantages = labels.advantages,
        risks = labels.risks,
        action = labels.action,
        metric = labels.metric,
        context = context,
    )
}

pub struct Advisor {
    chat: Arc<dyn ChatModel>,
}

impl Advisor {
    #[inline]
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// Ask the model for a recommendation; `Ok(None)` when it produced no text
    #[inline]
    pub async fn feedback(&self, request: &DecisionRequest) -> Result<Option<String>> {
        let context = classify_decision_context(&request.main_consideration);
        debug!(
            "Advising on {} options as a {} decision",
            request.options.len(),
            context
        );

        let prompt = build_prompt(request, context);
        self.chat.complete(&[ChatMessage::user(prompt)]).await
    }
}
