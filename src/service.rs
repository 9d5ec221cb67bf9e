use crate::client::TextGenerator;
use crate::error::LookupError;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// A term explanation produced by both pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionResult {
    pub term: String,
    pub full_text: String,
    pub summary_text: String,
}

impl DefinitionResult {
    pub fn has_summary(&self) -> bool {
        !self.summary_text.trim().is_empty()
    }

    /// Text to show for the given expansion; the full text stands in for a blank summary.
    pub fn visible_text(&self, expanded: bool) -> &str {
        if expanded || !self.has_summary() {
            &self.full_text
        } else {
            &self.summary_text
        }
    }
}

fn definition_prompt(term: &str) -> String {
    format!(
        "'{term}'라는 금융 용어에 대해 자세히 설명해줘. 이 용어의 정의, 중요성, 그리고 실생활에서의 사용 예시를 포함해서 초보자도 쉽게 이해할 수 있도록 설명해줘. 답변은 마크다운 형식으로 보기 좋게 정리해줘. 예를 들어, 중요한 부분은 **굵은 글씨**로 강조해줘."
    )
}

fn summary_prompt(text: &str) -> String {
    format!(
        "다음 텍스트를 500자 이내로 요약해줘. 원문의 핵심 내용을 유지하면서 초보자도 이해하기 쉽게 간결하게 만들어줘. 중요한 용어나 문장은 **굵은 글씨**를 사용하는 마크다운 형식을 사용해줘.\n\n---텍스트 시작---\n{text}\n---텍스트 끝---"
    )
}

/// Two-stage lookup: explain the term, then summarize the explanation.
#[derive(Clone)]
pub struct DefinitionService {
    generator: Arc<dyn TextGenerator>,
}

impl DefinitionService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn fetch_full_definition(&self, term: &str) -> Result<String, LookupError> {
        self.generator
            .generate(&definition_prompt(term))
            .await
            .map_err(LookupError::DefinitionUnavailable)
    }

    pub async fn fetch_summary(&self, full_text: &str) -> Result<String, LookupError> {
        self.generator
            .generate(&summary_prompt(full_text))
            .await
            .map_err(LookupError::SummaryUnavailable)
    }

    /// Runs both stages in order. A failed summary fails the whole lookup.
    pub async fn fetch_definition(&self, term: &str) -> Result<DefinitionResult, LookupError> {
        info!(term, model = self.generator.model(), "fetching definition");
        let full_text = self.fetch_full_definition(term).await?;
        let summary_text = self.fetch_summary(&full_text).await?;
        info!(
            term,
            full_chars = full_text.chars().count(),
            summary_chars = summary_text.chars().count(),
            "definition ready"
        );
        Ok(DefinitionResult {
            term: term.to_string(),
            full_text,
            summary_text,
        })
    }
}
