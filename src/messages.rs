//! Localized user-facing strings.
//!
//! Everything an end user can read lives here so the web page, the CLI and the
//! error taxonomy agree on wording.

pub const APP_TITLE: &str = "AI 금융 사전";
pub const APP_TAGLINE: &str = "궁금한 최신 금융 용어를 검색하고 AI의 명쾌한 설명을 확인하세요.";
pub const FOOTER: &str = "Powered by Google Gemini";

pub const SEARCH_PLACEHOLDER: &str = "예: 스톡옵션, ESG, 핀테크...";
pub const SEARCH_BUTTON: &str = "검색";
pub const SEARCH_BUTTON_BUSY: &str = "검색중...";

pub const WELCOME_HEADING: &str = "무엇이 궁금하신가요?";
pub const WELCOME_BODY: &str = "위 검색창에 금융 용어를 입력하여 AI의 설명을 들어보세요.";
pub const LOADING: &str = "AI가 용어를 분석하고 있습니다...";
pub const ERROR_HEADING: &str = "오류가 발생했습니다";

pub const SHOW_MORE: &str = "자세히 보기";
pub const SHOW_LESS: &str = "간략히 보기";

pub const EMPTY_TERM: &str = "검색할 단어를 입력해주세요.";
pub const DEFINITION_UNAVAILABLE: &str =
    "AI 서비스와 통신하는 중 오류가 발생했습니다. 잠시 후 다시 시도해주세요.";
pub const SUMMARY_UNAVAILABLE: &str = "AI 서비스에서 요약 정보를 생성하는 중 오류가 발생했습니다.";
pub const UNKNOWN_ERROR: &str = "알 수 없는 오류가 발생했습니다.";

/// Label for the expand/collapse control given the current expansion.
pub fn toggle_label(expanded: bool) -> &'static str {
    if expanded { SHOW_LESS } else { SHOW_MORE }
}
