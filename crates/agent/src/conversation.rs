use serde_json::{json, Map, Value};

/// Operation a message asks for. Every variant except `Help` names a tool
/// in the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntentAction {
    Help,
    ListTemplates,
    TemplateDetails,
    CreateNda,
    SendDocument,
    DocumentStatus,
    ListDocuments,
    DownloadDocument,
    Statistics,
    PendingSignatures,
    DailySummary,
    LogAction,
    HealthCheck,
}

impl IntentAction {
    pub fn tool_name(&self) -> Option<&'static str> {
        let name = match self {
            Self::Help => return None,
            Self::ListTemplates => "list_templates",
            Self::TemplateDetails => "template_details",
            Self::CreateNda => "create_nda",
            Self::SendDocument => "send_document",
            Self::DocumentStatus => "document_status",
            Self::ListDocuments => "list_documents",
            Self::DownloadDocument => "download_document",
            Self::Statistics => "get_statistics",
            Self::PendingSignatures => "check_pending_signatures",
            Self::DailySummary => "send_daily_summary",
            Self::LogAction => "log_manual_action",
            Self::HealthCheck => "health_check",
        };
        Some(name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedIntent {
    pub action: IntentAction,
    /// Tool input, shaped like the matching tool expects it.
    pub arguments: Map<String, Value>,
    pub clarification_prompt: Option<String>,
}

impl ExtractedIntent {
    fn ready(action: IntentAction, arguments: Map<String, Value>) -> Self {
        Self { action, arguments, clarification_prompt: None }
    }

    fn clarify(action: IntentAction, prompt: impl Into<String>) -> Self {
        Self { action, arguments: Map::new(), clarification_prompt: Some(prompt.into()) }
    }

    pub fn is_ready(&self) -> bool {
        self.clarification_prompt.is_none() && self.action != IntentAction::Help
    }
}

const STATUS_WORDS: [&str; 9] =
    ["draft", "sent", "viewed", "completed", "declined", "voided", "approved", "rejected", "paid"];

/// Keyword classifier for operator messages. Intents are checked in a fixed
/// order and the first match wins; arguments come from the original text so
/// names and ids keep their case.
#[derive(Clone, Debug, Default)]
pub struct IntentExtractor;

impl IntentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> ExtractedIntent {
        let normalized_text = normalize_text(text);
        let words = tokenize(&normalized_text);
        let has = |word: &str| words.iter().any(|candidate| candidate == word);

        if words.is_empty() || has("help") || normalized_text.contains("what can you do") {
            return ExtractedIntent::ready(IntentAction::Help, Map::new());
        }
        if has("health") || normalized_text.contains("health check") {
            return ExtractedIntent::ready(IntentAction::HealthCheck, Map::new());
        }
        if has("summary") || has("digest") {
            return ExtractedIntent::ready(IntentAction::DailySummary, Map::new());
        }
        if has("pending") || has("awaiting") || has("unsigned") {
            return ExtractedIntent::ready(IntentAction::PendingSignatures, Map::new());
        }
        if has("stats") || has("statistics") || normalized_text.contains("how many") {
            return ExtractedIntent::ready(IntentAction::Statistics, Map::new());
        }
        let new_nda = words.windows(2).any(|pair| pair[0] == "new" && pair[1] == "nda");
        if has("create") || has("prepare") || has("generate") || new_nda {
            return extract_create(text, &words);
        }
        if has("log") || has("mark") {
            return extract_log(text, &words);
        }
        if has("download") {
            return with_document_id(text, IntentAction::DownloadDocument, Map::new());
        }
        if has("send") {
            return with_document_id(text, IntentAction::SendDocument, Map::new());
        }
        if has("template") || has("templates") {
            return extract_template(text, &words);
        }
        if has("status") && find_after(text, &["document", "doc"]).is_some() {
            return with_document_id(text, IntentAction::DocumentStatus, Map::new());
        }
        if has("documents") || has("list") || has("show") {
            let mut arguments = Map::new();
            if let Some(status) = words.iter().find(|word| STATUS_WORDS.contains(&word.as_str())) {
                arguments.insert("status".to_string(), json!(status));
            }
            return ExtractedIntent::ready(IntentAction::ListDocuments, arguments);
        }

        ExtractedIntent::clarify(IntentAction::Help, "I did not understand that request.")
    }
}

pub fn help_prompt() -> String {
    [
        "Try one of:",
        "  list templates | template tmpl-123 details",
        "  create an NDA for Jane Doe at Acme Corp, jane@acme.test, template tmpl-123",
        "  send document doc-789 | status of document doc-789 | download document doc-789",
        "  list sent documents | pending signatures | statistics | daily summary",
        "  log signed for document doc-789 | health check",
    ]
    .join("\n")
}

fn extract_create(text: &str, words: &[String]) -> ExtractedIntent {
    let email = find_email(text);
    let template_id = find_after(text, &["template"]);
    let (recipient_name, company_name) = find_name_and_company(text);

    let mut missing = Vec::new();
    if template_id.is_none() {
        missing.push("a template id (`template <id>`)");
    }
    if email.is_none() {
        missing.push("the recipient's email address");
    }
    if recipient_name.is_none() || company_name.is_none() {
        missing.push("the recipient and company (`for <name> at <company>`)");
    }
    if !missing.is_empty() {
        return ExtractedIntent::clarify(
            IntentAction::CreateNda,
            format!("To create an NDA I still need {}.", missing.join(", ")),
        );
    }

    let mut arguments = Map::new();
    arguments.insert("template_id".to_string(), json!(template_id));
    arguments.insert("recipient_email".to_string(), json!(email));
    arguments.insert("recipient_name".to_string(), json!(recipient_name));
    arguments.insert("company_name".to_string(), json!(company_name));
    if words.iter().any(|word| word == "send") {
        arguments.insert("send".to_string(), json!(true));
    }
    ExtractedIntent::ready(IntentAction::CreateNda, arguments)
}

fn extract_log(text: &str, words: &[String]) -> ExtractedIntent {
    // "mark document doc-1 as signed" or "log signed for document doc-1"
    let action = match words.iter().position(|word| word == "as") {
        Some(index) if words.iter().any(|word| word == "mark") => words.get(index + 1),
        _ => words
            .iter()
            .position(|word| word == "log")
            .and_then(|index| words.get(index + 1))
            .filter(|word| !matches!(word.as_str(), "document" | "doc" | "for")),
    };
    let Some(action) = action else {
        return ExtractedIntent::clarify(
            IntentAction::LogAction,
            "Which action should I log (created, sent, signed, ...)?",
        );
    };

    let mut arguments = Map::new();
    arguments.insert("action".to_string(), json!(action));
    with_document_id(text, IntentAction::LogAction, arguments)
}

fn extract_template(text: &str, words: &[String]) -> ExtractedIntent {
    let wants_details = words
        .iter()
        .any(|word| matches!(word.as_str(), "details" | "detail" | "fields" | "roles"));
    match find_after(text, &["template"]) {
        Some(template_id) if wants_details || !words.iter().any(|word| word == "templates") => {
            let mut arguments = Map::new();
            arguments.insert("template_id".to_string(), json!(template_id));
            ExtractedIntent::ready(IntentAction::TemplateDetails, arguments)
        }
        None if wants_details => ExtractedIntent::clarify(
            IntentAction::TemplateDetails,
            "Which template? Say `template <id>`.",
        ),
        _ => ExtractedIntent::ready(IntentAction::ListTemplates, Map::new()),
    }
}

fn with_document_id(
    text: &str,
    action: IntentAction,
    mut arguments: Map<String, Value>,
) -> ExtractedIntent {
    match find_after(text, &["document", "doc"]) {
        Some(document_id) => {
            arguments.insert("document_id".to_string(), json!(document_id));
            ExtractedIntent::ready(action, arguments)
        }
        None => ExtractedIntent::clarify(action, "Which document? Say `document <id>`."),
    }
}

fn normalize_text(text: &str) -> String {
    text.to_ascii_lowercase()
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|character: char| !(character.is_ascii_alphanumeric() || character == '-'))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(|character: char| {
        matches!(character, ',' | '.' | ';' | ':' | '!' | '?' | '(' | ')' | '"' | '\'' | '<' | '>')
    })
}

fn find_email(text: &str) -> Option<String> {
    text.split_whitespace().map(trim_punctuation).find_map(|word| {
        let (local, domain) = word.split_once('@')?;
        (!local.is_empty() && domain.contains('.')).then(|| word.to_string())
    })
}

/// The word following one of `keywords`, skipping a filler `id`. Plural
/// forms (`templates`, `documents`) do not count as the keyword.
fn find_after(text: &str, keywords: &[&str]) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().map(trim_punctuation).collect();
    let position = words
        .iter()
        .position(|word| keywords.iter().any(|keyword| word.eq_ignore_ascii_case(keyword)))?;

    let mut candidates = words[position + 1..].iter();
    let mut candidate = candidates.next()?;
    if candidate.eq_ignore_ascii_case("id") {
        candidate = candidates.next()?;
    }

    let looks_like_id = candidate.chars().any(|character| character.is_ascii_digit())
        || candidate.contains('-')
        || candidate.contains('_');
    (looks_like_id && !candidate.contains('@')).then(|| candidate.to_string())
}

/// `for <name> at <company>`: the name is the words after `for`, the company
/// the words after `at`, each running until a clause boundary.
fn find_name_and_company(text: &str) -> (Option<String>, Option<String>) {
    let words: Vec<&str> = text.split_whitespace().collect();
    let lower: Vec<String> = words.iter().map(|word| normalize_text(trim_punctuation(word))).collect();

    let name = lower
        .iter()
        .position(|word| word == "for")
        .and_then(|start| collect_phrase(&words, &lower, start + 1));
    let company = lower
        .iter()
        .position(|word| word == "at")
        .and_then(|start| collect_phrase(&words, &lower, start + 1));
    (name, company)
}

fn collect_phrase(words: &[&str], lower: &[String], start: usize) -> Option<String> {
    const BOUNDARIES: [&str; 8] = ["at", "using", "with", "from", "template", "email", "and", "to"];

    let mut phrase = Vec::new();
    for (word, lower_word) in words.iter().zip(lower).skip(start) {
        if BOUNDARIES.contains(&lower_word.as_str()) || word.contains('@') {
            break;
        }
        let cleaned = trim_punctuation(word);
        if !cleaned.is_empty() {
            phrase.push(cleaned);
        }
        if word.ends_with(',') || word.ends_with(';') || word.ends_with('.') {
            break;
        }
    }
    (!phrase.is_empty()).then(|| phrase.join(" "))
}
