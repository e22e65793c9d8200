//! Topic routing between grounded and open-domain answers

use crate::types::AnswerMode;

/// Built-in university vocabulary; any hit routes a question to the records
const DEFAULT_KEYWORDS: &[&str] = &[
    // institution
    "university", "college", "campus", "amity", "department", "faculty", "professor",
    "dean", "hod", "vice chancellor", "registrar",
    // admissions and money
    "admission", "fee", "tuition", "scholarship", "refund", "registration", "eligibility",
    "deadline", "prospectus",
    // academics
    "exam", "examination", "semester", "course", "syllabus", "curriculum", "credit",
    "attendance", "result", "grade", "cgpa", "sgpa", "backlog", "timetable", "time table",
    "lecture", "class", "lab", "assignment", "internship", "placement", "degree",
    "programme", "program", "btech", "b tech", "mba", "bba", "phd", "convocation",
    // campus life
    "hostel", "library", "canteen", "mess", "transport", "shuttle", "holiday", "club",
    "student id", "id card", "uniform", "ragging",
    // Hindi
    "परीक्षा", "फीस", "शुल्क", "छात्रावास", "हॉस्टल", "प्रवेश", "दाखिला", "विश्वविद्यालय",
    "कॉलेज", "पुस्तकालय", "छात्रवृत्ति", "परिणाम", "पाठ्यक्रम",
    // romanised Hindi
    "pariksha", "dakhila",
];

/// Split into lowercase words; Devanagari vowel signs stay inside their word
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !is_word_char(c))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
        || (('\u{0900}'..='\u{097F}').contains(&c) && !matches!(c, '\u{0964}' | '\u{0965}'))
}

#[derive(Debug, Clone)]
enum Keyword {
    Word(String),
    Phrase(Vec<String>),
}

impl Keyword {
    fn parse(raw: &str) -> Option<Self> {
        let mut words = tokenize(raw);
        match words.len() {
            0 => None,
            1 => words.pop().map(Self::Word),
            _ => Some(Self::Phrase(words)),
        }
    }

    fn matches(&self, tokens: &[String]) -> bool {
        match self {
            Self::Word(word) => tokens.iter().any(|t| word_matches(word, t)),
            Self::Phrase(phrase) => tokens
                .windows(phrase.len())
                .any(|window| window.iter().zip(phrase).all(|(t, p)| t == p)),
        }
    }
}

/// Exact match, or a simple `s`/`es`/`ies` plural of an ASCII keyword
fn word_matches(keyword: &str, token: &str) -> bool {
    if token == keyword {
        return true;
    }
    if !keyword.is_ascii() {
        return false;
    }
    if let Some(stem) = keyword.strip_suffix('y').filter(|stem| !stem.is_empty()) {
        if token.strip_prefix(stem) == Some("ies") {
            return true;
        }
    }
    matches!(token.strip_prefix(keyword), Some("s") | Some("es"))
}

/// Keyword allowlist classifier
///
/// Matching is case-insensitive on whole words; multi-word keywords match as
/// consecutive words.
#[derive(Debug, Clone)]
pub struct TopicRouter {
    keywords: Vec<Keyword>,
}

impl TopicRouter {
    /// Router over `keywords`; an empty list falls back to the built-in vocabulary
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        let parsed: Vec<Keyword> = keywords
            .iter()
            .filter_map(|k| Keyword::parse(k.as_ref()))
            .collect();
        if parsed.is_empty() {
            return Self::default();
        }
        Self { keywords: parsed }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// True when any keyword occurs in `question`
    pub fn is_domain_question(&self, question: &str) -> bool {
        let tokens = tokenize(question);
        self.keywords.iter().any(|k| k.matches(&tokens))
    }

    pub fn route(&self, question: &str) -> AnswerMode {
        if self.is_domain_question(question) {
            AnswerMode::Grounded
        } else {
            AnswerMode::OpenDomain
        }
    }
}

impl Default for TopicRouter {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS
                .iter()
                .filter_map(|k| Keyword::parse(k))
                .collect(),
        }
    }
}
