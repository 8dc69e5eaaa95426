//! Text analysis contract and the default rule-based implementation.
//!
//! The pipeline only depends on three narrow capabilities:
//!
//! | Trait | Contract |
//! |-------|----------|
//! | [`Tokenizer`] | `tokenize(text) -> tokens` (lowercased, stop words removed) |
//! | [`EntityExtractor`] | `extract_entities(text) -> [{text, label}]` |
//! | [`CategoryAnnotator`] | `detect_categories(text) -> {category}` |
//!
//! All three are bundled in an [`Analyzer`]. Model-based implementations can
//! be dropped in without touching the vectorizer or the ranker.

use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{normalize_label, Entity};

/// Splits text into comparable tokens.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Finds named entities in text, in order of appearance.
pub trait EntityExtractor: Send + Sync {
    fn extract_entities(&self, text: &str) -> Vec<Entity>;
}

/// Detects which topic categories a text talks about.
///
/// Returned labels are normalized (see [`normalize_label`]) and sorted.
pub trait CategoryAnnotator: Send + Sync {
    fn detect_categories(&self, text: &str) -> BTreeSet<String>;
}

const SPANISH_STOP_WORDS: &[&str] = &[
    "a", "al", "algo", "algunas", "algunos", "ante", "antes", "como", "con", "contra", "cual",
    "cuando", "de", "del", "desde", "donde", "durante", "e", "el", "ella", "ellas", "ellos", "en",
    "entre", "era", "es", "esa", "esas", "ese", "eso", "esos", "esta", "estaba", "estado", "estas",
    "este", "esto", "estos", "estoy", "fue", "ha", "han", "hasta", "hay", "la", "las", "le", "les",
    "lo", "los", "mas", "más", "me", "mi", "mis", "mucho", "muy", "nada", "ni", "no", "nos",
    "nosotros", "o", "os", "otra", "otras", "otro", "otros", "para", "pero", "poco", "por",
    "porque", "que", "qué", "quien", "se", "sea", "ser", "si", "sí", "sin", "sobre", "son", "soy",
    "su", "sus", "también", "tanto", "te", "tiene", "todo", "todos", "tu", "tus", "un", "una",
    "uno", "unos", "y", "ya", "yo",
];

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be",
    "been", "but", "by", "can", "do", "does", "for", "from", "had", "has", "have", "he", "her",
    "his", "how", "i", "if", "in", "into", "is", "it", "its", "me", "more", "my", "no", "not",
    "of", "on", "or", "our", "she", "so", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "to", "up", "was", "we", "were", "what", "when", "which", "who",
    "will", "with", "you", "your",
];

/// Lowercase words allowed inside a multi-word entity ("Universidad de Chile").
const ENTITY_CONNECTORS: &[&str] = &["de", "del", "la", "las", "los", "y", "of", "the", "and"];

/// Leading words that mark an organization.
const ORG_CUES: &[&str] = &[
    "universidad", "ministerio", "banco", "gobierno", "fundación", "instituto", "asociación",
    "partido", "museo", "club", "empresa", "comisión", "university", "ministry", "bank",
    "institute", "foundation", "museum", "party", "company",
];

fn default_stop_words() -> HashSet<String> {
    SPANISH_STOP_WORDS
        .iter()
        .chain(ENGLISH_STOP_WORDS.iter())
        .map(|w| w.to_string())
        .collect()
}

/// Unicode word segmentation with lowercase folding and stop-word removal.
///
/// Purely numeric tokens and tokens shorter than `min_chars` are dropped.
pub struct RuleTokenizer {
    stop_words: HashSet<String>,
    min_chars: usize,
}

impl RuleTokenizer {
    pub fn new(min_chars: usize) -> Self {
        Self {
            stop_words: default_stop_words(),
            min_chars,
        }
    }

    /// Add extra stop words (matched after lowercasing).
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
        self
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }
}

impl Default for RuleTokenizer {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Tokenizer for RuleTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let folded = text.nfc().collect::<String>().to_lowercase();
        folded
            .unicode_words()
            .filter(|w| w.chars().count() >= self.min_chars)
            .filter(|w| !w.chars().all(char::is_numeric))
            .filter(|w| !self.stop_words.contains(*w))
            .map(str::to_string)
            .collect()
    }
}

/// Capitalized-span entity detection.
///
/// Consecutive capitalized words form one entity, optionally joined by a
/// short run of connector words. Leading stop words are stripped, and a
/// lone capitalized word at the start of a sentence is ignored unless it is
/// an acronym. Acronyms and spans opening with an organization cue are
/// labelled `ORG`; everything else is `MISC`.
pub struct RuleEntityExtractor {
    stop_words: HashSet<String>,
    connectors: HashSet<&'static str>,
    org_cues: HashSet<&'static str>,
}

impl Default for RuleEntityExtractor {
    fn default() -> Self {
        Self {
            stop_words: default_stop_words(),
            connectors: ENTITY_CONNECTORS.iter().copied().collect(),
            org_cues: ORG_CUES.iter().copied().collect(),
        }
    }
}

fn is_capitalized(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

fn is_acronym(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

impl RuleEntityExtractor {
    fn flush(&self, span: &mut Vec<&str>, starts_sentence: bool, out: &mut Vec<Entity>) {
        if span.is_empty() {
            return;
        }
        let mut words: &[&str] = span.as_slice();
        let mut stripped = false;
        while let Some((first, rest)) = words.split_first() {
            if self.stop_words.contains(&first.to_lowercase()) && !is_acronym(first) {
                words = rest;
                stripped = true;
            } else {
                break;
            }
        }

        // "Sigo la NASA": a sentence-initial word joined through a connector
        // is usually a verb, not part of the name.
        if starts_sentence && !stripped && words.len() > 2 {
            let joined_by_connector = self.connectors.contains(words[1].to_lowercase().as_str());
            if joined_by_connector && !self.org_cues.contains(words[0].to_lowercase().as_str()) {
                words = &words[1..];
                while let Some((first, rest)) = words.split_first() {
                    if self.connectors.contains(first.to_lowercase().as_str()) {
                        words = rest;
                    } else {
                        break;
                    }
                }
                stripped = true;
            }
        }

        if let [single] = words {
            if starts_sentence && !stripped && !is_acronym(single) {
                span.clear();
                return;
            }
        }

        if let Some(first) = words.first() {
            let label = if (words.len() == 1 && is_acronym(first))
                || self.org_cues.contains(first.to_lowercase().as_str())
            {
                "ORG"
            } else {
                "MISC"
            };
            out.push(Entity::new(words.join(" "), label));
        }
        span.clear();
    }
}

impl EntityExtractor for RuleEntityExtractor {
    fn extract_entities(&self, text: &str) -> Vec<Entity> {
        let text = text.nfc().collect::<String>();
        let mut out = Vec::new();

        for sentence in text.unicode_sentences() {
            let mut span: Vec<&str> = Vec::new();
            let mut pending: Vec<&str> = Vec::new();
            let mut span_starts_sentence = false;
            let mut word_index = 0usize;

            for token in sentence.split_word_bounds() {
                if token.trim().is_empty() {
                    continue;
                }
                if !token.chars().any(char::is_alphanumeric) {
                    self.flush(&mut span, span_starts_sentence, &mut out);
                    pending.clear();
                    continue;
                }

                let at_start = word_index == 0;
                word_index += 1;

                if is_capitalized(token) {
                    if span.is_empty() {
                        span_starts_sentence = at_start;
                    } else {
                        span.append(&mut pending);
                    }
                    span.push(token);
                } else if !span.is_empty()
                    && pending.len() < 2
                    && self.connectors.contains(token.to_lowercase().as_str())
                {
                    pending.push(token);
                } else {
                    self.flush(&mut span, span_starts_sentence, &mut out);
                    pending.clear();
                }
            }
            self.flush(&mut span, span_starts_sentence, &mut out);
        }

        out
    }
}

/// Keyword patterns per category, matched against lowercased text.
const CATEGORY_PATTERNS: &[(&str, &str)] = &[
    (
        "ciencia",
        r"\b(?:ciencias?|science|cient[ií]fic[oa]s?|scientists?|research|astronom[ií]a|astronomy|nasa|f[ií]sica|physics|biolog[ií]a|biology)\b",
    ),
    (
        "cultura",
        r"\b(?:cultura|culturales?|culture|museos?|museums?|teatro|theatre|theater|cine|cinema|m[uú]sica|music|literatura|literature|pintura|painting|exposici[oó]n|exhibition)\b",
    ),
    (
        "deportes",
        r"\b(?:deportes?|deportiv[oa]s?|sports?|f[uú]tbol|football|soccer|tenis|tennis|baloncesto|basketball|campeonatos?|championships?|ol[ií]mpic[oa]s?|olympics?|goles?|estadios?|stadium)\b",
    ),
    (
        "economía",
        r"\b(?:econom[ií]as?|economy|econ[oó]mic[oa]s?|inflaci[oó]n|inflation|mercados?|markets?|inversores?|investors?|inversi[oó]n|desempleo|unemployment|empleo|pib|gdp|banco central|central bank)\b",
    ),
    (
        "medio_ambiente",
        r"\b(?:medio ambiente|environment|clima|climate|cambio clim[aá]tico|calentamiento global|global warming|contaminaci[oó]n|pollution|biodiversidad|biodiversity|emisiones|emissions)\b",
    ),
    (
        "política",
        r"\b(?:pol[ií]tic[ao]s?|politics|political|elecci[oó]n|elecciones|elections?|gobierno|government|congreso|congress|senado|senate|parlamento|parliament|ministr[oa]s?|minister)\b",
    ),
    (
        "salud",
        r"\b(?:salud|health|hospital(?:es)?|m[eé]dic[oa]s?|doctors?|vacunas?|vaccines?|enfermedad(?:es)?|diseases?|pandemia|pandemic)\b",
    ),
    (
        "tecnología",
        r"\b(?:tecnolog[ií]as?|technology|inteligencia artificial|artificial intelligence|software|internet|ciberseguridad|cybersecurity|startups?|robots?|rob[oó]tica|robotics|smartphones?|chips?|procesadores?|processors?|computaci[oó]n|computing)\b",
    ),
];

fn default_category_patterns() -> &'static [(String, Regex)] {
    static PATTERNS: OnceLock<Vec<(String, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        CATEGORY_PATTERNS
            .iter()
            .map(|(category, pattern)| {
                let regex = Regex::new(pattern).expect("category pattern is valid");
                (normalize_label(category), regex)
            })
            .collect()
    })
}

/// Regex keyword annotator.
///
/// A category is detected when any of its patterns matches the lowercased
/// text. The default covers common news sections in Spanish and English.
#[derive(Debug, Clone)]
pub struct RegexCategoryAnnotator {
    patterns: Vec<(String, Regex)>,
}

impl RegexCategoryAnnotator {
    /// Compile `(category, pattern)` pairs. Patterns see lowercased text.
    pub fn new<I, C, P>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (C, P)>,
        C: AsRef<str>,
        P: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|(category, pattern)| {
                Ok((normalize_label(category.as_ref()), Regex::new(pattern.as_ref())?))
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { patterns })
    }

    /// Categories this annotator can detect, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.patterns.iter().map(|(c, _)| c.as_str()).collect()
    }
}

impl Default for RegexCategoryAnnotator {
    fn default() -> Self {
        Self {
            patterns: default_category_patterns().to_vec(),
        }
    }
}

impl CategoryAnnotator for RegexCategoryAnnotator {
    fn detect_categories(&self, text: &str) -> BTreeSet<String> {
        if text.trim().is_empty() {
            return BTreeSet::new();
        }
        let folded = text.nfc().collect::<String>().to_lowercase();
        self.patterns
            .iter()
            .filter(|(_, regex)| regex.is_match(&folded))
            .map(|(category, _)| category.clone())
            .collect()
    }
}

/// Expand tokens into all n-grams from 1 up to `max_n` (space-joined).
pub fn ngrams(tokens: &[String], max_n: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len() * max_n.max(1));
    for n in 1..=max_n.max(1) {
        for window in tokens.windows(n) {
            out.push(window.join(" "));
        }
    }
    out
}

/// Bundles a tokenizer, an entity extractor and a category annotator.
#[derive(Clone)]
pub struct Analyzer {
    tokenizer: Arc<dyn Tokenizer>,
    extractor: Arc<dyn EntityExtractor>,
    annotator: Arc<dyn CategoryAnnotator>,
}

impl Analyzer {
    /// Uses the default [`RegexCategoryAnnotator`]; see [`Analyzer::with_annotator`].
    pub fn new(tokenizer: Arc<dyn Tokenizer>, extractor: Arc<dyn EntityExtractor>) -> Self {
        Self {
            tokenizer,
            extractor,
            annotator: Arc::new(RegexCategoryAnnotator::default()),
        }
    }

    pub fn with_annotator(mut self, annotator: Arc<dyn CategoryAnnotator>) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenizer.tokenize(text)
    }

    pub fn extract_entities(&self, text: &str) -> Vec<Entity> {
        self.extractor.extract_entities(text)
    }

    pub fn detect_categories(&self, text: &str) -> BTreeSet<String> {
        self.annotator.detect_categories(text)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(
            Arc::new(RuleTokenizer::default()),
            Arc::new(RuleEntityExtractor::default()),
        )
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer").finish_non_exhaustive()
    }
}
