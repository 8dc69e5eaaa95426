//! Noise removal and profile-aware extractive summaries.
//!
//! Scraped article bodies carry "LEA TAMBIÉN" / "READ ALSO" teasers that
//! link to unrelated stories. [`clean_text`] strips them before the
//! [`Summarizer`] picks the sentences that go into a report.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

const TEASER: &str = r"(?:LEA\s+TAMBI[EÉ]N|READ\s+ALSO)";

struct NoisePatterns {
    teasers: Vec<Regex>,
    blank_lines: Regex,
    spaces: Regex,
}

fn noise_patterns() -> &'static NoisePatterns {
    static PATTERNS: OnceLock<NoisePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let teasers = [
            // "LEA TAMBIÉN: headline" on one line
            format!(r"(?i){TEASER}[ \t]*:[ \t]*[^\n]+"),
            // marker on its own line, headline on the next
            format!(r"(?i){TEASER}[ \t]*\n+[^\n]+"),
            // marker followed by a headline up to the end of the sentence
            format!(r"(?i){TEASER}[ \t]*:?[ \t]*[^.!?\n]*[.!?]?"),
        ];
        NoisePatterns {
            teasers: teasers
                .iter()
                .map(|p| Regex::new(p).expect("teaser pattern is valid"))
                .collect(),
            blank_lines: Regex::new(r"\n{3,}").expect("blank line pattern is valid"),
            spaces: Regex::new(r" {2,}").expect("space pattern is valid"),
        }
    })
}

/// Remove teaser lines, collapse runs of blank lines and repeated spaces.
pub fn clean_text(text: &str) -> String {
    let patterns = noise_patterns();
    let mut text = text.to_string();
    for teaser in &patterns.teasers {
        text = teaser.replace_all(&text, "").into_owned();
    }
    let text = patterns.blank_lines.replace_all(&text, "\n\n");
    let text = patterns.spaces.replace_all(&text, " ");
    text.trim().to_string()
}

/// Split text into trimmed, non-empty sentences.
pub fn sentences(text: &str) -> Vec<&str> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extractive summarizer favouring early, medium-length sentences that
/// mention the reader's categories.
#[derive(Debug, Clone, Copy)]
pub struct Summarizer {
    sentences: usize,
}

impl Default for Summarizer {
    fn default() -> Self {
        Self { sentences: 3 }
    }
}

impl Summarizer {
    pub fn new(sentences: usize) -> Self {
        Self { sentences }
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences
    }

    /// Pick the best sentences for a reader interested in `categories`.
    ///
    /// Text with no more sentences than requested comes back unchanged.
    /// Otherwise the chosen sentences keep their original order.
    pub fn summarize_for_profile<'a, I>(&self, text: &str, categories: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let all = sentences(text);
        if all.len() <= self.sentences {
            return text.trim().to_string();
        }

        let keywords = category_keywords(categories);

        let mut scored: Vec<(f32, usize)> = all
            .iter()
            .enumerate()
            .map(|(i, sentence)| (sentence_score(i, sentence, &keywords), i))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        let chosen: BTreeSet<usize> = scored
            .into_iter()
            .take(self.sentences)
            .map(|(_, i)| i)
            .collect();
        chosen
            .into_iter()
            .map(|i| all[i])
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Words of each category label ("ciencia_salud" -> ["ciencia", "salud"]).
fn category_keywords<'a, I>(categories: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    categories
        .into_iter()
        .flat_map(|c| {
            c.split(|ch: char| ch == '_' || ch == '-' || ch.is_whitespace())
                .filter(|k| !k.is_empty())
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}

fn sentence_score(index: usize, sentence: &str, keywords: &[String]) -> f32 {
    let words = sentence.split_whitespace().count() as f32;
    let position = 1.0 / (index as f32 + 1.0);
    let length = 1.0 / (1.0 + (words - 15.0).abs());
    let lower = sentence.to_lowercase();
    let bonus = keywords
        .iter()
        .filter(|k| lower.contains(k.as_str()))
        .count() as f32
        * 0.1;
    0.4 * position + 0.3 * length + 0.3 * bonus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_inline_teaser() {
        let text = "Primer párrafo.\nLEA TAMBIÉN: Otra noticia sin relación\nSegundo párrafo.";
        assert_eq!(clean_text(text), "Primer párrafo.\n\nSegundo párrafo.");
    }

    #[test]
    fn test_clean_text_teaser_on_next_line() {
        let text = "Inicio.\n\nLea también\n\nTitular ajeno\n\n\n\nCierre.";
        assert_eq!(clean_text(text), "Inicio.\n\nCierre.");
    }

    #[test]
    fn test_clean_text_english_and_spaces() {
        let text = "One  two. READ ALSO: Another story\nThree.";
        assert_eq!(clean_text(text), "One two. \nThree.");
    }

    #[test]
    fn test_clean_text_plain_text_untouched() {
        assert_eq!(clean_text("  Sin ruido aquí.  "), "Sin ruido aquí.");
    }

    #[test]
    fn test_short_text_returned_as_is() {
        let s = Summarizer::new(3);
        assert_eq!(
            s.summarize_for_profile(" Una. Dos. ", ["arte"]),
            "Una. Dos."
        );
        assert_eq!(s.summarize_for_profile("", ["arte"]), "");
    }

    #[test]
    fn test_summary_keeps_original_order() {
        let s = Summarizer::new(2);
        let text = "Primera frase corta. Segunda frase. \
                    Tercera frase sobre la economía del país y sus efectos más recientes. Cuarta.";
        assert_eq!(
            s.summarize_for_profile(text, Vec::<&str>::new()),
            "Primera frase corta. Segunda frase."
        );
        // The category keyword lifts the third sentence above the second.
        assert_eq!(
            s.summarize_for_profile(text, ["economía"]),
            "Primera frase corta. Tercera frase sobre la economía del país y sus efectos más recientes."
        );
    }

    #[test]
    fn test_category_keywords_split() {
        assert_eq!(
            category_keywords(["Ciencia_Salud", "medio-ambiente", "arte"]),
            vec!["ciencia", "salud", "medio", "ambiente", "arte"]
        );
        let keywords = category_keywords(["ciencia_salud"]);
        let sentence = "Avances en ciencia y salud.";
        let boosted = sentence_score(2, sentence, &keywords);
        let plain = sentence_score(2, sentence, &[]);
        assert!((boosted - plain - 0.06).abs() < 1e-6);
    }
}
