use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::instrument;

use crate::{
    models::{Article, KeywordOrigin, VideoQuery},
    services::{
        normalizer::truncate_chars,
        providers::LanguageModel,
        response_parser::{extract_array, split_free_text},
    },
};

pub const MAX_KEYWORDS: usize = 5;
const MAX_PHRASE_CHARS: usize = 80;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "again", "against", "all", "also", "am", "an", "and", "any", "are",
    "as", "at", "be", "been", "before", "being", "but", "by", "can", "could", "did", "do",
    "does", "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
    "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "just", "may", "me", "might", "more", "most", "must", "my", "new", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over",
    "own", "s", "said", "says", "same", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "us", "very", "vs", "was", "we", "were", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you",
    "your",
];

/// Turns an article into keyword phrases for video search
///
/// Asks the AI service first. Anything that goes wrong there ends in a local heuristic over
/// the title, so extraction itself never fails.
pub struct VideoQueryExtractor {
    model: Arc<dyn LanguageModel>,
    content_max_chars: usize,
}

impl VideoQueryExtractor {
    pub fn new(model: Arc<dyn LanguageModel>, content_max_chars: usize) -> Self {
        Self {
            model,
            content_max_chars,
        }
    }

    #[instrument(skip(self, article), fields(article = %article.id))]
    pub async fn extract(&self, article: &Article) -> VideoQuery {
        match self.model.complete(&self.build_prompt(article)).await {
            Ok(response) => {
                if let Some(query) = keywords_from_response(&response) {
                    tracing::info!(
                        origin = ?query.origin,
                        keywords = ?query.keywords,
                        "Video keywords extracted"
                    );
                    return query;
                }
                tracing::warn!(
                    provider = self.model.name(),
                    response = %response,
                    "No usable keywords in AI response, using title heuristic"
                );
            }
            Err(e) => {
                tracing::warn!(
                    provider = self.model.name(),
                    error = %e,
                    "Keyword extraction failed, using title heuristic"
                );
            }
        }

        heuristic_query(article)
    }

    pub fn build_prompt(&self, article: &Article) -> String {
        format!(
            r#"# SYSTEM: You write search queries for a video search engine.

# TASK: Give 3 to 5 concise keyword phrases that would find videos about the news article below, most specific first.

# ARTICLE:
TITLE: {title}
CONTENT: {content}

# OUTPUT FORMAT:
A JSON array of strings, for example ["mars rover landing", "nasa perseverance", "mars"]

# OUTPUT CONSTRAINTS:
- Return ONLY raw JSON with no markdown formatting or commentary
- Each phrase at most 6 words
"#,
            title = article.title,
            content = truncate_chars(&article.content, self.content_max_chars),
        )
    }
}

/// Structured answer first, then line or comma splitting
fn keywords_from_response(response: &str) -> Option<VideoQuery> {
    if let Some(list) = extract_array(response, |s: &String| !s.trim().is_empty()) {
        let keywords = tidy_keywords(list);
        if !keywords.is_empty() {
            return Some(VideoQuery {
                keywords,
                origin: KeywordOrigin::Model,
            });
        }
    }

    let keywords = tidy_keywords(split_free_text(response));
    (!keywords.is_empty()).then_some(VideoQuery {
        keywords,
        origin: KeywordOrigin::FreeText,
    })
}

/// Trims, drops empty or overlong phrases, dedupes case-insensitively, and caps the list
pub fn tidy_keywords(raw: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|k| k.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|k| !k.is_empty() && k.chars().count() <= MAX_PHRASE_CHARS)
        .filter(|k| seen.insert(k.to_lowercase()))
        .take(MAX_KEYWORDS)
        .collect()
}

/// Deterministic keywords from the title alone
///
/// Terms are ranked by frequency (ties by first appearance) and combined into phrases of the
/// top four, top two and top one terms.
pub fn heuristic_query(article: &Article) -> VideoQuery {
    let terms = ranked_terms(&article.title);

    let mut phrases: Vec<String> = Vec::new();
    if !terms.is_empty() {
        for n in [4, 2, 1] {
            phrases.push(terms[..n.min(terms.len())].join(" "));
        }
    } else {
        phrases.push(article.title.clone());
        phrases.push(article.category.search_term());
    }

    VideoQuery {
        keywords: tidy_keywords(phrases),
        origin: KeywordOrigin::Heuristic,
    }
}

fn ranked_terms(text: &str) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    let words = text
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() > 1 && !STOPWORDS.contains(&w.as_str()));

    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    ranked.into_iter().map(|(word, _)| word).collect()
}
