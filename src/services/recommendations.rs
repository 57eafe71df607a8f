use std::{collections::HashSet, fmt::Write as _, sync::Arc};
use tracing::instrument;

use crate::{
    error::AppResult,
    models::{
        normalize_title, Article, RawRecommendation, Recommendation, RecommendationOutcome,
        RecommendationRequest, RecommendationResult, MAX_RECOMMENDATIONS,
    },
    services::{normalizer::truncate_chars, providers::LanguageModel, response_parser},
};

/// Asks the AI service which candidates are most similar to a reference article
///
/// Similarity itself is entirely the model's call. This side builds the prompt, tolerates
/// whatever shape the answer comes back in, and makes sure only real candidates are returned.
pub struct Recommender {
    model: Arc<dyn LanguageModel>,
    max_candidates: usize,
    content_max_chars: usize,
}

impl Recommender {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        max_candidates: usize,
        content_max_chars: usize,
    ) -> Self {
        Self {
            model,
            max_candidates,
            content_max_chars,
        }
    }

    /// Up to five candidates similar to the reference, best first
    ///
    /// Fails only when the AI service itself is unreachable; an answer that cannot be used is
    /// reported as [`RecommendationOutcome::Unavailable`].
    #[instrument(
        skip(self, request),
        fields(reference = %request.reference.id, candidates = request.candidates.len())
    )]
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> AppResult<RecommendationOutcome> {
        let shown = self.shown_candidates(request);
        if shown.is_empty() {
            tracing::info!("No candidates to compare against");
            return Ok(RecommendationOutcome::Unavailable {
                raw_response: String::new(),
            });
        }

        let prompt = self.build_prompt(&request.reference, shown);
        let response = self.model.complete(&prompt).await?;

        let Some(raw) = response_parser::extract_array(&response, RawRecommendation::is_reference)
        else {
            tracing::warn!(
                provider = self.model.name(),
                response = %response,
                "No recommendation array in AI response"
            );
            return Ok(RecommendationOutcome::Unavailable {
                raw_response: response,
            });
        };

        let recommendations = resolve(&raw, &request.reference, shown);
        if recommendations.is_empty() {
            tracing::warn!(
                provider = self.model.name(),
                entries = raw.len(),
                response = %response,
                "AI response named no usable candidates"
            );
            return Ok(RecommendationOutcome::Unavailable {
                raw_response: response,
            });
        }

        tracing::info!(
            provider = self.model.name(),
            entries = raw.len(),
            count = recommendations.len(),
            "Recommendations resolved"
        );

        Ok(RecommendationOutcome::Found(RecommendationResult { recommendations }))
    }

    fn shown_candidates<'a>(&self, request: &'a RecommendationRequest) -> &'a [Article] {
        let end = request.candidates.len().min(self.max_candidates);
        &request.candidates[..end]
    }

    /// Structured prompt with role, task, inputs, criteria and output format sections
    ///
    /// Candidates are numbered from 0 in the order given.
    pub fn build_prompt(&self, reference: &Article, candidates: &[Article]) -> String {
        let mut listing = String::new();
        for (id, article) in candidates.iter().enumerate() {
            let _ = write!(
                listing,
                "ID: {}\nTITLE: {}\nLINK: {}\nSOURCE: {}\n\n",
                id, article.title, article.link, article.source
            );
        }

        format!(
            r#"# SYSTEM: You are an expert news recommendation system that identifies relevant articles based on semantic similarity.

# TASK: Find up to {max} news articles from AVAILABLE ARTICLES most similar to the reference article below.

# REFERENCE ARTICLE:
TITLE: {title}
CONTENT: {content}

# AVAILABLE ARTICLES:
{listing}
# CRITERIA FOR SIMILARITY:
- Topic relevance (most important)
- Shared events, people, places or organizations
- Complementary perspective that would interest the same reader
- Prefer a diversity of sources when relevance is equal

# OUTPUT FORMAT:
Return a JSON array of at most {max} objects, most similar first.
Each object must have these fields:
- "id": the ID of the article as shown in AVAILABLE ARTICLES
- "title": the exact title as shown in AVAILABLE ARTICLES
- "link": the exact link as shown in AVAILABLE ARTICLES
- "reason": optional, one short sentence on why it is similar

# OUTPUT CONSTRAINTS:
- Return ONLY raw JSON with no markdown formatting, explanation, or commentary
- Only use articles from AVAILABLE ARTICLES
- Do not include the reference article

# EXAMPLE OUTPUT:
[
  {{"id": 3, "title": "Example Article", "link": "https://example.com/3", "reason": "Covers the same event"}},
  {{"id": 0, "title": "Another Example", "link": "https://example.com/0"}}
]
"#,
            max = MAX_RECOMMENDATIONS,
            title = reference.title,
            content = truncate_chars(&reference.content, self.content_max_chars),
            listing = listing,
        )
    }
}

/// Maps model entries back onto candidates
///
/// An entry resolves by index when the index is in range and agrees with any title or link it
/// also gives, otherwise by exact link, otherwise by normalized title. Unresolvable entries and
/// the reference are dropped, links are unique, and at most [`MAX_RECOMMENDATIONS`] are kept.
fn resolve(
    raw: &[RawRecommendation],
    reference: &Article,
    candidates: &[Article],
) -> Vec<Recommendation> {
    let reference_title = normalize_title(&reference.title);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut resolved = Vec::new();

    for entry in raw {
        let Some(article) = find_candidate(entry, candidates) else {
            tracing::debug!(entry = ?entry, "Dropping unresolved recommendation");
            continue;
        };

        if article.link == reference.link || normalize_title(&article.title) == reference_title {
            continue;
        }
        if !seen.insert(article.link.as_str()) {
            continue;
        }

        resolved.push(Recommendation {
            article: article.clone(),
            reason: entry
                .reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        });

        if resolved.len() == MAX_RECOMMENDATIONS {
            break;
        }
    }

    resolved
}

fn find_candidate<'a>(entry: &RawRecommendation, candidates: &'a [Article]) -> Option<&'a Article> {
    let link = entry.link.as_deref().map(str::trim).filter(|l| !l.is_empty());
    let title = entry
        .title
        .as_deref()
        .map(normalize_title)
        .filter(|t| !t.is_empty());

    let by_index = entry.id.and_then(|id| candidates.get(id)).filter(|article| {
        link.map_or(true, |l| l == article.link)
            && title
                .as_deref()
                .map_or(true, |t| t == normalize_title(&article.title))
    });

    by_index
        .or_else(|| link.and_then(|l| candidates.iter().find(|a| a.link == l)))
        .or_else(|| {
            title.and_then(|t| {
                candidates
                    .iter()
                    .find(|a| normalize_title(&a.title) == t)
            })
        })
}
