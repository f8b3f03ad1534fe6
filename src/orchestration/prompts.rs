//! Prompt builders for the orchestration pipeline.
//!
//! Each model call pairs one of the system prompts below with a built user
//! prompt. Structured calls (decomposition, summarization) demand raw JSON
//! and are validated with serde immediately after the call returns.

use crate::search::SearchResult;

use super::types::Subtask;

/// System prompt for the decomposition call.
pub const DECOMPOSER_SYSTEM: &str = "\
You are a research lead responsible for breaking down complex research \
queries into focused subtasks for independent research workers.\n\
Keep subtasks specific, non-overlapping, and each one individually \
useful for answering the original query.\n\
Respond with raw JSON only, no markdown fences, matching exactly:\n\
{\"subtasks\": [{\"description\": \"...\", \"rationale\": \"...\"}]}";

/// System prompt for the worker's search-planning call.
pub const PLANNER_SYSTEM: &str = "\
You turn a research task into one effective web search query.\n\
Respond with the query text only: a single line, no quotes, no explanation.";

/// System prompt for the worker's summarization call.
pub const SUMMARIZER_SYSTEM: &str = "\
You are a research worker. Ground your summary strictly in the provided \
search results; do not invent facts or cite sources that are not listed.\n\
Respond with raw JSON only, no markdown fences, matching exactly:\n\
{\"summary\": \"...\", \"cited_urls\": [\"...\"]}";

/// System prompt for the final synthesis call.
pub const SYNTHESIS_SYSTEM: &str = "\
You are a research lead synthesizing findings from several research \
workers into one coherent answer.\n\
Write dense, readable prose that directly answers the original question. \
Do not include citations, source lists, or meta-commentary.";

/// Build the decomposition prompt for one query.
pub fn decompose(query: &str, max_subtasks: usize) -> String {
    let mut prompt = String::with_capacity(512);

    prompt.push_str("## Research Query\n\n");
    prompt.push_str(query);
    prompt.push_str("\n\n## Instructions\n\n");
    prompt.push_str(&format!(
        "Break this query into between 1 and {max_subtasks} focused research \
         subtasks. Prefer fewer subtasks for simple queries. For each subtask \
         give a description of what to research and a rationale explaining \
         how it helps answer the query.\n"
    ));

    prompt
}

/// Build the search-planning prompt for one subtask.
pub fn search_plan(subtask: &Subtask) -> String {
    let mut prompt = String::with_capacity(256);

    prompt.push_str("## Research Task\n\n");
    prompt.push_str(&subtask.description);
    prompt.push_str("\n\n## Focus\n\n");
    prompt.push_str(&subtask.rationale);
    prompt.push_str("\n\nWrite the single best web search query for this task.\n");

    prompt
}

/// Build the summarization prompt for one subtask and its search results.
pub fn summarize(subtask: &Subtask, result: &SearchResult) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("## Research Task\n\n");
    prompt.push_str(&subtask.description);
    prompt.push_str("\n\n## Search Results\n\n");

    for snippet in &result.snippets {
        prompt.push_str(&format!(
            "Source: {} ({})\nContent: {}\n\n---\n\n",
            snippet.title, snippet.url, snippet.excerpt
        ));
    }

    prompt.push_str(
        "## Instructions\n\n\
         Summarize what these results say about the research task in a short \
         paragraph. List in cited_urls only the source URLs your summary \
         actually draws on.\n",
    );

    prompt
}

/// Build the final synthesis prompt from the ordered worker summaries.
///
/// `summaries` must be in decomposition order; the orchestrator guarantees
/// this regardless of worker completion order.
pub fn synthesize(query: &str, summaries: &[(String, String)]) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str("## Original Question\n\n");
    prompt.push_str(query);
    prompt.push_str("\n\n## Research Findings\n\n");

    for (i, (description, summary)) in summaries.iter().enumerate() {
        prompt.push_str(&format!(
            "### Finding {n}: {description}\n\n{summary}\n\n",
            n = i + 1
        ));
    }

    prompt.push_str(
        "## Instructions\n\n\
         Combine the findings into one coherent answer to the original \
         question. Note any aspects the findings do not cover.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Snippet;
    use chrono::Utc;

    fn sample_subtask() -> Subtask {
        Subtask::new(
            "research Rust async runtimes".to_string(),
            "the query compares concurrency models".to_string(),
        )
    }

    #[test]
    fn decompose_includes_query_and_bound() {
        let prompt = decompose("Compare X and Y", 4);
        assert!(prompt.contains("Compare X and Y"));
        assert!(prompt.contains("between 1 and 4"));
    }

    #[test]
    fn search_plan_includes_description_and_rationale() {
        let subtask = sample_subtask();
        let prompt = search_plan(&subtask);
        assert!(prompt.contains("research Rust async runtimes"));
        assert!(prompt.contains("concurrency models"));
    }

    #[test]
    fn summarize_lists_all_snippets() {
        let subtask = sample_subtask();
        let result = SearchResult {
            snippets: vec![
                Snippet {
                    title: "Tokio".into(),
                    url: "https://tokio.rs".into(),
                    excerpt: "An async runtime".into(),
                },
                Snippet {
                    title: "smol".into(),
                    url: "https://github.com/smol-rs/smol".into(),
                    excerpt: "A small runtime".into(),
                },
            ],
            fetched_at: Utc::now(),
        };

        let prompt = summarize(&subtask, &result);
        assert!(prompt.contains("https://tokio.rs"));
        assert!(prompt.contains("smol-rs"));
        assert!(prompt.contains("cited_urls"));
    }

    #[test]
    fn synthesize_preserves_summary_order() {
        let summaries = vec![
            ("research X".to_string(), "X is red".to_string()),
            ("research Y".to_string(), "Y is blue".to_string()),
        ];
        let prompt = synthesize("Compare X and Y", &summaries);

        let x_pos = prompt.find("X is red").unwrap();
        let y_pos = prompt.find("Y is blue").unwrap();
        assert!(x_pos < y_pos);
        assert!(prompt.contains("Finding 1: research X"));
        assert!(prompt.contains("Finding 2: research Y"));
    }
}
