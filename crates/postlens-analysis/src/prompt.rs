//! Instruction prompt for the batch media analysis.

use std::fmt::Write as _;

/// Keys every analysis entry is asked to carry.
pub const ANALYSIS_KEYS: &[&str] = &[
    "media_id",
    "main_topic",
    "hook_transcript",
    "hook_visual_elements",
    "format",
    "format_main_elements",
    "full_transcript",
];

const INSTRUCTIONS: &str = "\
Act as a social media content analyst. Analyze ALL attached media and return a JSON array only. \
Do NOT include explanations, prose, or markdown. Return ONLY valid JSON.

Each array element must be an object with exactly these keys: \
media_id, main_topic, hook_transcript, hook_visual_elements, format, format_main_elements, full_transcript.

- media_id must be copied from the manifest below for the file being described.
- A PDF is one carousel post: treat each page as one frame and describe all pages in a single object.
- format is one or two words naming the format style (e.g. \"text-only carousel\"); \
format_main_elements explains that style in one sentence.
- When several posts share a topic or format, use the same name for it so they can be grouped.
- If a transcript is very long, summarize it.

Example: [{\"media_id\": \"17900000000000001\", \"main_topic\": \"...\", \"hook_transcript\": \"...\", \
\"hook_visual_elements\": \"...\", \"format\": \"talking head\", \"format_main_elements\": \"...\", \
\"full_transcript\": \"...\"}]";

/// One line of the file manifest, in attachment order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file_name: String,
    pub media_id: String,
}

/// Full prompt: fixed instructions followed by the numbered manifest.
#[must_use]
pub fn build_analysis_prompt(manifest: &[ManifestEntry]) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str("\n\nAttached files, in order:\n");
    for (idx, entry) in manifest.iter().enumerate() {
        let _ = writeln!(
            prompt,
            "{}. {} -> media_id {}",
            idx + 1,
            entry.file_name,
            entry.media_id
        );
    }
    prompt
}
