//! Context assembly and plain-text rendering of search results
//!
//! The assembled context is what the answer generator sees. It is bounded
//! by a character budget: the body of the last block that fits is cut
//! down, blocks after it are dropped.

use crate::retrieval::ScoredRecord;
use lexdz_common::config::ContextConfig;

/// Context used when retrieval returned nothing
pub const EMPTY_CONTEXT: &str = "Aucune information trouvée dans la base de données juridique.";

/// Separator between record blocks
pub const BLOCK_SEPARATOR: &str = "\n---\n";

const ELLIPSIS: &str = "...";
const UNCATEGORIZED: &str = "Non classé";

/// Reply used by the plain renderer when nothing matched
pub const NO_RESULTS_HELP: &str = "Je n'ai pas trouvé d'information correspondant à votre recherche dans le Code pénal algérien.

💡 Essayez avec des termes comme :
• Vol, meurtre, escroquerie
• Coups et blessures
• Faux témoignage
• Corruption, drogue";

const RESULT_SEPARATOR: &str = "\n━━━━━━━━━━━━━━━━━━━━━\n";

/// Builds the grounding context for the answer generator
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    /// Body excerpt length per record, in characters
    pub excerpt_chars: usize,
    /// Budget for the whole context, in characters
    pub max_chars: usize,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self {
            excerpt_chars: 500,
            max_chars: 6000,
        }
    }
}

impl From<&ContextConfig> for ContextAssembler {
    fn from(config: &ContextConfig) -> Self {
        Self {
            excerpt_chars: config.excerpt_chars,
            max_chars: config.max_chars,
        }
    }
}

impl ContextAssembler {
    pub fn new(excerpt_chars: usize, max_chars: usize) -> Self {
        Self {
            excerpt_chars,
            max_chars,
        }
    }

    /// Render ranked records into one bounded text block
    pub fn assemble(&self, records: &[ScoredRecord]) -> String {
        if records.is_empty() {
            return EMPTY_CONTEXT.to_string();
        }

        let separator_len = BLOCK_SEPARATOR.chars().count();
        let mut out = String::new();
        let mut used = 0usize;

        for (i, scored) in records.iter().enumerate() {
            let sep = if i == 0 { 0 } else { separator_len };
            if used + sep >= self.max_chars {
                break;
            }
            let room = self.max_chars - used - sep;

            let header = block_header(scored);
            let header_len = header.chars().count();
            let excerpt = excerpt(&scored.record.body, self.excerpt_chars);
            let block_len = header_len + excerpt.chars().count();

            if block_len <= room {
                if i > 0 {
                    out.push_str(BLOCK_SEPARATOR);
                }
                out.push_str(&header);
                out.push_str(&excerpt);
                used += sep + block_len;
                continue;
            }

            // Last block: its body is shortened, never left out
            if header_len < room {
                if i > 0 {
                    out.push_str(BLOCK_SEPARATOR);
                }
                out.push_str(&header);
                out.push_str(&excerpt_within(&scored.record.body, self.excerpt_chars, room - header_len));
            } else if i == 0 {
                out.push_str(&compact_block(scored, self.excerpt_chars, room));
            }
            break;
        }

        out
    }
}

fn block_header(scored: &ScoredRecord) -> String {
    let record = &scored.record;
    let category = if record.category.trim().is_empty() {
        UNCATEGORIZED
    } else {
        record.category.as_str()
    };

    format!(
        "Article: {}\nCatégorie: {}\nPeine: {}\nAmende: {}\nTexte: ",
        record.label, category, scored.penalty.custodial_term, scored.penalty.fine
    )
}

/// Label and body only, for a budget too small for the full header
fn compact_block(scored: &ScoredRecord, excerpt_chars: usize, room: usize) -> String {
    let prefix = format!("{}: ", scored.record.label);
    let prefix_len = prefix.chars().count();
    if prefix_len < room {
        prefix + &excerpt_within(&scored.record.body, excerpt_chars, room - prefix_len)
    } else {
        excerpt_within(&scored.record.body, excerpt_chars, room)
    }
}

fn take_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

/// Body capped at `limit` characters, with an ellipsis when cut
pub fn excerpt(body: &str, limit: usize) -> String {
    if body.chars().count() <= limit {
        return body.to_string();
    }
    let mut out = take_chars(body, limit);
    out.push_str(ELLIPSIS);
    out
}

/// Excerpt that also fits in `room` characters, ellipsis included
fn excerpt_within(body: &str, limit: usize, room: usize) -> String {
    let full = excerpt(body, limit);
    if full.chars().count() <= room {
        return full;
    }
    let ellipsis_len = ELLIPSIS.len();
    if room <= ellipsis_len {
        return take_chars(body, room);
    }
    let mut out = take_chars(body, room - ellipsis_len);
    out.push_str(ELLIPSIS);
    out
}

/// Relevance badge for a score
pub fn relevance_label(score: f32) -> &'static str {
    if score > 0.7 {
        "🟢 Très pertinent"
    } else if score > 0.4 {
        "🟡 Pertinent"
    } else {
        "🟠 Partiellement pertinent"
    }
}

/// Human-readable reply built from the results alone, without a language model
pub fn render_plain(records: &[ScoredRecord], excerpt_chars: usize) -> String {
    if records.is_empty() {
        return NO_RESULTS_HELP.to_string();
    }

    let parts: Vec<String> = records
        .iter()
        .map(|scored| {
            let record = &scored.record;
            let category = if record.category.trim().is_empty() {
                UNCATEGORIZED
            } else {
                record.category.as_str()
            };

            let mut part = format!(
                "⚖️ **{}**\n\n📂 Catégorie: {}\n\n🔒 **Sanctions:**\n• Prison: {}",
                record.label, category, scored.penalty.custodial_term
            );
            if scored.penalty.has_fine() {
                part.push_str(&format!("\n• Amende: {}", scored.penalty.fine));
            }
            part.push_str(&format!("\n\n📝 {}", excerpt(&record.body, excerpt_chars)));
            part.push_str(&format!("\n\n{}", relevance_label(scored.score)));
            part
        })
        .collect();

    parts.join(RESULT_SEPARATOR)
}
