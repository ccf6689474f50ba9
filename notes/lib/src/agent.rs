//! Research agent workflow built on top of [`NotesClient`].
//!
//! The agent demonstrates the canonical search-then-create-or-append usage:
//! look for an existing note on a topic, append dated findings to the first
//! match, and fall back to creating a fresh note when nothing is found.

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::client::{note_id, NoteDraft, NotesClient, SearchFilter};

/// Outcome of a single research pass over a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResearchOutcome {
    /// Findings were appended to an existing note.
    Updated {
        /// Id of the note that received the update.
        note_id: String,
    },
    /// A fresh note was created for the topic.
    Created {
        /// Id of the new note, when the server's response exposed one.
        note_id: Option<String>,
    },
    /// Both the append and create paths soft-failed.
    Failed,
}

/// Agent that stores research findings in the Notes system.
#[derive(Debug, Clone)]
pub struct ResearchAgent {
    client: NotesClient,
}

impl ResearchAgent {
    /// Creates an agent over an existing client.
    pub fn new(client: NotesClient) -> Self {
        Self { client }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &NotesClient {
        &self.client
    }

    /// Records findings for a topic.
    ///
    /// Searches by keyword first. When a matching note with an id exists,
    /// the findings are appended under a dated `## Update` heading;
    /// otherwise a new note is created tagged with the topic. Matches
    /// without an id field fall through to the create path rather than
    /// being assumed appendable.
    #[instrument(skip(self, findings), fields(topic = %topic))]
    pub async fn research_topic(&self, topic: &str, findings: &str) -> ResearchOutcome {
        info!("researching topic");

        let filter = SearchFilter::new().keyword(topic);
        let existing = self.client.search_notes(&filter).await;

        if let Some(id) = existing.first().and_then(note_id) {
            info!(note_id = %id, "found existing note, appending update");

            let today = Utc::now().format("%Y-%m-%d");
            let update = format!("\n\n## Update ({today})\n{findings}\n");

            if self.client.append_to_note(&id, &update).await {
                return ResearchOutcome::Updated { note_id: id };
            }
            return ResearchOutcome::Failed;
        }

        if !existing.is_empty() {
            warn!("search hit carries no id field, creating a new note instead");
        }

        let draft = NoteDraft::new(topic, format!("# {topic}\n\n{findings}\n"))
            .tag(topic.to_lowercase().replace(' ', "-"))
            .tag("research");

        match self.client.create_note(&draft).await {
            Some(note) => ResearchOutcome::Created {
                note_id: note_id(&note),
            },
            None => ResearchOutcome::Failed,
        }
    }
}
