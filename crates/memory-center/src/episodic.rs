//! Episodic memory: one immutable record per completed run.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// A completed goal run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub task_prompt: String,
    pub outcome: String,
    pub success: bool,
    pub duration_ms: u64,
    pub tools_used: Vec<String>,
    pub step_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl Episode {
    pub fn new(
        task_prompt: impl Into<String>,
        outcome: impl Into<String>,
        success: bool,
        duration_ms: u64,
        tools_used: Vec<String>,
        step_count: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_prompt: task_prompt.into(),
            outcome: outcome.into(),
            success,
            duration_ms,
            tools_used,
            step_count,
            tags: Vec::new(),
            importance: None,
            recorded_at: Utc::now(),
        }
    }

    /// One-line rendering for enriched context.
    pub fn snippet(&self) -> String {
        format!(
            "[episode] \"{}\" -> {} ({} steps): {}",
            self.task_prompt,
            if self.success { "ok" } else { "failed" },
            self.step_count,
            self.outcome
        )
    }
}

/// Append-only in-memory episode store with optional JSON-lines persistence.
#[derive(Debug, Default)]
pub struct EpisodeStore {
    episodes: Vec<Episode>,
    log_path: Option<PathBuf>,
}

impl EpisodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an append-only log file; existing entries are loaded.
    pub fn with_log(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            episodes: Vec::new(),
            log_path: Some(path.clone()),
        };
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => {
                    for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                        match serde_json::from_str::<Episode>(line) {
                            Ok(episode) => store.episodes.push(episode),
                            Err(err) => warn!(error = %err, "skipping malformed episode entry"),
                        }
                    }
                }
                Err(err) => warn!(error = %err, "failed to read episode log"),
            }
        }
        store
    }

    /// Record an episode; persistence is fire-and-forget.
    pub fn record(&mut self, episode: Episode) {
        if let Some(path) = self.log_path.as_ref() {
            if let Err(err) = append_line(path, &episode) {
                warn!(error = %err, "episode persistence failed; in-memory state is authoritative");
            }
        }
        self.episodes.push(episode);
    }

    pub fn all(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }
}

fn append_line(path: &PathBuf, episode: &Episode) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(episode)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    writeln!(file, "{json}")
}
