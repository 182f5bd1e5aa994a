//! Skill memory: named reusable action sequences.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A reusable action sequence with its historical success rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub description: String,
    pub action_sequence: Vec<String>,
    pub success_rate: f64,
    pub execution_count: u64,
}

impl Skill {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        action_sequence: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            action_sequence,
            success_rate: 0.0,
            execution_count: 0,
        }
    }

    /// Fold one execution result into the running success rate.
    pub fn record_execution(&mut self, success: bool) {
        let successes = self.success_rate * self.execution_count as f64;
        self.execution_count += 1;
        self.success_rate =
            (successes + if success { 1.0 } else { 0.0 }) / self.execution_count as f64;
    }

    pub fn snippet(&self) -> String {
        format!(
            "[skill] {}: {} ({} actions, {:.0}% success)",
            self.name,
            self.description,
            self.action_sequence.len(),
            self.success_rate * 100.0
        )
    }
}

/// Skills keyed by unique name, with optional JSON persistence.
#[derive(Debug, Default)]
pub struct SkillStore {
    skills: HashMap<String, Skill>,
    store_path: Option<PathBuf>,
}

impl SkillStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a keyed JSON store; existing skills are loaded.
    pub fn with_store(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            skills: HashMap::new(),
            store_path: Some(path.clone()),
        };
        if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<Vec<Skill>>(&contents) {
                    Ok(skills) => {
                        for skill in skills {
                            store.skills.insert(skill.name.clone(), skill);
                        }
                    }
                    Err(err) => warn!(error = %err, "skill store malformed; starting empty"),
                },
                Err(err) => warn!(error = %err, "failed to read skill store"),
            }
        }
        store
    }

    /// Insert or replace by name; persistence is fire-and-forget.
    pub fn upsert(&mut self, skill: Skill) {
        self.skills.insert(skill.name.clone(), skill);
        self.persist();
    }

    pub fn get(&self, name: &str) -> Option<&Skill> {
        self.skills.get(name)
    }

    pub fn record_execution(&mut self, name: &str, success: bool) {
        if let Some(skill) = self.skills.get_mut(name) {
            skill.record_execution(success);
            self.persist();
        }
    }

    /// All skills, sorted by name for deterministic iteration.
    pub fn all(&self) -> Vec<&Skill> {
        let mut skills: Vec<&Skill> = self.skills.values().collect();
        skills.sort_by(|a, b| a.name.cmp(&b.name));
        skills
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    fn persist(&self) {
        let Some(path) = self.store_path.as_ref() else {
            return;
        };
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let skills = self.all().into_iter().cloned().collect::<Vec<_>>();
            let json = serde_json::to_vec_pretty(&skills)
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
            fs::write(path, json)
        })();
        if let Err(err) = result {
            warn!(error = %err, "skill persistence failed; in-memory state is authoritative");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_running_average() {
        let mut skill = Skill::new("search", "type and submit", vec!["type".into(), "press".into()]);
        skill.record_execution(true);
        skill.record_execution(true);
        skill.record_execution(false);
        assert_eq!(skill.execution_count, 3);
        assert!((skill.success_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_names_are_unique() {
        let mut store = SkillStore::new();
        store.upsert(Skill::new("login", "v1", vec![]));
        store.upsert(Skill::new("login", "v2", vec![]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("login").unwrap().description, "v2");
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skills.json");

        let mut store = SkillStore::with_store(&path);
        let mut skill = Skill::new("search", "type and submit", vec!["type".into()]);
        skill.record_execution(true);
        store.upsert(skill);

        let reloaded = SkillStore::with_store(&path);
        assert_eq!(reloaded.len(), 1);
        assert!((reloaded.get("search").unwrap().success_rate - 1.0).abs() < f64::EPSILON);
    }
}
