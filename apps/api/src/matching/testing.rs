//! In-memory doubles for the model server and the storage collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{LanguageModel, LlmError};
use crate::matching::interpreter::HeuristicInterpreter;
use crate::matching::orchestrator::{MatchingConfig, MatchingService};
use crate::models::experience::{WorkExperienceRecord, WorkExperienceRow};
use crate::store::{AccountStore, ExperienceStore, PostingStore, ResumeStore, Stores};

pub const CONFIGURED_MODEL: &str = "deepseek-r1:1.5b";

#[derive(Default)]
struct ModelState {
    prompts: Vec<String>,
    listing_calls: usize,
}

/// Model server that lists a fixed model and answers every prompt the same way.
/// A `None` reply simulates a backend that times out.
#[derive(Clone)]
pub struct ScriptedModel {
    loaded: String,
    reply: Option<String>,
    state: Arc<Mutex<ModelState>>,
}

impl ScriptedModel {
    pub fn replying(loaded: &str, reply: &str) -> Self {
        Self {
            loaded: loaded.to_string(),
            reply: Some(reply.to_string()),
            state: Arc::default(),
        }
    }

    pub fn timing_out(loaded: &str) -> Self {
        Self {
            loaded: loaded.to_string(),
            reply: None,
            state: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.state.lock().unwrap().prompts.clone()
    }

    pub fn listing_calls(&self) -> usize {
        self.state.lock().unwrap().listing_calls
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn list_models(&self) -> Result<Vec<String>, LlmError> {
        self.state.lock().unwrap().listing_calls += 1;
        match self.reply {
            Some(_) => Ok(vec![self.loaded.clone()]),
            None => Err(LlmError::Timeout),
        }
    }

    async fn chat(&self, _model: &str, prompt: &str) -> Result<String, LlmError> {
        self.state.lock().unwrap().prompts.push(prompt.to_string());
        self.reply.clone().ok_or(LlmError::Timeout)
    }
}

#[derive(Default)]
struct StoreState {
    experiences: Vec<WorkExperienceRow>,
    insert_batches: usize,
    users: HashMap<String, Option<String>>,
    postings: HashMap<i64, String>,
    files: HashMap<String, Vec<u8>>,
}

/// One in-memory store standing in for PostgreSQL and S3.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn with_user(self, username: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .users
            .insert(username.to_string(), None);
        self
    }

    pub fn with_posting(self, posting_id: i64, description: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .postings
            .insert(posting_id, description.to_string());
        self
    }

    pub fn with_resume(self, username: &str, path: &str, bytes: &[u8]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .users
                .insert(username.to_string(), Some(path.to_string()));
            state.files.insert(path.to_string(), bytes.to_vec());
        }
        self
    }

    pub fn experiences_for(&self, username: &str) -> Vec<WorkExperienceRow> {
        self.state
            .lock()
            .unwrap()
            .experiences
            .iter()
            .filter(|r| r.username == username)
            .cloned()
            .collect()
    }

    pub fn insert_batches(&self) -> usize {
        self.state.lock().unwrap().insert_batches
    }

    pub fn resume_path_of(&self, username: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .users
            .get(username)
            .cloned()
            .flatten()
    }
}

#[async_trait]
impl ExperienceStore for MemoryStore {
    async fn insert_all(
        &self,
        username: &str,
        records: &[WorkExperienceRecord],
    ) -> Result<Vec<WorkExperienceRow>, AppError> {
        let rows: Vec<_> = records
            .iter()
            .map(|r| WorkExperienceRow {
                id: Uuid::new_v4(),
                username: username.to_string(),
                job_title: r.job_title.clone(),
                company_name: r.company_name.clone(),
                location: r.location.clone(),
                duration: r.duration.clone(),
                description: r.description.clone(),
                skills: Some(r.skills.clone()),
                created_at: Utc::now(),
            })
            .collect();
        let mut state = self.state.lock().unwrap();
        state.insert_batches += 1;
        state.experiences.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn list(&self, username: &str) -> Result<Vec<WorkExperienceRow>, AppError> {
        Ok(self.experiences_for(username))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn resume_path(&self, username: &str) -> Result<Option<String>, AppError> {
        Ok(self.resume_path_of(username))
    }

    async fn set_resume_path(&self, username: &str, path: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        match state.users.get_mut(username) {
            Some(slot) => {
                *slot = Some(path.to_string());
                Ok(())
            }
            None => Err(AppError::NotFound(format!("User {username} not found"))),
        }
    }
}

#[async_trait]
impl PostingStore for MemoryStore {
    async fn job_description(&self, posting_id: i64) -> Result<Option<String>, AppError> {
        Ok(self.state.lock().unwrap().postings.get(&posting_id).cloned())
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn put(&self, username: &str, extension: &str, bytes: Bytes) -> Result<String, AppError> {
        let path = format!("resumes/{username}/{}.{extension}", Uuid::new_v4());
        self.state
            .lock()
            .unwrap()
            .files
            .insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::Storage(format!("no object at {path}")))
    }
}

impl MemoryStore {
    pub fn stores(&self) -> Stores {
        Stores {
            experiences: Arc::new(self.clone()),
            accounts: Arc::new(self.clone()),
            postings: Arc::new(self.clone()),
            resumes: Arc::new(self.clone()),
        }
    }
}

/// A service configured for `CONFIGURED_MODEL`, wired to the given doubles.
pub fn service_with(model: ScriptedModel, store: MemoryStore) -> (MatchingService, MemoryStore) {
    let service = MatchingService::new(
        Arc::new(model),
        Arc::new(HeuristicInterpreter),
        store.stores(),
        MatchingConfig {
            model: CONFIGURED_MODEL.to_string(),
        },
    );
    (service, store)
}
