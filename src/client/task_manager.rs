//! Client-side task accumulator.
//!
//! Folds the events of one `message/stream` exchange into a running [`Task`]
//! snapshot so every [`ClientEvent::StreamingUpdate`] carries the whole task
//! as seen so far, not just the latest delta.

use tracing::debug;

use crate::error::{A2AError, A2AResult};
use crate::types::{
    ClientEvent, StreamResponse, Task, TaskArtifactUpdateEvent, TaskState, TaskStatus,
    TaskStatusUpdateEvent, TaskUpdate,
};

/// Tracks the task of a single streaming exchange.
#[derive(Debug, Default)]
pub struct ClientTaskManager {
    current_task: Option<Task>,
}

impl ClientTaskManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot accumulated so far, if any task event has been seen.
    pub fn current_task(&self) -> Option<&Task> {
        self.current_task.as_ref()
    }

    /// Apply one stream event and map it to the item the caller sees.
    ///
    /// Direct messages pass through as [`ClientEvent::FinalReply`]. Task
    /// events must all refer to the same task; an event for a different task
    /// id is an invalid agent response.
    pub fn process(&mut self, event: StreamResponse) -> A2AResult<ClientEvent> {
        match event {
            StreamResponse::Message(message) => Ok(ClientEvent::FinalReply(message)),
            StreamResponse::Task(task) => {
                self.check_task_id(&task.id)?;
                debug!(task_id = %task.id, state = %task.status.state, "task snapshot");
                self.current_task = Some(task.clone());
                Ok(ClientEvent::StreamingUpdate(task, None))
            }
            StreamResponse::StatusUpdate(update) => {
                let task = self.apply_status(&update)?;
                Ok(ClientEvent::StreamingUpdate(
                    task,
                    Some(TaskUpdate::Status(update)),
                ))
            }
            StreamResponse::ArtifactUpdate(update) => {
                let task = self.apply_artifact(&update)?;
                Ok(ClientEvent::StreamingUpdate(
                    task,
                    Some(TaskUpdate::Artifact(update)),
                ))
            }
        }
    }

    fn check_task_id(&self, task_id: &str) -> A2AResult<()> {
        match &self.current_task {
            Some(current) if current.id != task_id => Err(A2AError::InvalidJson(format!(
                "stream event for task {task_id} while tracking task {}",
                current.id
            ))),
            _ => Ok(()),
        }
    }

    /// The tracked task, or a fresh `submitted` one for the event's ids.
    fn ensure_task(&mut self, task_id: &str, context_id: &str) -> A2AResult<&mut Task> {
        self.check_task_id(task_id)?;
        Ok(self.current_task.get_or_insert_with(|| {
            debug!(task_id, context_id, "first event for task, creating snapshot");
            Task {
                id: task_id.to_string(),
                context_id: context_id.to_string(),
                kind: "task".to_string(),
                status: TaskStatus::new(TaskState::Submitted),
                artifacts: None,
                history: None,
                metadata: None,
            }
        }))
    }

    fn apply_status(&mut self, event: &TaskStatusUpdateEvent) -> A2AResult<Task> {
        let task = self.ensure_task(&event.task_id, &event.context_id)?;

        debug!(task_id = %task.id, new_state = %event.status.state, "updating task status");

        // The previous status message becomes history.
        if let Some(msg) = task.status.message.take() {
            task.history.get_or_insert_with(Vec::new).push(msg);
        }

        if let Some(event_meta) = event.metadata.as_ref().and_then(|m| m.as_object()) {
            let task_meta = task
                .metadata
                .get_or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if let Some(task_obj) = task_meta.as_object_mut() {
                for (k, v) in event_meta {
                    task_obj.insert(k.clone(), v.clone());
                }
            }
        }

        task.status = event.status.clone();
        Ok(task.clone())
    }

    fn apply_artifact(&mut self, event: &TaskArtifactUpdateEvent) -> A2AResult<Task> {
        let task = self.ensure_task(&event.task_id, &event.context_id)?;
        append_artifact_to_task(task, event);
        Ok(task.clone())
    }
}

/// Apply an artifact update to a task.
///
/// Without `append`, the artifact replaces any artifact with the same id (or
/// is added). With `append`, its parts extend the existing artifact; an
/// append for an unknown artifact id is dropped.
pub fn append_artifact_to_task(task: &mut Task, event: &TaskArtifactUpdateEvent) {
    let artifacts = task.artifacts.get_or_insert_with(Vec::new);
    let new_artifact = &event.artifact;
    let existing = artifacts
        .iter_mut()
        .find(|a| a.artifact_id == new_artifact.artifact_id);

    match (event.append.unwrap_or(false), existing) {
        (false, Some(slot)) => {
            debug!(artifact_id = %new_artifact.artifact_id, "replacing artifact");
            *slot = new_artifact.clone();
        }
        (false, None) => {
            debug!(artifact_id = %new_artifact.artifact_id, "adding artifact");
            artifacts.push(new_artifact.clone());
        }
        (true, Some(slot)) => {
            debug!(artifact_id = %new_artifact.artifact_id, "appending artifact parts");
            slot.parts.extend(new_artifact.parts.iter().cloned());
        }
        (true, None) => {
            debug!(
                artifact_id = %new_artifact.artifact_id,
                "append for unknown artifact, ignoring"
            );
        }
    }
}
