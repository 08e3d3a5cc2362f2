//! Drafting phase: one bounded call to the generation service that
//! produces a validated [`Blueprint`] and stores it for confirmation.

use std::time::Instant;

use tracing::{info, warn};
use uuid::Uuid;

use crate::blueprint::Blueprint;
use crate::client::{ChatOptions, ChatRequest, ChatService};
use crate::config::GenerationParams;
use crate::error::DraftError;
use crate::fences;
use crate::prompts;
use crate::store::BlueprintStore;

/// A successful draft: the stored record's id plus the blueprint for
/// confirmation display.
#[derive(Debug)]
pub struct DraftOutcome {
    pub draft_id: Uuid,
    pub blueprint: Blueprint,
}

/// Ask the service for a manifest, validate its shape and size, and store
/// it keyed by session. Rejected drafts never touch the store.
pub async fn draft(
    service: &dyn ChatService,
    store: &BlueprintStore,
    params: &GenerationParams,
    max_files: usize,
    session: &str,
    user_request: &str,
) -> Result<DraftOutcome, DraftError> {
    store.sweep(Instant::now());

    let request = ChatRequest::single(
        params.model.clone(),
        prompts::draft_prompt(user_request, max_files),
        ChatOptions {
            temperature: params.temperature,
            num_predict: params.num_predict,
        },
    );

    info!(
        session,
        model = %params.model,
        prompt_version = prompts::PROMPT_VERSION,
        "drafting blueprint"
    );

    let raw = match tokio::time::timeout(params.deadline, service.chat(request)).await {
        Ok(Ok(content)) => content,
        Ok(Err(e)) => return Err(DraftError::Service(e)),
        Err(_) => return Err(DraftError::Timeout(params.deadline.as_secs())),
    };

    let payload = fences::extract_payload(&raw);
    let blueprint: Blueprint =
        serde_json::from_str(payload).map_err(|e| DraftError::Malformed(e.to_string()))?;

    if blueprint.files.is_empty() {
        return Err(DraftError::Empty);
    }
    if blueprint.files.len() > max_files {
        warn!(
            session,
            designed = blueprint.files.len(),
            max = max_files,
            "draft exceeded file ceiling"
        );
        return Err(DraftError::TooLarge {
            designed: blueprint.files.len(),
            max: max_files,
        });
    }

    let draft_id = store.put(session, blueprint.clone(), Instant::now());
    info!(
        session,
        %draft_id,
        files = blueprint.files.len(),
        project = %blueprint.project_name,
        "blueprint drafted"
    );

    Ok(DraftOutcome { draft_id, blueprint })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;

    use super::*;

    struct CannedService(String);

    #[async_trait]
    impl ChatService for CannedService {
        async fn chat(&self, _request: ChatRequest) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct NeverService;

    #[async_trait]
    impl ChatService for NeverService {
        async fn chat(&self, _request: ChatRequest) -> Result<String> {
            std::future::pending().await
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            model: "test-model".into(),
            temperature: 0.2,
            num_predict: None,
            deadline: Duration::from_secs(60),
        }
    }

    fn store() -> BlueprintStore {
        BlueprintStore::new(Duration::from_secs(3600))
    }

    fn manifest_json(n: usize) -> String {
        let files: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"filepath": "f{i}.py", "description": "part {i}"}}"#))
            .collect();
        format!(
            r#"{{"project_name": "P", "summary": "s", "files": [{}]}}"#,
            files.join(",")
        )
    }

    #[tokio::test]
    async fn valid_draft_is_stored_and_returned() {
        let store = store();
        let service = CannedService(manifest_json(3));
        let out = draft(&service, &store, &params(), 10, "7", "build a thing")
            .await
            .unwrap();
        assert_eq!(out.blueprint.files.len(), 3);
        let confirmed = store.confirm("7", out.draft_id).unwrap();
        assert_eq!(confirmed.project_name, "P");
    }

    #[tokio::test]
    async fn fenced_draft_is_unwrapped() {
        let store = store();
        let service = CannedService(format!("Sure!\n```json\n{}\n```", manifest_json(2)));
        let out = draft(&service, &store, &params(), 10, "7", "x").await.unwrap();
        assert_eq!(out.blueprint.files.len(), 2);
    }

    #[tokio::test]
    async fn oversized_draft_is_rejected_and_not_stored() {
        let store = store();
        let service = CannedService(manifest_json(11));
        let err = draft(&service, &store, &params(), 10, "7", "x").await.unwrap_err();
        match err {
            DraftError::TooLarge { designed, max } => {
                assert_eq!(designed, 11);
                assert_eq!(max, 10);
            }
            other => panic!("expected TooLarge, got {other:?}"),
        }
        assert!(store.get("7").is_none(), "rejected draft populated the store");
    }

    #[tokio::test]
    async fn empty_draft_is_rejected() {
        let store = store();
        let service = CannedService(manifest_json(0));
        let err = draft(&service, &store, &params(), 10, "7", "x").await.unwrap_err();
        assert!(matches!(err, DraftError::Empty));
        assert!(store.get("7").is_none());
    }

    #[tokio::test]
    async fn broken_json_is_malformed() {
        let store = store();
        let service = CannedService("here you go: {not json".into());
        let err = draft(&service, &store, &params(), 10, "7", "x").await.unwrap_err();
        assert!(matches!(err, DraftError::Malformed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out() {
        let store = store();
        let err = draft(&NeverService, &store, &params(), 10, "7", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, DraftError::Timeout(60)));
        assert!(store.get("7").is_none());
    }

    #[tokio::test]
    async fn redraft_overwrites_previous_record() {
        let store = store();
        let first = draft(&CannedService(manifest_json(1)), &store, &params(), 10, "7", "x")
            .await
            .unwrap();
        let second = draft(&CannedService(manifest_json(2)), &store, &params(), 10, "7", "y")
            .await
            .unwrap();

        assert!(matches!(
            store.confirm("7", first.draft_id),
            Err(crate::error::ConfirmError::Expired)
        ));
        assert_eq!(store.confirm("7", second.draft_id).unwrap().files.len(), 2);
    }
}
