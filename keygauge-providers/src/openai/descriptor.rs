//! OpenAI provider descriptor.

use std::sync::Arc;

use keygauge_core::{LimitStrategy, ProviderKind};
use keygauge_fetch::{FetchError, ProviderSettings, ProviderTask};

use super::api::{DEFAULT_BASE_URL, DEFAULT_REQUEST_PAUSE, OpenAiApi};
use super::task::OpenAiTask;
use crate::descriptor::{FetchPlan, ProviderDescriptor, ProviderMetadata};

/// Describes the provider and how its keys are fetched.
pub fn openai_descriptor() -> ProviderDescriptor {
    ProviderDescriptor {
        id: ProviderKind::OpenAi,
        metadata: ProviderMetadata {
            display_name: "OpenAI",
            credential_hint: "Project API keys, plus an organization admin key",
            default_base_url: DEFAULT_BASE_URL,
            dashboard_url: Some("https://platform.openai.com/usage"),
            requires_admin_credential: true,
        },
        fetch_plan: FetchPlan {
            limit_strategy: LimitStrategy::CostProportional,
            build_task: build_openai_task,
        },
    }
}

fn build_openai_task(settings: &ProviderSettings) -> Result<Arc<dyn ProviderTask>, FetchError> {
    let admin = settings.admin_credential.clone().ok_or_else(|| {
        FetchError::Config("openai requires an admin credential".to_string())
    })?;
    let api = OpenAiApi::new(
        settings.base_url_or(DEFAULT_BASE_URL),
        admin,
        settings.request_pause.unwrap_or(DEFAULT_REQUEST_PAUSE),
    );

    Ok(Arc::new(OpenAiTask::new(
        Arc::new(api),
        settings.credentials.as_slice().to_vec(),
        settings.retry.clone(),
    )))
}
