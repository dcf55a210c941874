//! Resource loaders used by tab content
//!
//! Each resource type owns a namespace in [`ResourceKey`] and a cache. The
//! producers only run when the cache has neither a value nor a load in flight.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use ralph_cache::{ResourceCache, ResourceKey};

use crate::transport::{invoke_as, Transport};

const CROPPED_IMAGE: &str = "cropped-image";
const MODEL_FORM_TREE: &str = "model-form-tree";

/// Region of a discipline image, in source pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl fmt::Display for CropBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOption {
    pub name: String,
    pub display: String,
    pub description: String,
    pub session_model: Option<String>,
    #[serde(default)]
    pub effort_options: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderModels {
    agent: String,
    models: Vec<ModelOption>,
}

#[derive(Debug, Deserialize)]
struct ModelFormTreeResponse {
    providers: Vec<ProviderModels>,
}

/// Model options keyed by agent name
pub type ModelFormTree = BTreeMap<String, Vec<ModelOption>>;

pub struct Resources {
    transport: Arc<dyn Transport>,
    images: ResourceCache<ResourceKey, String>,
    model_trees: ResourceCache<ResourceKey, ModelFormTree>,
}

impl Resources {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            images: ResourceCache::new(),
            model_trees: ResourceCache::new(),
        }
    }

    pub fn cropped_image_key(discipline: &str, label: &str, crop: CropBox) -> ResourceKey {
        ResourceKey::new(CROPPED_IMAGE)
            .with(discipline)
            .with(label)
            .with(crop)
    }

    /// Cropped discipline image as a `data:` URL
    pub async fn cropped_image(
        &self,
        discipline: &str,
        label: &str,
        crop: CropBox,
    ) -> ralph_cache::Result<String> {
        let key = Self::cropped_image_key(discipline, label, crop);
        let transport = Arc::clone(&self.transport);
        let args = json!({ "name": discipline, "crop": crop, "label": label });

        self.images
            .get(key, move || async move {
                let encoded: Option<String> =
                    invoke_as(transport.as_ref(), "get_cropped_image", args).await?;
                match encoded {
                    Some(b64) if !b64.is_empty() => Ok(format!("data:image/png;base64,{}", b64)),
                    // Not cached, so a later render asks again
                    _ => anyhow::bail!("Backend returned no image"),
                }
            })
            .await
    }

    /// Cached image, for rendering before any load completes
    pub fn peek_cropped_image(&self, discipline: &str, label: &str, crop: CropBox) -> Option<String> {
        self.images
            .peek(&Self::cropped_image_key(discipline, label, crop))
    }

    /// Agent/model options offered by the terminal bridge
    pub async fn model_form_tree(&self) -> ralph_cache::Result<ModelFormTree> {
        let transport = Arc::clone(&self.transport);

        self.model_trees
            .get(ResourceKey::new(MODEL_FORM_TREE), move || async move {
                let response: ModelFormTreeResponse = invoke_as(
                    transport.as_ref(),
                    "terminal_bridge_list_model_form_tree",
                    serde_json::Value::Null,
                )
                .await?;
                Ok(group_models_by_agent(response.providers))
            })
            .await
    }

    /// Drop the cached model tree so the next request refetches it
    pub fn invalidate_model_form_tree(&self) -> bool {
        self.model_trees
            .invalidate(&ResourceKey::new(MODEL_FORM_TREE))
    }
}

fn group_models_by_agent(providers: Vec<ProviderModels>) -> ModelFormTree {
    providers
        .into_iter()
        .map(|provider| (provider.agent, provider.models))
        .collect()
}

impl Clone for Resources {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            images: self.images.clone(),
            model_trees: self.model_trees.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    const CROP: CropBox = CropBox {
        x: 0,
        y: 8,
        w: 64,
        h: 64,
    };

    fn resources() -> (Arc<MockTransport>, Resources) {
        let transport = Arc::new(MockTransport::default());
        let resources = Resources::new(transport.clone());
        (transport, resources)
    }

    fn model(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "display": name.to_uppercase(),
            "description": "",
            "sessionModel": null,
            "effortOptions": ["low", "medium", "high"]
        })
    }

    #[tokio::test]
    async fn test_cropped_image_is_fetched_once() {
        let (transport, resources) = resources();
        transport.respond("get_cropped_image", json!("iVBORw0KGgo="));

        let (a, b) = tokio::join!(
            resources.cropped_image("backend", "hero", CROP),
            resources.cropped_image("backend", "hero", CROP),
        );
        assert_eq!(a.unwrap(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(b.unwrap(), "data:image/png;base64,iVBORw0KGgo=");
        assert_eq!(transport.calls("get_cropped_image"), 1);
        assert_eq!(
            transport.last_args("get_cropped_image").unwrap(),
            json!({ "name": "backend", "label": "hero", "crop": { "x": 0, "y": 8, "w": 64, "h": 64 } })
        );

        resources
            .cropped_image("backend", "hero", CROP)
            .await
            .unwrap();
        assert_eq!(transport.calls("get_cropped_image"), 1);
        assert!(resources.peek_cropped_image("backend", "hero", CROP).is_some());
    }

    #[tokio::test]
    async fn test_distinct_crops_are_distinct_resources() {
        let (transport, resources) = resources();
        transport.respond("get_cropped_image", json!("AAAA"));

        resources.cropped_image("backend", "hero", CROP).await.unwrap();
        resources
            .cropped_image("backend", "hero", CropBox { w: 32, ..CROP })
            .await
            .unwrap();
        resources.cropped_image("frontend", "hero", CROP).await.unwrap();
        assert_eq!(transport.calls("get_cropped_image"), 3);
    }

    #[tokio::test]
    async fn test_missing_image_is_retried() {
        let (transport, resources) = resources();
        transport.respond("get_cropped_image", serde_json::Value::Null);

        assert!(resources.cropped_image("backend", "hero", CROP).await.is_err());
        assert!(resources.peek_cropped_image("backend", "hero", CROP).is_none());

        transport.respond("get_cropped_image", json!("AAAA"));
        assert!(resources.cropped_image("backend", "hero", CROP).await.is_ok());
        assert_eq!(transport.calls("get_cropped_image"), 2);
    }

    #[tokio::test]
    async fn test_model_form_tree_groups_by_agent() {
        let (transport, resources) = resources();
        transport.respond(
            "terminal_bridge_list_model_form_tree",
            json!({
                "providers": [
                    { "agent": "claude", "models": [model("sonnet"), model("opus")] },
                    { "agent": "codex", "models": [model("gpt-5")] }
                ]
            }),
        );

        let tree = resources.model_form_tree().await.unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree["claude"][1].name, "opus");
        assert_eq!(tree["codex"][0].effort_options, vec!["low", "medium", "high"]);

        resources.model_form_tree().await.unwrap();
        assert_eq!(transport.calls("terminal_bridge_list_model_form_tree"), 1);

        assert!(resources.invalidate_model_form_tree());
        resources.model_form_tree().await.unwrap();
        assert_eq!(transport.calls("terminal_bridge_list_model_form_tree"), 2);
    }
}
