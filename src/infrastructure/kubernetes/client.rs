// Copyright 2025 The Spoditor Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::shared::error::SpoditorError;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client};

/// Read-only cluster access for the preview and mutate commands.
#[async_trait::async_trait]
pub trait SpoditorKubeClient: Send + Sync {
    async fn get_statefulset(&self, name: &str) -> Result<StatefulSet, SpoditorError>;

    async fn get_pod(&self, name: &str) -> Result<Pod, SpoditorError>;
}

pub struct SpoditorKubeClientImpl {
    client: Client,
    namespace: String,
}

impl SpoditorKubeClientImpl {
    pub async fn new(namespace: String) -> Result<Self, SpoditorError> {
        let client = Client::try_default().await.map_err(|e| {
            SpoditorError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    pub async fn new_with_config(
        namespace: String,
        kubeconfig_path: Option<String>,
        context: Option<String>,
    ) -> Result<Self, SpoditorError> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        if kubeconfig_path.is_none() && context.is_none() {
            return Self::new(namespace).await;
        }

        let kubeconfig = if let Some(path) = kubeconfig_path {
            Kubeconfig::read_from(path).map_err(|e| {
                SpoditorError::KubeError(format!("Failed to load kubeconfig: {}", e))
            })?
        } else {
            Kubeconfig::read().map_err(|e| {
                SpoditorError::KubeError(format!("Failed to load kubeconfig: {}", e))
            })?
        };

        let config_options = KubeConfigOptions {
            context,
            cluster: None,
            user: None,
        };

        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &config_options)
            .await
            .map_err(|e| {
                SpoditorError::KubeError(format!("Failed to create Kubernetes config: {}", e))
            })?;

        let client = Client::try_from(config).map_err(|e| {
            SpoditorError::KubeError(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client, namespace })
    }

    fn map_get_error(&self, err: kube::Error, resource_type: &str, name: &str) -> SpoditorError {
        match err {
            kube::Error::Api(ae) if ae.code == 404 => {
                SpoditorError::not_found(resource_type, name, &self.namespace)
            }
            kube::Error::Api(ae) => SpoditorError::KubeError(ae.message),
            e => SpoditorError::KubeError(e.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl SpoditorKubeClient for SpoditorKubeClientImpl {
    async fn get_statefulset(&self, name: &str) -> Result<StatefulSet, SpoditorError> {
        let api: Api<StatefulSet> = Api::namespaced(self.client.clone(), &self.namespace);
        tracing::debug!(name, namespace = %self.namespace, "fetching StatefulSet");
        api.get(name)
            .await
            .map_err(|e| self.map_get_error(e, "StatefulSet", name))
    }

    async fn get_pod(&self, name: &str) -> Result<Pod, SpoditorError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        tracing::debug!(name, namespace = %self.namespace, "fetching Pod");
        api.get(name)
            .await
            .map_err(|e| self.map_get_error(e, "Pod", name))
    }
}
