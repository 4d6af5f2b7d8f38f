// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task Templater (C7): statically registered `(name, resource -> Task?)`
//! templates, applied in registration order.

pub use ch_adapters::ExecutionResult;

use std::collections::HashMap;

use ch_core::{ExecutionStrategy, Resource, Task};

/// Default timeout stamped on every template-produced task (48h).
pub const DEFAULT_TASK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(48 * 3600);

pub type TemplateFn = fn(&Resource, &TemplateConfig) -> Option<Task>;

pub struct Template {
    pub name: &'static str,
    pub create: TemplateFn,
}

/// Per-template mirror bucket/prefix and image overrides, env-driven in
/// production (`CH_TEMPLATE_<NAME>_MIRROR_BUCKET` etc.).
#[derive(Clone, Debug, Default)]
pub struct TemplateConfig {
    pub mov_mirror_bucket: String,
    pub mov_mirror_prefix: String,
    pub mp4_mirror_bucket: String,
    pub mp4_mirror_prefix: String,
    pub nui_mirror_bucket: String,
    pub nui_mirror_prefix: String,
    pub nui_image: String,
    pub metadata_bucket: String,
    pub metadata_prefix: String,
}

impl TemplateConfig {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            mov_mirror_bucket: var("CH_TEMPLATE_MOV_MIRROR_BUCKET"),
            mov_mirror_prefix: var("CH_TEMPLATE_MOV_MIRROR_PREFIX"),
            mp4_mirror_bucket: var("CH_TEMPLATE_MP4_MIRROR_BUCKET"),
            mp4_mirror_prefix: var("CH_TEMPLATE_MP4_MIRROR_PREFIX"),
            nui_mirror_bucket: var("CH_TEMPLATE_NUI_MIRROR_BUCKET"),
            nui_mirror_prefix: var("CH_TEMPLATE_NUI_MIRROR_PREFIX"),
            nui_image: var("CH_TEMPLATE_NUI_IMAGE"),
            metadata_bucket: var("CH_TEMPLATE_LOGGING_BUCKET"),
            metadata_prefix: var("CH_TEMPLATE_LOGGING_PREFIX"),
        }
    }
}

fn lowercase_ext(resource: &Resource) -> String {
    resource.path().rsplit_once('.').map(|(_, ext)| ext.to_lowercase()).unwrap_or_default()
}

fn mirrored_output(resource: &Resource, mirror_bucket: &str, mirror_prefix: &str) -> Resource {
    let joined = format!("{}/{}{}", mirror_prefix.trim_end_matches('/'), resource.host(), resource.path());
    Resource::new(format!("s3://{mirror_bucket}/{}/", joined.trim_start_matches('/')))
}

fn metadata_resource(cfg: &TemplateConfig) -> Resource {
    Resource::new(format!("s3://{}/{}", cfg.metadata_bucket, cfg.metadata_prefix.trim_start_matches('/')))
}

fn docker_task(input: Resource, output: Resource, hooks: &str, image: impl Into<String>, metadata: Resource) -> Task {
    let mut t = Task::new(input, output, ExecutionStrategy::docker(image), hooks, DEFAULT_TASK_TIMEOUT, "");
    t.metadata = Some(metadata);
    t
}

/// `.mov` files mirror into `CH_TEMPLATE_MOV_MIRROR_BUCKET`, processed by
/// a pinned converter image.
pub fn mov_template(resource: &Resource, cfg: &TemplateConfig) -> Option<Task> {
    if lowercase_ext(resource) != "mov" {
        return None;
    }
    let output = mirrored_output(resource, &cfg.mov_mirror_bucket, &cfg.mov_mirror_prefix);
    Some(docker_task(resource.clone(), output, "mov", "jnkroeker/mov_converter:0.7", metadata_resource(cfg)))
}

/// `.mp4` files mirror analogously, processed by the pinned mp4 image.
pub fn mp4_template(resource: &Resource, cfg: &TemplateConfig) -> Option<Task> {
    if lowercase_ext(resource) != "mp4" {
        return None;
    }
    let output = mirrored_output(resource, &cfg.mp4_mirror_bucket, &cfg.mp4_mirror_prefix);
    Some(docker_task(resource.clone(), output, "mp4", "jnkroeker/mp4_processor:0.1.0", metadata_resource(cfg)))
}

/// `.nui` (MIE4NITF) files. No image tag is pinned upstream, so it is
/// sourced from `CH_TEMPLATE_NUI_IMAGE` and deployments configure it
/// explicitly.
pub fn nui_template(resource: &Resource, cfg: &TemplateConfig) -> Option<Task> {
    if lowercase_ext(resource) != "nui" {
        return None;
    }
    let output = mirrored_output(resource, &cfg.nui_mirror_bucket, &cfg.nui_mirror_prefix);
    Some(docker_task(resource.clone(), output, "mie4nitf", cfg.nui_image.clone(), metadata_resource(cfg)))
}

/// Applies every registered template in order, stamping `version` on
/// whatever tasks are produced.
pub struct TaskTemplater {
    templates: Vec<Template>,
    config: TemplateConfig,
    version: String,
}

impl TaskTemplater {
    pub fn new(templates: Vec<Template>, config: TemplateConfig, version: impl Into<String>) -> Self {
        Self { templates, config, version: version.into() }
    }

    /// The canonical registration: mov, mp4, nui in that order, matching
    /// `internal/tasker/template/templates.go`'s dispatch list.
    pub fn with_canonical_templates(config: TemplateConfig, version: impl Into<String>) -> Self {
        Self::new(
            vec![
                Template { name: "mov", create: mov_template },
                Template { name: "mp4", create: mp4_template },
                Template { name: "nui", create: nui_template },
            ],
            config,
            version,
        )
    }

    pub fn create(&self, resource: &Resource) -> Vec<Task> {
        let mut tasks = Vec::new();
        for template in &self.templates {
            if let Some(mut task) = (template.create)(resource, &self.config) {
                task.version = self.version.clone();
                tasks.push(task);
            }
        }
        tasks
    }
}

#[cfg(test)]
#[path = "templater_tests.rs"]
mod tests;
