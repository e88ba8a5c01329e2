//! Container image helpers used when shaping workload rows.

use k8s_openapi::api::core::v1::{Pod, PodSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use smallvec::SmallVec;

const IMAGE_ID_PREFIXES: [&str; 2] = ["docker-pullable://", "docker://"];

/// Image of the first container, or an empty string.
pub fn first_image_name(spec: Option<&PodSpec>) -> String {
    spec.and_then(|s| s.containers.first())
        .and_then(|c| c.image.clone())
        .unwrap_or_default()
}

/// Display text for the image column plus an optional tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImageText {
    pub text: String,
    pub tooltip: Option<String>,
}

/// With several containers the text names the first image and counts the rest;
/// the tooltip then lists every image.
pub fn image_text(spec: Option<&PodSpec>) -> ImageText {
    let images: SmallVec<[&str; 4]> = spec
        .map(|s| s.containers.iter().filter_map(|c| c.image.as_deref()).collect())
        .unwrap_or_default();
    match images.len() {
        0 => ImageText::default(),
        1 => ImageText { text: images[0].to_string(), tooltip: None },
        n => ImageText {
            text: format!("{} (+{} more)", images[0], n - 1),
            tooltip: Some(images.join(", ")),
        },
    }
}

fn strip_runtime_prefix(id: &str) -> &str {
    IMAGE_ID_PREFIXES
        .iter()
        .find_map(|p| id.strip_prefix(p))
        .unwrap_or(id)
}

fn labels_match(template: &ObjectMeta, pod: &Pod) -> bool {
    let Some(want) = template.labels.as_ref().filter(|l| !l.is_empty()) else { return false; };
    let Some(have) = pod.metadata.labels.as_ref() else { return false; };
    want.iter().all(|(k, v)| have.get(k) == Some(v))
}

/// Resolve the identity of a workload image.
///
/// Looks for a live pod carrying all pod-template labels whose container runs
/// `image_name`, and returns that container's resolved image id (digest).
/// Falls back to `image_name` when nothing matches.
pub fn image_id(image_name: &str, template: Option<&ObjectMeta>, pods: &[Pod]) -> String {
    if image_name.is_empty() {
        return String::new();
    }
    let Some(template) = template else { return image_name.to_string(); };
    for pod in pods.iter().filter(|p| labels_match(template, p)) {
        let statuses = pod
            .status
            .as_ref()
            .and_then(|s| s.container_statuses.as_deref())
            .unwrap_or(&[]);
        if let Some(st) = statuses.iter().find(|st| st.image == image_name && !st.image_id.is_empty()) {
            return strip_runtime_prefix(&st.image_id).to_string();
        }
    }
    image_name.to_string()
}
