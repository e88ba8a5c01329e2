use k8s_openapi::api::apps::v1::{DaemonSet, ReplicaSet, StatefulSet};
use k8s_openapi::api::core::v1::Pod;
use serde_json::{json, Value};

fn template(app: &str, images: &[&str]) -> Value {
    let containers: Vec<Value> = images
        .iter()
        .enumerate()
        .map(|(i, img)| json!({ "name": format!("c{}", i), "image": img }))
        .collect();
    json!({ "metadata": { "labels": { "app": app } }, "spec": { "containers": containers } })
}

pub fn sts(name: &str, image: &str, replicas: i32, current: i32) -> StatefulSet {
    serde_json::from_value(json!({
        "metadata": { "name": name, "uid": format!("sts-{}", name), "creationTimestamp": "2024-01-01T00:00:00Z" },
        "spec": { "serviceName": name, "selector": {}, "template": template(name, &[image]) },
        "status": { "replicas": replicas, "currentReplicas": current }
    }))
    .unwrap()
}

pub fn ds(name: &str, image: &str, desired: i32, current: i32) -> DaemonSet {
    serde_json::from_value(json!({
        "metadata": { "name": name, "uid": format!("ds-{}", name) },
        "spec": { "selector": {}, "template": template(name, &[image]) },
        "status": {
            "desiredNumberScheduled": desired, "currentNumberScheduled": current,
            "numberMisscheduled": 0, "numberReady": current
        }
    }))
    .unwrap()
}

pub fn rs(name: &str, image: &str, replicas: i32, available: i32, owned: bool) -> ReplicaSet {
    let owners = if owned {
        json!([{ "apiVersion": "apps/v1", "kind": "Deployment", "name": "d", "uid": "dep-1", "controller": true }])
    } else {
        json!([])
    };
    serde_json::from_value(json!({
        "metadata": { "name": name, "uid": format!("rs-{}", name), "ownerReferences": owners },
        "spec": { "selector": {}, "template": template(name, &[image]) },
        "status": { "replicas": replicas, "availableReplicas": available }
    }))
    .unwrap()
}

pub fn pod(app: &str, image: &str, image_id: &str) -> Pod {
    serde_json::from_value(json!({
        "metadata": { "name": format!("{}-0", app), "labels": { "app": app } },
        "status": { "containerStatuses": [{
            "name": "c0", "image": image, "imageID": image_id, "ready": true, "restartCount": 0
        }]}
    }))
    .unwrap()
}
