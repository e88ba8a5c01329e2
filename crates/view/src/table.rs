//! Text projection of rows for a rendering surface.

use chrono::{DateTime, Utc};
use kpanel_core::ViewRow;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Name,
    Image,
    Pods,
    Age,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnSpec {
    pub kind: ColumnKind,
    pub label: &'static str,
    /// Positive = fixed pixels, negative = proportional share.
    pub width: f32,
}

pub fn columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec { kind: ColumnKind::Name, label: "Name", width: 348.0 },
        ColumnSpec { kind: ColumnKind::Image, label: "Image", width: -72.0 },
        ColumnSpec { kind: ColumnKind::Pods, label: "Pods", width: 140.0 },
        ColumnSpec { kind: ColumnKind::Age, label: "Age", width: -28.0 },
    ]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PodsStatus {
    Ready,
    InProgress,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableRow {
    pub uid: String,
    pub name: String,
    pub kind_label: &'static str,
    pub image_text: String,
    pub image_tooltip: Option<String>,
    pub image_id: String,
    pub image_has_details: bool,
    pub pods: String,
    pub pods_status: Option<PodsStatus>,
    pub age: String,
}

/// `"{desired}/{current}"`, empty when nothing is desired.
pub fn pods_text(desired: i32, current: i32) -> String {
    if desired > 0 { format!("{}/{}", desired, current) } else { String::new() }
}

pub fn pods_status(desired: i32, current: i32) -> Option<PodsStatus> {
    if desired <= 0 {
        None
    } else if current >= desired {
        Some(PodsStatus::Ready)
    } else {
        Some(PodsStatus::InProgress)
    }
}

pub fn render_age(created: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(created) = created else { return "-".to_string(); };
    let mut secs = (now - created).num_seconds().max(0) as u64;
    let days = secs / 86_400;
    secs %= 86_400;
    let hours = secs / 3600;
    secs %= 3600;
    let mins = secs / 60;
    secs %= 60;
    if days > 0 {
        format!("{}d{}h", days, hours)
    } else if hours > 0 {
        format!("{}h{}m", hours, mins)
    } else if mins > 0 {
        format!("{}m", mins)
    } else {
        format!("{}s", secs)
    }
}

pub fn table_row<F>(row: &ViewRow, has_details: F, now: DateTime<Utc>) -> TableRow
where
    F: Fn(&str) -> bool,
{
    TableRow {
        uid: row.uid.clone(),
        name: row.name.clone(),
        kind_label: row.kind.label(),
        image_text: row.image_display_text.clone(),
        image_tooltip: row.image_tooltip.clone(),
        image_id: row.image_id.clone(),
        image_has_details: has_details(&row.image_id),
        pods: pods_text(row.desired_count, row.current_count),
        pods_status: pods_status(row.desired_count, row.current_count),
        age: render_age(row.creation_timestamp, now),
    }
}
