use serde::Deserialize;

use super::CaptureError;
use crate::geometry::Rect;
use crate::picker::WindowDescriptor;

#[derive(Deserialize)]
struct ActiveWorkspaceStatus {
    id: Option<i32>,
    #[serde(default)]
    monitor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ActiveWorkspace {
    pub(super) id: i32,
    pub(super) monitor: Option<String>,
}

#[derive(Deserialize)]
struct MonitorStatus {
    #[serde(default)]
    focused: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    x: Option<i32>,
    #[serde(default)]
    y: Option<i32>,
    #[serde(default)]
    width: Option<i32>,
    #[serde(default)]
    height: Option<i32>,
    #[serde(default)]
    scale: Option<f64>,
    #[serde(default)]
    transform: Option<i32>,
}

#[derive(Deserialize)]
struct WindowClientStatus {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    mapped: Option<bool>,
    #[serde(default)]
    hidden: Option<bool>,
    #[serde(default)]
    floating: Option<bool>,
    #[serde(default)]
    at: Option<[i32; 2]>,
    #[serde(default)]
    size: Option<[i32; 2]>,
    #[serde(default)]
    workspace: Option<WorkspaceStatus>,
    #[serde(default, rename = "creationTimestamp")]
    creation_timestamp: Option<i64>,
}

#[derive(Deserialize)]
struct WorkspaceStatus {
    #[serde(default)]
    id: Option<i32>,
}

pub(super) fn parse_active_workspace(workspace_json: &str) -> Result<ActiveWorkspace, CaptureError> {
    let workspace: ActiveWorkspaceStatus = serde_json::from_str(workspace_json).map_err(|err| {
        CaptureError::InvalidWorkspaceMetadata {
            message: err.to_string(),
        }
    })?;
    let id = workspace
        .id
        .ok_or_else(|| CaptureError::InvalidWorkspaceMetadata {
            message: "active workspace is missing an id".to_string(),
        })?;

    Ok(ActiveWorkspace {
        id,
        monitor: workspace.monitor.filter(|name| !name.is_empty()),
    })
}

/// Logical layout rectangle of the named monitor, or of the focused one when
/// no name is given or the name is not found.
pub(super) fn parse_monitor_layout(
    monitors_json: &str,
    preferred_name: Option<&str>,
) -> Result<Rect, CaptureError> {
    let monitors: Vec<MonitorStatus> = serde_json::from_str(monitors_json).map_err(|err| {
        CaptureError::InvalidMonitorMetadata {
            message: err.to_string(),
        }
    })?;

    let index = preferred_name
        .and_then(|name| {
            monitors
                .iter()
                .position(|monitor| monitor.name.as_deref() == Some(name))
        })
        .or_else(|| monitors.iter().position(|monitor| monitor.focused))
        .ok_or(CaptureError::NoFocusedMonitor)?;
    logical_monitor_rect(&monitors[index])
}

fn logical_monitor_rect(monitor: &MonitorStatus) -> Result<Rect, CaptureError> {
    let (Some(width), Some(height)) = (monitor.width, monitor.height) else {
        return Err(CaptureError::InvalidMonitorMetadata {
            message: "monitor is missing its pixel size".to_string(),
        });
    };
    let scale = monitor.scale.filter(|scale| *scale > 0.0).unwrap_or(1.0);
    let mut logical_width = (f64::from(width) / scale).round() as i32;
    let mut logical_height = (f64::from(height) / scale).round() as i32;
    if monitor.transform.unwrap_or(0) % 2 == 1 {
        std::mem::swap(&mut logical_width, &mut logical_height);
    }
    if logical_width <= 0 || logical_height <= 0 {
        return Err(CaptureError::InvalidMonitorMetadata {
            message: format!("monitor size must be positive, got {logical_width}x{logical_height}"),
        });
    }

    Ok(Rect::new(
        monitor.x.unwrap_or(0),
        monitor.y.unwrap_or(0),
        logical_width,
        logical_height,
    ))
}

pub(super) fn parse_workspace_windows(
    clients_json: &str,
    workspace_id: i32,
) -> Result<Vec<WindowDescriptor>, CaptureError> {
    let clients: Vec<WindowClientStatus> =
        serde_json::from_str(clients_json).map_err(|err| CaptureError::InvalidWindowMetadata {
            message: err.to_string(),
        })?;

    let mut windows = Vec::new();
    let mut timestamps = Vec::new();
    for (index, client) in clients.into_iter().enumerate() {
        if client.hidden.unwrap_or(false) || matches!(client.mapped, Some(false)) {
            continue;
        }
        if client.workspace.as_ref().and_then(|workspace| workspace.id) != Some(workspace_id) {
            continue;
        }

        let Some([x, y]) = client.at else {
            continue;
        };
        let Some([width, height]) = client.size else {
            continue;
        };
        if width <= 0 || height <= 0 {
            continue;
        }

        windows.push(WindowDescriptor {
            x,
            y,
            width,
            height,
            floating: client.floating.unwrap_or(false),
            creation_order: i64::try_from(index).unwrap_or(i64::MAX),
            title: client
                .title
                .map(|title| title.replace(['\n', '\r'], " "))
                .unwrap_or_default(),
        });
        timestamps.push(client.creation_timestamp);
    }

    // Timestamps and enumeration indices are not comparable, so timestamps
    // only apply when every selectable window carries one.
    if let Some(timestamps) = timestamps.into_iter().collect::<Option<Vec<i64>>>() {
        for (window, timestamp) in windows.iter_mut().zip(timestamps) {
            window.creation_order = timestamp;
        }
    }

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_active_workspace_reads_id_and_monitor() {
        let json = r#"{"id":3,"name":"3","monitor":"DP-1","windows":2}"#;
        assert_eq!(
            parse_active_workspace(json).expect("workspace should parse"),
            ActiveWorkspace {
                id: 3,
                monitor: Some("DP-1".to_string()),
            }
        );
    }

    #[test]
    fn parse_active_workspace_rejects_missing_id() {
        let err = parse_active_workspace(r#"{"name":"3"}"#).expect_err("id is required");
        assert!(matches!(err, CaptureError::InvalidWorkspaceMetadata { .. }));
    }

    #[test]
    fn parse_monitor_layout_prefers_named_then_focused_monitor() {
        let json = r#"[
          {"name":"DP-1","focused":false,"x":0,"y":0,"width":1920,"height":1080,"scale":1.0,"transform":0},
          {"name":"HDMI-A-1","focused":true,"x":1920,"y":0,"width":2560,"height":1440,"scale":1.0,"transform":0}
        ]"#;
        assert_eq!(
            parse_monitor_layout(json, Some("DP-1")).expect("named monitor should parse"),
            Rect::new(0, 0, 1920, 1080)
        );
        assert_eq!(
            parse_monitor_layout(json, Some("missing")).expect("focused fallback should parse"),
            Rect::new(1920, 0, 2560, 1440)
        );
        assert_eq!(
            parse_monitor_layout(json, None).expect("focused monitor should parse"),
            Rect::new(1920, 0, 2560, 1440)
        );
    }

    #[test]
    fn parse_monitor_layout_applies_scale_and_rotation() {
        let json = r#"[{"name":"eDP-1","focused":true,"x":0,"y":0,"width":2880,"height":1800,"scale":1.5,"transform":1}]"#;
        assert_eq!(
            parse_monitor_layout(json, None).expect("monitor should parse"),
            Rect::new(0, 0, 1200, 1920)
        );
    }

    #[test]
    fn parse_monitor_layout_errors_without_focused_monitor() {
        let json = r#"[{"name":"DP-1","focused":false,"width":1920,"height":1080}]"#;
        assert!(matches!(
            parse_monitor_layout(json, None).expect_err("must error without focused monitor"),
            CaptureError::NoFocusedMonitor
        ));
    }

    #[test]
    fn parse_workspace_windows_filters_hidden_unmapped_and_foreign_clients() {
        let clients_json = r#"
[
  {"title":"Browser","mapped":true,"hidden":false,"floating":false,"workspace":{"id":1,"name":"1"},"at":[5,10],"size":[400,300]},
  {"title":"OtherWorkspace","mapped":true,"hidden":false,"workspace":{"id":2,"name":"2"},"at":[8,9],"size":[50,60]},
  {"title":"Hidden","mapped":true,"hidden":true,"workspace":{"id":1,"name":"1"},"at":[0,0],"size":[10,10]},
  {"title":"Unmapped","mapped":false,"hidden":false,"workspace":{"id":1,"name":"1"},"at":[0,0],"size":[10,10]},
  {"title":"InvalidSize","mapped":true,"hidden":false,"workspace":{"id":1,"name":"1"},"at":[0,0],"size":[0,10]},
  {"title":"MissingGeometry","mapped":true,"hidden":false,"workspace":{"id":1,"name":"1"}},
  {"title":"Dialog\nline","floating":true,"workspace":{"id":1,"name":"1"},"at":[50,60],"size":[200,100]}
]
"#;
        let windows = parse_workspace_windows(clients_json, 1).expect("clients should parse");
        assert_eq!(
            windows,
            vec![
                WindowDescriptor {
                    x: 5,
                    y: 10,
                    width: 400,
                    height: 300,
                    floating: false,
                    creation_order: 0,
                    title: "Browser".to_string(),
                },
                WindowDescriptor {
                    x: 50,
                    y: 60,
                    width: 200,
                    height: 100,
                    floating: true,
                    creation_order: 6,
                    title: "Dialog line".to_string(),
                },
            ]
        );
    }

    #[test]
    fn parse_workspace_windows_prefers_creation_timestamp() {
        let clients_json = r#"[
          {"title":"a","workspace":{"id":4},"at":[0,0],"size":[10,10],"creationTimestamp":1700},
          {"title":"b","workspace":{"id":4},"at":[0,0],"size":[10,10],"creationTimestamp":1650}
        ]"#;
        let windows = parse_workspace_windows(clients_json, 4).expect("clients should parse");
        assert_eq!(windows[0].creation_order, 1700);
        assert_eq!(windows[1].creation_order, 1650);
    }

    #[test]
    fn parse_workspace_windows_uses_index_when_any_timestamp_is_missing() {
        let clients_json = r#"[
          {"title":"a","workspace":{"id":4},"at":[0,0],"size":[10,10],"creationTimestamp":1700},
          {"title":"b","workspace":{"id":4},"at":[0,0],"size":[10,10]},
          {"title":"c","workspace":{"id":4},"at":[0,0],"size":[10,10],"creationTimestamp":1800}
        ]"#;
        let windows = parse_workspace_windows(clients_json, 4).expect("clients should parse");
        let orders = windows
            .iter()
            .map(|window| window.creation_order)
            .collect::<Vec<_>>();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn parse_workspace_windows_rejects_malformed_json() {
        let err = parse_workspace_windows("{", 1).expect_err("malformed json must fail");
        assert!(matches!(err, CaptureError::InvalidWindowMetadata { .. }));
    }
}
