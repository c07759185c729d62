use std::process::Command;
use std::time::Duration;

use crate::geometry::Rect;

const HYPR_FLOAT_RETRY_COUNT: u8 = 40;
const HYPR_FLOAT_RETRY_DELAY: Duration = Duration::from_millis(50);

const SURFACE_PROPS: [(&str, &str); 6] = [
    ("decorate", "off"),
    ("border_size", "0"),
    ("rounding", "0"),
    ("no_blur", "on"),
    ("no_dim", "on"),
    ("no_shadow", "on"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct HyprClientMatch {
    pub(super) address: String,
    pub(super) geometry: Option<Rect>,
}

fn parse_client_geometry(client: &serde_json::Value) -> Option<Rect> {
    let at = client.get("at")?.as_array()?;
    let size = client.get("size")?.as_array()?;
    if at.len() != 2 || size.len() != 2 {
        return None;
    }
    let x = i32::try_from(at[0].as_i64()?).ok()?;
    let y = i32::try_from(at[1].as_i64()?).ok()?;
    let width = i32::try_from(size[0].as_i64()?).ok()?;
    let height = i32::try_from(size[1].as_i64()?).ok()?;
    let rect = Rect::new(x, y, width, height);
    rect.has_area().then_some(rect)
}

pub(super) fn hypr_client_match_from_json(
    stdout: &[u8],
    expected_title: &str,
) -> Option<HyprClientMatch> {
    let parsed: serde_json::Value = serde_json::from_slice(stdout).ok()?;
    parsed.as_array()?.iter().find_map(|client| {
        let title = client.get("title").and_then(serde_json::Value::as_str)?;
        if title != expected_title {
            return None;
        }
        let address = client.get("address").and_then(serde_json::Value::as_str)?;
        Some(HyprClientMatch {
            address: address.to_string(),
            geometry: parse_client_geometry(client),
        })
    })
}

fn find_hypr_window_match(expected_title: &str) -> Option<HyprClientMatch> {
    let outcome = Command::new("hyprctl")
        .args(["-j", "clients"])
        .output()
        .ok()?;
    if !outcome.status.success() {
        return None;
    }
    hypr_client_match_from_json(&outcome.stdout, expected_title)
}

fn retry_until_some<T, F, S>(
    retry_count: u8,
    retry_delay: Duration,
    mut action: F,
    mut sleep: S,
) -> Option<T>
where
    F: FnMut(u8) -> Option<T>,
    S: FnMut(Duration),
{
    if retry_count == 0 {
        return None;
    }

    for attempt in 1..=retry_count {
        if let Some(value) = action(attempt) {
            return Some(value);
        }

        if attempt < retry_count {
            sleep(retry_delay);
        }
    }

    None
}

/// `hyprctl dispatch` calls that pin a floating window to `geometry`.
fn placement_dispatches(selector: &str, geometry: Rect) -> [(&'static str, String); 2] {
    [
        (
            "resizewindowpixel",
            format!(
                "exact {} {},{selector}",
                geometry.width.max(1),
                geometry.height.max(1)
            ),
        ),
        (
            "movewindowpixel",
            format!("exact {} {},{selector}", geometry.x, geometry.y),
        ),
    ]
}

fn dispatch(window_name: &str, args: &[&str]) -> bool {
    match Command::new("hyprctl").arg("dispatch").args(args).output() {
        Ok(result) if result.status.success() => {
            tracing::debug!(window = window_name, ?args, "hyprctl dispatch applied");
            true
        }
        Ok(result) => {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::warn!(
                window = window_name,
                ?args,
                status = result.status.code(),
                stderr = stderr.trim(),
                "hyprctl dispatch returned non-zero status"
            );
            false
        }
        Err(err) => {
            tracing::debug!(window = window_name, ?args, ?err, "hyprctl dispatch failed");
            false
        }
    }
}

/// Floats the window titled `expected_title` and optionally strips its
/// compositor decorations and moves it to `geometry`. Runs in the background
/// because the window may not be mapped yet when this is called.
pub(super) fn request_window_floating_with_geometry(
    window_name: &'static str,
    expected_title: &str,
    strip_surface: bool,
    geometry: Option<Rect>,
) {
    if std::env::var_os("HYPRLAND_INSTANCE_SIGNATURE").is_none() {
        tracing::debug!(
            window = window_name,
            "skipping floating dispatch outside Hyprland"
        );
        return;
    }

    let expected_title = expected_title.to_string();
    std::thread::spawn(move || {
        let Some(matched) = retry_until_some(
            HYPR_FLOAT_RETRY_COUNT,
            HYPR_FLOAT_RETRY_DELAY,
            |_| find_hypr_window_match(&expected_title),
            std::thread::sleep,
        ) else {
            tracing::debug!(
                window = window_name,
                title = expected_title,
                "hypr window address lookup failed for floating request"
            );
            return;
        };

        let selector = format!("address:{}", matched.address);
        if !dispatch(window_name, &["setfloating", selector.as_str()]) {
            return;
        }
        if strip_surface {
            for (property, value) in SURFACE_PROPS {
                dispatch(window_name, &["setprop", selector.as_str(), property, value]);
            }
        }
        if let Some(geometry) = geometry.filter(|target| matched.geometry != Some(*target)) {
            for (dispatcher, arg) in placement_dispatches(&selector, geometry) {
                dispatch(window_name, &[dispatcher, arg.as_str()]);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn hypr_client_match_from_json_matches_exact_title() {
        let payload = br#"
[
  {"address":"0x100","title":"HyprSnipper"},
  {"address":"0x200","title":"HyprSnipper Window Picker"}
]
"#;
        let matched = hypr_client_match_from_json(payload, "HyprSnipper Window Picker");
        assert_eq!(matched.map(|item| item.address).as_deref(), Some("0x200"));
    }

    #[test]
    fn hypr_client_match_from_json_ignores_non_object_entries() {
        let payload = br#"
[
  "ok",
  {"address":"0x300","title":"HyprSnipper"}
]
"#;
        let matched = hypr_client_match_from_json(payload, "HyprSnipper");
        assert_eq!(matched.map(|item| item.address).as_deref(), Some("0x300"));
    }

    #[test]
    fn hypr_client_match_from_json_parses_geometry_when_available() {
        let stdout = br#"[
            {"title":"HyprSnipper","address":"0x1","at":[100,200],"size":[420,120]},
            {"title":"Other","address":"0x2","at":[0,0],"size":[0,0]}
        ]"#;
        let item = hypr_client_match_from_json(stdout, "HyprSnipper").expect("match");
        assert_eq!(item.geometry, Some(Rect::new(100, 200, 420, 120)));

        let empty = hypr_client_match_from_json(stdout, "Other").expect("match");
        assert_eq!(empty.geometry, None);
    }

    #[test]
    fn placement_dispatches_resize_before_move() {
        let dispatches = placement_dispatches("address:0x1", Rect::new(-1920, 24, 420, 120));
        assert_eq!(
            dispatches,
            [
                ("resizewindowpixel", "exact 420 120,address:0x1".to_string()),
                ("movewindowpixel", "exact -1920 24,address:0x1".to_string()),
            ]
        );
    }

    #[test]
    fn retry_until_some_returns_value_without_extra_retries() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let sleeps = Rc::new(RefCell::new(Vec::new()));

        let result = retry_until_some(
            5,
            Duration::from_millis(10),
            {
                let calls = calls.clone();
                move |attempt| {
                    calls.borrow_mut().push(attempt);
                    (attempt == 3).then_some("matched")
                }
            },
            {
                let sleeps = sleeps.clone();
                move |duration| sleeps.borrow_mut().push(duration)
            },
        );

        assert_eq!(result, Some("matched"));
        assert_eq!(*calls.borrow(), vec![1, 2, 3]);
        assert_eq!(
            *sleeps.borrow(),
            vec![Duration::from_millis(10), Duration::from_millis(10)]
        );
    }

    #[test]
    fn retry_until_some_stops_after_max_attempts() {
        let calls = Rc::new(RefCell::new(Vec::new()));

        let result = retry_until_some(
            4,
            Duration::from_millis(5),
            {
                let calls = calls.clone();
                move |attempt| {
                    calls.borrow_mut().push(attempt);
                    None::<u8>
                }
            },
            |_| {},
        );

        assert_eq!(result, None);
        assert_eq!(*calls.borrow(), vec![1, 2, 3, 4]);
        assert_eq!(retry_until_some(0, Duration::ZERO, |_| Some(1), |_| {}), None);
    }
}
