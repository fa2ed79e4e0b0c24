//! Host-facing JSON shapes

use couch_core::{DrmConfig, PlaylistRail, RailType, KEY_SYSTEM_WIDEVINE};

const RAILS_JSON: &str = r#"[
  {
    "id": "up-next",
    "title": "Up Next",
    "type": "queue",
    "priority": 0,
    "items": [
      {
        "id": "ep-1",
        "title": "Episode 1",
        "source": "https://cdn.example.com/ep-1.mpd",
        "drm": {
          "servers": { "com.widevine.alpha": "https://license.example.com/wv" },
          "advanced": {
            "com.widevine.alpha": { "videoRobustness": "SW_SECURE_DECODE" }
          }
        },
        "subtitles": [
          { "language": "en", "label": "English", "url": "https://cdn.example.com/ep-1.en.vtt" }
        ],
        "progress": 12.5
      },
      { "id": "ep-2", "title": "Episode 2", "source": "https://cdn.example.com/ep-2.mpd" }
    ]
  },
  {
    "id": "related",
    "title": "Related",
    "type": "related",
    "priority": 1,
    "collapsible": true,
    "maxVisible": 4
  }
]"#;

#[test]
fn parses_host_rails() {
    let rails: Vec<PlaylistRail> = serde_json::from_str(RAILS_JSON).unwrap();
    assert_eq!(rails.len(), 2);

    let queue = &rails[0];
    assert_eq!(queue.rail_type, RailType::Queue);
    assert_eq!(queue.items.len(), 2);

    let first = &queue.items[0];
    assert_eq!(first.progress, 12.5);
    assert!(!first.is_active);
    assert_eq!(first.subtitles[0].language, "en");
    let drm = first.drm.as_ref().unwrap();
    assert_eq!(
        drm.license_server(KEY_SYSTEM_WIDEVINE),
        Some("https://license.example.com/wv")
    );
    assert_eq!(
        drm.advanced.as_ref().unwrap()[KEY_SYSTEM_WIDEVINE]
            .video_robustness
            .as_deref(),
        Some("SW_SECURE_DECODE")
    );

    let related = &rails[1];
    assert!(related.items.is_empty());
    assert!(related.collapsible);
    assert_eq!(related.max_visible, Some(4));
}

#[test]
fn drm_equality_is_by_value() {
    let a = DrmConfig::from_json(r#"{ "servers": { "org.w3.clearkey": "https://k" } }"#).unwrap();
    let b = DrmConfig::new().with_server("org.w3.clearkey", "https://k");
    assert_eq!(a, b);
    assert_ne!(a, b.with_server(KEY_SYSTEM_WIDEVINE, "https://wv"));
}
