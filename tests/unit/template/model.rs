use std::{borrow::Cow, collections::HashMap};

use super::*;
use crate::{
    foundation::core::Rect,
    generate::{artifact::ArtifactKind, status::NoopObserver},
    render::{
        surface::Surface,
        text::{FontSpec, TextRasterizer, TextRun},
    },
};

struct Fixed;

impl TextBackend for Fixed {
    fn rasterizer(&self) -> MemegenResult<Box<dyn TextRasterizer>> {
        Ok(Box::new(Fixed))
    }
}

impl TextRasterizer for Fixed {
    fn measure(&mut self, text: &str, _font: &FontSpec) -> MemegenResult<f64> {
        Ok(text.len() as f64)
    }

    fn draw_runs(&mut self, _surface: &mut Surface, _runs: &[TextRun]) -> MemegenResult<()> {
        Ok(())
    }
}

/// Serves assets from memory in `chunk`-byte steps; unknown paths fail.
struct MemoryTransport {
    files: HashMap<String, Vec<u8>>,
    chunk: usize,
}

impl AssetTransport for MemoryTransport {
    fn fetch(
        &self,
        request: &AssetRequest,
        progress: &mut dyn FnMut(u64, Option<u64>),
    ) -> MemegenResult<Vec<u8>> {
        let path = request.relative_path()?;
        let bytes = self
            .files
            .get(&path)
            .ok_or_else(|| MemegenError::transport(format!("404 {path}")))?;
        let total = bytes.len() as u64;
        progress(0, None);
        let mut sent = 0;
        while sent < bytes.len() {
            sent = (sent + self.chunk).min(bytes.len());
            progress(sent as u64, Some(total));
        }
        Ok(bytes.clone())
    }
}

fn gif_2x2(frames: usize) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut out, 2, 2, &[255, 255, 255]).unwrap();
        for _ in 0..frames {
            let frame = gif::Frame {
                width: 2,
                height: 2,
                delay: 50,
                buffer: Cow::Owned(vec![0; 4]),
                ..Default::default()
            };
            enc.write_frame(&frame).unwrap();
        }
    }
    out
}

const SCHEDULE: &[u8] = br#"[
    { "x": 0, "y": 0, "width": 2, "height": 2, "startTime": 0, "endTime": 1, "text": "one" }
]"#;

fn descriptor() -> TemplateDescriptor {
    TemplateDescriptor::new("demo", "Demo", ".gif")
}

fn backend() -> Arc<dyn TextBackend> {
    Arc::new(Fixed)
}

#[test]
fn loading_template_refuses_to_generate() {
    let t = Template::new(descriptor(), MemegenConfig::default(), backend()).unwrap();
    assert!(t.is_loading());
    assert_eq!(t.loading_progress(), 0.0);
    assert!(t.text_slots().is_empty());
    assert!(!t.is_generating());
    assert_eq!(t.generating_progress(), None);
    assert!(t.generate(&NoopObserver).unwrap().is_none());
}

#[test]
fn manual_events_build_generator_once_both_assets_arrive() {
    let mut t = Template::new(descriptor(), MemegenConfig::default(), backend()).unwrap();
    t.apply(LoadEvent::Progress {
        kind: AssetKind::Image,
        loaded: 10,
        total: None,
    })
    .unwrap();
    t.apply(LoadEvent::Completed {
        kind: AssetKind::Schedule,
        bytes: SCHEDULE.to_vec(),
    })
    .unwrap();
    assert!(t.is_loading());
    assert!(t.loading_progress() > 0.0 && t.loading_progress() < 1.0);

    t.apply(LoadEvent::Completed {
        kind: AssetKind::Image,
        bytes: gif_2x2(2),
    })
    .unwrap();
    assert!(!t.is_loading());
    assert_eq!(t.loading_progress(), 1.0);
    assert_eq!(t.generator().unwrap().frame_count(), 2);
    assert_eq!(t.text_slots()[0].effective_text(), "one");

    t.set_text(0, "two").unwrap();
    assert_eq!(t.text_slots()[0].effective_text(), "two");
    t.clear_texts();
    assert_eq!(t.text_slots()[0].effective_text(), "one");

    let artifact = t.generate(&NoopObserver).unwrap().unwrap();
    assert_eq!(artifact.kind(), ArtifactKind::Gif);
    assert_eq!(artifact.frame_count(), 2);
}

#[test]
fn load_reports_monotonic_progress_ending_at_one() {
    let transport = MemoryTransport {
        files: HashMap::from([
            ("demo/template.json".to_string(), SCHEDULE.to_vec()),
            ("demo/template.gif".to_string(), gif_2x2(3)),
        ]),
        chunk: 7,
    };

    let mut seen = Vec::new();
    let t = Template::load(
        descriptor(),
        &transport,
        MemegenConfig::default(),
        backend(),
        |p| seen.push(p),
    )
    .unwrap();

    assert!(!t.is_loading());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
    assert_eq!(seen.last().copied(), Some(1.0));
    assert_eq!(t.generator().unwrap().frame_count(), 3);

    let image = t.load_state().stream(AssetKind::Image);
    assert!(image.done);
    assert_eq!(image.loaded, gif_2x2(3).len() as u64);
    assert_eq!(image.total, Some(image.loaded));
    assert_eq!(
        t.load_state().stream(AssetKind::Schedule).loaded,
        SCHEDULE.len() as u64
    );
}

#[test]
fn missing_asset_is_transport_error() {
    let transport = MemoryTransport {
        files: HashMap::from([("demo/template.json".to_string(), SCHEDULE.to_vec())]),
        chunk: 64,
    };
    let err = Template::load(
        descriptor(),
        &transport,
        MemegenConfig::default(),
        backend(),
        |_| {},
    )
    .err()
    .unwrap();
    assert!(matches!(err, MemegenError::Transport(_)));
}

#[test]
fn invalid_schedule_keeps_template_loading() {
    let mut t = Template::new(descriptor(), MemegenConfig::default(), backend()).unwrap();
    t.apply(LoadEvent::Completed {
        kind: AssetKind::Image,
        bytes: gif_2x2(1),
    })
    .unwrap();
    // Animated templates need timed slots.
    let err = t
        .apply(LoadEvent::Completed {
            kind: AssetKind::Schedule,
            bytes: br#"[{ "x": 0, "y": 0, "width": 1, "height": 1 }]"#.to_vec(),
        })
        .unwrap_err();
    assert!(matches!(err, MemegenError::Validation(_)));
    assert!(t.is_loading());
    assert!(t.generate(&NoopObserver).unwrap().is_none());
}

#[test]
fn static_template_generates_png() {
    let png = crate::encode::still::encode_png(3, 3, &[9u8; 36]).unwrap();
    let mut t = Template::new(
        TemplateDescriptor::new("still", "Still", "png"),
        MemegenConfig::default(),
        backend(),
    )
    .unwrap();
    let slot = TextSlot::new("a", Rect::new(0.0, 0.0, 3.0, 3.0), "x");
    t.apply(LoadEvent::Completed {
        kind: AssetKind::Schedule,
        bytes: serde_json::to_vec(&[slot]).unwrap(),
    })
    .unwrap();
    t.apply(LoadEvent::Completed {
        kind: AssetKind::Image,
        bytes: png,
    })
    .unwrap();

    let artifact = t.generate(&NoopObserver).unwrap().unwrap();
    assert_eq!(artifact.kind(), ArtifactKind::Png);
    assert_eq!(artifact.frame_count(), 1);
}
