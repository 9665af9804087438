use std::{
    borrow::Cow,
    sync::{Arc, Mutex},
};

use super::*;
use crate::{
    assets::decode::DisposalMode,
    encode::{sink::InMemorySink, still::encode_png},
    foundation::core::Rect,
    generate::{slot::TextSlot, status::NoopObserver},
    render::{
        surface::Surface,
        text::{FontSpec, TextRasterizer, TextRun},
    },
};

const MARK: [u8; 4] = [255, 0, 255, 255];

/// Records drawn texts and stamps pixel (0, 0) whenever something is drawn.
#[derive(Clone, Default)]
struct Marking {
    drawn: Arc<Mutex<Vec<String>>>,
}

impl TextBackend for Marking {
    fn rasterizer(&self) -> MemegenResult<Box<dyn TextRasterizer>> {
        Ok(Box::new(self.clone()))
    }
}

impl TextRasterizer for Marking {
    fn measure(&mut self, text: &str, _font: &FontSpec) -> MemegenResult<f64> {
        Ok(text.chars().count() as f64 * 4.0)
    }

    fn draw_runs(&mut self, surface: &mut Surface, runs: &[TextRun]) -> MemegenResult<()> {
        if runs.is_empty() {
            return Ok(());
        }
        let text: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        self.drawn.lock().unwrap().push(text.join("|"));
        surface.data_mut()[..4].copy_from_slice(&MARK);
        Ok(())
    }
}

struct NoFonts;

impl TextBackend for NoFonts {
    fn rasterizer(&self) -> MemegenResult<Box<dyn TextRasterizer>> {
        Err(MemegenError::render("no fonts"))
    }
}

struct FailingSink;

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> MemegenResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _rgba8: &[u8], _timing: FrameTiming) -> MemegenResult<()> {
        Err(MemegenError::encode("disk full"))
    }

    fn finish(&mut self) -> MemegenResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// 4x4 opaque green GIF with one full frame per delay.
fn green_gif(delays: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let palette = [0u8, 255, 0];
        let mut enc = gif::Encoder::new(&mut out, 4, 4, &palette).unwrap();
        for &delay in delays {
            let frame = gif::Frame {
                width: 4,
                height: 4,
                delay,
                dispose: gif::DisposalMethod::Keep,
                buffer: Cow::Owned(vec![0; 16]),
                ..Default::default()
            };
            enc.write_frame(&frame).unwrap();
        }
    }
    out
}

fn slot(start: f64, end: f64, text: &str) -> TextSlot {
    TextSlot::new("", Rect::new(0.0, 0.0, 64.0, 4.0), text).with_timing(start, end)
}

fn animated(delays: &[u16], backend: Arc<dyn TextBackend>) -> Generator {
    Generator::new(
        ImageKind::Animated,
        &green_gif(delays),
        MemegenConfig::default(),
        backend,
    )
    .unwrap()
}

fn marked_frames(sink: &InMemorySink) -> Vec<bool> {
    sink.frames().iter().map(|(px, _)| px[..4] == MARK).collect()
}

#[test]
fn slot_is_drawn_only_while_clock_is_in_range() {
    let backend = Marking::default();
    let generator = animated(&[250, 100, 100], Arc::new(backend.clone()));
    let schedule =
        Schedule::from_slots(vec![slot(0.0, 2.0, "hi")], ImageKind::Animated).unwrap();

    let mut sink = InMemorySink::new();
    generator
        .generate_into(&schedule, &mut sink, &NoopObserver)
        .unwrap()
        .unwrap();

    assert_eq!(marked_frames(&sink), vec![true, false, false]);
    assert_eq!(*backend.drawn.lock().unwrap(), vec!["hi".to_string()]);
}

#[test]
fn short_frames_share_a_slot_until_it_ends() {
    let backend = Marking::default();
    let generator = animated(&[10, 20, 10], Arc::new(backend.clone()));
    // Frame start times are 0.0, 0.1 and 0.3 seconds.
    let schedule =
        Schedule::from_slots(vec![slot(0.0, 0.2, "a")], ImageKind::Animated).unwrap();

    let mut sink = InMemorySink::new();
    generator
        .generate_into(&schedule, &mut sink, &NoopObserver)
        .unwrap();
    assert_eq!(marked_frames(&sink), vec![true, true, false]);
}

#[test]
fn cursor_moves_forward_through_consecutive_slots() {
    let backend = Marking::default();
    let generator = animated(&[100, 100, 100, 100], Arc::new(backend.clone()));
    // Frame starts: 0, 1, 2, 3. The middle slot lies between frame starts and is skipped.
    let schedule = Schedule::from_slots(
        vec![
            slot(0.0, 1.0, "first"),
            slot(1.2, 1.8, "skipped"),
            slot(2.0, 4.0, "last"),
        ],
        ImageKind::Animated,
    )
    .unwrap();

    let mut sink = InMemorySink::new();
    generator
        .generate_into(&schedule, &mut sink, &NoopObserver)
        .unwrap();

    assert_eq!(marked_frames(&sink), vec![true, false, true, true]);
    assert_eq!(
        *backend.drawn.lock().unwrap(),
        vec!["first".to_string(), "last".into(), "last".into()]
    );
}

#[test]
fn clock_lands_exactly_on_whole_seconds() {
    let backend = Marking::default();
    let generator = animated(&[10; 11], Arc::new(backend.clone()));
    let schedule =
        Schedule::from_slots(vec![slot(0.0, 1.0, "a")], ImageKind::Animated).unwrap();

    let mut sink = InMemorySink::new();
    generator
        .generate_into(&schedule, &mut sink, &NoopObserver)
        .unwrap();

    let marks = marked_frames(&sink);
    assert!(marks[..10].iter().all(|&m| m), "{marks:?}");
    assert!(!marks[10], "frame starting at 1.0s is outside [0, 1)");
}

#[test]
fn slot_starting_on_a_frame_boundary_covers_that_frame() {
    let backend = Marking::default();
    let generator = animated(&[10; 11], Arc::new(backend.clone()));
    let schedule = Schedule::from_slots(
        vec![slot(0.0, 1.0, "a"), slot(1.0, 2.0, "b")],
        ImageKind::Animated,
    )
    .unwrap();

    let mut sink = InMemorySink::new();
    generator
        .generate_into(&schedule, &mut sink, &NoopObserver)
        .unwrap();

    let drawn = backend.drawn.lock().unwrap();
    assert_eq!(drawn.len(), 11);
    assert!(drawn[..10].iter().all(|t| t == "a"));
    assert_eq!(drawn[10], "b");
}

#[test]
fn frames_keep_source_timing_in_milliseconds() {
    let generator = animated(&[7, 30], Arc::new(Marking::default()));
    let mut sink = InMemorySink::new();
    generator
        .generate_into(&Schedule::default(), &mut sink, &NoopObserver)
        .unwrap();

    let timings: Vec<FrameTiming> = sink.frames().iter().map(|(_, t)| *t).collect();
    assert_eq!(
        timings,
        vec![
            FrameTiming {
                delay_ms: 70,
                disposal: DisposalMode::Keep
            },
            FrameTiming {
                delay_ms: 300,
                disposal: DisposalMode::Keep
            },
        ]
    );
    assert_eq!(sink.config().unwrap().frame_count, 2);
    assert!(sink.is_finished());
}

#[test]
fn progress_is_monotonic_and_finished_is_last() {
    let generator = animated(&[10, 10, 10], Arc::new(Marking::default()));
    let (tx, rx) = mpsc::channel();
    let artifact = generator
        .generate(&Schedule::default(), &tx)
        .unwrap()
        .unwrap();
    drop(tx);

    let events: Vec<GenerateEvent> = rx.iter().collect();
    assert_eq!(events.len(), 4);
    let progress: Vec<f32> = events[..3]
        .iter()
        .map(|e| match e {
            GenerateEvent::Progress(p) => *p,
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress[2], 1.0);
    assert_eq!(events[3], GenerateEvent::Finished(artifact.clone()));

    assert_eq!(artifact.kind(), ArtifactKind::Gif);
    assert_eq!(artifact.frame_count(), 3);
    assert!(!generator.is_generating());
    assert_eq!(generator.generating_progress(), None);
}

/// Blocks the encoder thread on the first progress event until released.
struct Gate {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GenerateObserver for Gate {
    fn on_event(&self, event: GenerateEvent) {
        if let GenerateEvent::Progress(_) = event {
            let _ = self.entered.lock().unwrap().send(());
            let _ = self.release.lock().unwrap().recv();
        }
    }
}

#[test]
fn second_generate_while_running_is_ignored() {
    let generator = animated(&[10, 10, 10], Arc::new(Marking::default()));
    let schedule = Schedule::default();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let gate = Gate {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };

    std::thread::scope(|s| {
        let first = s.spawn(|| generator.generate(&schedule, &gate));
        entered_rx.recv().unwrap();

        assert!(generator.is_generating());
        let before = generator.generating_progress();
        assert!(before.is_some());

        let second = generator.generate(&schedule, &NoopObserver).unwrap();
        assert!(second.is_none());
        assert_eq!(generator.generating_progress(), before);

        drop(release_tx);
        let artifact = first.join().unwrap().unwrap().unwrap();
        assert_eq!(artifact.frame_count(), 3);
    });

    assert!(!generator.is_generating());
    assert!(generator.generate(&schedule, &NoopObserver).unwrap().is_some());
}

#[test]
fn failures_return_to_idle() {
    let generator = animated(&[10], Arc::new(NoFonts));
    let err = generator
        .generate(&Schedule::default(), &NoopObserver)
        .unwrap_err();
    assert!(matches!(err, MemegenError::Render(_)));
    assert!(!generator.is_generating());

    let generator = animated(&[10, 10, 10, 10], Arc::new(Marking::default()));
    let err = generator
        .generate_into(&Schedule::default(), &mut FailingSink, &NoopObserver)
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(generator.generating_progress(), None);
}

#[test]
fn malformed_sources_are_decode_errors() {
    for kind in [ImageKind::Animated, ImageKind::Static] {
        let err = Generator::new(
            kind,
            b"not an image",
            MemegenConfig::default(),
            Arc::new(Marking::default()),
        )
        .err()
        .unwrap();
        assert!(matches!(err, MemegenError::Decode(_)), "{kind:?}: {err}");
    }
}

#[test]
fn static_path_draws_every_slot_once() {
    let backend = Marking::default();
    let png = encode_png(4, 4, &[0, 0, 255, 255].repeat(16)).unwrap();
    let generator = Generator::new(
        ImageKind::Static,
        &png,
        MemegenConfig::default(),
        Arc::new(backend.clone()),
    )
    .unwrap();
    assert_eq!(generator.kind(), ImageKind::Static);
    assert_eq!(generator.canvas_size(), (4, 4));

    let mut schedule = Schedule::from_slots(
        vec![
            TextSlot::new("top", Rect::new(0.0, 0.0, 64.0, 2.0), "top"),
            slot(5.0, 6.0, "timed"),
            TextSlot::new("empty", Rect::new(0.0, 2.0, 4.0, 4.0), ""),
        ],
        ImageKind::Static,
    )
    .unwrap();
    schedule.set_text(0, "edited").unwrap();

    let (tx, rx) = mpsc::channel();
    let artifact = generator.generate(&schedule, &tx).unwrap().unwrap();
    drop(tx);

    assert_eq!(
        *backend.drawn.lock().unwrap(),
        vec!["edited".to_string(), "timed".into()]
    );
    assert_eq!(artifact.kind(), ArtifactKind::Png);
    let decoded = image::load_from_memory(artifact.bytes()).unwrap().to_rgba8();
    assert_eq!(&decoded.as_raw()[..4], &MARK);
    assert_eq!(&decoded.as_raw()[4..8], &[0, 0, 255, 255]);

    let events: Vec<GenerateEvent> = rx.iter().collect();
    assert_eq!(events[0], GenerateEvent::Progress(1.0));
    assert!(matches!(events[1], GenerateEvent::Finished(_)));
}
