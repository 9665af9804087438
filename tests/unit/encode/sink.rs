use super::*;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 1,
        frame_count: 2,
    }
}

#[test]
fn ticks_convert_to_milliseconds() {
    let t = FrameTiming::from_ticks(7, DisposalMode::Background);
    assert_eq!(t.delay_ms, 70);
    assert_eq!(t.disposal, DisposalMode::Background);
}

#[test]
fn in_memory_sink_keeps_frames_in_order() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(&[1; 8], FrameTiming::from_ticks(1, DisposalMode::Any))
        .unwrap();
    sink.push_frame(&[2; 8], FrameTiming::from_ticks(2, DisposalMode::Keep))
        .unwrap();
    let bytes = sink.finish().unwrap();

    assert!(sink.is_finished());
    assert_eq!(sink.config(), Some(cfg()));
    assert_eq!(sink.frames().len(), 2);
    assert_eq!(sink.frames()[1].1.delay_ms, 20);
    assert_eq!(bytes.len(), 16);
    assert_eq!(bytes[8], 2);
}

#[test]
fn in_memory_sink_rejects_misuse() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(&[0; 8], FrameTiming::default()).is_err());
    sink.begin(cfg()).unwrap();
    assert!(matches!(
        sink.push_frame(&[0; 4], FrameTiming::default()),
        Err(MemegenError::Encode(_))
    ));
}
