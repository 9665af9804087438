use std::{borrow::Cow, io::Cursor};

use super::*;

const CLEAR: u8 = 0;
const RED: u8 = 1;
const BLUE: u8 = 2;
const GREEN: u8 = 3;
const PALETTE: [u8; 12] = [0, 0, 0, 255, 0, 0, 0, 0, 255, 0, 255, 0];

struct Sub {
    rect: (u16, u16, u16, u16),
    index: u8,
    delay: u16,
    dispose: gif::DisposalMethod,
}

fn gif_bytes(width: u16, height: u16, subs: &[Sub]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut out, width, height, &PALETTE).unwrap();
        for s in subs {
            let (left, top, w, h) = s.rect;
            let frame = gif::Frame {
                left,
                top,
                width: w,
                height: h,
                delay: s.delay,
                dispose: s.dispose,
                transparent: Some(CLEAR),
                buffer: Cow::Owned(vec![s.index; w as usize * h as usize]),
                ..Default::default()
            };
            enc.write_frame(&frame).unwrap();
        }
    }
    out
}

fn full(index: u8, dispose: gif::DisposalMethod) -> Sub {
    Sub {
        rect: (0, 0, 2, 2),
        index,
        delay: 10,
        dispose,
    }
}

fn px(buf: &[u8], x: usize, y: usize) -> [u8; 4] {
    let i = (y * 2 + x) * 4;
    [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
}

const RED_PX: [u8; 4] = [255, 0, 0, 255];
const BLUE_PX: [u8; 4] = [0, 0, 255, 255];
const GREEN_PX: [u8; 4] = [0, 255, 0, 255];

#[test]
fn reports_frame_count_durations_and_disposal() {
    let bytes = gif_bytes(
        2,
        2,
        &[
            Sub {
                delay: 10,
                ..full(RED, gif::DisposalMethod::Keep)
            },
            Sub {
                delay: 20,
                ..full(BLUE, gif::DisposalMethod::Background)
            },
            Sub {
                delay: 10,
                ..full(GREEN, gif::DisposalMethod::Any)
            },
        ],
    );
    let src = GifFrameSource::from_bytes(&bytes).unwrap();

    assert_eq!(src.frame_count(), 3);
    assert_eq!(src.canvas_size(), (2, 2));
    let durations: Vec<u16> = (0..3)
        .map(|i| src.frame_info(i).unwrap().duration_ticks)
        .collect();
    assert_eq!(durations, vec![10, 20, 10]);
    assert_eq!(
        src.frame_info(1).unwrap().disposal,
        DisposalMode::Background
    );
    assert_eq!(src.frame_info(0).unwrap().width, 2);
    assert!(matches!(src.frame_info(3), Err(MemegenError::Decode(_))));
}

#[test]
fn partial_frame_composites_over_kept_canvas() {
    let bytes = gif_bytes(
        2,
        2,
        &[
            full(RED, gif::DisposalMethod::Keep),
            Sub {
                rect: (1, 1, 1, 1),
                index: BLUE,
                delay: 10,
                dispose: gif::DisposalMethod::Keep,
            },
        ],
    );
    let mut src = GifFrameSource::from_bytes(&bytes).unwrap();
    let mut buf = vec![0u8; 16];
    src.decode_frame_into(1, &mut buf).unwrap();

    assert_eq!(px(&buf, 0, 0), RED_PX);
    assert_eq!(px(&buf, 1, 1), BLUE_PX);
    assert_eq!(src.frame_info(1).unwrap().rect, Rect::new(1.0, 1.0, 2.0, 2.0));
}

#[test]
fn background_disposal_clears_previous_rect() {
    let bytes = gif_bytes(
        2,
        2,
        &[
            full(RED, gif::DisposalMethod::Background),
            Sub {
                rect: (0, 0, 1, 1),
                index: BLUE,
                delay: 10,
                dispose: gif::DisposalMethod::Keep,
            },
        ],
    );
    let mut src = GifFrameSource::from_bytes(&bytes).unwrap();
    let mut buf = vec![0u8; 16];
    src.decode_frame_into(1, &mut buf).unwrap();

    assert_eq!(px(&buf, 0, 0), BLUE_PX);
    assert_eq!(px(&buf, 1, 0)[3], 0);
    assert_eq!(px(&buf, 1, 1)[3], 0);
}

#[test]
fn previous_disposal_restores_canvas() {
    let bytes = gif_bytes(
        2,
        2,
        &[
            full(RED, gif::DisposalMethod::Keep),
            full(BLUE, gif::DisposalMethod::Previous),
            Sub {
                rect: (0, 0, 1, 1),
                index: GREEN,
                delay: 10,
                dispose: gif::DisposalMethod::Keep,
            },
        ],
    );
    let mut src = GifFrameSource::from_bytes(&bytes).unwrap();
    let mut buf = vec![0u8; 16];

    src.decode_frame_into(1, &mut buf).unwrap();
    assert_eq!(px(&buf, 1, 1), BLUE_PX);

    src.decode_frame_into(2, &mut buf).unwrap();
    assert_eq!(px(&buf, 0, 0), GREEN_PX);
    assert_eq!(px(&buf, 1, 1), RED_PX);
}

#[test]
fn seeking_backwards_rewinds_and_ignores_buffer_contents() {
    let bytes = gif_bytes(
        2,
        2,
        &[
            full(RED, gif::DisposalMethod::Keep),
            full(BLUE, gif::DisposalMethod::Keep),
        ],
    );
    let mut src = GifFrameSource::from_bytes(&bytes).unwrap();
    let mut buf = vec![0xAAu8; 16];

    src.decode_frame_into(1, &mut buf).unwrap();
    assert_eq!(px(&buf, 0, 0), BLUE_PX);
    src.decode_frame_into(0, &mut buf).unwrap();
    assert_eq!(px(&buf, 0, 0), RED_PX);

    let mut clone = src.clone();
    let mut other = vec![0u8; 16];
    clone.decode_frame_into(1, &mut other).unwrap();
    assert_eq!(px(&other, 1, 0), BLUE_PX);
}

#[test]
fn bad_index_and_buffer_size_are_decode_errors() {
    let bytes = gif_bytes(2, 2, &[full(RED, gif::DisposalMethod::Keep)]);
    let mut src = GifFrameSource::from_bytes(&bytes).unwrap();

    let mut buf = vec![0u8; 16];
    assert!(matches!(
        src.decode_frame_into(5, &mut buf),
        Err(MemegenError::Decode(_))
    ));
    let mut short = vec![0u8; 3];
    assert!(matches!(
        src.decode_frame_into(0, &mut short),
        Err(MemegenError::Decode(_))
    ));
}

#[test]
fn malformed_bytes_fail_at_construction() {
    assert!(matches!(
        GifFrameSource::from_bytes(b"not a gif"),
        Err(MemegenError::Decode(_))
    ));
    assert!(GifFrameSource::from_bytes(&[]).is_err());
}

#[test]
fn decode_still_png_dimensions() {
    let img = image::RgbaImage::from_raw(2, 1, vec![1, 2, 3, 255, 4, 5, 6, 128]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let still = decode_still(&buf).unwrap();
    assert_eq!((still.width, still.height), (2, 1));
    assert_eq!(still.rgba8, vec![1, 2, 3, 255, 4, 5, 6, 128]);

    assert!(matches!(decode_still(b"junk"), Err(MemegenError::Decode(_))));
}
