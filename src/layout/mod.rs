/// Horizontal and vertical (CJK-aware) text layout.
pub mod text;
