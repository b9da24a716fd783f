//! Word-cloud placement.
//!
//! The pipeline only produces ranked `(word, weight)` pairs; turning them into
//! 2-D positions is delegated to a [`WordLayout`]. [`SpiralLayout`] is a small
//! deterministic implementation: each word walks outward on an Archimedean
//! spiral from the centre until its bounding box fits without overlapping an
//! already placed word. Words that never fit are dropped.

use serde::Serialize;

use crate::sanitize::WordWeight;

/// A word placed on the canvas. Coordinates are relative to the canvas
/// centre, matching SVG `translate(x,y) rotate(r)` placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedWord {
    pub text: String,
    pub size: usize,
    pub x: f64,
    pub y: f64,
    pub rotate: i32,
}

/// Places ranked words on a canvas.
pub trait WordLayout: Send + Sync {
    fn place(&self, words: &[WordWeight]) -> Vec<PositionedWord>;
}

/// Approximate glyph width as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.6;
const SPIRAL_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
struct Rect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Rect {
    fn around(x: f64, y: f64, w: f64, h: f64) -> Self {
        Rect {
            x0: x - w / 2.0,
            y0: y - h / 2.0,
            x1: x + w / 2.0,
            y1: y + h / 2.0,
        }
    }

    fn overlaps(&self, other: &Rect, padding: f64) -> bool {
        self.x0 < other.x1 + padding
            && other.x0 < self.x1 + padding
            && self.y0 < other.y1 + padding
            && other.y0 < self.y1 + padding
    }
}

/// Deterministic spiral placement on a fixed canvas.
#[derive(Debug, Clone)]
pub struct SpiralLayout {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for SpiralLayout {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 400.0,
            padding: 5.0,
        }
    }
}

impl SpiralLayout {
    fn fits_canvas(&self, rect: &Rect) -> bool {
        rect.x0 >= -self.width / 2.0
            && rect.x1 <= self.width / 2.0
            && rect.y0 >= -self.height / 2.0
            && rect.y1 <= self.height / 2.0
    }
}

impl WordLayout for SpiralLayout {
    fn place(&self, words: &[WordWeight]) -> Vec<PositionedWord> {
        let max_radius = (self.width.powi(2) + self.height.powi(2)).sqrt() / 2.0;
        let aspect = self.width / self.height;
        let mut placed: Vec<(Rect, PositionedWord)> = Vec::new();

        for (index, word) in words.iter().enumerate() {
            let size = word.font_size();
            // every other word is set vertically
            let rotate = if index % 2 == 1 { 90 } else { 0 };
            let long = word.word.chars().count() as f64 * size as f64 * GLYPH_WIDTH;
            let short = size as f64;
            let (w, h) = if rotate == 0 { (long, short) } else { (short, long) };

            let mut t = 0.0_f64;
            while t * aspect <= max_radius {
                let x = aspect * t * t.cos();
                let y = t * t.sin();
                let rect = Rect::around(x, y, w, h);
                if self.fits_canvas(&rect)
                    && placed.iter().all(|(r, _)| !r.overlaps(&rect, self.padding))
                {
                    placed.push((
                        rect,
                        PositionedWord {
                            text: word.word.clone(),
                            size,
                            x: x.round(),
                            y: y.round(),
                            rotate,
                        },
                    ));
                    break;
                }
                t += SPIRAL_STEP;
            }
        }

        placed.into_iter().map(|(_, word)| word).collect()
    }
}
