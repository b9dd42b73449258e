//! A 3x5 pixel font, enough for dialogue boxes.

use farmstead_engine::{Layer, Point, Rect, Rgba};

pub(crate) const GLYPH_WIDTH: u32 = 3;
pub(crate) const GLYPH_HEIGHT: u32 = 5;
/// Horizontal advance per character, in unscaled pixels.
pub(crate) const ADVANCE: u32 = GLYPH_WIDTH + 1;
pub(crate) const LINE_HEIGHT: u32 = GLYPH_HEIGHT + 2;

/// Rows top to bottom; bit 2 is the leftmost column.
type Glyph = [u8; 5];

fn glyph(c: char) -> Glyph {
    match c.to_ascii_uppercase() {
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b110, 0b001, 0b010, 0b100, 0b111],
        '3' => [0b110, 0b001, 0b010, 0b001, 0b110],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b110, 0b001, 0b110],
        '6' => [0b011, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b110],
        ' ' => [0; 5],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        '!' => [0b010, 0b010, 0b010, 0b000, 0b010],
        '\'' => [0b010, 0b010, 0b000, 0b000, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '[' => [0b011, 0b010, 0b010, 0b010, 0b011],
        ']' => [0b110, 0b010, 0b010, 0b010, 0b110],
        _ => [0b110, 0b001, 0b010, 0b000, 0b010],
    }
}

/// Draws one line of `text` with its top-left at `at`. Characters past the
/// layer edge are clipped.
pub(crate) fn draw_text(layer: &mut Layer, text: &str, at: Point, scale: u32, color: Rgba) {
    let scale = scale.max(1);
    let mut x = at.x;
    for c in text.chars() {
        let rows = glyph(c);
        for (row, bits) in rows.iter().enumerate() {
            for column in 0..GLYPH_WIDTH {
                if bits & (0b100 >> column) == 0 {
                    continue;
                }
                layer.fill_rect(
                    Rect::new(
                        x + (column * scale) as i32,
                        at.y + (row as u32 * scale) as i32,
                        scale,
                        scale,
                    ),
                    color,
                );
            }
        }
        x += (ADVANCE * scale) as i32;
    }
}

/// Greedy word wrap. Explicit newlines start a new line; words longer than
/// `max_columns` are split.
pub(crate) fn wrap(text: &str, max_columns: usize) -> Vec<String> {
    let max_columns = max_columns.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > max_columns {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let rest = word.split_off(max_columns);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let line_len = line.chars().count();
            let needed = if line.is_empty() {
                word.len()
            } else {
                line_len + 1 + word.len()
            };
            if needed > max_columns {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.extend(word);
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use farmstead_engine::{Size, TRANSPARENT};

    use super::*;

    const INK: Rgba = [255, 255, 255, 255];

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        assert_eq!(
            wrap("plant the seeds today", 10),
            vec!["plant the", "seeds", "today"]
        );
    }

    #[test]
    fn wrap_keeps_explicit_newlines_and_splits_long_words() {
        assert_eq!(wrap("hi\nabcdefgh", 3), vec!["hi", "abc", "def", "gh"]);
        assert_eq!(wrap("", 5), vec![""]);
    }

    #[test]
    fn draw_text_scales_glyph_pixels() {
        let mut layer = Layer::new(Size::new(16, 10));
        draw_text(&mut layer, "I", Point::ORIGIN, 2, INK);
        let image = layer.image();
        // Top bar of `I` spans all three columns.
        assert_eq!(image.pixel(Point::new(0, 0)), Some(INK));
        assert_eq!(image.pixel(Point::new(5, 1)), Some(INK));
        // Second row only has the middle column.
        assert_eq!(image.pixel(Point::new(0, 2)), Some(TRANSPARENT));
        assert_eq!(image.pixel(Point::new(2, 2)), Some(INK));
    }

    #[test]
    fn lowercase_and_unknown_characters_render() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph('~'), glyph('?'));
        assert_ne!(glyph('?'), glyph(' '));
    }
}
