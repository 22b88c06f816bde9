/*!
 * Greedy line wrapping with forced hard splits.
 */

/// Average glyph advance as a fraction of the font size
pub const CHAR_WIDTH_FACTOR: f64 = 0.55;

/// Characters per display line for a font size and layout
///
/// The usable width is `maxWidth` percent of the canvas minus both horizontal
/// margins, so larger fonts wrap more aggressively. Never returns less than 1.
pub fn char_budget(font_size: u32, max_width_percent: f64, margin_h: u32, canvas_width: u32) -> usize {
    let percent = if max_width_percent.is_finite() {
        max_width_percent.clamp(0.0, 100.0)
    } else {
        100.0
    };
    let available = canvas_width as f64 * percent / 100.0 - 2.0 * margin_h as f64;
    let glyph = font_size.max(1) as f64 * CHAR_WIDTH_FACTOR;
    let budget = (available / glyph).round();

    if budget.is_finite() && budget >= 1.0 {
        budget as usize
    } else {
        1
    }
}

/// Wrap text into display lines of at most `budget` characters
///
/// Embedded newlines are hard breaks. Words are packed greedily; a word longer
/// than the budget is cut into budget-sized chunks and its remainder becomes the
/// current line. The result always has at least one entry.
pub fn wrap_text(text: &str, budget: usize) -> Vec<String> {
    let budget = budget.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, budget, &mut lines);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn wrap_paragraph(paragraph: &str, budget: usize, lines: &mut Vec<String>) {
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > budget {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(budget).peekable();
            while let Some(chunk) = chunks.next() {
                let piece: String = chunk.iter().collect();
                if chunks.peek().is_some() {
                    lines.push(piece);
                } else {
                    current_len = chunk.len();
                    current = piece;
                }
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= budget {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
}
