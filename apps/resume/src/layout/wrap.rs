//! Greedy line breaking for Japanese/Latin mixed text.
//!
//! Hard breaks (`\n`) always start a new line. Latin words only break at
//! whitespace; CJK text may break between any two characters. A word wider
//! than the line is split per character. No character is ever dropped:
//! indentation, space runs and tabs are kept verbatim, and whitespace at a
//! break hangs at the end of the earlier line.
//!
//! There is no kinsoku processing, so a line may start with `。` or `」`.

use crate::layout::font_metrics::{allows_break_around, FontMetricTable};

/// Wraps `text` to lines no wider than `max_width_pt` at `size_pt`.
///
/// Returns no lines for empty input. Blank lines inside the text are kept.
pub fn wrap_text(
    text: &str,
    max_width_pt: f32,
    size_pt: f32,
    metrics: &FontMetricTable,
) -> Vec<String> {
    let text = text.trim_end_matches(|c: char| c == '\n' || c == '\r');
    if text.is_empty() {
        return Vec::new();
    }

    let max_em = (max_width_pt / size_pt).max(metrics.fullwidth_em);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph.trim_end_matches('\r'), max_em, metrics, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, max_em: f32, metrics: &FontMetricTable, out: &mut Vec<String>) {
    let mut line = String::new();
    // Width of the line up to its last word. Whitespace after the last word
    // hangs past the margin until another word follows it.
    let mut width = 0.0_f32;
    let mut hanging = 0.0_f32;
    let mut has_word = false;

    for token in tokenize(paragraph) {
        let word = match token {
            Token::Space(space) => {
                line.push_str(space);
                if has_word {
                    hanging += metrics.measure_str(space);
                } else {
                    // Indentation at the start of a paragraph.
                    width += metrics.measure_str(space);
                }
                continue;
            }
            Token::Word(word) => word,
        };

        let word_w = metrics.measure_str(word);
        if !line.is_empty() && width + hanging + word_w > max_em {
            out.push(std::mem::take(&mut line));
            width = 0.0;
        } else {
            width += hanging;
        }
        hanging = 0.0;
        has_word = true;

        if word_w > max_em {
            // Overlong word: fill lines character by character.
            for c in word.chars() {
                let c_w = metrics.char_width_em(c);
                if !line.is_empty() && width + c_w > max_em {
                    out.push(std::mem::take(&mut line));
                    width = 0.0;
                }
                line.push(c);
                width += c_w;
            }
        } else {
            line.push_str(word);
            width += word_w;
        }
    }

    out.push(line);
}

enum Token<'a> {
    Word(&'a str),
    Space(&'a str),
}

/// Splits a paragraph into breakable units: runs of half-width non-space
/// characters, single CJK characters, and whitespace runs kept verbatim.
fn tokenize(paragraph: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    // Start of the current run and whether it is whitespace.
    let mut run: Option<(usize, bool)> = None;

    fn close<'a>(
        paragraph: &'a str,
        run: Option<(usize, bool)>,
        end: usize,
        tokens: &mut Vec<Token<'a>>,
    ) {
        match run {
            Some((start, true)) => tokens.push(Token::Space(&paragraph[start..end])),
            Some((start, false)) => tokens.push(Token::Word(&paragraph[start..end])),
            None => {}
        }
    }

    for (i, c) in paragraph.char_indices() {
        let space = c.is_whitespace();
        if !space && allows_break_around(c) {
            close(paragraph, run.take(), i, &mut tokens);
            tokens.push(Token::Word(&paragraph[i..i + c.len_utf8()]));
            continue;
        }
        match run {
            Some((_, in_space)) if in_space == space => {}
            _ => {
                close(paragraph, run.take(), i, &mut tokens);
                run = Some((i, space));
            }
        }
    }
    close(paragraph, run, paragraph.len(), &mut tokens);
    tokens
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::{get_metrics, FontFace};

    fn metrics() -> &'static FontMetricTable {
        get_metrics(FontFace::Mincho)
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        assert!(wrap_text("", 100.0, 10.0, metrics()).is_empty());
        assert!(wrap_text("\n", 100.0, 10.0, metrics()).is_empty());
    }

    #[test]
    fn test_short_text_single_line() {
        assert_eq!(wrap_text("A大学", 100.0, 10.0, metrics()), vec!["A大学"]);
    }

    #[test]
    fn test_hard_breaks_are_kept() {
        let lines = wrap_text("B社 - エンジニア\n設計と実装\n\n運用", 400.0, 9.0, metrics());
        assert_eq!(lines, vec!["B社 - エンジニア", "設計と実装", "", "運用"]);
    }

    #[test]
    fn test_cjk_breaks_between_characters() {
        // 10 full-width characters at 10pt = 100pt; 45pt holds 4 per line.
        let lines = wrap_text("あいうえおかきくけこ", 45.0, 10.0, metrics());
        assert_eq!(lines, vec!["あいうえ", "おかきく", "けこ"]);
    }

    #[test]
    fn test_latin_breaks_at_spaces() {
        // At 10pt "alpha" is 25pt, "beta" 20pt, a space 5pt; 60pt fits two words.
        let lines = wrap_text("alpha beta gamma", 60.0, 10.0, metrics());
        assert_eq!(lines, vec!["alpha beta ", "gamma"]);
    }

    #[test]
    fn test_overlong_word_is_split() {
        let word = "x".repeat(30);
        let lines = wrap_text(&word, 50.0, 10.0, metrics());
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() <= 10));
    }

    #[test]
    fn test_lines_never_exceed_width() {
        let text = "私はWebアプリケーション開発に5年間従事し、Rust と TypeScript を用いた \
                    高トラフィックなサービスの設計・実装・運用を担当してきました。";
        let max = 120.0;
        for line in wrap_text(text, max, 9.0, metrics()) {
            let printed = line.trim_end();
            assert!(metrics().width_pt(printed, 9.0) <= max + 1e-3, "line too wide: {line}");
        }
    }

    #[test]
    fn test_wrapping_never_drops_characters() {
        let text = "　志望動機:  御社の「ものづくり」への姿勢に共感しました。\nexperience\twith   distributed systems";
        let lines = wrap_text(text, 70.0, 9.0, metrics());
        assert!(lines.len() > 2);
        assert_eq!(lines.concat(), text.replace('\n', ""));
    }

    #[test]
    fn test_indentation_and_space_runs_are_literal() {
        let text = "　私は御社を志望します。\nA  B\tC";
        let lines = wrap_text(text, 400.0, 9.0, metrics());
        assert_eq!(lines, vec!["　私は御社を志望します。", "A  B\tC"]);
    }

    #[test]
    fn test_closing_punctuation_may_start_a_line() {
        // No kinsoku: "。" is just another full-width character.
        let lines = wrap_text("あいう。", 35.0, 10.0, metrics());
        assert_eq!(lines, vec!["あいう", "。"]);
    }

    #[test]
    fn test_whitespace_only_line_is_kept() {
        let lines = wrap_text("前文\n　　\n本文", 400.0, 9.0, metrics());
        assert_eq!(lines, vec!["前文", "　　", "本文"]);
    }

    #[test]
    fn test_indent_counts_towards_first_line_width() {
        // A full-width indent takes one of the four slots on the first line.
        let lines = wrap_text("　あいうえお", 45.0, 10.0, metrics());
        assert_eq!(lines, vec!["　あいう", "えお"]);
    }
}
