//! Multi-line text entity.

use serde::{Deserialize, Serialize};

use super::EntityCommon;
use crate::types::{Handle, Vector3};

/// A multi-line MTEXT entity.
///
/// `value` keeps the raw inline formatting codes; [`MText::plain_text`]
/// strips them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MText {
    /// Common entity data
    pub common: EntityCommon,
    /// Raw text value with inline formatting codes
    pub value: String,
    /// Insertion point
    pub insertion: Vector3,
    /// Extrusion normal
    pub normal: Vector3,
    /// X axis direction of the text box
    pub direction: Vector3,
    /// Reference rectangle width
    pub rect_width: f64,
    /// Nominal text height
    pub height: f64,
    /// Attachment point code (1-9, top-left to bottom-right)
    pub attachment: u16,
    /// Drawing direction code (1 = left-to-right, 3 = top-to-bottom, 5 = by style)
    pub drawing_direction: u16,
    /// Line spacing style code
    pub line_spacing_style: u16,
    /// Line spacing factor
    pub line_spacing_factor: f64,
    /// Background fill flags (AC1018+)
    pub background_flags: Option<u32>,
    /// Text style handle
    pub style_handle: Handle,
}

impl MText {
    /// Rotation of the text box in radians, derived from the X axis
    /// direction.
    pub fn rotation(&self) -> f64 {
        self.direction.y.atan2(self.direction.x)
    }

    /// Strip MTEXT inline formatting codes, yielding displayable text.
    ///
    /// Handles `\P`/`\X` (newline), `\~` (hard space), escaped `\\`, `\{`,
    /// `\}`, `{}` grouping braces, `\U+XXXX` unicode escapes, `\S…;`
    /// stacked fractions, toggles like `\L`/`\O`/`\K`, and parameterized
    /// codes (`\f…;`, `\H…;`, `\C…;` …) which are dropped with their
    /// arguments.
    pub fn plain_text(&self) -> String {
        let value = &self.value;
        let chars: Vec<char> = value.chars().collect();
        let n = chars.len();
        let mut out = String::with_capacity(value.len());
        let mut i = 0;

        while i < n {
            let ch = chars[i];

            if ch == '{' || ch == '}' {
                i += 1;
                continue;
            }
            if ch != '\\' {
                out.push(ch);
                i += 1;
                continue;
            }
            if i + 1 >= n {
                out.push('\\');
                break;
            }

            let code = chars[i + 1];
            match code {
                '\\' | '{' | '}' => {
                    out.push(code);
                    i += 2;
                }
                'P' | 'X' => {
                    out.push('\n');
                    i += 2;
                }
                '~' => {
                    out.push(' ');
                    i += 2;
                }
                'L' | 'l' | 'O' | 'o' | 'K' | 'k' => {
                    i += 2;
                }
                'U' | 'u' if i + 6 < n && chars[i + 2] == '+' => {
                    let digits: String = chars[i + 3..i + 7].iter().collect();
                    if let Ok(cp) = u32::from_str_radix(&digits, 16) {
                        if let Some(decoded) = char::from_u32(cp) {
                            out.push(decoded);
                            i += 7;
                            continue;
                        }
                    }
                    out.push(code);
                    i += 2;
                }
                'S' => {
                    i += 2;
                    while i < n && chars[i] != ';' {
                        let token = chars[i];
                        out.push(if token == '#' || token == '^' {
                            '/'
                        } else {
                            token
                        });
                        i += 1;
                    }
                    if i < n {
                        i += 1;
                    }
                }
                'A' | 'C' | 'c' | 'F' | 'f' | 'H' | 'h' | 'Q' | 'q' | 'T' | 't' | 'W'
                | 'w' | 'p' => {
                    i += 2;
                    while i < n && chars[i] != ';' {
                        i += 1;
                    }
                    if i < n {
                        i += 1;
                    }
                }
                _ => {
                    out.push(code);
                    i += 2;
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mtext_with(value: &str) -> MText {
        MText {
            common: EntityCommon::default(),
            value: value.to_string(),
            insertion: Vector3::ZERO,
            normal: Vector3::UNIT_Z,
            direction: Vector3::new(1.0, 0.0, 0.0),
            rect_width: 100.0,
            height: 2.5,
            attachment: 1,
            drawing_direction: 1,
            line_spacing_style: 1,
            line_spacing_factor: 1.0,
            background_flags: None,
            style_handle: Handle::NULL,
        }
    }

    #[test]
    fn test_plain_text_newlines() {
        let m = mtext_with("first\\Psecond");
        assert_eq!(m.plain_text(), "first\nsecond");
    }

    #[test]
    fn test_plain_text_strips_formatting() {
        let m = mtext_with("{\\fArial|b0;Hello} \\LWorld\\l");
        assert_eq!(m.plain_text(), "Hello World");
    }

    #[test]
    fn test_plain_text_stacked_fraction() {
        let m = mtext_with("\\S1#2;");
        assert_eq!(m.plain_text(), "1/2");
    }

    #[test]
    fn test_plain_text_unicode_escape() {
        let m = mtext_with("\\U+00D8 pipe");
        assert_eq!(m.plain_text(), "\u{00D8} pipe");
    }

    #[test]
    fn test_rotation_from_direction() {
        let mut m = mtext_with("x");
        m.direction = Vector3::new(0.0, 1.0, 0.0);
        assert!((m.rotation() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
