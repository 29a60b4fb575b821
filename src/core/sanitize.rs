// src/core/sanitize.rs

pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ").replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Drop quotes and trim: `"\"Lufthansa\" "` → `Lufthansa`.
pub fn unquote(s: &str) -> String {
    s.replace('"', "").trim().to_string()
}

/// Drop quotes and commas and trim. Used for carrier and airport codes.
pub fn clean_code(s: &str) -> String {
    s.chars()
        .filter(|&c| c != '"' && c != ',')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Carrier + flight number shape: alphanumeric, not purely numeric.
pub fn is_flight_code(s: &str) -> bool {
    !s.is_empty()
        && s.chars().all(char::is_alphanumeric)
        && !s.chars().all(char::is_numeric)
}

/// One level of backslash unescaping, the way the captured responses were
/// escaped: `\\`, `\"`, `\'`, control escapes, `\xHH`, `\uHHHH`, `\UHHHHHHHH`.
/// Unknown escapes are kept verbatim.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            'a' => out.push('\u{7}'),
            'x' | 'u' | 'U' => {
                let width = match esc { 'x' => 2, 'u' => 4, _ => 8 };
                let hex: String = take_hex(&mut chars, width);
                match u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == width) {
                    Some(hi) if (0xD800..0xDC00).contains(&hi) => {
                        out.push(low_surrogate(&mut chars, hi).unwrap_or('\u{FFFD}'));
                    }
                    Some(cp) => out.push(char::from_u32(cp).unwrap_or('\u{FFFD}')),
                    None => {
                        out.push('\\');
                        out.push(esc);
                        out.push_str(&hex);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

fn take_hex<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>, width: usize) -> String {
    let mut hex = String::with_capacity(width);
    while hex.len() < width {
        match chars.peek() {
            Some(c) if c.is_ascii_hexdigit() => {
                hex.push(*c);
                chars.next();
            }
            _ => break,
        }
    }
    hex
}

/// Pair a high surrogate with a following `\uDCxx` escape.
fn low_surrogate<I: Iterator<Item = char> + Clone>(
    chars: &mut std::iter::Peekable<I>,
    hi: u32,
) -> Option<char> {
    let mut probe = chars.clone();
    if probe.next()? != '\\' || probe.next()? != 'u' {
        return None;
    }
    let hex = take_hex(&mut probe, 4);
    let lo = u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == 4)?;
    if !(0xDC00..0xE000).contains(&lo) {
        return None;
    }
    *chars = probe;
    char::from_u32(0x10000 + ((hi - 0xD800) << 10) + (lo - 0xDC00))
}
