// src/core/html.rs
// Case-insensitive tag scanning over saved result pages. No DOM.

pub fn to_lower(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

/// Next `<o …>…c` block at or after `from`, as byte offsets. `lc` is the
/// document already passed through [`to_lower`]; offsets line up with the
/// original since only ASCII is folded.
pub fn next_tag_block_ci(lc: &str, o: &str, c: &str, from: usize) -> Option<(usize, usize)> {
    let ol = to_lower(o);
    let cl = to_lower(c);
    let start = lc.get(from..)?.find(&ol)? + from;
    let open_end = lc[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&cl)?;
    let end = open_end + end_rel + cl.len();
    Some((start, end))
}

pub fn inner_after_open_tag(block: &str) -> String {
    if let Some(oe) = block.find('>') {
        if let Some(cs) = block.rfind('<') {
            if cs > oe {
                return block[oe + 1..cs].to_string();
            }
        }
    }
    s!()
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    super::sanitize::normalize_ws(&out)
}

/// Does the opening tag carry `class` in its class list? Class names compare
/// case-sensitively; quotes may be single, double or absent.
pub fn has_class(open_tag: &str, class: &str) -> bool {
    let lc = to_lower(open_tag);
    let Some(at) = lc.find("class=") else { return false };
    let rest = &open_tag[at + "class=".len()..];
    let value = match rest.chars().next() {
        Some(q @ ('"' | '\'')) => rest[1..].split(q).next().unwrap_or(""),
        _ => rest
            .split(|c: char| c.is_whitespace() || c == '>')
            .next()
            .unwrap_or(""),
    };
    value.split_whitespace().any(|c| c == class)
}

/// Visible text of every `<tag class="…class…">` element, in document order.
pub fn texts_by_class(doc: &str, tag: &str, class: &str) -> Vec<String> {
    let open = join!("<", tag);
    let close = join!("</", tag, ">");
    let lc = to_lower(doc);
    let mut out = Vec::new();
    let mut pos = 0usize;

    while let Some((s, e)) = next_tag_block_ci(&lc, &open, &close, pos) {
        let block = &doc[s..e];
        pos = e;

        // "<span" must not match "<spanner"
        let after = block[open.len()..].chars().next();
        if !matches!(after, Some(c) if c.is_whitespace() || c == '>') {
            pos = s + open.len();
            continue;
        }
        let open_end = block.find('>').map(|i| i + 1).unwrap_or(block.len());
        if has_class(&block[..open_end], class) {
            let inner = inner_after_open_tag(block);
            out.push(strip_tags(super::sanitize::normalize_entities(&inner)));
        }
    }
    out
}
