//! Minimal HTML table extraction.
//!
//! Only understands as much markup as a stats table needs: `<table>`, `<tr>`,
//! `<th>`/`<td>` (with `colspan`), `<br>` and comments. Everything else is
//! skipped and only its text content survives.

/// Returns the rows of the first `<table>` in `html`, cell text trimmed and
/// entity-decoded. Cells spanning several columns are repeated once per column.
pub fn first_table_rows(html: &str) -> Option<Vec<Vec<String>>> {
    let lc = html.to_ascii_lowercase();
    let mut scanner = TableScanner::default();
    let mut pos = 0;
    let mut text_from = 0;

    while let Some(rel) = lc[pos..].find('<') {
        let lt = pos + rel;
        scanner.text(&html[text_from..lt]);

        if lc[lt..].starts_with("<!--") {
            let end = lc[lt..].find("-->").map(|e| lt + e + 3).unwrap_or(lc.len());
            pos = end;
            text_from = end;
            continue;
        }

        let Some(gt_rel) = lc[lt..].find('>') else {
            break;
        };
        let gt = lt + gt_rel;
        let tag = Tag::parse(&lc[lt + 1..gt]);
        pos = gt + 1;
        text_from = pos;

        if scanner.tag(tag) {
            return Some(scanner.rows);
        }
    }

    // Unterminated table: keep what was read.
    if !scanner.seen_table {
        return None;
    }
    scanner.finish_row();
    Some(scanner.rows)
}

struct Tag<'a> {
    name: &'a str,
    closing: bool,
    attrs: &'a str,
}

impl<'a> Tag<'a> {
    fn parse(inner: &'a str) -> Self {
        let (closing, rest) = match inner.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, inner),
        };
        let name_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        Tag {
            name: &rest[..name_len],
            closing,
            attrs: &rest[name_len..],
        }
    }

    fn colspan(&self) -> usize {
        attr_value(self.attrs, "colspan")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1)
    }
}

#[derive(Default)]
struct TableScanner {
    rows: Vec<Vec<String>>,
    seen_table: bool,
    depth: usize,
    row: Option<Vec<String>>,
    cell: Option<(String, usize)>,
}

impl TableScanner {
    fn text(&mut self, s: &str) {
        if let Some((buf, _)) = self.cell.as_mut() {
            buf.push_str(s);
        }
    }

    /// Feeds one tag; returns true once the outermost table is closed.
    fn tag(&mut self, tag: Tag<'_>) -> bool {
        if tag.name == "table" {
            if tag.closing {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.finish_row();
                    return true;
                }
            } else {
                self.seen_table = true;
                self.depth += 1;
            }
            return false;
        }

        // Outside the table nothing counts; nested tables are flattened into
        // the enclosing cell's text.
        if self.depth != 1 {
            return false;
        }

        match (tag.name, tag.closing) {
            ("tr", false) => {
                self.finish_row();
                self.row = Some(Vec::new());
            }
            ("tr", true) => self.finish_row(),
            ("th" | "td", false) => {
                self.finish_cell();
                if self.row.is_none() {
                    self.row = Some(Vec::new());
                }
                self.cell = Some((String::new(), tag.colspan()));
            }
            ("th" | "td", true) => self.finish_cell(),
            ("br", _) => self.text(" "),
            _ => {}
        }
        false
    }

    fn finish_cell(&mut self) {
        let Some((raw, span)) = self.cell.take() else {
            return;
        };
        let text = normalize_ws(&decode_entities(&raw));
        if let Some(row) = self.row.as_mut() {
            row.extend(std::iter::repeat(text).take(span));
        }
    }

    fn finish_row(&mut self) {
        self.finish_cell();
        if let Some(row) = self.row.take() {
            if !row.is_empty() {
                self.rows.push(row);
            }
        }
    }
}

fn attr_value<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = attrs;
    while let Some(idx) = rest.find(name) {
        let boundary_ok = idx == 0 || !rest.as_bytes()[idx - 1].is_ascii_alphanumeric();
        let after = rest[idx + name.len()..].trim_start();
        if boundary_ok {
            if let Some(value) = after.strip_prefix('=') {
                let value = value.trim_start();
                return Some(match value.chars().next() {
                    Some(q @ ('"' | '\'')) => {
                        let inner = &value[1..];
                        &inner[..inner.find(q).unwrap_or(inner.len())]
                    }
                    _ => {
                        let end = value
                            .find(|c: char| c.is_whitespace() || c == '/')
                            .unwrap_or(value.len());
                        &value[..end]
                    }
                });
            }
        }
        rest = &rest[idx + name.len()..];
    }
    None
}

/// Decodes the handful of named entities stats pages use, plus numeric ones.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &tail[1..semi];
            let ch = match entity {
                "amp" => Some('&'),
                "nbsp" => Some(' '),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((ch, semi + 1))
        });
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapse runs of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
