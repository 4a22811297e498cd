use super::scan::{balanced_close, split_top_level};

/// Body of the first `{{name ...}}` template in `markup`, without the name.
///
/// The name matches case-insensitively with `_` and space treated alike.
/// When the braces never balance the body ends at the first `}}` on its own
/// line, or failing that the first `}}` anywhere.
pub fn find_template<'a>(markup: &'a str, name: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(rel) = markup[from..].find("{{") {
        let after_open = from + rel + 2;
        if let Some(body_start) = match_name(markup, after_open, name) {
            return template_body(markup, body_start);
        }
        from = after_open;
    }
    None
}

fn match_name(markup: &str, at: usize, name: &str) -> Option<usize> {
    let rest = &markup[at..];
    let candidate = rest.trim_start();
    let offset = at + (rest.len() - candidate.len());

    let mut chars = candidate.chars();
    let mut consumed = 0;
    for expected in name.chars() {
        let got = chars.next()?;
        if fold(got) != fold(expected) {
            return None;
        }
        consumed += got.len_utf8();
    }

    match candidate[consumed..].chars().next() {
        None | Some('|') | Some('}') => Some(offset + consumed),
        Some(c) if c.is_whitespace() => Some(offset + consumed),
        _ => None,
    }
}

fn fold(c: char) -> char {
    if c == '_' {
        ' '
    } else {
        c.to_ascii_lowercase()
    }
}

fn template_body(markup: &str, body_start: usize) -> Option<&str> {
    if let Some(close) = balanced_close(markup, body_start, "{{", "}}") {
        return Some(&markup[body_start..close]);
    }
    let rest = &markup[body_start..];
    rest.find("\n}}")
        .or_else(|| rest.find("}}"))
        .map(|end| &rest[..end])
}

/// Trimmed value of the first `| key = value` parameter named `key`, or `""`.
///
/// Parameters start on lines beginning with `|`; a value runs until the next
/// such line, so it may span lines and an unclosed link stays inside its own
/// parameter. One-line templates (`{{T|a=1|b=2}}`) are split on top-level
/// pipes instead.
pub fn field<'a>(block: &'a str, key: &str) -> &'a str {
    let multi_line = block
        .lines()
        .skip(1)
        .any(|line| line.trim_start().starts_with('|'));
    let params = if multi_line {
        param_lines(block)
    } else {
        split_top_level(block, b'|').into_iter().skip(1).collect()
    };
    params
        .into_iter()
        .find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim().eq_ignore_ascii_case(key).then(|| value.trim())
        })
        .unwrap_or("")
}

/// Text of each parameter after its leading pipe, up to the next parameter line.
fn param_lines(block: &str) -> Vec<&str> {
    let mut starts = Vec::new();
    let mut offset = 0;
    for line in block.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('|') {
            starts.push(offset + (line.len() - trimmed.len()) + 1);
        }
        offset += line.len();
    }

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).map_or(block.len(), |&next| {
                block[..next - 1].rfind('\n').map_or(next - 1, |nl| nl + 1)
            });
            &block[start..end.max(start)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "Intro text.\n{{Infobox_quest\n|name = Clearer Skies\n|image = Clearer_Skies.png\n|trader = [[Shani]]\n|previous = [[Picking Up The Pieces]]\n|next = [[Trash Into Treasure]]<br>[[Off The Radar|Off the Radar]]\n}}\n\n== Objectives ==\n";

    #[test]
    fn finds_block_and_fields() {
        let block = find_template(PAGE, "Infobox_quest").unwrap();
        assert_eq!(field(block, "previous"), "[[Picking Up The Pieces]]");
        assert_eq!(
            field(block, "next"),
            "[[Trash Into Treasure]]<br>[[Off The Radar|Off the Radar]]"
        );
        assert_eq!(field(block, "trader"), "[[Shani]]");
    }

    #[test]
    fn name_ignores_case_and_underscores() {
        let markup = "{{ infobox Quest | previous = A }}";
        let block = find_template(markup, "Infobox_quest").unwrap();
        assert_eq!(field(block, "previous"), "A");
    }

    #[test]
    fn longer_template_name_does_not_match() {
        assert!(find_template("{{Infobox_questline|previous=A}}", "Infobox_quest").is_none());
    }

    #[test]
    fn missing_template() {
        assert!(find_template("no templates {{Other|x=1}}", "Infobox_quest").is_none());
    }

    #[test]
    fn nested_templates_do_not_end_block() {
        let markup = "{{Infobox_quest\n|reward = {{Item|Bandage}}\n|next = [[Later]]\n}}";
        let block = find_template(markup, "Infobox_quest").unwrap();
        assert_eq!(field(block, "next"), "[[Later]]");
        assert_eq!(field(block, "reward"), "{{Item|Bandage}}");
    }

    #[test]
    fn unbalanced_falls_back_to_closing_line() {
        let markup = "{{Infobox_quest\n|previous = {{Broken\n|next = [[B]]\n}}\ntrailing";
        let block = find_template(markup, "Infobox_quest").unwrap();
        assert!(block.ends_with("[[B]]"));
    }

    #[test]
    fn first_match_wins_and_keys_are_case_insensitive() {
        let block = "\n|Previous = [[First]]\n|previous = [[Second]]\n";
        assert_eq!(field(block, "previous"), "[[First]]");
    }

    #[test]
    fn absent_field_is_empty() {
        assert_eq!(field("\n|name = X\n", "next"), "");
        assert_eq!(field("\n|next =\n|name = X", "next"), "");
    }

    #[test]
    fn unclosed_link_stays_in_its_own_parameter() {
        let markup = "{{Infobox_quest\n|previous = [[Broken\n|next = [[Later]]\n}}";
        let block = find_template(markup, "Infobox_quest").unwrap();
        assert_eq!(field(block, "previous"), "[[Broken");
        assert_eq!(field(block, "next"), "[[Later]]");
    }

    #[test]
    fn one_line_template_splits_on_pipes() {
        let block = "|previous=[[A|Aye]]|next={{Q|B}}";
        assert_eq!(field(block, "previous"), "[[A|Aye]]");
        assert_eq!(field(block, "next"), "{{Q|B}}");
    }

    #[test]
    fn first_line_parameter_of_multi_line_template() {
        let block = "|name = X\n  | previous = [[A]]\n|next = [[B]]";
        assert_eq!(field(block, "name"), "X");
        assert_eq!(field(block, "previous"), "[[A]]");
        assert_eq!(field(block, "next"), "[[B]]");
    }

    #[test]
    fn multi_line_values() {
        let block = "\n|previous =\n* [[A]]\n* [[B]]\n|next = \n";
        assert_eq!(field(block, "previous"), "* [[A]]\n* [[B]]");
    }
}
