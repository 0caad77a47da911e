//! # Greedy Longest-Match Segmentation

/// Decompose an escaped token into subtokens by greedy longest match.
///
/// At each position the longest symbol (in characters, bounded by
/// `max_subtoken_len`) accepted by `contains` wins. The same routine is used
/// while learning a vocabulary (against the in-progress symbol table) and at
/// runtime (against the frozen dictionary).
///
/// NOTE: greedy matching won't necessarily produce the "best" decomposition.
///
/// ## Arguments
/// * `escaped` - the escaped token.
/// * `max_subtoken_len` - the longest symbol length, in characters.
/// * `contains` - symbol membership test.
///
/// ## Returns
/// The subtoken slices, or `None` when some character has no matching symbol
/// (possible only for characters outside the alphabet).
pub fn greedy_segment<'a, F>(
    escaped: &'a str,
    max_subtoken_len: usize,
    contains: F,
) -> Option<Vec<&'a str>>
where
    F: Fn(&str) -> bool,
{
    // Byte offsets of the character boundaries; slicing below is always on
    // a boundary.
    let mut bounds: Vec<usize> = escaped.char_indices().map(|(i, _)| i).collect();
    bounds.push(escaped.len());
    let token_len = bounds.len() - 1;

    let mut subtokens = Vec::new();
    let mut start = 0;

    while start < token_len {
        let limit = token_len.min(start + max_subtoken_len);
        let mut matched = None;

        for end in (start + 1..=limit).rev() {
            let candidate = &escaped[bounds[start]..bounds[end]];
            if contains(candidate) {
                matched = Some((candidate, end));
                break;
            }
        }

        match matched {
            Some((candidate, end)) => {
                subtokens.push(candidate);
                start = end;
            }
            None => return None,
        }
    }

    Some(subtokens)
}
