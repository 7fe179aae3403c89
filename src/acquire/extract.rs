/// Markers that precede the track id inside a share link. Matching is
/// case-insensitive and the leftmost marker followed by at least one id
/// character wins.
const ID_MARKERS: &[&str] = &["?v=", "&v=", "v/", "be/", "embed/"];

fn is_id_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Extract the track id from a share link, e.g.
/// `https://youtu.be/abc123` or `https://example.com/watch?v=abc123`.
/// Returns `None` when no marker is followed by an id, in which case the
/// caller must not issue any network request.
pub fn extract_source_id(link: &str) -> Option<String> {
    let lower = link.to_ascii_lowercase();
    let bytes = link.as_bytes();

    let mut best: Option<(usize, String)> = None;
    for marker in ID_MARKERS {
        let mut from = 0;
        while let Some(rel) = lower[from..].find(marker) {
            let at = from + rel;
            let id_start = at + marker.len();
            let id: String = bytes[id_start.min(bytes.len())..]
                .iter()
                .take_while(|b| is_id_byte(**b))
                .map(|b| *b as char)
                .collect();

            if !id.is_empty() && best.as_ref().is_none_or(|(p, _)| at < *p) {
                best = Some((at, id));
            }
            from = at + 1;
        }
    }

    best.map(|(_, id)| id)
}
