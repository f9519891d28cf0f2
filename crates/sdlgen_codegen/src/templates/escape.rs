/// Renders `s` as a Rust raw string literal, with enough `#`s that no
/// quote inside the text can terminate it.
#[must_use]
pub fn raw_string_literal(s: &str) -> String {
    let mut hashes = 1;
    let bytes = s.as_bytes();
    for (i, _) in s.match_indices('"') {
        let run = bytes[i + 1..].iter().take_while(|&&b| b == b'#').count();
        hashes = hashes.max(run + 1);
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{s}\"{fence}")
}
