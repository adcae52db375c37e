//! Client-side filename sanitization.
//!
//! Mirrors the server's own cleanup so the client can predict the stored
//! name of a file before uploading it.

/// Name used when nothing usable is left of the raw filename.
pub const FALLBACK_NAME: &str = "upload.bin";

/// Maximum length of the stem (the part before the extension).
pub const MAX_STEM_LEN: usize = 128;

fn transliterate(c: char) -> Option<&'static str> {
    match c {
        'Ä' => Some("Ae"),
        'ä' => Some("ae"),
        'Ö' => Some("Oe"),
        'ö' => Some("oe"),
        'Ü' => Some("Ue"),
        'ü' => Some("ue"),
        'ß' => Some("ss"),
        ' ' => Some("_"),
        _ => None,
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Maps a raw filename to the name the file will be stored under.
///
/// The extension (everything from the last `.` of the final path segment) is
/// kept verbatim. The stem is transliterated, restricted to `[A-Za-z0-9._-]`,
/// stripped of repeated and surrounding underscores, and capped at
/// [`MAX_STEM_LEN`] characters. Never returns an empty string, and
/// `sanitize(&sanitize(x)) == sanitize(x)` for every input.
pub fn sanitize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return FALLBACK_NAME.to_string();
    }

    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let (stem, extension) = match base.rfind('.') {
        Some(idx) => (&base[..idx], &base[idx..]),
        None => (base, ""),
    };

    let mut transliterated = String::with_capacity(stem.len());
    for c in stem.chars() {
        match transliterate(c) {
            Some(replacement) => transliterated.push_str(replacement),
            None => transliterated.push(c),
        }
    }

    // Disallowed runs become one underscore, and underscore runs collapse.
    let mut cleaned = String::with_capacity(transliterated.len());
    for c in transliterated.chars() {
        let c = if is_allowed(c) { c } else { '_' };
        if c == '_' && cleaned.ends_with('_') {
            continue;
        }
        cleaned.push(c);
    }

    let mut stem = cleaned.trim_matches('_').to_string();
    if stem.len() > MAX_STEM_LEN {
        // ASCII only at this point, so byte and char boundaries agree.
        stem.truncate(MAX_STEM_LEN);
        stem.truncate(stem.trim_end_matches('_').len());
    }

    let name = stem + extension;
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}
