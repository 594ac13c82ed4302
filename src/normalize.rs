// Canonical lookup keys for the merge columns.
//
// The spreadsheet and the mapping files are maintained by different hands, so
// the same client or service shows up as "Pintura Externa", "PINTURA EXTERNA"
// or "pintura  externa". Every join in the pipeline goes through `norm_key`
// on both sides so those spellings meet on the same key.
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize free text into a lookup key.
///
/// Absent input is the empty string. The text is trimmed, lowercased,
/// NFKD-decomposed with the combining marks stripped (accent-insensitive
/// matching: `Água` and `agua` produce the same key), and runs of whitespace
/// collapse to a single space.
///
/// The function is pure and idempotent: `norm_key` of an already-normalized
/// key returns it unchanged, which is what lets keys built independently on
/// the raw side and the mapping side of a merge agree.
pub fn norm_key(input: Option<&str>) -> String {
    let Some(raw) = input else {
        return String::new();
    };
    let lowered = raw.trim().to_lowercase();
    let stripped: String = lowered.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
