use crate::media::split_extension;
use crate::resolve::NameIndex;

/// Localized "edited" markers, English first
const EDITED_SUFFIXES: &[&str] = &[
    "-edited",      // EN
    "-edytowane",   // PL
    "-bearbeitet",  // DE
    "-bewerkt",     // NL
    "-編集済み",     // JA
    "-modificato",  // IT
    "-modifié",     // FR
    "-ha editado",  // ES
    "-editat",      // CA
];

/// Find the locally edited copy of `media_name` in the same directory, if any.
/// `IMG_1.jpg` -> `IMG_1-edited.jpg` (case-insensitive, real casing returned).
pub fn find_edited_variant(media_name: &str, index: &NameIndex) -> Option<String> {
    let (stem, ext) = split_extension(media_name);
    EDITED_SUFFIXES.iter().find_map(|marker| {
        index
            .lookup(&format!("{}{}{}", stem, marker, ext))
            .map(str::to_string)
    })
}
