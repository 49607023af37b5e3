//! Road-name normalization.
//!
//! Free-text road labels arrive from several inconsistent sources (sheet
//! names, column headers, KML placemarks, stored intersection names). This
//! module reduces them to a canonical form so the rest of the pipeline can
//! compare them: uppercase, Spanish accents folded, punctuation stripped,
//! whitespace collapsed, and the fixed road-type vocabulary (avenue / street
//! / alley abbreviations) removed as whole words.
//!
//! The pipeline is deterministic and idempotent: normalizing an already
//! normalized name returns it unchanged.

use regex::Regex;
use std::sync::LazyLock;

/// Road-type prefixes and auxiliary words, matched as whole words after
/// punctuation stripping ("AV." arrives here as "AV", "C.A." as "CA").
/// Longest alternatives first so "AVENIDA" is not consumed as "AV".
static PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(AVENIDA|GENERAL|ALAMEDA|ANTIGUA|ALTURA|JIRON|CALLE|PASEO|NUEVA|GRAL|PSJ|C A|AV|JR|CA|CL)\b",
    )
    .expect("valid regex")
});

/// Everything outside letters, digits, and spaces.
static NON_ALNUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Z0-9 ]").expect("valid regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Folds the Spanish accented characters onto their ASCII base letter.
///
/// Input is expected to be uppercased already; lowercase accents are folded
/// too so callers need not care about ordering.
fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'Á' | 'À' | 'Â' | 'Ä' | 'á' | 'à' | 'â' | 'ä' => 'A',
            'É' | 'È' | 'Ê' | 'Ë' | 'é' | 'è' | 'ê' | 'ë' => 'E',
            'Í' | 'Ì' | 'Î' | 'Ï' | 'í' | 'ì' | 'î' | 'ï' => 'I',
            'Ó' | 'Ò' | 'Ô' | 'Ö' | 'ó' | 'ò' | 'ô' | 'ö' => 'O',
            'Ú' | 'Ù' | 'Û' | 'Ü' | 'ú' | 'ù' | 'û' | 'ü' => 'U',
            'Ñ' | 'ñ' => 'N',
            'Ç' | 'ç' => 'C',
            other => other,
        })
        .collect()
}

/// Normalizes a raw road label to its canonical form.
///
/// The pipeline:
/// 1. Uppercase
/// 2. Fold accents (Córdova → CORDOVA)
/// 3. Strip everything outside `[A-Z0-9 ]`
/// 4. Remove the road-type vocabulary as whole words
/// 5. Collapse whitespace and trim
///
/// Empty input yields an empty string; there are no error cases.
pub fn normalize_road_name(name: &str) -> String {
    let upper = fold_accents(&name.to_uppercase());
    let stripped = NON_ALNUM_RE.replace_all(&upper, "");
    let no_prefix = PREFIX_RE.replace_all(&stripped, "");
    WHITESPACE_RE
        .replace_all(&no_prefix, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercases_and_strips_accents() {
        assert_eq!(normalize_road_name("Córdova"), "CORDOVA");
        assert_eq!(normalize_road_name("Garzón"), "GARZON");
        assert_eq!(normalize_road_name("Año Nuevo"), "ANO NUEVO");
    }

    #[test]
    fn test_removes_road_type_prefixes() {
        assert_eq!(normalize_road_name("AV. BOLIVAR"), "BOLIVAR");
        assert_eq!(normalize_road_name("Av. Gral. Cordova"), "CORDOVA");
        assert_eq!(normalize_road_name("JR. HUSARES DE JUNIN"), "HUSARES DE JUNIN");
        assert_eq!(normalize_road_name("Paseo de los Andes"), "DE LOS ANDES");
        assert_eq!(normalize_road_name("C.A. Brasil"), "BRASIL");
    }

    #[test]
    fn test_prefix_only_matches_whole_words() {
        // AVELLANEDA starts with AV but must survive intact
        assert_eq!(normalize_road_name("AVELLANEDA"), "AVELLANEDA");
        assert_eq!(normalize_road_name("CALLAO"), "CALLAO");
    }

    #[test]
    fn test_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize_road_name("  Del   Río!? "), "DEL RIO");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_road_name(""), "");
        assert_eq!(normalize_road_name("   "), "");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["Av. Gral. Córdova", "Paseo de los Andes", "BOLIVAR", ""] {
            let once = normalize_road_name(raw);
            assert_eq!(normalize_road_name(&once), once);
        }
    }
}
