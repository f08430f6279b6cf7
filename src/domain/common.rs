use std::cmp::Ordering;

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    type Id;

    fn id(&self) -> Self::Id;
}

/// Provides access to a human-friendly entity name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Supplies a presentation-ready label for UI or logs.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Supplies a common contract for retrieving monetary amounts.
pub trait Amounted {
    fn amount(&self) -> f64;
}

/// Orders owner names the way a person reading a class roster expects.
///
/// Comparison ignores case and Latin diacritics first ("Álvaro" sorts next to
/// "alvaro"), then falls back to the raw strings so the order stays total.
pub fn compare_display_names(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(fold_char);
    let folded_b = b.chars().flat_map(fold_char);
    folded_a.cmp(folded_b).then_with(|| a.cmp(b))
}

fn fold_char(ch: char) -> impl Iterator<Item = char> {
    let base = match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        other => other,
    };
    base.to_lowercase()
}

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use serde;
pub use uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accents_and_case_sort_together() {
        let mut names = vec!["Bruno", "álvaro", "Alice", "Ana"];
        names.sort_by(|a, b| compare_display_names(a, b));
        assert_eq!(names, vec!["Alice", "álvaro", "Ana", "Bruno"]);
    }

    #[test]
    fn identical_folds_fall_back_to_raw_order() {
        assert_eq!(compare_display_names("Ana", "ana"), Ordering::Less);
        assert_eq!(compare_display_names("ana", "ana"), Ordering::Equal);
    }
}
