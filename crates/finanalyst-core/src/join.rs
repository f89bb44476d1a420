//! Resolution of cross-entity references against already loaded lists

use crate::models::Entity;

/// Find the record a form selection refers to
///
/// `selected` is the raw submitted value (an id rendered as a string). A
/// blank selection, a non-numeric value or an id absent from `loaded` all
/// resolve to `None`; no server lookup is made.
pub fn resolve_reference<T: Entity>(loaded: &[T], selected: Option<&str>) -> Option<T> {
    let selected = selected.map(str::trim).filter(|s| !s.is_empty())?;
    loaded
        .iter()
        .find(|candidate| {
            candidate
                .id()
                .map(|id| id.to_string() == selected)
                .unwrap_or(false)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Income;

    fn incomes() -> Vec<Income> {
        vec![
            Income {
                id: Some(1),
                name: Some("Salary".to_string()),
                ..Default::default()
            },
            Income {
                id: Some(2),
                name: Some("Dividends".to_string()),
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_resolves_loaded_id() {
        let found = resolve_reference(&incomes(), Some("2")).unwrap();
        assert_eq!(found.name.as_deref(), Some("Dividends"));
    }

    #[test]
    fn test_missing_or_blank_selection() {
        assert_eq!(resolve_reference(&incomes(), Some("7")), None);
        assert_eq!(resolve_reference(&incomes(), Some("")), None);
        assert_eq!(resolve_reference(&incomes(), None), None);
        assert_eq!(resolve_reference::<Income>(&[], Some("1")), None);
    }
}
