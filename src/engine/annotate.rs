use crate::domain::{Annotation, LabelRule};
use crate::surface::{InboxSurface, RowId};

/// Attaches one managed annotation per fired rule unless the row already
/// carries a managed annotation with that label. Returns how many were added.
pub fn apply_annotations(
    surface: &mut dyn InboxSurface,
    row: RowId,
    fired: &[&LabelRule],
) -> usize {
    let mut created = 0;
    for rule in fired {
        let exists = surface
            .annotations(row)
            .iter()
            .any(|a| a.is_managed() && a.text == rule.label);
        if exists {
            continue;
        }
        surface.attach(row, Annotation::managed(&rule.label, &rule.color));
        created += 1;
    }
    created
}

/// Strips every managed annotation from the surface.
pub fn clear_annotations(surface: &mut dyn InboxSurface) -> usize {
    surface.clear_managed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::snapshot::{Row, SnapshotInbox};

    #[test]
    fn second_application_is_a_no_op() {
        let mut inbox = SnapshotInbox::from_rows(vec![Row::new("bob", "bob@x", "hi", "")]);
        let rule = LabelRule::new("Friends").with_sender("bob");

        assert_eq!(apply_annotations(&mut inbox, 0, &[&rule]), 1);
        assert_eq!(apply_annotations(&mut inbox, 0, &[&rule]), 0);
        assert_eq!(inbox.rows[0].annotations.len(), 1);
        assert_eq!(inbox.rows[0].annotations[0].color, rule.color);
    }

    #[test]
    fn host_tag_with_same_text_does_not_count() {
        let mut row = Row::new("bob", "bob@x", "hi", "");
        row.annotations.push(Annotation {
            text: "Friends".into(),
            color: "gray".into(),
            class: None,
        });
        let mut inbox = SnapshotInbox::from_rows(vec![row]);
        let rule = LabelRule::new("Friends").with_sender("bob");

        assert_eq!(apply_annotations(&mut inbox, 0, &[&rule]), 1);
        assert_eq!(inbox.rows[0].annotations.len(), 2);
    }

    #[test]
    fn same_label_from_two_rules_is_added_once() {
        let mut inbox = SnapshotInbox::from_rows(vec![Row::new("bob", "bob@x", "hi", "")]);
        let a = LabelRule::new("Friends").with_sender("bob");
        let b = LabelRule::new("Friends").with_subject("hi");

        assert_eq!(apply_annotations(&mut inbox, 0, &[&a, &b]), 1);
    }
}
