//! Terminal listing of a successful comparison.
//!
//! - New targets first, then changed ones
//! - Each group sorted by coordinates, then name

use crate::session::CompareResult;
use crate::store::diff::Change;
use crate::snapshot::Entity;

pub fn render(result: &CompareResult) -> String {
    let CompareResult::Ok { added, changed, .. } = result else {
        return String::new();
    };

    let mut output = String::new();

    let mut added: Vec<&Entity> = added.iter().collect();
    added.sort_by(|a, b| (&a.location, &a.name).cmp(&(&b.location, &b.name)));

    let mut changed: Vec<&Change> = changed.iter().collect();
    changed.sort_by(|a, b| {
        (&a.entity.location, &a.entity.name).cmp(&(&b.entity.location, &b.entity.name))
    });

    for entity in added {
        output.push_str(&format!(
            "  [new] {:30} {:>6}  {}\n",
            truncate(&entity.name, 30),
            entity.attribute,
            entity.location
        ));
    }

    for change in changed {
        output.push_str(&format!(
            "  [changed] {:26} {:>6} -> {:<6} {}\n",
            truncate(&change.entity.name, 26),
            change.old_attribute,
            change.new_attribute,
            change.entity.location
        ));
    }

    output
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    }
}
