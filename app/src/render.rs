//! Plain-text rendering of the controller state.

use std::fmt::Write;

use task_core::{Filter, TaskListController};

/// Renders the banner, the add form, filter tabs, visible rows and footer.
///
/// Rows are numbered 1-based in visible order; those numbers are what the
/// row commands take.
pub fn render(controller: &TaskListController) -> String {
    let mut out = String::new();
    let counts = controller.counts();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "Tasks");
    if !controller.error().is_empty() {
        let _ = writeln!(out, "! {}", controller.error());
    }
    if controller.is_loading() {
        let _ = writeln!(out, "Loading...");
    }
    let _ = writeln!(out, "new: {}", controller.new_title());

    let tabs: Vec<String> = Filter::MODES
        .iter()
        .map(|&filter| {
            let label = format!("{filter} ({})", counts.for_filter(filter));
            if filter == controller.filter() {
                format!("[{label}]")
            } else {
                label
            }
        })
        .collect();
    let _ = writeln!(out, "{}", tabs.join("  "));

    let visible = controller.visible();
    if visible.is_empty() && !controller.is_loading() {
        let _ = writeln!(out, "  (nothing here)");
    }
    let busy = controller.busy_id();
    let editing = controller.editing();
    for (index, task) in visible.iter().enumerate() {
        let check = if task.completed { "x" } else { " " };
        let _ = write!(out, "{:>3}. [{check}] ", index + 1);
        match editing.filter(|draft| draft.id == task.id) {
            Some(draft) => {
                let _ = write!(out, "edit: {}", draft.title);
            }
            None => {
                let _ = write!(out, "{}", task.title);
            }
        }
        if busy == Some(&task.id) {
            let _ = write!(out, "  (busy)");
        }
        out.push('\n');
    }

    let noun = if counts.active == 1 { "item" } else { "items" };
    let _ = writeln!(out, "{} {noun} left", counts.active);
    out
}
