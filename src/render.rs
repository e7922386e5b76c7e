use std::fmt::Write;

use time::format_description::well_known::Rfc3339;

use crate::{
    app::Screen,
    auth::{AuthScreen, AuthView},
    inventory::{detail_rows, DeviceEditor, InventoryView},
};

/// Plain-text view of the current screen.
pub fn screen(screen: &Screen) -> String {
    match screen {
        Screen::Auth(view) => auth(view),
        Screen::Dashboard => "== PatchSentryx dashboard ==\n(inventory | new | logout)\n".into(),
        Screen::Inventory(view) => inventory(view),
        Screen::Editor(editor) => editor_form(editor),
    }
}

fn auth(view: &AuthView) -> String {
    let mut out = String::new();
    match view.screen {
        AuthScreen::Login => {
            out.push_str("== PatchSentryx: log in ==\n");
            out.push_str("login <email> <password>   (toggle to register)\n");
        }
        AuthScreen::Register => {
            out.push_str("== PatchSentryx: register ==\n");
            out.push_str("register <email> <password> <full name>   (toggle to log in)\n");
        }
    }
    messages(&mut out, view.notice.as_deref(), view.error.as_deref());
    out
}

fn inventory(view: &InventoryView) -> String {
    let mut out = String::from("== Firewall inventory ==\n");
    if view.refreshing {
        out.push_str("Refreshing...\n");
        return out;
    }
    if let Some(term) = view.filter.search() {
        let _ = writeln!(out, "search: {term}");
    }
    if let Some(date) = view.filter.date() {
        let _ = writeln!(out, "date: {date}");
    }

    let rows = view.visible();
    if rows.is_empty() && view.error.is_none() {
        out.push_str("No devices in the inventory yet, add one with `new`.\n");
    }
    for d in rows {
        let created = d.created_at.format(&Rfc3339).unwrap_or_default();
        let _ = writeln!(
            out,
            "- {} [{}] brand: {}  model: {}  location: {}  created: {}",
            d.name, d.id, d.brand, d.model, d.location, created
        );
    }

    if let Some(selected) = &view.selected {
        let _ = writeln!(out, "-- details: {} (close to dismiss) --", selected.name);
        for (k, v) in detail_rows(selected) {
            let _ = writeln!(out, "  {k:<14} {v}");
        }
    }
    if let Some(id) = &view.pending_delete {
        let _ = writeln!(out, "Are you sure you want to delete {id}? (yes/no)");
    }
    messages(&mut out, None, view.error.as_deref());
    out
}

fn editor_form(editor: &DeviceEditor) -> String {
    let mut out = String::new();
    out.push_str(if editor.is_editing() {
        "== Edit firewall ==\n"
    } else {
        "== Register firewall ==\n"
    });
    for (field, value) in editor.form.fields() {
        let _ = writeln!(out, "  {field:<14} {value}");
    }
    out.push_str("set <field> <value>, then save (or cancel)\n");
    messages(&mut out, None, editor.error.as_deref());
    out
}

fn messages(out: &mut String, notice: Option<&str>, error: Option<&str>) {
    if let Some(n) = notice {
        let _ = writeln!(out, "{n}");
    }
    if let Some(e) = error {
        let _ = writeln!(out, "! {e}");
    }
}
