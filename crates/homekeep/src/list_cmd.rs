use anyhow::Result;
use hk_core::time::display;
use hk_core::{OutputFormat, ShoppingEntry};
use hk_list::ListService;
use serde_json::json;

pub(crate) fn handle_add(
    list: &ListService,
    text: &str,
    source: &str,
    format: OutputFormat,
) -> Result<()> {
    let created = list.add(text, source)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&created)?),
        OutputFormat::Text => {
            println!("Added {} item(s):", created.len());
            for entry in &created {
                println!("{}", format_entry(entry));
            }
            if created.iter().any(|e| e.flagged) {
                eprintln!("Items marked '?' were split on whitespace; check them on the dashboard.");
            }
        }
    }
    Ok(())
}

pub(crate) fn handle_list(list: &ListService, format: OutputFormat) -> Result<()> {
    let entries = list.list_sorted()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("Shopping list is empty.");
            }
            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        }
    }
    Ok(())
}

pub(crate) fn handle_delete(list: &ListService, id: &str, format: OutputFormat) -> Result<()> {
    let deleted = list.delete(id)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "id": id, "deleted": deleted })),
        OutputFormat::Text if deleted => println!("Deleted {id}"),
        OutputFormat::Text => println!("No entry with id {id}"),
    }
    Ok(())
}

pub(crate) fn handle_clear(list: &ListService, format: OutputFormat) -> Result<()> {
    list.clear_all()?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "status": "ok" })),
        OutputFormat::Text => println!("Cleared shopping list"),
    }
    Ok(())
}

fn format_entry(entry: &ShoppingEntry) -> String {
    let marker = if entry.flagged { "?" } else { " " };
    format!(
        "{}  {}  {marker} {}  [{}]",
        entry.id,
        display(&entry.created_at),
        entry.text,
        entry.source
    )
}
