use crate::history::{HistoryEntry, HistoryStore};
use crate::session::ChatMessage;
use colored::Colorize;
use prettytable::{format, Table};

const TITLE_COLUMN_CHARS: usize = 40;

/// Build the history listing, most recent first, numbered from 1
pub fn history_table(entries: &[HistoryEntry]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "#".bold(),
        "ID".bold(),
        "Title".bold(),
        "Image".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for (index, entry) in entries.iter().enumerate() {
        let title = if entry.title.chars().count() > TITLE_COLUMN_CHARS {
            let head: String = entry.title.chars().take(TITLE_COLUMN_CHARS - 3).collect();
            format!("{}...", head)
        } else {
            entry.title.clone()
        };
        let image = entry.image_ref.clone().unwrap_or_else(|| "-".to_string());
        let updated = entry.updated_at.format("%Y-%m-%d %H:%M").to_string();

        table.add_row(prettytable::row![
            index + 1,
            entry.id.short().cyan(),
            title,
            image,
            entry.transcript.len(),
            updated
        ]);
    }

    table
}

/// Print every saved conversation
pub fn print_history(store: &HistoryStore) {
    let entries = store.entries();
    if entries.is_empty() {
        println!("{}", "No conversation history yet.".yellow());
        return;
    }

    println!("\nConversation History:");
    history_table(&entries).printstd();
    println!();
    println!("Use {} to print a conversation.", "/show <number>".cyan());
    println!();
}

/// Print the entry at 1-based `position` of the listing
///
/// Returns false when there is no such entry.
pub fn print_entry(store: &HistoryStore, position: usize) -> bool {
    let entry = match position
        .checked_sub(1)
        .and_then(|index| store.entries().into_iter().nth(index))
    {
        Some(entry) => entry,
        None => return false,
    };

    println!();
    println!("{} {}", entry.title.bold(), format!("({})", entry.id.short()).dimmed());
    if let Some(image) = &entry.image_ref {
        println!("{} {}", "Image:".dimmed(), image);
    }
    println!(
        "{} {}",
        "Saved:".dimmed(),
        entry.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!();
    for message in &entry.transcript {
        print_message(message);
    }
    true
}

/// Print one transcript message with a role label
pub fn print_message(message: &ChatMessage) {
    if message.is_user() {
        if message.text.is_empty() {
            println!("{} {}", "You:".green().bold(), "(initial analysis)".dimmed());
        } else {
            println!("{} {}", "You:".green().bold(), message.text);
        }
    } else {
        println!("{}\n{}\n", "Analysis:".cyan().bold(), message.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NewHistoryEntry;
    use chrono::Utc;

    fn store_with(titles: &[&str]) -> HistoryStore {
        let store = HistoryStore::new();
        for title in titles {
            store.add_entry(NewHistoryEntry {
                created_at: Utc::now(),
                title: title.to_string(),
                transcript: vec![ChatMessage::user(*title), ChatMessage::assistant("ok")],
                image_ref: Some("scan.jpg".to_string()),
            });
        }
        store
    }

    #[test]
    fn test_history_table_has_header_and_rows() {
        let store = store_with(&["first", "second"]);
        let table = history_table(&store.entries());
        assert_eq!(table.len(), 3);
        let rendered = table.to_string();
        assert!(rendered.contains("second"));
        assert!(rendered.contains("scan.jpg"));
    }

    #[test]
    fn test_history_table_shortens_long_titles() {
        let long = "é".repeat(60);
        let store = store_with(&[long.as_str()]);
        let rendered = history_table(&store.entries()).to_string();
        assert!(rendered.contains("..."));
        assert!(!rendered.contains(&long));
    }

    #[test]
    fn test_print_entry_bounds() {
        let store = store_with(&["only"]);
        assert!(print_entry(&store, 1));
        assert!(!print_entry(&store, 0));
        assert!(!print_entry(&store, 2));
    }
}
