use super::path::{encode_link, escape_html};
use std::io;
use std::path::Path;

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl ListingEntry {
    /// Name shown to the user: symlinks get `@`, directories `/`
    pub fn display_name(&self) -> String {
        if self.is_symlink {
            format!("{}@", self.name)
        } else if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }

    /// Relative link target, percent-encoded
    pub fn href(&self) -> String {
        if self.is_dir {
            encode_link(&format!("{}/", self.name))
        } else {
            encode_link(&self.name)
        }
    }
}

/// Reads `dir` and returns its entries sorted case-insensitively
pub async fn read_entries(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_symlink = entry
            .file_type()
            .await
            .map(|t| t.is_symlink())
            .unwrap_or(false);
        // Follows symlinks, so a link to a directory lists as a directory
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        entries.push(ListingEntry {
            name,
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// Renders the HTML page listing `entries` under the heading for `display_path`
pub fn render(display_path: &str, entries: &[ListingEntry]) -> String {
    let title = format!("Directory listing for {}", escape_html(display_path));
    let mut page = format!(
        "<!DOCTYPE HTML>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         <hr>\n\
         <ul>\n"
    );

    for entry in entries {
        page.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            escape_html(&entry.href()),
            escape_html(&entry.display_name()),
        ));
    }

    page.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    page
}
