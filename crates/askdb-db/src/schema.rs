//! Schema description shown to the model.
//!
//! Each table renders as a `CREATE TABLE` block, optionally followed by a
//! comment with a few sample rows:
//!
//! ```text
//! CREATE TABLE "products" (
//! 	"id" integer NOT NULL,
//! 	"TotalSales" numeric
//! )
//!
//! /*
//! 2 rows from products table:
//! id	TotalSales
//! 1	10.50
//! 2	4.25
//! */
//! ```

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    /// Text-protocol sample rows, in column order.
    pub sample_rows: Vec<Vec<Option<String>>>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            sample_rows: Vec::new(),
        }
    }

    pub fn render(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let not_null = if c.nullable { "" } else { " NOT NULL" };
                format!("\t{} {}{}", quote_ident(&c.name), c.data_type, not_null)
            })
            .collect();

        let mut out = format!(
            "CREATE TABLE {} (\n{}\n)",
            quote_ident(&self.name),
            columns.join(",\n")
        );

        if !self.sample_rows.is_empty() {
            let header: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
            out.push_str(&format!(
                "\n\n/*\n{} rows from {} table:\n{}",
                self.sample_rows.len(),
                self.name,
                header.join("\t")
            ));
            for row in &self.sample_rows {
                let cells: Vec<&str> = row.iter().map(|v| v.as_deref().unwrap_or("None")).collect();
                out.push('\n');
                out.push_str(&cells.join("\t"));
            }
            out.push_str("\n*/");
        }

        out
    }
}

/// Render every table, separated by a blank line.
pub fn render_tables(tables: &[TableInfo]) -> String {
    tables
        .iter()
        .map(TableInfo::render)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Group `(table, column)` catalog rows, already ordered by table and
/// ordinal position, into tables. An empty `include` keeps every table.
pub fn group_columns(
    rows: Vec<(String, ColumnInfo)>,
    include: &[String],
) -> Vec<TableInfo> {
    let mut tables: Vec<TableInfo> = Vec::new();
    for (table, column) in rows {
        if !include.is_empty() && !include.iter().any(|t| t == &table) {
            continue;
        }
        match tables.last_mut() {
            Some(last) if last.name == table => last.columns.push(column),
            _ => {
                let mut info = TableInfo::new(table);
                info.columns.push(column);
                tables.push(info);
            }
        }
    }
    tables
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
