use clap::{Args, Subcommand};

/// A console command.
#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Get a document, or query a collection with a filter expression.
    #[command(visible_alias = "g")]
    Get(GetArgs),

    /// Run a filter expression against a collection. Reads the filter from
    /// stdin when none is given; no filter at all returns every document.
    #[command(visible_alias = "q")]
    Query(QueryArgs),

    /// List root collections, or one field (document id by default) of
    /// every document in a collection.
    #[command(visible_alias = "l")]
    List(ListArgs),

    /// List collections at the root or under a document.
    Collections(CollectionsArgs),

    /// Count the documents in a collection.
    Count { collection: String },

    /// Create a document. A collection path gets a generated id.
    #[command(visible_alias = "c")]
    Create { path: String, json: Option<String> },

    /// Create or replace a document.
    #[command(visible_alias = "s")]
    Set { path: String, json: Option<String> },

    /// Merge fields into an existing document. Keys may be dotted paths.
    #[command(visible_alias = "u")]
    Update { path: String, json: Option<String> },

    /// Delete a collection, a document, or a single field.
    #[command(visible_alias = "d")]
    Delete {
        path: String,
        field: Option<String>,
        /// Do not ask before deleting a collection.
        #[arg(short, long)]
        yes: bool,
    },
}

impl Command {
    /// Name used to match `backup.commands` entries.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Get(_) => "get",
            Command::Query(_) => "query",
            Command::List(_) => "list",
            Command::Collections(_) => "collections",
            Command::Count { .. } => "count",
            Command::Create { .. } => "create",
            Command::Set { .. } => "set",
            Command::Update { .. } => "update",
            Command::Delete { .. } => "delete",
        }
    }
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct GetArgs {
    pub path: String,
    /// Comma-separated fields; `$id` and `$path` select document metadata.
    pub fields: Option<String>,
    /// Filter expression, e.g. '{"age":{">":30}}'.
    #[arg(short, long)]
    pub filter: Option<String>,
    /// Alias for --filter.
    #[arg(short = 'w', long = "where")]
    pub where_filter: Option<String>,
    /// Order clauses, e.g. "age:desc,name".
    #[arg(short, long)]
    pub order: Option<String>,
    /// Maximum number of documents (0 = unlimited).
    #[arg(short, long, default_value_t = 0)]
    pub limit: usize,
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    /// Print only the number of matching documents.
    #[arg(short, long)]
    pub count: bool,
    /// With a single field, print its values instead of objects.
    #[arg(long)]
    pub flatten: bool,
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct QueryArgs {
    pub collection: String,
    pub filter: Option<String>,
    /// Order clauses, e.g. "age desc, name asc".
    #[arg(short, long = "order-by")]
    pub order_by: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    #[arg(short, long)]
    pub count: bool,
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct ListArgs {
    pub path: Option<String>,
    pub field: Option<String>,
    #[arg(short, long = "order-by")]
    pub order_by: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    #[arg(short, long)]
    pub count: bool,
}

#[derive(Args, Debug, Default, PartialEq)]
pub struct CollectionsArgs {
    pub path: Option<String>,
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
    #[arg(short, long)]
    pub count: bool,
}
