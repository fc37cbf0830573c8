use docq_core::error::StoreError;
use docq_core::path::DocPath;
use docq_core::query::projection::resolve_selected;
use docq_core::query::{
    DOCUMENT_ID_FIELD, DirectionSeparator, Selection, ShapeOptions, Shaped, coerce_fields,
    parse_filter, parse_order_by, project, shape,
};
use docq_core::store::Store;
use docq_core::types::Document;
use serde_json::Value;
use tracing::debug;

use crate::backup;
use crate::commands::{CollectionsArgs, Command, GetArgs, ListArgs, QueryArgs};
use crate::config::Config;
use crate::error::ConsoleError;
use crate::input::Input;

/// Structured result from executing a command.
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// A value to print (documents, field values, counts, collection names).
    Value(Value),
    /// Mutation outcome message.
    Ok(String),
}

/// Everything a command runs against.
pub struct Context<'a> {
    pub store: &'a dyn Store,
    pub config: &'a Config,
    pub input: &'a mut dyn Input,
}

/// Execute a parsed command.
pub fn execute(ctx: &mut Context<'_>, cmd: Command) -> Result<CommandResult, ConsoleError> {
    debug!(command = cmd.name(), "executing");
    match cmd {
        Command::Get(args) => exec_get(ctx, args),
        Command::Query(args) => exec_query(ctx, args),
        Command::List(args) => exec_list(ctx, args),
        Command::Collections(args) => exec_collections(ctx, args),
        Command::Count { collection } => exec_count(ctx, &collection),
        Command::Create { path, json } => exec_create(ctx, &path, json),
        Command::Set { path, json } => exec_set(ctx, &path, json),
        Command::Update { path, json } => exec_update(ctx, &path, json),
        Command::Delete { path, field, yes } => exec_delete(ctx, &path, field.as_deref(), yes),
    }
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

fn exec_get(ctx: &mut Context<'_>, args: GetArgs) -> Result<CommandResult, ConsoleError> {
    let path = DocPath::parse(&args.path)?;
    let fields = split_fields(args.fields.as_deref());
    let options = ShapeOptions {
        count: args.count,
        flatten: args.flatten,
    };

    if path.is_document() {
        let doc = ctx
            .store
            .get(&path)?
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let shaped = shape(vec![project(&doc, &fields)], &fields, options);
        // A single document prints as an object, not a one-element list.
        let value = match shaped {
            Shaped::Documents(mut docs) if docs.len() == 1 => Value::Object(docs.remove(0)),
            other => other.into_json(),
        };
        return Ok(CommandResult::Value(value));
    }

    let mut selection = Selection::new(path)
        .fields(fields)
        .limit(args.limit)
        .offset(args.offset)
        .count(args.count);
    if let Some(text) = args.filter.or(args.where_filter) {
        selection = selection.filter(parse_filter(&text)?);
    }
    if let Some(order) = &args.order {
        selection = selection.order_by(parse_order_by(order, DirectionSeparator::Colon)?);
    }

    let docs = run_projected(ctx.store, &selection)?;
    Ok(CommandResult::Value(
        shape(docs, &selection.fields, options).into_json(),
    ))
}

fn exec_query(ctx: &mut Context<'_>, args: QueryArgs) -> Result<CommandResult, ConsoleError> {
    let collection = DocPath::collection(&args.collection)?;
    let text = match args.filter {
        Some(text) => Some(text),
        None => ctx.input.piped()?,
    };

    let mut selection = Selection::new(collection)
        .limit(args.limit)
        .offset(args.offset)
        .count(args.count);
    // No filter returns the whole collection.
    if let Some(text) = text.filter(|text| !text.trim().is_empty()) {
        selection = selection.filter(parse_filter(&text)?);
    }
    if let Some(order) = &args.order_by {
        selection = selection.order_by(parse_order_by(order, DirectionSeparator::Space)?);
    }

    let docs = run_projected(ctx.store, &selection)?;
    let options = ShapeOptions {
        count: args.count,
        flatten: false,
    };
    Ok(CommandResult::Value(
        shape(docs, &selection.fields, options).into_json(),
    ))
}

fn exec_list(ctx: &mut Context<'_>, args: ListArgs) -> Result<CommandResult, ConsoleError> {
    let Some(path) = &args.path else {
        let names = ctx.store.collections(None)?;
        return Ok(CommandResult::Value(list_output(names, args.count)));
    };

    let mut selection = Selection::new(DocPath::collection(path)?)
        .limit(args.limit)
        .offset(args.offset)
        .count(args.count);
    if let Some(order) = &args.order_by {
        selection = selection.order_by(parse_order_by(order, DirectionSeparator::Space)?);
    }

    let field = args.field.as_deref().unwrap_or(DOCUMENT_ID_FIELD);
    let docs = ctx.store.query(&selection)?;
    let shaped = if args.count {
        Shaped::Count(docs.len())
    } else {
        Shaped::Values(
            docs.iter()
                .filter_map(|doc| resolve_selected(doc, field).ok())
                .collect(),
        )
    };
    Ok(CommandResult::Value(shaped.into_json()))
}

fn exec_collections(
    ctx: &mut Context<'_>,
    args: CollectionsArgs,
) -> Result<CommandResult, ConsoleError> {
    let parent = args.path.as_deref().map(DocPath::document).transpose()?;
    let limit = if args.limit > 0 { args.limit } else { usize::MAX };
    let names: Vec<String> = ctx
        .store
        .collections(parent.as_ref())?
        .into_iter()
        .skip(args.offset)
        .take(limit)
        .collect();
    Ok(CommandResult::Value(list_output(names, args.count)))
}

fn exec_count(ctx: &mut Context<'_>, collection: &str) -> Result<CommandResult, ConsoleError> {
    let collection = DocPath::collection(collection)?;
    let n = ctx.store.count(&collection)?;
    Ok(CommandResult::Value(Shaped::Count(n).into_json()))
}

fn run_projected(store: &dyn Store, selection: &Selection) -> Result<Vec<Document>, ConsoleError> {
    Ok(store
        .query(selection)?
        .iter()
        .map(|doc| project(doc, &selection.fields))
        .collect())
}

fn list_output(names: Vec<String>, count: bool) -> Value {
    if count {
        Shaped::Count(names.len()).into_json()
    } else {
        Shaped::Values(names.into_iter().map(Value::String).collect()).into_json()
    }
}

fn split_fields(fields: Option<&str>) -> Vec<String> {
    fields
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

fn exec_create(
    ctx: &mut Context<'_>,
    path: &str,
    json: Option<String>,
) -> Result<CommandResult, ConsoleError> {
    let path = DocPath::parse(path)?;
    let fields = coerce_fields(read_body(ctx, json)?)?;
    let created = ctx.store.create(&path, fields)?;

    if ctx.config.backup.covers("create") {
        let after = backup::snapshot(ctx.store, &created);
        backup::record(ctx.store, &ctx.config.backup, &created, None, after);
    }
    Ok(CommandResult::Ok(format!("{created} successfully created")))
}

fn exec_set(
    ctx: &mut Context<'_>,
    path: &str,
    json: Option<String>,
) -> Result<CommandResult, ConsoleError> {
    let path = DocPath::document(path)?;
    let fields = coerce_fields(read_body(ctx, json)?)?;

    let before = backed_up(ctx, "set").then(|| backup::snapshot(ctx.store, &path));
    ctx.store.set(&path, fields)?;
    if let Some(before) = before {
        let after = backup::snapshot(ctx.store, &path);
        backup::record(ctx.store, &ctx.config.backup, &path, before, after);
    }
    Ok(CommandResult::Ok(format!("{path} successfully set")))
}

fn exec_update(
    ctx: &mut Context<'_>,
    path: &str,
    json: Option<String>,
) -> Result<CommandResult, ConsoleError> {
    let path = DocPath::document(path)?;
    let fields = coerce_fields(read_body(ctx, json)?)?;

    let before = backed_up(ctx, "update").then(|| backup::snapshot(ctx.store, &path));
    ctx.store.update(&path, fields)?;
    if let Some(before) = before {
        let after = backup::snapshot(ctx.store, &path);
        backup::record(ctx.store, &ctx.config.backup, &path, before, after);
    }
    Ok(CommandResult::Ok(format!("{path} successfully updated")))
}

fn exec_delete(
    ctx: &mut Context<'_>,
    path: &str,
    field: Option<&str>,
    yes: bool,
) -> Result<CommandResult, ConsoleError> {
    let path = DocPath::parse(path)?;

    if path.is_collection()
        && !yes
        && !ctx
            .input
            .confirm(&format!("Delete collection {path}? (y/N): "))?
    {
        return Ok(CommandResult::Ok("Deletion cancelled".to_string()));
    }

    let before = backed_up(ctx, "delete").then(|| backup::snapshot(ctx.store, &path));

    let message = match field {
        Some(field) => {
            ctx.store.delete_field(&path, field)?;
            format!("{path} {field} successfully deleted")
        }
        None => {
            ctx.store.delete(&path)?;
            format!("{path} successfully deleted")
        }
    };

    if let Some(before) = before {
        let after = match field {
            Some(_) => backup::snapshot(ctx.store, &path),
            None => None,
        };
        backup::record(ctx.store, &ctx.config.backup, &path, before, after);
    }
    Ok(CommandResult::Ok(message))
}

fn backed_up(ctx: &Context<'_>, command: &str) -> bool {
    ctx.config.backup.covers(command)
}

/// The JSON object payload of a write, from the argument or piped stdin.
fn read_body(ctx: &mut Context<'_>, json: Option<String>) -> Result<Document, ConsoleError> {
    let text = match json {
        Some(text) => text,
        None => ctx.input.piped()?.unwrap_or_default(),
    };
    if text.trim().is_empty() {
        return Err(ConsoleError::MissingInput(
            "one or more fields in JSON format are required",
        ));
    }
    match serde_json::from_str(&text)? {
        Value::Object(body) => Ok(body),
        Value::Array(_) => Err(ConsoleError::NotAnObject("an array")),
        Value::String(_) => Err(ConsoleError::NotAnObject("a string")),
        Value::Number(_) => Err(ConsoleError::NotAnObject("a number")),
        Value::Bool(_) => Err(ConsoleError::NotAnObject("a boolean")),
        Value::Null => Err(ConsoleError::NotAnObject("null")),
    }
}
