use anyhow::Result;
use comfy_table::Table;
use tracing::{info, info_span};

use roster_cli::pipeline::{
    ImportOutcome, ImportRequest, LoadedSchema, ingest, load_options, load_schema, review_mapping,
    run_import as run_pipeline, write_json,
};
use roster_core::{ImportOptions, ImportOrchestrator};
use roster_map::MappingState;
use roster_standards::TemplateRegistry;

use crate::cli::{ImportArgs, MapArgs};
use crate::summary::apply_table_style;

pub fn run_templates() -> Result<()> {
    let registry = TemplateRegistry::builtin();
    let mut table = Table::new();
    table.set_header(vec!["Template", "Sport", "Name", "Drills"]);
    apply_table_style(&mut table);
    for template in registry.iter() {
        let drills: Vec<&str> = template.drills.iter().map(|d| d.label.as_str()).collect();
        table.add_row(vec![
            template.id.clone(),
            template.sport.clone(),
            template.name.clone(),
            drills.join(", "),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_map(args: &MapArgs) -> Result<(MappingState, LoadedSchema)> {
    let _span = info_span!("map", file = %args.file.display()).entered();
    let ingested = ingest(&args.file, args.sheet.as_deref())?;
    let schema = load_schema(
        args.schema.schema.as_deref(),
        args.schema.template.as_deref(),
        &ingested.sheet.headers,
    )?;
    let options = ImportOptions::new(args.event_id.clone())
        .with_allow_shared_targets(args.allow_shared_targets);
    let orchestrator = ImportOrchestrator::new(&schema.fields, options);
    let state = review_mapping(&orchestrator, &ingested.sheet.headers, &[]);
    if let Some(path) = &args.output {
        write_json(path, &state.to_confirmed())?;
        info!(path = %path.display(), "mapping written");
    }
    Ok((state, schema))
}

pub fn run_import(args: &ImportArgs) -> Result<ImportOutcome> {
    let _span = info_span!("import_file", file = %args.file.display()).entered();
    let mut options = load_options(args.config.as_deref())?;
    if let Some(event_id) = &args.event_id {
        options.event_id.clone_from(event_id);
    }
    if args.allow_shared_targets {
        options.allow_shared_targets = true;
    }
    let request = ImportRequest {
        sheet: args.sheet.clone(),
        schema_path: args.schema.schema.clone(),
        template: args.schema.template.clone(),
        existing: args.existing.clone(),
        options,
        mapping: args.mapping.clone(),
        mappings_dir: args.mappings_dir.clone(),
        output: args.output.clone(),
        ..ImportRequest::new(args.file.clone(), args.intent.into())
    };
    run_pipeline(&request)
}
